//! Saving and restoring the population between runs

pub mod roster;

pub use roster::{RosterEntry, RosterStore};
