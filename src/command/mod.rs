//! Command pipeline
//!
//! User and host requests arrive as `Command` values and are applied to the
//! scheduler by `CommandExecutor`.

pub mod executor;

pub use executor::{Command, CommandExecutor, CommandOutcome, ExternalOutcome};
