//! Display-side plumbing: routing simulation events to per-agent views

pub mod router;

pub use router::{DispatchStats, EventRouter};
