//! Frame rendering for agents.
//!
//! The simulation never draws anything itself. It asks an `ArtworkRenderer`
//! for frames by key and keeps the results in a bounded `FrameCache`.

pub mod animation;
pub mod artwork;
pub mod cache;

pub use animation::FrameCursor;
pub use artwork::{ArtworkRenderer, FrameKey, SilhouetteRenderer};
pub use cache::{CacheStats, FrameCache, FrameImage};
