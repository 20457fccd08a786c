pub mod config;
pub mod error;
pub mod types;

pub use config::SimulationConfig;
pub use error::{CritterError, Result};
pub use types::{AgentId, Direction, SpeedSetting, Tick, Vec2};
