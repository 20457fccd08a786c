pub mod ball;
pub mod deferred;
pub mod events;
pub mod movement;
pub mod proximity;
pub mod registry;
pub mod tick;

pub use ball::{Ball, BallState};
pub use events::{AgentEvent, SimulationEvent};
pub use registry::{AgentRegistry, SharedAgent};
pub use tick::Scheduler;
