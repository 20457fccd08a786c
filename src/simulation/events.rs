//! Outbound notifications for the display layer
//!
//! The simulation never talks to a display directly. Each tick returns a list
//! of `SimulationEvent`s in processing order; `ui::EventRouter` fans agent
//! events out to whichever display binding is registered for that agent.

use crate::core::types::{AgentId, Direction};
use crate::entity::behavior::{BehaviorState, RandomBehaviorKind};
use crate::renderer::cache::FrameImage;

/// Something that happened to a single agent
#[derive(Debug, Clone)]
pub enum AgentEvent {
    StateChanged {
        from: BehaviorState,
        to: BehaviorState,
    },
    PositionChanged {
        x: f32,
        y: f32,
    },
    DirectionChanged(Direction),
    /// Speech bubble or emote text
    Speech(String),
    /// New animation frame. `image` is `None` if the frame could not be rendered
    /// and the display should keep showing the previous one.
    FrameChanged {
        state: BehaviorState,
        frame: u32,
        image: Option<FrameImage>,
    },
    RandomBehavior {
        kind: RandomBehaviorKind,
        duration: f32,
    },
    RandomBehaviorEnded(RandomBehaviorKind),
    /// Agent fell asleep
    Resting,
}

/// Events generated by the scheduler
#[derive(Debug, Clone)]
pub enum SimulationEvent {
    Agent {
        agent: AgentId,
        event: AgentEvent,
    },
    AgentAdded(AgentId),
    AgentRemoved(AgentId),
    BallThrown {
        ball_id: u64,
        x: f32,
        velocity: f32,
        thrower: Option<AgentId>,
    },
    ChaseAssigned {
        ball_id: u64,
        chaser: AgentId,
    },
    BallCaught {
        ball_id: u64,
        by: AgentId,
    },
    /// Ball removed without being caught (replaced or cleared)
    BallLost {
        ball_id: u64,
    },
    Greeting {
        first: AgentId,
        second: AgentId,
    },
}

impl SimulationEvent {
    pub fn agent(agent: AgentId, event: AgentEvent) -> Self {
        SimulationEvent::Agent { agent, event }
    }

    /// The agent an event is addressed to, if any
    pub fn agent_id(&self) -> Option<AgentId> {
        match self {
            SimulationEvent::Agent { agent, .. } => Some(*agent),
            _ => None,
        }
    }
}
