//! Behavioral state machine
//!
//! Each agent is always in exactly one `BehaviorState`. Ordinary states time
//! out after a sampled duration and pick a successor from a probability table.
//! Interrupt states (`Happy`, `Dragging`, `Chasing`) are entered from outside
//! and remember the state to return to.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::entity::agent::Agent;
use crate::simulation::events::AgentEvent;

/// Shortest duration any state may be given
pub const MIN_STATE_DURATION: f32 = 0.05;

/// Behavioral states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BehaviorState {
    #[default]
    Idle,
    Walking,
    Running,
    Sleeping,
    Happy,
    Exiting,
    Entering,
    Dragging,
    Chasing,
}

impl BehaviorState {
    pub const ALL: [BehaviorState; 9] = [
        BehaviorState::Idle,
        BehaviorState::Walking,
        BehaviorState::Running,
        BehaviorState::Sleeping,
        BehaviorState::Happy,
        BehaviorState::Exiting,
        BehaviorState::Entering,
        BehaviorState::Dragging,
        BehaviorState::Chasing,
    ];

    /// States entered from outside the table that resume a `return_state`
    pub fn is_interrupt(self) -> bool {
        matches!(
            self,
            BehaviorState::Happy | BehaviorState::Dragging | BehaviorState::Chasing
        )
    }

    /// Uniform duration range sampled on entry (seconds)
    ///
    /// Exiting and Entering get a long ceiling: the movement controller ends
    /// them when the boundary condition is met, the timeout only guards
    /// against an agent lingering off-strip forever.
    pub fn duration_range(self) -> (f32, f32) {
        match self {
            BehaviorState::Idle => (3.0, 8.0),
            BehaviorState::Walking => (4.0, 10.0),
            BehaviorState::Running => (2.0, 5.0),
            BehaviorState::Sleeping => (8.0, 20.0),
            BehaviorState::Happy => (2.0, 2.0),
            BehaviorState::Exiting | BehaviorState::Entering => (30.0, 30.0),
            BehaviorState::Dragging | BehaviorState::Chasing => (60.0, 60.0),
        }
    }

    /// Whether the agent's duration factor scales this state's duration
    pub fn scales_with_personality(self) -> bool {
        matches!(
            self,
            BehaviorState::Idle
                | BehaviorState::Walking
                | BehaviorState::Running
                | BehaviorState::Sleeping
        )
    }

    /// Whether the movement controller integrates position in this state
    pub fn is_moving(self) -> bool {
        matches!(
            self,
            BehaviorState::Walking
                | BehaviorState::Running
                | BehaviorState::Exiting
                | BehaviorState::Entering
        )
    }
}

/// Outcome of a table roll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Enter(BehaviorState),
    /// Flip facing and restart the current state
    ToggleDirection,
}

use BehaviorState::*;
use Transition::*;

const IDLE_TABLE: [(Transition, f64); 4] = [
    (Enter(Walking), 0.4),
    (Enter(Running), 0.2),
    (Enter(Sleeping), 0.1),
    (Enter(Idle), 0.3),
];

const WALKING_TABLE: [(Transition, f64); 4] = [
    (Enter(Idle), 0.3),
    (ToggleDirection, 0.2),
    (Enter(Running), 0.2),
    (Enter(Walking), 0.3),
];

const RUNNING_TABLE: [(Transition, f64); 4] = [
    (Enter(Walking), 0.4),
    (Enter(Idle), 0.2),
    (ToggleDirection, 0.2),
    (Enter(Running), 0.2),
];

const SLEEPING_TABLE: [(Transition, f64); 2] = [(Enter(Idle), 0.7), (Enter(Sleeping), 0.3)];

/// Probability table for a source state. Empty for states not driven by the table.
pub fn transition_table(state: BehaviorState) -> &'static [(Transition, f64)] {
    match state {
        Idle => &IDLE_TABLE,
        Walking => &WALKING_TABLE,
        Running => &RUNNING_TABLE,
        Sleeping => &SLEEPING_TABLE,
        _ => &[],
    }
}

/// Pick a transition for a uniform `roll` in [0, 1)
///
/// Walks the cumulative distribution in table order; a roll that overshoots
/// the accumulated total due to rounding lands on the last entry.
pub fn roll_transition(state: BehaviorState, roll: f64) -> Option<Transition> {
    let table = transition_table(state);
    let mut cumulative = 0.0;
    for (transition, probability) in table {
        cumulative += probability;
        if roll < cumulative {
            return Some(*transition);
        }
    }
    table.last().map(|(transition, _)| *transition)
}

/// Sample how long `state` lasts for an agent with the given duration factor
pub fn sample_duration<R: Rng>(state: BehaviorState, duration_factor: f32, rng: &mut R) -> f32 {
    let (min, max) = state.duration_range();
    let base = if max > min { rng.gen_range(min..=max) } else { min };
    let scaled = if state.scales_with_personality() {
        base * duration_factor
    } else {
        base
    };
    scaled.max(MIN_STATE_DURATION)
}

/// Advance an agent's state timer and apply a transition on timeout
///
/// Returns true when the agent (re)entered a state this call.
pub fn update_behavior<R: Rng>(
    agent: &mut Agent,
    dt: f32,
    config: &SimulationConfig,
    rng: &mut R,
    events: &mut Vec<AgentEvent>,
) -> bool {
    agent.state_timer += dt;
    if agent.state_timer < agent.state_duration {
        return false;
    }

    if let Some(resume) = agent.return_state.take() {
        agent.enter_state(resume, rng, events);
        return true;
    }

    match roll_transition(agent.state, rng.gen::<f64>()) {
        Some(Enter(next)) => agent.enter_state(next, rng, events),
        Some(ToggleDirection) => {
            agent.set_direction(agent.direction.flipped(), events);
            agent.enter_state(agent.state, rng, events);
        }
        None => match agent.state {
            Exiting | Entering => {
                tracing::debug!(agent = %agent.id, state = ?agent.state, "boundary timeout, pulling back onto strip");
                agent.pull_into_strip(config);
                agent.enter_state(Walking, rng, events);
            }
            // Dragging is ended by release, never by the clock
            Dragging => agent.state_timer = 0.0,
            _ => agent.enter_state(Idle, rng, events),
        },
    }
    true
}

/// Short idle fidgets with their own lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RandomBehaviorKind {
    Stretch,
    Yawn,
    Groom,
    LookAround,
    Spin,
    /// Sad slump after an external failure
    Droop,
}

impl RandomBehaviorKind {
    /// How long the behavior stays active (seconds)
    pub fn duration(self) -> f32 {
        match self {
            RandomBehaviorKind::Stretch => 1.5,
            RandomBehaviorKind::Yawn => 1.2,
            RandomBehaviorKind::Groom => 2.5,
            RandomBehaviorKind::LookAround => 2.0,
            RandomBehaviorKind::Spin => 1.0,
            RandomBehaviorKind::Droop => 3.0,
        }
    }
}

/// Maybe start an idle fidget for an agent standing still
pub fn roll_random_behavior<R: Rng>(
    agent: &Agent,
    dt: f32,
    rate: f32,
    rng: &mut R,
) -> Option<RandomBehaviorKind> {
    if agent.state != Idle || agent.random_behavior.is_some() || agent.is_held {
        return None;
    }
    if rng.gen::<f32>() >= rate * dt {
        return None;
    }
    agent.species.descriptor().idle_behaviors.choose(rng).copied()
}
