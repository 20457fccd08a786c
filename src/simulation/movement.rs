//! Movement and strip boundary handling
//!
//! Agents walk along a strip `[0, strip_width]`. Reaching an edge either
//! bounces them back or sends them off-screen; an agent that left always
//! walks back in, from the far side or turning around on the same side, so
//! nobody pops across the strip or stays gone.

use rand::Rng;

use crate::core::config::SimulationConfig;
use crate::entity::agent::Agent;
use crate::entity::behavior::BehaviorState;
use crate::simulation::events::AgentEvent;

/// Base speed (px/s) for a state before tier and personality scaling
pub fn base_speed(state: BehaviorState, config: &SimulationConfig) -> f32 {
    match state {
        BehaviorState::Walking | BehaviorState::Exiting | BehaviorState::Entering => {
            config.walk_speed
        }
        BehaviorState::Running => config.run_speed,
        _ => 0.0,
    }
}

/// Signed horizontal velocity for the agent's current state and facing
pub fn velocity(agent: &Agent, config: &SimulationConfig) -> f32 {
    base_speed(agent.state, config)
        * agent.speed.multiplier()
        * agent.variation.speed_factor
        * agent.direction.sign()
}

/// What the boundary check did this step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryOutcome {
    None,
    Bounced,
    StartedExit,
    /// Left the strip and came back from the opposite side
    ReenteredOpposite,
    /// Left the strip and turned around on the same side
    ReenteredSame,
    Entered,
}

/// Integrate position and apply the boundary policy for one step
pub fn update_movement<R: Rng>(
    agent: &mut Agent,
    dt: f32,
    config: &SimulationConfig,
    rng: &mut R,
    events: &mut Vec<AgentEvent>,
) -> BoundaryOutcome {
    let v = velocity(agent, config);
    if v == 0.0 {
        return BoundaryOutcome::None;
    }
    agent.position.x += v * dt;

    let width = config.strip_width;
    let size = agent.width();

    match agent.state {
        BehaviorState::Walking | BehaviorState::Running => {
            let moving_right = v > 0.0;
            let hit_right = moving_right && agent.position.x + size >= width;
            let hit_left = !moving_right && agent.position.x <= 0.0;
            if !hit_right && !hit_left {
                return BoundaryOutcome::None;
            }

            if rng.gen::<f32>() < agent.variation.edge_exit_probability {
                agent.enter_state(BehaviorState::Exiting, rng, events);
                BoundaryOutcome::StartedExit
            } else {
                agent.position.x = if hit_right { width - size } else { 0.0 };
                agent.set_direction(agent.direction.flipped(), events);
                BoundaryOutcome::Bounced
            }
        }
        BehaviorState::Exiting => {
            let cleared = agent.position.x >= width || agent.position.x + size <= 0.0;
            if !cleared || agent.has_exited {
                return BoundaryOutcome::None;
            }
            agent.has_exited = true;

            let outcome = if rng.gen_bool(0.5) {
                // Come back in from the far side, still walking the same way
                agent.position.x = if agent.direction.sign() > 0.0 { -size } else { width };
                BoundaryOutcome::ReenteredOpposite
            } else {
                agent.set_direction(agent.direction.flipped(), events);
                BoundaryOutcome::ReenteredSame
            };
            agent.enter_state(BehaviorState::Entering, rng, events);
            outcome
        }
        BehaviorState::Entering => {
            let margin = size / 2.0;
            if agent.position.x >= margin && agent.position.x + size <= width - margin {
                agent.has_exited = false;
                agent.enter_state(BehaviorState::Walking, rng, events);
                BoundaryOutcome::Entered
            } else {
                BoundaryOutcome::None
            }
        }
        _ => BoundaryOutcome::None,
    }
}
