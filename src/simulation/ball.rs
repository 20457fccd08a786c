//! The thrown ball and who gets to chase it
//!
//! There is at most one ball. It rolls along the strip, bounces off the edges
//! and slows to a stop. Shortly after a throw exactly one agent is picked to
//! chase it; the ball records that agent so nobody else can claim it.

use ordered_float::OrderedFloat;
use rand::Rng;

use crate::core::config::SimulationConfig;
use crate::core::types::{AgentId, Direction};
use crate::entity::agent::Agent;
use crate::entity::behavior::BehaviorState;
use crate::simulation::events::AgentEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallState {
    Rolling,
    /// At rest but still a valid chase target
    Stopped,
    /// Inert, about to be removed
    Caught,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub id: u64,
    /// Left edge of the ball
    pub x: f32,
    pub velocity: f32,
    pub size: f32,
    pub state: BallState,
    pub chaser: Option<AgentId>,
    pub thrower: Option<AgentId>,
}

impl Ball {
    /// A freshly thrown ball, clamped onto the strip
    pub fn thrown(
        id: u64,
        x: f32,
        velocity: f32,
        thrower: Option<AgentId>,
        config: &SimulationConfig,
    ) -> Self {
        let max_x = (config.strip_width - config.ball_size).max(0.0);
        Self {
            id,
            x: x.clamp(0.0, max_x),
            velocity,
            size: config.ball_size,
            state: BallState::Rolling,
            chaser: None,
            thrower,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state != BallState::Caught
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.size / 2.0
    }

    /// One physics step: integrate, apply friction, bounce, settle
    pub fn step(&mut self, dt: f32, config: &SimulationConfig) {
        if self.state != BallState::Rolling {
            return;
        }

        self.x += self.velocity * dt;
        self.velocity *= config.ball_friction;

        let max_x = (config.strip_width - self.size).max(0.0);
        if self.x <= 0.0 {
            self.x = 0.0;
            self.velocity = self.velocity.abs() * config.ball_restitution;
        } else if self.x >= max_x {
            self.x = max_x;
            self.velocity = -self.velocity.abs() * config.ball_restitution;
        }

        if self.velocity.abs() < config.ball_stop_threshold {
            self.velocity = 0.0;
            self.state = BallState::Stopped;
        }
    }

    pub fn mark_caught(&mut self) {
        self.state = BallState::Caught;
        self.velocity = 0.0;
    }
}

/// Whether an agent may be picked to chase
pub fn can_fetch(agent: &Agent) -> bool {
    !agent.is_held
        && !matches!(
            agent.state,
            BehaviorState::Sleeping | BehaviorState::Dragging | BehaviorState::Chasing
        )
}

/// An eligible agent as seen by chase arbitration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaseCandidate {
    pub id: AgentId,
    pub center_x: f32,
}

/// Pick the single agent that chases a ball at `ball_center`
///
/// A lone eligible agent always goes, however far away. Otherwise the nearest
/// agent other than the thrower wins (earlier candidates win ties), and the
/// thrower only goes when nobody else can.
pub fn select_chaser(
    candidates: &[ChaseCandidate],
    ball_center: f32,
    thrower: Option<AgentId>,
) -> Option<AgentId> {
    if candidates.len() == 1 {
        return Some(candidates[0].id);
    }
    candidates
        .iter()
        .filter(|c| Some(c.id) != thrower)
        .min_by_key(|c| OrderedFloat((c.center_x - ball_center).abs()))
        .or_else(|| candidates.iter().find(|c| Some(c.id) == thrower))
        .map(|c| c.id)
}

/// Result of one chase step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChaseOutcome {
    Pursuing,
    Caught,
    /// Ball gone or claimed by someone else; the agent went back to idle
    Abandoned,
}

/// Move a chasing agent toward the ball and resolve a catch
///
/// The agent aims for the ball's centre, limited to where its own centre can
/// stand on the strip. It catches once it is on the strip and either within
/// the catch radius or as close as the strip edge allows.
pub fn chase_step<R: Rng>(
    agent: &mut Agent,
    ball: Option<&mut Ball>,
    dt: f32,
    config: &SimulationConfig,
    rng: &mut R,
    events: &mut Vec<AgentEvent>,
) -> ChaseOutcome {
    let ball = match ball {
        Some(ball) if ball.is_active() && ball.chaser == Some(agent.id) => ball,
        _ => {
            tracing::debug!(agent = %agent.id, "chase target gone, giving up");
            agent.return_state = None;
            if agent.is_within_strip(config.strip_width) {
                agent.enter_state(BehaviorState::Idle, rng, events);
            } else {
                // Picked mid-exit; walk back onto the strip first
                let toward = config.strip_width / 2.0 - agent.center_x();
                agent.set_direction(Direction::from_delta(toward, agent.direction), events);
                agent.enter_state(BehaviorState::Entering, rng, events);
            }
            return ChaseOutcome::Abandoned;
        }
    };

    let half = agent.width() / 2.0;
    let ball_center = ball.center_x();
    let target = ball_center.clamp(half, (config.strip_width - half).max(half));

    let center = agent.center_x();
    let dx = target - center;
    if dx != 0.0 {
        agent.set_direction(Direction::from_delta(dx, agent.direction), events);
        let step = config.chase_speed * agent.speed.multiplier() * dt;
        let new_center = if dx.abs() <= step {
            target
        } else {
            center + dx.signum() * step
        };
        agent.position.x = new_center - half;
    }

    let on_strip = agent.position.x >= -0.5
        && agent.position.x + agent.width() <= config.strip_width + 0.5;
    let at_target = (target - agent.center_x()).abs() <= 0.5;
    let in_reach = (ball_center - agent.center_x()).abs() <= config.catch_radius;
    if on_strip && (in_reach || at_target) {
        agent.pull_into_strip(config);
        ball.mark_caught();
        agent.return_state = Some(BehaviorState::Idle);
        agent.enter_state(BehaviorState::Happy, rng, events);
        return ChaseOutcome::Caught;
    }
    ChaseOutcome::Pursuing
}
