//! A single on-screen creature

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::error::{CritterError, Result};
use crate::core::types::{AgentId, Direction, SpeedSetting, Vec2};
use crate::entity::behavior::{sample_duration, BehaviorState, RandomBehaviorKind};
use crate::entity::species::{ColorVariant, Species};
use crate::renderer::animation::FrameCursor;
use crate::renderer::artwork::FrameKey;
use crate::renderer::cache::FrameImage;
use crate::simulation::events::AgentEvent;

/// Per-agent multipliers sampled once at creation
///
/// These give each agent a recognizable personality without any per-state
/// configuration: a fast walker, a long sleeper, a wanderer that keeps
/// leaving the strip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    /// Multiplies movement speed, in [0.8, 1.2]
    pub speed_factor: f32,
    /// Multiplies sampled state durations, in [0.7, 1.3]
    pub duration_factor: f32,
    /// Chance of walking off the strip on reaching an edge, in [0.15, 0.45]
    pub edge_exit_probability: f32,
}

impl Variation {
    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        Self {
            speed_factor: rng.gen_range(0.8..=1.2),
            duration_factor: rng.gen_range(0.7..=1.3),
            edge_exit_probability: rng.gen_range(0.15..=0.45),
        }
    }

    /// Middle-of-the-range personality
    pub fn neutral() -> Self {
        Self {
            speed_factor: 1.0,
            duration_factor: 1.0,
            edge_exit_probability: 0.3,
        }
    }
}

/// One simulated creature
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub species: Species,
    pub color: ColorVariant,
    /// Render size in pixels; also the agent's width on the strip
    pub size: u32,
    /// `x` is the left edge of the agent's box
    pub position: Vec2,
    pub direction: Direction,

    pub state: BehaviorState,
    pub state_timer: f32,
    pub state_duration: f32,
    /// State to resume when an interrupt state ends
    pub return_state: Option<BehaviorState>,

    pub speed: SpeedSetting,
    pub variation: Variation,
    pub animation: FrameCursor,

    pub is_held: bool,
    /// Latched once an exiting agent has fully left the strip
    pub has_exited: bool,
    pub random_behavior: Option<RandomBehaviorKind>,

    /// Last successfully rendered frame and the key it was rendered for
    pub image: Option<FrameImage>,
    pub image_key: Option<FrameKey>,
}

impl Agent {
    pub fn new(
        species: Species,
        color: ColorVariant,
        name: String,
        size: u32,
        position: Vec2,
        variation: Variation,
    ) -> Self {
        let (min, max) = BehaviorState::Idle.duration_range();
        let facing = if species.descriptor().faces_right {
            Direction::Right
        } else {
            Direction::Left
        };
        Self {
            id: AgentId::new(),
            name,
            species,
            color,
            size,
            position,
            direction: facing,
            state: BehaviorState::Idle,
            state_timer: 0.0,
            state_duration: (min + max) / 2.0,
            return_state: None,
            speed: SpeedSetting::default(),
            variation,
            animation: FrameCursor::new(),
            is_held: false,
            has_exited: false,
            random_behavior: None,
            image: None,
            image_key: None,
        }
    }

    /// Create an agent the way the "add pet" factory does
    ///
    /// A missing color or name is picked from the species descriptor. The
    /// agent is placed at a random spot on the strip floor.
    pub fn spawn<R: Rng>(
        species: Species,
        color: Option<ColorVariant>,
        name: Option<String>,
        config: &SimulationConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let desc = species.descriptor();
        let color = match color {
            Some(c) if !desc.allows(c) => {
                return Err(CritterError::InvalidColor { species, color: c });
            }
            Some(c) => c,
            None => desc.random_color(rng),
        };
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| desc.random_name(rng).to_string());

        let size = config.agent_size;
        let max_x = (config.strip_width - size as f32).max(0.0);
        let position = Vec2::new(
            rng.gen_range(0.0..=max_x),
            desc.resting_y(config.floor_y, config.float_height),
        );

        let mut agent = Agent::new(species, color, name, size, position, Variation::sample(rng));
        if rng.gen_bool(0.5) {
            agent.direction = agent.direction.flipped();
        }
        agent.state_duration = sample_duration(agent.state, agent.variation.duration_factor, rng);
        Ok(agent)
    }

    pub fn width(&self) -> f32 {
        self.size as f32
    }

    pub fn center_x(&self) -> f32 {
        self.position.x + self.width() / 2.0
    }

    /// Whether the whole box lies on the strip
    pub fn is_within_strip(&self, strip_width: f32) -> bool {
        self.position.x >= 0.0 && self.position.x + self.width() <= strip_width
    }

    /// Key for the frame this agent should currently display
    pub fn frame_key(&self) -> FrameKey {
        FrameKey {
            species: self.species,
            color: self.color,
            state: self.state,
            frame: self.animation.frame,
            size: self.size,
        }
    }

    /// Enter `state`, sampling a fresh duration and restarting its animation
    ///
    /// Re-entering the current state restarts it without a `StateChanged`.
    pub fn enter_state<R: Rng>(
        &mut self,
        state: BehaviorState,
        rng: &mut R,
        events: &mut Vec<AgentEvent>,
    ) {
        let previous = self.state;
        self.state = state;
        self.state_timer = 0.0;
        self.state_duration = sample_duration(state, self.variation.duration_factor, rng);
        self.animation.reset();

        if state == BehaviorState::Exiting {
            self.has_exited = false;
        }
        if previous != state {
            events.push(AgentEvent::StateChanged {
                from: previous,
                to: state,
            });
            if state == BehaviorState::Sleeping {
                events.push(AgentEvent::Resting);
            }
        }
    }

    /// Enter an interrupt state, remembering where to resume
    ///
    /// Interrupting an interrupt keeps the original resume point, so a pet
    /// hovered mid-chase goes back to chasing and a pet grabbed while happy
    /// goes back to whatever it did before being happy.
    pub fn interrupt<R: Rng>(
        &mut self,
        state: BehaviorState,
        rng: &mut R,
        events: &mut Vec<AgentEvent>,
    ) {
        if !self.state.is_interrupt() {
            self.return_state = Some(self.state);
        } else if self.state == BehaviorState::Chasing && state != BehaviorState::Chasing {
            self.return_state = Some(BehaviorState::Chasing);
        }
        self.enter_state(state, rng, events);
    }

    pub fn set_direction(&mut self, direction: Direction, events: &mut Vec<AgentEvent>) {
        if self.direction != direction {
            self.direction = direction;
            events.push(AgentEvent::DirectionChanged(direction));
        }
    }

    /// User picked the agent up
    pub fn grab<R: Rng>(&mut self, rng: &mut R, events: &mut Vec<AgentEvent>) {
        if self.is_held {
            return;
        }
        self.is_held = true;
        self.random_behavior = None;
        self.interrupt(BehaviorState::Dragging, rng, events);
    }

    /// Move a held agent with the pointer
    pub fn drag_to(&mut self, x: f32, y: f32, events: &mut Vec<AgentEvent>) {
        if !self.is_held {
            return;
        }
        self.position = Vec2::new(x, y);
        events.push(AgentEvent::PositionChanged { x, y });
    }

    /// User let go at `x`; the agent drops back to its floor height
    pub fn release<R: Rng>(
        &mut self,
        x: f32,
        config: &SimulationConfig,
        rng: &mut R,
        events: &mut Vec<AgentEvent>,
    ) {
        if !self.is_held {
            return;
        }
        self.is_held = false;
        self.position.x = x;
        self.position.y = self
            .species
            .descriptor()
            .resting_y(config.floor_y, config.float_height);
        events.push(AgentEvent::PositionChanged {
            x: self.position.x,
            y: self.position.y,
        });

        let resume = self.return_state.take().unwrap_or(BehaviorState::Idle);
        let resume = match resume {
            // Dropped somewhere on the strip, there is nothing left to exit or enter
            BehaviorState::Exiting | BehaviorState::Entering
                if self.is_within_strip(config.strip_width) =>
            {
                BehaviorState::Walking
            }
            other => other,
        };
        self.enter_state(resume, rng, events);
        if !resume.is_moving() && !self.is_within_strip(config.strip_width) {
            self.pull_into_strip(config);
        }
    }

    /// Clamp the agent back onto the strip and clear boundary bookkeeping
    pub fn pull_into_strip(&mut self, config: &SimulationConfig) {
        let max_x = (config.strip_width - self.width()).max(0.0);
        self.position.x = if self.position.x.is_finite() {
            self.position.x.clamp(0.0, max_x)
        } else {
            max_x / 2.0
        };
        self.has_exited = false;
    }

    /// Check the per-agent invariants the scheduler relies on
    pub fn check_invariants(&self, frame_count: u32, strip_width: f32) -> Result<()> {
        if !(self.state_duration > 0.0) {
            return Err(CritterError::AgentUpdate(format!(
                "{} has non-positive state duration {}",
                self.id, self.state_duration
            )));
        }
        if self.animation.frame >= frame_count.max(1) {
            return Err(CritterError::AgentUpdate(format!(
                "{} frame {} out of range for {:?} ({} frames)",
                self.id, self.animation.frame, self.state, frame_count
            )));
        }
        if !self.position.x.is_finite() || !self.position.y.is_finite() {
            return Err(CritterError::AgentUpdate(format!(
                "{} has non-finite position {:?}",
                self.id, self.position
            )));
        }
        let unconstrained = matches!(
            self.state,
            BehaviorState::Exiting
                | BehaviorState::Entering
                | BehaviorState::Dragging
                | BehaviorState::Chasing
        ) || self.is_held
            || self.return_state.is_some_and(|s| {
                matches!(
                    s,
                    BehaviorState::Exiting | BehaviorState::Entering | BehaviorState::Chasing
                )
            });
        if !unconstrained && !self.is_within_strip(strip_width + 0.5) {
            return Err(CritterError::AgentUpdate(format!(
                "{} outside strip at x={} while {:?}",
                self.id, self.position.x, self.state
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn agent() -> Agent {
        Agent::new(
            Species::Dog,
            ColorVariant::Golden,
            "Rex".into(),
            64,
            Vec2::new(200.0, 96.0),
            Variation::neutral(),
        )
    }

    #[test]
    fn test_variation_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..200 {
            let v = Variation::sample(&mut rng);
            assert!((0.8..=1.2).contains(&v.speed_factor));
            assert!((0.7..=1.3).contains(&v.duration_factor));
            assert!((0.15..=0.45).contains(&v.edge_exit_probability));
        }
    }

    #[test]
    fn test_spawn_rejects_disallowed_color() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let config = SimulationConfig::default();
        let result = Agent::spawn(Species::Fox, Some(ColorVariant::Lavender), None, &config, &mut rng);
        assert!(matches!(result, Err(CritterError::InvalidColor { .. })));
    }

    #[test]
    fn test_spawn_fills_name_and_places_on_strip() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let config = SimulationConfig::default();
        let agent = Agent::spawn(Species::Ghost, None, Some("  ".into()), &config, &mut rng).unwrap();
        assert!(Species::Ghost.descriptor().names.contains(&agent.name.as_str()));
        assert!(agent.is_within_strip(config.strip_width));
        assert_eq!(agent.position.y, config.floor_y - config.float_height);
        assert!(agent.state_duration > 0.0);
    }

    #[test]
    fn test_interrupt_keeps_original_return_state() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut events = Vec::new();
        let mut a = agent();
        a.enter_state(BehaviorState::Walking, &mut rng, &mut events);
        a.interrupt(BehaviorState::Happy, &mut rng, &mut events);
        a.interrupt(BehaviorState::Dragging, &mut rng, &mut events);
        assert_eq!(a.return_state, Some(BehaviorState::Walking));
    }

    #[test]
    fn test_hover_mid_chase_resumes_chase() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut events = Vec::new();
        let mut a = agent();
        a.interrupt(BehaviorState::Chasing, &mut rng, &mut events);
        a.interrupt(BehaviorState::Happy, &mut rng, &mut events);
        assert_eq!(a.return_state, Some(BehaviorState::Chasing));
    }

    #[test]
    fn test_grab_and_release_restore_floor() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let config = SimulationConfig::default();
        let mut events = Vec::new();
        let mut a = agent();
        a.enter_state(BehaviorState::Sleeping, &mut rng, &mut events);
        a.grab(&mut rng, &mut events);
        assert!(a.is_held);
        assert_eq!(a.state, BehaviorState::Dragging);

        a.drag_to(500.0, 10.0, &mut events);
        a.release(500.0, &config, &mut rng, &mut events);
        assert!(!a.is_held);
        assert_eq!(a.position, Vec2::new(500.0, config.floor_y));
        assert_eq!(a.state, BehaviorState::Sleeping);
    }

    #[test]
    fn test_release_off_strip_is_clamped() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let config = SimulationConfig::default();
        let mut events = Vec::new();
        let mut a = agent();
        a.grab(&mut rng, &mut events);
        a.release(config.strip_width + 300.0, &config, &mut rng, &mut events);
        assert_eq!(a.state, BehaviorState::Idle);
        assert!(a.is_within_strip(config.strip_width));
    }

    #[test]
    fn test_state_change_events() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut events = Vec::new();
        let mut a = agent();
        a.enter_state(BehaviorState::Idle, &mut rng, &mut events);
        assert!(events.is_empty());
        a.enter_state(BehaviorState::Running, &mut rng, &mut events);
        assert!(matches!(
            events[0],
            AgentEvent::StateChanged {
                from: BehaviorState::Idle,
                to: BehaviorState::Running
            }
        ));
    }

    #[test]
    fn test_invariants_flag_bad_frame() {
        let mut a = agent();
        assert!(a.check_invariants(4, 1280.0).is_ok());
        a.animation.frame = 9;
        assert!(a.check_invariants(4, 1280.0).is_err());
    }
}
