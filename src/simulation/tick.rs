//! Tick scheduler - orchestrates simulation updates
//!
//! One call to `Scheduler::tick` advances everything by `dt` seconds in a fixed
//! order:
//! deferred actions -> ball physics -> per-agent update -> ball bookkeeping
//! -> proximity greeting -> autonomous throw -> counters
//!
//! Agents are updated sequentially over a snapshot of the registry. Each
//! update runs under `catch_unwind`, so one misbehaving agent is logged and
//! reset instead of taking the tick down.
//!
//! Lock order is tick state, then registry, then individual agents. Commands
//! follow the same order.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::config::SimulationConfig;
use crate::core::error::{CritterError, Result};
use crate::core::types::{AgentId, SpeedSetting, Tick};
use crate::entity::agent::Agent;
use crate::entity::behavior::{
    roll_random_behavior, update_behavior, BehaviorState, RandomBehaviorKind,
};
use crate::entity::species::{ColorVariant, Species};
use crate::persistence::roster::RosterEntry;
use crate::renderer::artwork::{ArtworkRenderer, FrameKey, MAX_RENDER_SIZE};
use crate::renderer::cache::FrameCache;
use crate::simulation::ball::{
    can_fetch, chase_step, select_chaser, Ball, BallState, ChaseCandidate,
};
use crate::simulation::deferred::{DeferredAction, DeferredQueue};
use crate::simulation::events::{AgentEvent, SimulationEvent};
use crate::simulation::movement::update_movement;
use crate::simulation::proximity::{ProximityDetector, ProximitySample};
use crate::simulation::registry::{lock_agent, AgentRegistry, SharedAgent};

const GREETINGS: [&str; 5] = ["Hi!", "Hello!", "Hey there!", "Oh, hi!", "Yo!"];
const CHEERS: [&str; 3] = ["Yay!", "Woohoo!", "Nice!"];
const CONSOLATIONS: [&str; 3] = ["Oh no...", "Aww...", "Next time!"];

/// Mutable state only the tick (and commands, briefly) touch
struct TickState {
    rng: ChaCha8Rng,
    ball: Option<Ball>,
    next_ball_id: u64,
    proximity: ProximityDetector,
    deferred: DeferredQueue,
    tick: Tick,
    /// Simulated seconds since start
    elapsed: f64,
    last_throw_at: Option<f64>,
    suspended: bool,
    /// Notifications raised by commands, delivered with the next tick
    pending: Vec<SimulationEvent>,
}

/// The simulation engine
pub struct Scheduler {
    config: SimulationConfig,
    registry: AgentRegistry,
    state: Mutex<TickState>,
    cache: Arc<FrameCache>,
    renderer: Arc<dyn ArtworkRenderer>,
}

impl Scheduler {
    pub fn new(config: SimulationConfig, renderer: Arc<dyn ArtworkRenderer>) -> Result<Self> {
        let cache = Arc::new(FrameCache::new(config.cache_capacity));
        Self::with_cache(config, renderer, cache)
    }

    /// Build a scheduler sharing an existing frame cache
    pub fn with_cache(
        config: SimulationConfig,
        renderer: Arc<dyn ArtworkRenderer>,
        cache: Arc<FrameCache>,
    ) -> Result<Self> {
        config.validate().map_err(CritterError::Config)?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let state = TickState {
            rng,
            ball: None,
            next_ball_id: 1,
            proximity: ProximityDetector::new(config.greeting_cooldown),
            deferred: DeferredQueue::new(),
            tick: 0,
            elapsed: 0.0,
            last_throw_at: None,
            suspended: false,
            pending: Vec::new(),
        };
        Ok(Self {
            config,
            registry: AgentRegistry::new(),
            state: Mutex::new(state),
            cache,
            renderer,
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, TickState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<FrameCache> {
        &self.cache
    }

    pub fn tick_count(&self) -> Tick {
        self.lock_state().tick
    }

    pub fn elapsed(&self) -> f64 {
        self.lock_state().elapsed
    }

    pub fn agent_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_suspended(&self) -> bool {
        self.lock_state().suspended
    }

    /// Copy of the ball currently in play
    pub fn ball(&self) -> Option<Ball> {
        self.lock_state().ball.clone()
    }

    /// Copies of every agent, in registry order
    pub fn agents(&self) -> Vec<Agent> {
        self.registry
            .snapshot()
            .iter()
            .map(|shared| lock_agent(shared).clone())
            .collect()
    }

    pub fn agent(&self, id: AgentId) -> Option<Agent> {
        self.registry.get(id).map(|shared| lock_agent(&shared).clone())
    }

    // ------------------------------------------------------------------
    // Population
    // ------------------------------------------------------------------

    /// Create an agent through the species factory and add it
    pub fn spawn_agent(
        &self,
        species: Species,
        color: Option<ColorVariant>,
        name: Option<String>,
    ) -> Result<AgentId> {
        let mut state = self.lock_state();
        self.ensure_capacity()?;
        let agent = Agent::spawn(species, color, name, &self.config, &mut state.rng)?;
        Ok(self.insert_agent(&mut state, agent))
    }

    /// Add an already-built agent
    pub fn add_agent(&self, agent: Agent) -> Result<AgentId> {
        let max = self.max_agent_size();
        if agent.size == 0 || agent.size > max {
            return Err(CritterError::InvalidSize {
                size: agent.size,
                max,
            });
        }
        let mut state = self.lock_state();
        self.ensure_capacity()?;
        Ok(self.insert_agent(&mut state, agent))
    }

    fn max_agent_size(&self) -> u32 {
        self.config.max_agent_size().min(MAX_RENDER_SIZE)
    }

    fn ensure_capacity(&self) -> Result<()> {
        if self.registry.len() >= self.config.max_agents {
            return Err(CritterError::PopulationFull(self.config.max_agents));
        }
        Ok(())
    }

    fn insert_agent(&self, state: &mut TickState, agent: Agent) -> AgentId {
        let id = agent.id;
        tracing::info!(agent = %id, name = %agent.name, species = ?agent.species, "agent added");
        self.cache
            .prewarm(Arc::clone(&self.renderer), self.frame_keys(&agent));
        self.registry.insert(agent);
        state.pending.push(SimulationEvent::AgentAdded(id));
        id
    }

    /// Every frame an agent can show
    fn frame_keys(&self, agent: &Agent) -> Vec<FrameKey> {
        BehaviorState::ALL
            .iter()
            .flat_map(|&state| {
                (0..self.renderer.frame_count(state)).map(move |frame| FrameKey {
                    species: agent.species,
                    color: agent.color,
                    state,
                    frame,
                    size: agent.size,
                })
            })
            .collect()
    }

    pub fn remove_agent(&self, id: AgentId) -> Result<()> {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        self.registry
            .remove(id)
            .ok_or(CritterError::AgentNotFound(id))?;
        state.deferred.cancel_for_agent(id);

        if let Some(ball) = state.ball.as_mut() {
            if ball.chaser == Some(id) {
                // Let someone else have it on the next tick
                ball.chaser = None;
                state.deferred.schedule(
                    state.elapsed,
                    DeferredAction::AssignChaser { ball_id: ball.id },
                );
            }
            if ball.thrower == Some(id) {
                ball.thrower = None;
            }
        }

        tracing::info!(agent = %id, "agent removed");
        state.pending.push(SimulationEvent::AgentRemoved(id));
        Ok(())
    }

    /// Remove everyone. The ball goes too, since nobody is left to fetch it.
    pub fn remove_all(&self) -> usize {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        let removed = self.registry.clear();
        state.deferred.clear();
        if let Some(ball) = state.ball.take() {
            state.pending.push(SimulationEvent::BallLost { ball_id: ball.id });
        }
        for shared in &removed {
            let id = lock_agent(shared).id;
            state.pending.push(SimulationEvent::AgentRemoved(id));
        }
        tracing::info!(count = removed.len(), "removed all agents");
        removed.len()
    }

    /// Identity of every agent, for saving
    pub fn roster(&self) -> Vec<RosterEntry> {
        self.registry
            .snapshot()
            .iter()
            .map(|shared| RosterEntry::from(&*lock_agent(shared)))
            .collect()
    }

    /// Re-create agents from a saved roster. Invalid entries are skipped.
    pub fn restore_roster(&self, entries: &[RosterEntry]) -> usize {
        let mut restored = 0;
        for entry in entries {
            let mut state = self.lock_state();
            if let Err(e) = self.ensure_capacity() {
                tracing::warn!(error = %e, skipped = entries.len() - restored, "roster larger than population cap");
                break;
            }
            let agent = Agent::spawn(
                entry.species,
                Some(entry.color),
                Some(entry.name.clone()),
                &self.config,
                &mut state.rng,
            );
            match agent {
                Ok(mut agent) => {
                    if (1..=self.max_agent_size()).contains(&entry.size) {
                        agent.size = entry.size;
                        agent.pull_into_strip(&self.config);
                    } else {
                        tracing::warn!(name = %entry.name, size = entry.size, "bad saved size, using default");
                    }
                    self.insert_agent(&mut state, agent);
                    restored += 1;
                }
                Err(e) => tracing::warn!(name = %entry.name, error = %e, "skipping roster entry"),
            }
        }
        restored
    }

    // ------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------

    /// Run `f` on one agent under the state lock, queueing its notifications
    fn with_agent<T>(
        &self,
        id: AgentId,
        f: impl FnOnce(&mut Agent, &mut TickState, &mut Vec<AgentEvent>) -> T,
    ) -> Result<T> {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        let shared = self.registry.get(id).ok_or(CritterError::AgentNotFound(id))?;
        let mut agent = lock_agent(&shared);
        let mut events = Vec::new();
        let out = f(&mut agent, state, &mut events);
        push_agent_events(&mut state.pending, id, events);
        Ok(out)
    }

    /// Pointer over an agent cheers it up
    pub fn hover(&self, id: AgentId) -> Result<()> {
        self.with_agent(id, |agent, state, events| {
            if !agent.is_held && agent.state != BehaviorState::Happy {
                agent.interrupt(BehaviorState::Happy, &mut state.rng, events);
            }
        })
    }

    pub fn grab(&self, id: AgentId) -> Result<()> {
        self.with_agent(id, |agent, state, events| agent.grab(&mut state.rng, events))
    }

    pub fn drag(&self, id: AgentId, x: f32, y: f32) -> Result<()> {
        self.with_agent(id, |agent, _, events| agent.drag_to(x, y, events))
    }

    pub fn release(&self, id: AgentId, x: f32) -> Result<()> {
        self.with_agent(id, |agent, state, events| {
            agent.release(x, &self.config, &mut state.rng, events)
        })
    }

    pub fn set_speed(&self, id: AgentId, speed: SpeedSetting) -> Result<()> {
        self.with_agent(id, |agent, _, _| agent.speed = speed)
    }

    /// Throw a ball from `x` (its centre) at `velocity` px/s
    ///
    /// A ball already in play is replaced. Returns the new ball's id.
    pub fn throw_ball(&self, x: f32, velocity: f32) -> u64 {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        let mut events = std::mem::take(&mut state.pending);
        let id = self.launch_ball(state, x, velocity, None, &mut events);
        state.pending = events;
        id
    }

    /// Throw from a random spot in a random direction
    pub fn throw_ball_random(&self) -> u64 {
        let (x, velocity) = {
            let mut state = self.lock_state();
            let max_x = (self.config.strip_width - self.config.ball_size).max(0.0);
            let x = state.rng.gen_range(0.0..=max_x) + self.config.ball_size / 2.0;
            let speed = state
                .rng
                .gen_range(self.config.throw_speed_min..=self.config.throw_speed_max);
            let sign = if state.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            (x, speed * sign)
        };
        self.throw_ball(x, velocity)
    }

    fn launch_ball(
        &self,
        state: &mut TickState,
        center_x: f32,
        velocity: f32,
        thrower: Option<AgentId>,
        events: &mut Vec<SimulationEvent>,
    ) -> u64 {
        if let Some(old) = state.ball.take() {
            tracing::debug!(ball = old.id, "replacing ball in play");
            events.push(SimulationEvent::BallLost { ball_id: old.id });
        }

        let id = state.next_ball_id;
        state.next_ball_id += 1;
        let ball = Ball::thrown(
            id,
            center_x - self.config.ball_size / 2.0,
            velocity,
            thrower,
            &self.config,
        );
        events.push(SimulationEvent::BallThrown {
            ball_id: id,
            x: ball.x,
            velocity,
            thrower,
        });
        state.ball = Some(ball);
        state.last_throw_at = Some(state.elapsed);
        state.deferred.schedule(
            state.elapsed + self.config.throw_assign_delay as f64,
            DeferredAction::AssignChaser { ball_id: id },
        );
        tracing::debug!(ball = id, velocity, ?thrower, "ball thrown");
        id
    }

    /// Everyone celebrates an external success
    pub fn celebrate(&self) {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        for shared in self.registry.snapshot() {
            let mut agent = lock_agent(&shared);
            if agent.is_held {
                continue;
            }
            let mut events = Vec::new();
            agent.interrupt(BehaviorState::Happy, &mut state.rng, &mut events);
            if let Some(line) = CHEERS.choose(&mut state.rng) {
                events.push(AgentEvent::Speech((*line).to_string()));
            }
            push_agent_events(&mut state.pending, agent.id, events);
        }
    }

    /// Everyone droops after an external failure
    pub fn commiserate(&self) {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        let now = state.elapsed;
        for shared in self.registry.snapshot() {
            let mut agent = lock_agent(&shared);
            if agent.is_held {
                continue;
            }
            let mut events = Vec::new();
            start_random_behavior(&mut agent, RandomBehaviorKind::Droop, state, now, &mut events);
            if let Some(line) = CONSOLATIONS.choose(&mut state.rng) {
                events.push(AgentEvent::Speech((*line).to_string()));
            }
            push_agent_events(&mut state.pending, agent.id, events);
        }
    }

    /// Pause or resume the simulation. A suspended tick only flushes queued notifications.
    pub fn set_suspended(&self, suspended: bool) {
        let mut state = self.lock_state();
        if state.suspended != suspended {
            tracing::info!(suspended, "scheduler suspension changed");
        }
        state.suspended = suspended;
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance the simulation by `dt` seconds and return what happened, in order
    pub fn tick(&self, dt: f32) -> Vec<SimulationEvent> {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        let mut events = std::mem::take(&mut state.pending);

        if state.suspended {
            return events;
        }
        if !dt.is_finite() || dt < 0.0 {
            tracing::warn!(dt, "ignoring tick with invalid delta");
            return events;
        }

        let now = state.elapsed + dt as f64;

        // 1. Deferred actions
        for action in state.deferred.drain_due(now) {
            self.run_deferred(state, action, now, &mut events);
        }

        // 2. Ball physics
        if let Some(ball) = state.ball.as_mut() {
            ball.step(dt, &self.config);
        }

        // 3-4. Agents, over a snapshot
        let agents = self.registry.snapshot();
        for shared in &agents {
            let mut agent = lock_agent(shared);
            let id = agent.id;
            let mut agent_events = Vec::new();

            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                self.update_agent(&mut agent, state, dt, now, &mut agent_events)
            }));
            let failure = match result {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(payload) => Some(panic_message(payload.as_ref())),
            };
            if let Some(reason) = failure {
                tracing::warn!(agent = %id, %reason, "agent update failed, resetting agent");
                self.reset_agent(&mut agent, state, &mut agent_events);
            }

            push_agent_events(&mut events, id, agent_events);
        }

        // Caught or orphaned ball
        self.settle_ball(state, &agents, &mut events);

        // 5. Greetings
        let samples: Vec<ProximitySample> = agents
            .iter()
            .map(|shared| ProximitySample::of(&lock_agent(shared)))
            .collect();
        if let Some((first, second)) = state.proximity.detect(dt, &samples) {
            self.greet(state, first, second, &mut events);
        }

        // 6. Autonomous throw
        self.maybe_throw(state, &agents, dt, now, &mut events);

        // 7. Counters
        state.tick += 1;
        state.elapsed = now;
        events
    }

    fn update_agent(
        &self,
        agent: &mut Agent,
        state: &mut TickState,
        dt: f32,
        now: f64,
        events: &mut Vec<AgentEvent>,
    ) -> Result<()> {
        let before = agent.position;

        if agent.is_held {
            // Only the drag animation runs while held
        } else if agent.state == BehaviorState::Chasing {
            chase_step(agent, state.ball.as_mut(), dt, &self.config, &mut state.rng, events);
        } else {
            update_behavior(agent, dt, &self.config, &mut state.rng, events);
            update_movement(agent, dt, &self.config, &mut state.rng, events);
            if let Some(kind) = roll_random_behavior(
                agent,
                dt,
                self.config.random_behavior_rate,
                &mut state.rng,
            ) {
                start_random_behavior(agent, kind, state, now, events);
            }
        }

        let frame_count = self.renderer.frame_count(agent.state);
        let frame_duration = self.renderer.frame_duration(agent.state);
        agent.animation.advance(dt, frame_count, frame_duration);
        self.refresh_frame(agent, events);

        if agent.position != before {
            events.push(AgentEvent::PositionChanged {
                x: agent.position.x,
                y: agent.position.y,
            });
        }

        agent.check_invariants(frame_count, self.config.strip_width)
    }

    /// Fetch the current frame's image if it changed since the last tick
    fn refresh_frame(&self, agent: &mut Agent, events: &mut Vec<AgentEvent>) {
        let key = agent.frame_key();
        if agent.image_key == Some(key) {
            return;
        }
        agent.image_key = Some(key);
        let image = match self.cache.get_or_render(&key, self.renderer.as_ref()) {
            Ok(image) => {
                agent.image = Some(Arc::clone(&image));
                Some(image)
            }
            Err(e) => {
                // Keep showing the previous frame
                tracing::debug!(agent = %agent.id, ?key, error = %e, "frame render failed");
                None
            }
        };
        events.push(AgentEvent::FrameChanged {
            state: key.state,
            frame: key.frame,
            image,
        });
    }

    /// Put a failed agent back into a known-good state
    fn reset_agent(&self, agent: &mut Agent, state: &mut TickState, events: &mut Vec<AgentEvent>) {
        agent.is_held = false;
        agent.return_state = None;
        agent.random_behavior = None;
        if !agent.position.y.is_finite() {
            agent.position.y = agent
                .species
                .descriptor()
                .resting_y(self.config.floor_y, self.config.float_height);
        }
        agent.pull_into_strip(&self.config);
        agent.enter_state(BehaviorState::Idle, &mut state.rng, events);
        agent.animation.reset();
    }

    fn run_deferred(
        &self,
        state: &mut TickState,
        action: DeferredAction,
        now: f64,
        events: &mut Vec<SimulationEvent>,
    ) {
        match action {
            DeferredAction::AssignChaser { ball_id } => self.assign_chaser(state, ball_id, now, events),
            DeferredAction::EndRandomBehavior { agent, kind } => {
                let Some(shared) = self.registry.get(agent) else {
                    return;
                };
                let mut guard = lock_agent(&shared);
                if guard.random_behavior == Some(kind) {
                    guard.random_behavior = None;
                    events.push(SimulationEvent::agent(
                        agent,
                        AgentEvent::RandomBehaviorEnded(kind),
                    ));
                }
            }
        }
    }

    /// Pick the one agent that fetches the ball
    ///
    /// With nobody eligible, a rolling ball tries again after another delay and
    /// a ball at rest is dropped.
    fn assign_chaser(
        &self,
        state: &mut TickState,
        ball_id: u64,
        now: f64,
        events: &mut Vec<SimulationEvent>,
    ) {
        let Some(ball) = state.ball.as_ref() else {
            return;
        };
        if ball.id != ball_id || !ball.is_active() || ball.chaser.is_some() {
            return;
        }

        let agents = self.registry.snapshot();
        let candidates: Vec<ChaseCandidate> = agents
            .iter()
            .filter_map(|shared| {
                let agent = lock_agent(shared);
                can_fetch(&agent).then(|| ChaseCandidate {
                    id: agent.id,
                    center_x: agent.center_x(),
                })
            })
            .collect();

        let Some(chaser) = select_chaser(&candidates, ball.center_x(), ball.thrower) else {
            if ball.state == BallState::Rolling {
                state.deferred.schedule(
                    now + self.config.throw_assign_delay as f64,
                    DeferredAction::AssignChaser { ball_id },
                );
            } else {
                tracing::debug!(ball = ball_id, "nobody to fetch the ball, dropping it");
                state.ball = None;
                events.push(SimulationEvent::BallLost { ball_id });
            }
            return;
        };

        if let Some(shared) = agents.iter().find(|shared| lock_agent(shared).id == chaser) {
            let mut agent = lock_agent(shared);
            let mut agent_events = Vec::new();
            agent.random_behavior = None;
            agent.interrupt(BehaviorState::Chasing, &mut state.rng, &mut agent_events);
            push_agent_events(events, chaser, agent_events);
        }
        if let Some(ball) = state.ball.as_mut() {
            ball.chaser = Some(chaser);
        }
        tracing::debug!(ball = ball_id, agent = %chaser, "chaser assigned");
        events.push(SimulationEvent::ChaseAssigned { ball_id, chaser });
    }

    /// Remove a caught ball and free a ball whose chaser gave up
    fn settle_ball(
        &self,
        state: &mut TickState,
        agents: &[SharedAgent],
        events: &mut Vec<SimulationEvent>,
    ) {
        let Some(ball) = state.ball.as_mut() else {
            return;
        };

        if ball.state == BallState::Caught {
            let ball_id = ball.id;
            let by = ball.chaser;
            state.ball = None;
            match by {
                Some(by) => {
                    tracing::debug!(ball = ball_id, agent = %by, "ball caught");
                    events.push(SimulationEvent::BallCaught { ball_id, by });
                }
                None => events.push(SimulationEvent::BallLost { ball_id }),
            }
            return;
        }

        let Some(chaser) = ball.chaser else {
            return;
        };
        let still_chasing = agents.iter().any(|shared| {
            let agent = lock_agent(shared);
            agent.id == chaser
                && (agent.state == BehaviorState::Chasing
                    || agent.return_state == Some(BehaviorState::Chasing))
        });
        if !still_chasing {
            tracing::debug!(ball = ball.id, agent = %chaser, "chaser dropped out, reassigning");
            ball.chaser = None;
            let ball_id = ball.id;
            state.deferred.schedule(
                state.elapsed,
                DeferredAction::AssignChaser { ball_id },
            );
        }
    }

    fn greet(
        &self,
        state: &mut TickState,
        first: AgentId,
        second: AgentId,
        events: &mut Vec<SimulationEvent>,
    ) {
        for id in [first, second] {
            let Some(shared) = self.registry.get(id) else {
                continue;
            };
            let mut agent = lock_agent(&shared);
            let mut agent_events = Vec::new();
            agent.interrupt(BehaviorState::Happy, &mut state.rng, &mut agent_events);
            if let Some(line) = GREETINGS.choose(&mut state.rng) {
                agent_events.push(AgentEvent::Speech((*line).to_string()));
            }
            push_agent_events(events, id, agent_events);
        }
        tracing::debug!(%first, %second, "greeting");
        events.push(SimulationEvent::Greeting { first, second });
    }

    /// Occasionally an idle or walking agent throws a ball on its own
    fn maybe_throw(
        &self,
        state: &mut TickState,
        agents: &[SharedAgent],
        dt: f32,
        now: f64,
        events: &mut Vec<SimulationEvent>,
    ) {
        if state.ball.is_some() {
            return;
        }
        let since_last = now - state.last_throw_at.unwrap_or(0.0);
        if since_last < self.config.autonomous_throw_cooldown as f64 {
            return;
        }
        if state.rng.gen::<f32>() >= self.config.autonomous_throw_rate * dt {
            return;
        }

        let throwers: Vec<(AgentId, f32, f32)> = agents
            .iter()
            .filter_map(|shared| {
                let agent = lock_agent(shared);
                let eligible = !agent.is_held
                    && matches!(agent.state, BehaviorState::Idle | BehaviorState::Walking);
                eligible.then(|| (agent.id, agent.center_x(), agent.direction.sign()))
            })
            .collect();
        let Some(&(thrower, x, sign)) = throwers.choose(&mut state.rng) else {
            return;
        };

        let speed = state
            .rng
            .gen_range(self.config.throw_speed_min..=self.config.throw_speed_max);
        // Throw time is the end of this tick
        state.elapsed = now;
        self.launch_ball(state, x, speed * sign, Some(thrower), events);
        tracing::info!(agent = %thrower, "autonomous throw");
    }
}

fn start_random_behavior(
    agent: &mut Agent,
    kind: RandomBehaviorKind,
    state: &mut TickState,
    now: f64,
    events: &mut Vec<AgentEvent>,
) {
    let duration = kind.duration();
    agent.random_behavior = Some(kind);
    events.push(AgentEvent::RandomBehavior { kind, duration });
    state.deferred.schedule(
        now + duration as f64,
        DeferredAction::EndRandomBehavior {
            agent: agent.id,
            kind,
        },
    );
}

fn push_agent_events(out: &mut Vec<SimulationEvent>, id: AgentId, events: Vec<AgentEvent>) {
    out.extend(events.into_iter().map(|event| SimulationEvent::agent(id, event)));
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during agent update".to_string()
    }
}
