//! Behavior and boundary integration tests

use critters::core::config::SimulationConfig;
use critters::core::types::{Direction, Vec2};
use critters::entity::agent::{Agent, Variation};
use critters::entity::behavior::{update_behavior, BehaviorState};
use critters::entity::species::{ColorVariant, Species};
use critters::renderer::artwork::SilhouetteRenderer;
use critters::simulation::events::{AgentEvent, SimulationEvent};
use critters::simulation::tick::Scheduler;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

fn seeded_scheduler(seed: u64) -> Scheduler {
    let config = SimulationConfig {
        seed: Some(seed),
        ..SimulationConfig::default()
    };
    Scheduler::new(config, Arc::new(SilhouetteRenderer)).unwrap()
}

fn cat(x: f32, variation: Variation) -> Agent {
    Agent::new(
        Species::Cat,
        ColorVariant::Gray,
        "Tofu".into(),
        64,
        Vec2::new(x, 96.0),
        variation,
    )
}

#[test]
fn test_idle_transitions_on_fifth_second() {
    let config = SimulationConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let mut events = Vec::new();
    let mut agent = cat(200.0, Variation::neutral());
    agent.state_duration = 5.0;

    for tick in 1..=5 {
        let changed = update_behavior(&mut agent, 1.0, &config, &mut rng, &mut events);
        assert_eq!(changed, tick == 5, "tick {}", tick);
    }
    assert_eq!(agent.state_timer, 0.0);
    assert!(matches!(
        agent.state,
        BehaviorState::Idle | BehaviorState::Walking | BehaviorState::Running | BehaviorState::Sleeping
    ));
}

#[test]
fn test_wall_bounce_without_exit() {
    let scheduler = seeded_scheduler(3);
    let width = scheduler.config().strip_width;
    let mut agent = cat(
        width - 1.0,
        Variation {
            edge_exit_probability: 0.0,
            ..Variation::neutral()
        },
    );
    agent.state = BehaviorState::Walking;
    agent.state_duration = 1000.0;
    agent.direction = Direction::Right;
    let id = scheduler.add_agent(agent).unwrap();

    scheduler.tick(1.0 / 30.0);
    let agent = scheduler.agent(id).unwrap();
    assert_eq!(agent.position.x, width - 64.0);
    assert_eq!(agent.direction, Direction::Left);

    for _ in 0..3000 {
        for event in scheduler.tick(1.0 / 30.0) {
            if let SimulationEvent::Agent {
                event: AgentEvent::StateChanged { to, .. },
                ..
            } = event
            {
                assert_ne!(to, BehaviorState::Exiting);
            }
        }
        let agent = scheduler.agent(id).unwrap();
        assert!(agent.is_within_strip(width));
    }
}

#[test]
fn test_wanderer_always_comes_back() {
    let scheduler = seeded_scheduler(11);
    let width = scheduler.config().strip_width;
    let mut agent = cat(
        width - 70.0,
        Variation {
            edge_exit_probability: 1.0,
            ..Variation::neutral()
        },
    );
    agent.state = BehaviorState::Walking;
    agent.state_duration = 1000.0;
    agent.direction = Direction::Right;
    let id = scheduler.add_agent(agent).unwrap();

    let mut exited = false;
    let mut back_walking = false;
    for _ in 0..1800 {
        scheduler.tick(1.0 / 30.0);
        let agent = scheduler.agent(id).unwrap();
        if agent.state == BehaviorState::Exiting {
            exited = true;
        }
        if exited && agent.state == BehaviorState::Walking {
            back_walking = true;
            let margin = agent.width() / 2.0;
            assert!(agent.position.x >= margin - 1e-3);
            assert!(agent.position.x + agent.width() <= width - margin + 1e-3);
            break;
        }
    }
    assert!(exited, "agent never left the strip");
    assert!(back_walking, "agent never walked back in");
}

#[test]
fn test_sleeping_emits_resting_once() {
    let scheduler = seeded_scheduler(5);
    let mut agent = cat(300.0, Variation::neutral());
    agent.state_duration = 0.01;
    let id = scheduler.add_agent(agent).unwrap();

    // Put the agent to sleep directly; the tick must not repeat the notification
    {
        let shared = scheduler.registry().get(id).unwrap();
        let mut guard = shared.lock().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut events = Vec::new();
        guard.enter_state(BehaviorState::Sleeping, &mut rng, &mut events);
        assert!(events.iter().any(|e| matches!(e, AgentEvent::Resting)));
    }

    let events = scheduler.tick(0.1);
    let resting = events
        .iter()
        .filter(|e| matches!(e, SimulationEvent::Agent { event: AgentEvent::Resting, .. }))
        .count();
    assert_eq!(resting, 0);
}

#[test]
fn test_speed_tier_scales_travel() {
    let slow = seeded_scheduler(9);
    let fast = seeded_scheduler(9);
    let mut ids = Vec::new();
    for (scheduler, speed) in [
        (&slow, critters::core::types::SpeedSetting::VerySlow),
        (&fast, critters::core::types::SpeedSetting::VeryFast),
    ] {
        let mut agent = cat(100.0, Variation::neutral());
        agent.state = BehaviorState::Walking;
        agent.state_duration = 1000.0;
        agent.direction = Direction::Right;
        let id = scheduler.add_agent(agent).unwrap();
        scheduler.set_speed(id, speed).unwrap();
        ids.push(id);
    }

    slow.tick(1.0);
    fast.tick(1.0);
    let slow_x = slow.agent(ids[0]).unwrap().position.x;
    let fast_x = fast.agent(ids[1]).unwrap().position.x;
    assert!((slow_x - 120.0).abs() < 1e-3);
    assert!((fast_x - 180.0).abs() < 1e-3);
}
