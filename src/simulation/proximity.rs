//! Proximity-triggered greetings
//!
//! Every `cooldown` seconds the detector looks for two agents standing close
//! together. The first such pair in registry order greets; the rest wait for
//! the next pass.

use crate::core::types::AgentId;
use crate::entity::agent::Agent;
use crate::entity::behavior::BehaviorState;

/// What the detector needs to know about one agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximitySample {
    pub id: AgentId,
    pub x: f32,
    pub size: f32,
    /// Busy agents (held, asleep, chasing, off-strip, already happy) are skipped
    pub available: bool,
}

impl ProximitySample {
    pub fn of(agent: &Agent) -> Self {
        let available = !agent.is_held
            && !matches!(
                agent.state,
                BehaviorState::Sleeping
                    | BehaviorState::Chasing
                    | BehaviorState::Dragging
                    | BehaviorState::Exiting
                    | BehaviorState::Entering
                    | BehaviorState::Happy
            );
        Self {
            id: agent.id,
            x: agent.position.x,
            size: agent.width(),
            available,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProximityDetector {
    cooldown: f32,
    remaining: f32,
}

impl ProximityDetector {
    /// The first scan happens one full cooldown after creation
    pub fn new(cooldown: f32) -> Self {
        Self {
            cooldown,
            remaining: cooldown,
        }
    }

    /// Seconds until the next scan
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Count down and, when due, scan for a greeting pair
    ///
    /// A due pass resets the cooldown whether or not it found anyone.
    pub fn detect(&mut self, dt: f32, samples: &[ProximitySample]) -> Option<(AgentId, AgentId)> {
        self.remaining -= dt;
        if self.remaining > 0.0 {
            return None;
        }
        self.remaining = self.cooldown;

        if samples.len() < 2 {
            return None;
        }
        find_close_pair(samples)
    }
}

/// First unordered pair, in order, whose horizontal gap is under their combined size
pub fn find_close_pair(samples: &[ProximitySample]) -> Option<(AgentId, AgentId)> {
    for (i, a) in samples.iter().enumerate() {
        if !a.available {
            continue;
        }
        for b in &samples[i + 1..] {
            if !b.available {
                continue;
            }
            if (a.x - b.x).abs() < a.size + b.size {
                return Some((a.id, b.id));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: f32) -> ProximitySample {
        ProximitySample {
            id: AgentId::new(),
            x,
            size: 64.0,
            available: true,
        }
    }

    #[test]
    fn test_not_due_before_cooldown() {
        let mut detector = ProximityDetector::new(8.0);
        let samples = [sample(0.0), sample(10.0)];
        assert!(detector.detect(7.9, &samples).is_none());
        assert!(detector.detect(0.2, &samples).is_some());
    }

    #[test]
    fn test_pass_resets_cooldown_even_without_pair() {
        let mut detector = ProximityDetector::new(8.0);
        let far = [sample(0.0), sample(1000.0)];
        assert!(detector.detect(8.0, &far).is_none());
        assert_eq!(detector.remaining(), 8.0);
    }

    #[test]
    fn test_single_agent_never_greets() {
        let mut detector = ProximityDetector::new(1.0);
        assert!(detector.detect(5.0, &[sample(0.0)]).is_none());
    }

    #[test]
    fn test_first_pair_in_order_wins() {
        let a = sample(0.0);
        let b = sample(500.0);
        let c = sample(520.0);
        let d = sample(30.0);
        // (a, d) comes before (b, c) in pair order
        assert_eq!(find_close_pair(&[a, b, c, d]), Some((a.id, d.id)));
    }

    #[test]
    fn test_unavailable_agents_skipped() {
        let a = ProximitySample {
            available: false,
            ..sample(0.0)
        };
        let b = sample(10.0);
        let c = sample(1000.0);
        assert_eq!(find_close_pair(&[a, b, c]), None);
    }

    #[test]
    fn test_distance_threshold_is_exclusive() {
        let a = sample(0.0);
        let b = sample(128.0);
        assert_eq!(find_close_pair(&[a, b]), None);
        let c = sample(127.9);
        assert!(find_close_pair(&[a, c]).is_some());
    }
}
