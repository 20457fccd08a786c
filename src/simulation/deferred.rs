//! Actions scheduled for a later point in simulation time
//!
//! Delayed work (picking a ball's chaser, ending an idle fidget) is queued
//! here against elapsed simulation seconds and run by the scheduler at the
//! start of the first tick that reaches it. Dropping the queue just means the
//! work never happens.

use crate::core::types::AgentId;
use crate::entity::behavior::RandomBehaviorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    /// Pick a chaser for the ball with this id, if it is still around
    AssignChaser { ball_id: u64 },
    /// Clear an agent's random behavior if it is still the same one
    EndRandomBehavior {
        agent: AgentId,
        kind: RandomBehaviorKind,
    },
}

impl DeferredAction {
    fn concerns(&self, id: AgentId) -> bool {
        matches!(self, DeferredAction::EndRandomBehavior { agent, .. } if *agent == id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeferredQueue {
    // Kept sorted by due time; equal times keep insertion order
    entries: Vec<(f64, DeferredAction)>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn schedule(&mut self, due: f64, action: DeferredAction) {
        let pos = self.entries.partition_point(|(t, _)| *t <= due);
        self.entries.insert(pos, (due, action));
    }

    /// Remove and return every action due at or before `now`, earliest first
    pub fn drain_due(&mut self, now: f64) -> Vec<DeferredAction> {
        let split = self.entries.partition_point(|(t, _)| *t <= now);
        self.entries.drain(..split).map(|(_, action)| action).collect()
    }

    /// Forget pending work for an agent that is going away
    pub fn cancel_for_agent(&mut self, id: AgentId) {
        self.entries.retain(|(_, action)| !action.concerns(id));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
