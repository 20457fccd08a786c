//! Per-agent display bindings
//!
//! A display layer registers one channel per agent it shows. The router takes
//! the events a tick returns and forwards each agent's events, in tick order,
//! to that agent's channel. World-level events (throws, catches, greetings)
//! go to an optional world channel.

use ahash::AHashMap;
use std::sync::mpsc::{Receiver, Sender};

use crate::core::types::AgentId;
use crate::simulation::events::{AgentEvent, SimulationEvent};

#[derive(Debug, Default)]
pub struct EventRouter {
    bindings: AHashMap<AgentId, Sender<AgentEvent>>,
    world: Option<Sender<SimulationEvent>>,
}

/// Per-call delivery counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: usize,
    /// Events for agents nobody is watching
    pub unrouted: usize,
    /// Bindings dropped because the receiver went away
    pub dropped_bindings: usize,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a display channel to an agent, replacing any earlier binding
    pub fn bind(&mut self, agent: AgentId, sender: Sender<AgentEvent>) {
        if self.bindings.insert(agent, sender).is_some() {
            tracing::debug!(%agent, "display binding replaced");
        }
    }

    /// Convenience: create a channel, bind its sender and hand back the receiver
    pub fn subscribe(&mut self, agent: AgentId) -> Receiver<AgentEvent> {
        let (tx, rx) = std::sync::mpsc::channel();
        self.bind(agent, tx);
        rx
    }

    pub fn unbind(&mut self, agent: AgentId) -> bool {
        self.bindings.remove(&agent).is_some()
    }

    pub fn is_bound(&self, agent: AgentId) -> bool {
        self.bindings.contains_key(&agent)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Receive every event that is not addressed to a single agent
    pub fn observe_world(&mut self, sender: Sender<SimulationEvent>) {
        self.world = Some(sender);
    }

    /// Forward one tick's events
    pub fn dispatch(&mut self, events: Vec<SimulationEvent>) -> DispatchStats {
        let mut stats = DispatchStats::default();
        for event in events {
            match event {
                SimulationEvent::Agent { agent, event } => {
                    let Some(sender) = self.bindings.get(&agent) else {
                        stats.unrouted += 1;
                        continue;
                    };
                    if sender.send(event).is_ok() {
                        stats.delivered += 1;
                    } else {
                        self.bindings.remove(&agent);
                        stats.dropped_bindings += 1;
                        tracing::debug!(%agent, "display went away, unbinding");
                    }
                }
                other => {
                    if let SimulationEvent::AgentRemoved(id) = &other {
                        self.bindings.remove(id);
                    }
                    let Some(world) = &self.world else {
                        stats.unrouted += 1;
                        continue;
                    };
                    if world.send(other).is_ok() {
                        stats.delivered += 1;
                    } else {
                        self.world = None;
                        stats.dropped_bindings += 1;
                    }
                }
            }
        }
        stats
    }
}
