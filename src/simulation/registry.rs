//! Canonical list of live agents
//!
//! Insertion order is significant: greeting pairs and chase ties are resolved
//! in registry order. A tick works on a snapshot of the handles so commands can
//! add or remove agents without waiting for the tick to finish.

use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::types::AgentId;
use crate::entity::agent::Agent;

pub type SharedAgent = Arc<Mutex<Agent>>;

/// Lock one agent, recovering from a panic in a previous holder
pub fn lock_agent(agent: &SharedAgent) -> MutexGuard<'_, Agent> {
    agent.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: RwLock<Vec<SharedAgent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<SharedAgent>> {
        self.agents.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<SharedAgent>> {
        self.agents.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, agent: Agent) -> SharedAgent {
        let shared = Arc::new(Mutex::new(agent));
        self.write().push(Arc::clone(&shared));
        shared
    }

    /// Remove an agent, returning its last state
    pub fn remove(&self, id: AgentId) -> Option<SharedAgent> {
        let mut agents = self.write();
        let index = agents.iter().position(|a| lock_agent(a).id == id)?;
        Some(agents.remove(index))
    }

    /// Remove everyone, returning the removed handles in registry order
    pub fn clear(&self) -> Vec<SharedAgent> {
        std::mem::take(&mut *self.write())
    }

    /// Clone the current handles; the registry lock is released on return
    pub fn snapshot(&self) -> Vec<SharedAgent> {
        self.read().clone()
    }

    pub fn get(&self, id: AgentId) -> Option<SharedAgent> {
        self.read().iter().find(|a| lock_agent(a).id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<AgentId> {
        self.read().iter().map(|a| lock_agent(a).id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec2;
    use crate::entity::agent::Variation;
    use crate::entity::species::{ColorVariant, Species};

    fn bunny(name: &str) -> Agent {
        Agent::new(
            Species::Bunny,
            ColorVariant::White,
            name.into(),
            64,
            Vec2::new(0.0, 96.0),
            Variation::neutral(),
        )
    }

    #[test]
    fn test_insert_preserves_order() {
        let registry = AgentRegistry::new();
        let a = lock_agent(&registry.insert(bunny("a"))).id;
        let b = lock_agent(&registry.insert(bunny("b"))).id;
        assert_eq!(registry.ids(), vec![a, b]);
    }

    #[test]
    fn test_remove_and_get() {
        let registry = AgentRegistry::new();
        let a = lock_agent(&registry.insert(bunny("a"))).id;
        assert!(registry.get(a).is_some());
        assert!(registry.remove(a).is_some());
        assert!(registry.get(a).is_none());
        assert!(registry.remove(a).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_survives_removal() {
        let registry = AgentRegistry::new();
        let a = lock_agent(&registry.insert(bunny("a"))).id;
        let snapshot = registry.snapshot();
        registry.remove(a);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(lock_agent(&snapshot[0]).id, a);
    }
}
