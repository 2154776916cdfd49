// Load Source Port
// Supplies the number of in-flight work items per agent

use crate::domain::AgentType;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Live count of in-flight items per agent
///
/// "In flight" includes items already dequeued and being worked, which the
/// pending queue does not see. Reads may be slow or fail when backed by a
/// real store; callers bound them with a timeout.
///
/// Implementations:
/// - InMemoryLoadSource: deterministic counters (tests, embedded use)
/// - SqliteLoadSource (infra-sqlite): counts IN_PROGRESS ledger rows
/// - SimulatedLoadSource (daemon): pseudo-random figures for demos
#[async_trait]
pub trait LoadSource: Send + Sync {
    async fn current_load(&self, agent: AgentType) -> Result<u32>;
}

/// In-memory load counters
#[derive(Default)]
pub struct InMemoryLoadSource {
    loads: Mutex<HashMap<AgentType, u32>>,
    failing: Mutex<HashSet<AgentType>>,
}

impl InMemoryLoadSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loads(loads: impl IntoIterator<Item = (AgentType, u32)>) -> Self {
        let source = Self::new();
        for (agent, load) in loads {
            source.set_load(agent, load);
        }
        source
    }

    pub fn set_load(&self, agent: AgentType, load: u32) {
        self.lock_loads().insert(agent, load);
    }

    pub fn increment(&self, agent: AgentType) {
        *self.lock_loads().entry(agent).or_insert(0) += 1;
    }

    pub fn decrement(&self, agent: AgentType) {
        let mut loads = self.lock_loads();
        let entry = loads.entry(agent).or_insert(0);
        *entry = entry.saturating_sub(1);
    }

    /// Make reads for `agent` fail until `recover` is called
    pub fn fail_for(&self, agent: AgentType) {
        self.lock_failing().insert(agent);
    }

    pub fn recover(&self, agent: AgentType) {
        self.lock_failing().remove(&agent);
    }

    // Poisoning only happens if a holder panicked mid-update of a plain map;
    // the data is still usable.
    fn lock_loads(&self) -> std::sync::MutexGuard<'_, HashMap<AgentType, u32>> {
        self.loads.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_failing(&self) -> std::sync::MutexGuard<'_, HashSet<AgentType>> {
        self.failing.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LoadSource for InMemoryLoadSource {
    async fn current_load(&self, agent: AgentType) -> Result<u32> {
        if self.lock_failing().contains(&agent) {
            return Err(AppError::load_source(agent, "injected failure"));
        }
        Ok(self.lock_loads().get(&agent).copied().unwrap_or(0))
    }
}
