// Simulated Load Source (demo deployments without real agent telemetry)

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Mutex;
use switchboard_core::application::CapabilityRegistry;
use switchboard_core::domain::AgentType;
use switchboard_core::error::{AppError, Result};
use switchboard_core::port::LoadSource;

/// Draws each reading uniformly from `[0, capacity]`
pub struct SimulatedLoadSource {
    capacities: HashMap<AgentType, u32>,
    rng: Mutex<StdRng>,
}

impl SimulatedLoadSource {
    /// Seeded sources repeat the same sequence of readings
    pub fn new(registry: &CapabilityRegistry, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            capacities: registry
                .list_all()
                .iter()
                .map(|p| (p.agent, p.max_concurrent))
                .collect(),
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait]
impl LoadSource for SimulatedLoadSource {
    async fn current_load(&self, agent: AgentType) -> Result<u32> {
        let capacity = *self
            .capacities
            .get(&agent)
            .ok_or_else(|| AppError::load_source(agent, "agent not registered"))?;

        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Ok(rng.gen_range(0..=capacity))
    }
}
