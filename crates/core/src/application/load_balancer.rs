//! Load Balancer - picks the least loaded capable agent
//!
//! Ranking policy: among agents that declare the category, choose the one
//! with the smallest `current_load / max_concurrent` ratio. Ties go to the
//! agent declared first in the registry. Ratios are compared by
//! cross-multiplication, so equal ratios tie exactly.
//!
//! Every Load Source read is bounded by `load_timeout`. An agent whose read
//! fails or times out is left out of the ranking; if no eligible agent can be
//! read, selection fails with `AppError::LoadUnavailable`.

use crate::application::registry::CapabilityRegistry;
use crate::domain::{AgentProfile, AgentType, Category};
use crate::error::{AppError, Result};
use crate::port::LoadSource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default bound on a single Load Source read
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_millis(500);

/// Load figures for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLoad {
    pub agent: AgentType,
    pub capacity: u32,
    /// None when the Load Source could not be read for this agent
    pub current_load: Option<u32>,
    pub utilization_percentage: Option<f64>,
    pub available: bool,
}

/// Aggregate load across every registered agent
///
/// Best-effort: each agent is read once, and concurrent `system_load` calls
/// are serialized, but the Load Source may move between per-agent reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemLoad {
    pub total_capacity: u32,
    pub current_load: u32,
    pub utilization_percentage: f64,
    pub per_agent: Vec<AgentLoad>,
}

pub struct LoadBalancer {
    registry: Arc<CapabilityRegistry>,
    load_source: Arc<dyn LoadSource>,
    load_timeout: Duration,
    snapshot_guard: tokio::sync::Mutex<()>,
}

impl LoadBalancer {
    pub fn new(registry: Arc<CapabilityRegistry>, load_source: Arc<dyn LoadSource>) -> Self {
        Self::with_timeout(registry, load_source, DEFAULT_LOAD_TIMEOUT)
    }

    pub fn with_timeout(
        registry: Arc<CapabilityRegistry>,
        load_source: Arc<dyn LoadSource>,
        load_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            load_source,
            load_timeout,
            snapshot_guard: tokio::sync::Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// In-flight items for `agent`, as reported by the Load Source
    pub async fn current_load(&self, agent: AgentType) -> Result<u32> {
        match tokio::time::timeout(self.load_timeout, self.load_source.current_load(agent)).await
        {
            Ok(result) => result,
            Err(_) => Err(AppError::load_source(
                agent,
                format!("timed out after {}ms", self.load_timeout.as_millis()),
            )),
        }
    }

    /// `current_load < max_concurrent`. Unknown agents and failed reads are
    /// unavailable.
    pub async fn is_available(&self, agent: AgentType) -> bool {
        let Some(profile) = self.registry.get_profile(agent) else {
            return false;
        };
        match self.current_load(agent).await {
            Ok(load) => load < profile.max_concurrent,
            Err(e) => {
                warn!(agent = %agent, error = %e, "Load read failed, treating agent as unavailable");
                false
            }
        }
    }

    /// Least loaded agent (by ratio) among those declaring `category`
    pub async fn least_loaded_eligible(&self, category: Category) -> Result<AgentType> {
        let eligible = self.registry.eligible_for(category);
        if eligible.is_empty() {
            let fallback = self.registry.default_agent();
            debug!(category = %category, agent = %fallback, "No eligible agent, using default");
            return Ok(fallback);
        }

        let mut best: Option<(&AgentProfile, u32)> = None;
        for profile in eligible {
            let load = match self.current_load(profile.agent).await {
                Ok(load) => load,
                Err(e) => {
                    warn!(
                        agent = %profile.agent,
                        category = %category,
                        error = %e,
                        "Excluding agent from ranking"
                    );
                    continue;
                }
            };

            debug!(
                agent = %profile.agent,
                load = load,
                capacity = profile.max_concurrent,
                "Ranking candidate"
            );

            let replace = match best {
                None => true,
                Some((current, current_load)) => ratio_lt(
                    load,
                    profile.max_concurrent,
                    current_load,
                    current.max_concurrent,
                ),
            };
            if replace {
                best = Some((profile, load));
            }
        }

        best.map(|(profile, _)| profile.agent)
            .ok_or_else(|| AppError::LoadUnavailable(category.to_string()))
    }

    /// Aggregate snapshot across all agents
    pub async fn system_load(&self) -> SystemLoad {
        let _guard = self.snapshot_guard.lock().await;

        let mut per_agent = Vec::with_capacity(self.registry.list_all().len());
        let mut current_load = 0u32;

        for profile in self.registry.list_all() {
            let load = match self.current_load(profile.agent).await {
                Ok(load) => Some(load),
                Err(e) => {
                    warn!(agent = %profile.agent, error = %e, "Load read failed during snapshot");
                    None
                }
            };
            if let Some(load) = load {
                current_load = current_load.saturating_add(load);
            }
            per_agent.push(AgentLoad {
                agent: profile.agent,
                capacity: profile.max_concurrent,
                current_load: load,
                utilization_percentage: load.map(|l| percentage(l, profile.max_concurrent)),
                available: load.is_some_and(|l| l < profile.max_concurrent),
            });
        }

        let total_capacity = self.registry.total_capacity();
        SystemLoad {
            total_capacity,
            current_load,
            utilization_percentage: percentage(current_load, total_capacity),
            per_agent,
        }
    }
}

/// a_load / a_cap < b_load / b_cap, exact
fn ratio_lt(a_load: u32, a_cap: u32, b_load: u32, b_cap: u32) -> bool {
    (a_load as u64) * (b_cap as u64) < (b_load as u64) * (a_cap as u64)
}

fn percentage(load: u32, capacity: u32) -> f64 {
    if capacity == 0 {
        0.0
    } else {
        load as f64 / capacity as f64 * 100.0
    }
}
