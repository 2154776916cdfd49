// Agent Selector - static category routing

use crate::application::registry::CapabilityRegistry;
use crate::domain::{AgentType, Category};
use std::sync::Arc;
use tracing::debug;

/// Resolves a category to one agent without consulting load
pub struct AgentSelector {
    registry: Arc<CapabilityRegistry>,
}

impl AgentSelector {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    /// First profile (declaration order) that declares `category`, else the
    /// registry's default agent
    pub fn assign_by_category(&self, category: Category) -> AgentType {
        match self
            .registry
            .list_all()
            .iter()
            .find(|profile| profile.handles(category))
        {
            Some(profile) => profile.agent,
            None => {
                let fallback = self.registry.default_agent();
                debug!(category = %category, agent = %fallback, "No agent declares category, using default");
                fallback
            }
        }
    }
}
