//! Capability Registry - Read-only directory of agent profiles
//!
//! Built once at startup and shared by reference (`Arc<CapabilityRegistry>`)
//! with the selector, load balancer and request processor. Declaration order
//! is preserved and is significant for tie-breaking.

use crate::domain::{AgentProfile, AgentType, Category, DomainError};
use std::collections::HashSet;

/// Immutable agent directory
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    profiles: Vec<AgentProfile>,
    default_agent: AgentType,
}

impl CapabilityRegistry {
    /// Build a registry from profiles in declaration order
    ///
    /// # Errors
    /// `DomainError::InvalidRegistry` if the list is empty, an agent appears
    /// twice, a capacity is zero, a turnaround is not a positive finite
    /// number, or the default agent has no profile.
    pub fn new(
        profiles: Vec<AgentProfile>,
        default_agent: AgentType,
    ) -> Result<Self, DomainError> {
        if profiles.is_empty() {
            return Err(DomainError::InvalidRegistry(
                "at least one agent profile is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for profile in &profiles {
            if !seen.insert(profile.agent) {
                return Err(DomainError::InvalidRegistry(format!(
                    "duplicate profile for {}",
                    profile.agent
                )));
            }
            if profile.max_concurrent == 0 {
                return Err(DomainError::InvalidRegistry(format!(
                    "{} must have a positive capacity",
                    profile.agent
                )));
            }
            if !(profile.avg_response_hours.is_finite() && profile.avg_response_hours > 0.0) {
                return Err(DomainError::InvalidRegistry(format!(
                    "{} must have a positive turnaround, got {}",
                    profile.agent, profile.avg_response_hours
                )));
            }
        }

        if !seen.contains(&default_agent) {
            return Err(DomainError::InvalidRegistry(format!(
                "default agent {} has no profile",
                default_agent
            )));
        }

        Ok(Self {
            profiles,
            default_agent,
        })
    }

    /// The standard eight-agent directory, General Agent as fallback
    pub fn standard() -> Self {
        Self {
            profiles: standard_profiles(),
            default_agent: AgentType::General,
        }
    }

    pub fn get_profile(&self, agent: AgentType) -> Option<&AgentProfile> {
        self.profiles.iter().find(|p| p.agent == agent)
    }

    /// All profiles in declaration order
    pub fn list_all(&self) -> &[AgentProfile] {
        &self.profiles
    }

    /// Profiles with a skill tag containing `needle` (case-insensitive)
    pub fn find_by_skill(&self, needle: &str) -> Vec<&AgentProfile> {
        self.profiles
            .iter()
            .filter(|p| p.has_skill_matching(needle))
            .collect()
    }

    /// Profiles that declare `category`, in declaration order
    pub fn eligible_for(&self, category: Category) -> Vec<&AgentProfile> {
        self.profiles.iter().filter(|p| p.handles(category)).collect()
    }

    pub fn default_agent(&self) -> AgentType {
        self.default_agent
    }

    pub fn total_capacity(&self) -> u32 {
        self.profiles.iter().map(|p| p.max_concurrent).sum()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_profiles() -> Vec<AgentProfile> {
    vec![
        AgentProfile::new(
            AgentType::Support,
            [Category::Support],
            10,
            2.0,
            ["customer service", "troubleshooting", "faq", "ticketing"],
            "Handles customer support requests and general troubleshooting",
        ),
        AgentProfile::new(
            AgentType::Technical,
            [Category::Development],
            5,
            8.0,
            ["rust", "web development", "api design", "debugging"],
            "Builds and fixes software, integrations and APIs",
        ),
        AgentProfile::new(
            AgentType::Creative,
            [Category::Design],
            4,
            6.0,
            ["ui design", "branding", "illustration", "ux research"],
            "Produces visual design, branding and UX work",
        ),
        AgentProfile::new(
            AgentType::Consulting,
            [Category::Consulting],
            3,
            4.0,
            ["strategy", "business analysis", "process improvement"],
            "Advises on strategy and business processes",
        ),
        AgentProfile::new(
            AgentType::Content,
            [Category::Content],
            6,
            3.0,
            ["copywriting", "editing", "blogging", "documentation"],
            "Writes and edits long-form and marketing content",
        ),
        AgentProfile::new(
            AgentType::Marketing,
            [Category::Marketing],
            5,
            4.0,
            ["seo", "social media", "campaigns", "email marketing"],
            "Plans and runs marketing campaigns",
        ),
        AgentProfile::new(
            AgentType::Analytics,
            [Category::DataAnalysis],
            4,
            5.0,
            ["data analysis", "reporting", "visualization", "statistics"],
            "Analyzes data and produces reports",
        ),
        AgentProfile::new(
            AgentType::General,
            [Category::Other],
            8,
            3.0,
            ["general assistance", "triage", "research"],
            "Fallback agent for anything without a specialist",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_order_and_capacity() {
        let registry = CapabilityRegistry::standard();
        let order: Vec<_> = registry.list_all().iter().map(|p| p.agent).collect();

        assert_eq!(order, AgentType::ALL.to_vec());
        assert_eq!(registry.total_capacity(), 45);
        assert_eq!(registry.default_agent(), AgentType::General);
    }

    #[test]
    fn test_list_all_is_stable() {
        let registry = CapabilityRegistry::standard();
        let first: Vec<_> = registry.list_all().iter().map(|p| p.agent).collect();
        let second: Vec<_> = registry.list_all().iter().map(|p| p.agent).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_get_profile() {
        let registry = CapabilityRegistry::standard();
        let technical = registry.get_profile(AgentType::Technical).unwrap();

        assert_eq!(technical.max_concurrent, 5);
        assert_eq!(technical.avg_response_hours, 8.0);
        assert!(technical.handles(Category::Development));
    }

    #[test]
    fn test_get_profile_missing_is_none() {
        let registry = CapabilityRegistry::new(
            vec![AgentProfile::new(
                AgentType::General,
                [Category::Other],
                1,
                1.0,
                ["triage"],
                "only agent",
            )],
            AgentType::General,
        )
        .unwrap();

        assert!(registry.get_profile(AgentType::Support).is_none());
    }

    #[test]
    fn test_find_by_skill_case_insensitive() {
        let registry = CapabilityRegistry::standard();

        let agents: Vec<_> = registry
            .find_by_skill("MARKETING")
            .into_iter()
            .map(|p| p.agent)
            .collect();
        assert_eq!(agents, vec![AgentType::Marketing]);

        let agents: Vec<_> = registry
            .find_by_skill("analysis")
            .into_iter()
            .map(|p| p.agent)
            .collect();
        assert_eq!(agents, vec![AgentType::Consulting, AgentType::Analytics]);

        assert!(registry.find_by_skill("quantum").is_empty());
    }

    #[test]
    fn test_rejects_duplicate_agents() {
        let profile = AgentProfile::new(AgentType::General, [Category::Other], 1, 1.0, ["test"], "");
        let result = CapabilityRegistry::new(vec![profile.clone(), profile], AgentType::General);
        assert!(matches!(result, Err(DomainError::InvalidRegistry(_))));
    }

    #[test]
    fn test_rejects_zero_capacity_and_bad_turnaround() {
        let zero = AgentProfile::new(AgentType::General, [Category::Other], 0, 1.0, ["test"], "");
        assert!(CapabilityRegistry::new(vec![zero], AgentType::General).is_err());

        let negative = AgentProfile::new(AgentType::General, [Category::Other], 1, -2.0, ["test"], "");
        assert!(CapabilityRegistry::new(vec![negative], AgentType::General).is_err());

        let nan = AgentProfile::new(AgentType::General, [Category::Other], 1, f64::NAN, ["test"], "");
        assert!(CapabilityRegistry::new(vec![nan], AgentType::General).is_err());
    }

    #[test]
    fn test_rejects_missing_default_agent() {
        let support = AgentProfile::new(AgentType::Support, [Category::Support], 1, 1.0, ["test"], "");
        let result = CapabilityRegistry::new(vec![support], AgentType::General);
        assert!(result.is_err());
    }
}
