// Agent Domain Model

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Milliseconds per hour (turnaround times are declared in hours)
pub const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Agent identifier (fixed enumeration)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentType {
    Support,
    Technical,
    Creative,
    Consulting,
    Content,
    Marketing,
    Analytics,
    General,
}

impl AgentType {
    pub const ALL: [AgentType; 8] = [
        AgentType::Support,
        AgentType::Technical,
        AgentType::Creative,
        AgentType::Consulting,
        AgentType::Content,
        AgentType::Marketing,
        AgentType::Analytics,
        AgentType::General,
    ];

    /// Human-readable name ("Support Agent", ...)
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentType::Support => "Support Agent",
            AgentType::Technical => "Technical Agent",
            AgentType::Creative => "Creative Agent",
            AgentType::Consulting => "Consulting Agent",
            AgentType::Content => "Content Agent",
            AgentType::Marketing => "Marketing Agent",
            AgentType::Analytics => "Analytics Agent",
            AgentType::General => "General Agent",
        }
    }

    /// Wire/storage code ("SUPPORT", ...)
    pub fn code(&self) -> &'static str {
        match self {
            AgentType::Support => "SUPPORT",
            AgentType::Technical => "TECHNICAL",
            AgentType::Creative => "CREATIVE",
            AgentType::Consulting => "CONSULTING",
            AgentType::Content => "CONTENT",
            AgentType::Marketing => "MARKETING",
            AgentType::Analytics => "ANALYTICS",
            AgentType::General => "GENERAL",
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for AgentType {
    type Err = DomainError;

    /// Accepts either the code ("SUPPORT") or the display name ("Support Agent"),
    /// case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        AgentType::ALL
            .into_iter()
            .find(|a| {
                a.code().eq_ignore_ascii_case(needle) || a.display_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| DomainError::UnknownAgent(s.to_string()))
    }
}

/// Work item category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Support,
    Development,
    Design,
    Consulting,
    Content,
    Marketing,
    DataAnalysis,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Support,
        Category::Development,
        Category::Design,
        Category::Consulting,
        Category::Content,
        Category::Marketing,
        Category::DataAnalysis,
        Category::Other,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Category::Support => "SUPPORT",
            Category::Development => "DEVELOPMENT",
            Category::Design => "DESIGN",
            Category::Consulting => "CONSULTING",
            Category::Content => "CONTENT",
            Category::Marketing => "MARKETING",
            Category::DataAnalysis => "DATA_ANALYSIS",
            Category::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::UnknownCategory(s.to_string()))
    }
}

/// Priority (LOW < MEDIUM < HIGH < URGENT)
///
/// Variant order defines the total order, so `Ord` is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Priority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::UnknownPriority(s.to_string()))
    }
}

/// Agent profile (immutable after registry construction)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub agent: AgentType,
    pub categories: BTreeSet<Category>,
    pub max_concurrent: u32,
    pub avg_response_hours: f64,
    pub skills: BTreeSet<String>,
    pub description: String,
}

impl AgentProfile {
    pub fn new(
        agent: AgentType,
        categories: impl IntoIterator<Item = Category>,
        max_concurrent: u32,
        avg_response_hours: f64,
        skills: impl IntoIterator<Item = &'static str>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            agent,
            categories: categories.into_iter().collect(),
            max_concurrent,
            avg_response_hours,
            skills: skills.into_iter().map(str::to_string).collect(),
            description: description.into(),
        }
    }

    pub fn handles(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    /// Case-insensitive substring match against any skill tag
    pub fn has_skill_matching(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.skills
            .iter()
            .any(|skill| skill.to_lowercase().contains(&needle))
    }

    /// Expected wait before the item at `queue_position` starts (epoch-ms offset)
    pub fn wait_millis(&self, queue_position: usize) -> i64 {
        (self.avg_response_hours * MILLIS_PER_HOUR * queue_position as f64).round() as i64
    }
}
