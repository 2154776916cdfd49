//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types from the api-rpc crate. Categories,
//! priorities and agents are wire codes such as "DATA_ANALYSIS" or "URGENT".

use serde::{Deserialize, Serialize};

/// Request to admit a work item
#[derive(Debug, Clone, Serialize)]
pub struct SubmitWorkRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub client_id: String,
    pub category: String,
    pub priority: String,
}

impl SubmitWorkRequest {
    pub fn new(
        client_id: impl Into<String>,
        category: impl Into<String>,
        priority: impl Into<String>,
    ) -> Self {
        Self {
            request_id: None,
            client_id: client_id.into(),
            category: category.into(),
            priority: priority.into(),
        }
    }

    /// Use a caller-chosen id instead of a daemon-generated one
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Assignment returned by submit
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitWorkResponse {
    pub request_id: String,
    pub assigned_agent: String,
    pub agent_name: String,
    /// Epoch ms
    pub estimated_start_at: i64,
    pub queue_position: usize,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RequestIdParams {
    pub request_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelWorkResponse {
    pub request_id: String,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteWorkResponse {
    pub request_id: String,
    pub agent: String,
    pub finished_at: i64,
}

/// Optional filters for queue listing
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueueListRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueItem {
    pub request_id: String,
    pub client_id: String,
    pub category: String,
    pub priority: String,
    pub assigned_agent: String,
    pub enqueued_at: i64,
    pub estimated_start_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueListResponse {
    pub total_pending: usize,
    pub items: Vec<QueueItem>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct AgentsListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Agent {
    pub agent: String,
    pub name: String,
    pub categories: Vec<String>,
    pub max_concurrent: u32,
    pub avg_response_hours: f64,
    pub skills: Vec<String>,
    pub description: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentsListResponse {
    pub agents: Vec<Agent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentLoad {
    pub agent: String,
    pub capacity: u32,
    pub current_load: Option<u32>,
    pub utilization_percentage: Option<f64>,
    pub available: bool,
    pub pending: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemLoadResponse {
    pub total_capacity: u32,
    pub current_load: u32,
    pub utilization_percentage: f64,
    pub total_pending: usize,
    pub agents: Vec<AgentLoad>,
}
