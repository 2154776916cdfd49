//! RPC Request/Response Types
//!
//! JSON-RPC method parameters and results. Enums are carried as strings and
//! validated by the handler.

use serde::{Deserialize, Serialize};

/// work.submit.v1 - Admit a work item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitWorkRequest {
    /// Generated by the daemon when absent
    #[serde(default)]
    pub request_id: Option<String>,
    pub client_id: String,
    pub category: String,
    pub priority: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitWorkResponse {
    pub request_id: String,
    pub assigned_agent: String,
    pub agent_name: String,
    pub estimated_start_at: i64,
    pub queue_position: usize,
}

/// work.cancel.v1 - Drop a pending item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelWorkRequest {
    pub request_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelWorkResponse {
    pub request_id: String,
    pub cancelled: bool,
}

/// work.complete.v1 - Mark a dispatched item finished
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteWorkRequest {
    pub request_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteWorkResponse {
    pub request_id: String,
    pub agent: String,
    pub finished_at: i64,
}

/// queue.list.v1 - Pending items in dequeue order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueListRequest {
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItemView {
    pub request_id: String,
    pub client_id: String,
    pub category: String,
    pub priority: String,
    pub assigned_agent: String,
    pub enqueued_at: i64,
    pub estimated_start_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueListResponse {
    pub total_pending: usize,
    pub items: Vec<QueueItemView>,
}

/// agents.list.v1 - Registry contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentsListRequest {
    /// Case-insensitive substring match on skills
    #[serde(default)]
    pub skill: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentView {
    pub agent: String,
    pub name: String,
    pub categories: Vec<String>,
    pub max_concurrent: u32,
    pub avg_response_hours: f64,
    pub skills: Vec<String>,
    pub description: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsListResponse {
    pub agents: Vec<AgentView>,
}

/// admin.load.v1 - System-wide load snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemLoadRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentLoadView {
    pub agent: String,
    pub capacity: u32,
    /// None when the load source could not be read
    pub current_load: Option<u32>,
    pub utilization_percentage: Option<f64>,
    pub available: bool,
    pub pending: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemLoadResponse {
    pub total_capacity: u32,
    pub current_load: u32,
    pub utilization_percentage: f64,
    pub total_pending: usize,
    pub agents: Vec<AgentLoadView>,
}
