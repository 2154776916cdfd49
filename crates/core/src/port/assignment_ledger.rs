// Assignment Ledger Port (Interface)
// Tracks work items that left the pending queue and are being worked

use crate::domain::{AgentType, Category, Priority, QueueItem};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Ledger state of a dispatched item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerState {
    InProgress,
    Done,
}

impl std::fmt::Display for LedgerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerState::InProgress => write!(f, "IN_PROGRESS"),
            LedgerState::Done => write!(f, "DONE"),
        }
    }
}

/// One dispatched work item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub request_id: String,
    pub client_id: String,
    pub category: Category,
    pub priority: Priority,
    pub agent: AgentType,
    pub state: LedgerState,
    pub started_at: i64,
    pub finished_at: Option<i64>,
}

impl LedgerEntry {
    pub fn started(item: &QueueItem, started_at: i64) -> Self {
        Self {
            request_id: item.request_id.clone(),
            client_id: item.client_id.clone(),
            category: item.category,
            priority: item.priority,
            agent: item.assigned_agent,
            state: LedgerState::InProgress,
            started_at,
            finished_at: None,
        }
    }
}

/// Persistence of in-flight work
#[async_trait]
pub trait AssignmentLedger: Send + Sync {
    /// Record an item as handed to its agent
    async fn record_started(&self, entry: &LedgerEntry) -> Result<()>;

    /// Mark an in-flight item done. Returns false if it was not in progress.
    async fn record_finished(&self, request_id: &str, finished_at: i64) -> Result<bool>;

    /// Number of IN_PROGRESS items for `agent`
    async fn count_in_progress(&self, agent: AgentType) -> Result<u32>;

    async fn find(&self, request_id: &str) -> Result<Option<LedgerEntry>>;
}
