//! RPC Method Handlers
//!
//! Validates wire parameters and forwards to the routing core.

use crate::error::{invalid_params, to_rpc_error};
use crate::types::{
    AgentLoadView, AgentView, AgentsListRequest, AgentsListResponse, CancelWorkRequest,
    CancelWorkResponse, CompleteWorkRequest, CompleteWorkResponse, QueueItemView,
    QueueListRequest, QueueListResponse, SubmitWorkRequest, SubmitWorkResponse,
    SystemLoadRequest, SystemLoadResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use switchboard_core::application::{RequestProcessor, SubmitRequest};
use switchboard_core::domain::{AgentProfile, AgentType, Category, Priority, QueueItem};
use switchboard_core::error::AppError;
use switchboard_core::port::{AssignmentLedger, LedgerState, TimeProvider};
use tracing::info;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    processor: Arc<RequestProcessor>,
    ledger: Arc<dyn AssignmentLedger>,
    time_provider: Arc<dyn TimeProvider>,
}

impl RpcHandler {
    pub fn new(
        processor: Arc<RequestProcessor>,
        ledger: Arc<dyn AssignmentLedger>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            processor,
            ledger,
            time_provider,
        }
    }

    /// work.submit.v1
    pub async fn submit(
        &self,
        params: SubmitWorkRequest,
    ) -> Result<SubmitWorkResponse, ErrorObjectOwned> {
        let client_id = non_empty("client_id", params.client_id)?;
        let category: Category = params
            .category
            .parse()
            .map_err(|e| to_rpc_error(AppError::from(e)))?;
        let priority: Priority = params
            .priority
            .parse()
            .map_err(|e| to_rpc_error(AppError::from(e)))?;

        if let Some(id) = &params.request_id {
            if id.trim().is_empty() {
                return Err(invalid_params("request_id must not be blank"));
            }
            // Pending duplicates are rejected by the processor under its queue lock
            if self.ledger.find(id).await.map_err(to_rpc_error)?.is_some() {
                return Err(to_rpc_error(AppError::Conflict(format!(
                    "Request {} already dispatched",
                    id
                ))));
            }
        }

        let assignment = self
            .processor
            .submit(SubmitRequest {
                request_id: params.request_id,
                client_id,
                category,
                priority,
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(SubmitWorkResponse {
            request_id: assignment.request_id,
            assigned_agent: assignment.assigned_agent.code().to_string(),
            agent_name: assignment.assigned_agent.display_name().to_string(),
            estimated_start_at: assignment.estimated_start_at,
            queue_position: assignment.queue_position,
        })
    }

    /// work.cancel.v1
    pub async fn cancel(
        &self,
        params: CancelWorkRequest,
    ) -> Result<CancelWorkResponse, ErrorObjectOwned> {
        let request_id = non_empty("request_id", params.request_id)?;

        if self.processor.cancel(&request_id) {
            return Ok(CancelWorkResponse {
                request_id,
                cancelled: true,
            });
        }

        // Already dispatched items are not cancellable
        match self.ledger.find(&request_id).await.map_err(to_rpc_error)? {
            Some(entry) => Err(to_rpc_error(AppError::Conflict(format!(
                "Request {} already left the queue ({})",
                request_id, entry.state
            )))),
            None => Err(to_rpc_error(AppError::NotFound(format!(
                "Request {} not found",
                request_id
            )))),
        }
    }

    /// work.complete.v1
    pub async fn complete(
        &self,
        params: CompleteWorkRequest,
    ) -> Result<CompleteWorkResponse, ErrorObjectOwned> {
        let request_id = non_empty("request_id", params.request_id)?;
        let now = self.time_provider.now_millis();

        let entry = self
            .ledger
            .find(&request_id)
            .await
            .map_err(to_rpc_error)?
            .ok_or_else(|| {
                to_rpc_error(AppError::NotFound(format!(
                    "Request {} has not been dispatched",
                    request_id
                )))
            })?;

        if entry.state == LedgerState::Done
            || !self
                .ledger
                .record_finished(&request_id, now)
                .await
                .map_err(to_rpc_error)?
        {
            return Err(to_rpc_error(AppError::Conflict(format!(
                "Request {} is already completed",
                request_id
            ))));
        }

        info!(request_id = %request_id, agent = %entry.agent, "Work item completed");

        Ok(CompleteWorkResponse {
            request_id,
            agent: entry.agent.code().to_string(),
            finished_at: now,
        })
    }

    /// queue.list.v1
    pub async fn queue_list(
        &self,
        params: QueueListRequest,
    ) -> Result<QueueListResponse, ErrorObjectOwned> {
        let agent: Option<AgentType> = params
            .agent
            .map(|s| s.parse())
            .transpose()
            .map_err(AppError::from)
            .map_err(to_rpc_error)?;
        let priority: Option<Priority> = params
            .priority
            .map(|s| s.parse())
            .transpose()
            .map_err(AppError::from)
            .map_err(to_rpc_error)?;

        let snapshot = self.processor.queue_snapshot();
        let total_pending = snapshot.len();
        let items = snapshot
            .iter()
            .filter(|item| agent.map_or(true, |a| item.assigned_agent == a))
            .filter(|item| priority.map_or(true, |p| item.priority == p))
            .map(queue_item_view)
            .collect();

        Ok(QueueListResponse {
            total_pending,
            items,
        })
    }

    /// agents.list.v1
    pub async fn agents_list(
        &self,
        params: AgentsListRequest,
    ) -> Result<AgentsListResponse, ErrorObjectOwned> {
        let registry = self.processor.balancer().registry();
        let profiles: Vec<&AgentProfile> = match params.skill.as_deref().map(str::trim) {
            Some(skill) if !skill.is_empty() => registry.find_by_skill(skill),
            _ => registry.list_all().iter().collect(),
        };

        let default_agent = registry.default_agent();
        let agents = profiles
            .into_iter()
            .map(|p| agent_view(p, p.agent == default_agent))
            .collect();

        Ok(AgentsListResponse { agents })
    }

    /// admin.load.v1
    pub async fn system_load(
        &self,
        _params: SystemLoadRequest,
    ) -> Result<SystemLoadResponse, ErrorObjectOwned> {
        let load = self.processor.balancer().system_load().await;
        let agents = load
            .per_agent
            .into_iter()
            .map(|a| AgentLoadView {
                agent: a.agent.code().to_string(),
                capacity: a.capacity,
                current_load: a.current_load,
                utilization_percentage: a.utilization_percentage,
                available: a.available,
                pending: self.processor.pending_for_agent(a.agent).len(),
            })
            .collect();

        Ok(SystemLoadResponse {
            total_capacity: load.total_capacity,
            current_load: load.current_load,
            utilization_percentage: load.utilization_percentage,
            total_pending: self.processor.pending_count(),
            agents,
        })
    }
}

fn non_empty(field: &str, value: String) -> Result<String, ErrorObjectOwned> {
    if value.trim().is_empty() {
        return Err(invalid_params(format!("{} must not be empty", field)));
    }
    Ok(value)
}

fn queue_item_view(item: &QueueItem) -> QueueItemView {
    QueueItemView {
        request_id: item.request_id.clone(),
        client_id: item.client_id.clone(),
        category: item.category.code().to_string(),
        priority: item.priority.code().to_string(),
        assigned_agent: item.assigned_agent.code().to_string(),
        enqueued_at: item.enqueued_at,
        estimated_start_at: item.estimated_start_at,
    }
}

fn agent_view(profile: &AgentProfile, is_default: bool) -> AgentView {
    AgentView {
        agent: profile.agent.code().to_string(),
        name: profile.agent.display_name().to_string(),
        categories: profile.categories.iter().map(|c| c.code().to_string()).collect(),
        max_concurrent: profile.max_concurrent,
        avg_response_hours: profile.avg_response_hours,
        skills: profile.skills.iter().cloned().collect(),
        description: profile.description.clone(),
        is_default,
    }
}
