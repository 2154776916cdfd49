//! Switchboard Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    AgentsListParams, AgentsListResponse, CancelWorkResponse, CompleteWorkResponse,
    QueueListRequest, QueueListResponse, RequestIdParams, SubmitWorkRequest, SubmitWorkResponse,
    SystemLoadResponse,
};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde::Serialize;
use std::time::Duration;

/// Switchboard daemon client
///
/// # Example
///
/// ```no_run
/// use switchboard_sdk::{SubmitWorkRequest, SwitchboardClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SwitchboardClient::connect("http://127.0.0.1:9630").await?;
/// let assignment = client
///     .submit(SubmitWorkRequest::new("acme", "DATA_ANALYSIS", "URGENT"))
///     .await?;
/// println!("{} -> {}", assignment.request_id, assignment.agent_name);
/// # Ok(())
/// # }
/// ```
pub struct SwitchboardClient {
    client: HttpClient,
}

impl SwitchboardClient {
    /// Connect to the daemon's RPC endpoint (e.g. `http://127.0.0.1:9630`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    /// Admit a work item and get its assignment
    pub async fn submit(&self, request: SubmitWorkRequest) -> Result<SubmitWorkResponse> {
        let params = object_params(&request)?;
        Ok(self.client.request("work.submit.v1", params).await?)
    }

    /// Drop a pending work item
    pub async fn cancel(&self, request_id: impl Into<String>) -> Result<CancelWorkResponse> {
        let params = object_params(&RequestIdParams {
            request_id: request_id.into(),
        })?;
        Ok(self.client.request("work.cancel.v1", params).await?)
    }

    /// Mark a dispatched work item finished, freeing agent capacity
    pub async fn complete(&self, request_id: impl Into<String>) -> Result<CompleteWorkResponse> {
        let params = object_params(&RequestIdParams {
            request_id: request_id.into(),
        })?;
        Ok(self.client.request("work.complete.v1", params).await?)
    }

    /// Pending items in dequeue order
    pub async fn queue_list(&self, filter: QueueListRequest) -> Result<QueueListResponse> {
        let params = object_params(&filter)?;
        Ok(self.client.request("queue.list.v1", params).await?)
    }

    /// Registered agents, optionally only those with a matching skill
    pub async fn agents_list(&self, skill: Option<String>) -> Result<AgentsListResponse> {
        let params = object_params(&AgentsListParams { skill })?;
        Ok(self.client.request("agents.list.v1", params).await?)
    }

    pub async fn system_load(&self) -> Result<SystemLoadResponse> {
        Ok(self
            .client
            .request("admin.load.v1", ObjectParams::new())
            .await?)
    }
}

/// Serialize a request struct into named JSON-RPC params
fn object_params<T: Serialize>(value: &T) -> Result<ObjectParams> {
    let mut params = ObjectParams::new();
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => {
            for (key, value) in map {
                params.insert(&key, value)?;
            }
            Ok(params)
        }
        other => Err(SdkError::Other(format!(
            "request must serialize to an object, got {}",
            other
        ))),
    }
}
