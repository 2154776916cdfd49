//! JSON-RPC Server
//!
//! JSON-RPC 2.0 over HTTP, bound to localhost by default.

use crate::handler::RpcHandler;
use crate::types::{
    AgentsListRequest, CancelWorkRequest, CompleteWorkRequest, QueueListRequest,
    SubmitWorkRequest, SystemLoadRequest,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use switchboard_core::application::RequestProcessor;
use switchboard_core::port::{AssignmentLedger, TimeProvider};
use tracing::info;

pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9630;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    /// 0 picks a free port
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        processor: Arc<RequestProcessor>,
        ledger: Arc<dyn AssignmentLedger>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(processor, ledger, time_provider)),
        }
    }

    /// Start the JSON-RPC server. Returns the bound address and the handle
    /// used to stop it.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let module = self.build_module()?;

        info!(addr = %local_addr, "JSON-RPC server started");

        let handle = server.start(module);
        Ok((local_addr, handle))
    }

    fn build_module(&self) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method("work.submit.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: SubmitWorkRequest = params.parse()?;
                    handler.submit(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("work.cancel.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: CancelWorkRequest = params.parse()?;
                    handler.cancel(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("work.complete.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: CompleteWorkRequest = params.parse()?;
                    handler.complete(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Filters are optional; a call without params lists everything
        let handler = self.handler.clone();
        module
            .register_async_method("queue.list.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: Option<QueueListRequest> = params.parse()?;
                    handler.queue_list(req.unwrap_or_default()).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("agents.list.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: Option<AgentsListRequest> = params.parse()?;
                    handler.agents_list(req.unwrap_or_default()).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("admin.load.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: Option<SystemLoadRequest> = params.parse()?;
                    handler.system_load(req.unwrap_or_default()).await
                }
            })
            .map_err(|e| e.to_string())?;

        Ok(module)
    }
}
