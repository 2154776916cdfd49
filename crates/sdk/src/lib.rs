//! Switchboard SDK - Rust Client Library
//!
//! Typed client for the Switchboard routing daemon's JSON-RPC API.
//!
//! # Example
//!
//! ```no_run
//! use switchboard_sdk::{SubmitWorkRequest, SwitchboardClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SwitchboardClient::connect("http://127.0.0.1:9630").await?;
//!
//!     let assignment = client
//!         .submit(SubmitWorkRequest::new("acme", "SUPPORT", "MEDIUM"))
//!         .await?;
//!     println!(
//!         "{} queued for {} at position {}",
//!         assignment.request_id, assignment.agent_name, assignment.queue_position
//!     );
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::SwitchboardClient;
pub use error::{Result, SdkError};
pub use types::{
    Agent, AgentLoad, AgentsListResponse, CancelWorkResponse, CompleteWorkResponse, QueueItem,
    QueueListRequest, QueueListResponse, SubmitWorkRequest, SubmitWorkResponse,
    SystemLoadResponse,
};
