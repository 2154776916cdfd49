//! JSON-RPC API Layer
//!
//! JSON-RPC 2.0 server for the Switchboard routing daemon. Enum values
//! travel as their wire codes ("SUPPORT", "DATA_ANALYSIS", "URGENT") and are
//! parsed here, before anything reaches the core.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use server::{RpcServer, RpcServerConfig};
