// Application Layer - Routing services

pub mod dispatcher;
pub mod load_balancer;
pub mod registry;
pub mod request_processor;
pub mod selector;

// Re-exports
pub use dispatcher::{shutdown_channel, Dispatcher, ShutdownSender, ShutdownToken};
pub use load_balancer::{AgentLoad, LoadBalancer, SystemLoad};
pub use registry::CapabilityRegistry;
pub use request_processor::{Assignment, RequestProcessor, SubmitRequest};
pub use selector::AgentSelector;
