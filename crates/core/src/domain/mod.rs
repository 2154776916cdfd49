// Domain Layer - Pure business logic and entities

pub mod agent;
pub mod error;
pub mod queue;

// Re-exports
pub use agent::{AgentProfile, AgentType, Category, Priority, MILLIS_PER_HOUR};
pub use error::DomainError;
pub use queue::{PriorityQueue, QueueItem, RequestId};
