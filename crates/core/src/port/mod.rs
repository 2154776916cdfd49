// Port Layer - Interfaces for external dependencies

pub mod assignment_ledger;
pub mod id_provider; // For deterministic testing
pub mod load_source;
pub mod time_provider;

// Re-exports
pub use assignment_ledger::{AssignmentLedger, LedgerEntry, LedgerState};
pub use id_provider::IdProvider;
pub use load_source::{InMemoryLoadSource, LoadSource};
pub use time_provider::TimeProvider;
