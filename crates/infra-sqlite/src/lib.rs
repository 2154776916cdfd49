// Switchboard Infrastructure - SQLite Adapter
// Implements: AssignmentLedger, LoadSource (live in-progress counts)

mod connection;
mod ledger_repository;
mod migration;

pub use connection::create_pool;
pub use ledger_repository::{SqliteAssignmentLedger, SqliteLoadSource};
pub use migration::run_migrations;

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
