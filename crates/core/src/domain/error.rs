// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown priority: {0}")]
    UnknownPriority(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Invalid registry: {0}")]
    InvalidRegistry(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
