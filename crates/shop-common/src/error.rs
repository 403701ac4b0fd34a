//! Repository error type shared by every storage port

use thiserror::Error;

/// Errors raised by repository adapters
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// Entity does not exist (or belongs to another tenant)
    #[error("entity not found")]
    NotFound,

    /// Unique key already taken
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// Conditional write lost (stock or usage limit moved underneath)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Backend failure
    #[error("storage error: {0}")]
    Storage(String),
}
