//! Domain-level error types.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::PostStatus;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Not allowed to act on this resource")]
    Forbidden,

    #[error("Cannot {action} a post in status {current}")]
    InvalidTransition {
        action: &'static str,
        current: PostStatus,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn post_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity_type: "Post",
            id,
        }
    }

    pub fn analytics_not_found(post_id: Uuid) -> Self {
        Self::NotFound {
            entity_type: "PostAnalytics",
            id: post_id,
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Constraint(msg) => DomainError::Duplicate(msg),
            other => DomainError::Internal(other.to_string()),
        }
    }
}

/// Scheduler errors that abort a whole tick.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Reading due posts failed; nothing was observed, retry next tick.
    #[error("Failed to read due posts: {0}")]
    StoreRead(#[source] RepoError),
}

/// Invalid configuration detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Tick interval must be positive")]
    NonPositiveInterval,

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
