//! Service error type shared by every catalog service

use std::time::Duration;

/// Error types for catalog service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Record is absent or soft-deleted
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// An equivalent live record already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The per-call deadline expired before the store answered
    #[error("Deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// Store failure
    #[error("Persistence error: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub(crate) fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound(format!("{} {}", entity, id))
    }

    /// True when the store rejected a write because of a unique index
    pub(crate) fn is_unique_violation(&self) -> bool {
        let Self::Persistence(err) = self else {
            return false;
        };
        err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<sqlx::Error>(),
                Some(sqlx::Error::Database(db)) if db.is_unique_violation()
            )
        })
    }
}
