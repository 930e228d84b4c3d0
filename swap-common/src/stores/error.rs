//! Store error types.

use thiserror::Error;
use uuid::Uuid;

use crate::error::{DatabaseError, ErrorCategory, ErrorClassification};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by persistence ports.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoreError {
    /// Underlying database failure
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// A lock row with this id already exists; the named mutex is held
    #[error("Lock already held: {0}")]
    LockHeld(Uuid),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.into())
    }
}

impl ErrorClassification for StoreError {
    fn category(&self) -> ErrorCategory {
        match self {
            StoreError::Database(db) => db.category(),
            // Held locks resolve when the holder finishes its tick
            StoreError::LockHeld(_) => ErrorCategory::ResourceExhausted,
        }
    }
}

impl StoreError {
    /// Returns true when the error signals lock contention, not failure.
    pub fn is_lock_held(&self) -> bool {
        matches!(self, StoreError::LockHeld(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_held_classification() {
        let id = Uuid::nil();
        let err = StoreError::LockHeld(id);
        assert!(err.is_lock_held());
        assert!(err.is_transient());
    }
}
