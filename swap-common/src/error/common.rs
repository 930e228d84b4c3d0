//! Common error types shared across crates.
//!
//! These represent failure modes that recur throughout the orchestrator.
//! Crate-specific errors wrap these using `#[from]`.

use std::time::Duration;
use thiserror::Error;

/// Database-related errors.
///
/// Use this for all database operations including queries, connections,
/// and transactions.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DatabaseError {
    /// Query execution failed
    #[error("Query failed: {0}")]
    Query(String),

    /// Connection to database failed
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Transaction failed (commit, rollback, etc.)
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// Connection pool exhausted
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Query timeout
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Io(_) => DatabaseError::Connection(err.to_string()),
            _ => DatabaseError::Query(err.to_string()),
        }
    }
}

/// Validation errors for caller-supplied input.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ValidationError {
    /// Required field is empty or missing
    #[error("{field} is required but was empty")]
    Required { field: &'static str },

    /// Value must be strictly positive
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: String },

    /// Field has invalid format
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: &'static str, reason: String },
}

impl ValidationError {
    /// Create a Required validation error
    pub fn required(field: &'static str) -> Self {
        ValidationError::Required { field }
    }

    /// Create a NotPositive validation error
    pub fn not_positive(field: &'static str, value: impl ToString) -> Self {
        ValidationError::NotPositive {
            field,
            value: value.to_string(),
        }
    }

    /// Create an InvalidFormat validation error
    pub fn invalid_format(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field,
            reason: reason.into(),
        }
    }
}
