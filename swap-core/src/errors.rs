//! Engine-level error type.
//!
//! Callers of the submission surface (`submit_order`, `route_best_price`)
//! see these directly. Workers never propagate them: a worker action logs
//! the error and drives the order's failure transition instead.

use rust_decimal::Decimal;
use thiserror::Error;

use swap_common::chain::ChainError;
use swap_common::error::{ErrorCategory, ErrorClassification, ValidationError};
use swap_common::markets::Venue;
use swap_common::stores::StoreError;
use swap_common::venue::VenueError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the order engine, router, and registry.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EngineError {
    /// A referenced entity does not exist or is inactive
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Caller-supplied data failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// No venue could fill the requested volume
    #[error("Insufficient liquidity for volume {requested}")]
    InsufficientLiquidity { requested: Decimal },

    /// The routed venue has no bound client
    #[error("Unsupported venue: {0}")]
    UnsupportedVenue(Venue),

    /// Exchange call failed
    #[error(transparent)]
    Venue(#[from] VenueError),

    /// Chain call failed
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Persistence failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Create a NotFound error
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        EngineError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl ErrorClassification for EngineError {
    fn category(&self) -> ErrorCategory {
        match self {
            EngineError::NotFound { .. } => ErrorCategory::Permanent,
            EngineError::InvalidInput(_) => ErrorCategory::Permanent,
            EngineError::InsufficientLiquidity { .. } => ErrorCategory::Permanent,
            EngineError::UnsupportedVenue(_) => ErrorCategory::Configuration,
            EngineError::Venue(e) => e.category(),
            EngineError::Chain(e) => e.category(),
            EngineError::Store(e) => e.category(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_domain_errors_are_permanent() {
        assert!(EngineError::not_found("Order", 9).is_permanent());
        assert!(
            EngineError::InvalidInput(ValidationError::not_positive("volume", 0)).is_permanent()
        );
        assert!(EngineError::InsufficientLiquidity {
            requested: dec!(1)
        }
        .is_permanent());
    }

    #[test]
    fn test_wrapped_errors_delegate_classification() {
        let err: EngineError = VenueError::Connection("reset".into()).into();
        assert!(err.is_transient());

        let err: EngineError = ChainError::ContractCall("revert".into()).into();
        assert!(err.is_permanent());
    }
}
