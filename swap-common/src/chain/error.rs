//! Chain error types with classification for retry logic.

use std::time::Duration;
use thiserror::Error;

use crate::error::{ErrorCategory, ErrorClassification};

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors that can occur submitting or awaiting chain transactions.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum ChainError {
    /// Failed to reach the RPC endpoint
    #[error("Failed to connect to network: {0}")]
    Connection(String),

    /// Contract call failed (dry run or encoding)
    #[error("Contract call failed: {0}")]
    ContractCall(String),

    /// Transaction could not be sent
    #[error("Failed to send transaction: {0}")]
    SendTransaction(String),

    /// Transaction was sent but never mined within the deadline
    #[error("Failed to mine transaction: {0}")]
    Mining(String),

    /// Amount could not be converted to base units
    #[error("Failed to parse amount: {0}")]
    InvalidAmount(String),

    /// No contract is registered for the token symbol
    #[error("Unsupported token symbol: {0}")]
    UnsupportedToken(String),
}

impl ErrorClassification for ChainError {
    fn category(&self) -> ErrorCategory {
        match self {
            ChainError::Connection(_) => ErrorCategory::Transient,
            ChainError::Mining(_) => ErrorCategory::Transient,
            ChainError::SendTransaction(_) => ErrorCategory::Transient,
            ChainError::ContractCall(_) => ErrorCategory::Permanent,
            ChainError::InvalidAmount(_) => ErrorCategory::Permanent,
            ChainError::UnsupportedToken(_) => ErrorCategory::Configuration,
        }
    }

    fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            ChainError::Connection(_) => Some(Duration::from_secs(1)),
            ChainError::Mining(_) => Some(Duration::from_secs(5)),
            ChainError::SendTransaction(_) => Some(Duration::from_millis(500)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_error_classification() {
        assert!(ChainError::Connection("refused".to_string()).is_transient());
        assert!(ChainError::Mining("timeout".to_string()).is_transient());
        assert!(ChainError::ContractCall("revert".to_string()).is_permanent());
        assert_eq!(
            ChainError::UnsupportedToken("DOGE".to_string()).category(),
            ErrorCategory::Configuration
        );
    }
}
