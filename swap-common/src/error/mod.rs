//! Consolidated error handling for the swap orchestrator.
//!
//! This module provides:
//! - Common error types reused across crates
//! - Error classification traits for retry logic
//!
//! # Usage
//!
//! ```rust,ignore
//! use swap_common::error::{ErrorClassification, ErrorCategory};
//!
//! fn handle_error(err: impl ErrorClassification) {
//!     if err.is_transient() {
//!         if let Some(delay) = err.suggested_retry_delay() {
//!             // Retry after delay
//!         }
//!     }
//! }
//! ```

mod common;
mod traits;

pub use common::*;
pub use traits::*;
