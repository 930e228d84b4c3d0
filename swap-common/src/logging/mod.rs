//! Standardized logging configuration for the orchestrator.
//!
//! Provides a consistent logging format across crates with support for:
//! - Human-readable console output (default)
//! - JSON format for log aggregation
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Standard tracing filter (e.g., `info`, `swap_core=debug`)
//! - `LOG_FORMAT`: Output format - `pretty` (default), `compact`, or `json`
//! - `LOG_TIMESTAMPS`: Timestamp format - `local` (default), `utc`, or `none`
//! - `LOG_LEVEL`: Default level when `RUST_LOG` is unset

mod config;

pub use config::{init_logging, LogConfig, LogFormat, TimestampFormat};
