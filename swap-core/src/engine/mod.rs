//! The order lifecycle engine.
//!
//! [`OrderService`] owns the submission surface and the per-status
//! worker actions; [`WorkerScheduler`] drives those actions on a fixed
//! cadence under per-worker cron locks.

mod lifecycle;
mod service;
mod workers;

pub use service::OrderService;
pub use workers::{SchedulerHandle, WorkerKind, WorkerScheduler};
