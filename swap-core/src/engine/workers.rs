//! Periodic worker scheduler.
//!
//! Six workers share one cadence. Each tick takes the worker's named
//! cron lock by inserting a row with a fixed UUID; a conflicting insert
//! means another instance holds the tick and this one skips. The lock is
//! released after dispatch, not after task completion: side effects may
//! take seconds and holding the lock would starve subsequent ticks. The
//! forward `*_IN_PROGRESS` transition inside the dispatch is what makes
//! the per-order action mutually exclusive.
//!
//! Lock UUIDs are hard-coded so restarts preserve lock identity.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};
use uuid::{uuid, Uuid};

use swap_common::stores::CronLockStore;

use crate::config::WorkerSettings;
use crate::errors::EngineResult;

use super::service::OrderService;

/// The worker kinds driven by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerKind {
    /// PENDING → user debit
    Pending,
    /// USER_DEBIT_SUCCESS → venue hedge order
    Debited,
    /// MARKET_USER_ORDER_SUCCESS → treasury credit
    Hedged,
    /// MARKET_USER_ORDER_FAILED → re-quote + slippage decision
    HedgeFailed,
    /// REFUND_USER_ORDER → treasury refund
    Refund,
    /// stale `*_IN_PROGRESS` → retryable state
    StaleSweep,
}

impl WorkerKind {
    /// Every worker, in scheduling order.
    pub const ALL: [WorkerKind; 6] = [
        WorkerKind::Pending,
        WorkerKind::Debited,
        WorkerKind::Hedged,
        WorkerKind::HedgeFailed,
        WorkerKind::Refund,
        WorkerKind::StaleSweep,
    ];

    /// The worker's fixed cron-lock id, stable across restarts.
    pub fn lock_id(&self) -> Uuid {
        match self {
            WorkerKind::Pending => uuid!("62444ba0-b2dd-4b8f-afee-c04f7b2ab6e0"),
            WorkerKind::Debited => uuid!("62444ba0-b2dd-4b8f-afee-c04f7b2ab6e1"),
            WorkerKind::Refund => uuid!("62444ba0-b2dd-4b8f-afee-c04f7b2ab6e2"),
            WorkerKind::Hedged => uuid!("62444ba0-b2dd-4b8f-afee-c04f7b2ab6e3"),
            WorkerKind::HedgeFailed => uuid!("62444ba0-b2dd-4b8f-afee-c04f7b2ab6e4"),
            WorkerKind::StaleSweep => uuid!("62444ba0-b2dd-4b8f-afee-c04f7b2ab6e5"),
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            WorkerKind::Pending => "pending",
            WorkerKind::Debited => "debited",
            WorkerKind::Hedged => "hedged",
            WorkerKind::HedgeFailed => "hedge-failed",
            WorkerKind::Refund => "refund",
            WorkerKind::StaleSweep => "stale-sweep",
        }
    }
}

/// Drives [`OrderService`] worker actions on a fixed cadence under
/// per-worker cron locks.
pub struct WorkerScheduler {
    service: OrderService,
    locks: Arc<dyn CronLockStore>,
    settings: WorkerSettings,
}

impl WorkerScheduler {
    pub fn new(
        service: OrderService,
        locks: Arc<dyn CronLockStore>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            service,
            locks,
            settings,
        }
    }

    /// Run one guarded tick of a worker.
    ///
    /// Returns `false` when the tick was skipped because another
    /// instance holds the worker's lock.
    pub async fn run_tick(&self, kind: WorkerKind) -> bool {
        let id = kind.lock_id();

        match self.locks.acquire(id).await {
            Ok(()) => {}
            Err(err) if err.is_lock_held() => {
                debug!(worker = kind.name(), "tick skipped; lock held");
                return false;
            }
            Err(err) => {
                error!(worker = kind.name(), error = %err, "lock acquire failed");
                return false;
            }
        }

        if let Err(err) = self.dispatch(kind).await {
            error!(worker = kind.name(), error = %err, "tick dispatch failed");
        }

        // Release after dispatch: per-order tasks run outside the lock.
        if let Err(err) = self.locks.release(id).await {
            error!(worker = kind.name(), error = %err, "lock release failed");
        }
        true
    }

    async fn dispatch(&self, kind: WorkerKind) -> EngineResult<()> {
        match kind {
            // Handles are dropped: tasks detach and drive their own
            // success/failure transitions.
            WorkerKind::Pending => {
                self.service.process_pending_orders().await?;
            }
            WorkerKind::Debited => {
                self.service.process_debited_orders().await?;
            }
            WorkerKind::Hedged => {
                self.service.process_hedged_orders().await?;
            }
            WorkerKind::HedgeFailed => {
                self.service.process_hedge_failed_orders().await?;
            }
            WorkerKind::Refund => {
                self.service.process_refund_orders().await?;
            }
            WorkerKind::StaleSweep => {
                self.service
                    .sweep_stale_orders(self.settings.stale_after())
                    .await?;
            }
        }
        Ok(())
    }

    /// Spawn one periodic loop per worker kind.
    pub fn spawn(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown_tx, _) = watch::channel(false);
        let interval = self.settings.tick_interval().max(Duration::from_millis(10));

        let tasks = WorkerKind::ALL
            .into_iter()
            .map(|kind| {
                let scheduler = self.clone();
                let mut shutdown_rx = shutdown_tx.subscribe();
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(interval);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    loop {
                        tokio::select! {
                            _ = ticker.tick() => {
                                scheduler.run_tick(kind).await;
                            }
                            _ = shutdown_rx.changed() => {
                                info!(worker = kind.name(), "worker stopped");
                                break;
                            }
                        }
                    }
                })
            })
            .collect();

        info!(
            workers = WorkerKind::ALL.len(),
            interval_ms = interval.as_millis() as u64,
            "worker scheduler started"
        );
        SchedulerHandle { shutdown_tx, tasks }
    }
}

/// Handle over the spawned worker loops.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stop every worker loop and wait for them to exit. In-flight
    /// per-order tasks finish on their own.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lock_ids_are_distinct() {
        let ids: HashSet<Uuid> = WorkerKind::ALL.iter().map(|k| k.lock_id()).collect();
        assert_eq!(ids.len(), WorkerKind::ALL.len());
    }

    #[test]
    fn test_lock_ids_are_stable() {
        // Restart safety: ids are constants, never derived.
        assert_eq!(
            WorkerKind::Pending.lock_id(),
            uuid!("62444ba0-b2dd-4b8f-afee-c04f7b2ab6e0")
        );
        assert_eq!(
            WorkerKind::StaleSweep.lock_id(),
            uuid!("62444ba0-b2dd-4b8f-afee-c04f7b2ab6e5")
        );
    }
}
