//! Persistence trait definitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::markets::{MegaMarket, MegaMarketId, VenueMarket, VenueMarketId};
use crate::orders::{Order, OrderId, OrderStatus};

use super::error::StoreResult;

/// Order persistence port.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order, assigning its id. Returns the stored order.
    async fn insert(&self, order: Order) -> StoreResult<Order>;

    /// Fetch one order by id.
    async fn get_by_id(&self, id: OrderId) -> StoreResult<Option<Order>>;

    /// Overwrite an existing order record; bumps `updated_at`.
    async fn update(&self, order: &Order) -> StoreResult<()>;

    /// All orders currently in the given status.
    async fn get_by_status(&self, status: OrderStatus) -> StoreResult<Vec<Order>>;

    /// All orders submitted by one user, newest first.
    async fn get_by_user(&self, user_id: &str) -> StoreResult<Vec<Order>>;

    /// Move every listed order to `status` in one atomic update.
    ///
    /// This is the engine's per-order mutex: only the worker whose batch
    /// update moved an order out of its source status acts on it.
    async fn change_status_by_ids(&self, ids: &[OrderId], status: OrderStatus) -> StoreResult<()>;

    /// Orders stuck in any `*_IN_PROGRESS` status since before `cutoff`.
    async fn get_stale_in_progress(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Order>>;
}

/// Market persistence port.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Persist a logical market, assigning its id when new.
    async fn save_mega_market(&self, market: MegaMarket) -> StoreResult<MegaMarket>;

    /// Fetch a logical market regardless of active flag.
    async fn get_mega_market(&self, id: MegaMarketId) -> StoreResult<Option<MegaMarket>>;

    /// Fetch a logical market only if it is active.
    async fn get_active_mega_market(&self, id: MegaMarketId) -> StoreResult<Option<MegaMarket>>;

    /// Every active logical market.
    async fn get_all_active_mega_markets(&self) -> StoreResult<Vec<MegaMarket>>;

    /// Fetch one venue market row by id.
    async fn get_venue_market(&self, id: VenueMarketId) -> StoreResult<Option<VenueMarket>>;

    /// Active venue markets mapped to one logical market.
    async fn get_venue_markets_by_mega_market(
        &self,
        mega_market_id: MegaMarketId,
    ) -> StoreResult<Vec<VenueMarket>>;

    /// Atomically replace the active venue-market set: soft-delete every
    /// active row, then upsert `markets` with conflict target
    /// `(venue, venue_symbol)`. Concurrent readers never observe the
    /// half-replaced set. Returns the stored rows.
    async fn replace_active_venue_markets(
        &self,
        markets: Vec<VenueMarket>,
    ) -> StoreResult<Vec<VenueMarket>>;
}

/// Named-mutex port backed by uniquely-keyed lock rows.
#[async_trait]
pub trait CronLockStore: Send + Sync {
    /// Insert the lock row. Fails with `StoreError::LockHeld` when a row
    /// with the same id already exists.
    async fn acquire(&self, id: Uuid) -> StoreResult<()>;

    /// Delete the lock row, releasing the mutex.
    async fn release(&self, id: Uuid) -> StoreResult<()>;
}
