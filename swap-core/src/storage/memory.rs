//! In-memory store implementations.
//!
//! Locking discipline: a `parking_lot` lock is never held across an
//! await point; every method locks, mutates, and releases synchronously.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use swap_common::markets::{MegaMarket, MegaMarketId, VenueMarket, VenueMarketId};
use swap_common::orders::{Order, OrderId, OrderStatus};
use swap_common::stores::{CronLockStore, MarketStore, OrderStore, StoreError, StoreResult};

#[derive(Default)]
struct OrderState {
    orders: HashMap<OrderId, Order>,
    next_id: OrderId,
}

/// In-memory [`OrderStore`].
#[derive(Default)]
pub struct MemoryOrderStore {
    state: RwLock<OrderState>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, mut order: Order) -> StoreResult<Order> {
        let mut state = self.state.write();
        state.next_id += 1;
        order.id = state.next_id;
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_by_id(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.state.read().orders.get(&id).cloned())
    }

    async fn update(&self, order: &Order) -> StoreResult<()> {
        let mut state = self.state.write();
        let mut stored = order.clone();
        stored.updated_at = Utc::now();
        state.orders.insert(stored.id, stored);
        Ok(())
    }

    async fn get_by_status(&self, status: OrderStatus) -> StoreResult<Vec<Order>> {
        let state = self.state.read();
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }

    async fn get_by_user(&self, user_id: &str) -> StoreResult<Vec<Order>> {
        let state = self.state.read();
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.id));
        Ok(orders)
    }

    async fn change_status_by_ids(&self, ids: &[OrderId], status: OrderStatus) -> StoreResult<()> {
        let mut state = self.state.write();
        let now = Utc::now();
        for id in ids {
            if let Some(order) = state.orders.get_mut(id) {
                order.status = status;
                order.updated_at = now;
            }
        }
        Ok(())
    }

    async fn get_stale_in_progress(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Order>> {
        let state = self.state.read();
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.status.is_in_progress() && o.updated_at <= cutoff)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }
}

#[derive(Default)]
struct MarketState {
    mega_markets: HashMap<MegaMarketId, MegaMarket>,
    next_mega_id: MegaMarketId,
    venue_markets: HashMap<VenueMarketId, VenueMarket>,
    next_venue_id: VenueMarketId,
}

/// In-memory [`MarketStore`].
#[derive(Default)]
pub struct MemoryMarketStore {
    state: RwLock<MarketState>,
}

impl MemoryMarketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarketStore for MemoryMarketStore {
    async fn save_mega_market(&self, mut market: MegaMarket) -> StoreResult<MegaMarket> {
        let mut state = self.state.write();
        if market.id == 0 {
            state.next_mega_id += 1;
            market.id = state.next_mega_id;
        }
        state.mega_markets.insert(market.id, market.clone());
        Ok(market)
    }

    async fn get_mega_market(&self, id: MegaMarketId) -> StoreResult<Option<MegaMarket>> {
        Ok(self.state.read().mega_markets.get(&id).cloned())
    }

    async fn get_active_mega_market(&self, id: MegaMarketId) -> StoreResult<Option<MegaMarket>> {
        Ok(self
            .state
            .read()
            .mega_markets
            .get(&id)
            .filter(|m| m.active)
            .cloned())
    }

    async fn get_all_active_mega_markets(&self) -> StoreResult<Vec<MegaMarket>> {
        let state = self.state.read();
        let mut markets: Vec<MegaMarket> =
            state.mega_markets.values().filter(|m| m.active).cloned().collect();
        markets.sort_by_key(|m| m.id);
        Ok(markets)
    }

    async fn get_venue_market(&self, id: VenueMarketId) -> StoreResult<Option<VenueMarket>> {
        Ok(self.state.read().venue_markets.get(&id).cloned())
    }

    async fn get_venue_markets_by_mega_market(
        &self,
        mega_market_id: MegaMarketId,
    ) -> StoreResult<Vec<VenueMarket>> {
        let state = self.state.read();
        let mut markets: Vec<VenueMarket> = state
            .venue_markets
            .values()
            .filter(|m| m.mega_market_id == mega_market_id && m.active)
            .cloned()
            .collect();
        markets.sort_by_key(|m| m.id);
        Ok(markets)
    }

    async fn replace_active_venue_markets(
        &self,
        markets: Vec<VenueMarket>,
    ) -> StoreResult<Vec<VenueMarket>> {
        // One write-lock section: readers see the old set or the new set,
        // never the gap between soft-delete and upsert.
        let mut state = self.state.write();
        let now = Utc::now();

        for market in state.venue_markets.values_mut() {
            market.active = false;
            market.updated_at = now;
        }

        let mut stored = Vec::with_capacity(markets.len());
        for mut market in markets {
            let existing_id = state
                .venue_markets
                .values()
                .find(|m| m.venue == market.venue && m.venue_symbol == market.venue_symbol)
                .map(|m| m.id);

            match existing_id {
                Some(id) => {
                    let row = state.venue_markets.get_mut(&id).expect("row exists");
                    row.mega_market_id = market.mega_market_id;
                    row.fee_percentage = market.fee_percentage;
                    row.active = true;
                    row.updated_at = now;
                    stored.push(row.clone());
                }
                None => {
                    state.next_venue_id += 1;
                    market.id = state.next_venue_id;
                    market.active = true;
                    market.created_at = now;
                    market.updated_at = now;
                    state.venue_markets.insert(market.id, market.clone());
                    stored.push(market);
                }
            }
        }

        Ok(stored)
    }
}

/// In-memory [`CronLockStore`]: a set of held lock ids.
#[derive(Default)]
pub struct MemoryCronLockStore {
    held: Mutex<HashSet<Uuid>>,
}

impl MemoryCronLockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CronLockStore for MemoryCronLockStore {
    async fn acquire(&self, id: Uuid) -> StoreResult<()> {
        if self.held.lock().insert(id) {
            Ok(())
        } else {
            Err(StoreError::LockHeld(id))
        }
    }

    async fn release(&self, id: Uuid) -> StoreResult<()> {
        self.held.lock().remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use swap_common::markets::Venue;
    use swap_common::orders::PermitSignature;

    fn sample_order() -> Order {
        let now = Utc::now();
        Order {
            id: 0,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            user_id: "u1".to_string(),
            user_address: "0xUser".to_string(),
            destination_address: None,
            mega_market_id: 1,
            venue_market_id: 1,
            is_buy: true,
            volume: dec!(1),
            price: dec!(100),
            slippage_percentage: dec!(0.01),
            from_network: "sepolia".to_string(),
            to_network: "mumbai".to_string(),
            token_address: "0xT".to_string(),
            contract_address: "0xC".to_string(),
            deadline: 0,
            signature: PermitSignature {
                v: 27,
                r: "0x1".to_string(),
                s: "0x2".to_string(),
            },
            source_token_symbol: "USDT".to_string(),
            destination_token_symbol: "ETH".to_string(),
            deposit_tx_hash: None,
            release_tx_hash: None,
            venue_order_ref: None,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_monotonic_ids() {
        let store = MemoryOrderStore::new();
        let first = store.insert(sample_order()).await.unwrap();
        let second = store.insert(sample_order()).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_change_status_read_back() {
        let store = MemoryOrderStore::new();
        let order = store.insert(sample_order()).await.unwrap();

        store
            .change_status_by_ids(&[order.id], OrderStatus::UserDebitInProgress)
            .await
            .unwrap();

        let read = store.get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(read.status, OrderStatus::UserDebitInProgress);
    }

    #[tokio::test]
    async fn test_get_by_status_filters() {
        let store = MemoryOrderStore::new();
        let a = store.insert(sample_order()).await.unwrap();
        let _b = store.insert(sample_order()).await.unwrap();
        store
            .change_status_by_ids(&[a.id], OrderStatus::UserDebitSuccess)
            .await
            .unwrap();

        let pending = store.get_by_status(OrderStatus::Pending).await.unwrap();
        assert_eq!(pending.len(), 1);
        let debited = store
            .get_by_status(OrderStatus::UserDebitSuccess)
            .await
            .unwrap();
        assert_eq!(debited.len(), 1);
        assert_eq!(debited[0].id, a.id);
    }

    #[tokio::test]
    async fn test_stale_in_progress_respects_cutoff() {
        let store = MemoryOrderStore::new();
        let order = store.insert(sample_order()).await.unwrap();
        store
            .change_status_by_ids(&[order.id], OrderStatus::UserDebitInProgress)
            .await
            .unwrap();

        // Cutoff in the past: freshly-updated order is not stale
        let past = Utc::now() - chrono::Duration::seconds(60);
        assert!(store.get_stale_in_progress(past).await.unwrap().is_empty());

        // Cutoff now-or-later: it is
        let now = Utc::now();
        assert_eq!(store.get_stale_in_progress(now).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cron_lock_exclusive() {
        let locks = MemoryCronLockStore::new();
        let id = Uuid::new_v4();

        locks.acquire(id).await.unwrap();
        let err = locks.acquire(id).await.unwrap_err();
        assert!(err.is_lock_held());

        locks.release(id).await.unwrap();
        locks.acquire(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_active_venue_markets_swaps_set() {
        let store = MemoryMarketStore::new();

        let first = store
            .replace_active_venue_markets(vec![
                VenueMarket::new(Venue::Ompfinex, "7", 1, dec!(0.001)),
                VenueMarket::new(Venue::Wallex, "ETHUSDT", 1, dec!(0.002)),
            ])
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(store.get_venue_markets_by_mega_market(1).await.unwrap().len(), 2);

        // Second reconciliation drops the ompfinex row and keeps wallex
        let second = store
            .replace_active_venue_markets(vec![VenueMarket::new(
                Venue::Wallex,
                "ETHUSDT",
                1,
                dec!(0.002),
            )])
            .await
            .unwrap();
        assert_eq!(second.len(), 1);

        let active = store.get_venue_markets_by_mega_market(1).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].venue, Venue::Wallex);
        // The surviving row kept its id
        assert_eq!(second[0].id, first[1].id);
    }
}
