//! Order submission surface and venue/chain executors.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Semaphore;
use tracing::info;

use swap_common::chain::ChainClient;
use swap_common::error::ValidationError;
use swap_common::markets::VenueMarketId;
use swap_common::orders::{Order, OrderDraft, OrderId, OrderSide, OrderStatus};
use swap_common::stores::{MarketStore, OrderStore};
#[allow(unused_imports)]
use swap_common::venue::VenueClient;

use crate::errors::{EngineError, EngineResult};
use crate::router::BestPriceRouter;
use crate::venues::VenueClients;

/// The order engine: submission surface plus the worker actions that
/// drive each order through its lifecycle.
///
/// Cheap to clone; every field is shared. The database is the single
/// source of truth for order state - the service holds no order cache.
#[derive(Clone)]
pub struct OrderService {
    pub(crate) orders: Arc<dyn OrderStore>,
    pub(crate) markets: Arc<dyn MarketStore>,
    pub(crate) venues: Arc<VenueClients>,
    pub(crate) chain: Arc<dyn ChainClient>,
    pub(crate) router: Arc<BestPriceRouter>,
    /// Bounds concurrently running per-order tasks across all workers
    pub(crate) limiter: Arc<Semaphore>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        markets: Arc<dyn MarketStore>,
        venues: Arc<VenueClients>,
        chain: Arc<dyn ChainClient>,
        router: Arc<BestPriceRouter>,
        max_concurrent_tasks: usize,
    ) -> Self {
        Self {
            orders,
            markets,
            venues,
            chain,
            router,
            limiter: Arc::new(Semaphore::new(max_concurrent_tasks.max(1))),
        }
    }

    /// Accept a swap order: validate, snapshot market data, persist as
    /// `PENDING`.
    ///
    /// Snapshots `slippage_percentage` and derives the token symbols
    /// from the logical market and direction; later market edits never
    /// affect the stored order.
    pub async fn submit_order(&self, draft: OrderDraft) -> EngineResult<Order> {
        if draft.volume <= Decimal::ZERO {
            return Err(ValidationError::not_positive("volume", draft.volume).into());
        }
        if draft.price <= Decimal::ZERO {
            return Err(ValidationError::not_positive("price", draft.price).into());
        }
        for (field, value) in [
            ("user_address", &draft.user_address),
            ("token_address", &draft.token_address),
            ("contract_address", &draft.contract_address),
        ] {
            if value.is_empty() {
                return Err(ValidationError::required(field).into());
            }
        }

        let venue_market = self
            .markets
            .get_venue_market(draft.venue_market_id)
            .await?
            .ok_or_else(|| EngineError::not_found("VenueMarket", draft.venue_market_id))?;

        let mega_market = self
            .markets
            .get_active_mega_market(venue_market.mega_market_id)
            .await?
            .ok_or_else(|| EngineError::not_found("MegaMarket", venue_market.mega_market_id))?;

        let (source_token_symbol, destination_token_symbol) = if draft.is_buy {
            (
                mega_market.source_token_symbol.clone(),
                mega_market.destination_token_symbol.clone(),
            )
        } else {
            (
                mega_market.destination_token_symbol.clone(),
                mega_market.source_token_symbol.clone(),
            )
        };

        let now = Utc::now();
        let order = Order {
            id: 0,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            user_id: draft.user_id,
            user_address: draft.user_address,
            destination_address: draft.destination_address,
            mega_market_id: mega_market.id,
            venue_market_id: venue_market.id,
            is_buy: draft.is_buy,
            volume: draft.volume,
            price: draft.price,
            slippage_percentage: mega_market.slippage_percentage,
            from_network: draft.from_network,
            to_network: draft.to_network,
            token_address: draft.token_address,
            contract_address: draft.contract_address,
            deadline: draft.deadline,
            signature: draft.signature,
            source_token_symbol,
            destination_token_symbol,
            deposit_tx_hash: None,
            release_tx_hash: None,
            venue_order_ref: None,
        };

        let order = self.orders.insert(order).await?;
        info!(
            order_id = order.id,
            mega_market_id = order.mega_market_id,
            is_buy = order.is_buy,
            volume = %order.volume,
            "order submitted"
        );
        Ok(order)
    }

    /// Fetch one order.
    pub async fn get_order(&self, id: OrderId) -> EngineResult<Order> {
        self.orders
            .get_by_id(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Order", id))
    }

    /// All orders submitted by one user, newest first.
    pub async fn get_orders_for_user(&self, user_id: &str) -> EngineResult<Vec<Order>> {
        Ok(self.orders.get_by_user(user_id).await?)
    }

    /// The best-price router, shared with the submission surface.
    pub fn router(&self) -> &BestPriceRouter {
        &self.router
    }

    /// Place the hedge order on the venue a market row points at.
    ///
    /// Returns the venue's opaque order reference. A venue without a
    /// bound client is [`EngineError::UnsupportedVenue`], fatal for the
    /// order.
    pub async fn place_market_order(
        &self,
        venue_market_id: VenueMarketId,
        volume: Decimal,
        is_buy: bool,
    ) -> EngineResult<String> {
        let market = self
            .markets
            .get_venue_market(venue_market_id)
            .await?
            .ok_or_else(|| EngineError::not_found("VenueMarket", venue_market_id))?;

        let client = self
            .venues
            .get(market.venue)
            .ok_or(EngineError::UnsupportedVenue(market.venue))?;

        let placed = client
            .place_market_order(
                &market.venue_symbol,
                OrderSide::from_is_buy(is_buy),
                volume,
            )
            .await?;

        Ok(placed.venue_order_ref)
    }
}
