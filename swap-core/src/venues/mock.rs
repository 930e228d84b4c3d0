//! Scriptable venue client for tests and dry-run mode.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use swap_common::depth::MarketDepth;
use swap_common::markets::Venue;
use swap_common::orders::OrderSide;
use swap_common::venue::{PlacedOrder, VenueClient, VenueError, VenueMarketListing, VenueResult};

/// A placed-order record captured by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedOrder {
    pub venue_symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
}

#[derive(Default)]
struct MockState {
    markets: Vec<VenueMarketListing>,
    depth: HashMap<String, MarketDepth>,
    fail_listing: Option<VenueError>,
    fail_depth: Option<VenueError>,
    reject_orders: Option<String>,
    placed: Vec<RecordedOrder>,
}

/// In-memory [`VenueClient`] with scriptable responses.
pub struct MockVenueClient {
    venue: Venue,
    state: Mutex<MockState>,
    next_ref: AtomicU64,
}

impl MockVenueClient {
    pub fn new(venue: Venue) -> Self {
        Self {
            venue,
            state: Mutex::new(MockState::default()),
            next_ref: AtomicU64::new(1),
        }
    }

    /// Script the market listing returned by `list_markets`.
    pub fn set_markets(&self, markets: Vec<VenueMarketListing>) {
        self.state.lock().markets = markets;
    }

    /// Script the depth returned for one venue symbol.
    pub fn set_depth(&self, venue_symbol: impl Into<String>, depth: MarketDepth) {
        self.state.lock().depth.insert(venue_symbol.into(), depth);
    }

    /// Make every `list_markets` call fail until cleared.
    pub fn fail_listing(&self, error: VenueError) {
        self.state.lock().fail_listing = Some(error);
    }

    /// Make every `get_depth` call fail until cleared.
    pub fn fail_depth(&self, error: VenueError) {
        self.state.lock().fail_depth = Some(error);
    }

    /// Reject all market orders with the given reason until cleared.
    pub fn reject_orders(&self, reason: impl Into<String>) {
        self.state.lock().reject_orders = Some(reason.into());
    }

    /// Accept market orders again.
    pub fn accept_orders(&self) {
        self.state.lock().reject_orders = None;
    }

    /// Orders placed so far.
    pub fn placed_orders(&self) -> Vec<RecordedOrder> {
        self.state.lock().placed.clone()
    }
}

#[async_trait]
impl VenueClient for MockVenueClient {
    fn venue(&self) -> Venue {
        self.venue
    }

    async fn list_markets(&self) -> VenueResult<Vec<VenueMarketListing>> {
        let state = self.state.lock();
        if let Some(err) = &state.fail_listing {
            return Err(err.clone());
        }
        Ok(state.markets.clone())
    }

    async fn get_depth(&self, venue_symbol: &str) -> VenueResult<MarketDepth> {
        let state = self.state.lock();
        if let Some(err) = &state.fail_depth {
            return Err(err.clone());
        }
        state
            .depth
            .get(venue_symbol)
            .cloned()
            .ok_or_else(|| VenueError::api(Some(404), format!("no market {venue_symbol}")))
    }

    async fn place_market_order(
        &self,
        venue_symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> VenueResult<PlacedOrder> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.reject_orders {
            return Err(VenueError::order_rejected(reason.clone()));
        }
        state.placed.push(RecordedOrder {
            venue_symbol: venue_symbol.to_string(),
            side,
            quantity,
        });
        let n = self.next_ref.fetch_add(1, Ordering::Relaxed);
        Ok(PlacedOrder {
            venue_order_ref: format!("{}-{}", self.venue, n),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use swap_common::depth::BookLevel;

    #[tokio::test]
    async fn test_scripted_depth_and_orders() {
        let mock = MockVenueClient::new(Venue::Wallex);
        mock.set_depth(
            "ETHUSDT",
            MarketDepth::new(vec![BookLevel::new(dec!(101), dec!(1))], vec![]),
        );

        let depth = mock.get_depth("ETHUSDT").await.unwrap();
        assert_eq!(depth.total_quantity(swap_common::depth::BookSide::Asks), dec!(1));
        assert!(mock.get_depth("UNKNOWN").await.is_err());

        let placed = mock
            .place_market_order("ETHUSDT", OrderSide::Buy, dec!(1))
            .await
            .unwrap();
        assert_eq!(placed.venue_order_ref, "wallex-1");
        assert_eq!(mock.placed_orders().len(), 1);
    }

    #[tokio::test]
    async fn test_rejection_toggles() {
        let mock = MockVenueClient::new(Venue::Ompfinex);
        mock.reject_orders("insufficient balance");
        assert!(mock
            .place_market_order("7", OrderSide::Sell, dec!(2))
            .await
            .is_err());

        mock.accept_orders();
        assert!(mock
            .place_market_order("7", OrderSide::Sell, dec!(2))
            .await
            .is_ok());
    }
}
