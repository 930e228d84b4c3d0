//! Venue client trait definition.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::depth::MarketDepth;
use crate::markets::Venue;
use crate::orders::OrderSide;

use super::error::VenueResult;
use super::types::{PlacedOrder, VenueMarketListing};

/// Boundary to one exchange's REST API.
///
/// Implementations are bound once per [`Venue`] variant at construction;
/// callers never branch on venue names.
#[async_trait]
pub trait VenueClient: Send + Sync {
    /// The venue this client talks to.
    fn venue(&self) -> Venue;

    /// List every market the venue currently offers.
    async fn list_markets(&self) -> VenueResult<Vec<VenueMarketListing>>;

    /// Fetch the order-book depth for a venue market.
    ///
    /// The returned depth is already sanitized: malformed or
    /// non-positive levels are dropped.
    async fn get_depth(&self, venue_symbol: &str) -> VenueResult<MarketDepth>;

    /// Submit a market order of the given size.
    ///
    /// # Errors
    ///
    /// Returns an error if the venue rejects the order or the request
    /// fails; the caller decides whether the order's lifecycle continues.
    async fn place_market_order(
        &self,
        venue_symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> VenueResult<PlacedOrder>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that the trait stays object safe and Send + Sync
    fn _assert_send_sync<T: Send + Sync>() {}

    fn _check_trait_bounds() {
        _assert_send_sync::<Box<dyn VenueClient>>();
    }
}
