//! Best-price router.
//!
//! For a logical market, queries every mapped venue concurrently,
//! computes the volume-weighted price to fill the requested size on the
//! relevant book side, and picks the venue with the lowest price. Venues
//! that fail or lack depth are skipped; only a complete inability to
//! price is an error.

use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use swap_common::depth::{vwap, BookSide};
use swap_common::error::ValidationError;
use swap_common::markets::{MegaMarket, MegaMarketId, VenueMarket};
use swap_common::stores::MarketStore;
#[allow(unused_imports)]
use swap_common::venue::VenueClient;

use crate::errors::{EngineError, EngineResult};
use crate::venues::VenueClients;

/// A routed quote: the chosen venue market and its execution price.
#[derive(Debug, Clone)]
pub struct RouteQuote {
    /// Volume-weighted execution price on the chosen venue
    pub price: Decimal,
    /// The venue listing the order should execute on
    pub venue_market: VenueMarket,
    /// The logical market the quote was computed for
    pub mega_market: MegaMarket,
}

/// Routes volume to the venue offering the best execution price.
pub struct BestPriceRouter {
    store: Arc<dyn MarketStore>,
    venues: Arc<VenueClients>,
}

impl BestPriceRouter {
    pub fn new(store: Arc<dyn MarketStore>, venues: Arc<VenueClients>) -> Self {
        Self { store, venues }
    }

    /// Quote the best venue for filling `volume` on the given side.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidInput`] for non-positive volume
    /// - [`EngineError::NotFound`] when the logical market is absent or
    ///   inactive
    /// - [`EngineError::InsufficientLiquidity`] when no venue can fill
    ///   the volume
    pub async fn route_best_price(
        &self,
        mega_market_id: MegaMarketId,
        volume: Decimal,
        is_buy: bool,
    ) -> EngineResult<RouteQuote> {
        if volume <= Decimal::ZERO {
            return Err(ValidationError::not_positive("volume", volume).into());
        }

        let mega_market = self
            .store
            .get_active_mega_market(mega_market_id)
            .await?
            .ok_or_else(|| EngineError::not_found("MegaMarket", mega_market_id))?;

        let venue_markets = self
            .store
            .get_venue_markets_by_mega_market(mega_market_id)
            .await?;

        let side = BookSide::taken_by(is_buy);
        let quotes = join_all(
            venue_markets
                .into_iter()
                .map(|market| self.quote_venue(market, volume, side)),
        )
        .await;

        // Lowest price wins; ties keep the first observed venue.
        let best = quotes
            .into_iter()
            .flatten()
            .min_by(|a, b| a.0.cmp(&b.0));

        match best {
            Some((price, venue_market)) => {
                debug!(
                    mega_market_id,
                    venue = %venue_market.venue,
                    %price,
                    %volume,
                    "route selected"
                );
                Ok(RouteQuote {
                    price,
                    venue_market,
                    mega_market,
                })
            }
            None => Err(EngineError::InsufficientLiquidity { requested: volume }),
        }
    }

    /// Price one venue market, or `None` when the venue is unusable.
    async fn quote_venue(
        &self,
        market: VenueMarket,
        volume: Decimal,
        side: BookSide,
    ) -> Option<(Decimal, VenueMarket)> {
        let Some(client) = self.venues.get(market.venue) else {
            warn!(venue = %market.venue, "no client bound for venue; skipping");
            return None;
        };

        let depth = match client.get_depth(&market.venue_symbol).await {
            Ok(depth) => depth,
            Err(err) => {
                warn!(
                    venue = %market.venue,
                    venue_symbol = %market.venue_symbol,
                    error = %err,
                    "depth fetch failed; skipping venue"
                );
                return None;
            }
        };

        match vwap(depth.side(side), volume) {
            Some(price) => Some((price, market)),
            None => {
                warn!(
                    venue = %market.venue,
                    venue_symbol = %market.venue_symbol,
                    %volume,
                    "insufficient depth; skipping venue"
                );
                None
            }
        }
    }
}
