//! Venue-facing data shapes, normalized from each exchange's wire types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One market as listed by a venue, normalized for reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueMarketListing {
    /// Opaque venue-side identifier used for depth and order calls
    pub venue_symbol: String,
    /// Base asset symbol as the venue names it
    pub base_asset: String,
    /// Quote asset symbol as the venue names it
    pub quote_asset: String,
    /// Venue taker fee, as a fraction; zero when the venue does not expose it
    pub fee_percentage: Decimal,
}

impl VenueMarketListing {
    /// The `BASE/QUOTE` name matched against logical-market aliases.
    pub fn pair_name(&self) -> String {
        format!("{}/{}", self.base_asset, self.quote_asset)
    }
}

/// Acknowledgement of an accepted venue order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    /// Opaque venue-side order reference
    pub venue_order_ref: String,
}
