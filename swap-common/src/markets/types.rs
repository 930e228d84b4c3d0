use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Store-assigned identifier of a logical market.
pub type MegaMarketId = i64;

/// Store-assigned identifier of a venue market row.
pub type VenueMarketId = i64;

/// Supported execution venues.
///
/// A closed set: each variant has exactly one client implementation bound
/// at construction, so routing decisions are exhaustive matches rather
/// than string comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    /// OMPFinex exchange
    Ompfinex,
    /// Wallex exchange
    Wallex,
}

impl Venue {
    /// All supported venues, in registration order.
    pub const ALL: [Venue; 2] = [Venue::Ompfinex, Venue::Wallex];

    /// Stable lowercase name, used in storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::Ompfinex => "ompfinex",
            Venue::Wallex => "wallex",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Venue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ompfinex" => Ok(Venue::Ompfinex),
            "wallex" => Ok(Venue::Wallex),
            other => Err(format!("unknown venue: {other}")),
        }
    }
}

/// A logical, venue-independent market.
///
/// Carries the routing metadata snapshotted onto orders at submission:
/// the token pair, the platform fee, and the tolerated slippage. The
/// `aliases` set holds the venue-side pair names (`"ETH/USDT"` style)
/// under which this pair appears across exchanges with inconsistent
/// naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MegaMarket {
    /// Store-assigned id (0 until persisted)
    pub id: MegaMarketId,
    /// Whether this pair is currently routable
    pub active: bool,
    /// Token sold by the user on the source chain
    pub source_token_symbol: String,
    /// Token credited to the user on the destination chain
    pub destination_token_symbol: String,
    /// Platform fee, as a fraction (0.01 = 1%)
    pub fee_percentage: Decimal,
    /// Tolerated re-quote drift before a failed hedge aborts to refund
    pub slippage_percentage: Decimal,
    /// Venue-side pair names matching this logical market
    pub aliases: Vec<String>,
}

impl MegaMarket {
    /// Returns true if `pair_name` identifies this market on some venue.
    pub fn matches_alias(&self, pair_name: &str) -> bool {
        self.aliases.iter().any(|a| a == pair_name)
    }
}

/// A concrete listing of a logical market on one exchange.
///
/// Unique by `(venue, venue_symbol)`; reconciliation replaces prior rows
/// with the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueMarket {
    /// Store-assigned id (0 until persisted)
    pub id: VenueMarketId,
    /// The exchange carrying this listing
    pub venue: Venue,
    /// Opaque venue-side market identifier (numeric id or symbol string)
    pub venue_symbol: String,
    /// The logical market this listing maps to
    pub mega_market_id: MegaMarketId,
    /// Whether the listing was present in the latest reconciliation
    pub active: bool,
    /// Venue-side taker fee, as a fraction
    pub fee_percentage: Decimal,
    /// Row timestamps
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VenueMarket {
    /// Create a new active listing, not yet persisted.
    pub fn new(
        venue: Venue,
        venue_symbol: impl Into<String>,
        mega_market_id: MegaMarketId,
        fee_percentage: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            venue,
            venue_symbol: venue_symbol.into(),
            mega_market_id,
            active: true,
            fee_percentage,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_venue_round_trip() {
        for venue in Venue::ALL {
            assert_eq!(venue.as_str().parse::<Venue>().unwrap(), venue);
        }
        assert!("binance".parse::<Venue>().is_err());
    }

    #[test]
    fn test_alias_matching() {
        let market = MegaMarket {
            id: 1,
            active: true,
            source_token_symbol: "ETH".to_string(),
            destination_token_symbol: "USDT".to_string(),
            fee_percentage: dec!(0.001),
            slippage_percentage: dec!(0.02),
            aliases: vec!["ETH/USDT".to_string(), "WETH/USDT".to_string()],
        };

        assert!(market.matches_alias("ETH/USDT"));
        assert!(market.matches_alias("WETH/USDT"));
        assert!(!market.matches_alias("BTC/USDT"));
    }
}
