//! The central order entity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::markets::{MegaMarketId, VenueMarketId};

use super::types::{OrderId, OrderStatus, PermitSignature};

/// One swap order: a user's signed intent plus its execution trail.
///
/// `slippage_percentage` and the token symbols are snapshotted from the
/// logical market at submission; later market edits never affect a live
/// order. The database record is the single source of truth for
/// `status` - no in-memory copies are kept between worker ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned monotonic id (0 until persisted)
    pub id: OrderId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Platform-side user identity
    pub user_id: String,
    /// User wallet on the source chain; the permit debits this address
    pub user_address: String,
    /// Destination wallet; falls back to `user_address` when absent
    pub destination_address: Option<String>,

    /// Logical market snapshotted at submission
    pub mega_market_id: MegaMarketId,
    /// Venue listing the hedge will execute on
    pub venue_market_id: VenueMarketId,
    pub is_buy: bool,
    /// Source-side amount
    pub volume: Decimal,
    /// Quoted execution price, destination units per source unit
    pub price: Decimal,
    /// Tolerated re-quote drift, snapshotted from the logical market
    pub slippage_percentage: Decimal,

    /// Source chain network name
    pub from_network: String,
    /// Destination chain network name
    pub to_network: String,
    /// Source token contract debited by the permit
    pub token_address: String,
    /// Settlement contract invoked for the permit debit
    pub contract_address: String,
    /// Permit deadline, unix seconds
    pub deadline: i64,
    pub signature: PermitSignature,

    /// Derived from (mega market, is_buy) at submission; immutable after
    pub source_token_symbol: String,
    pub destination_token_symbol: String,

    /// Mined hash of the user debit transaction
    pub deposit_tx_hash: Option<String>,
    /// Mined hash of the treasury credit transaction
    pub release_tx_hash: Option<String>,
    /// Opaque reference returned by the venue for the hedge order
    pub venue_order_ref: Option<String>,
}

impl Order {
    /// The wallet the destination-side credit pays out to.
    pub fn credit_recipient(&self) -> &str {
        self.destination_address
            .as_deref()
            .unwrap_or(&self.user_address)
    }
}

/// User-supplied submission intent; the engine snapshots market data onto
/// it and persists the resulting [`Order`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub user_id: String,
    pub user_address: String,
    pub destination_address: Option<String>,
    pub venue_market_id: VenueMarketId,
    pub is_buy: bool,
    pub volume: Decimal,
    pub price: Decimal,
    pub from_network: String,
    pub to_network: String,
    pub token_address: String,
    pub contract_address: String,
    pub deadline: i64,
    pub signature: PermitSignature,
}
