//! Order-book depth snapshots and volume-weighted pricing.
//!
//! Venues expose depth in different wire shapes; clients normalize into
//! [`MarketDepth`], a pair of level sequences in natural walk order
//! (asks ascending, bids descending). [`vwap`] computes the
//! volume-weighted average price required to fill a size by walking one
//! side.
//!
//! All prices and quantities are [`Decimal`]; binary floating point never
//! touches money.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single price level in an order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    /// Price at this level
    pub price: Decimal,
    /// Quantity available at this level
    pub quantity: Decimal,
}

impl BookLevel {
    /// Create a new book level
    pub fn new(price: Decimal, quantity: Decimal) -> Self {
        Self { price, quantity }
    }

    /// A level is usable when both price and quantity are positive.
    pub fn is_valid(&self) -> bool {
        self.price > Decimal::ZERO && self.quantity > Decimal::ZERO
    }
}

impl fmt::Display for BookLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.quantity, self.price)
    }
}

/// Side of the order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookSide {
    /// Ask side (sellers) - consumed by buys
    Asks,
    /// Bid side (buyers) - consumed by sells
    Bids,
}

impl BookSide {
    /// The side a taker order of the given direction consumes.
    pub fn taken_by(is_buy: bool) -> Self {
        if is_buy {
            BookSide::Asks
        } else {
            BookSide::Bids
        }
    }
}

impl fmt::Display for BookSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookSide::Asks => write!(f, "ASKS"),
            BookSide::Bids => write!(f, "BIDS"),
        }
    }
}

/// Normalized order-book depth for one venue market.
///
/// Construction sanitizes and re-sorts: malformed or non-positive levels
/// are dropped (never fatal), asks end up ascending, bids descending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketDepth {
    asks: Vec<BookLevel>,
    bids: Vec<BookLevel>,
}

impl MarketDepth {
    /// Build a depth snapshot from raw level sequences.
    pub fn new(asks: Vec<BookLevel>, bids: Vec<BookLevel>) -> Self {
        let mut asks: Vec<BookLevel> = asks.into_iter().filter(BookLevel::is_valid).collect();
        let mut bids: Vec<BookLevel> = bids.into_iter().filter(BookLevel::is_valid).collect();
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        Self { asks, bids }
    }

    /// Levels for one side, in natural walk order.
    pub fn side(&self, side: BookSide) -> &[BookLevel] {
        match side {
            BookSide::Asks => &self.asks,
            BookSide::Bids => &self.bids,
        }
    }

    /// Best (first) level on a side, if any.
    pub fn best(&self, side: BookSide) -> Option<&BookLevel> {
        self.side(side).first()
    }

    /// Total quantity available on a side.
    pub fn total_quantity(&self, side: BookSide) -> Decimal {
        self.side(side).iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.asks.is_empty() && self.bids.is_empty()
    }
}

/// Volume-weighted average price to fill `volume` by walking `levels` in
/// order, consuming `min(remaining, level_qty)` at each level.
///
/// Returns `None` when the side cannot fill the requested volume or the
/// volume is not positive.
pub fn vwap(levels: &[BookLevel], volume: Decimal) -> Option<Decimal> {
    if volume <= Decimal::ZERO {
        return None;
    }

    let mut filled = Decimal::ZERO;
    let mut cost = Decimal::ZERO;

    for level in levels {
        if !level.is_valid() {
            continue;
        }
        let remaining = volume - filled;
        let consumed = remaining.min(level.quantity);
        cost += level.price * consumed;
        filled += consumed;
        if filled >= volume {
            return Some(cost / volume);
        }
    }

    None
}
