//! Logical and venue market models.
//!
//! A *logical market* ([`MegaMarket`]) is a venue-independent token pair
//! (e.g. ETH/USDT) routable across concrete listings. A [`VenueMarket`] is
//! one such listing on one exchange, identified by an opaque venue-side
//! symbol. The two are linked through the logical market's alias set:
//! venue listings whose pair name appears in an alias set are mapped to
//! that logical market during reconciliation.

mod types;

pub use types::{MegaMarket, MegaMarketId, Venue, VenueMarket, VenueMarketId};
