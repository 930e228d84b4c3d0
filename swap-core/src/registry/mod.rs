//! Market registry: the mapping *logical market → venue listings*.
//!
//! Reconciliation lists every market from every bound venue, keeps the
//! listings whose pair name appears in some active logical market's
//! alias set, and atomically replaces the stored active set. After a
//! refresh the active venue-market set equals exactly the venue
//! responses intersected with the known aliases.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use swap_common::markets::{MegaMarket, MegaMarketId, VenueMarket, VenueMarketId};
use swap_common::stores::MarketStore;
#[allow(unused_imports)]
use swap_common::venue::VenueClient;

use crate::errors::{EngineError, EngineResult};
use crate::venues::VenueClients;

/// Process-wide market registry serving concurrent routes.
pub struct MarketRegistry {
    store: Arc<dyn MarketStore>,
    venues: Arc<VenueClients>,
}

impl MarketRegistry {
    pub fn new(store: Arc<dyn MarketStore>, venues: Arc<VenueClients>) -> Self {
        Self { store, venues }
    }

    /// Reconcile the stored venue-market set against live venue listings.
    ///
    /// Partial venue failures degrade: the reachable venues' listings
    /// still land. Only a total failure (every venue errored) aborts the
    /// refresh, leaving the previous set active.
    pub async fn refresh_markets(&self) -> EngineResult<Vec<VenueMarket>> {
        let mega_markets = self.store.get_all_active_mega_markets().await?;

        // alias -> (logical market id, platform fee carried onto the row)
        let mut alias_map: HashMap<&str, &MegaMarket> = HashMap::new();
        for market in &mega_markets {
            for alias in &market.aliases {
                alias_map.insert(alias.as_str(), market);
            }
        }

        let listings = join_all(
            self.venues
                .iter()
                .map(|(venue, client)| async move { (venue, client.list_markets().await) }),
        )
        .await;

        let mut collected = Vec::new();
        let mut failures = 0usize;
        let mut last_error = None;

        for (venue, result) in listings {
            match result {
                Ok(markets) => {
                    for listing in markets {
                        if let Some(mega) = alias_map.get(listing.pair_name().as_str()) {
                            collected.push(VenueMarket::new(
                                venue,
                                listing.venue_symbol,
                                mega.id,
                                listing.fee_percentage,
                            ));
                        }
                    }
                }
                Err(err) => {
                    warn!(venue = %venue, error = %err, "market listing failed");
                    failures += 1;
                    last_error = Some(err);
                }
            }
        }

        if failures == self.venues.len() {
            if let Some(err) = last_error {
                return Err(err.into());
            }
        }

        let stored = self.store.replace_active_venue_markets(collected).await?;
        info!(count = stored.len(), "venue markets reconciled");
        Ok(stored)
    }

    /// Fetch one venue market row.
    pub async fn get_venue_market(&self, id: VenueMarketId) -> EngineResult<VenueMarket> {
        self.store
            .get_venue_market(id)
            .await?
            .ok_or_else(|| EngineError::not_found("VenueMarket", id))
    }

    /// Fetch an active logical market.
    pub async fn get_active_mega_market(&self, id: MegaMarketId) -> EngineResult<MegaMarket> {
        self.store
            .get_active_mega_market(id)
            .await?
            .ok_or_else(|| EngineError::not_found("MegaMarket", id))
    }
}
