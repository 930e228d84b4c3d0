//! Shared fixtures for the integration suites: in-memory stores, mock
//! venues, a simulated chain, and a fully wired engine.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use swap_common::depth::{BookLevel, MarketDepth};
use swap_common::markets::{MegaMarket, Venue, VenueMarket, VenueMarketId};
use swap_common::orders::{Order, OrderDraft, OrderId, OrderStatus, PermitSignature};
use swap_common::stores::{MarketStore, OrderStore};
use swap_common::venue::VenueMarketListing;

use swap_core::chain::SimulatedChainClient;
use swap_core::config::WorkerSettings;
use swap_core::engine::{OrderService, WorkerScheduler};
use swap_core::registry::MarketRegistry;
use swap_core::router::BestPriceRouter;
use swap_core::storage::{MemoryCronLockStore, MemoryMarketStore, MemoryOrderStore};
use swap_core::venues::{MockVenueClient, VenueClients};

pub struct TestWorld {
    pub orders: Arc<MemoryOrderStore>,
    pub markets: Arc<MemoryMarketStore>,
    pub locks: Arc<MemoryCronLockStore>,
    pub ompfinex: Arc<MockVenueClient>,
    pub wallex: Arc<MockVenueClient>,
    pub chain: Arc<SimulatedChainClient>,
    pub service: OrderService,
    pub registry: MarketRegistry,
    pub scheduler: WorkerScheduler,
}

pub fn build_world() -> TestWorld {
    let orders = Arc::new(MemoryOrderStore::new());
    let markets = Arc::new(MemoryMarketStore::new());
    let locks = Arc::new(MemoryCronLockStore::new());
    let ompfinex = Arc::new(MockVenueClient::new(Venue::Ompfinex));
    let wallex = Arc::new(MockVenueClient::new(Venue::Wallex));
    let chain = Arc::new(SimulatedChainClient::instant());

    let venues = Arc::new(
        VenueClients::new()
            .register(ompfinex.clone())
            .register(wallex.clone()),
    );

    let markets_dyn: Arc<dyn MarketStore> = markets.clone();
    let router = Arc::new(BestPriceRouter::new(markets_dyn.clone(), venues.clone()));
    let service = OrderService::new(
        orders.clone(),
        markets_dyn.clone(),
        venues.clone(),
        chain.clone(),
        router,
        16,
    );
    let registry = MarketRegistry::new(markets_dyn, venues);
    let scheduler = WorkerScheduler::new(
        service.clone(),
        locks.clone(),
        WorkerSettings::default(),
    );

    TestWorld {
        orders,
        markets,
        locks,
        ompfinex,
        wallex,
        chain,
        service,
        registry,
        scheduler,
    }
}

/// Seed an ETH/USDT logical market with one listing per venue.
/// Returns (mega market, ompfinex listing, wallex listing).
pub async fn seed_eth_usdt(
    world: &TestWorld,
    slippage: Decimal,
) -> (MegaMarket, VenueMarket, VenueMarket) {
    let mega = world
        .markets
        .save_mega_market(MegaMarket {
            id: 0,
            active: true,
            source_token_symbol: "ETH".to_string(),
            destination_token_symbol: "USDT".to_string(),
            fee_percentage: dec!(0.001),
            slippage_percentage: slippage,
            aliases: vec!["ETH/USDT".to_string()],
        })
        .await
        .expect("seed mega market");

    let stored = world
        .markets
        .replace_active_venue_markets(vec![
            VenueMarket::new(Venue::Ompfinex, "7", mega.id, dec!(0.0035)),
            VenueMarket::new(Venue::Wallex, "ETHUSDT", mega.id, dec!(0.004)),
        ])
        .await
        .expect("seed venue markets");

    (mega, stored[0].clone(), stored[1].clone())
}

/// A submission draft against the given venue listing.
pub fn draft(
    venue_market_id: VenueMarketId,
    volume: Decimal,
    price: Decimal,
    is_buy: bool,
) -> OrderDraft {
    OrderDraft {
        user_id: "user-1".to_string(),
        user_address: "0xUser".to_string(),
        destination_address: Some("0xDest".to_string()),
        venue_market_id,
        is_buy,
        volume,
        price,
        from_network: "sepolia".to_string(),
        to_network: "mumbai".to_string(),
        token_address: "0xToken".to_string(),
        contract_address: "0xSettlement".to_string(),
        deadline: 1_999_999_999,
        signature: PermitSignature {
            v: 27,
            r: "0xaa".to_string(),
            s: "0xbb".to_string(),
        },
    }
}

/// Depth with a single ask level.
pub fn asks(levels: &[(Decimal, Decimal)]) -> MarketDepth {
    MarketDepth::new(
        levels
            .iter()
            .map(|(p, q)| BookLevel::new(*p, *q))
            .collect(),
        Vec::new(),
    )
}

/// Depth with only bid levels.
pub fn bids(levels: &[(Decimal, Decimal)]) -> MarketDepth {
    MarketDepth::new(
        Vec::new(),
        levels
            .iter()
            .map(|(p, q)| BookLevel::new(*p, *q))
            .collect(),
    )
}

/// A listing as a venue would return it.
pub fn listing(venue_symbol: &str, base: &str, quote: &str) -> VenueMarketListing {
    VenueMarketListing {
        venue_symbol: venue_symbol.to_string(),
        base_asset: base.to_string(),
        quote_asset: quote.to_string(),
        fee_percentage: Decimal::ZERO,
    }
}

/// Run a worker action and wait for every dispatched per-order task.
pub async fn run_to_completion(
    handles: Vec<tokio::task::JoinHandle<()>>,
) {
    for handle in handles {
        handle.await.expect("worker task panicked");
    }
}

/// Poll until the order reaches `expected`, or panic after one second.
pub async fn wait_for_status(world: &TestWorld, id: OrderId, expected: OrderStatus) -> Order {
    for _ in 0..100 {
        let order = world
            .orders
            .get_by_id(id)
            .await
            .expect("store read")
            .expect("order exists");
        if order.status == expected {
            return order;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("order {id} never reached {expected}");
}
