//! Best-price routing and market reconciliation scenarios.

mod common;

use rust_decimal_macros::dec;

use swap_common::markets::Venue;
use swap_common::stores::MarketStore;
use swap_common::venue::VenueError;
use swap_core::errors::EngineError;

use common::*;

#[tokio::test]
async fn lowest_vwap_venue_wins() {
    let world = build_world();
    let (mega, omp_market, wallex_market) = seed_eth_usdt(&world, dec!(0.02)).await;

    // V1 fills 1.0 at (100*0.5 + 110*0.5) = 105; V2 fills at 101
    world.ompfinex.set_depth(
        &omp_market.venue_symbol,
        asks(&[(dec!(100), dec!(0.5)), (dec!(110), dec!(0.5))]),
    );
    world
        .wallex
        .set_depth(&wallex_market.venue_symbol, asks(&[(dec!(101), dec!(1.0))]));

    let quote = world
        .service
        .router()
        .route_best_price(mega.id, dec!(1), true)
        .await
        .unwrap();

    assert_eq!(quote.price, dec!(101));
    assert_eq!(quote.venue_market.venue, Venue::Wallex);
    assert_eq!(quote.mega_market.id, mega.id);
}

#[tokio::test]
async fn insufficient_depth_on_all_venues_errors() {
    let world = build_world();
    let (mega, omp_market, wallex_market) = seed_eth_usdt(&world, dec!(0.02)).await;

    world
        .ompfinex
        .set_depth(&omp_market.venue_symbol, asks(&[(dec!(100), dec!(0.4))]));
    world
        .wallex
        .set_depth(&wallex_market.venue_symbol, asks(&[(dec!(101), dec!(0.4))]));

    let err = world
        .service
        .router()
        .route_best_price(mega.id, dec!(1), true)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InsufficientLiquidity { .. }));
}

#[tokio::test]
async fn partial_venue_failure_degrades() {
    let world = build_world();
    let (mega, _, wallex_market) = seed_eth_usdt(&world, dec!(0.02)).await;

    world
        .ompfinex
        .fail_depth(VenueError::Timeout("venue unreachable".into()));
    world
        .wallex
        .set_depth(&wallex_market.venue_symbol, asks(&[(dec!(103), dec!(2))]));

    let quote = world
        .service
        .router()
        .route_best_price(mega.id, dec!(1), true)
        .await
        .unwrap();

    assert_eq!(quote.price, dec!(103));
    assert_eq!(quote.venue_market.venue, Venue::Wallex);
}

#[tokio::test]
async fn sell_routes_walk_the_bid_side() {
    let world = build_world();
    let (mega, omp_market, wallex_market) = seed_eth_usdt(&world, dec!(0.02)).await;

    world
        .ompfinex
        .set_depth(&omp_market.venue_symbol, bids(&[(dec!(99), dec!(1))]));
    world
        .wallex
        .set_depth(&wallex_market.venue_symbol, bids(&[(dec!(100), dec!(1))]));

    let quote = world
        .service
        .router()
        .route_best_price(mega.id, dec!(1), false)
        .await
        .unwrap();

    // Lowest price wins regardless of side; ompfinex quoted 99
    assert_eq!(quote.price, dec!(99));
    assert_eq!(quote.venue_market.venue, Venue::Ompfinex);
}

#[tokio::test]
async fn price_ties_keep_the_first_observed_venue() {
    let world = build_world();
    let (mega, omp_market, wallex_market) = seed_eth_usdt(&world, dec!(0.02)).await;

    world
        .ompfinex
        .set_depth(&omp_market.venue_symbol, asks(&[(dec!(101), dec!(5))]));
    world
        .wallex
        .set_depth(&wallex_market.venue_symbol, asks(&[(dec!(101), dec!(5))]));

    let quote = world
        .service
        .router()
        .route_best_price(mega.id, dec!(1), true)
        .await
        .unwrap();

    assert_eq!(quote.price, dec!(101));
    assert_eq!(quote.venue_market.id, omp_market.id);
}

#[tokio::test]
async fn route_rejects_bad_input() {
    let world = build_world();
    let (mega, _, _) = seed_eth_usdt(&world, dec!(0.02)).await;

    let err = world
        .service
        .router()
        .route_best_price(mega.id, dec!(0), true)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = world
        .service
        .router()
        .route_best_price(999, dec!(1), true)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[tokio::test]
async fn reconciliation_keeps_only_aliased_listings() {
    let world = build_world();
    let (mega, _, _) = seed_eth_usdt(&world, dec!(0.02)).await;

    world.ompfinex.set_markets(vec![
        listing("7", "ETH", "USDT"),
        listing("8", "BTC", "USDT"), // no alias; dropped
    ]);
    world
        .wallex
        .set_markets(vec![listing("ETHUSDT", "ETH", "USDT")]);

    let stored = world.registry.refresh_markets().await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|m| m.mega_market_id == mega.id));

    let active = world
        .markets
        .get_venue_markets_by_mega_market(mega.id)
        .await
        .unwrap();
    assert_eq!(active.len(), 2);
}

#[tokio::test]
async fn reconciliation_replaces_the_previous_set() {
    let world = build_world();
    let (mega, _, _) = seed_eth_usdt(&world, dec!(0.02)).await;

    world
        .ompfinex
        .set_markets(vec![listing("7", "ETH", "USDT")]);
    world
        .wallex
        .set_markets(vec![listing("ETHUSDT", "ETH", "USDT")]);
    world.registry.refresh_markets().await.unwrap();

    // OMPFinex delists the pair
    world.ompfinex.set_markets(Vec::new());
    world.registry.refresh_markets().await.unwrap();

    let active = world
        .markets
        .get_venue_markets_by_mega_market(mega.id)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].venue, Venue::Wallex);
}

#[tokio::test]
async fn reconciliation_survives_one_venue_outage() {
    let world = build_world();
    let (mega, _, _) = seed_eth_usdt(&world, dec!(0.02)).await;

    world
        .ompfinex
        .fail_listing(VenueError::Connection("refused".into()));
    world
        .wallex
        .set_markets(vec![listing("ETHUSDT", "ETH", "USDT")]);

    let stored = world.registry.refresh_markets().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].venue, Venue::Wallex);
    assert_eq!(stored[0].mega_market_id, mega.id);
}

#[tokio::test]
async fn reconciliation_aborts_when_every_venue_fails() {
    let world = build_world();
    let (mega, _, _) = seed_eth_usdt(&world, dec!(0.02)).await;

    world
        .ompfinex
        .fail_listing(VenueError::Connection("refused".into()));
    world
        .wallex
        .fail_listing(VenueError::Timeout("no answer".into()));

    assert!(world.registry.refresh_markets().await.is_err());

    // The previously seeded set stays active
    let active = world
        .markets
        .get_venue_markets_by_mega_market(mega.id)
        .await
        .unwrap();
    assert_eq!(active.len(), 2);
}

#[tokio::test]
async fn aliases_match_inconsistent_venue_naming() {
    let world = build_world();

    let mega = world
        .markets
        .save_mega_market(swap_common::markets::MegaMarket {
            id: 0,
            active: true,
            source_token_symbol: "ETH".to_string(),
            destination_token_symbol: "USDT".to_string(),
            fee_percentage: dec!(0.001),
            slippage_percentage: dec!(0.02),
            aliases: vec!["ETH/USDT".to_string(), "WETH/USDT".to_string()],
        })
        .await
        .unwrap();

    world
        .ompfinex
        .set_markets(vec![listing("9", "WETH", "USDT")]);
    world
        .wallex
        .set_markets(vec![listing("ETHUSDT", "ETH", "USDT")]);

    let stored = world.registry.refresh_markets().await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|m| m.mega_market_id == mega.id));
}
