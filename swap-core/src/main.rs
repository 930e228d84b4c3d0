//! Orchestrator entry point: wire clients, storage, router, engine and
//! run the worker scheduler until interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};

use swap_common::error::retry_with_backoff;
use swap_common::logging::{init_logging, LogConfig};

use swap_core::chain::SimulatedChainClient;
use swap_core::config::Settings;
use swap_core::engine::{OrderService, WorkerScheduler};
use swap_core::registry::MarketRegistry;
use swap_core::router::BestPriceRouter;
use swap_core::storage::{
    self, PostgresCronLockStore, PostgresMarketStore, PostgresOrderStore,
};
use swap_core::venues::{OmpfinexClient, VenueClients, WallexClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LogConfig::from_env()).map_err(|e| anyhow::anyhow!(e))?;

    let settings = Settings::load().context("loading settings")?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .min_connections(settings.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&settings.database.url)
        .await
        .context("connecting to database")?;

    storage::run_migrations(&pool)
        .await
        .context("applying migrations")?;

    let orders = Arc::new(PostgresOrderStore::new(pool.clone()));
    let markets = Arc::new(PostgresMarketStore::new(pool.clone()));
    let locks = Arc::new(PostgresCronLockStore::new(pool));

    let venues = Arc::new(
        VenueClients::new()
            .register(Arc::new(OmpfinexClient::new(
                &settings.venues.ompfinex.base_url,
                &settings.venues.ompfinex.token,
                Duration::from_secs(settings.venues.ompfinex.timeout_secs),
            )?))
            .register(Arc::new(WallexClient::new(
                &settings.venues.wallex.base_url,
                &settings.venues.wallex.api_key,
                Duration::from_secs(settings.venues.wallex.timeout_secs),
            )?)),
    );

    let chain = Arc::new(SimulatedChainClient::new(Duration::from_millis(
        settings.chain.mined_latency_ms,
    )));

    let registry = MarketRegistry::new(markets.clone(), venues.clone());
    let router = Arc::new(BestPriceRouter::new(markets.clone(), venues.clone()));

    let service = OrderService::new(
        orders,
        markets,
        venues,
        chain,
        router,
        settings.worker.max_concurrent_tasks,
    );

    // Initial reconciliation; transient venue failures retry, anything
    // else degrades to the stored set.
    let refresh = retry_with_backoff(
        || registry.refresh_markets(),
        3,
        Duration::from_millis(500),
    )
    .await;
    match refresh {
        Ok(stored) => info!(count = stored.len(), "initial market reconciliation done"),
        Err(err) => warn!(error = %err, "initial market reconciliation failed"),
    }

    let scheduler = Arc::new(WorkerScheduler::new(
        service,
        locks,
        settings.worker.clone(),
    ));
    let handle = scheduler.spawn();

    info!("swap orchestrator running; press ctrl-c to stop");
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "signal listener failed");
    }

    info!("shutting down");
    handle.shutdown().await;
    Ok(())
}
