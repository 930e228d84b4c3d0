//! Postgres store implementations.
//!
//! Queries are runtime-bound (`sqlx::query().bind()`); the schema is
//! bootstrapped idempotently at startup via [`run_migrations`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use swap_common::markets::{MegaMarket, MegaMarketId, Venue, VenueMarket, VenueMarketId};
use swap_common::orders::{Order, OrderId, OrderStatus, PermitSignature};
use swap_common::stores::{CronLockStore, MarketStore, OrderStore, StoreError, StoreResult};

/// Create the orchestrator's tables when missing.
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS swap_orders (
            id BIGSERIAL PRIMARY KEY,
            status TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            user_id TEXT NOT NULL,
            user_address TEXT NOT NULL,
            destination_address TEXT,
            mega_market_id BIGINT NOT NULL,
            venue_market_id BIGINT NOT NULL,
            is_buy BOOLEAN NOT NULL,
            volume NUMERIC NOT NULL,
            price NUMERIC NOT NULL,
            slippage_percentage NUMERIC NOT NULL,
            from_network TEXT NOT NULL,
            to_network TEXT NOT NULL,
            token_address TEXT NOT NULL,
            contract_address TEXT NOT NULL,
            deadline BIGINT NOT NULL,
            sig_v SMALLINT NOT NULL,
            sig_r TEXT NOT NULL,
            sig_s TEXT NOT NULL,
            source_token_symbol TEXT NOT NULL,
            destination_token_symbol TEXT NOT NULL,
            deposit_tx_hash TEXT,
            release_tx_hash TEXT,
            venue_order_ref TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_swap_orders_status ON swap_orders (status)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mega_markets (
            id BIGSERIAL PRIMARY KEY,
            active BOOLEAN NOT NULL DEFAULT TRUE,
            source_token_symbol TEXT NOT NULL,
            destination_token_symbol TEXT NOT NULL,
            fee_percentage NUMERIC NOT NULL,
            slippage_percentage NUMERIC NOT NULL,
            aliases TEXT[] NOT NULL DEFAULT '{}'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS venue_markets (
            id BIGSERIAL PRIMARY KEY,
            venue TEXT NOT NULL,
            venue_symbol TEXT NOT NULL,
            mega_market_id BIGINT NOT NULL,
            active BOOLEAN NOT NULL DEFAULT TRUE,
            fee_percentage NUMERIC NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            UNIQUE (venue, venue_symbol)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cron_locks (
            id UUID PRIMARY KEY,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    debug!("storage migrations applied");
    Ok(())
}

fn decode_err(msg: impl Into<String>) -> sqlx::Error {
    sqlx::Error::Decode(msg.into().into())
}

fn order_from_row(row: &PgRow) -> Result<Order, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status: OrderStatus = status.parse().map_err(decode_err)?;
    let sig_v: i16 = row.try_get("sig_v")?;

    Ok(Order {
        id: row.try_get("id")?,
        status,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        user_id: row.try_get("user_id")?,
        user_address: row.try_get("user_address")?,
        destination_address: row.try_get("destination_address")?,
        mega_market_id: row.try_get("mega_market_id")?,
        venue_market_id: row.try_get("venue_market_id")?,
        is_buy: row.try_get("is_buy")?,
        volume: row.try_get("volume")?,
        price: row.try_get("price")?,
        slippage_percentage: row.try_get("slippage_percentage")?,
        from_network: row.try_get("from_network")?,
        to_network: row.try_get("to_network")?,
        token_address: row.try_get("token_address")?,
        contract_address: row.try_get("contract_address")?,
        deadline: row.try_get("deadline")?,
        signature: PermitSignature {
            v: sig_v as u8,
            r: row.try_get("sig_r")?,
            s: row.try_get("sig_s")?,
        },
        source_token_symbol: row.try_get("source_token_symbol")?,
        destination_token_symbol: row.try_get("destination_token_symbol")?,
        deposit_tx_hash: row.try_get("deposit_tx_hash")?,
        release_tx_hash: row.try_get("release_tx_hash")?,
        venue_order_ref: row.try_get("venue_order_ref")?,
    })
}

const ORDER_COLUMNS: &str = "id, status, created_at, updated_at, user_id, user_address, \
     destination_address, mega_market_id, venue_market_id, is_buy, volume, price, \
     slippage_percentage, from_network, to_network, token_address, contract_address, deadline, \
     sig_v, sig_r, sig_s, source_token_symbol, destination_token_symbol, deposit_tx_hash, \
     release_tx_hash, venue_order_ref";

/// Postgres-backed [`OrderStore`].
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, mut order: Order) -> StoreResult<Order> {
        let row = sqlx::query(
            r#"
            INSERT INTO swap_orders (
                status, created_at, updated_at, user_id, user_address,
                destination_address, mega_market_id, venue_market_id, is_buy,
                volume, price, slippage_percentage, from_network, to_network,
                token_address, contract_address, deadline, sig_v, sig_r, sig_s,
                source_token_symbol, destination_token_symbol,
                deposit_tx_hash, release_tx_hash, venue_order_ref
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25
            )
            RETURNING id
            "#,
        )
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(&order.user_id)
        .bind(&order.user_address)
        .bind(&order.destination_address)
        .bind(order.mega_market_id)
        .bind(order.venue_market_id)
        .bind(order.is_buy)
        .bind(order.volume)
        .bind(order.price)
        .bind(order.slippage_percentage)
        .bind(&order.from_network)
        .bind(&order.to_network)
        .bind(&order.token_address)
        .bind(&order.contract_address)
        .bind(order.deadline)
        .bind(order.signature.v as i16)
        .bind(&order.signature.r)
        .bind(&order.signature.s)
        .bind(&order.source_token_symbol)
        .bind(&order.destination_token_symbol)
        .bind(&order.deposit_tx_hash)
        .bind(&order.release_tx_hash)
        .bind(&order.venue_order_ref)
        .fetch_one(&self.pool)
        .await?;

        order.id = row.try_get("id").map_err(StoreError::from)?;
        Ok(order)
    }

    async fn get_by_id(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM swap_orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(order_from_row).transpose().map_err(Into::into)
    }

    async fn update(&self, order: &Order) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE swap_orders SET
                status = $2, updated_at = NOW(), destination_address = $3,
                deposit_tx_hash = $4, release_tx_hash = $5, venue_order_ref = $6
            WHERE id = $1
            "#,
        )
        .bind(order.id)
        .bind(order.status.as_str())
        .bind(&order.destination_address)
        .bind(&order.deposit_tx_hash)
        .bind(&order.release_tx_hash)
        .bind(&order.venue_order_ref)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_by_status(&self, status: OrderStatus) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM swap_orders WHERE status = $1 ORDER BY id"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(order_from_row)
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }

    async fn get_by_user(&self, user_id: &str) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM swap_orders WHERE user_id = $1 ORDER BY id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(order_from_row)
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }

    async fn change_status_by_ids(&self, ids: &[OrderId], status: OrderStatus) -> StoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        sqlx::query("UPDATE swap_orders SET status = $1, updated_at = NOW() WHERE id = ANY($2)")
            .bind(status.as_str())
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_stale_in_progress(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Order>> {
        let statuses: Vec<String> = OrderStatus::IN_PROGRESS
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM swap_orders \
             WHERE status = ANY($1) AND updated_at <= $2 ORDER BY id"
        ))
        .bind(&statuses)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(order_from_row)
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }
}

fn mega_market_from_row(row: &PgRow) -> Result<MegaMarket, sqlx::Error> {
    Ok(MegaMarket {
        id: row.try_get("id")?,
        active: row.try_get("active")?,
        source_token_symbol: row.try_get("source_token_symbol")?,
        destination_token_symbol: row.try_get("destination_token_symbol")?,
        fee_percentage: row.try_get("fee_percentage")?,
        slippage_percentage: row.try_get("slippage_percentage")?,
        aliases: row.try_get("aliases")?,
    })
}

fn venue_market_from_row(row: &PgRow) -> Result<VenueMarket, sqlx::Error> {
    let venue: String = row.try_get("venue")?;
    let venue: Venue = venue.parse().map_err(decode_err)?;

    Ok(VenueMarket {
        id: row.try_get("id")?,
        venue,
        venue_symbol: row.try_get("venue_symbol")?,
        mega_market_id: row.try_get("mega_market_id")?,
        active: row.try_get("active")?,
        fee_percentage: row.try_get("fee_percentage")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Postgres-backed [`MarketStore`].
pub struct PostgresMarketStore {
    pool: PgPool,
}

impl PostgresMarketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MarketStore for PostgresMarketStore {
    async fn save_mega_market(&self, mut market: MegaMarket) -> StoreResult<MegaMarket> {
        if market.id == 0 {
            let row = sqlx::query(
                r#"
                INSERT INTO mega_markets (
                    active, source_token_symbol, destination_token_symbol,
                    fee_percentage, slippage_percentage, aliases
                ) VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(market.active)
            .bind(&market.source_token_symbol)
            .bind(&market.destination_token_symbol)
            .bind(market.fee_percentage)
            .bind(market.slippage_percentage)
            .bind(&market.aliases)
            .fetch_one(&self.pool)
            .await?;
            market.id = row.try_get("id").map_err(StoreError::from)?;
        } else {
            sqlx::query(
                r#"
                UPDATE mega_markets SET
                    active = $2, source_token_symbol = $3, destination_token_symbol = $4,
                    fee_percentage = $5, slippage_percentage = $6, aliases = $7
                WHERE id = $1
                "#,
            )
            .bind(market.id)
            .bind(market.active)
            .bind(&market.source_token_symbol)
            .bind(&market.destination_token_symbol)
            .bind(market.fee_percentage)
            .bind(market.slippage_percentage)
            .bind(&market.aliases)
            .execute(&self.pool)
            .await?;
        }
        Ok(market)
    }

    async fn get_mega_market(&self, id: MegaMarketId) -> StoreResult<Option<MegaMarket>> {
        let row = sqlx::query("SELECT * FROM mega_markets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref()
            .map(mega_market_from_row)
            .transpose()
            .map_err(Into::into)
    }

    async fn get_active_mega_market(&self, id: MegaMarketId) -> StoreResult<Option<MegaMarket>> {
        let row = sqlx::query("SELECT * FROM mega_markets WHERE id = $1 AND active = TRUE")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref()
            .map(mega_market_from_row)
            .transpose()
            .map_err(Into::into)
    }

    async fn get_all_active_mega_markets(&self) -> StoreResult<Vec<MegaMarket>> {
        let rows = sqlx::query("SELECT * FROM mega_markets WHERE active = TRUE ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(mega_market_from_row)
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }

    async fn get_venue_market(&self, id: VenueMarketId) -> StoreResult<Option<VenueMarket>> {
        let row = sqlx::query("SELECT * FROM venue_markets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref()
            .map(venue_market_from_row)
            .transpose()
            .map_err(Into::into)
    }

    async fn get_venue_markets_by_mega_market(
        &self,
        mega_market_id: MegaMarketId,
    ) -> StoreResult<Vec<VenueMarket>> {
        let rows = sqlx::query(
            "SELECT * FROM venue_markets WHERE mega_market_id = $1 AND active = TRUE ORDER BY id",
        )
        .bind(mega_market_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(venue_market_from_row)
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }

    async fn replace_active_venue_markets(
        &self,
        markets: Vec<VenueMarket>,
    ) -> StoreResult<Vec<VenueMarket>> {
        // Soft-delete and upsert share one transaction so concurrent
        // routes never observe the half-replaced set.
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE venue_markets SET active = FALSE, updated_at = NOW()")
            .execute(&mut *tx)
            .await?;

        let mut stored = Vec::with_capacity(markets.len());
        for market in markets {
            let row = sqlx::query(
                r#"
                INSERT INTO venue_markets (
                    venue, venue_symbol, mega_market_id, active,
                    fee_percentage, created_at, updated_at
                ) VALUES ($1, $2, $3, TRUE, $4, NOW(), NOW())
                ON CONFLICT (venue, venue_symbol) DO UPDATE SET
                    mega_market_id = EXCLUDED.mega_market_id,
                    active = TRUE,
                    fee_percentage = EXCLUDED.fee_percentage,
                    updated_at = NOW()
                RETURNING *
                "#,
            )
            .bind(market.venue.as_str())
            .bind(&market.venue_symbol)
            .bind(market.mega_market_id)
            .bind(market.fee_percentage)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(venue_market_from_row(&row).map_err(StoreError::from)?);
        }

        tx.commit().await?;
        Ok(stored)
    }
}

/// Postgres-backed [`CronLockStore`].
///
/// The primary-key insert is the mutex: a conflicting insert means the
/// lock is held and the worker must skip its tick.
pub struct PostgresCronLockStore {
    pool: PgPool,
}

impl PostgresCronLockStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CronLockStore for PostgresCronLockStore {
    async fn acquire(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("INSERT INTO cron_locks (id) VALUES ($1)")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::LockHeld(id),
                _ => e.into(),
            })?;
        Ok(())
    }

    async fn release(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM cron_locks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
