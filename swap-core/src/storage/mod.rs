//! Store implementations behind the persistence ports.
//!
//! `memory` backs tests and dry-run deployments; `postgres` is the
//! production backend.

mod memory;
mod postgres;

pub use memory::{MemoryCronLockStore, MemoryMarketStore, MemoryOrderStore};
pub use postgres::{
    run_migrations, PostgresCronLockStore, PostgresMarketStore, PostgresOrderStore,
};
