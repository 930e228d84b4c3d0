//! Application settings.
//!
//! Loaded from an optional TOML file (`config/swap.toml`) merged with
//! `SWAP__`-prefixed environment variables, e.g.
//! `SWAP__DATABASE__URL=postgres://...` or
//! `SWAP__VENUES__WALLEX__API_KEY=...`.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Database configuration
    pub database: DatabaseSettings,
    /// Venue credentials and endpoints
    #[serde(default)]
    pub venues: VenueSettings,
    /// Chain client settings
    #[serde(default)]
    pub chain: ChainSettings,
    /// Worker scheduler settings
    #[serde(default)]
    pub worker: WorkerSettings,
}

impl Settings {
    /// Load settings from `config/swap.toml` (if present) and the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/swap").required(false))
            .add_source(Environment::with_prefix("SWAP").separator("__"))
            .build()?
            .try_deserialize()
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

/// Per-venue credentials and endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VenueSettings {
    #[serde(default)]
    pub ompfinex: OmpfinexSettings,
    #[serde(default)]
    pub wallex: WallexSettings,
}

/// OMPFinex client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmpfinexSettings {
    #[serde(default = "default_ompfinex_base_url")]
    pub base_url: String,
    /// Bearer token for authenticated endpoints
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_venue_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OmpfinexSettings {
    fn default() -> Self {
        Self {
            base_url: default_ompfinex_base_url(),
            token: String::new(),
            timeout_secs: default_venue_timeout_secs(),
        }
    }
}

fn default_ompfinex_base_url() -> String {
    "https://api.ompfinex.com".to_string()
}

/// Wallex client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallexSettings {
    #[serde(default = "default_wallex_base_url")]
    pub base_url: String,
    /// Value for the `x-api-key` header
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_venue_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WallexSettings {
    fn default() -> Self {
        Self {
            base_url: default_wallex_base_url(),
            api_key: String::new(),
            timeout_secs: default_venue_timeout_secs(),
        }
    }
}

fn default_wallex_base_url() -> String {
    "https://api.wallex.ir".to_string()
}

fn default_venue_timeout_secs() -> u64 {
    30
}

/// Chain client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSettings {
    /// Simulated mining latency in milliseconds
    #[serde(default = "default_mined_latency_ms")]
    pub mined_latency_ms: u64,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            mined_latency_ms: default_mined_latency_ms(),
        }
    }
}

fn default_mined_latency_ms() -> u64 {
    50
}

/// Worker scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSettings {
    /// Tick cadence for every worker, in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Upper bound on concurrently running per-order tasks
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
    /// Age after which an `*_IN_PROGRESS` order is considered stranded
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

impl WorkerSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_max_concurrent_tasks() -> usize {
    16
}

fn default_stale_after_secs() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_defaults() {
        let worker = WorkerSettings::default();
        assert_eq!(worker.tick_interval(), Duration::from_secs(1));
        assert_eq!(worker.max_concurrent_tasks, 16);
        assert_eq!(worker.stale_after(), Duration::from_secs(300));
    }

    #[test]
    fn test_venue_defaults() {
        let venues = VenueSettings::default();
        assert_eq!(venues.ompfinex.base_url, "https://api.ompfinex.com");
        assert_eq!(venues.wallex.base_url, "https://api.wallex.ir");
        assert_eq!(venues.wallex.timeout_secs, 30);
    }
}
