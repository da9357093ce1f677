//! Configuration for the aironet core
//!
//! Loaded from a JSON file, then overridden by `AIRONET_*` environment
//! variables. Every field has a default so a partial file (or none) works.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Seconds per distribution window ("week").
pub const DEFAULT_PERIOD_SECS: u64 = 600;
/// Expected metric samples per window, used to normalize uptime.
pub const DEFAULT_EXPECTED_METRICS: u64 = 5;
/// Seconds represented by one metric sample.
pub const DEFAULT_METRIC_INTERVAL_SECS: u64 = 120;
/// How often the scheduler polls while no reward period exists.
pub const DEFAULT_IDLE_POLL_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub rewards: RewardConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Length of one distribution window in seconds.
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,
    /// Metric samples a fully-up miner produces per window.
    #[serde(default = "default_expected_metrics")]
    pub expected_metrics: u64,
    /// Seconds of uptime represented by one metric sample.
    #[serde(default = "default_metric_interval_secs")]
    pub metric_interval_secs: u64,
    /// Idle-state poll interval for the scheduler.
    #[serde(default = "default_idle_poll_secs")]
    pub idle_poll_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Base URL of the ledger REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Reward-token identifier; `None` means the chain's native token.
    #[serde(default)]
    pub token_identifier: Option<String>,
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
    #[serde(default = "default_gas_price")]
    pub gas_price: u64,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// Atomic units per whole native token.
    #[serde(default = "default_denomination")]
    pub denomination: f64,
    /// Reward signing account seeded into the key store at boot.
    #[serde(default)]
    pub reward_address: Option<String>,
    /// Hex-encoded ed25519 secret for the reward account.
    #[serde(default)]
    pub reward_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_period_secs() -> u64 {
    DEFAULT_PERIOD_SECS
}

fn default_expected_metrics() -> u64 {
    DEFAULT_EXPECTED_METRICS
}

fn default_metric_interval_secs() -> u64 {
    DEFAULT_METRIC_INTERVAL_SECS
}

fn default_idle_poll_secs() -> u64 {
    DEFAULT_IDLE_POLL_SECS
}

fn default_api_url() -> String {
    "https://testnet-api.multiversx.com".to_string()
}

fn default_chain_id() -> String {
    "T".to_string()
}

fn default_gas_price() -> u64 {
    1_000_000_000
}

fn default_gas_limit() -> u64 {
    500_000
}

fn default_denomination() -> f64 {
    1e18
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            rewards: RewardConfig::default(),
            ledger: LedgerConfig::default(),
            store: StoreConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            period_secs: DEFAULT_PERIOD_SECS,
            expected_metrics: DEFAULT_EXPECTED_METRICS,
            metric_interval_secs: DEFAULT_METRIC_INTERVAL_SECS,
            idle_poll_secs: DEFAULT_IDLE_POLL_SECS,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token_identifier: None,
            chain_id: default_chain_id(),
            gas_price: default_gas_price(),
            gas_limit: default_gas_limit(),
            denomination: default_denomination(),
            reward_address: None,
            reward_secret: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl CoreConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str::<Self>(&contents)?)
    }

    /// Loads from `path` when given, otherwise starts from defaults, then
    /// applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Applies `AIRONET_*` environment overrides for the recognized options.
    pub fn apply_env(&mut self) {
        if let Some(v) = env_u64("AIRONET_PERIOD_REWARD") {
            self.rewards.period_secs = v;
        }
        if let Some(v) = env_u64("AIRONET_COUNT_PERIOD_REWARD") {
            self.rewards.expected_metrics = v;
        }
        if let Some(v) = env_u64("AIRONET_COUNT_PERIOD_METRICS") {
            self.rewards.metric_interval_secs = v;
        }
        if let Ok(v) = env::var("AIRONET_REWARD_TOKEN_IDENTIFIER") {
            self.ledger.token_identifier = if v.is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = env::var("AIRONET_REWARD_SIGNING_ACCOUNT") {
            self.ledger.reward_address = if v.is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = env::var("AIRONET_LEDGER_API_URL") {
            self.ledger.api_url = v;
        }
        if let Ok(v) = env::var("AIRONET_LOG_LEVEL") {
            self.log_level = v;
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let config = CoreConfig::default();
        assert_eq!(config.rewards.period_secs, 600);
        assert_eq!(config.rewards.expected_metrics, 5);
        assert_eq!(config.rewards.metric_interval_secs, 120);
        assert_eq!(config.ledger.gas_price, 1_000_000_000);
        assert_eq!(config.ledger.gas_limit, 500_000);
        assert_eq!(config.ledger.denomination, 1e18);
        assert!(config.ledger.token_identifier.is_none());
    }

    #[test]
    fn partial_file_fills_missing_sections() {
        let config: CoreConfig =
            serde_json::from_str(r#"{"rewards": {"period_secs": 30}}"#).unwrap();
        assert_eq!(config.rewards.period_secs, 30);
        assert_eq!(config.rewards.expected_metrics, 5);
        assert_eq!(config.ledger.chain_id, "T");
        assert_eq!(config.log_level, "info");
    }
}
