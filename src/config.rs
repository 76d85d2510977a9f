use anyhow::{anyhow, Context, Result};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path};

use crate::types::Coin;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RateLimitConfig {
    // Requests accepted per signer within one window.
    pub max_requests: u64,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 60,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct InitialBalance {
    pub address: Address,
    pub coins: Vec<Coin>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeConfig {
    // Chain the node executes; payments signed for other chains are rejected.
    pub chain_id: String,
    pub listen_address: SocketAddr,
    // Used when RUST_LOG is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    // How far an X-Timestamp header may lag behind or run ahead of the node clock.
    #[serde(default = "default_max_timestamp_drift_secs")]
    pub max_timestamp_drift_secs: u64,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub initial_balances: Vec<InitialBalance>,
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_max_timestamp_drift_secs() -> u64 {
    300
}

impl NodeConfig {
    /// Loads YAML (`.yaml`/`.yml`) or JSON, picked by file extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chain_id.is_empty() {
            return Err(anyhow!("chain-id must not be empty"));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(anyhow!("rate-limit.window-secs must be positive"));
        }
        for balance in &self.initial_balances {
            for coin in &balance.coins {
                coin.validate()
                    .with_context(|| format!("initial balance of {:?}", balance.address))?;
            }
        }
        Ok(())
    }

    pub fn for_testing(chain_id: &str) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            listen_address: SocketAddr::from(([127, 0, 0, 1], 0)),
            log_filter: default_log_filter(),
            max_timestamp_drift_secs: default_max_timestamp_drift_secs(),
            rate_limit: RateLimitConfig::default(),
            initial_balances: Vec::new(),
        }
    }
}
