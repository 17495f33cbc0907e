use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use toml::map::Map;

use crate::retry::RetryConfig;

const COMMON_CONFIG_FILE: &str = "common.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BridgeConfig {
    pub network: NetworkSettings,
    pub origin: ChainEndpoint,
    pub destination: ChainEndpoint,
    #[serde(default)]
    pub operator: OperatorSettings,
    pub kms: Option<KmsSettings>,
    pub tokens: TokenSettings,
    pub gas: GasSettings,
    pub monitoring: MonitoringSettings,
    pub retry: RetrySettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub api: ApiSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkSettings {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainEndpoint {
    pub chain_id: u64,
    pub rpc_url: String,
    pub bridge_address: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OperatorSettings {
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KmsSettings {
    pub key_id: String,
    pub region: Option<String>,
}

/// Per-network token tables. `deposit` maps symbols to origin-chain
/// addresses, `withdraw` maps the same symbols to destination-chain addresses.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenSettings {
    pub native_token: String,
    pub governance_token: String,
    pub deposit: BTreeMap<String, String>,
    pub withdraw: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GasSettings {
    pub min_gas_limit: u32,
    pub min_gas_limit_to: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitoringSettings {
    pub transaction_timeout_seconds: u64,
    pub poll_interval_seconds: u64,
    pub event_poll_interval_seconds: u64,
    #[serde(default)]
    pub event_lookback_blocks: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_seconds: u64,
    pub max_delay_seconds: u64,
    pub backoff_multiplier: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiSettings {
    pub bind_address: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

impl MonitoringSettings {
    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_secs(self.transaction_timeout_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn event_poll_interval(&self) -> Duration {
        Duration::from_secs(self.event_poll_interval_seconds)
    }
}

impl BridgeConfig {
    /// Loads a network config file. A `common.toml` sitting next to it is
    /// merged in first, values from `path` win. `${VAR}` placeholders are
    /// replaced from the environment (after reading `.env`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let path = path.as_ref();
        let specific = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;

        let common = path
            .parent()
            .map(|dir| dir.join(COMMON_CONFIG_FILE))
            .filter(|common| common.as_path() != path)
            .and_then(|common| fs::read_to_string(common).ok())
            .unwrap_or_default();

        let merged = merge_configs(&common, &specific)?;
        let content = substitute_env_vars(&merged)?;

        let config: BridgeConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(
            self.retry.max_attempts,
            Duration::from_secs(self.retry.base_delay_seconds),
            Duration::from_secs(self.retry.max_delay_seconds),
            self.retry.backoff_multiplier,
        )
    }
}

fn merge_configs(common: &str, specific: &str) -> Result<String> {
    if common.trim().is_empty() {
        return Ok(specific.to_string());
    }

    let common_toml: toml::Value = toml::from_str(common)?;
    let specific_toml: toml::Value = toml::from_str(specific)?;
    let merged = merge_toml_values(common_toml, specific_toml);
    Ok(toml::to_string_pretty(&merged)?)
}

fn merge_toml_values(mut base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (&mut base, overlay) {
        (toml::Value::Table(base_map), toml::Value::Table(overlay_map)) => {
            for (key, value) in overlay_map {
                let current = base_map
                    .remove(&key)
                    .unwrap_or_else(|| toml::Value::Table(Map::new()));
                base_map.insert(key, merge_toml_values(current, value));
            }
            base
        }
        (_, overlay) => overlay,
    }
}

fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")?;
    let substituted = re.replace_all(content, |caps: &regex::Captures| {
        env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    Ok(substituted.into_owned())
}
