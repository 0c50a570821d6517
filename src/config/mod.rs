// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the document workflow, the API server and Walrus
//!
//! Every section loads either from environment variables (after reading a
//! `.env` file when present) or from a TOML file with `[seal]`, `[server]`
//! and `[walrus]` tables. Required values have no defaults: a missing
//! package ID, admin key or finality timeout is a startup error.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::chain::ObjectId;

pub const DEFAULT_MODULE_NAME: &str = "allowlist";
pub const DEFAULT_THRESHOLD: usize = 1;
pub const DEFAULT_SESSION_TTL_MIN: u16 = 30;
pub const DEFAULT_GAS_BUDGET: u64 = 10_000_000;
pub const DEFAULT_API_PORT: u16 = 3000;
pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_WALRUS_PUBLISHER: &str = "https://publisher.walrus-testnet.walrus.space";
pub const DEFAULT_WALRUS_AGGREGATOR: &str = "https://aggregator.walrus-testnet.walrus.space";
pub const DEFAULT_WALRUS_EPOCHS: u32 = 5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(String),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
    #[error("Failed to read config file: {0}")]
    Io(String),
    #[error("Failed to parse config file: {0}")]
    Toml(String),
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::Missing(key.to_string()))
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_required<F, T>(lookup: &F, key: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    required(lookup, key)?.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn load_dotenv() {
    dotenv::dotenv().ok();
}

fn default_module_name() -> String {
    DEFAULT_MODULE_NAME.to_string()
}

fn default_threshold() -> usize {
    DEFAULT_THRESHOLD
}

fn default_session_ttl() -> u16 {
    DEFAULT_SESSION_TTL_MIN
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_gas_budget() -> u64 {
    DEFAULT_GAS_BUDGET
}

fn default_port() -> u16 {
    DEFAULT_API_PORT
}

fn default_publisher() -> String {
    DEFAULT_WALRUS_PUBLISHER.to_string()
}

fn default_aggregator() -> String {
    DEFAULT_WALRUS_AGGREGATOR.to_string()
}

fn default_epochs() -> u32 {
    DEFAULT_WALRUS_EPOCHS
}

fn default_timeout_secs() -> u64 {
    60
}

/// Client-side workflow settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealConfig {
    pub package_id: ObjectId,
    #[serde(default = "default_module_name")]
    pub module_name: String,
    #[serde(default)]
    pub key_server_ids: Vec<ObjectId>,
    #[serde(default = "default_threshold")]
    pub threshold: usize,
    #[serde(default = "default_session_ttl")]
    pub session_ttl_min: u16,
    /// Bound on the wait for authorization finality. Required.
    pub finality_timeout_ms: u64,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl SealConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key_server_ids = match lookup("SEAL_KEY_SERVER_IDS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| {
                    ObjectId::from_str(id).map_err(|e| ConfigError::Invalid {
                        key: "SEAL_KEY_SERVER_IDS".to_string(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let config = Self {
            package_id: parse_required(&lookup, "SEAL_PACKAGE_ID")?,
            module_name: parsed(&lookup, "SEAL_MODULE_NAME", default_module_name())?,
            key_server_ids,
            threshold: parsed(&lookup, "SEAL_THRESHOLD", DEFAULT_THRESHOLD)?,
            session_ttl_min: parsed(&lookup, "SEAL_SESSION_TTL_MIN", DEFAULT_SESSION_TTL_MIN)?,
            finality_timeout_ms: parse_required(&lookup, "SEAL_FINALITY_TIMEOUT_MS")?,
            api_url: parsed(&lookup, "EPOCHONE_API_URL", default_api_url())?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold == 0 {
            return Err(ConfigError::Invalid {
                key: "SEAL_THRESHOLD".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.session_ttl_min == 0 || self.session_ttl_min > crate::seal::MAX_TTL_MIN {
            return Err(ConfigError::Invalid {
                key: "SEAL_SESSION_TTL_MIN".to_string(),
                reason: format!("must be between 1 and {}", crate::seal::MAX_TTL_MIN),
            });
        }
        if self.finality_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "SEAL_FINALITY_TIMEOUT_MS".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn finality_timeout(&self) -> Duration {
        Duration::from_millis(self.finality_timeout_ms)
    }
}

/// API server settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub package_id: ObjectId,
    #[serde(default = "default_module_name")]
    pub module_name: String,
    /// Sponsor/admin key, `0x` hex or flagged base64
    pub admin_private_key: String,
    #[serde(default = "default_gas_budget")]
    pub gas_budget: u64,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("package_id", &self.package_id)
            .field("module_name", &self.module_name)
            .field("admin_private_key", &"<redacted>")
            .field("gas_budget", &self.gas_budget)
            .field("port", &self.port)
            .finish()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            package_id: parse_required(&lookup, "SEAL_PACKAGE_ID")?,
            module_name: parsed(&lookup, "SEAL_MODULE_NAME", default_module_name())?,
            admin_private_key: required(&lookup, "SEAL_ADMIN_PRIVATE_KEY")?,
            gas_budget: parsed(&lookup, "SEAL_GAS_BUDGET", DEFAULT_GAS_BUDGET)?,
            port: parsed(&lookup, "API_PORT", DEFAULT_API_PORT)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalrusConfig {
    #[serde(default = "default_publisher")]
    pub publisher_url: String,
    #[serde(default = "default_aggregator")]
    pub aggregator_url: String,
    #[serde(default = "default_epochs")]
    pub epochs: u32,
    #[serde(default)]
    pub deletable: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WalrusConfig {
    fn default() -> Self {
        Self {
            publisher_url: default_publisher(),
            aggregator_url: default_aggregator(),
            epochs: DEFAULT_WALRUS_EPOCHS,
            deletable: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl WalrusConfig {
    /// `None` when no publisher is configured, meaning in-memory storage
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        load_dotenv();
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(publisher_url) = lookup("WALRUS_PUBLISHER_URL").filter(|v| !v.trim().is_empty()) else {
            return Ok(None);
        };
        let candidates = [
            ("WALRUS_PUBLISHER_URL", Some(publisher_url.clone())),
            ("WALRUS_AGGREGATOR_URL", lookup("WALRUS_AGGREGATOR_URL")),
        ];
        for (key, value) in candidates {
            if let Some(value) = value {
                url::Url::parse(value.trim()).map_err(|e| ConfigError::Invalid {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
            }
        }

        Ok(Some(Self {
            publisher_url: publisher_url.trim().to_string(),
            aggregator_url: parsed(&lookup, "WALRUS_AGGREGATOR_URL", default_aggregator())?,
            epochs: parsed(&lookup, "WALRUS_EPOCHS", DEFAULT_WALRUS_EPOCHS)?,
            deletable: parsed(&lookup, "WALRUS_DELETABLE", false)?,
            timeout_secs: default_timeout_secs(),
        }))
    }
}

/// File-based configuration; each table is optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub seal: Option<SealConfig>,
    pub server: Option<ServerConfig>,
    pub walrus: Option<WalrusConfig>,
    pub cache_capacity: Option<usize>,
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(raw).map_err(|e| ConfigError::Toml(e.to_string()))?;
        if let Some(seal) = &config.seal {
            seal.validate()?;
        }
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_toml_str(&raw)
    }

    pub fn cache_capacity_from_env() -> Result<usize, ConfigError> {
        load_dotenv();
        parsed(
            &env_lookup,
            "CIPHERTEXT_CACHE_CAPACITY",
            crate::storage::DEFAULT_CACHE_CAPACITY,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_seal_defaults() {
        let config = SealConfig::from_lookup(lookup(&[
            ("SEAL_PACKAGE_ID", "0xabc"),
            ("SEAL_FINALITY_TIMEOUT_MS", "15000"),
        ]))
        .unwrap();

        assert_eq!(config.module_name, "allowlist");
        assert_eq!(config.threshold, 1);
        assert_eq!(config.session_ttl_min, 30);
        assert_eq!(config.finality_timeout(), Duration::from_secs(15));
        assert!(config.key_server_ids.is_empty());
    }

    #[test]
    fn test_finality_timeout_is_required() {
        let result = SealConfig::from_lookup(lookup(&[("SEAL_PACKAGE_ID", "0xabc")]));
        assert_eq!(
            result,
            Err(ConfigError::Missing("SEAL_FINALITY_TIMEOUT_MS".to_string()))
        );
    }

    #[test]
    fn test_package_id_is_required() {
        let result = SealConfig::from_lookup(lookup(&[("SEAL_FINALITY_TIMEOUT_MS", "1000")]));
        assert_eq!(result, Err(ConfigError::Missing("SEAL_PACKAGE_ID".to_string())));
    }

    #[test]
    fn test_invalid_values() {
        let bad_ttl = SealConfig::from_lookup(lookup(&[
            ("SEAL_PACKAGE_ID", "0xabc"),
            ("SEAL_FINALITY_TIMEOUT_MS", "1000"),
            ("SEAL_SESSION_TTL_MIN", "90"),
        ]));
        assert!(matches!(bad_ttl, Err(ConfigError::Invalid { .. })));

        let bad_ids = SealConfig::from_lookup(lookup(&[
            ("SEAL_PACKAGE_ID", "0xabc"),
            ("SEAL_FINALITY_TIMEOUT_MS", "1000"),
            ("SEAL_KEY_SERVER_IDS", "0x1, nothex"),
        ]));
        assert!(matches!(bad_ids, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_server_config_requires_admin_key() {
        let result = ServerConfig::from_lookup(lookup(&[("SEAL_PACKAGE_ID", "0xabc")]));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::Missing("SEAL_ADMIN_PRIVATE_KEY".to_string())
        );

        let config = ServerConfig::from_lookup(lookup(&[
            ("SEAL_PACKAGE_ID", "0xabc"),
            ("SEAL_ADMIN_PRIVATE_KEY", "0xsecret"),
        ]))
        .unwrap();
        assert_eq!(config.port, 3000);
        assert!(!format!("{:?}", config).contains("0xsecret"));
    }

    #[test]
    fn test_walrus_optional() {
        assert_eq!(WalrusConfig::from_lookup(lookup(&[])).unwrap(), None);

        let config = WalrusConfig::from_lookup(lookup(&[
            ("WALRUS_PUBLISHER_URL", "https://publisher.example"),
            ("WALRUS_EPOCHS", "3"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(config.epochs, 3);
        assert_eq!(config.aggregator_url, DEFAULT_WALRUS_AGGREGATOR);

        assert!(WalrusConfig::from_lookup(lookup(&[("WALRUS_PUBLISHER_URL", "not a url")])).is_err());
    }

    #[test]
    fn test_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epochone.toml");
        std::fs::write(
            &path,
            r#"
cache_capacity = 8

[seal]
package_id = "0xabc"
finality_timeout_ms = 20000
threshold = 2

[walrus]
epochs = 2
"#,
        )
        .unwrap();

        let config = AppConfig::from_toml_file(&path).unwrap();
        let seal = config.seal.unwrap();
        assert_eq!(seal.threshold, 2);
        assert_eq!(seal.session_ttl_min, 30);
        assert_eq!(config.walrus.unwrap().publisher_url, DEFAULT_WALRUS_PUBLISHER);
        assert_eq!(config.cache_capacity, Some(8));
        assert!(config.server.is_none());
    }

    #[test]
    fn test_toml_missing_timeout_rejected() {
        let result = AppConfig::from_toml_str("[seal]\npackage_id = \"0xabc\"\n");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }
}
