//! Application configuration.
//!
//! Tunables come from an optional TOML file; credentials come only from
//! the environment.

use crate::error::{AppError, AppResult};
use mintscan_store::StoreConfig;
use mintscan_ws::connection::{DEFAULT_FEED_URL, DEFAULT_RECONNECT_DELAY_MS};
use mintscan_ws::{ConnectionConfig, SubscriptionIntent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the remote store URL.
pub const STORE_URL_VAR: &str = "SUPABASE_URL";
/// Environment variable holding the remote store access key.
pub const STORE_KEY_VAR: &str = "SUPABASE_KEY";

/// Account watched on the account-trade channel by default.
pub const DEFAULT_WATCHED_ACCOUNT: &str = "AArPXm8JatJiuyEffuC1un2Sc835SULa4uQqDcaGpAjV";
/// Token watched on the token-trade channel by default.
pub const DEFAULT_WATCHED_TOKEN: &str = "91WNez8D22NwBssQbkzjy4s2ipFrzpmn5hfvWVe2aY5p";

/// Feed connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// WebSocket URL.
    #[serde(default = "default_feed_url")]
    pub url: String,
    /// Fixed delay before reconnecting (ms). Default: 5,000.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Keys for the account-trade subscription.
    #[serde(default = "default_watched_accounts")]
    pub watched_accounts: Vec<String>,
    /// Keys for the token-trade subscription.
    #[serde(default = "default_watched_tokens")]
    pub watched_tokens: Vec<String>,
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    DEFAULT_RECONNECT_DELAY_MS
}

fn default_watched_accounts() -> Vec<String> {
    vec![DEFAULT_WATCHED_ACCOUNT.to_string()]
}

fn default_watched_tokens() -> Vec<String> {
    vec![DEFAULT_WATCHED_TOKEN.to_string()]
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            watched_accounts: default_watched_accounts(),
            watched_tokens: default_watched_tokens(),
        }
    }
}

/// Local ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// CSV file path.
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("tokens.csv")
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

/// Remote store tunables. Credentials are not read from the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_table")]
    pub table: String,
    /// Per-request timeout (ms). Default: 10,000.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_table() -> String {
    mintscan_store::supabase::DEFAULT_TABLE.to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            table: default_table(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Logging and metrics settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Port for the `/metrics` exporter. Disabled when unset.
    #[serde(default)]
    pub metrics_port: Option<u16>,
    /// Default log level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: None,
            log_level: default_log_level(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Feed connection settings with the three subscription intents.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            url: self.feed.url.clone(),
            reconnect_delay_ms: self.feed.reconnect_delay_ms,
            subscriptions: SubscriptionIntent::standard_set(
                self.feed.watched_accounts.clone(),
                self.feed.watched_tokens.clone(),
            ),
        }
    }

    /// Remote store settings combined with `credentials`.
    pub fn store_config(&self, credentials: &StoreCredentials) -> StoreConfig {
        StoreConfig {
            url: credentials.url.clone(),
            api_key: credentials.key.clone(),
            table: self.store.table.clone(),
            timeout: Duration::from_millis(self.store.timeout_ms),
        }
    }
}

/// Remote store URL and access key.
#[derive(Clone)]
pub struct StoreCredentials {
    pub url: String,
    pub key: String,
}

impl StoreCredentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let url = read(STORE_URL_VAR);
        let key = read(STORE_KEY_VAR);

        match (url, key) {
            (Some(url), Some(key)) => Ok(Self { url, key }),
            (url, key) => Err(AppError::MissingCredentials {
                url: presence(url.is_some()),
                key: presence(key.is_some()),
            }),
        }
    }
}

fn presence(set: bool) -> &'static str {
    if set {
        "set"
    } else {
        "not set"
    }
}

impl fmt::Debug for StoreCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("url", &self.url)
            .field("key", &"[hidden]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintscan_ws::FeedMethod;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.feed.url, "wss://pumpportal.fun/api/data");
        assert_eq!(config.feed.reconnect_delay_ms, 5_000);
        assert_eq!(config.ledger.path, PathBuf::from("tokens.csv"));
        assert_eq!(config.store.table, "tokens");
        assert_eq!(config.store.timeout_ms, 10_000);
        assert!(config.telemetry.metrics_port.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [feed]
            reconnect_delay_ms = 250

            [telemetry]
            metrics_port = 9100
            "#,
        )
        .unwrap();

        assert_eq!(config.feed.reconnect_delay_ms, 250);
        assert_eq!(config.feed.url, DEFAULT_FEED_URL);
        assert_eq!(config.feed.watched_accounts, vec![DEFAULT_WATCHED_ACCOUNT]);
        assert_eq!(config.telemetry.metrics_port, Some(9100));
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = AppConfig::from_toml("[feed\nurl = ");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_from_file_missing_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::from_file(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_from_file_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mintscan.toml");
        std::fs::write(&path, "[ledger]\npath = \"data/seen.csv\"\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.ledger.path, PathBuf::from("data/seen.csv"));
    }

    #[test]
    fn test_connection_config_has_three_intents() {
        let mut config = AppConfig::default();
        config.feed.watched_tokens.clear();

        let conn = config.connection_config();
        let methods: Vec<FeedMethod> = conn.subscriptions.iter().map(|s| s.method).collect();
        assert_eq!(
            methods,
            vec![
                FeedMethod::NewToken,
                FeedMethod::AccountTrade,
                FeedMethod::TokenTrade,
            ]
        );
        assert_eq!(conn.subscriptions[2].keys, Some(Vec::new()));
    }

    #[test]
    fn test_credentials_present() {
        let creds = StoreCredentials::from_lookup(lookup(&[
            (STORE_URL_VAR, "https://abc.supabase.co"),
            (STORE_KEY_VAR, "secret-key"),
        ]))
        .unwrap();
        assert_eq!(creds.url, "https://abc.supabase.co");
        assert!(!format!("{creds:?}").contains("secret-key"));

        let store = AppConfig::default().store_config(&creds);
        assert_eq!(store.table, "tokens");
        assert_eq!(store.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_missing_key_names_variable_without_value() {
        let err = StoreCredentials::from_lookup(lookup(&[(
            STORE_URL_VAR,
            "https://abc.supabase.co",
        )]))
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("SUPABASE_URL: set"));
        assert!(message.contains("SUPABASE_KEY: not set"));
        assert!(!message.contains("abc.supabase.co"));
    }

    #[test]
    fn test_blank_values_are_missing() {
        let err = StoreCredentials::from_lookup(lookup(&[
            (STORE_URL_VAR, "  "),
            (STORE_KEY_VAR, ""),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::MissingCredentials {
                url: "not set",
                key: "not set"
            }
        ));
    }
}
