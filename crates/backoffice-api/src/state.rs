//! # Application State & Configuration
//!
//! [`AppConfig`] is read once from the environment at start-up.
//! [`AppState`] wires the storage backend, the authorization gate and the
//! services together and is cloned into every handler.

use std::sync::Arc;

use backoffice_core::{CurrencyCode, SecretHasher};
use thiserror::Error;

use crate::auth::SecretToken;
use crate::authz::{AuthorizationGate, DirectoryGate};
use crate::bootstrap::AdminSeed;
use crate::middleware::rate_limit::RateLimitConfig;
use crate::services::{AccountProvisioner, ReferenceData};
use crate::store::{AccountLedger, Directory, MemoryStore};

// -- Configuration ----------------------------------------------------------

/// Malformed configuration value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds a value of the wrong shape.
    #[error("invalid value for {var}: {reason}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Runtime configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// PostgreSQL URL. `None` runs on the in-memory store.
    pub database_url: Option<String>,
    /// Upper bound of the connection pool.
    pub database_max_connections: u32,
    /// Shared bearer secret. `None` disables the secret check.
    pub auth_token: Option<SecretToken>,
    /// Currency used when a new account does not name one.
    pub base_currency: CurrencyCode,
    /// Per-caller request budget.
    pub rate_limit: RateLimitConfig,
    /// Log output format.
    pub log_format: LogFormat,
    /// First administrator to create at start-up, if any.
    pub bootstrap_admin: Option<AdminSeed>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("database_max_connections", &self.database_max_connections)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("base_currency", &self.base_currency)
            .field("rate_limit", &self.rate_limit)
            .field("log_format", &self.log_format)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: None,
            database_max_connections: 20,
            auth_token: None,
            base_currency: CurrencyCode::default_base(),
            rate_limit: RateLimitConfig::default(),
            log_format: LogFormat::Text,
            bootstrap_admin: None,
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through a variable lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_currency = match lookup("BASE_CURRENCY") {
            Some(raw) => CurrencyCode::new(raw).map_err(|e| ConfigError::Invalid {
                var: "BASE_CURRENCY",
                reason: e.to_string(),
            })?,
            None => defaults.base_currency,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    reason: format!("expected \"text\" or \"json\", got \"{other}\""),
                })
            }
        };

        let database_max_connections = parse_var(
            &lookup,
            "DATABASE_MAX_CONNECTIONS",
            defaults.database_max_connections,
        )?;
        if database_max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DATABASE_MAX_CONNECTIONS",
                reason: "must be at least 1".into(),
            });
        }

        let rate_limit = RateLimitConfig {
            max_requests: parse_var(
                &lookup,
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit.max_requests,
            )?,
            window_secs: parse_var(
                &lookup,
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit.window_secs,
            )?,
        };

        Ok(Self {
            port: parse_var(&lookup, "PORT", defaults.port)?,
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            database_max_connections,
            auth_token: lookup("AUTH_TOKEN")
                .filter(|v| !v.is_empty())
                .map(SecretToken::new),
            base_currency,
            rate_limit,
            log_format,
            bootstrap_admin: AdminSeed::from_lookup(&lookup),
        })
    }
}

// -- State ------------------------------------------------------------------

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Account provisioning service.
    pub accounts: Arc<AccountProvisioner>,
    /// Users and reference data service.
    pub reference: Arc<ReferenceData>,
    /// Configuration.
    pub config: AppConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Default configuration over a seeded in-memory store.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// The given configuration over a seeded in-memory store.
    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::seeded());
        Self::with_stores(config, store.clone(), store, SecretHasher::default())
    }

    /// Wire the services over explicit storage backends.
    pub fn with_stores(
        config: AppConfig,
        directory: Arc<dyn Directory>,
        ledger: Arc<dyn AccountLedger>,
        hasher: SecretHasher,
    ) -> Self {
        let gate: Arc<dyn AuthorizationGate> = Arc::new(DirectoryGate::new(directory.clone()));
        let accounts = AccountProvisioner::new(
            gate.clone(),
            directory.clone(),
            ledger,
            hasher.clone(),
            config.base_currency.clone(),
        );
        let reference = ReferenceData::new(gate, directory, hasher);
        Self {
            accounts: Arc::new(accounts),
            reference: Arc::new(reference),
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_max_connections, 20);
        assert_eq!(config.base_currency.as_str(), "IDR");
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.database_url.is_none());
        assert!(config.auth_token.is_none());
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn values_are_read() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("DATABASE_MAX_CONNECTIONS", "5"),
            ("AUTH_TOKEN", "s3cret"),
            ("BASE_CURRENCY", "usd"),
            ("RATE_LIMIT_MAX_REQUESTS", "10"),
            ("RATE_LIMIT_WINDOW_SECS", "1"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.base_currency.as_str(), "USD");
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.window_secs, 1);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.auth_token.is_some());
    }

    #[test]
    fn malformed_values_fail() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
        assert!(AppConfig::from_lookup(lookup(&[("BASE_CURRENCY", "RUPIAH")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("LOG_FORMAT", "xml")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("DATABASE_MAX_CONNECTIONS", "0")])).is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = AppConfig::from_lookup(lookup(&[
            ("AUTH_TOKEN", "hunter2"),
            ("DATABASE_URL", "postgres://bank:pw@db/bank"),
        ]))
        .unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(!dbg.contains("pw@db"));
    }
}
