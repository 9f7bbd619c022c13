//! Builds a configured [`ProviderManager`] from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `MARKET_DATA_PRIMARY_PROVIDER` | `finnhub` |
//! | `MARKET_DATA_FALLBACK_PROVIDERS` | empty (comma separated) |
//! | `MARKET_DATA_ENABLE_FALLBACK` | `true` |
//! | `MARKET_DATA_ENABLE_CACHING` | `true` |
//! | `MARKET_DATA_CACHE_TTL_SECONDS` | `300` |
//! | `MARKET_DATA_HEALTH_CHECK_INTERVAL_MS` | `60000` |
//! | `MARKET_DATA_MAX_RETRIES` | `3` |
//! | `MARKET_DATA_FALLBACK_DEADLINE_MS` | unset |
//! | `FINNHUB_API_KEY` | unset; registers the Finnhub adapter when present |

use std::str::FromStr;
use std::sync::Arc;

use log::{info, warn};

use crate::errors::MarketDataError;
use crate::manager::{ManagerConfig, ProviderManager};
use crate::provider::finnhub::{self, FinnhubProvider};

pub const ENV_PRIMARY_PROVIDER: &str = "MARKET_DATA_PRIMARY_PROVIDER";
pub const ENV_FALLBACK_PROVIDERS: &str = "MARKET_DATA_FALLBACK_PROVIDERS";
pub const ENV_ENABLE_FALLBACK: &str = "MARKET_DATA_ENABLE_FALLBACK";
pub const ENV_ENABLE_CACHING: &str = "MARKET_DATA_ENABLE_CACHING";
pub const ENV_CACHE_TTL_SECONDS: &str = "MARKET_DATA_CACHE_TTL_SECONDS";
pub const ENV_HEALTH_CHECK_INTERVAL_MS: &str = "MARKET_DATA_HEALTH_CHECK_INTERVAL_MS";
pub const ENV_MAX_RETRIES: &str = "MARKET_DATA_MAX_RETRIES";
pub const ENV_FALLBACK_DEADLINE_MS: &str = "MARKET_DATA_FALLBACK_DEADLINE_MS";
pub const ENV_FINNHUB_API_KEY: &str = "FINNHUB_API_KEY";

pub const DEFAULT_PRIMARY_PROVIDER: &str = finnhub::PROVIDER_NAME;

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(name: &str, value: Option<String>) -> Result<Option<T>, MarketDataError> {
    match non_empty(value) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            MarketDataError::InvalidConfiguration(format!("{}: cannot parse '{}'", name, raw))
        }),
    }
}

fn parse_bool(name: &str, value: Option<String>) -> Result<Option<bool>, MarketDataError> {
    match non_empty(value) {
        None => Ok(None),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(MarketDataError::InvalidConfiguration(format!(
                "{}: expected a boolean, got '{}'",
                name, raw
            ))),
        },
    }
}

impl ManagerConfig {
    /// Read the manager configuration from the process environment.
    pub fn from_env() -> Result<Self, MarketDataError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MarketDataError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let primary = non_empty(lookup(ENV_PRIMARY_PROVIDER))
            .unwrap_or_else(|| DEFAULT_PRIMARY_PROVIDER.to_string());
        let mut config = ManagerConfig::new(primary);

        if let Some(list) = non_empty(lookup(ENV_FALLBACK_PROVIDERS)) {
            config.fallback_providers = list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(enabled) = parse_bool(ENV_ENABLE_FALLBACK, lookup(ENV_ENABLE_FALLBACK))? {
            config.enable_fallback = enabled;
        }
        if let Some(enabled) = parse_bool(ENV_ENABLE_CACHING, lookup(ENV_ENABLE_CACHING))? {
            config.enable_caching = enabled;
        }
        if let Some(ttl) = parse_var(ENV_CACHE_TTL_SECONDS, lookup(ENV_CACHE_TTL_SECONDS))? {
            config.cache_ttl_seconds = ttl;
        }
        if let Some(interval) = parse_var(
            ENV_HEALTH_CHECK_INTERVAL_MS,
            lookup(ENV_HEALTH_CHECK_INTERVAL_MS),
        )? {
            config.health_check_interval_ms = interval;
        }
        if let Some(retries) = parse_var(ENV_MAX_RETRIES, lookup(ENV_MAX_RETRIES))? {
            config.max_retries = retries;
        }
        config.fallback_deadline_ms =
            parse_var(ENV_FALLBACK_DEADLINE_MS, lookup(ENV_FALLBACK_DEADLINE_MS))?;

        config.validate()?;
        Ok(config)
    }
}

/// Build a manager from the process environment and register every adapter
/// whose credentials are present.
pub fn build_manager() -> Result<ProviderManager, MarketDataError> {
    build_manager_with(|name| std::env::var(name).ok())
}

/// Same as [`build_manager`], reading variables through `lookup`.
pub fn build_manager_with<F>(lookup: F) -> Result<ProviderManager, MarketDataError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = ManagerConfig::from_lookup(&lookup)?;
    let max_retries = config.max_retries;
    let manager = ProviderManager::new(config)?;

    if let Some(api_key) = non_empty(lookup(ENV_FINNHUB_API_KEY)) {
        let provider_config = FinnhubProvider::default_config(api_key).with_retries(max_retries);
        manager.register_provider(Arc::new(FinnhubProvider::from_config(provider_config)?))?;
    }

    let registered = manager.provider_names();
    if registered.is_empty() {
        warn!("No market data providers configured; every request will fail");
    } else {
        info!("Market data providers registered: {}", registered.join(", "));
    }
    if !registered.contains(&manager.config().primary_provider) {
        warn!(
            "Primary provider '{}' is not registered",
            manager.config().primary_provider
        );
    }

    Ok(manager)
}
