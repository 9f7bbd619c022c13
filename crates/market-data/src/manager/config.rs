use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;
pub const DEFAULT_HEALTH_CHECK_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Provider manager settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerConfig {
    /// Always tried first
    pub primary_provider: String,
    /// Tried after the primary, ordered by provider priority
    #[serde(default)]
    pub fallback_providers: Vec<String>,
    pub enable_fallback: bool,
    pub enable_caching: bool,
    pub cache_ttl_seconds: u64,
    /// Zero disables the periodic health monitor
    pub health_check_interval_ms: u64,
    /// Retry budget handed to adapters built by the factory
    pub max_retries: u32,
    /// Upper bound on one whole fallback pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_deadline_ms: Option<u64>,
}

impl ManagerConfig {
    pub fn new(primary_provider: impl Into<String>) -> Self {
        Self {
            primary_provider: primary_provider.into(),
            fallback_providers: Vec::new(),
            enable_fallback: true,
            enable_caching: true,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            health_check_interval_ms: DEFAULT_HEALTH_CHECK_INTERVAL_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            fallback_deadline_ms: None,
        }
    }

    pub fn with_fallbacks<I, S>(mut self, fallbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_providers = fallbacks.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fallback_enabled(mut self, enabled: bool) -> Self {
        self.enable_fallback = enabled;
        self
    }

    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.enable_caching = enabled;
        self
    }

    pub fn with_cache_ttl_seconds(mut self, seconds: u64) -> Self {
        self.cache_ttl_seconds = seconds;
        self
    }

    pub fn with_health_check_interval_ms(mut self, interval_ms: u64) -> Self {
        self.health_check_interval_ms = interval_ms;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_fallback_deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.fallback_deadline_ms = Some(deadline_ms);
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// `None` when the periodic monitor is disabled.
    pub fn health_check_interval(&self) -> Option<Duration> {
        (self.health_check_interval_ms > 0).then(|| Duration::from_millis(self.health_check_interval_ms))
    }

    pub fn fallback_deadline(&self) -> Option<Duration> {
        self.fallback_deadline_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), MarketDataError> {
        if self.primary_provider.trim().is_empty() {
            return Err(MarketDataError::InvalidConfiguration(
                "primary provider is required".to_string(),
            ));
        }
        if self.fallback_deadline_ms == Some(0) {
            return Err(MarketDataError::InvalidConfiguration(
                "fallback deadline must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::new("finnhub");
        assert!(config.enable_fallback);
        assert!(config.enable_caching);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.health_check_interval(), Some(Duration::from_secs(60)));
        assert_eq!(config.max_retries, 3);
        assert!(config.fallback_deadline().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_primary_is_rejected() {
        let err = ManagerConfig::new("").validate().unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIGURATION");
    }

    #[test]
    fn test_zero_interval_disables_monitor() {
        let config = ManagerConfig::new("p1").with_health_check_interval_ms(0);
        assert!(config.health_check_interval().is_none());
    }
}
