//! Per-provider configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

/// Priority given to providers that don't set one. Lower is preferred.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Per-request timeout used when the config doesn't set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Retry budget used when the config doesn't set one.
pub const DEFAULT_RETRIES: u32 = 3;

/// Vendor quota descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    pub requests_per_minute: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_per_day: Option<u32>,
}

impl RateLimit {
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            requests_per_day: None,
        }
    }
}

/// Configuration every provider is constructed from.
///
/// The API key is never serialized and is redacted from `Debug` output.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub name: String,
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
    /// Per-request timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn effective_priority(&self) -> i32 {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }

    pub fn effective_timeout(&self) -> Duration {
        self.timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn effective_retries(&self) -> u32 {
        self.retries.unwrap_or(DEFAULT_RETRIES)
    }

    /// Checks the fields the manager relies on. Timeout and retries are
    /// unsigned and need no check.
    pub fn validate(&self) -> Result<(), MarketDataError> {
        if self.name.trim().is_empty() {
            return Err(MarketDataError::InvalidConfiguration(
                "provider name is required".to_string(),
            ));
        }
        if let Some(rate_limit) = &self.rate_limit {
            if rate_limit.requests_per_minute == 0 {
                return Err(MarketDataError::InvalidConfiguration(format!(
                    "{}: requests_per_minute must be greater than zero",
                    self.name
                )));
            }
            if rate_limit.requests_per_day == Some(0) {
                return Err(MarketDataError::InvalidConfiguration(format!(
                    "{}: requests_per_day must be greater than zero",
                    self.name
                )));
            }
        }
        if let Some(priority) = self.priority {
            if priority < 0 {
                return Err(MarketDataError::InvalidConfiguration(format!(
                    "{}: priority must not be negative (got {})",
                    self.name, priority
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("rate_limit", &self.rate_limit)
            .field("timeout_ms", &self.timeout_ms)
            .field("retries", &self.retries)
            .field("priority", &self.priority)
            .finish()
    }
}
