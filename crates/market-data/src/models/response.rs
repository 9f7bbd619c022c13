use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quota information reported by a vendor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimitInfo {
    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.remaining.is_none() && self.reset_at.is_none()
    }
}

/// Envelope every provider call and every manager operation returns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse<T> {
    pub data: T,
    /// Name of the provider that served the data
    pub source: String,
    /// When the provider produced the response
    pub timestamp: DateTime<Utc>,
    /// True when served from the manager's cache
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitInfo>,
}

impl<T> ProviderResponse<T> {
    /// Fresh (non-cached) response stamped with the current time.
    pub fn new(data: T, source: impl Into<String>) -> Self {
        Self {
            data,
            source: source.into(),
            timestamp: Utc::now(),
            cached: false,
            rate_limit: None,
        }
    }

    /// Attach quota info; empty snapshots are dropped.
    pub fn with_rate_limit(mut self, rate_limit: Option<RateLimitInfo>) -> Self {
        self.rate_limit = rate_limit.filter(|info| !info.is_empty());
        self
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ProviderResponse<U> {
        ProviderResponse {
            data: f(self.data),
            source: self.source,
            timestamp: self.timestamp,
            cached: self.cached,
            rate_limit: self.rate_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_response_is_not_cached() {
        let response = ProviderResponse::new(vec![1, 2, 3], "finnhub");
        assert!(!response.cached);
        assert_eq!(response.source, "finnhub");
        assert!(response.rate_limit.is_none());
    }

    #[test]
    fn test_empty_rate_limit_is_dropped() {
        let response =
            ProviderResponse::new((), "finnhub").with_rate_limit(Some(RateLimitInfo::default()));
        assert!(response.rate_limit.is_none());

        let response = ProviderResponse::new((), "finnhub").with_rate_limit(Some(RateLimitInfo {
            remaining: Some(12),
            ..Default::default()
        }));
        assert_eq!(response.rate_limit.unwrap().remaining, Some(12));
    }

    #[test]
    fn test_map_keeps_metadata() {
        let response = ProviderResponse::new(2, "p1").map(|n| n * 10);
        assert_eq!(response.data, 20);
        assert_eq!(response.source, "p1");
    }
}
