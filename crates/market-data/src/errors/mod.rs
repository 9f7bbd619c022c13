//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`RetryClass`]: Classification for determining retry and health behavior

mod retry;

pub use retry::RetryClass;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during market data operations.
///
/// Every variant exposes a machine-readable [`code`](Self::code) and, when it
/// originated from a vendor adapter, the [`provider`](Self::provider) name.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The vendor throttled the request (HTTP 429).
    /// Throttling is not brokenness: provider health is left unchanged.
    #[error("Rate limit exceeded: {provider}")]
    RateLimitExceeded {
        /// The provider that rate limited the request
        provider: String,
        /// When the vendor says the quota resets, if it told us
        reset_at: Option<DateTime<Utc>>,
    },

    /// The vendor confirmed the query does not resolve (HTTP 404 or an
    /// empty lookup). Other vendors are still tried since universes differ.
    #[error("Invalid symbol: {provider} - {query}")]
    InvalidSymbol {
        /// The provider that rejected the symbol
        provider: String,
        /// The symbol or resource that failed to resolve
        query: String,
    },

    /// Bad or missing credentials (HTTP 401/403).
    #[error("Authentication failed: {provider} - {message}")]
    AuthenticationFailed {
        /// The provider that rejected the credentials
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// Network/connection failure or 5xx response.
    /// The manager marks the provider unhealthy immediately.
    #[error("Provider unavailable: {provider} - {message}")]
    ProviderUnavailable {
        /// The provider that could not be reached
        provider: String,
        /// Description of the failure
        message: String,
    },

    /// The operation was invoked against an adapter lacking that capability.
    /// Raised before any network call.
    #[error("Capability not supported: {provider} does not support {operation}")]
    CapabilityNotSupported {
        /// The provider lacking the capability
        provider: String,
        /// The logical operation that was requested
        operation: String,
    },

    /// Every fallback candidate was skipped before any call was made.
    #[error("All providers failed for {operation}")]
    AllProvidersFailed {
        /// The logical operation that could not be served
        operation: String,
    },

    /// Any other provider-side failure (unexpected status, malformed payload).
    #[error("Provider error: {provider} - {message}")]
    Provider {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// A transport error that has not been classified yet.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Provider or manager configuration was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A request payload was rejected before reaching any provider.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The configured aggregate deadline for a fallback pass elapsed.
    #[error("Deadline exceeded for {operation} after {elapsed_ms}ms")]
    DeadlineExceeded {
        /// The logical operation that timed out
        operation: String,
        /// Milliseconds spent before giving up
        elapsed_ms: u64,
    },
}

impl MarketDataError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::InvalidSymbol { .. } => "INVALID_SYMBOL",
            Self::AuthenticationFailed { .. } => "AUTHENTICATION_FAILED",
            Self::ProviderUnavailable { .. } => "PROVIDER_UNAVAILABLE",
            Self::CapabilityNotSupported { .. } => "CAPABILITY_NOT_SUPPORTED",
            Self::AllProvidersFailed { .. } => "ALL_PROVIDERS_FAILED",
            Self::Provider { .. } => "PROVIDER_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::DeadlineExceeded { .. } => "DEADLINE_EXCEEDED",
        }
    }

    /// Name of the provider the error originated from, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::RateLimitExceeded { provider, .. }
            | Self::InvalidSymbol { provider, .. }
            | Self::AuthenticationFailed { provider, .. }
            | Self::ProviderUnavailable { provider, .. }
            | Self::CapabilityNotSupported { provider, .. }
            | Self::Provider { provider, .. } => Some(provider),
            Self::AllProvidersFailed { .. }
            | Self::Network(_)
            | Self::InvalidConfiguration(_)
            | Self::InvalidRequest(_)
            | Self::DeadlineExceeded { .. } => None,
        }
    }

    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use quoteline_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimitExceeded {
    ///     provider: "finnhub".to_string(),
    ///     reset_at: None,
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::NextProvider);
    ///
    /// let error = MarketDataError::ProviderUnavailable {
    ///     provider: "finnhub".to_string(),
    ///     message: "HTTP 503".to_string(),
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::MarkUnhealthy);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Network(_) => RetryClass::Retry,

            Self::ProviderUnavailable { .. } => RetryClass::MarkUnhealthy,

            Self::RateLimitExceeded { .. }
            | Self::InvalidSymbol { .. }
            | Self::AuthenticationFailed { .. }
            | Self::CapabilityNotSupported { .. }
            | Self::Provider { .. } => RetryClass::NextProvider,

            Self::AllProvidersFailed { .. }
            | Self::InvalidConfiguration(_)
            | Self::InvalidRequest(_)
            | Self::DeadlineExceeded { .. } => RetryClass::Terminal,
        }
    }

    /// True for throttling failures, which never count against health.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimitExceeded { .. })
    }

    /// Shorthand used by capability guards.
    pub fn capability_not_supported(provider: &str, operation: impl ToString) -> Self {
        Self::CapabilityNotSupported {
            provider: provider.to_string(),
            operation: operation.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_moves_to_next_provider() {
        let error = MarketDataError::RateLimitExceeded {
            provider: "finnhub".to_string(),
            reset_at: None,
        };
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
        assert_eq!(error.code(), "RATE_LIMIT_EXCEEDED");
        assert!(error.is_rate_limit());
    }

    #[test]
    fn test_unavailable_marks_unhealthy() {
        let error = MarketDataError::ProviderUnavailable {
            provider: "finnhub".to_string(),
            message: "HTTP 502".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::MarkUnhealthy);
        assert_eq!(error.code(), "PROVIDER_UNAVAILABLE");
    }

    #[test]
    fn test_auth_and_symbol_errors_try_next_provider() {
        let auth = MarketDataError::AuthenticationFailed {
            provider: "finnhub".to_string(),
            message: "Invalid API key".to_string(),
        };
        let symbol = MarketDataError::InvalidSymbol {
            provider: "finnhub".to_string(),
            query: "ZZZZ".to_string(),
        };
        assert_eq!(auth.retry_class(), RetryClass::NextProvider);
        assert_eq!(symbol.retry_class(), RetryClass::NextProvider);
        assert_eq!(auth.code(), "AUTHENTICATION_FAILED");
        assert_eq!(symbol.code(), "INVALID_SYMBOL");
    }

    #[test]
    fn test_terminal_errors() {
        let exhausted = MarketDataError::AllProvidersFailed {
            operation: "get_quotes".to_string(),
        };
        assert_eq!(exhausted.retry_class(), RetryClass::Terminal);
        assert_eq!(exhausted.code(), "ALL_PROVIDERS_FAILED");
        assert_eq!(exhausted.provider(), None);

        let config = MarketDataError::InvalidConfiguration("name is required".to_string());
        assert_eq!(config.retry_class(), RetryClass::Terminal);
    }

    #[test]
    fn test_provider_name_is_exposed() {
        let error = MarketDataError::capability_not_supported("polygon", "get_news");
        assert_eq!(error.provider(), Some("polygon"));
        assert_eq!(error.code(), "CAPABILITY_NOT_SUPPORTED");
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::InvalidSymbol {
            provider: "finnhub".to_string(),
            query: "INVALID".to_string(),
        };
        assert_eq!(format!("{}", error), "Invalid symbol: finnhub - INVALID");

        let error = MarketDataError::RateLimitExceeded {
            provider: "finnhub".to_string(),
            reset_at: None,
        };
        assert_eq!(format!("{}", error), "Rate limit exceeded: finnhub");

        let error = MarketDataError::Provider {
            provider: "polygon".to_string(),
            message: "Unexpected payload".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Provider error: polygon - Unexpected payload"
        );
    }
}
