//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - Provider capabilities, the operations they gate, and provider config
//! - The shared HTTP helper adapters build on (retry, throttling, error mapping)
//! - Concrete provider implementations (Finnhub)
//!
//! # Architecture
//!
//! The provider system is designed to be:
//! - **Provider-agnostic**: The manager doesn't know about specific vendors
//! - **Extensible**: New providers can be added by implementing `MarketDataProvider`
//! - **Resilient**: Per-request retries live here; cross-vendor fallback lives in the manager
//!
//! Providers receive requests whose symbols are already normalized.

mod backoff;
mod capabilities;
mod config;
mod http;
mod symbol;
mod throttle;
mod traits;

pub mod finnhub;

// Re-exports
pub use backoff::Backoff;
pub use capabilities::{Operation, ProviderCapabilities};
pub use config::{
    ProviderConfig, RateLimit, DEFAULT_PRIORITY, DEFAULT_RETRIES, DEFAULT_TIMEOUT,
};
pub use http::{classify_status, parse_rate_limit_headers, parse_reset_at, ProviderHttpClient};
pub use symbol::normalize_symbol;
pub use throttle::Throttle;
pub use traits::{MarketDataProvider, HEALTH_CHECK_SYMBOL};
