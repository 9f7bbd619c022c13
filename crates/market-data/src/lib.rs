//! Quoteline Market Data Crate
//!
//! This crate aggregates market data from multiple upstream vendors behind
//! one normalized interface, handling vendor outages, throttling and
//! inconsistent response shapes transparently.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Quotes, historical prices, company profiles, dividends, splits,
//!   earnings, news and symbol search
//! - Multiple providers with a primary and ordered fallbacks
//! - Response caching with a configurable TTL
//! - Per-provider health tracking with periodic background checks
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |     Caller       |  (normalized request)
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! | ProviderManager  | --> |  ResponseCache   |  (operation + canonical request)
//! +------------------+     +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! | Ordered providers| --> |  HealthTracker   |  (skip unhealthy)
//! +------------------+     +------------------+
//!          |
//!          v
//! +------------------+
//! |  Vendor adapter  |  (Finnhub, ...) over ProviderHttpClient
//! +------------------+
//!          |
//!          v
//! +------------------+
//! | ProviderResponse |  (data + source + cached flag)
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`ProviderManager`] - Registry and fallback orchestrator
//! - [`MarketDataProvider`] - Contract every vendor adapter implements
//! - [`ProviderResponse`] - Envelope returned by every operation
//! - [`MarketDataError`] - Error taxonomy with machine-readable codes

pub mod errors;
pub mod factory;
pub mod manager;
pub mod models;
pub mod provider;

// Re-export all public types from models
pub use models::{
    CompanyProfile, CompanyProfileRequest, CorporateActionsRequest, DateRange, Dividend, Earnings,
    HistoricalDataRequest, HistoricalPeriod, HistoricalPrice, NewsItem, NewsRequest,
    ProviderResponse, Quote, QuotesRequest, RateLimitInfo, SearchRequest, SearchResult, Split,
};

// Re-export provider types
pub use provider::finnhub::FinnhubProvider;
pub use provider::{
    normalize_symbol, MarketDataProvider, Operation, ProviderCapabilities, ProviderConfig,
    ProviderHttpClient, RateLimit,
};

// Re-export manager types
pub use manager::{
    CacheStats, FetchDiagnostics, ManagerConfig, ProviderAttempt, ProviderHealth,
    ProviderManager, SkipReason,
};

pub use errors::{MarketDataError, RetryClass};
pub use factory::{build_manager, build_manager_with};
