//! Market data provider trait definitions.
//!
//! This module defines the core `MarketDataProvider` trait that every vendor
//! adapter implements.

use async_trait::async_trait;
use tracing::debug;

use crate::errors::MarketDataError;
use crate::models::{
    CompanyProfile, CompanyProfileRequest, CorporateActionsRequest, Dividend, Earnings,
    HistoricalDataRequest, HistoricalPrice, NewsItem, NewsRequest, ProviderResponse, Quote,
    QuotesRequest, RateLimitInfo, SearchRequest, SearchResult, Split,
};

use super::capabilities::{Operation, ProviderCapabilities};
use super::config::ProviderConfig;

/// Symbol looked up by the default health probe.
pub const HEALTH_CHECK_SYMBOL: &str = "AAPL";

/// Trait for market data providers.
///
/// Implement this trait to add support for a new market data source.
/// The manager uses the provider's capabilities and configured priority
/// to decide when and how to use it.
///
/// Requests arrive already normalized. Implementations return normalized
/// models or a typed [`MarketDataError`]; they never retry across vendors.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use quoteline_market_data::provider::{MarketDataProvider, ProviderCapabilities, ProviderConfig};
///
/// struct MyProvider {
///     config: ProviderConfig,
/// }
///
/// #[async_trait]
/// impl MarketDataProvider for MyProvider {
///     fn config(&self) -> &ProviderConfig {
///         &self.config
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities::core()
///     }
///
///     // ... implement get_quotes, get_historical_data, get_company_profile
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Configuration the provider was built from.
    fn config(&self) -> &ProviderConfig;

    /// Unique name used for registration, ordering and logging.
    fn name(&self) -> &str {
        &self.config().name
    }

    /// Describes which operations this provider can serve.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Fails fast with `CapabilityNotSupported` when the flag is off.
    fn ensure_capability(&self, operation: Operation) -> Result<(), MarketDataError> {
        if self.capabilities().supports(operation) {
            Ok(())
        } else {
            Err(MarketDataError::capability_not_supported(
                self.name(),
                operation,
            ))
        }
    }

    /// Fetch the latest quote for each requested symbol.
    async fn get_quotes(
        &self,
        request: &QuotesRequest,
    ) -> Result<ProviderResponse<Vec<Quote>>, MarketDataError>;

    /// Fetch daily bars, ordered by date ascending.
    async fn get_historical_data(
        &self,
        request: &HistoricalDataRequest,
    ) -> Result<ProviderResponse<Vec<HistoricalPrice>>, MarketDataError>;

    async fn get_company_profile(
        &self,
        request: &CompanyProfileRequest,
    ) -> Result<ProviderResponse<CompanyProfile>, MarketDataError>;

    async fn get_dividends(
        &self,
        request: &CorporateActionsRequest,
    ) -> Result<ProviderResponse<Vec<Dividend>>, MarketDataError> {
        let _ = request;
        Err(MarketDataError::capability_not_supported(
            self.name(),
            Operation::Dividends,
        ))
    }

    async fn get_splits(
        &self,
        request: &CorporateActionsRequest,
    ) -> Result<ProviderResponse<Vec<Split>>, MarketDataError> {
        let _ = request;
        Err(MarketDataError::capability_not_supported(
            self.name(),
            Operation::Splits,
        ))
    }

    async fn get_earnings(
        &self,
        request: &CorporateActionsRequest,
    ) -> Result<ProviderResponse<Vec<Earnings>>, MarketDataError> {
        let _ = request;
        Err(MarketDataError::capability_not_supported(
            self.name(),
            Operation::Earnings,
        ))
    }

    async fn get_news(
        &self,
        request: &NewsRequest,
    ) -> Result<ProviderResponse<Vec<NewsItem>>, MarketDataError> {
        let _ = request;
        Err(MarketDataError::capability_not_supported(
            self.name(),
            Operation::News,
        ))
    }

    /// Search for symbols matching the query.
    ///
    /// Default implementation returns `CapabilityNotSupported`.
    async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<ProviderResponse<Vec<SearchResult>>, MarketDataError> {
        let _ = request;
        Err(MarketDataError::capability_not_supported(
            self.name(),
            Operation::Search,
        ))
    }

    /// Probe whether the vendor is serving requests.
    ///
    /// The default looks up a single well-known quote. Being throttled
    /// still counts as healthy; any other failure does not.
    async fn is_healthy(&self) -> Result<bool, MarketDataError> {
        let request = QuotesRequest::new([HEALTH_CHECK_SYMBOL])?;
        match self.get_quotes(&request).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_rate_limit() => Ok(true),
            Err(e) => {
                debug!("Health probe for '{}' failed: {}", self.name(), e);
                Ok(false)
            }
        }
    }

    /// Last known quota snapshot, if the vendor reports one.
    fn get_rate_limit(&self) -> Option<RateLimitInfo> {
        None
    }
}
