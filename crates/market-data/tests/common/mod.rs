//! Scripted in-memory provider shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal_macros::dec;

use quoteline_market_data::{
    CompanyProfile, CompanyProfileRequest, CorporateActionsRequest, Dividend, Earnings,
    HistoricalDataRequest, HistoricalPrice, ManagerConfig, MarketDataError, MarketDataProvider,
    NewsItem, NewsRequest, Operation, ProviderCapabilities, ProviderConfig, ProviderManager,
    ProviderResponse, Quote, QuotesRequest, SearchRequest, SearchResult, Split,
};

/// What the next provider call does.
#[derive(Clone, Debug)]
pub enum Outcome {
    Succeed,
    /// Succeed after sleeping (on the Tokio clock).
    Delay(Duration),
    Unavailable,
    RateLimited,
    InvalidSymbol,
    AuthFailed,
}

/// What `is_healthy` does.
#[derive(Clone, Copy, Debug)]
pub enum Probe {
    Healthy,
    Unhealthy,
    Error,
    Panic,
    /// Report healthy after sleeping (on the Tokio clock).
    Delay(Duration),
}

pub struct MockProvider {
    config: ProviderConfig,
    capabilities: ProviderCapabilities,
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    probe: Probe,
    probe_script: Mutex<VecDeque<Probe>>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(name: &str) -> Self {
        Self {
            config: ProviderConfig::new(name, format!("https://{}.invalid", name)),
            capabilities: ProviderCapabilities::all_operations(),
            script: Mutex::new(VecDeque::new()),
            fallback: Outcome::Succeed,
            probe: Probe::Healthy,
            probe_script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.config = self.config.with_priority(priority);
        self
    }

    pub fn with_capabilities(mut self, capabilities: ProviderCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Outcomes consumed one per call; afterwards every call uses `always`.
    pub fn with_script(self, outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        self.script.lock().unwrap().extend(outcomes);
        self
    }

    pub fn always(mut self, outcome: Outcome) -> Self {
        self.fallback = outcome;
        self
    }

    pub fn with_probe(mut self, probe: Probe) -> Self {
        self.probe = probe;
        self
    }

    /// Probe results consumed one per health check before `with_probe` applies.
    pub fn with_probe_script(self, probes: impl IntoIterator<Item = Probe>) -> Self {
        self.probe_script.lock().unwrap().extend(probes);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn next_outcome(&self) -> Outcome {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn error(&self, outcome: &Outcome) -> MarketDataError {
        let provider = self.name().to_string();
        match outcome {
            Outcome::Unavailable => MarketDataError::ProviderUnavailable {
                provider,
                message: "HTTP 503 Service Unavailable".to_string(),
            },
            Outcome::RateLimited => MarketDataError::RateLimitExceeded {
                provider,
                reset_at: None,
            },
            Outcome::InvalidSymbol => MarketDataError::InvalidSymbol {
                provider,
                query: "ZZZZ".to_string(),
            },
            Outcome::AuthFailed => MarketDataError::AuthenticationFailed {
                provider,
                message: "HTTP 401 Unauthorized".to_string(),
            },
            Outcome::Succeed | Outcome::Delay(_) => unreachable!("not an error outcome"),
        }
    }

    async fn respond<T: Send>(
        &self,
        operation: Operation,
        data: T,
    ) -> Result<ProviderResponse<T>, MarketDataError> {
        self.ensure_capability(operation)?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_outcome() {
            Outcome::Succeed => Ok(ProviderResponse::new(data, self.name())),
            Outcome::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(ProviderResponse::new(data, self.name()))
            }
            failure => Err(self.error(&failure)),
        }
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.capabilities
    }

    async fn get_quotes(
        &self,
        request: &QuotesRequest,
    ) -> Result<ProviderResponse<Vec<Quote>>, MarketDataError> {
        let quotes = request
            .symbols()
            .iter()
            .map(|symbol| Quote::new(symbol.clone(), dec!(101.25), Utc::now()))
            .collect();
        self.respond(Operation::Quotes, quotes).await
    }

    async fn get_historical_data(
        &self,
        _request: &HistoricalDataRequest,
    ) -> Result<ProviderResponse<Vec<HistoricalPrice>>, MarketDataError> {
        self.respond(Operation::HistoricalData, Vec::new()).await
    }

    async fn get_company_profile(
        &self,
        request: &CompanyProfileRequest,
    ) -> Result<ProviderResponse<CompanyProfile>, MarketDataError> {
        let profile = CompanyProfile::new(request.symbol(), "Mock Corp");
        self.respond(Operation::CompanyProfile, profile).await
    }

    async fn get_dividends(
        &self,
        _request: &CorporateActionsRequest,
    ) -> Result<ProviderResponse<Vec<Dividend>>, MarketDataError> {
        self.respond(Operation::Dividends, Vec::new()).await
    }

    async fn get_splits(
        &self,
        _request: &CorporateActionsRequest,
    ) -> Result<ProviderResponse<Vec<Split>>, MarketDataError> {
        self.respond(Operation::Splits, Vec::new()).await
    }

    async fn get_earnings(
        &self,
        _request: &CorporateActionsRequest,
    ) -> Result<ProviderResponse<Vec<Earnings>>, MarketDataError> {
        self.respond(Operation::Earnings, Vec::new()).await
    }

    async fn get_news(
        &self,
        _request: &NewsRequest,
    ) -> Result<ProviderResponse<Vec<NewsItem>>, MarketDataError> {
        self.respond(Operation::News, Vec::new()).await
    }

    async fn search(
        &self,
        _request: &SearchRequest,
    ) -> Result<ProviderResponse<Vec<SearchResult>>, MarketDataError> {
        self.respond(Operation::Search, Vec::new()).await
    }

    async fn is_healthy(&self) -> Result<bool, MarketDataError> {
        let probe = self
            .probe_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.probe);
        match probe {
            Probe::Healthy => Ok(true),
            Probe::Unhealthy => Ok(false),
            Probe::Error => Err(self.error(&Outcome::Unavailable)),
            Probe::Panic => panic!("health check for '{}' blew up", self.name()),
            Probe::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(true)
            }
        }
    }
}

/// Manager config with the periodic monitor off, so tests drive health.
pub fn config(primary: &str, fallbacks: &[&str]) -> ManagerConfig {
    ManagerConfig::new(primary)
        .with_fallbacks(fallbacks.iter().copied())
        .with_health_check_interval_ms(0)
}

pub fn manager_with(config: ManagerConfig, providers: &[Arc<MockProvider>]) -> ProviderManager {
    let manager = ProviderManager::new(config).unwrap();
    for provider in providers {
        manager
            .register_provider(Arc::clone(provider) as Arc<dyn MarketDataProvider>)
            .unwrap();
    }
    manager
}

pub fn quotes(symbols: &[&str]) -> QuotesRequest {
    QuotesRequest::new(symbols.iter().copied()).unwrap()
}
