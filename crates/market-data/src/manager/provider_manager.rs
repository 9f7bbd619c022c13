//! Provider manager: registry, fallback orchestration, caching and health.
//!
//! Every logical operation goes through [`ProviderManager::execute_with_fallback`]:
//! 1. Serve from cache when caching is enabled and a live entry exists
//! 2. Order candidates: primary first, then fallbacks by priority
//! 3. Skip candidates lacking the capability, or marked unhealthy
//! 4. Call candidates one at a time until one succeeds
//! 5. Cache the successful response and mark its provider healthy
//!
//! The manager never calls the same provider twice within one pass.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::join_all;
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::time::Instant;

use super::cache::{cache_key, CacheStats, ResponseCache};
use super::config::ManagerConfig;
use super::diagnostics::{FetchDiagnostics, SkipReason};
use super::health::{HealthTracker, ProviderHealth};
use super::monitor::HealthMonitor;
use crate::errors::{MarketDataError, RetryClass};
use crate::models::{
    CompanyProfile, CompanyProfileRequest, CorporateActionsRequest, Dividend, Earnings,
    HistoricalDataRequest, HistoricalPrice, NewsItem, NewsRequest, ProviderResponse, Quote,
    QuotesRequest, SearchRequest, SearchResult, Split,
};
use crate::provider::{MarketDataProvider, Operation};

type ProviderMap = HashMap<String, Arc<dyn MarketDataProvider>>;

/// State shared between the manager and its health monitor task.
pub(crate) struct ManagerState {
    config: ManagerConfig,
    providers: RwLock<ProviderMap>,
    health: HealthTracker,
    cache: ResponseCache,
}

impl ManagerState {
    fn read_providers(&self) -> RwLockReadGuard<'_, ProviderMap> {
        self.providers.read().unwrap_or_else(|poisoned| {
            warn!("Provider registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_providers(&self) -> RwLockWriteGuard<'_, ProviderMap> {
        self.providers.write().unwrap_or_else(|poisoned| {
            warn!("Provider registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Probe every registered provider concurrently.
    ///
    /// Each probe runs in its own task and updates only its own health
    /// entry. A probe that errors or panics marks that provider unhealthy
    /// and never affects the others.
    pub(crate) async fn check_all_providers_health(self: &Arc<Self>) -> BTreeMap<String, bool> {
        let providers: Vec<(String, Arc<dyn MarketDataProvider>)> = self
            .read_providers()
            .iter()
            .map(|(name, provider)| (name.clone(), Arc::clone(provider)))
            .collect();

        let probes = providers.into_iter().map(|(name, provider)| {
            let state = Arc::clone(self);
            let probe_name = name.clone();
            let handle = tokio::spawn(async move {
                match provider.is_healthy().await {
                    Ok(true) => {
                        state.health.mark_healthy(&probe_name);
                        true
                    }
                    Ok(false) => {
                        state
                            .health
                            .mark_unhealthy(&probe_name, "health check failed");
                        false
                    }
                    Err(e) => {
                        state.health.mark_unhealthy(&probe_name, e.to_string());
                        false
                    }
                }
            });
            async move { (name, handle.await) }
        });

        let mut results = BTreeMap::new();
        for (name, outcome) in join_all(probes).await {
            let healthy = match outcome {
                Ok(healthy) => healthy,
                Err(e) => {
                    error!("Health probe for '{}' did not complete: {}", name, e);
                    self.health.mark_unhealthy(&name, "health probe panicked");
                    false
                }
            };
            results.insert(name, healthy);
        }
        results
    }
}

/// Orchestrates market data requests across registered providers.
pub struct ProviderManager {
    state: Arc<ManagerState>,
    monitor: Mutex<Option<HealthMonitor>>,
}

impl ProviderManager {
    /// Create a manager with no providers registered.
    ///
    /// When called inside a Tokio runtime with a non-zero health check
    /// interval, a periodic health monitor is started.
    pub fn new(config: ManagerConfig) -> Result<Self, MarketDataError> {
        config.validate()?;

        let state = Arc::new(ManagerState {
            cache: ResponseCache::new(config.cache_ttl()),
            config,
            providers: RwLock::new(HashMap::new()),
            health: HealthTracker::new(),
        });

        let monitor = state
            .config
            .health_check_interval()
            .and_then(|interval| HealthMonitor::spawn(Arc::downgrade(&state), interval));

        info!(
            "Provider manager created (primary: '{}', fallbacks: {:?}, fallback: {}, caching: {})",
            state.config.primary_provider,
            state.config.fallback_providers,
            state.config.enable_fallback,
            state.config.enable_caching
        );

        Ok(Self {
            state,
            monitor: Mutex::new(monitor),
        })
    }

    fn lock_monitor(&self) -> MutexGuard<'_, Option<HealthMonitor>> {
        self.monitor.lock().unwrap_or_else(|poisoned| {
            warn!("Health monitor mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.state.config
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Register a provider under its configured name, starting healthy.
    ///
    /// An invalid configuration is rejected and nothing is registered.
    /// Registering an existing name replaces the previous provider.
    pub fn register_provider(
        &self,
        provider: Arc<dyn MarketDataProvider>,
    ) -> Result<(), MarketDataError> {
        provider.config().validate()?;

        let name = provider.name().to_string();
        let replaced = self
            .state
            .write_providers()
            .insert(name.clone(), provider)
            .is_some();
        self.state.health.register(&name);

        if replaced {
            info!("Replaced provider '{}'", name);
        } else {
            info!("Registered provider '{}'", name);
        }
        Ok(())
    }

    /// Remove a provider and its health entry. Cached responses are kept.
    pub fn unregister_provider(&self, name: &str) -> bool {
        let removed = self.state.write_providers().remove(name).is_some();
        self.state.health.remove(name);
        if removed {
            info!("Unregistered provider '{}'", name);
        }
        removed
    }

    pub fn provider(&self, name: &str) -> Option<Arc<dyn MarketDataProvider>> {
        self.state.read_providers().get(name).cloned()
    }

    /// Registered provider names, sorted.
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read_providers().keys().cloned().collect();
        names.sort();
        names
    }

    /// Candidates in the order a fallback pass tries them.
    ///
    /// Primary first, then configured fallbacks stably sorted by priority.
    /// Unregistered and duplicate names are dropped. With fallback disabled
    /// only the primary is returned.
    fn ordered_candidates(&self) -> Vec<Arc<dyn MarketDataProvider>> {
        let config = &self.state.config;
        let providers = self.state.read_providers();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut ordered = Vec::new();

        if let Some(primary) = providers.get(&config.primary_provider) {
            seen.insert(config.primary_provider.as_str());
            ordered.push(Arc::clone(primary));
        }

        if !config.enable_fallback {
            return ordered;
        }

        let mut fallbacks: Vec<Arc<dyn MarketDataProvider>> = config
            .fallback_providers
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .filter_map(|name| providers.get(name).cloned())
            .collect();
        fallbacks.sort_by_key(|p| p.config().effective_priority());

        ordered.extend(fallbacks);
        ordered
    }

    /// Names of the candidates a fallback pass would try, in order.
    pub fn provider_order(&self) -> Vec<String> {
        self.ordered_candidates()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    // ------------------------------------------------------------------
    // Fallback orchestration
    // ------------------------------------------------------------------

    /// Run `invoke` against candidates until one succeeds.
    ///
    /// Responses are cached per `operation` and canonical `request`. A
    /// cache hit is returned with `cached = true` without calling any
    /// provider.
    pub async fn execute_with_fallback<R, T, F, Fut>(
        &self,
        operation: Operation,
        request: &R,
        invoke: F,
    ) -> Result<ProviderResponse<T>, MarketDataError>
    where
        R: Serialize + ?Sized,
        T: Clone + Send + Sync + 'static,
        F: Fn(Arc<dyn MarketDataProvider>) -> Fut,
        Fut: Future<Output = Result<ProviderResponse<T>, MarketDataError>>,
    {
        let key = if self.state.config.enable_caching {
            Some(cache_key(operation, request)?)
        } else {
            None
        };

        if let Some(key) = &key {
            if let Some(mut hit) = self.state.cache.get::<ProviderResponse<T>>(key) {
                debug!("Cache hit for {} (source '{}')", operation, hit.source);
                hit.cached = true;
                return Ok(hit);
            }
        }

        let started = Instant::now();
        let pass = self.run_fallback_pass(operation, invoke);
        let response = match self.state.config.fallback_deadline() {
            Some(deadline) => match tokio::time::timeout(deadline, pass).await {
                Ok(result) => result?,
                Err(_) => {
                    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                    warn!("{} exceeded its {:?} deadline", operation, deadline);
                    return Err(MarketDataError::DeadlineExceeded {
                        operation: operation.to_string(),
                        elapsed_ms,
                    });
                }
            },
            None => pass.await?,
        };

        if let Some(key) = key {
            self.state.cache.put(key, response.clone());
        }
        Ok(response)
    }

    async fn run_fallback_pass<T, F, Fut>(
        &self,
        operation: Operation,
        invoke: F,
    ) -> Result<ProviderResponse<T>, MarketDataError>
    where
        F: Fn(Arc<dyn MarketDataProvider>) -> Fut,
        Fut: Future<Output = Result<ProviderResponse<T>, MarketDataError>>,
    {
        let health_gated = self.state.config.enable_fallback;
        let mut diagnostics = FetchDiagnostics::new();
        let mut last_error: Option<MarketDataError> = None;

        for provider in self.ordered_candidates() {
            let name = provider.name().to_string();

            if !provider.capabilities().supports(operation) {
                debug!("Provider '{}' does not support {}, skipping", name, operation);
                diagnostics.record_skip(&name, SkipReason::CapabilityNotSupported);
                continue;
            }

            if health_gated && !self.state.health.is_healthy(&name) {
                debug!("Provider '{}' is unhealthy, skipping", name);
                diagnostics.record_skip(&name, SkipReason::Unhealthy);
                continue;
            }

            debug!("Calling '{}' for {}", name, operation);
            match invoke(Arc::clone(&provider)).await {
                Ok(mut response) => {
                    self.state.health.mark_healthy(&name);
                    diagnostics.record_success(&name);
                    if diagnostics.attempts.len() > 1 {
                        info!("{} served by '{}': {}", operation, name, diagnostics.summary());
                    }
                    response.cached = false;
                    return Ok(response);
                }
                Err(err) => {
                    if err.retry_class() == RetryClass::MarkUnhealthy {
                        self.state.health.mark_unhealthy(&name, err.to_string());
                    }
                    if matches!(err, MarketDataError::AuthenticationFailed { .. }) {
                        error!("Provider '{}' rejected credentials: {}", name, err);
                    } else {
                        warn!("Provider '{}' failed {}: {}", name, operation, err);
                    }
                    diagnostics.record_error(&name, err.code().to_string());
                    last_error = Some(err);
                }
            }
        }

        warn!("{} failed on every provider: {}", operation, diagnostics.summary());
        Err(last_error.unwrap_or_else(|| MarketDataError::AllProvidersFailed {
            operation: operation.to_string(),
        }))
    }

    // ------------------------------------------------------------------
    // Logical operations
    // ------------------------------------------------------------------

    pub async fn get_quotes(
        &self,
        request: &QuotesRequest,
    ) -> Result<ProviderResponse<Vec<Quote>>, MarketDataError> {
        self.execute_with_fallback(Operation::Quotes, request, |provider| async move {
            provider.get_quotes(request).await
        })
        .await
    }

    pub async fn get_historical_data(
        &self,
        request: &HistoricalDataRequest,
    ) -> Result<ProviderResponse<Vec<HistoricalPrice>>, MarketDataError> {
        self.execute_with_fallback(Operation::HistoricalData, request, |provider| async move {
            provider.get_historical_data(request).await
        })
        .await
    }

    pub async fn get_company_profile(
        &self,
        request: &CompanyProfileRequest,
    ) -> Result<ProviderResponse<CompanyProfile>, MarketDataError> {
        self.execute_with_fallback(Operation::CompanyProfile, request, |provider| async move {
            provider.get_company_profile(request).await
        })
        .await
    }

    pub async fn get_dividends(
        &self,
        request: &CorporateActionsRequest,
    ) -> Result<ProviderResponse<Vec<Dividend>>, MarketDataError> {
        self.execute_with_fallback(Operation::Dividends, request, |provider| async move {
            provider.get_dividends(request).await
        })
        .await
    }

    pub async fn get_splits(
        &self,
        request: &CorporateActionsRequest,
    ) -> Result<ProviderResponse<Vec<Split>>, MarketDataError> {
        self.execute_with_fallback(Operation::Splits, request, |provider| async move {
            provider.get_splits(request).await
        })
        .await
    }

    pub async fn get_earnings(
        &self,
        request: &CorporateActionsRequest,
    ) -> Result<ProviderResponse<Vec<Earnings>>, MarketDataError> {
        self.execute_with_fallback(Operation::Earnings, request, |provider| async move {
            provider.get_earnings(request).await
        })
        .await
    }

    pub async fn get_news(
        &self,
        request: &NewsRequest,
    ) -> Result<ProviderResponse<Vec<NewsItem>>, MarketDataError> {
        self.execute_with_fallback(Operation::News, request, |provider| async move {
            provider.get_news(request).await
        })
        .await
    }

    pub async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<ProviderResponse<Vec<SearchResult>>, MarketDataError> {
        self.execute_with_fallback(Operation::Search, request, |provider| async move {
            provider.search(request).await
        })
        .await
    }

    // ------------------------------------------------------------------
    // Health, cache and lifecycle
    // ------------------------------------------------------------------

    /// Snapshot of every registered provider's health.
    pub fn get_provider_health(&self) -> BTreeMap<String, ProviderHealth> {
        self.state.health.snapshot()
    }

    /// Probe every provider now, each in its own task.
    ///
    /// A failing or panicking probe marks only its own provider unhealthy.
    pub async fn check_all_providers_health(&self) -> BTreeMap<String, bool> {
        self.state.check_all_providers_health().await
    }

    pub fn get_cache_stats(&self) -> CacheStats {
        self.state.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.state.cache.clear();
        debug!("Response cache cleared");
    }

    /// Evict expired cache entries, returning how many were removed.
    pub fn clear_expired(&self) -> usize {
        self.state.cache.clear_expired()
    }

    /// True while the periodic health monitor is running.
    pub fn is_monitoring(&self) -> bool {
        self.lock_monitor()
            .as_ref()
            .is_some_and(HealthMonitor::is_running)
    }

    /// Stop the health monitor and clear the cache. Safe to call repeatedly.
    pub fn destroy(&self) {
        if let Some(monitor) = self.lock_monitor().take() {
            monitor.stop();
            info!("Health monitor stopped");
        }
        self.state.cache.clear();
    }
}
