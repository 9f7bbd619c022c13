//! End-to-end fallback, caching and health scenarios against scripted providers.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{config, manager_with, quotes, MockProvider, Outcome, Probe};
use quoteline_market_data::{
    CompanyProfileRequest, ManagerConfig, MarketDataError, MarketDataProvider, NewsRequest,
    Operation, ProviderCapabilities, ProviderManager, SearchRequest,
};

// =============================================================================
// Fallback
// =============================================================================

#[tokio::test]
async fn test_first_provider_that_can_serve_wins() {
    let p1 = MockProvider::new("p1").always(Outcome::AuthFailed).arc();
    let p2 = MockProvider::new("p2").always(Outcome::RateLimited).arc();
    let p3 = MockProvider::new("p3").arc();
    let manager = manager_with(config("p1", &["p2", "p3"]), &[p1.clone(), p2.clone(), p3.clone()]);

    let response = manager.get_quotes(&quotes(&["aapl"])).await.unwrap();

    assert_eq!(response.source, "p3");
    assert!(!response.cached);
    assert_eq!(response.data[0].symbol, "AAPL");
    assert_eq!((p1.calls(), p2.calls(), p3.calls()), (1, 1, 1));

    // Neither credentials nor throttling mark a provider unhealthy.
    let health = manager.get_provider_health();
    assert!(health["p1"].healthy);
    assert!(health["p2"].healthy);
}

#[tokio::test]
async fn test_unavailable_primary_falls_back_then_serves_from_cache() {
    let p1 = MockProvider::new("p1").always(Outcome::Unavailable).arc();
    let p2 = MockProvider::new("p2").arc();
    let manager = manager_with(config("p1", &["p2"]), &[p1.clone(), p2.clone()]);
    let request = quotes(&["MSFT"]);

    let first = manager.get_quotes(&request).await.unwrap();
    assert_eq!(first.source, "p2");
    assert!(!first.cached);

    let second = manager.get_quotes(&request).await.unwrap();
    assert!(second.cached);
    assert_eq!(second.source, "p2");
    assert_eq!(second.data, first.data);

    assert_eq!(p1.calls(), 1);
    assert_eq!(p2.calls(), 1);

    let health = manager.get_provider_health();
    assert!(!health["p1"].healthy);
    assert!(health["p1"].last_error.as_deref().unwrap().contains("503"));
}

#[tokio::test]
async fn test_unavailable_provider_is_skipped_on_next_call() {
    let p1 = MockProvider::new("p1").always(Outcome::Unavailable).arc();
    let p2 = MockProvider::new("p2").arc();
    let manager = manager_with(
        config("p1", &["p2"]).with_caching(false),
        &[p1.clone(), p2.clone()],
    );

    manager.get_quotes(&quotes(&["AAPL"])).await.unwrap();
    manager.get_quotes(&quotes(&["AAPL"])).await.unwrap();

    assert_eq!(p1.calls(), 1);
    assert_eq!(p2.calls(), 2);
}

#[tokio::test]
async fn test_rate_limited_provider_stays_eligible() {
    let p1 = MockProvider::new("p1").always(Outcome::RateLimited).arc();
    let p2 = MockProvider::new("p2").arc();
    let manager = manager_with(
        config("p1", &["p2"]).with_caching(false),
        &[p1.clone(), p2.clone()],
    );

    manager.get_quotes(&quotes(&["AAPL"])).await.unwrap();
    manager.get_quotes(&quotes(&["AAPL"])).await.unwrap();

    assert_eq!(p1.calls(), 2);
    assert!(manager.get_provider_health()["p1"].healthy);
}

#[tokio::test]
async fn test_fallbacks_are_ordered_by_priority() {
    let p1 = MockProvider::new("p1").always(Outcome::InvalidSymbol).arc();
    let p2 = MockProvider::new("p2")
        .with_priority(1)
        .always(Outcome::InvalidSymbol)
        .arc();
    let p3 = MockProvider::new("p3").with_priority(5).arc();
    let manager = manager_with(
        config("p1", &["p3", "p2", "ghost"]),
        &[p1.clone(), p2.clone(), p3.clone()],
    );

    assert_eq!(manager.provider_order(), vec!["p1", "p2", "p3"]);

    let response = manager.get_quotes(&quotes(&["AAPL"])).await.unwrap();
    assert_eq!(response.source, "p3");
    assert_eq!((p1.calls(), p2.calls(), p3.calls()), (1, 1, 1));
}

#[tokio::test]
async fn test_primary_is_never_reordered_by_priority() {
    let p1 = MockProvider::new("p1").with_priority(50).arc();
    let p2 = MockProvider::new("p2").with_priority(0).arc();
    let manager = manager_with(config("p1", &["p2", "p1"]), &[p1, p2]);

    assert_eq!(manager.provider_order(), vec!["p1", "p2"]);
}

#[tokio::test]
async fn test_fallback_disabled_only_tries_primary_even_when_unhealthy() {
    let p1 = MockProvider::new("p1")
        .with_script([Outcome::Unavailable])
        .arc();
    let p2 = MockProvider::new("p2").arc();
    let manager = manager_with(
        config("p1", &["p2"])
            .with_fallback_enabled(false)
            .with_caching(false),
        &[p1.clone(), p2.clone()],
    );

    let err = manager.get_quotes(&quotes(&["AAPL"])).await.unwrap_err();
    assert_eq!(err.code(), "PROVIDER_UNAVAILABLE");
    assert!(!manager.get_provider_health()["p1"].healthy);

    let response = manager.get_quotes(&quotes(&["AAPL"])).await.unwrap();
    assert_eq!(response.source, "p1");
    assert_eq!(p1.calls(), 2);
    assert_eq!(p2.calls(), 0);
    assert!(manager.get_provider_health()["p1"].healthy);
}

#[tokio::test]
async fn test_missing_capability_fails_without_calling_anyone() {
    let p1 = MockProvider::new("p1")
        .with_capabilities(ProviderCapabilities::all_operations().with(Operation::News, false))
        .arc();
    let manager = manager_with(config("p1", &[]), &[p1.clone()]);

    let err = manager.get_news(&NewsRequest::general()).await.unwrap_err();

    assert!(matches!(err, MarketDataError::AllProvidersFailed { .. }));
    assert_eq!(err.code(), "ALL_PROVIDERS_FAILED");
    assert_eq!(p1.calls(), 0);
}

#[tokio::test]
async fn test_exhausted_chain_returns_last_error() {
    let p1 = MockProvider::new("p1").always(Outcome::RateLimited).arc();
    let p2 = MockProvider::new("p2").always(Outcome::InvalidSymbol).arc();
    let manager = manager_with(config("p1", &["p2"]), &[p1, p2]);

    let err = manager.get_quotes(&quotes(&["ZZZZ"])).await.unwrap_err();

    assert_eq!(err.code(), "INVALID_SYMBOL");
    assert_eq!(err.provider(), Some("p2"));
}

#[tokio::test]
async fn test_no_registered_providers_fails_cleanly() {
    let manager = ProviderManager::new(config("p1", &["p2"])).unwrap();

    let err = manager.get_quotes(&quotes(&["AAPL"])).await.unwrap_err();
    assert_eq!(err.code(), "ALL_PROVIDERS_FAILED");
}

#[tokio::test(start_paused = true)]
async fn test_deadline_bounds_the_whole_pass() {
    let p1 = MockProvider::new("p1")
        .always(Outcome::Delay(Duration::from_secs(5)))
        .arc();
    let manager = manager_with(
        config("p1", &[]).with_fallback_deadline_ms(100),
        &[p1.clone()],
    );

    let err = manager.get_quotes(&quotes(&["AAPL"])).await.unwrap_err();

    match err {
        MarketDataError::DeadlineExceeded {
            operation,
            elapsed_ms,
        } => {
            assert_eq!(operation, "get_quotes");
            assert!(elapsed_ms >= 100);
        }
        other => panic!("expected deadline error, got {:?}", other),
    }
    assert_eq!(manager.get_cache_stats().size, 0);
}

// =============================================================================
// Caching
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_expired_entries_refresh_through_providers() {
    let p1 = MockProvider::new("p1").arc();
    let manager = manager_with(config("p1", &[]).with_cache_ttl_seconds(60), &[p1.clone()]);
    let request = quotes(&["AAPL"]);

    manager.get_quotes(&request).await.unwrap();
    tokio::time::advance(Duration::from_secs(30)).await;
    assert!(manager.get_quotes(&request).await.unwrap().cached);
    assert_eq!(p1.calls(), 1);

    tokio::time::advance(Duration::from_secs(31)).await;
    let refreshed = manager.get_quotes(&request).await.unwrap();
    assert!(!refreshed.cached);
    assert_eq!(p1.calls(), 2);
}

#[tokio::test]
async fn test_cache_keys_separate_operations_and_requests() {
    let p1 = MockProvider::new("p1").arc();
    let manager = manager_with(config("p1", &[]), &[p1.clone()]);

    manager.get_quotes(&quotes(&["AAPL"])).await.unwrap();
    manager.get_quotes(&quotes(&["MSFT"])).await.unwrap();
    manager
        .get_company_profile(&CompanyProfileRequest::new("AAPL").unwrap())
        .await
        .unwrap();
    // Same symbols, different spelling: normalized to the same key.
    manager.get_quotes(&quotes(&[" aapl "])).await.unwrap();

    let stats = manager.get_cache_stats();
    assert_eq!(stats.size, 3);
    assert_eq!(stats.hits, 1);
    assert_eq!(p1.calls(), 3);
    assert!(stats.keys.iter().any(|k| k.starts_with("get_company_profile:")));

    manager.clear_cache();
    assert_eq!(manager.get_cache_stats().size, 0);
    assert!(!manager.get_quotes(&quotes(&["AAPL"])).await.unwrap().cached);
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let p1 = MockProvider::new("p1")
        .with_script([Outcome::InvalidSymbol])
        .arc();
    let manager = manager_with(config("p1", &[]), &[p1.clone()]);

    assert!(manager.get_quotes(&quotes(&["AAPL"])).await.is_err());
    assert_eq!(manager.get_cache_stats().size, 0);

    let response = manager.get_quotes(&quotes(&["AAPL"])).await.unwrap();
    assert!(!response.cached);
    assert_eq!(p1.calls(), 2);
}

// =============================================================================
// Registry and health
// =============================================================================

#[tokio::test]
async fn test_nameless_provider_is_rejected() {
    let manager = ProviderManager::new(config("p1", &[])).unwrap();

    let err = manager
        .register_provider(MockProvider::new("").arc())
        .unwrap_err();

    assert_eq!(err.code(), "INVALID_CONFIGURATION");
    assert!(manager.provider_names().is_empty());
    assert!(manager.get_provider_health().is_empty());
}

#[tokio::test]
async fn test_unregister_drops_provider_and_health() {
    let p1 = MockProvider::new("p1").arc();
    let p2 = MockProvider::new("p2").arc();
    let manager = manager_with(config("p1", &["p2"]), &[p1, p2]);

    assert!(manager.unregister_provider("p2"));
    assert!(!manager.unregister_provider("p2"));
    assert_eq!(manager.provider_names(), vec!["p1"]);
    assert!(!manager.get_provider_health().contains_key("p2"));
}

#[tokio::test]
async fn test_health_probes_are_isolated() {
    let healthy = MockProvider::new("healthy").arc();
    let down = MockProvider::new("down").with_probe(Probe::Unhealthy).arc();
    let erroring = MockProvider::new("erroring").with_probe(Probe::Error).arc();
    let panicking = MockProvider::new("panicking").with_probe(Probe::Panic).arc();
    let manager = manager_with(
        config("healthy", &["down", "erroring", "panicking"]),
        &[healthy, down, erroring, panicking],
    );

    let results = manager.check_all_providers_health().await;

    assert_eq!(results.len(), 4);
    assert!(results["healthy"]);
    assert!(!results["down"]);
    assert!(!results["erroring"]);
    assert!(!results["panicking"]);

    let health = manager.get_provider_health();
    assert!(health["healthy"].healthy);
    assert_eq!(
        health["panicking"].last_error.as_deref(),
        Some("health probe panicked")
    );
    assert!(health["erroring"]
        .last_error
        .as_deref()
        .unwrap()
        .contains("unavailable"));
}

#[tokio::test]
async fn test_probe_recovery_restores_eligibility() {
    let p1 = MockProvider::new("p1")
        .with_script([Outcome::Unavailable])
        .arc();
    let p2 = MockProvider::new("p2").arc();
    let manager = manager_with(
        config("p1", &["p2"]).with_caching(false),
        &[p1.clone(), p2.clone()],
    );

    assert_eq!(manager.get_quotes(&quotes(&["AAPL"])).await.unwrap().source, "p2");
    assert!(!manager.get_provider_health()["p1"].healthy);

    manager.check_all_providers_health().await;
    assert_eq!(manager.get_quotes(&quotes(&["AAPL"])).await.unwrap().source, "p1");
}

#[tokio::test(start_paused = true)]
async fn test_monitor_runs_periodically_until_destroyed() {
    let p1 = MockProvider::new("p1").with_probe(Probe::Unhealthy).arc();
    let manager = manager_with(
        ManagerConfig::new("p1").with_health_check_interval_ms(1_000),
        &[p1],
    );
    assert!(manager.is_monitoring());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(manager.get_provider_health()["p1"].healthy);

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert!(!manager.get_provider_health()["p1"].healthy);

    manager.destroy();
    assert!(!manager.is_monitoring());

    manager.destroy();
    assert!(!manager.is_monitoring());
}

#[tokio::test(start_paused = true)]
async fn test_monitor_survives_a_panicking_check() {
    let flaky = MockProvider::new("flaky")
        .with_probe_script([Probe::Unhealthy])
        .arc();
    let broken = MockProvider::new("broken").with_probe(Probe::Panic).arc();
    let manager = manager_with(
        ManagerConfig::new("flaky")
            .with_fallbacks(["broken"])
            .with_health_check_interval_ms(1_000),
        &[flaky, broken],
    );

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    let health = manager.get_provider_health();
    assert!(!health["flaky"].healthy);
    assert_eq!(
        health["broken"].last_error.as_deref(),
        Some("health probe panicked")
    );
    assert!(manager.is_monitoring());

    // Second tick still runs and picks up the recovery.
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert!(manager.get_provider_health()["flaky"].healthy);
    assert!(!manager.get_provider_health()["broken"].healthy);
    assert!(manager.is_monitoring());

    manager.destroy();
}

#[tokio::test(start_paused = true)]
async fn test_slow_health_check_does_not_hold_back_others() {
    let slow = MockProvider::new("slow")
        .with_probe(Probe::Delay(Duration::from_secs(5)))
        .arc();
    let fast = MockProvider::new("fast").with_probe(Probe::Unhealthy).arc();
    let manager = Arc::new(manager_with(config("slow", &["fast"]), &[slow, fast]));

    let pending = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.check_all_providers_health().await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!pending.is_finished());
    let health = manager.get_provider_health();
    assert!(!health["fast"].healthy);
    assert_eq!(
        health["fast"].last_error.as_deref(),
        Some("health check failed")
    );
    assert!(health["slow"].healthy);
    assert!(health["slow"].last_error.is_none());

    tokio::time::sleep(Duration::from_secs(5)).await;
    let results = pending.await.unwrap();
    assert!(results["slow"]);
    assert!(!results["fast"]);
}

#[tokio::test]
async fn test_provider_rejects_unsupported_operation_before_any_work() {
    let p1 = MockProvider::new("p1")
        .with_capabilities(ProviderCapabilities::all_operations().with(Operation::Search, false))
        .arc();

    let err = p1
        .search(&SearchRequest::new("apple").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "CAPABILITY_NOT_SUPPORTED");
    assert_eq!(err.provider(), Some("p1"));
    assert_eq!(p1.calls(), 0);
    assert!(p1.get_news(&NewsRequest::general()).await.is_ok());
    assert_eq!(p1.calls(), 1);
}

#[test]
fn test_no_monitor_without_runtime() {
    let manager = ProviderManager::new(ManagerConfig::new("p1")).unwrap();
    assert!(!manager.is_monitoring());
}

#[tokio::test]
async fn test_registered_provider_is_reachable_by_name() {
    let p1 = MockProvider::new("p1").with_priority(3).arc();
    let manager = manager_with(config("p1", &[]), &[p1]);

    let provider: Arc<dyn MarketDataProvider> = manager.provider("p1").unwrap();
    assert_eq!(provider.config().effective_priority(), 3);
    assert!(manager.provider("p9").is_none());
}
