//! Provider manager module.
//!
//! This module provides orchestration over registered providers, including:
//! - Provider registration and priority ordering
//! - Sequential fallback across providers
//! - TTL response caching
//! - Health tracking and periodic health checks

mod cache;
mod config;
mod diagnostics;
mod health;
mod monitor;
mod provider_manager;

pub use cache::{cache_key, CacheEntry, CacheStats, ResponseCache};
pub use config::{
    ManagerConfig, DEFAULT_CACHE_TTL_SECONDS, DEFAULT_HEALTH_CHECK_INTERVAL_MS,
    DEFAULT_MAX_RETRIES,
};
pub use diagnostics::{FetchDiagnostics, ProviderAttempt, SkipReason};
pub use health::{HealthTracker, ProviderHealth};
pub use provider_manager::ProviderManager;
