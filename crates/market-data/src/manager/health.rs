//! Per-provider health tracking.
//!
//! Health is a single flag per registered provider. It starts healthy at
//! registration and only changes when a fetch or probe explicitly updates it.
//! Updates for providers that are no longer registered are ignored, so a
//! late probe never resurrects an entry.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

/// Health state of one provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHealth {
    pub healthy: bool,
    pub last_check: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ProviderHealth {
    fn healthy_now() -> Self {
        Self {
            healthy: true,
            last_check: Utc::now(),
            last_error: None,
        }
    }
}

/// Thread-safe map of provider name to health.
#[derive(Default)]
pub struct HealthTracker {
    entries: Mutex<HashMap<String, ProviderHealth>>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the health map, recovering from poison if necessary.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, ProviderHealth>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Health tracker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Start tracking `provider` as healthy, replacing any previous state.
    pub fn register(&self, provider: &str) {
        self.lock_entries()
            .insert(provider.to_string(), ProviderHealth::healthy_now());
    }

    pub fn remove(&self, provider: &str) -> bool {
        self.lock_entries().remove(provider).is_some()
    }

    /// Tracked health; untracked providers are treated as healthy.
    pub fn is_healthy(&self, provider: &str) -> bool {
        self.lock_entries()
            .get(provider)
            .map_or(true, |h| h.healthy)
    }

    pub fn get(&self, provider: &str) -> Option<ProviderHealth> {
        self.lock_entries().get(provider).cloned()
    }

    pub fn mark_healthy(&self, provider: &str) {
        self.update(provider, true, None);
    }

    pub fn mark_unhealthy(&self, provider: &str, reason: impl Into<String>) {
        self.update(provider, false, Some(reason.into()));
    }

    /// Record a check result. Returns false when `provider` isn't tracked.
    pub fn update(&self, provider: &str, healthy: bool, error: Option<String>) -> bool {
        let mut entries = self.lock_entries();
        let Some(entry) = entries.get_mut(provider) else {
            return false;
        };

        if entry.healthy != healthy {
            if healthy {
                info!("Provider '{}' recovered", provider);
            } else {
                warn!(
                    "Provider '{}' marked unhealthy: {}",
                    provider,
                    error.as_deref().unwrap_or("health check failed")
                );
            }
        }

        entry.healthy = healthy;
        entry.last_check = Utc::now();
        entry.last_error = error;
        true
    }

    /// Point-in-time copy, ordered by provider name.
    pub fn snapshot(&self) -> BTreeMap<String, ProviderHealth> {
        self.lock_entries()
            .iter()
            .map(|(name, health)| (name.clone(), health.clone()))
            .collect()
    }
}
