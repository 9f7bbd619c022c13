//! Periodic background health checks.

use std::sync::Weak;
use std::time::Duration;

use log::{debug, info};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::provider_manager::ManagerState;

/// Owned handle to the recurring health-check task.
///
/// The task is aborted when the monitor is stopped or dropped.
pub(crate) struct HealthMonitor {
    handle: JoinHandle<()>,
}

impl HealthMonitor {
    /// Spawn the recurring check on the current Tokio runtime.
    ///
    /// Returns `None` when called outside a runtime. The first check runs
    /// one full `interval` after spawning. The task holds only a weak
    /// reference and exits once the manager state is gone.
    pub(crate) fn spawn(state: Weak<ManagerState>, interval: Duration) -> Option<Self> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                debug!("No Tokio runtime available, periodic health checks disabled");
                return None;
            }
        };

        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(state) = state.upgrade() else {
                    break;
                };
                let results = state.check_all_providers_health().await;
                let unhealthy: Vec<&str> = results
                    .iter()
                    .filter(|(_, healthy)| !**healthy)
                    .map(|(name, _)| name.as_str())
                    .collect();
                debug!(
                    "Periodic health check: {} providers, unhealthy: {:?}",
                    results.len(),
                    unhealthy
                );
            }
        });

        info!("Health monitor started ({:?} interval)", interval);
        Some(Self { handle })
    }

    pub(crate) fn stop(&self) {
        self.handle.abort();
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
