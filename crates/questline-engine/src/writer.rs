// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialized profile writes with bounded retry and degradation alerts.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use questline_bus::{EngineEvent, EventBus, StatusNotice};
use questline_config::model::BackendConfig;
use questline_core::{ProfileStoreAdapter, QuestlineError, RewardProfile};
use questline_resilience::{FailureTracker, RetryPolicy, Transition, retry};

use crate::cache::OptimisticCache;

/// Mirrors the cached profile to the profile store.
///
/// Writes are serialized and always carry the cache projection at the moment
/// the write lock is taken, so a late writer never restores stale values.
/// The lock also guards the last projection known to be stored.
pub struct BackendWriter {
    store: Arc<dyn ProfileStoreAdapter>,
    stored: Mutex<Option<RewardProfile>>,
    policy: RetryPolicy,
    tracker: FailureTracker,
    bus: EventBus,
}

impl BackendWriter {
    pub fn new(store: Arc<dyn ProfileStoreAdapter>, config: &BackendConfig, bus: EventBus) -> Self {
        Self {
            store,
            stored: Mutex::new(None),
            policy: RetryPolicy::new(
                config.write_attempts,
                Duration::from_millis(config.retry_delay_ms),
            ),
            tracker: FailureTracker::new("profile store", config.alert_threshold),
            bus,
        }
    }

    /// Writes the current profile. Failures are reported on the bus, never
    /// returned. Returns whether the write landed.
    pub async fn persist(&self, cache: &OptimisticCache) -> bool {
        let mut stored = self.stored.lock().await;
        let Some(profile) = cache.snapshot().profile else {
            debug!("no profile loaded, skipping store write");
            return false;
        };
        self.write(&mut stored, profile).await.is_ok()
    }

    /// Records the cached profile as already stored, after it was loaded
    /// from the store.
    pub async fn mark_stored(&self, cache: &OptimisticCache) {
        *self.stored.lock().await = cache.snapshot().profile;
    }

    /// Runs `read` with writes held off. A cached projection that has not
    /// landed yet is written first, so `read` never sees a store older than
    /// the cache. Nothing is read when that write fails.
    pub async fn read_through<T, F, Fut>(
        &self,
        cache: &OptimisticCache,
        read: F,
    ) -> Result<T, QuestlineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, QuestlineError>>,
    {
        let mut stored = self.stored.lock().await;
        if let Some(profile) = cache.snapshot().profile
            && stored.as_ref() != Some(&profile)
        {
            debug!(address = %profile.address, "landing cached profile before store read");
            self.write(&mut stored, profile).await?;
        }
        read().await
    }

    async fn write(
        &self,
        stored: &mut Option<RewardProfile>,
        profile: RewardProfile,
    ) -> Result<(), QuestlineError> {
        let store = &self.store;
        let snapshot = &profile;
        let result = retry(
            self.policy,
            "profile write",
            move |_attempt| store.update_profile(snapshot),
            |_| true,
        )
        .await;

        match result {
            Ok(()) => {
                debug!(address = %profile.address, xp = profile.xp, "profile stored");
                if self.tracker.record_success() == Transition::Recovered {
                    self.bus.publish(EngineEvent::BackendRecovered);
                }
                *stored = Some(profile);
                Ok(())
            }
            Err(e) => {
                warn!(address = %profile.address, error = %e, "profile write gave up");
                if let Transition::Degraded {
                    consecutive_failures,
                } = self.tracker.record_failure()
                {
                    self.bus.publish(EngineEvent::BackendDegraded {
                        consecutive_failures,
                        message: e.to_string(),
                    });
                    self.bus.notify(StatusNotice::error(
                        "Progress could not be saved. It will be retried with your next action.",
                    ));
                }
                Err(e)
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.tracker.is_degraded()
    }
}
