// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory profile store with write-failure injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use questline_core::{
    AdapterType, HealthStatus, PluginAdapter, ProfileStoreAdapter, QuestlineError, RewardProfile,
    WalletAddress,
};

/// Profile rows kept in a map. Writes can be made to fail on demand.
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<WalletAddress, RewardProfile>>,
    failing_writes: AtomicU32,
    write_attempts: AtomicUsize,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self {
            profiles: Mutex::new(HashMap::new()),
            failing_writes: AtomicU32::new(0),
            write_attempts: AtomicUsize::new(0),
        }
    }

    /// Seed a stored row.
    pub async fn insert(&self, profile: RewardProfile) {
        self.profiles
            .lock()
            .await
            .insert(profile.address.clone(), profile);
    }

    /// Fail the next `count` writes. `u32::MAX` fails every write.
    pub fn fail_next_writes(&self, count: u32) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Writes attempted so far, failed ones included.
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    pub async fn stored(&self, address: &WalletAddress) -> Option<RewardProfile> {
        self.profiles.lock().await.get(address).cloned()
    }

    fn take_failure(&self) -> bool {
        self.failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
                0 => None,
                u32::MAX => Some(u32::MAX),
                n => Some(n - 1),
            })
            .is_ok()
    }
}

impl Default for MemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MemoryProfileStore {
    fn name(&self) -> &str {
        "memory-profile-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ProfileStore
    }

    async fn health_check(&self) -> Result<HealthStatus, QuestlineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), QuestlineError> {
        Ok(())
    }
}

#[async_trait]
impl ProfileStoreAdapter for MemoryProfileStore {
    async fn initialize(&self) -> Result<(), QuestlineError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), QuestlineError> {
        Ok(())
    }

    async fn get_profile(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<RewardProfile>, QuestlineError> {
        Ok(self.profiles.lock().await.get(address).cloned())
    }

    async fn get_or_create_profile(
        &self,
        address: &WalletAddress,
    ) -> Result<RewardProfile, QuestlineError> {
        Ok(self
            .profiles
            .lock()
            .await
            .entry(address.clone())
            .or_insert_with(|| RewardProfile::new(address.clone()))
            .clone())
    }

    async fn update_profile(&self, profile: &RewardProfile) -> Result<(), QuestlineError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.take_failure() {
            tracing::debug!(address = %profile.address, "memory store failing write on request");
            return Err(QuestlineError::BackendWrite {
                message: format!("injected write failure for {}", profile.address),
                source: None,
            });
        }
        tracing::debug!(address = %profile.address, xp = profile.xp, "memory store write");
        self.insert(profile.clone()).await;
        Ok(())
    }
}
