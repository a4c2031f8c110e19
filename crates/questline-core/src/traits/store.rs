// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Profile store trait for the off-chain reward profile mirror.

use async_trait::async_trait;

use crate::error::QuestlineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{RewardProfile, WalletAddress};

/// Persistence backend for [`RewardProfile`] rows keyed by wallet address.
#[async_trait]
pub trait ProfileStoreAdapter: PluginAdapter {
    /// Initializes the backend (migrations, connections).
    async fn initialize(&self) -> Result<(), QuestlineError>;

    /// Flushes pending writes and releases connections.
    async fn close(&self) -> Result<(), QuestlineError>;

    async fn get_profile(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<RewardProfile>, QuestlineError>;

    /// Inserts a default profile when absent and returns the stored row.
    async fn get_or_create_profile(
        &self,
        address: &WalletAddress,
    ) -> Result<RewardProfile, QuestlineError>;

    /// Overwrites the stored row with `profile`.
    async fn update_profile(&self, profile: &RewardProfile) -> Result<(), QuestlineError>;
}
