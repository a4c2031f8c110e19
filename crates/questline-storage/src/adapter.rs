// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`ProfileStoreAdapter`] trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use questline_config::model::StorageConfig;
use questline_core::{
    AdapterType, HealthStatus, PluginAdapter, ProfileStoreAdapter, QuestlineError,
    RewardProfile, WalletAddress,
};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// SQLite-backed profile store.
///
/// The database is opened lazily by [`ProfileStoreAdapter::initialize`].
pub struct SqliteProfileStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteProfileStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, QuestlineError> {
        self.db.get().ok_or_else(|| QuestlineError::Storage {
            source: "profile store not initialized, call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteProfileStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ProfileStore
    }

    async fn health_check(&self) -> Result<HealthStatus, QuestlineError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), QuestlineError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStoreAdapter for SqliteProfileStore {
    async fn initialize(&self) -> Result<(), QuestlineError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| QuestlineError::Storage {
            source: "profile store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite profile store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), QuestlineError> {
        self.db()?.checkpoint().await
    }

    async fn get_profile(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<RewardProfile>, QuestlineError> {
        queries::profiles::get_profile(self.db()?, address).await
    }

    async fn get_or_create_profile(
        &self,
        address: &WalletAddress,
    ) -> Result<RewardProfile, QuestlineError> {
        queries::profiles::get_or_create_profile(self.db()?, address).await
    }

    async fn update_profile(&self, profile: &RewardProfile) -> Result<(), QuestlineError> {
        queries::profiles::upsert_profile(self.db()?, profile).await
    }
}
