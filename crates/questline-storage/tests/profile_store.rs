// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Profile store integration tests against an on-disk database.

use questline_config::model::StorageConfig;
use questline_core::{BadgeId, MissionId, PluginAdapter, ProfileStoreAdapter, WalletAddress};
use questline_storage::SqliteProfileStore;

fn store_at(path: &std::path::Path) -> SqliteProfileStore {
    SqliteProfileStore::new(StorageConfig {
        database_path: path.to_str().unwrap().to_string(),
        wal_mode: true,
    })
}

#[tokio::test]
async fn profiles_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profiles.db");
    let address = WalletAddress("SP000000000000000000002Q6VF78".into());

    {
        let store = store_at(&path);
        store.initialize().await.unwrap();
        let mut profile = store.get_or_create_profile(&address).await.unwrap();
        profile.xp = 150;
        profile.completed_missions.insert(MissionId(1));
        profile.badges.insert(BadgeId("genesis".into()));
        store.update_profile(&profile).await.unwrap();
        store.close().await.unwrap();
        store.shutdown().await.unwrap();
    }

    let store = store_at(&path);
    store.initialize().await.unwrap();
    let profile = store.get_profile(&address).await.unwrap().unwrap();
    assert_eq!(profile.xp, 150);
    assert!(profile.completed_missions.contains(&MissionId(1)));
    assert!(profile.badges.contains(&BadgeId("genesis".into())));
}

#[tokio::test]
async fn concurrent_writers_are_serialized() {
    let dir = tempfile::tempdir().unwrap();
    let store = std::sync::Arc::new(store_at(&dir.path().join("concurrent.db")));
    store.initialize().await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8u32 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let address = WalletAddress(format!("user-{i}"));
            let mut profile = store.get_or_create_profile(&address).await.unwrap();
            profile.xp = u64::from(i) * 10;
            store.update_profile(&profile).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for i in 0..8u32 {
        let profile = store
            .get_profile(&WalletAddress(format!("user-{i}")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.xp, u64::from(i) * 10);
    }
}
