// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authoritative reconciler.
//!
//! Reads every field group from the source the [`AuthorityPolicy`] names and
//! overwrites the cache with whatever it finds. Reads that fail are reported
//! and leave their fields untouched; the rest of the pass still applies.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use questline_config::model::{AuthorityPolicy, EntityQueryConfig, FieldAuthority, QueryStyle};
use questline_core::{
    BadgeId, ChainReadAdapter, ClarityValue, ContractId, MissionId, ProfileStoreAdapter,
    QuestlineError, RewardProfile, WalletAddress,
};

use crate::cache::OptimisticCache;
use crate::catalog::Catalog;
use crate::contracts::ContractRegistry;

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Fields whose cached value was replaced.
    pub corrected: Vec<String>,
    /// Reads that failed; their fields kept the cached value.
    pub failures: Vec<String>,
}

/// Authoritative values collected before the cache is touched.
#[derive(Debug, Default)]
struct Readings {
    xp: Option<u64>,
    last_checkin: Option<Option<DateTime<Utc>>>,
    missions: Vec<(MissionId, bool)>,
    badges: Vec<(BadgeId, bool)>,
    poin: Option<u128>,
    one: Option<u128>,
    tip_height: Option<u64>,
}

pub struct Reconciler {
    chain: Arc<dyn ChainReadAdapter>,
    store: Arc<dyn ProfileStoreAdapter>,
    registry: Arc<ContractRegistry>,
    catalog: Arc<Catalog>,
    policy: AuthorityPolicy,
}

impl Reconciler {
    pub fn new(
        chain: Arc<dyn ChainReadAdapter>,
        store: Arc<dyn ProfileStoreAdapter>,
        registry: Arc<ContractRegistry>,
        catalog: Arc<Catalog>,
        policy: AuthorityPolicy,
    ) -> Self {
        Self {
            chain,
            store,
            registry,
            catalog,
            policy,
        }
    }

    pub fn policy(&self) -> &AuthorityPolicy {
        &self.policy
    }

    /// Whether any profile field is sourced from the profile store.
    pub fn reads_store(&self) -> bool {
        [
            self.policy.experience,
            self.policy.missions,
            self.policy.badges,
        ]
        .contains(&FieldAuthority::Backend)
    }

    /// Re-reads authoritative state for `address` and overwrites the cache.
    pub async fn reconcile(
        &self,
        address: &WalletAddress,
        cache: &OptimisticCache,
    ) -> Result<ReconcileReport, QuestlineError> {
        let principal = ClarityValue::principal(&address.0)?;
        let mut failures = Vec::new();
        let mut readings = Readings::default();

        let stored = if self.reads_store() {
            match self.store.get_profile(address).await {
                Ok(profile) => profile,
                Err(e) => {
                    warn!(address = %address, error = %e, "profile store read failed");
                    failures.push(format!("profile store: {e}"));
                    None
                }
            }
        } else {
            None
        };

        if self.policy.experience == FieldAuthority::Backend
            && let Some(stored) = &stored
        {
            readings.xp = Some(stored.xp);
            readings.last_checkin = Some(stored.last_checkin);
        }

        match self.policy.missions {
            FieldAuthority::Chain => {
                for mission in self.catalog.missions() {
                    let key = ClarityValue::UInt(u128::from(mission.id.0));
                    match self
                        .owns(
                            &self.registry.missions_query,
                            &self.registry.rewards,
                            address,
                            &principal,
                            key,
                        )
                        .await
                    {
                        Ok(done) => readings.missions.push((mission.id, done)),
                        Err(e) => failures.push(format!("mission {}: {e}", mission.id)),
                    }
                }
            }
            FieldAuthority::Backend => {
                if let Some(stored) = &stored {
                    readings.missions = self
                        .catalog
                        .missions()
                        .map(|m| (m.id, stored.completed_missions.contains(&m.id)))
                        .collect();
                }
            }
            FieldAuthority::Local => {}
        }

        match self.policy.badges {
            FieldAuthority::Chain => {
                for badge in self.catalog.badges() {
                    let result = match ClarityValue::string_ascii(&badge.id.0) {
                        Ok(key) => {
                            self.owns(
                                &self.registry.badges_query,
                                &self.registry.badges,
                                address,
                                &principal,
                                key,
                            )
                            .await
                        }
                        Err(e) => Err(e),
                    };
                    match result {
                        Ok(owned) => readings.badges.push((badge.id.clone(), owned)),
                        Err(e) => failures.push(format!("badge {}: {e}", badge.id)),
                    }
                }
            }
            FieldAuthority::Backend => {
                if let Some(stored) = &stored {
                    readings.badges = self
                        .catalog
                        .badges()
                        .map(|b| (b.id.clone(), stored.badges.contains(&b.id)))
                        .collect();
                }
            }
            FieldAuthority::Local => {}
        }

        if self.policy.balances == FieldAuthority::Chain {
            match self.balance(&self.registry.token_poin, address, &principal).await {
                Ok(amount) => readings.poin = Some(amount),
                Err(e) => failures.push(format!("poin balance: {e}")),
            }
            match self.balance(&self.registry.token_one, address, &principal).await {
                Ok(amount) => readings.one = Some(amount),
                Err(e) => failures.push(format!("one balance: {e}")),
            }
            match self.chain.tip_height().await {
                Ok(height) => readings.tip_height = Some(height),
                Err(e) => failures.push(format!("tip height: {e}")),
            }
        }

        let corrected = apply(cache, address, readings);
        for failure in &failures {
            debug!(address = %address, %failure, "reconcile read failed");
        }
        if !corrected.is_empty() {
            info!(address = %address, corrected = ?corrected, "cache corrected from authoritative state");
        }
        Ok(ReconcileReport {
            corrected,
            failures,
        })
    }

    /// One presence flag, read the way `query` prescribes.
    async fn owns(
        &self,
        query: &EntityQueryConfig,
        contract: &ContractId,
        address: &WalletAddress,
        principal: &ClarityValue,
        key: ClarityValue,
    ) -> Result<bool, QuestlineError> {
        let value = match query.style {
            QueryStyle::MapEntry => {
                let tuple = ClarityValue::tuple([
                    (query.user_field.as_str(), principal.clone()),
                    (query.key_field.as_str(), key),
                ]);
                self.chain.map_entry(contract, &query.map, &tuple).await?
            }
            QueryStyle::ReadOnly => {
                self.chain
                    .call_read_only(contract, &query.function, address, &[principal.clone(), key])
                    .await?
            }
        };
        value.truthiness()
    }

    async fn balance(
        &self,
        token: &ContractId,
        address: &WalletAddress,
        principal: &ClarityValue,
    ) -> Result<u128, QuestlineError> {
        self.chain
            .call_read_only(
                token,
                &self.registry.balance_function,
                address,
                std::slice::from_ref(principal),
            )
            .await?
            .as_uint()
    }
}

/// Overwrites cached fields with `readings`; returns the names of fields
/// that changed. Nothing is written if the cache now belongs to someone else.
fn apply(cache: &OptimisticCache, address: &WalletAddress, readings: Readings) -> Vec<String> {
    let mut corrected = Vec::new();
    let level_for = |xp| cache.level_for(xp);
    cache.modify(|state| {
        if state.address() != Some(address) {
            return false;
        }
        let Some(profile) = state.profile.as_mut() else {
            return false;
        };
        overwrite_profile(profile, &readings, level_for, &mut corrected);

        let vault = &mut state.vault;
        for (name, slot, value) in [
            ("poin", &mut vault.poin, readings.poin),
            ("one", &mut vault.one, readings.one),
        ] {
            if let Some(value) = value
                && *slot != Some(value)
            {
                *slot = Some(value);
                corrected.push(name.to_string());
            }
        }
        if let Some(height) = readings.tip_height
            && vault.tip_height != Some(height)
        {
            vault.tip_height = Some(height);
            corrected.push("tip_height".to_string());
        }
        !corrected.is_empty()
    });
    corrected
}

fn overwrite_profile(
    profile: &mut RewardProfile,
    readings: &Readings,
    level_for: impl Fn(u64) -> u32,
    corrected: &mut Vec<String>,
) {
    if let Some(xp) = readings.xp
        && profile.xp != xp
    {
        profile.xp = xp;
        profile.level = level_for(xp);
        corrected.push("xp".to_string());
    }
    if let Some(last) = readings.last_checkin
        && profile.last_checkin != last
    {
        profile.last_checkin = last;
        corrected.push("last_checkin".to_string());
    }
    for (id, done) in &readings.missions {
        let changed = if *done {
            profile.completed_missions.insert(*id)
        } else {
            profile.completed_missions.remove(id)
        };
        if changed {
            corrected.push(format!("mission {id}"));
        }
    }
    for (id, owned) in &readings.badges {
        let changed = if *owned {
            profile.badges.insert(id.clone())
        } else {
            profile.badges.remove(id)
        };
        if changed {
            corrected.push(format!("badge {id}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use questline_config::model::{ContractsConfig, RewardsConfig};
    use questline_core::types::MICRO_PER_TOKEN;
    use questline_test_utils::{MemoryProfileStore, MockChain, TEST_ADDRESS};

    struct Fixture {
        chain: Arc<MockChain>,
        store: Arc<MemoryProfileStore>,
        registry: Arc<ContractRegistry>,
        cache: OptimisticCache,
        address: WalletAddress,
    }

    impl Fixture {
        fn new() -> Self {
            let address = WalletAddress(TEST_ADDRESS.into());
            let cache = OptimisticCache::new(500);
            cache.load(RewardProfile::new(address.clone()));
            Self {
                chain: Arc::new(MockChain::new()),
                store: Arc::new(MemoryProfileStore::new()),
                registry: Arc::new(ContractRegistry::new(&ContractsConfig::default())),
                cache,
                address,
            }
        }

        fn reconciler(&self, policy: AuthorityPolicy) -> Reconciler {
            Reconciler::new(
                self.chain.clone(),
                self.store.clone(),
                self.registry.clone(),
                Arc::new(Catalog::new(&RewardsConfig::default())),
                policy,
            )
        }

        fn principal(&self) -> ClarityValue {
            ClarityValue::principal(TEST_ADDRESS).unwrap()
        }

        async fn chain_mission(&self, id: u32, value: ClarityValue) {
            let key = ClarityValue::tuple([
                ("user", self.principal()),
                ("mission-id", ClarityValue::UInt(u128::from(id))),
            ]);
            self.chain
                .set_map_entry(&self.registry.rewards, "user-missions", &key, value)
                .await;
        }

        async fn chain_badge(&self, name: &str, value: ClarityValue) {
            self.chain
                .set_read_only(
                    &self.registry.badges,
                    "has-badge",
                    &[self.principal(), ClarityValue::StringAscii(name.into())],
                    value,
                )
                .await;
        }
    }

    #[tokio::test]
    async fn chain_overrides_optimistic_flags() {
        let f = Fixture::new();
        f.cache.modify(|state| {
            if let Some(p) = state.profile.as_mut() {
                p.badges.insert(BadgeId("genesis".into()));
                p.completed_missions.insert(MissionId(2));
                p.xp = 300;
            }
            true
        });
        f.chain_mission(1, ClarityValue::OptionalSome(Box::new(ClarityValue::Bool(true))))
            .await;
        f.chain_badge("node", ClarityValue::ResponseOk(Box::new(ClarityValue::Bool(true))))
            .await;

        let report = f
            .reconciler(AuthorityPolicy::default())
            .reconcile(&f.address, &f.cache)
            .await
            .unwrap();

        let state = f.cache.snapshot();
        assert!(state.has_mission(MissionId(1)));
        assert!(!state.has_mission(MissionId(2)));
        assert!(!state.has_badge(&BadgeId("genesis".into())));
        assert!(state.has_badge(&BadgeId("node".into())));
        assert_eq!(state.xp(), 300, "experience stays local by default");
        assert!(report.corrected.contains(&"badge genesis".to_string()));
        assert!(report.failures.is_empty(), "{:?}", report.failures);
    }

    #[tokio::test]
    async fn backend_authority_reads_the_store() {
        let f = Fixture::new();
        let mut stored = RewardProfile::new(f.address.clone());
        stored.xp = 750;
        stored.completed_missions.insert(MissionId(3));
        f.store.insert(stored).await;

        let policy = AuthorityPolicy {
            experience: FieldAuthority::Backend,
            missions: FieldAuthority::Backend,
            badges: FieldAuthority::Local,
            balances: FieldAuthority::Local,
        };
        assert!(f.reconciler(policy).reads_store());
        assert!(!f.reconciler(AuthorityPolicy::default()).reads_store());
        f.reconciler(policy)
            .reconcile(&f.address, &f.cache)
            .await
            .unwrap();

        let state = f.cache.snapshot();
        assert_eq!(state.xp(), 750);
        assert_eq!(state.level(), 2);
        assert!(state.has_mission(MissionId(3)));
        assert_eq!(f.chain.read_count(), 0);
    }

    #[tokio::test]
    async fn balances_and_tip_are_refreshed() {
        let f = Fixture::new();
        f.chain.set_tip_height(4_200);
        f.chain
            .set_read_only(
                &f.registry.token_poin,
                "get-balance",
                &[f.principal()],
                ClarityValue::ResponseOk(Box::new(ClarityValue::UInt(150 * MICRO_PER_TOKEN))),
            )
            .await;

        f.reconciler(AuthorityPolicy::default())
            .reconcile(&f.address, &f.cache)
            .await
            .unwrap();

        let vault = f.cache.snapshot().vault;
        assert_eq!(vault.poin, Some(150 * MICRO_PER_TOKEN));
        assert_eq!(vault.one, Some(0));
        assert_eq!(vault.tip_height, Some(4_200));
    }

    #[tokio::test]
    async fn failed_reads_leave_fields_alone() {
        let f = Fixture::new();
        f.cache.modify(|state| {
            if let Some(p) = state.profile.as_mut() {
                p.completed_missions.insert(MissionId(1));
            }
            true
        });
        f.chain.fail_reads(true);

        let report = f
            .reconciler(AuthorityPolicy::default())
            .reconcile(&f.address, &f.cache)
            .await
            .unwrap();

        assert!(f.cache.snapshot().has_mission(MissionId(1)));
        assert!(report.corrected.is_empty());
        assert_eq!(report.failures.len(), 3 + 3 + 3);
    }

    #[tokio::test]
    async fn other_address_in_cache_is_untouched() {
        let f = Fixture::new();
        f.chain_mission(1, ClarityValue::Bool(true)).await;
        let someone_else = WalletAddress("SP3GHKMV4GSYNA8WGBX83DACG80K1RRVQZAZMB9J3".into());
        f.cache.load(RewardProfile::new(someone_else));

        let report = f
            .reconciler(AuthorityPolicy::default())
            .reconcile(&f.address, &f.cache)
            .await
            .unwrap();
        assert!(report.corrected.is_empty());
        assert!(!f.cache.snapshot().has_mission(MissionId(1)));
    }
}
