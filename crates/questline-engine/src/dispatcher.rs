// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Action dispatcher: local guards, contract-call construction, and the
//! wallet round trip. The dispatcher never touches the cache.

use std::sync::Arc;

use tracing::{debug, info};

use questline_config::model::VaultConfig;
use questline_core::types::MICRO_PER_TOKEN;
use questline_core::{
    Action, ClarityValue, Clock, ContractCall, PostConditionMode, QuestlineError, SubmitOutcome,
    TxId, WalletAdapter,
};

use crate::cache::{CacheState, Mutation};
use crate::catalog::Catalog;
use crate::contracts::ContractRegistry;

/// Vault amounts converted to micro-units.
#[derive(Debug, Clone, Copy)]
pub struct VaultRules {
    pub blocks_per_day: u64,
    pub claim_amount: u128,
    pub spin_cost: u128,
}

impl From<&VaultConfig> for VaultRules {
    fn from(config: &VaultConfig) -> Self {
        Self {
            blocks_per_day: config.blocks_per_day,
            claim_amount: u128::from(config.claim_amount) * MICRO_PER_TOKEN,
            spin_cost: u128::from(config.spin_cost) * MICRO_PER_TOKEN,
        }
    }
}

pub struct Dispatcher {
    wallet: Arc<dyn WalletAdapter>,
    registry: Arc<ContractRegistry>,
    catalog: Arc<Catalog>,
    vault: VaultRules,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    pub fn new(
        wallet: Arc<dyn WalletAdapter>,
        registry: Arc<ContractRegistry>,
        catalog: Arc<Catalog>,
        vault: VaultRules,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            wallet,
            registry,
            catalog,
            vault,
            clock,
        }
    }

    /// Local guards evaluated against the current cache snapshot.
    pub fn check(&self, action: &Action, state: &CacheState) -> Result<(), QuestlineError> {
        if state.profile.is_none() {
            return Err(QuestlineError::NotAuthenticated);
        }
        let already = || QuestlineError::AlreadyCompleted {
            target: action.target(),
        };

        match action {
            Action::CheckIn => {
                if state.checked_in_on(&self.clock.now()) {
                    return Err(already());
                }
            }
            Action::CompleteMission { mission } => {
                self.catalog.mission(*mission)?;
                if state.has_mission(*mission) {
                    return Err(already());
                }
            }
            Action::MintBadge { badge } => {
                let entry = self.catalog.badge(badge)?;
                if state.has_badge(badge) {
                    return Err(already());
                }
                if let Some(requirement) = entry.unmet_requirement(state.xp(), state.level()) {
                    return Err(QuestlineError::BadgeLocked {
                        badge: badge.to_string(),
                        requirement,
                    });
                }
            }
            Action::Stake { micro_amount } => {
                if *micro_amount == 0 {
                    return Err(QuestlineError::InvalidAmount(
                        "stake amount must be positive".to_string(),
                    ));
                }
                if let Some(available) = state.vault.poin
                    && *micro_amount > available
                {
                    return Err(QuestlineError::InsufficientBalance {
                        needed: *micro_amount,
                        available,
                    });
                }
            }
            Action::ClaimDaily => {
                if let (Some(last), Some(tip)) =
                    (state.vault.last_claim_height, state.vault.tip_height)
                    && last.saturating_add(self.vault.blocks_per_day) > tip
                {
                    return Err(already());
                }
            }
            Action::SpinGacha => {
                if let Some(available) = state.vault.poin
                    && available < self.vault.spin_cost
                {
                    return Err(QuestlineError::InsufficientBalance {
                        needed: self.vault.spin_cost,
                        available,
                    });
                }
            }
        }
        Ok(())
    }

    /// The contract call that performs `action` on chain.
    pub fn build_call(&self, action: &Action) -> Result<ContractCall, QuestlineError> {
        let registry = &self.registry;
        let (contract, function_name, args) = match action {
            Action::CheckIn => (&registry.rewards, &registry.check_in_function, vec![]),
            Action::CompleteMission { mission } => {
                let reward = self.catalog.mission(*mission)?.reward_xp;
                (
                    &registry.rewards,
                    &registry.complete_mission_function,
                    vec![
                        ClarityValue::UInt(u128::from(mission.0)),
                        ClarityValue::UInt(u128::from(reward)),
                    ],
                )
            }
            Action::MintBadge { badge } => (
                &registry.badges,
                &registry.mint_badge_function,
                vec![ClarityValue::string_ascii(&badge.0)?],
            ),
            Action::Stake { micro_amount } => (
                &registry.staking,
                &registry.stake_function,
                vec![ClarityValue::UInt(*micro_amount)],
            ),
            Action::ClaimDaily => (&registry.faucet, &registry.claim_function, vec![]),
            Action::SpinGacha => (&registry.gacha, &registry.spin_function, vec![]),
        };
        Ok(ContractCall {
            contract: contract.clone(),
            function_name: function_name.clone(),
            args,
            post_condition_mode: PostConditionMode::Allow,
        })
    }

    /// The optimistic change applied once the wallet broadcasts `action`.
    pub fn forward_mutation(
        &self,
        action: &Action,
        state: &CacheState,
    ) -> Result<Mutation, QuestlineError> {
        let mutation = match action {
            Action::CheckIn => Mutation {
                xp: self.catalog.check_in_xp(),
                check_in_at: Some(self.clock.now()),
                ..Mutation::default()
            },
            Action::CompleteMission { mission } => Mutation {
                xp: self.catalog.mission(*mission)?.reward_xp,
                mission: Some(*mission),
                ..Mutation::default()
            },
            Action::MintBadge { badge } => Mutation {
                badge: Some(badge.clone()),
                ..Mutation::default()
            },
            Action::Stake { micro_amount } => Mutation {
                poin_debit: *micro_amount,
                ..Mutation::default()
            },
            Action::ClaimDaily => Mutation {
                poin_credit: self.vault.claim_amount,
                claim_height: state.vault.tip_height,
                ..Mutation::default()
            },
            Action::SpinGacha => Mutation {
                poin_debit: self.vault.spin_cost,
                ..Mutation::default()
            },
        };
        Ok(mutation)
    }

    /// Hands `call` to the wallet. A dismissed prompt becomes
    /// [`QuestlineError::Cancelled`].
    pub async fn submit(&self, call: ContractCall) -> Result<TxId, QuestlineError> {
        debug!(contract = %call.contract, function = %call.function_name, "requesting signature");
        match self.wallet.submit_contract_call(call).await? {
            SubmitOutcome::Submitted(tx_id) => {
                info!(tx_id = %tx_id, "transaction broadcast");
                Ok(tx_id)
            }
            SubmitOutcome::Cancelled => {
                info!("transaction cancelled by user");
                Err(QuestlineError::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use questline_config::model::{ContractsConfig, RewardsConfig};
    use questline_core::{BadgeId, MissionId, RewardProfile, WalletAddress};
    use questline_test_utils::{FixedClock, MockWallet, TEST_ADDRESS};

    fn dispatcher(now: &str) -> (Dispatcher, Arc<MockWallet>) {
        let wallet = Arc::new(MockWallet::signed_in(TEST_ADDRESS));
        let dispatcher = Dispatcher::new(
            wallet.clone(),
            Arc::new(ContractRegistry::new(&ContractsConfig::default())),
            Arc::new(Catalog::new(&RewardsConfig::default())),
            VaultRules::from(&VaultConfig::default()),
            Arc::new(FixedClock::at(now)),
        );
        (dispatcher, wallet)
    }

    fn state_with(edit: impl FnOnce(&mut RewardProfile)) -> CacheState {
        let mut profile = RewardProfile::new(WalletAddress(TEST_ADDRESS.into()));
        edit(&mut profile);
        CacheState {
            profile: Some(profile),
            ..CacheState::default()
        }
    }

    const NOW: &str = "2024-01-02T00:00:01Z";

    #[test]
    fn signed_out_state_is_rejected() {
        let (d, _) = dispatcher(NOW);
        assert!(matches!(
            d.check(&Action::CheckIn, &CacheState::default()),
            Err(QuestlineError::NotAuthenticated)
        ));
    }

    #[test]
    fn check_in_guard_uses_calendar_day() {
        let (d, _) = dispatcher(NOW);
        let late: DateTime<Utc> = "2024-01-01T23:59:59Z".parse().unwrap();
        let yesterday = state_with(|p| p.last_checkin = Some(late));
        assert!(d.check(&Action::CheckIn, &yesterday).is_ok());

        let early: DateTime<Utc> = "2024-01-02T00:00:00Z".parse().unwrap();
        let today = state_with(|p| p.last_checkin = Some(early));
        assert!(matches!(
            d.check(&Action::CheckIn, &today),
            Err(QuestlineError::AlreadyCompleted { .. })
        ));
    }

    #[test]
    fn completed_mission_and_owned_badge_are_guarded() {
        let (d, _) = dispatcher(NOW);
        let state = state_with(|p| {
            p.completed_missions.insert(MissionId(1));
            p.badges.insert(BadgeId("genesis".into()));
            p.xp = 200;
        });
        assert!(d
            .check(&Action::CompleteMission { mission: MissionId(1) }, &state)
            .is_err());
        assert!(d
            .check(&Action::CompleteMission { mission: MissionId(2) }, &state)
            .is_ok());
        assert!(matches!(
            d.check(
                &Action::MintBadge {
                    badge: BadgeId("genesis".into())
                },
                &state
            ),
            Err(QuestlineError::AlreadyCompleted { .. })
        ));
    }

    #[test]
    fn locked_badge_reports_requirement() {
        let (d, _) = dispatcher(NOW);
        let state = state_with(|p| {
            p.xp = 1000;
            p.level = 3;
        });
        let err = d
            .check(
                &Action::MintBadge {
                    badge: BadgeId("node".into()),
                },
                &state,
            )
            .unwrap_err();
        assert!(matches!(err, QuestlineError::BadgeLocked { ref requirement, .. } if requirement.contains("level 5")));
    }

    #[test]
    fn vault_guards() {
        let (d, _) = dispatcher(NOW);
        let mut state = state_with(|_| {});
        assert!(matches!(
            d.check(&Action::Stake { micro_amount: 0 }, &state),
            Err(QuestlineError::InvalidAmount(_))
        ));
        assert!(
            d.check(&Action::SpinGacha, &state).is_ok(),
            "unknown balance defers to the chain"
        );

        state.vault.poin = Some(10 * MICRO_PER_TOKEN);
        assert!(matches!(
            d.check(&Action::SpinGacha, &state),
            Err(QuestlineError::InsufficientBalance { .. })
        ));
        assert!(matches!(
            d.check(
                &Action::Stake {
                    micro_amount: 11 * MICRO_PER_TOKEN
                },
                &state
            ),
            Err(QuestlineError::InsufficientBalance { .. })
        ));

        state.vault.tip_height = Some(1_000);
        state.vault.last_claim_height = Some(900);
        assert!(d.check(&Action::ClaimDaily, &state).is_err());
        state.vault.tip_height = Some(1_044);
        assert!(d.check(&Action::ClaimDaily, &state).is_ok());
    }

    #[test]
    fn unknown_mission_is_rejected() {
        let (d, _) = dispatcher(NOW);
        assert!(matches!(
            d.check(
                &Action::CompleteMission {
                    mission: MissionId(42)
                },
                &state_with(|_| {})
            ),
            Err(QuestlineError::UnknownTarget(_))
        ));
    }

    #[test]
    fn calls_carry_registry_names_and_arguments() {
        let (d, _) = dispatcher(NOW);
        let call = d
            .build_call(&Action::CompleteMission {
                mission: MissionId(3),
            })
            .unwrap();
        assert_eq!(call.contract.name, "genesis-rewards-v1");
        assert_eq!(call.function_name, "complete-mission");
        assert_eq!(
            call.args,
            vec![ClarityValue::UInt(3), ClarityValue::UInt(100)]
        );

        let call = d
            .build_call(&Action::MintBadge {
                badge: BadgeId("genesis".into()),
            })
            .unwrap();
        assert_eq!(call.contract.name, "genesis-badges-v1");
        assert_eq!(call.args, vec![ClarityValue::StringAscii("genesis".into())]);

        let call = d
            .build_call(&Action::Stake {
                micro_amount: 2_500_000,
            })
            .unwrap();
        assert_eq!(call.contract.name, "staking-refinery");
        assert_eq!(call.args, vec![ClarityValue::UInt(2_500_000)]);

        assert!(d.build_call(&Action::ClaimDaily).unwrap().args.is_empty());
    }

    #[test]
    fn claim_mutation_records_tip() {
        let (d, _) = dispatcher(NOW);
        let mut state = state_with(|_| {});
        state.vault.tip_height = Some(77);
        let mutation = d.forward_mutation(&Action::ClaimDaily, &state).unwrap();
        assert_eq!(mutation.claim_height, Some(77));
        assert_eq!(mutation.poin_credit, 100 * MICRO_PER_TOKEN);
    }

    #[tokio::test]
    async fn dismissed_prompt_is_cancelled() {
        let (d, wallet) = dispatcher(NOW);
        wallet.push_cancel().await;
        let call = d.build_call(&Action::CheckIn).unwrap();
        assert!(matches!(d.submit(call).await, Err(QuestlineError::Cancelled)));
        assert_eq!(wallet.submission_count().await, 1);
    }
}
