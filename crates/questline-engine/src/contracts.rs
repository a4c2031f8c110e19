// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contract registry resolved from the versioned `[contracts]` section.

use questline_config::model::{ContractsConfig, EntityQueryConfig};
use questline_core::ContractId;

/// Fully-qualified contracts and function names used by the engine.
#[derive(Debug, Clone)]
pub struct ContractRegistry {
    pub rewards: ContractId,
    pub badges: ContractId,
    pub faucet: ContractId,
    pub staking: ContractId,
    pub gacha: ContractId,
    pub token_poin: ContractId,
    pub token_one: ContractId,
    pub check_in_function: String,
    pub complete_mission_function: String,
    pub mint_badge_function: String,
    pub claim_function: String,
    pub stake_function: String,
    pub spin_function: String,
    pub balance_function: String,
    pub missions_query: EntityQueryConfig,
    pub badges_query: EntityQueryConfig,
}

impl ContractRegistry {
    pub fn new(config: &ContractsConfig) -> Self {
        let contract = |template: &str| ContractId::new(&config.address, config.render(template));
        Self {
            rewards: contract(&config.rewards_contract),
            badges: contract(&config.badges_contract),
            faucet: contract(&config.faucet_contract),
            staking: contract(&config.staking_contract),
            gacha: contract(&config.gacha_contract),
            token_poin: contract(&config.token_poin_contract),
            token_one: contract(&config.token_one_contract),
            check_in_function: config.check_in_function.clone(),
            complete_mission_function: config.complete_mission_function.clone(),
            mint_badge_function: config.mint_badge_function.clone(),
            claim_function: config.claim_function.clone(),
            stake_function: config.stake_function.clone(),
            spin_function: config.spin_function.clone(),
            balance_function: config.balance_function.clone(),
            missions_query: config.missions_query.clone(),
            badges_query: config.badges_query.clone(),
        }
    }
}
