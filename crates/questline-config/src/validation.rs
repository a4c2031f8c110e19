// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde attributes cannot express: endpoint URLs, the
//! deployer address checksum, contract name templates, timer bounds and
//! catalog uniqueness. All errors are collected; validation does not fail fast.

use std::collections::HashSet;

use questline_core::c32;
use questline_core::clarity::is_clarity_ascii;

use crate::diagnostic::ConfigError;
use crate::model::{
    EntityQueryConfig, FieldAuthority, QueryStyle, QuestlineConfig, ReconcileMode,
    VERSION_PLACEHOLDER,
};

/// Longest contract name the chain accepts.
const MAX_CONTRACT_NAME: usize = 128;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &QuestlineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let url = config.network.api_base_url.trim();
    if url.is_empty() {
        errors.push(ConfigError::validation("network.api_base_url", "must not be empty"));
    } else if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(ConfigError::validation(
            "network.api_base_url",
            format!("`{url}` must start with http:// or https://"),
        ));
    }
    if config.network.request_timeout_secs == 0 {
        errors.push(ConfigError::validation("network.request_timeout_secs", "must be positive"));
    }

    validate_contracts(config, &mut errors);

    if config.poller.interval_secs == 0 {
        errors.push(ConfigError::validation("poller.interval_secs", "must be positive"));
    }
    if config.poller.max_wait_secs < config.poller.interval_secs {
        errors.push(ConfigError::validation(
            "poller.max_wait_secs",
            format!(
                "must be at least poller.interval_secs ({}), got {}",
                config.poller.interval_secs, config.poller.max_wait_secs
            ),
        ));
    }

    if config.reconcile.mode == ReconcileMode::FixedDelay && config.reconcile.delay_secs == 0 {
        errors.push(ConfigError::validation(
            "reconcile.delay_secs",
            "must be positive when reconcile.mode is fixed_delay",
        ));
    }

    let authority = &config.reconcile.authority;
    if authority.experience == FieldAuthority::Chain {
        errors.push(ConfigError::validation(
            "reconcile.authority.experience",
            "experience is not stored on chain; use `local` or `backend`",
        ));
    }
    if authority.balances == FieldAuthority::Backend {
        errors.push(ConfigError::validation(
            "reconcile.authority.balances",
            "the profile store does not hold balances; use `local` or `chain`",
        ));
    }

    validate_rewards(config, &mut errors);

    if config.vault.blocks_per_day == 0 {
        errors.push(ConfigError::validation("vault.blocks_per_day", "must be positive"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation("storage.database_path", "must not be empty"));
    }

    if config.backend.write_attempts == 0 {
        errors.push(ConfigError::validation("backend.write_attempts", "must be at least 1"));
    }
    if config.backend.alert_threshold == 0 {
        errors.push(ConfigError::validation("backend.alert_threshold", "must be at least 1"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_contracts(config: &QuestlineConfig, errors: &mut Vec<ConfigError>) {
    let contracts = &config.contracts;

    if let Err(e) = c32::decode_address(contracts.address.trim()) {
        errors.push(ConfigError::validation("contracts.address", e.to_string()));
    }

    if contracts.version.trim().is_empty() {
        errors.push(ConfigError::validation("contracts.version", "must not be empty"));
    }

    for (key, template) in contracts.templates() {
        let stripped = template.replace(VERSION_PLACEHOLDER, "");
        if stripped.contains('{') || stripped.contains('}') {
            errors.push(ConfigError::validation(
                format!("contracts.{key}"),
                format!("`{template}` has a placeholder other than {VERSION_PLACEHOLDER}"),
            ));
            continue;
        }
        let name = contracts.render(template);
        if !is_contract_name(&name) {
            errors.push(ConfigError::validation(
                format!("contracts.{key}"),
                format!("`{name}` is not a valid contract name"),
            ));
        }
    }

    for (key, function) in [
        ("check_in_function", &contracts.check_in_function),
        ("complete_mission_function", &contracts.complete_mission_function),
        ("mint_badge_function", &contracts.mint_badge_function),
        ("claim_function", &contracts.claim_function),
        ("stake_function", &contracts.stake_function),
        ("spin_function", &contracts.spin_function),
        ("balance_function", &contracts.balance_function),
    ] {
        if function.trim().is_empty() {
            errors.push(ConfigError::validation(format!("contracts.{key}"), "must not be empty"));
        }
    }

    validate_query("contracts.missions_query", &contracts.missions_query, errors);
    validate_query("contracts.badges_query", &contracts.badges_query, errors);
}

fn validate_query(key: &str, query: &EntityQueryConfig, errors: &mut Vec<ConfigError>) {
    let (field, value) = match query.style {
        QueryStyle::MapEntry => ("map", &query.map),
        QueryStyle::ReadOnly => ("function", &query.function),
    };
    if value.trim().is_empty() {
        errors.push(ConfigError::validation(format!("{key}.{field}"), "must not be empty"));
    }
    if query.user_field.trim().is_empty() || query.key_field.trim().is_empty() {
        errors.push(ConfigError::validation(key, "user_field and key_field must not be empty"));
    }
    if query.user_field == query.key_field {
        errors.push(ConfigError::validation(key, "user_field and key_field must differ"));
    }
}

fn validate_rewards(config: &QuestlineConfig, errors: &mut Vec<ConfigError>) {
    let rewards = &config.rewards;

    if rewards.xp_per_level == 0 {
        errors.push(ConfigError::validation("rewards.xp_per_level", "must be positive"));
    }

    let mut seen_missions = HashSet::new();
    for mission in &rewards.missions {
        if !seen_missions.insert(mission.id) {
            errors.push(ConfigError::validation(
                "rewards.missions",
                format!("duplicate mission id {}", mission.id),
            ));
        }
        if mission.reward_xp == 0 {
            errors.push(ConfigError::validation(
                "rewards.missions",
                format!("mission {} must reward a positive amount of XP", mission.id),
            ));
        }
    }

    let mut seen_badges = HashSet::new();
    for badge in &rewards.badges {
        let name = badge.id.0.as_str();
        if name.trim().is_empty() || !is_clarity_ascii(name) || name.len() > MAX_CONTRACT_NAME {
            errors.push(ConfigError::validation(
                "rewards.badges",
                format!("badge id `{name}` must be a non-empty Clarity ASCII string"),
            ));
        }
        if !seen_badges.insert(name) {
            errors.push(ConfigError::validation(
                "rewards.badges",
                format!("duplicate badge id `{name}`"),
            ));
        }
    }
}

/// Contract names: a letter followed by letters, digits, `-` or `_`.
fn is_contract_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && name.len() <= MAX_CONTRACT_NAME
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
