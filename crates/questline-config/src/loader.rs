// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./questline.toml` > `~/.config/questline/questline.toml` >
//! `/etc/questline/questline.toml` with environment variable overrides via `QUESTLINE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::QuestlineConfig;

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/questline/questline.toml";
pub(crate) const LOCAL_CONFIG_FILE: &str = "questline.toml";

/// Top-level sections addressable from the environment.
const ENV_SECTIONS: &[&str] = &[
    "app",
    "network",
    "contracts",
    "poller",
    "reconcile",
    "rewards",
    "vault",
    "storage",
    "backend",
];

pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("questline").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/questline/questline.toml` (system-wide)
/// 3. `~/.config/questline/questline.toml` (user XDG config)
/// 4. `./questline.toml` (local directory)
/// 5. `QUESTLINE_*` environment variables
pub fn load_config() -> Result<QuestlineConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<QuestlineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QuestlineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<QuestlineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QuestlineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(QuestlineConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `QUESTLINE_NETWORK_API_BASE_URL` maps to `network.api_base_url`.
fn env_provider() -> Env {
    Env::prefixed("QUESTLINE_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name to a dotted config key.
pub(crate) fn map_env_key(key: &str) -> String {
    if let Some(rest) = key.strip_prefix("reconcile_authority_") {
        return format!("reconcile.authority.{rest}");
    }
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_only_after_section() {
        assert_eq!(map_env_key("network_api_base_url"), "network.api_base_url");
        assert_eq!(map_env_key("poller_max_wait_secs"), "poller.max_wait_secs");
        assert_eq!(
            map_env_key("contracts_token_poin_contract"),
            "contracts.token_poin_contract"
        );
        assert_eq!(
            map_env_key("reconcile_authority_experience"),
            "reconcile.authority.experience"
        );
        assert_eq!(map_env_key("reconcile_mode"), "reconcile.mode");
        assert_eq!(map_env_key("unknown"), "unknown");
    }

    #[test]
    fn missing_files_are_skipped() {
        let config = load_config_from_path(Path::new("/nonexistent/questline.toml"))
            .expect("missing file falls back to defaults");
        assert_eq!(config.poller.interval_secs, 10);
    }
}
