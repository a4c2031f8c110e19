// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Questline rewards engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use questline_core::{Badge, BadgeId, Mission, MissionId};
use serde::{Deserialize, Serialize};

/// Placeholder substituted into contract name templates.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Top-level Questline configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuestlineConfig {
    /// Application identity and logging.
    #[serde(default)]
    pub app: AppConfig,

    /// Chain API endpoint settings.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Versioned contract registry.
    #[serde(default)]
    pub contracts: ContractsConfig,

    /// Confirmation poller settings.
    #[serde(default)]
    pub poller: PollerConfig,

    /// Reconciliation trigger and field authority.
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// XP rules and the mission/badge catalogs.
    #[serde(default)]
    pub rewards: RewardsConfig,

    /// Token vault rules.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Profile store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Backend write retry settings.
    #[serde(default)]
    pub backend: BackendConfig,
}

/// Application identity presented to the wallet, plus log level.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default)]
    pub icon_url: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            icon_url: None,
            log_level: default_log_level(),
        }
    }
}

fn default_app_name() -> String {
    "Questline".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Chain API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// Base URL of the chain API (status, map entry, read-only call, info).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.hiro.so".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// How an entity's on-chain truth is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStyle {
    /// `map_entry` lookup with a `{user, <key_field>}` tuple key.
    MapEntry,
    /// Read-only function call with `(principal, id)` arguments.
    ReadOnly,
}

/// Query configuration for one entity kind (missions or badges).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EntityQueryConfig {
    pub style: QueryStyle,

    /// Map name for [`QueryStyle::MapEntry`].
    pub map: String,

    /// Function name for [`QueryStyle::ReadOnly`].
    pub function: String,

    /// Tuple field holding the principal.
    #[serde(default = "default_user_field")]
    pub user_field: String,

    /// Tuple field holding the entity id or name.
    pub key_field: String,
}

fn default_user_field() -> String {
    "user".to_string()
}

/// The single versioned contract registry.
///
/// Every `*_contract` value is a name template; `{version}` is replaced by
/// [`ContractsConfig::version`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContractsConfig {
    /// Deployer address shared by every contract.
    #[serde(default = "default_contract_address")]
    pub address: String,

    #[serde(default = "default_contract_version")]
    pub version: String,

    #[serde(default = "default_rewards_contract")]
    pub rewards_contract: String,

    #[serde(default = "default_badges_contract")]
    pub badges_contract: String,

    #[serde(default = "default_faucet_contract")]
    pub faucet_contract: String,

    #[serde(default = "default_staking_contract")]
    pub staking_contract: String,

    #[serde(default = "default_gacha_contract")]
    pub gacha_contract: String,

    #[serde(default = "default_token_poin_contract")]
    pub token_poin_contract: String,

    #[serde(default = "default_token_one_contract")]
    pub token_one_contract: String,

    #[serde(default = "default_check_in_function")]
    pub check_in_function: String,

    #[serde(default = "default_complete_mission_function")]
    pub complete_mission_function: String,

    #[serde(default = "default_mint_badge_function")]
    pub mint_badge_function: String,

    #[serde(default = "default_claim_function")]
    pub claim_function: String,

    #[serde(default = "default_stake_function")]
    pub stake_function: String,

    #[serde(default = "default_spin_function")]
    pub spin_function: String,

    #[serde(default = "default_balance_function")]
    pub balance_function: String,

    #[serde(default = "default_missions_query")]
    pub missions_query: EntityQueryConfig,

    #[serde(default = "default_badges_query")]
    pub badges_query: EntityQueryConfig,
}

impl ContractsConfig {
    /// Substitutes the registry version into a name template.
    pub fn render(&self, template: &str) -> String {
        template.replace(VERSION_PLACEHOLDER, &self.version)
    }

    /// Every `(key, template)` pair, for validation and display.
    pub fn templates(&self) -> [(&'static str, &str); 7] {
        [
            ("rewards_contract", self.rewards_contract.as_str()),
            ("badges_contract", self.badges_contract.as_str()),
            ("faucet_contract", self.faucet_contract.as_str()),
            ("staking_contract", self.staking_contract.as_str()),
            ("gacha_contract", self.gacha_contract.as_str()),
            ("token_poin_contract", self.token_poin_contract.as_str()),
            ("token_one_contract", self.token_one_contract.as_str()),
        ]
    }
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            address: default_contract_address(),
            version: default_contract_version(),
            rewards_contract: default_rewards_contract(),
            badges_contract: default_badges_contract(),
            faucet_contract: default_faucet_contract(),
            staking_contract: default_staking_contract(),
            gacha_contract: default_gacha_contract(),
            token_poin_contract: default_token_poin_contract(),
            token_one_contract: default_token_one_contract(),
            check_in_function: default_check_in_function(),
            complete_mission_function: default_complete_mission_function(),
            mint_badge_function: default_mint_badge_function(),
            claim_function: default_claim_function(),
            stake_function: default_stake_function(),
            spin_function: default_spin_function(),
            balance_function: default_balance_function(),
            missions_query: default_missions_query(),
            badges_query: default_badges_query(),
        }
    }
}

fn default_contract_address() -> String {
    "SP3GHKMV4GSYNA8WGBX83DACG80K1RRVQZAZMB9J3".to_string()
}

fn default_contract_version() -> String {
    "v1".to_string()
}

fn default_rewards_contract() -> String {
    "genesis-rewards-{version}".to_string()
}

fn default_badges_contract() -> String {
    "genesis-badges-{version}".to_string()
}

fn default_faucet_contract() -> String {
    "faucet-distributor".to_string()
}

fn default_staking_contract() -> String {
    "staking-refinery".to_string()
}

fn default_gacha_contract() -> String {
    "utility-gacha".to_string()
}

fn default_token_poin_contract() -> String {
    "token-poin".to_string()
}

fn default_token_one_contract() -> String {
    "token-one".to_string()
}

fn default_check_in_function() -> String {
    "daily-check-in".to_string()
}

fn default_complete_mission_function() -> String {
    "complete-mission".to_string()
}

fn default_mint_badge_function() -> String {
    "mint-badge".to_string()
}

fn default_claim_function() -> String {
    "claim-daily".to_string()
}

fn default_stake_function() -> String {
    "stake-tokens".to_string()
}

fn default_spin_function() -> String {
    "spin-gacha".to_string()
}

fn default_balance_function() -> String {
    "get-balance".to_string()
}

fn default_missions_query() -> EntityQueryConfig {
    EntityQueryConfig {
        style: QueryStyle::MapEntry,
        map: "user-missions".to_string(),
        function: "has-completed-mission".to_string(),
        user_field: default_user_field(),
        key_field: "mission-id".to_string(),
    }
}

fn default_badges_query() -> EntityQueryConfig {
    EntityQueryConfig {
        style: QueryStyle::ReadOnly,
        map: "user-badges".to_string(),
        function: "has-badge".to_string(),
        user_field: default_user_field(),
        key_field: "badge-name".to_string(),
    }
}

/// Confirmation poller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollerConfig {
    /// Seconds between status queries.
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,

    /// Give up and report a timeout after this many seconds.
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_max_wait_secs() -> u64 {
    600
}

/// When the reconciler runs relative to a dispatched action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Re-read after the poller reaches a terminal outcome.
    AfterConfirmation,
    /// Re-read a fixed delay after dispatch, whatever the poller reports.
    FixedDelay,
}

/// Which source is authoritative for a cached field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAuthority {
    /// Never corrected; the local cache is the truth.
    Local,
    /// Re-read from contract state.
    Chain,
    /// Re-read from the profile store.
    Backend,
}

/// Named authority per field group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorityPolicy {
    #[serde(default = "default_local")]
    pub experience: FieldAuthority,

    #[serde(default = "default_chain")]
    pub missions: FieldAuthority,

    #[serde(default = "default_chain")]
    pub badges: FieldAuthority,

    #[serde(default = "default_chain")]
    pub balances: FieldAuthority,
}

impl Default for AuthorityPolicy {
    fn default() -> Self {
        Self {
            experience: FieldAuthority::Local,
            missions: FieldAuthority::Chain,
            badges: FieldAuthority::Chain,
            balances: FieldAuthority::Chain,
        }
    }
}

fn default_local() -> FieldAuthority {
    FieldAuthority::Local
}

fn default_chain() -> FieldAuthority {
    FieldAuthority::Chain
}

/// Reconciliation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileConfig {
    #[serde(default = "default_reconcile_mode")]
    pub mode: ReconcileMode,

    /// Delay used by [`ReconcileMode::FixedDelay`].
    #[serde(default = "default_reconcile_delay_secs")]
    pub delay_secs: u64,

    #[serde(default)]
    pub authority: AuthorityPolicy,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            mode: default_reconcile_mode(),
            delay_secs: default_reconcile_delay_secs(),
            authority: AuthorityPolicy::default(),
        }
    }
}

fn default_reconcile_mode() -> ReconcileMode {
    ReconcileMode::AfterConfirmation
}

fn default_reconcile_delay_secs() -> u64 {
    10
}

/// XP rules and the static catalogs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RewardsConfig {
    #[serde(default = "default_check_in_xp")]
    pub check_in_xp: u64,

    #[serde(default = "default_xp_per_level")]
    pub xp_per_level: u64,

    #[serde(default = "default_missions")]
    pub missions: Vec<Mission>,

    #[serde(default = "default_badges")]
    pub badges: Vec<Badge>,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            check_in_xp: default_check_in_xp(),
            xp_per_level: default_xp_per_level(),
            missions: default_missions(),
            badges: default_badges(),
        }
    }
}

fn default_check_in_xp() -> u64 {
    20
}

fn default_xp_per_level() -> u64 {
    500
}

fn default_missions() -> Vec<Mission> {
    let mission = |id: u32, title: &str, description: &str, reward_xp: u64, icon: &str| Mission {
        id: MissionId(id),
        title: title.to_string(),
        description: description.to_string(),
        reward_xp,
        icon: icon.to_string(),
    };
    vec![
        mission(1, "Follow Twitter", "Follow the project on Twitter.", 50, "twitter"),
        mission(2, "Join Discord", "Join the community Discord.", 50, "discord"),
        mission(3, "Retweet Pinned", "Retweet the pinned announcement.", 100, "retweet"),
    ]
}

fn default_badges() -> Vec<Badge> {
    vec![
        Badge {
            id: BadgeId("genesis".to_string()),
            title: "Genesis Pioneer".to_string(),
            subtitle: "Early adopter".to_string(),
            requirement: "Requires 100 XP.".to_string(),
            min_xp: Some(100),
            min_level: None,
            icon: "sparkles".to_string(),
        },
        Badge {
            id: BadgeId("node".to_string()),
            title: "Node Operator".to_string(),
            subtitle: "Active participant".to_string(),
            requirement: "Requires Level 5.".to_string(),
            min_xp: None,
            min_level: Some(5),
            icon: "server".to_string(),
        },
        Badge {
            id: BadgeId("guardian".to_string()),
            title: "Guardian".to_string(),
            subtitle: "Highest honor".to_string(),
            requirement: "Requires Level 10.".to_string(),
            min_xp: None,
            min_level: Some(10),
            icon: "shield".to_string(),
        },
    ]
}

/// Token vault configuration. Amounts are whole tokens.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Blocks between two daily claims.
    #[serde(default = "default_blocks_per_day")]
    pub blocks_per_day: u64,

    /// POIN credited by one daily claim.
    #[serde(default = "default_claim_amount")]
    pub claim_amount: u64,

    /// POIN debited by one gacha spin.
    #[serde(default = "default_spin_cost")]
    pub spin_cost: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            blocks_per_day: default_blocks_per_day(),
            claim_amount: default_claim_amount(),
            spin_cost: default_spin_cost(),
        }
    }
}

fn default_blocks_per_day() -> u64 {
    144
}

fn default_claim_amount() -> u64 {
    100
}

fn default_spin_cost() -> u64 {
    50
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("questline").join("questline.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("questline.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Profile store write policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Total attempts per profile write.
    #[serde(default = "default_write_attempts")]
    pub write_attempts: u32,

    /// Delay between attempts in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Consecutive failed writes before the store is reported degraded.
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            write_attempts: default_write_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            alert_threshold: default_alert_threshold(),
        }
    }
}

fn default_write_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_alert_threshold() -> u32 {
    1
}
