// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Questline engine.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::clarity::ClarityValue;

/// Token amounts are tracked in micro-units (6 decimals).
pub const MICRO_PER_TOKEN: u128 = 1_000_000;

/// A chain-namespaced wallet address (c32check, e.g. `SP...` or `ST...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(pub String);

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque transaction handle assigned by the wallet/chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl TxId {
    /// Shortened form for status messages: `0x1234...cdef`.
    pub fn short(&self) -> String {
        let id = &self.0;
        if id.len() <= 12 || !id.is_ascii() {
            return id.clone();
        }
        format!("{}...{}", &id[..6], &id[id.len() - 4..])
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mission identifier from the static catalog.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MissionId(pub u32);

impl fmt::Display for MissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Badge identifier; doubles as the on-chain badge name (Clarity ASCII).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadgeId(pub String);

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of external collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Wallet,
    TxStatus,
    ChainRead,
    ProfileStore,
}

/// Sign-in status of the wallet session projection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SignInStatus {
    SignedOut,
    Pending,
    SignedIn,
}

/// Application identity presented to the wallet during sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    pub name: String,
    pub icon_url: Option<String>,
}

/// Result of a wallet sign-in prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn(WalletAddress),
    Cancelled,
}

/// Result of a wallet contract-call prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The wallet signed and broadcast the call.
    Submitted(TxId),
    /// The user dismissed the prompt.
    Cancelled,
}

/// Post-condition handling requested for a contract call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PostConditionMode {
    #[default]
    Allow,
    Deny,
}

/// A fully-qualified contract identifier (`address.name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId {
    pub address: String,
    pub name: String,
}

impl ContractId {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.address, self.name)
    }
}

/// An outbound contract call handed to the wallet for signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub contract: ContractId,
    pub function_name: String,
    pub args: Vec<ClarityValue>,
    pub post_condition_mode: PostConditionMode,
}

/// Transaction status as reported by the chain status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum TxStatus {
    Pending,
    Success,
    AbortByResponse,
    AbortByPostCondition,
    /// Any `dropped_*` status (replaced, expired, garbage collected).
    Dropped(String),
    /// A status string this client does not know; treated as a terminal failure.
    Other(String),
}

impl TxStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" => TxStatus::Pending,
            "success" => TxStatus::Success,
            "abort_by_response" => TxStatus::AbortByResponse,
            "abort_by_post_condition" => TxStatus::AbortByPostCondition,
            s if s.starts_with("dropped") => TxStatus::Dropped(s.to_string()),
            s => TxStatus::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TxStatus::Pending => "pending",
            TxStatus::Success => "success",
            TxStatus::AbortByResponse => "abort_by_response",
            TxStatus::AbortByPostCondition => "abort_by_post_condition",
            TxStatus::Dropped(s) | TxStatus::Other(s) => s,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TxStatus::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TxStatus::Success)
    }
}

impl From<String> for TxStatus {
    fn from(raw: String) -> Self {
        TxStatus::parse(&raw)
    }
}

impl From<TxStatus> for String {
    fn from(status: TxStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of a transaction's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxStatusReport {
    pub tx_id: TxId,
    pub status: TxStatus,
    /// Remote error code, e.g. `u101` extracted from `(err u101)`.
    pub error_code: Option<String>,
}

/// A static mission catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mission {
    pub id: MissionId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub reward_xp: u64,
    #[serde(default)]
    pub icon: String,
}

/// A static badge catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Badge {
    pub id: BadgeId,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub requirement: String,
    #[serde(default)]
    pub min_xp: Option<u64>,
    #[serde(default)]
    pub min_level: Option<u32>,
    #[serde(default)]
    pub icon: String,
}

impl Badge {
    /// Returns a human-readable reason when `xp`/`level` do not meet the requirements.
    pub fn unmet_requirement(&self, xp: u64, level: u32) -> Option<String> {
        if let Some(min_xp) = self.min_xp
            && xp < min_xp
        {
            return Some(format!("requires {min_xp} XP, have {xp}"));
        }
        if let Some(min_level) = self.min_level
            && level < min_level
        {
            return Some(format!("requires level {min_level}, have level {level}"));
        }
        None
    }
}

/// Level derived from experience points: `floor(xp / xp_per_level) + 1`.
pub fn level_for_xp(xp: u64, xp_per_level: u64) -> u32 {
    let per_level = xp_per_level.max(1);
    u32::try_from(xp / per_level)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

/// The user's off-chain reward progress, mirrored in the profile store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardProfile {
    pub address: WalletAddress,
    pub xp: u64,
    pub level: u32,
    pub last_checkin: Option<DateTime<Utc>>,
    pub completed_missions: BTreeSet<MissionId>,
    pub badges: BTreeSet<BadgeId>,
}

impl RewardProfile {
    /// A freshly inserted profile: xp 0, level 1, nothing completed.
    pub fn new(address: WalletAddress) -> Self {
        Self {
            address,
            xp: 0,
            level: 1,
            last_checkin: None,
            completed_missions: BTreeSet::new(),
            badges: BTreeSet::new(),
        }
    }
}

/// A rewarded user intent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CheckIn,
    CompleteMission { mission: MissionId },
    MintBadge { badge: BadgeId },
    Stake { micro_amount: u128 },
    ClaimDaily,
    SpinGacha,
}

impl Action {
    /// Key identifying what the action targets; one transaction per key may be in flight.
    pub fn target(&self) -> String {
        match self {
            Action::CheckIn => "check-in".to_string(),
            Action::CompleteMission { mission } => format!("mission {mission}"),
            Action::MintBadge { badge } => format!("badge {badge}"),
            Action::Stake { .. } => "stake".to_string(),
            Action::ClaimDaily => "daily claim".to_string(),
            Action::SpinGacha => "gacha spin".to_string(),
        }
    }
}

/// Formats a micro-unit amount as a decimal token string (`12.5`, `100`).
pub fn format_tokens(micro: u128) -> String {
    let whole = micro / MICRO_PER_TOKEN;
    let frac = micro % MICRO_PER_TOKEN;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:06}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Parses a decimal token string into micro-units, rejecting more than 6 decimals.
pub fn parse_tokens(input: &str) -> Option<u128> {
    let input = input.trim();
    let (whole, frac) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > 6 || !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac_micro: u128 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<6}").parse().ok()?
    };
    whole.checked_mul(MICRO_PER_TOKEN)?.checked_add(frac_micro)
}

/// Source of the current time; injected so calendar-day logic is testable.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Calendar date string (UTC) used for "already checked in today" comparisons.
pub fn calendar_day(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_formula_matches_thresholds() {
        assert_eq!(level_for_xp(0, 500), 1);
        assert_eq!(level_for_xp(499, 500), 1);
        assert_eq!(level_for_xp(500, 500), 2);
        assert_eq!(level_for_xp(2500, 500), 6);
        assert_eq!(level_for_xp(10, 0), 11, "zero divisor is clamped to 1");
    }

    #[test]
    fn badge_requirements() {
        let genesis = Badge {
            id: BadgeId("genesis".into()),
            title: "Genesis Pioneer".into(),
            subtitle: String::new(),
            requirement: String::new(),
            min_xp: Some(100),
            min_level: None,
            icon: String::new(),
        };
        assert!(genesis.unmet_requirement(99, 1).is_some());
        assert!(genesis.unmet_requirement(100, 1).is_none());

        let node = Badge {
            min_xp: None,
            min_level: Some(5),
            ..genesis.clone()
        };
        assert!(node.unmet_requirement(10_000, 4).unwrap().contains("level 5"));
        assert!(node.unmet_requirement(0, 5).is_none());
    }

    #[test]
    fn tx_status_parsing() {
        assert_eq!(TxStatus::parse("pending"), TxStatus::Pending);
        assert!(TxStatus::parse("success").is_success());
        assert!(TxStatus::parse("abort_by_response").is_terminal());
        assert_eq!(
            TxStatus::parse("dropped_replace_by_fee"),
            TxStatus::Dropped("dropped_replace_by_fee".into())
        );
        assert_eq!(TxStatus::parse("weird").as_str(), "weird");
        assert!(!TxStatus::Pending.is_terminal());
    }

    #[test]
    fn tx_id_short_form() {
        let id = TxId("0x1234567890abcdef1234".into());
        assert_eq!(id.short(), "0x1234...1234");
        assert_eq!(TxId("abc".into()).short(), "abc");
    }

    #[test]
    fn token_formatting() {
        assert_eq!(format_tokens(100 * MICRO_PER_TOKEN), "100");
        assert_eq!(format_tokens(12_500_000), "12.5");
        assert_eq!(format_tokens(1), "0.000001");
        assert_eq!(parse_tokens("12.5"), Some(12_500_000));
        assert_eq!(parse_tokens("0.000001"), Some(1));
        assert_eq!(parse_tokens(".5"), Some(500_000));
        assert_eq!(parse_tokens("1.0000001"), None);
        assert_eq!(parse_tokens("-3"), None);
        assert_eq!(parse_tokens(""), None);
    }

    #[test]
    fn calendar_day_crosses_midnight() {
        let late: DateTime<Utc> = "2024-01-01T23:59:59Z".parse().unwrap();
        let early: DateTime<Utc> = "2024-01-02T00:00:01Z".parse().unwrap();
        assert_ne!(calendar_day(&late), calendar_day(&early));
        assert_eq!(calendar_day(&late), "2024-01-01");
    }

    #[test]
    fn action_targets_are_distinct() {
        let a = Action::CompleteMission {
            mission: MissionId(1),
        };
        let b = Action::CompleteMission {
            mission: MissionId(2),
        };
        assert_ne!(a.target(), b.target());
        assert_eq!(Action::CheckIn.target(), "check-in");
    }
}
