// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `questline profile` and `questline reconcile` command implementations.

use std::process::ExitCode;
use std::sync::Arc;

use questline_chain::StacksChainAdapter;
use questline_config::QuestlineConfig;
use questline_core::traits::ProfileStoreAdapter;
use questline_core::types::calendar_day;
use questline_core::{QuestlineError, RewardProfile, StandardPrincipal, WalletAddress};
use questline_engine::{Catalog, ContractRegistry, OptimisticCache, ReconcileReport, Reconciler};
use questline_storage::SqliteProfileStore;
use serde::Serialize;
use tracing::info;

use crate::output::Output;

/// Structured output of `questline reconcile --json`.
#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub address: WalletAddress,
    pub written: bool,
    pub report: ReconcileReport,
    pub profile: Option<RewardProfile>,
}

/// Validates a standard principal and wraps it.
pub fn parse_address(raw: &str) -> Result<WalletAddress, QuestlineError> {
    let raw = raw.trim();
    StandardPrincipal::from_address(raw)?;
    Ok(WalletAddress(raw.to_string()))
}

async fn open_store(config: &QuestlineConfig) -> Result<SqliteProfileStore, QuestlineError> {
    let store = SqliteProfileStore::new(config.storage.clone());
    store.initialize().await?;
    Ok(store)
}

/// Run the `questline profile` command.
pub async fn run_profile(
    config: &QuestlineConfig,
    out: &Output,
    address: &str,
) -> Result<ExitCode, QuestlineError> {
    let address = parse_address(address)?;
    let store = open_store(config).await?;
    let profile = store.get_profile(&address).await;
    store.close().await?;

    let Some(profile) = profile? else {
        if out.is_json() {
            out.emit(&Option::<RewardProfile>::None)?;
            return Ok(ExitCode::SUCCESS);
        }
        out.header("questline profile");
        out.field("Address", &address);
        out.field("Profile", out.dim("not stored yet"));
        out.footer();
        return Ok(ExitCode::SUCCESS);
    };

    if out.is_json() {
        out.emit(&profile)?;
        return Ok(ExitCode::SUCCESS);
    }
    print_profile(config, out, &profile);
    out.footer();
    Ok(ExitCode::SUCCESS)
}

/// Run the `questline reconcile` command.
///
/// Loads the stored profile (or a fresh one), re-reads every field from its
/// configured authority and writes the corrected profile back unless
/// `dry_run` is set.
pub async fn run_reconcile(
    config: &QuestlineConfig,
    out: &Output,
    address: &str,
    dry_run: bool,
) -> Result<ExitCode, QuestlineError> {
    let address = parse_address(address)?;
    let store = Arc::new(open_store(config).await?);
    let chain = Arc::new(StacksChainAdapter::new(&config.network)?);

    let stored = if dry_run {
        store
            .get_profile(&address)
            .await?
            .unwrap_or_else(|| RewardProfile::new(address.clone()))
    } else {
        store.get_or_create_profile(&address).await?
    };

    let cache = OptimisticCache::new(config.rewards.xp_per_level);
    cache.load(stored);
    let reconciler = Reconciler::new(
        chain,
        store.clone(),
        Arc::new(ContractRegistry::new(&config.contracts)),
        Arc::new(Catalog::new(&config.rewards)),
        config.reconcile.authority,
    );
    let report = reconciler.reconcile(&address, &cache).await?;
    let state = cache.snapshot();

    let mut written = false;
    if !dry_run
        && !report.corrected.is_empty()
        && let Some(profile) = &state.profile
    {
        store.update_profile(profile).await?;
        written = true;
        info!(address = %address, corrected = report.corrected.len(), "reconciled profile stored");
    }
    store.close().await?;

    if out.is_json() {
        out.emit(&ReconcileResponse {
            address,
            written,
            report,
            profile: state.profile,
        })?;
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(profile) = &state.profile {
        print_profile(config, out, profile);
    }
    if report.corrected.is_empty() {
        out.marked("Corrected", true, "nothing");
    } else {
        out.marked("Corrected", true, report.corrected.join(", "));
    }
    for failure in &report.failures {
        out.marked("Read", false, failure);
    }
    if dry_run && !report.corrected.is_empty() {
        out.field("Stored", out.dim("unchanged (dry run)"));
    }
    out.footer();
    Ok(ExitCode::SUCCESS)
}

fn print_profile(config: &QuestlineConfig, out: &Output, profile: &RewardProfile) {
    out.header("questline profile");
    out.field("Address", &profile.address);
    out.field("XP", profile.xp);
    out.field("Level", profile.level);
    out.field(
        "Check-in",
        profile
            .last_checkin
            .as_ref()
            .map(calendar_day)
            .unwrap_or_else(|| out.dim("never")),
    );
    for mission in &config.rewards.missions {
        let done = profile.completed_missions.contains(&mission.id);
        out.marked(&format!("Mission {}", mission.id), done, &mission.title);
    }
    for badge in &config.rewards.badges {
        let owned = profile.badges.contains(&badge.id);
        out.marked("Badge", owned, &badge.title);
    }
}
