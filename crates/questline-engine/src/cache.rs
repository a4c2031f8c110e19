// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optimistic state cache.
//!
//! All writes go through one `watch` sender, so every mutation is a delta
//! applied to the latest state and readers always see a whole snapshot.
//! Applying a [`Mutation`] yields a [`Receipt`] that can undo exactly what
//! was applied, leaving later independent changes in place.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use questline_core::types::{calendar_day, level_for_xp};
use questline_core::{BadgeId, MissionId, QuestlineError, RewardProfile, WalletAddress};

/// Token balances and the chain position used by the daily claim guard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VaultState {
    /// POIN balance in micro-units, once read from chain.
    pub poin: Option<u128>,
    /// ONE balance in micro-units, once read from chain.
    pub one: Option<u128>,
    pub tip_height: Option<u64>,
    /// Tip height observed when the last daily claim was dispatched.
    pub last_claim_height: Option<u64>,
}

/// Everything the presentation layer renders for the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheState {
    pub profile: Option<RewardProfile>,
    pub vault: VaultState,
}

impl CacheState {
    pub fn address(&self) -> Option<&WalletAddress> {
        self.profile.as_ref().map(|p| &p.address)
    }

    pub fn xp(&self) -> u64 {
        self.profile.as_ref().map_or(0, |p| p.xp)
    }

    pub fn level(&self) -> u32 {
        self.profile.as_ref().map_or(1, |p| p.level)
    }

    pub fn has_mission(&self, id: MissionId) -> bool {
        self.profile
            .as_ref()
            .is_some_and(|p| p.completed_missions.contains(&id))
    }

    pub fn has_badge(&self, id: &BadgeId) -> bool {
        self.profile.as_ref().is_some_and(|p| p.badges.contains(id))
    }

    /// True when the last check-in falls on the same UTC calendar day as `now`.
    pub fn checked_in_on(&self, now: &DateTime<Utc>) -> bool {
        self.profile
            .as_ref()
            .and_then(|p| p.last_checkin.as_ref())
            .is_some_and(|last| calendar_day(last) == calendar_day(now))
    }
}

/// Forward change caused by one action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mutation {
    pub xp: u64,
    pub check_in_at: Option<DateTime<Utc>>,
    pub mission: Option<MissionId>,
    pub badge: Option<BadgeId>,
    pub poin_credit: u128,
    pub poin_debit: u128,
    pub claim_height: Option<u64>,
}

/// Exactly what a [`Mutation`] changed, for a later rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    address: WalletAddress,
    xp: u64,
    check_in: Option<(Option<DateTime<Utc>>, DateTime<Utc>)>,
    mission: Option<MissionId>,
    badge: Option<BadgeId>,
    poin_credit: u128,
    poin_debit: u128,
    claim_height: Option<(Option<u64>, u64)>,
}

impl Receipt {
    pub fn address(&self) -> &WalletAddress {
        &self.address
    }

    /// XP actually added.
    pub fn xp(&self) -> u64 {
        self.xp
    }
}

/// Single-writer, many-reader cache of the user's reward state.
#[derive(Debug)]
pub struct OptimisticCache {
    tx: watch::Sender<CacheState>,
    xp_per_level: u64,
}

impl OptimisticCache {
    pub fn new(xp_per_level: u64) -> Self {
        let (tx, _rx) = watch::channel(CacheState::default());
        Self { tx, xp_per_level }
    }

    pub fn snapshot(&self) -> CacheState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CacheState> {
        self.tx.subscribe()
    }

    /// Replaces the cache with a freshly loaded profile.
    pub fn load(&self, mut profile: RewardProfile) {
        profile.level = level_for_xp(profile.xp, self.xp_per_level);
        self.tx.send_replace(CacheState {
            profile: Some(profile),
            vault: VaultState::default(),
        });
    }

    /// Drops all user state.
    pub fn clear(&self) {
        self.tx.send_replace(CacheState::default());
    }

    /// Applies `mutation` to the current state and notifies observers.
    pub fn apply(&self, mutation: &Mutation) -> Result<Receipt, QuestlineError> {
        let xp_per_level = self.xp_per_level;
        let mut receipt = None;
        self.tx.send_if_modified(|state| {
            let Some(profile) = state.profile.as_mut() else {
                return false;
            };

            let before = profile.xp;
            profile.xp = profile.xp.saturating_add(mutation.xp);
            profile.level = level_for_xp(profile.xp, xp_per_level);
            let xp = profile.xp - before;

            let check_in = mutation.check_in_at.map(|at| {
                let previous = profile.last_checkin.replace(at);
                (previous, at)
            });
            let mission = mutation
                .mission
                .filter(|id| profile.completed_missions.insert(*id));
            let badge = mutation
                .badge
                .clone()
                .filter(|id| profile.badges.insert(id.clone()));

            let (poin_credit, poin_debit) = match state.vault.poin {
                Some(balance) => {
                    let credited = balance.saturating_add(mutation.poin_credit);
                    let debited = credited.saturating_sub(mutation.poin_debit);
                    state.vault.poin = Some(debited);
                    (credited - balance, credited - debited)
                }
                None => (0, 0),
            };
            let claim_height = mutation.claim_height.map(|height| {
                let previous = state.vault.last_claim_height.replace(height);
                (previous, height)
            });

            receipt = Some(Receipt {
                address: profile.address.clone(),
                xp,
                check_in,
                mission,
                badge,
                poin_credit,
                poin_debit,
                claim_height,
            });
            true
        });
        receipt.ok_or(QuestlineError::NotAuthenticated)
    }

    /// Undoes `receipt`. Flags and markers are restored only while they still
    /// hold the optimistic value. Returns false when nothing changed.
    pub fn revert(&self, receipt: &Receipt) -> bool {
        let xp_per_level = self.xp_per_level;
        self.tx.send_if_modified(|state| {
            if state.address() != Some(&receipt.address) {
                return false;
            }
            let before = state.clone();
            let Some(profile) = state.profile.as_mut() else {
                return false;
            };

            profile.xp = profile.xp.saturating_sub(receipt.xp);
            profile.level = level_for_xp(profile.xp, xp_per_level);
            if let Some((previous, optimistic)) = receipt.check_in
                && profile.last_checkin == Some(optimistic)
            {
                profile.last_checkin = previous;
            }
            if let Some(id) = receipt.mission {
                profile.completed_missions.remove(&id);
            }
            if let Some(id) = &receipt.badge {
                profile.badges.remove(id);
            }
            if let Some(balance) = state.vault.poin {
                state.vault.poin = Some(
                    balance
                        .saturating_sub(receipt.poin_credit)
                        .saturating_add(receipt.poin_debit),
                );
            }
            if let Some((previous, optimistic)) = receipt.claim_height
                && state.vault.last_claim_height == Some(optimistic)
            {
                state.vault.last_claim_height = previous;
            }
            *state != before
        })
    }

    /// Runs `f` against the state under the writer lock. Observers are
    /// notified only when `f` returns true.
    pub fn modify(&self, f: impl FnOnce(&mut CacheState) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    pub fn level_for(&self, xp: u64) -> u32 {
        level_for_xp(xp, self.xp_per_level)
    }
}
