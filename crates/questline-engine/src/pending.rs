// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-flight transaction registry: at most one transaction per action target.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use questline_core::{Action, QuestlineError, TxId};

use crate::cache::Receipt;

/// A broadcast transaction awaiting a terminal status.
#[derive(Debug, Clone)]
pub struct PendingAction {
    pub action: Action,
    pub tx_id: TxId,
    pub receipt: Receipt,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug)]
enum Slot {
    /// The wallet prompt is open; no tx id yet.
    Reserved(u64),
    InFlight(PendingAction),
}

#[derive(Debug, Default)]
pub struct PendingRegistry {
    slots: DashMap<String, Slot>,
    next_ticket: AtomicU64,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the action's target. Fails while another submission for the
    /// same target is open or in flight.
    pub fn reserve(&self, action: &Action) -> Result<Reservation<'_>, QuestlineError> {
        let target = action.target();
        match self.slots.entry(target.clone()) {
            Entry::Occupied(_) => Err(QuestlineError::ActionInFlight { target }),
            Entry::Vacant(slot) => {
                let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
                slot.insert(Slot::Reserved(ticket));
                Ok(Reservation {
                    registry: self,
                    target,
                    ticket,
                    committed: false,
                })
            }
        }
    }

    /// Removes and returns the in-flight entry for `target` if it still
    /// belongs to `tx_id`.
    pub fn complete(&self, target: &str, tx_id: &TxId) -> Option<PendingAction> {
        self.slots
            .remove_if(target, |_, slot| {
                matches!(slot, Slot::InFlight(pending) if pending.tx_id == *tx_id)
            })
            .and_then(|(_, slot)| match slot {
                Slot::InFlight(pending) => Some(pending),
                Slot::Reserved(_) => None,
            })
    }

    pub fn in_flight(&self) -> Vec<PendingAction> {
        let mut pending: Vec<PendingAction> = self
            .slots
            .iter()
            .filter_map(|entry| match entry.value() {
                Slot::InFlight(p) => Some(p.clone()),
                Slot::Reserved(_) => None,
            })
            .collect();
        pending.sort_by_key(|p| p.submitted_at);
        pending
    }

    pub fn is_busy(&self, action: &Action) -> bool {
        self.slots.contains_key(&action.target())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&self) {
        self.slots.clear();
    }
}

/// Holds a target while the wallet prompt is open. Dropping it without
/// [`Reservation::commit`] releases the target.
#[derive(Debug)]
pub struct Reservation<'a> {
    registry: &'a PendingRegistry,
    target: String,
    ticket: u64,
    committed: bool,
}

impl Reservation<'_> {
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Records the broadcast transaction under the reserved target.
    /// Returns false when the reservation was cleared in the meantime.
    pub fn commit(mut self, pending: PendingAction) -> bool {
        self.committed = true;
        match self.registry.slots.get_mut(&self.target) {
            Some(mut slot) if matches!(*slot, Slot::Reserved(t) if t == self.ticket) => {
                *slot = Slot::InFlight(pending);
                true
            }
            _ => false,
        }
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.registry
                .slots
                .remove_if(&self.target, |_, slot| {
                    matches!(slot, Slot::Reserved(t) if *t == self.ticket)
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Mutation, OptimisticCache};
    use questline_core::{MissionId, RewardProfile, WalletAddress};

    fn receipt() -> Receipt {
        let cache = OptimisticCache::new(500);
        cache.load(RewardProfile::new(WalletAddress(
            "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7".into(),
        )));
        cache.apply(&Mutation::default()).unwrap()
    }

    fn mission(id: u32) -> Action {
        Action::CompleteMission {
            mission: MissionId(id),
        }
    }

    #[test]
    fn second_reservation_for_same_target_fails() {
        let registry = PendingRegistry::new();
        let _held = registry.reserve(&mission(1)).unwrap();
        assert!(matches!(
            registry.reserve(&mission(1)),
            Err(QuestlineError::ActionInFlight { .. })
        ));
        assert!(registry.reserve(&mission(2)).is_ok());
    }

    #[test]
    fn dropped_reservation_releases_target() {
        let registry = PendingRegistry::new();
        drop(registry.reserve(&mission(1)).unwrap());
        assert!(registry.is_empty());
        assert!(registry.reserve(&mission(1)).is_ok());
    }

    #[test]
    fn committed_entry_lives_until_completed() {
        let registry = PendingRegistry::new();
        let action = mission(1);
        registry.reserve(&action).unwrap().commit(PendingAction {
            action: action.clone(),
            tx_id: TxId("abc".into()),
            receipt: receipt(),
            submitted_at: Utc::now(),
        });
        assert!(registry.is_busy(&action));
        assert_eq!(registry.in_flight().len(), 1);

        assert!(registry.complete(&action.target(), &TxId("other".into())).is_none());
        let done = registry.complete(&action.target(), &TxId("abc".into())).unwrap();
        assert_eq!(done.tx_id, TxId("abc".into()));
        assert!(!registry.is_busy(&action));
        assert!(registry.complete(&action.target(), &TxId("abc".into())).is_none());
    }

    #[test]
    fn stale_reservation_leaves_a_newer_one_alone() {
        let registry = PendingRegistry::new();
        let action = mission(1);
        let stale = registry.reserve(&action).unwrap();
        registry.clear();
        let fresh = registry.reserve(&action).unwrap();

        let committed = stale.commit(PendingAction {
            action: action.clone(),
            tx_id: TxId("old".into()),
            receipt: receipt(),
            submitted_at: Utc::now(),
        });
        assert!(!committed);
        assert!(registry.is_busy(&action));
        assert!(registry.in_flight().is_empty());
        drop(fresh);
        assert!(registry.is_empty());
    }
}
