// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transaction reconciliation engine for the Questline rewards dashboard.
//!
//! User actions become contract calls signed by the wallet. The engine shows
//! their effect immediately through an optimistic cache, polls the chain until
//! each transaction settles, rolls failed ones back, and finally re-reads the
//! authoritative sources named by the configured authority policy.

pub mod cache;
pub mod catalog;
pub mod contracts;
pub mod dispatcher;
pub mod engine;
pub mod pending;
pub mod poller;
pub mod reconciler;
pub mod session;
pub mod writer;

pub use cache::{CacheState, Mutation, OptimisticCache, Receipt, VaultState};
pub use catalog::Catalog;
pub use contracts::ContractRegistry;
pub use engine::{ActionTicket, EngineAdapters, RewardsEngine};
pub use pending::PendingAction;
pub use poller::{ConfirmationPoller, PollOutcome};
pub use reconciler::{ReconcileReport, Reconciler};
pub use session::{Session, SessionState};
