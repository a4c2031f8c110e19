// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The rewards engine: wires the session, dispatcher, optimistic cache,
//! confirmation poller, reconciler and profile writer together.
//!
//! Every action follows the same path:
//!
//! 1. local guards against the cache snapshot (no network),
//! 2. target reservation, so one transaction per target is in flight,
//! 3. the wallet prompt,
//! 4. the optimistic mutation and a store write,
//! 5. a background settlement task that polls, reverts on failure,
//!    re-reads authoritative state and writes the store again.
//!
//! Failures are caught at the action boundary and published as status
//! notices before being returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use questline_bus::{BusEvent, EngineEvent, EventBus, StatusNotice};
use questline_config::model::{QuestlineConfig, ReconcileMode};
use questline_core::{
    Action, BadgeId, ChainReadAdapter, Clock, MissionId, ProfileStoreAdapter, QuestlineError,
    SignInOutcome, TxId, TxStatusAdapter, TxStatusReport, WalletAddress,
};

use crate::cache::{CacheState, OptimisticCache};
use crate::catalog::Catalog;
use crate::contracts::ContractRegistry;
use crate::dispatcher::{Dispatcher, VaultRules};
use crate::pending::{PendingAction, PendingRegistry};
use crate::poller::{ConfirmationPoller, PollOutcome};
use crate::reconciler::{ReconcileReport, Reconciler};
use crate::session::{Session, SessionState};
use crate::writer::BackendWriter;

/// External collaborators other than the wallet, which the session owns.
#[derive(Clone)]
pub struct EngineAdapters {
    pub tx_status: Arc<dyn TxStatusAdapter>,
    pub chain: Arc<dyn ChainReadAdapter>,
    pub store: Arc<dyn ProfileStoreAdapter>,
    pub clock: Arc<dyn Clock>,
}

/// Handle to a broadcast action.
#[derive(Debug)]
pub struct ActionTicket {
    pub action: Action,
    pub tx_id: TxId,
    settlement: oneshot::Receiver<PollOutcome>,
}

impl ActionTicket {
    /// Waits for the settlement task: terminal status, corrective re-read and
    /// store write all done.
    pub async fn settled(self) -> PollOutcome {
        self.settlement.await.unwrap_or(PollOutcome::Cancelled)
    }

    /// Like [`ActionTicket::settled`], mapping anything but success to an error.
    pub async fn confirmed(self) -> Result<TxStatusReport, QuestlineError> {
        let tx_id = self.tx_id.clone();
        self.settled().await.into_result(&tx_id)
    }
}

#[derive(Clone)]
pub struct RewardsEngine {
    inner: Arc<Inner>,
}

struct Inner {
    session: Session,
    cache: OptimisticCache,
    catalog: Arc<Catalog>,
    dispatcher: Dispatcher,
    poller: ConfirmationPoller,
    reconciler: Reconciler,
    store: Arc<dyn ProfileStoreAdapter>,
    writer: BackendWriter,
    pending: PendingRegistry,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    mode: ReconcileMode,
    reconcile_delay: Duration,
    shutdown: CancellationToken,
    /// Cancelled when the user signs out; replaced on the next sign-in.
    session_scope: Mutex<CancellationToken>,
    tasks: TaskTracker,
}

impl RewardsEngine {
    pub fn new(
        config: &QuestlineConfig,
        session: Session,
        adapters: EngineAdapters,
        bus: EventBus,
    ) -> Self {
        let registry = Arc::new(ContractRegistry::new(&config.contracts));
        let catalog = Arc::new(Catalog::new(&config.rewards));
        let dispatcher = Dispatcher::new(
            session.wallet().clone(),
            registry.clone(),
            catalog.clone(),
            VaultRules::from(&config.vault),
            adapters.clock.clone(),
        );
        let reconciler = Reconciler::new(
            adapters.chain.clone(),
            adapters.store.clone(),
            registry,
            catalog.clone(),
            config.reconcile.authority,
        );
        let shutdown = CancellationToken::new();
        let session_scope = Mutex::new(shutdown.child_token());

        Self {
            inner: Arc::new(Inner {
                session,
                cache: OptimisticCache::new(config.rewards.xp_per_level),
                catalog,
                dispatcher,
                poller: ConfirmationPoller::new(adapters.tx_status, &config.poller),
                reconciler,
                store: adapters.store.clone(),
                writer: BackendWriter::new(adapters.store, &config.backend, bus.clone()),
                pending: PendingRegistry::new(),
                bus,
                clock: adapters.clock,
                mode: config.reconcile.mode,
                reconcile_delay: Duration::from_secs(config.reconcile.delay_secs),
                shutdown,
                session_scope,
                tasks: TaskTracker::new(),
            }),
        }
    }

    /// Loads the profile for a session restored by [`Session::init`] and
    /// reconciles it.
    pub async fn start(&self) -> Result<(), QuestlineError> {
        if let Some(address) = self.inner.session.address() {
            self.open_profile(address).await?;
        }
        Ok(())
    }

    /// Prompts the wallet for sign-in and loads the profile.
    pub async fn connect(&self) -> Result<SignInOutcome, QuestlineError> {
        match self.inner.session.connect().await {
            Ok(SignInOutcome::SignedIn(address)) => {
                self.open_profile(address.clone()).await?;
                Ok(SignInOutcome::SignedIn(address))
            }
            Ok(SignInOutcome::Cancelled) => {
                self.inner
                    .bus
                    .notify(StatusNotice::info("Sign-in cancelled."));
                Ok(SignInOutcome::Cancelled)
            }
            Err(e) => {
                self.fail(None, &e).await;
                Err(e)
            }
        }
    }

    /// Signs out, stops polling for this session and clears the cache.
    pub async fn disconnect(&self) -> Result<(), QuestlineError> {
        self.end_session("signed out").await;
        self.inner.session.teardown().await
    }

    pub async fn perform_check_in(&self) -> Result<ActionTicket, QuestlineError> {
        self.dispatch(Action::CheckIn).await
    }

    pub async fn complete_mission(&self, mission: MissionId) -> Result<ActionTicket, QuestlineError> {
        self.dispatch(Action::CompleteMission { mission }).await
    }

    pub async fn mint_badge(&self, badge: impl Into<String>) -> Result<ActionTicket, QuestlineError> {
        self.dispatch(Action::MintBadge {
            badge: BadgeId(badge.into()),
        })
        .await
    }

    /// Stakes `micro_amount` POIN micro-units.
    pub async fn stake(&self, micro_amount: u128) -> Result<ActionTicket, QuestlineError> {
        self.dispatch(Action::Stake { micro_amount }).await
    }

    pub async fn claim_daily(&self) -> Result<ActionTicket, QuestlineError> {
        self.dispatch(Action::ClaimDaily).await
    }

    pub async fn spin_gacha(&self) -> Result<ActionTicket, QuestlineError> {
        self.dispatch(Action::SpinGacha).await
    }

    /// Re-reads authoritative state now and stores the result.
    pub async fn refresh(&self) -> Result<ReconcileReport, QuestlineError> {
        let address = self.inner.session.require_address()?;
        let report = self.reconcile(&address).await?;
        self.inner.bus.publish(EngineEvent::Reconciled {
            address,
            corrected: report.corrected.clone(),
        });
        if !report.corrected.is_empty() {
            self.inner.writer.persist(&self.inner.cache).await;
        }
        Ok(report)
    }

    pub fn snapshot(&self) -> CacheState {
        self.inner.cache.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<CacheState> {
        self.inner.cache.subscribe()
    }

    pub fn session_state(&self) -> SessionState {
        self.inner.session.state()
    }

    pub fn subscribe_session(&self) -> watch::Receiver<SessionState> {
        self.inner.session.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<BusEvent> {
        self.inner.bus.subscribe()
    }

    pub fn pending(&self) -> Vec<PendingAction> {
        self.inner.pending.in_flight()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Cancels every polling task and waits for in-progress writes.
    pub async fn shutdown(&self) {
        info!(in_flight = self.inner.pending.len(), "shutting down rewards engine");
        self.inner.shutdown.cancel();
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
        self.inner.pending.clear();
        debug!("rewards engine stopped");
    }

    async fn open_profile(&self, address: WalletAddress) -> Result<(), QuestlineError> {
        let profile = self.inner.store.get_or_create_profile(&address).await?;
        info!(address = %address, xp = profile.xp, "profile loaded");
        self.inner.cache.load(profile);
        self.inner.writer.mark_stored(&self.inner.cache).await;
        {
            let mut scope = self.inner.session_scope.lock().await;
            if scope.is_cancelled() {
                *scope = self.inner.shutdown.child_token();
            }
        }
        self.inner.bus.publish(EngineEvent::SessionStarted {
            address: address.clone(),
        });
        self.reconcile_quietly(&address).await;
        Ok(())
    }

    async fn end_session(&self, reason: &str) {
        self.inner.session_scope.lock().await.cancel();
        self.inner.pending.clear();
        self.inner.cache.clear();
        self.inner.bus.publish(EngineEvent::SessionEnded {
            reason: reason.to_string(),
        });
    }

    async fn dispatch(&self, action: Action) -> Result<ActionTicket, QuestlineError> {
        match self.try_dispatch(action.clone()).await {
            Ok(ticket) => Ok(ticket),
            Err(e) => {
                self.fail(Some(&action), &e).await;
                Err(e)
            }
        }
    }

    async fn try_dispatch(&self, action: Action) -> Result<ActionTicket, QuestlineError> {
        let inner = &self.inner;
        let address = inner
            .session
            .refresh()
            .await?
            .ok_or(QuestlineError::NotAuthenticated)?;
        match inner.cache.snapshot().address() {
            Some(cached) if *cached == address => {}
            Some(cached) => {
                info!(from = %cached, to = %address, "wallet account changed");
                self.end_session("wallet account changed").await;
                self.open_profile(address.clone()).await?;
            }
            None => self.open_profile(address.clone()).await?,
        }

        inner.dispatcher.check(&action, &inner.cache.snapshot())?;
        let reservation = inner.pending.reserve(&action)?;
        let call = inner.dispatcher.build_call(&action)?;

        inner
            .bus
            .notify(StatusNotice::info("Awaiting wallet confirmation..."));
        let tx_id = match inner.dispatcher.submit(call).await {
            Ok(tx_id) => tx_id,
            Err(QuestlineError::SessionCorrupted(reason)) => {
                return Err(inner.session.wipe(reason).await);
            }
            Err(e) => return Err(e),
        };

        let snapshot = inner.cache.snapshot();
        if snapshot.address() != Some(&address) {
            warn!(tx_id = %tx_id, address = %address, "transaction broadcast after the session ended");
            return Err(QuestlineError::Untracked { tx_id });
        }
        let mutation = inner.dispatcher.forward_mutation(&action, &snapshot)?;
        let receipt = inner.cache.apply(&mutation)?;
        if !reservation.commit(PendingAction {
            action: action.clone(),
            tx_id: tx_id.clone(),
            receipt,
            submitted_at: inner.clock.now(),
        }) {
            debug!(tx_id = %tx_id, "reservation cleared while the prompt was open");
        }

        info!(tx_id = %tx_id, target = %action.target(), "action submitted");
        inner.bus.publish(EngineEvent::ActionSubmitted {
            action: action.clone(),
            tx_id: tx_id.clone(),
        });
        inner.bus.notify(StatusNotice::success(format!(
            "Tx broadcasted! ID: {}",
            tx_id.short()
        )));

        let scope = inner.session_scope.lock().await.clone();
        let engine = self.clone();
        inner.tasks.spawn(async move {
            engine.inner.writer.persist(&engine.inner.cache).await;
        });

        if inner.mode == ReconcileMode::FixedDelay {
            let engine = self.clone();
            let scope = scope.clone();
            let address = address.clone();
            let delay = inner.reconcile_delay;
            inner.tasks.spawn(async move {
                tokio::select! {
                    _ = scope.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {
                        engine.reconcile_quietly(&address).await;
                        engine.inner.writer.persist(&engine.inner.cache).await;
                    }
                }
            });
        }

        let (settled_tx, settled_rx) = oneshot::channel();
        let engine = self.clone();
        let settle_action = action.clone();
        let settle_tx_id = tx_id.clone();
        inner.tasks.spawn(async move {
            let outcome = engine
                .settle(settle_action, settle_tx_id, address, scope)
                .await;
            let _ = settled_tx.send(outcome);
        });

        Ok(ActionTicket {
            action,
            tx_id,
            settlement: settled_rx,
        })
    }

    /// Polls `tx_id` to a terminal outcome, then reverts on failure, re-reads
    /// authoritative state and writes the store.
    async fn settle(
        &self,
        action: Action,
        tx_id: TxId,
        address: WalletAddress,
        scope: CancellationToken,
    ) -> PollOutcome {
        let inner = &self.inner;
        let outcome = inner.poller.wait(&tx_id, &scope).await;
        let target = action.target();

        match &outcome {
            PollOutcome::Cancelled => {
                inner.pending.complete(&target, &tx_id);
                return outcome;
            }
            PollOutcome::Confirmed(_) => {
                inner.pending.complete(&target, &tx_id);
                inner.bus.publish(EngineEvent::ActionConfirmed {
                    action,
                    tx_id: tx_id.clone(),
                });
                inner
                    .bus
                    .notify(StatusNotice::success("Transaction confirmed."));
            }
            PollOutcome::Failed(report) => {
                if let Some(pending) = inner.pending.complete(&target, &tx_id)
                    && inner.cache.revert(&pending.receipt)
                {
                    info!(tx_id = %tx_id, "optimistic update reverted");
                }
                let error = QuestlineError::TransactionAborted {
                    tx_id: tx_id.clone(),
                    status: report.status.to_string(),
                    error_code: report.error_code.clone(),
                };
                inner.bus.publish(EngineEvent::ActionFailed {
                    action,
                    tx_id: tx_id.clone(),
                    status: report.status.to_string(),
                    error_code: report.error_code.clone(),
                });
                inner.bus.notify(StatusNotice::error(error.user_message()));
            }
            PollOutcome::TimedOut { waited } => {
                inner.pending.complete(&target, &tx_id);
                inner.bus.publish(EngineEvent::ActionTimedOut {
                    action,
                    tx_id: tx_id.clone(),
                });
                let error = QuestlineError::Timeout { duration: *waited };
                inner.bus.notify(StatusNotice::error(error.user_message()));
            }
        }

        self.reconcile_quietly(&address).await;
        inner.writer.persist(&inner.cache).await;
        outcome
    }

    /// Store reads wait for queued profile writes, so the store they see is
    /// never behind the cache.
    async fn reconcile(&self, address: &WalletAddress) -> Result<ReconcileReport, QuestlineError> {
        let inner = &self.inner;
        if inner.reconciler.reads_store() {
            inner
                .writer
                .read_through(&inner.cache, || inner.reconciler.reconcile(address, &inner.cache))
                .await
        } else {
            inner.reconciler.reconcile(address, &inner.cache).await
        }
    }

    /// Reconciles and publishes the result; failures are only logged.
    async fn reconcile_quietly(&self, address: &WalletAddress) {
        if self.inner.session.address().as_ref() != Some(address) {
            debug!(address = %address, "session changed, skipping reconcile");
            return;
        }
        match self.reconcile(address).await {
            Ok(report) => {
                if !report.failures.is_empty() {
                    warn!(address = %address, failures = ?report.failures, "reconcile incomplete");
                }
                self.inner.bus.publish(EngineEvent::Reconciled {
                    address: address.clone(),
                    corrected: report.corrected,
                });
            }
            Err(e) => warn!(address = %address, error = %e, "reconcile failed"),
        }
    }

    /// Turns an action failure into a status notice; a corrupted session also
    /// ends the local session.
    async fn fail(&self, action: Option<&Action>, error: &QuestlineError) {
        let target = action.map(Action::target).unwrap_or_default();
        match error {
            QuestlineError::SessionCorrupted(_) => {
                self.end_session("wallet session corrupted").await;
                warn!(target = %target, error = %error, "local state wiped");
            }
            QuestlineError::Cancelled => debug!(target = %target, "action cancelled"),
            e if e.is_local_guard() => debug!(target = %target, error = %e, "action rejected locally"),
            e => warn!(target = %target, error = %e, "action failed"),
        }
        let notice = match error {
            QuestlineError::Cancelled => StatusNotice::info(error.user_message()),
            _ => StatusNotice::error(error.user_message()),
        };
        self.inner.bus.notify(notice);
    }
}
