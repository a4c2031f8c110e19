// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock wallet adapter for deterministic testing.
//!
//! Submissions return scripted outcomes in FIFO order; when the script is
//! empty each call is broadcast under a generated transaction id. Every
//! submitted [`ContractCall`] is recorded for later assertions.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};

use questline_core::{
    AdapterType, AppIdentity, ContractCall, HealthStatus, PluginAdapter, QuestlineError,
    SignInOutcome, SubmitOutcome, TxId, WalletAdapter, WalletAddress,
};

/// A wallet whose prompts are answered by a script instead of a user.
pub struct MockWallet {
    address: Mutex<Option<WalletAddress>>,
    sign_ins: Mutex<VecDeque<SignInOutcome>>,
    submissions: Mutex<VecDeque<Result<SubmitOutcome, QuestlineError>>>,
    submitted: Mutex<Vec<ContractCall>>,
    corrupted: AtomicBool,
    held: watch::Sender<bool>,
    next_tx: AtomicU64,
}

impl MockWallet {
    /// A wallet with no session.
    pub fn new() -> Self {
        Self::with_address(None)
    }

    /// A wallet that already holds a session for `address`.
    pub fn signed_in(address: impl Into<String>) -> Self {
        Self::with_address(Some(WalletAddress(address.into())))
    }

    fn with_address(address: Option<WalletAddress>) -> Self {
        Self {
            address: Mutex::new(address),
            sign_ins: Mutex::new(VecDeque::new()),
            submissions: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
            corrupted: AtomicBool::new(false),
            held: watch::Sender::new(false),
            next_tx: AtomicU64::new(1),
        }
    }

    /// Queue the answer to the next sign-in prompt.
    pub async fn push_sign_in(&self, outcome: SignInOutcome) {
        self.sign_ins.lock().await.push_back(outcome);
    }

    /// Queue the answer to the next contract-call prompt.
    pub async fn push_submission(&self, outcome: Result<SubmitOutcome, QuestlineError>) {
        self.submissions.lock().await.push_back(outcome);
    }

    /// Queue a broadcast under a fixed transaction id.
    pub async fn push_tx(&self, tx_id: &str) {
        self.push_submission(Ok(SubmitOutcome::Submitted(TxId(tx_id.to_string()))))
            .await;
    }

    /// Queue a dismissed prompt.
    pub async fn push_cancel(&self) {
        self.push_submission(Ok(SubmitOutcome::Cancelled)).await;
    }

    /// Makes every session query fail as if the persisted session were
    /// written by an incompatible provider version.
    pub fn corrupt_session(&self) {
        self.corrupted.store(true, Ordering::SeqCst);
    }

    /// Switches the session to another account without signing out.
    pub async fn switch_account(&self, address: impl Into<String>) {
        let address = WalletAddress(address.into());
        tracing::debug!(address = %address, "mock wallet switched account");
        *self.address.lock().await = Some(address);
    }

    /// Keeps contract-call prompts open until [`MockWallet::release_prompts`].
    pub fn hold_prompts(&self) {
        self.held.send_replace(true);
    }

    pub fn release_prompts(&self) {
        self.held.send_replace(false);
    }

    /// Calls handed to the wallet so far, including cancelled ones.
    pub async fn submitted(&self) -> Vec<ContractCall> {
        self.submitted.lock().await.clone()
    }

    pub async fn submission_count(&self) -> usize {
        self.submitted.lock().await.len()
    }

    fn check_session(&self) -> Result<(), QuestlineError> {
        if self.corrupted.load(Ordering::SeqCst) {
            return Err(QuestlineError::SessionCorrupted(
                "stored session has an unsupported version".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockWallet {
    fn name(&self) -> &str {
        "mock-wallet"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Wallet
    }

    async fn health_check(&self) -> Result<HealthStatus, QuestlineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), QuestlineError> {
        Ok(())
    }
}

#[async_trait]
impl WalletAdapter for MockWallet {
    async fn sign_in(&self, _app: &AppIdentity) -> Result<SignInOutcome, QuestlineError> {
        self.check_session()?;
        let outcome = self
            .sign_ins
            .lock()
            .await
            .pop_front()
            .unwrap_or(SignInOutcome::Cancelled);
        tracing::debug!(outcome = ?outcome, "mock wallet answered sign-in");
        if let SignInOutcome::SignedIn(address) = &outcome {
            *self.address.lock().await = Some(address.clone());
        }
        Ok(outcome)
    }

    async fn is_signed_in(&self) -> Result<bool, QuestlineError> {
        self.check_session()?;
        Ok(self.address.lock().await.is_some())
    }

    async fn address(&self) -> Result<Option<WalletAddress>, QuestlineError> {
        self.check_session()?;
        Ok(self.address.lock().await.clone())
    }

    async fn sign_out(&self) -> Result<(), QuestlineError> {
        self.corrupted.store(false, Ordering::SeqCst);
        *self.address.lock().await = None;
        Ok(())
    }

    async fn submit_contract_call(
        &self,
        call: ContractCall,
    ) -> Result<SubmitOutcome, QuestlineError> {
        self.check_session()?;
        tracing::debug!(function = %call.function_name, "mock wallet prompt opened");
        self.submitted.lock().await.push(call);
        let mut held = self.held.subscribe();
        let _ = held.wait_for(|held| !held).await;
        let outcome = match self.submissions.lock().await.pop_front() {
            Some(outcome) => outcome,
            None => {
                let n = self.next_tx.fetch_add(1, Ordering::SeqCst);
                Ok(SubmitOutcome::Submitted(TxId(format!("0x{n:064x}"))))
            }
        };
        tracing::debug!(outcome = ?outcome, "mock wallet prompt answered");
        outcome
    }
}
