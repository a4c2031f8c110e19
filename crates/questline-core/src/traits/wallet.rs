// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wallet/session provider trait.

use async_trait::async_trait;

use crate::error::QuestlineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AppIdentity, ContractCall, SignInOutcome, SubmitOutcome, WalletAddress};

/// A wallet that owns the user's session and signs contract calls.
///
/// The provider owns session persistence. Implementations report a corrupted
/// or version-incompatible stored session as [`QuestlineError::SessionCorrupted`]
/// from [`is_signed_in`](Self::is_signed_in) or [`address`](Self::address).
#[async_trait]
pub trait WalletAdapter: PluginAdapter {
    /// Prompts the user to authenticate. Dismissing the prompt is not an error.
    async fn sign_in(&self, app: &AppIdentity) -> Result<SignInOutcome, QuestlineError>;

    async fn is_signed_in(&self) -> Result<bool, QuestlineError>;

    /// Address of the signed-in account, if any.
    async fn address(&self) -> Result<Option<WalletAddress>, QuestlineError>;

    /// Ends the provider session and clears whatever it persisted.
    async fn sign_out(&self) -> Result<(), QuestlineError>;

    /// Asks the user to sign and broadcast `call`.
    ///
    /// Resolves once: with the broadcast transaction id, or with
    /// [`SubmitOutcome::Cancelled`] when the prompt is dismissed.
    async fn submit_contract_call(
        &self,
        call: ContractCall,
    ) -> Result<SubmitOutcome, QuestlineError>;
}
