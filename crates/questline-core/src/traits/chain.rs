// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chain API traits: transaction status and read-only state.

use async_trait::async_trait;

use crate::clarity::ClarityValue;
use crate::error::QuestlineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ContractId, TxId, TxStatusReport, WalletAddress};

/// Looks up the status of a broadcast transaction.
#[async_trait]
pub trait TxStatusAdapter: PluginAdapter {
    /// A transaction the indexer has not seen yet must be reported as a
    /// [`QuestlineError::Transport`] error or as pending, never as a failure.
    async fn tx_status(&self, tx_id: &TxId) -> Result<TxStatusReport, QuestlineError>;
}

/// Reads contract state without a transaction.
#[async_trait]
pub trait ChainReadAdapter: PluginAdapter {
    /// Looks up `key` in `map` of `contract`; `none` when absent.
    async fn map_entry(
        &self,
        contract: &ContractId,
        map: &str,
        key: &ClarityValue,
    ) -> Result<ClarityValue, QuestlineError>;

    /// Evaluates a read-only function as `sender`.
    async fn call_read_only(
        &self,
        contract: &ContractId,
        function: &str,
        sender: &WalletAddress,
        args: &[ClarityValue],
    ) -> Result<ClarityValue, QuestlineError>;

    /// Current chain tip height.
    async fn tip_height(&self) -> Result<u64, QuestlineError>;
}
