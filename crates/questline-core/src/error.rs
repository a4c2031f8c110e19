// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Questline rewards engine.

use std::time::Duration;

use thiserror::Error;

use crate::types::TxId;

/// The primary error type used across all Questline adapter traits and engine operations.
#[derive(Debug, Error)]
pub enum QuestlineError {
    /// Configuration errors (invalid TOML, missing required fields, bad templates).
    #[error("configuration error: {0}")]
    Config(String),

    /// An action was attempted without a signed-in wallet.
    #[error("connect wallet first")]
    NotAuthenticated,

    /// The local idempotency guard tripped; no transaction was submitted.
    #[error("{target} already completed")]
    AlreadyCompleted { target: String },

    /// The same target already has a transaction awaiting confirmation.
    #[error("{target} already has a transaction in flight")]
    ActionInFlight { target: String },

    /// The user declined the wallet prompt.
    #[error("transaction cancelled by user")]
    Cancelled,

    /// The chain reported the transaction as aborted or dropped after broadcast.
    #[error("transaction {tx_id} failed with status {status}{}", format_error_code(.error_code))]
    TransactionAborted {
        tx_id: TxId,
        status: String,
        error_code: Option<String>,
    },

    /// The wallet broadcast a transaction after the session it belonged to
    /// ended, so nothing tracks it.
    #[error("transaction {tx_id} was broadcast after the wallet session ended")]
    Untracked { tx_id: TxId },

    /// Transient failure talking to a chain endpoint (network error, 5xx, not indexed yet).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Writing the profile mirror to the backend store failed.
    #[error("backend write failed: {message}")]
    BackendWrite {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The action names a mission or badge that is not in the catalog.
    #[error("unknown {0}")]
    UnknownTarget(String),

    /// Badge requirements (minimum XP or level) are not met yet.
    #[error("badge `{badge}` is locked: {requirement}")]
    BadgeLocked { badge: String, requirement: String },

    /// An amount argument was zero, negative, or not representable.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The known token balance does not cover the action.
    #[error("insufficient balance: need {needed}, have {available} (micro-units)")]
    InsufficientBalance { needed: u128, available: u128 },

    /// Clarity value or address encoding/decoding failed.
    #[error("codec error: {0}")]
    Codec(String),

    /// The wallet provider reported a corrupted or incompatible session.
    #[error("wallet session corrupted: {0}")]
    SessionCorrupted(String),

    /// Wallet provider failure other than cancellation.
    #[error("wallet error: {message}")]
    Wallet {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

fn format_error_code(code: &Option<String>) -> String {
    match code {
        Some(code) => format!(" (error code {code})"),
        None => String::new(),
    }
}

impl QuestlineError {
    /// Shorthand for a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        QuestlineError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true for failures the poller should swallow and retry on the next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, QuestlineError::Transport { .. })
    }

    /// Returns true for failures recovered locally without any network round trip.
    pub fn is_local_guard(&self) -> bool {
        matches!(
            self,
            QuestlineError::NotAuthenticated
                | QuestlineError::AlreadyCompleted { .. }
                | QuestlineError::ActionInFlight { .. }
                | QuestlineError::UnknownTarget(_)
                | QuestlineError::BadgeLocked { .. }
                | QuestlineError::InvalidAmount(_)
                | QuestlineError::InsufficientBalance { .. }
        )
    }

    /// Message suitable for a status notice in the presentation layer.
    pub fn user_message(&self) -> String {
        match self {
            QuestlineError::NotAuthenticated => "Please connect your wallet first.".to_string(),
            QuestlineError::AlreadyCompleted { target } => format!("{target} is already done."),
            QuestlineError::ActionInFlight { target } => {
                format!("{target} is already awaiting confirmation.")
            }
            QuestlineError::Cancelled => "Transaction cancelled by user.".to_string(),
            QuestlineError::TransactionAborted { error_code, .. } => match error_code {
                Some(code) => format!("Transaction failed on chain (error {code})."),
                None => "Transaction failed on chain.".to_string(),
            },
            QuestlineError::Timeout { .. } => {
                "Transaction is taking too long to confirm. Refresh later.".to_string()
            }
            QuestlineError::BadgeLocked { requirement, .. } => {
                format!("Requirements not met: {requirement}.")
            }
            QuestlineError::InsufficientBalance { .. } => "Insufficient balance.".to_string(),
            QuestlineError::UnknownTarget(what) => format!("Unknown {what}."),
            QuestlineError::InvalidAmount(detail) => format!("Invalid amount: {detail}."),
            QuestlineError::SessionCorrupted(_) => {
                "Wallet session was reset. Please reconnect.".to_string()
            }
            QuestlineError::Untracked { tx_id } => format!(
                "Tx {} was broadcast after you signed out. Check it in the explorer.",
                tx_id.short()
            ),
            _ => "Failed to initiate transaction.".to_string(),
        }
    }
}
