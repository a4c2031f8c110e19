// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event types published on the engine bus.

use chrono::{DateTime, Utc};
use questline_core::{Action, TxId, WalletAddress};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of a user-visible status notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A short message for the presentation layer ("Tx Broadcasted! ID: 0x12ab...cdef").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNotice {
    pub level: NoticeLevel,
    pub message: String,
}

impl StatusNotice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// What happened inside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    SessionStarted {
        address: WalletAddress,
    },
    SessionEnded {
        reason: String,
    },
    /// The wallet broadcast a transaction and the optimistic mutation was applied.
    ActionSubmitted {
        action: Action,
        tx_id: TxId,
    },
    ActionConfirmed {
        action: Action,
        tx_id: TxId,
    },
    /// The transaction aborted; the optimistic mutation was reverted.
    ActionFailed {
        action: Action,
        tx_id: TxId,
        status: String,
        error_code: Option<String>,
    },
    ActionTimedOut {
        action: Action,
        tx_id: TxId,
    },
    /// Authoritative state was re-read; `corrected` names fields that changed.
    Reconciled {
        address: WalletAddress,
        corrected: Vec<String>,
    },
    BackendDegraded {
        consecutive_failures: u32,
        message: String,
    },
    BackendRecovered,
    Notice(StatusNotice),
}

impl EngineEvent {
    /// Short type name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::SessionStarted { .. } => "session_started",
            EngineEvent::SessionEnded { .. } => "session_ended",
            EngineEvent::ActionSubmitted { .. } => "action_submitted",
            EngineEvent::ActionConfirmed { .. } => "action_confirmed",
            EngineEvent::ActionFailed { .. } => "action_failed",
            EngineEvent::ActionTimedOut { .. } => "action_timed_out",
            EngineEvent::Reconciled { .. } => "reconciled",
            EngineEvent::BackendDegraded { .. } => "backend_degraded",
            EngineEvent::BackendRecovered => "backend_recovered",
            EngineEvent::Notice(_) => "notice",
        }
    }
}

/// An event with its id and publication time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEvent {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub event: EngineEvent,
}

impl BusEvent {
    pub fn new(event: EngineEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            event,
        }
    }
}
