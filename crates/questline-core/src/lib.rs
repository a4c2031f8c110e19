// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Questline rewards engine.
//!
//! This crate provides the adapter traits, error type, domain types and the
//! Clarity value codec shared by every other crate in the workspace.

pub mod c32;
pub mod clarity;
pub mod error;
pub mod traits;
pub mod types;

pub use clarity::{ClarityValue, StandardPrincipal};
pub use error::QuestlineError;
pub use types::{
    Action, AdapterType, AppIdentity, Badge, BadgeId, Clock, ContractCall, ContractId,
    HealthStatus, Mission, MissionId, PostConditionMode, RewardProfile, SignInOutcome,
    SignInStatus, SubmitOutcome, SystemClock, TxId, TxStatus, TxStatusReport, WalletAddress,
};

pub use traits::{
    ChainReadAdapter, PluginAdapter, ProfileStoreAdapter, TxStatusAdapter, WalletAdapter,
};
