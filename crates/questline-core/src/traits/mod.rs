// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the external collaborators of the engine.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod chain;
pub mod store;
pub mod wallet;

pub use adapter::PluginAdapter;
pub use chain::{ChainReadAdapter, TxStatusAdapter};
pub use store::ProfileStoreAdapter;
pub use wallet::WalletAdapter;
