// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Questline engine tests.
//!
//! Provides scripted in-process adapters so engine behaviour can be tested
//! deterministically without a wallet, a chain node, or a database.
//!
//! # Components
//!
//! - [`MockWallet`] - Wallet with scripted sign-in and submission outcomes
//! - [`MockChain`] - Status and read endpoints with scripted answers
//! - [`MemoryProfileStore`] - Profile store with write-failure injection
//! - [`FixedClock`] - Manually advanced clock

pub mod clock;
pub mod memory_store;
pub mod mock_chain;
pub mod mock_wallet;

pub use clock::FixedClock;
pub use memory_store::MemoryProfileStore;
pub use mock_chain::MockChain;
pub use mock_wallet::MockWallet;

/// A valid mainnet address for tests.
pub const TEST_ADDRESS: &str = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7";
