// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for reward profiles.
//!
//! WAL-mode SQLite with embedded migrations. All statements run on
//! `tokio-rusqlite`'s single background thread, which makes [`Database`] the
//! only writer.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteProfileStore;
pub use database::Database;
