// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives: bounded retry and consecutive-failure tracking.

pub mod retry;
pub mod tracker;

pub use retry::{retry, RetryPolicy};
pub use tracker::{FailureTracker, Transition};
