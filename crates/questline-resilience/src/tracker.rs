// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Consecutive-failure tracking with a degraded threshold.

use std::sync::atomic::{AtomicU32, Ordering};

/// State change reported by [`FailureTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing worth reporting.
    Unchanged,
    /// The failure count just reached the threshold.
    Degraded { consecutive_failures: u32 },
    /// A success after being degraded.
    Recovered,
}

/// Counts consecutive failures of one dependency.
///
/// Reports [`Transition::Degraded`] once when the count reaches the threshold
/// and [`Transition::Recovered`] on the first success after that.
#[derive(Debug)]
pub struct FailureTracker {
    name: String,
    threshold: u32,
    consecutive: AtomicU32,
}

impl FailureTracker {
    pub fn new(name: impl Into<String>, threshold: u32) -> Self {
        Self {
            name: name.into(),
            threshold: threshold.max(1),
            consecutive: AtomicU32::new(0),
        }
    }

    pub fn record_failure(&self) -> Transition {
        let count = self.consecutive.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        if count == self.threshold {
            tracing::error!(dependency = %self.name, consecutive_failures = count, "dependency degraded");
            Transition::Degraded {
                consecutive_failures: count,
            }
        } else {
            Transition::Unchanged
        }
    }

    pub fn record_success(&self) -> Transition {
        let previous = self.consecutive.swap(0, Ordering::SeqCst);
        if previous >= self.threshold {
            tracing::info!(dependency = %self.name, "dependency recovered");
            Transition::Recovered
        } else {
            Transition::Unchanged
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive.load(Ordering::SeqCst)
    }

    pub fn is_degraded(&self) -> bool {
        self.consecutive_failures() >= self.threshold
    }
}
