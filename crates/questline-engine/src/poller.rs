// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confirmation poller.
//!
//! Queries the status endpoint once per interval until the transaction
//! reaches a terminal status, `max_wait` elapses, or the cancellation token
//! fires. Transport failures count as "still pending".

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use questline_config::model::PollerConfig;
use questline_core::{QuestlineError, TxId, TxStatusAdapter, TxStatusReport};

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Confirmed(TxStatusReport),
    /// Terminal non-success status, with the remote error code if any.
    Failed(TxStatusReport),
    TimedOut { waited: Duration },
    Cancelled,
}

impl PollOutcome {
    pub fn is_terminal_status(&self) -> bool {
        matches!(self, PollOutcome::Confirmed(_) | PollOutcome::Failed(_))
    }

    /// Maps non-success outcomes to the error a caller should surface.
    pub fn into_result(self, tx_id: &TxId) -> Result<TxStatusReport, QuestlineError> {
        match self {
            PollOutcome::Confirmed(report) => Ok(report),
            PollOutcome::Failed(report) => Err(QuestlineError::TransactionAborted {
                tx_id: report.tx_id,
                status: report.status.to_string(),
                error_code: report.error_code,
            }),
            PollOutcome::TimedOut { waited } => {
                debug!(tx_id = %tx_id, "confirmation timed out");
                Err(QuestlineError::Timeout { duration: waited })
            }
            PollOutcome::Cancelled => Err(QuestlineError::Internal(format!(
                "polling for {tx_id} was cancelled"
            ))),
        }
    }
}

#[derive(Clone)]
pub struct ConfirmationPoller {
    chain: Arc<dyn TxStatusAdapter>,
    interval: Duration,
    max_wait: Duration,
}

impl ConfirmationPoller {
    pub fn new(chain: Arc<dyn TxStatusAdapter>, config: &PollerConfig) -> Self {
        Self::with_timing(
            chain,
            Duration::from_secs(config.interval_secs),
            Duration::from_secs(config.max_wait_secs),
        )
    }

    pub fn with_timing(
        chain: Arc<dyn TxStatusAdapter>,
        interval: Duration,
        max_wait: Duration,
    ) -> Self {
        Self {
            chain,
            interval: interval.max(Duration::from_millis(1)),
            max_wait,
        }
    }

    /// Polls `tx_id` until a terminal outcome. The first query is issued
    /// immediately.
    pub async fn wait(&self, tx_id: &TxId, cancel: &CancellationToken) -> PollOutcome {
        let started = Instant::now();
        let deadline = started + self.max_wait;
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut queries: u32 = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(tx_id = %tx_id, queries, "polling cancelled");
                    return PollOutcome::Cancelled;
                }
                _ = tokio::time::sleep_until(deadline) => {
                    let waited = started.elapsed();
                    warn!(tx_id = %tx_id, queries, waited_secs = waited.as_secs(), "transaction not confirmed in time");
                    return PollOutcome::TimedOut { waited };
                }
                _ = ticker.tick() => {}
            }

            queries += 1;
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                result = self.chain.tx_status(tx_id) => result,
            };
            match result {
                Ok(report) if report.status.is_success() => {
                    info!(tx_id = %tx_id, queries, "transaction confirmed");
                    return PollOutcome::Confirmed(report);
                }
                Ok(report) if report.status.is_terminal() => {
                    warn!(
                        tx_id = %tx_id,
                        status = %report.status,
                        error_code = report.error_code.as_deref().unwrap_or("-"),
                        "transaction failed"
                    );
                    return PollOutcome::Failed(report);
                }
                Ok(_) => debug!(tx_id = %tx_id, queries, "transaction pending"),
                Err(e) if e.is_transient() => {
                    debug!(tx_id = %tx_id, error = %e, "status query failed, treating as pending");
                }
                Err(e) => {
                    warn!(tx_id = %tx_id, error = %e, "status query rejected, treating as pending");
                }
            }
        }
    }

    /// Polls on a background task. `on_success` runs at most once, only for
    /// a confirmed transaction, before the task completes.
    pub fn spawn<F>(
        &self,
        tx_id: TxId,
        cancel: CancellationToken,
        on_success: F,
    ) -> JoinHandle<PollOutcome>
    where
        F: FnOnce(&TxStatusReport) + Send + 'static,
    {
        let poller = self.clone();
        tokio::spawn(async move {
            let outcome = poller.wait(&tx_id, &cancel).await;
            if let PollOutcome::Confirmed(report) = &outcome {
                on_success(report);
            }
            outcome
        })
    }
}
