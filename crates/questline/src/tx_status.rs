// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `questline tx-status` command implementation.
//!
//! Queries the chain status endpoint once, or with `--watch` runs the
//! confirmation poller until the transaction settles, the configured wait
//! limit passes, or the user interrupts.

use std::process::ExitCode;
use std::sync::Arc;

use questline_chain::StacksChainAdapter;
use questline_config::QuestlineConfig;
use questline_core::traits::TxStatusAdapter;
use questline_core::{QuestlineError, TxId, TxStatusReport};
use questline_engine::{ConfirmationPoller, PollOutcome};
use serde::Serialize;
use tracing::info;

use crate::output::Output;
use crate::shutdown::install_signal_handler;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct TxStatusResponse {
    pub tx_id: String,
    pub status: String,
    pub settled: bool,
    pub error_code: Option<String>,
    /// Seconds spent waiting, set when `--watch` gave up.
    pub waited_secs: Option<u64>,
}

impl From<&TxStatusReport> for TxStatusResponse {
    fn from(report: &TxStatusReport) -> Self {
        Self {
            tx_id: report.tx_id.0.clone(),
            status: report.status.to_string(),
            settled: report.status.is_terminal(),
            error_code: report.error_code.clone(),
            waited_secs: None,
        }
    }
}

/// Accepts ids with or without the `0x` prefix.
pub fn normalize_tx_id(raw: &str) -> Result<TxId, QuestlineError> {
    let trimmed = raw.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(QuestlineError::Codec(format!(
            "`{raw}` is not a hex transaction id"
        )));
    }
    Ok(TxId(format!("0x{}", hex.to_ascii_lowercase())))
}

/// Run the `questline tx-status` command.
///
/// With `--watch` the exit code is a failure when the transaction aborted or
/// did not settle in time.
pub async fn run_tx_status(
    config: &QuestlineConfig,
    out: &Output,
    raw_tx_id: &str,
    watch: bool,
) -> Result<ExitCode, QuestlineError> {
    let tx_id = normalize_tx_id(raw_tx_id)?;
    let chain = Arc::new(StacksChainAdapter::new(&config.network)?);

    if !watch {
        let report = chain.tx_status(&tx_id).await?;
        print_response(out, TxStatusResponse::from(&report))?;
        return Ok(ExitCode::SUCCESS);
    }

    let cancel = install_signal_handler();
    let poller = ConfirmationPoller::new(chain, &config.poller);
    info!(tx_id = %tx_id.short(), max_wait_secs = config.poller.max_wait_secs, "watching transaction");

    let outcome = poller.wait(&tx_id, &cancel).await;
    let response = match &outcome {
        PollOutcome::Confirmed(report) | PollOutcome::Failed(report) => {
            TxStatusResponse::from(report)
        }
        PollOutcome::TimedOut { waited } => TxStatusResponse {
            tx_id: tx_id.0.clone(),
            status: "pending".to_string(),
            settled: false,
            error_code: None,
            waited_secs: Some(waited.as_secs()),
        },
        PollOutcome::Cancelled => {
            info!(tx_id = %tx_id.short(), "watch interrupted");
            return Ok(ExitCode::from(130));
        }
    };
    print_response(out, response)?;
    Ok(match outcome {
        PollOutcome::Confirmed(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

fn print_response(out: &Output, response: TxStatusResponse) -> Result<(), QuestlineError> {
    if out.is_json() {
        return out.emit(&response);
    }

    out.header("questline tx-status");
    out.field("Tx", &response.tx_id);
    let ok = response.status == "success";
    let failed = response.settled && !ok;
    if response.settled {
        out.marked("Status", ok, &response.status);
    } else {
        out.field("Status", &response.status);
    }
    if failed && let Some(code) = &response.error_code {
        out.field("Error", code);
    }
    if let Some(waited) = response.waited_secs {
        out.field("Waited", out.dim(&format!("{waited}s, still unconfirmed")));
    }
    out.footer();
    Ok(())
}
