// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal and JSON rendering shared by the subcommands.

use std::io::IsTerminal;

use colored::Colorize;
use questline_core::QuestlineError;
use serde::Serialize;

/// Where and how command results are printed.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
    color: bool,
}

/// Error body printed to stdout in `--json` mode.
#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
    message: String,
}

impl Output {
    pub fn new(json: bool, plain: bool) -> Self {
        Self {
            json,
            color: !plain && std::io::stdout().is_terminal(),
        }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Prints `value` as pretty JSON.
    pub fn emit<T: Serialize>(&self, value: &T) -> Result<(), QuestlineError> {
        let rendered = serde_json::to_string_pretty(value)
            .map_err(|e| QuestlineError::Internal(format!("failed to render JSON: {e}")))?;
        println!("{rendered}");
        Ok(())
    }

    pub fn header(&self, title: &str) {
        println!();
        println!("  {title}");
        println!("  {}", "-".repeat(35));
    }

    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        println!("    {:<12}{value}", format!("{label}:"));
    }

    /// A field with a pass/fail marker in front of the value.
    pub fn marked(&self, label: &str, ok: bool, value: impl std::fmt::Display) {
        let value = value.to_string();
        let rendered = match (self.color, ok) {
            (true, true) => format!("{} {}", "✓".green(), value.green()),
            (true, false) => format!("{} {}", "✗".red(), value.red()),
            (false, true) => format!("[OK] {value}"),
            (false, false) => format!("[FAIL] {value}"),
        };
        self.field(label, rendered);
    }

    pub fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn footer(&self) {
        println!();
    }

    pub fn error(&self, error: &QuestlineError) {
        if self.json {
            let body = ErrorResponse {
                error: error_kind(error),
                message: error.to_string(),
            };
            if let Ok(rendered) = serde_json::to_string_pretty(&body) {
                println!("{rendered}");
                return;
            }
        }
        if self.color {
            eprintln!("{} {}", "error:".red().bold(), error);
        } else {
            eprintln!("error: {error}");
        }
    }
}

fn error_kind(error: &QuestlineError) -> &'static str {
    match error {
        QuestlineError::Config(_) => "config",
        QuestlineError::TransactionAborted { .. } => "transaction_aborted",
        QuestlineError::Timeout { .. } => "timeout",
        QuestlineError::Transport { .. } => "transport",
        QuestlineError::Storage { .. } | QuestlineError::BackendWrite { .. } => "storage",
        QuestlineError::Codec(_) => "codec",
        _ => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_names_the_kind() {
        let error = QuestlineError::TransactionAborted {
            tx_id: questline_core::TxId("0xabc".into()),
            status: "abort_by_response".into(),
            error_code: Some("u101".into()),
        };
        let body = ErrorResponse {
            error: error_kind(&error),
            message: error.to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "transaction_aborted");
        assert!(json["message"].as_str().unwrap().contains("u101"));
    }

    #[test]
    fn plain_output_never_colors() {
        let out = Output::new(false, true);
        assert_eq!(out.dim("x"), "x");
    }
}
