// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Questline - operator CLI for the rewards engine.
//!
//! Inspects transactions, stored profiles and token balances, and runs a
//! one-off reconciliation against the chain.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod balances;
mod output;
mod profile;
mod shutdown;
mod tx_status;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use questline_config::{QuestlineConfig, render_errors};
use questline_core::QuestlineError;

use crate::output::Output;

/// Questline - operator CLI for the rewards engine.
#[derive(Parser, Debug)]
#[command(name = "questline", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Disable colors.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the status of a transaction.
    TxStatus {
        tx_id: String,
        /// Keep polling until the transaction settles or the wait limit passes.
        #[arg(long)]
        watch: bool,
    },
    /// Show the stored reward profile of an address.
    Profile { address: String },
    /// Re-read authoritative state for an address and store the result.
    Reconcile {
        address: String,
        /// Report corrections without writing them back.
        #[arg(long)]
        dry_run: bool,
    },
    /// Show POIN and ONE balances of an address.
    Balances { address: String },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => questline_config::load_and_validate_path(path),
        None => questline_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.app.log_level);
    let out = Output::new(cli.json, cli.plain);

    let result = match cli.command {
        Commands::TxStatus { tx_id, watch } => {
            tx_status::run_tx_status(&config, &out, &tx_id, watch).await
        }
        Commands::Profile { address } => profile::run_profile(&config, &out, &address).await,
        Commands::Reconcile { address, dry_run } => {
            profile::run_reconcile(&config, &out, &address, dry_run).await
        }
        Commands::Balances { address } => balances::run_balances(&config, &out, &address).await,
        Commands::Config => print_config(&config, &out),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            out.error(&e);
            ExitCode::FAILURE
        }
    }
}

fn print_config(config: &QuestlineConfig, out: &Output) -> Result<ExitCode, QuestlineError> {
    if out.is_json() {
        out.emit(config)?;
        return Ok(ExitCode::SUCCESS);
    }
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| QuestlineError::Internal(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(ExitCode::SUCCESS)
}

/// Logs go to stderr so `--json` output stays parseable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("questline={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn parses_watch_flag() {
        let cli = Cli::parse_from(["questline", "tx-status", "0xabc", "--watch", "--json"]);
        assert!(cli.json);
        match cli.command {
            Commands::TxStatus { tx_id, watch } => {
                assert_eq!(tx_id, "0xabc");
                assert!(watch);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn reconcile_defaults_to_writing() {
        let cli = Cli::parse_from(["questline", "reconcile", "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7"]);
        assert!(matches!(cli.command, Commands::Reconcile { dry_run: false, .. }));
    }

    #[test]
    fn default_config_renders_as_toml() {
        let rendered = toml::to_string_pretty(&QuestlineConfig::default()).unwrap();
        assert!(rendered.contains("[network]"));
        assert!(rendered.contains("[reconcile.authority]"));
    }
}
