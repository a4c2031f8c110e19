// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `questline balances` command implementation.

use std::process::ExitCode;

use questline_chain::StacksChainAdapter;
use questline_config::QuestlineConfig;
use questline_core::traits::ChainReadAdapter;
use questline_core::types::format_tokens;
use questline_core::{ClarityValue, ContractId, QuestlineError, WalletAddress};
use questline_engine::ContractRegistry;
use serde::Serialize;

use crate::output::Output;
use crate::profile::parse_address;

/// Structured balances output for `--json` mode. Amounts are micro-unit decimal strings.
#[derive(Debug, Serialize)]
pub struct BalancesResponse {
    pub address: WalletAddress,
    pub poin: String,
    pub one: String,
    pub tip_height: u64,
}

/// Reads a SIP-010 style `get-balance(principal)` result.
pub async fn read_balance(
    chain: &dyn ChainReadAdapter,
    token: &ContractId,
    function: &str,
    address: &WalletAddress,
) -> Result<u128, QuestlineError> {
    let principal = ClarityValue::principal(&address.0)?;
    chain
        .call_read_only(token, function, address, &[principal])
        .await?
        .as_uint()
}

/// Run the `questline balances` command.
pub async fn run_balances(
    config: &QuestlineConfig,
    out: &Output,
    address: &str,
) -> Result<ExitCode, QuestlineError> {
    let address = parse_address(address)?;
    let chain = StacksChainAdapter::new(&config.network)?;
    let registry = ContractRegistry::new(&config.contracts);

    let poin = read_balance(&chain, &registry.token_poin, &registry.balance_function, &address).await?;
    let one = read_balance(&chain, &registry.token_one, &registry.balance_function, &address).await?;
    let tip_height = chain.tip_height().await?;

    if out.is_json() {
        out.emit(&BalancesResponse {
            address,
            poin: poin.to_string(),
            one: one.to_string(),
            tip_height,
        })?;
        return Ok(ExitCode::SUCCESS);
    }

    out.header("questline balances");
    out.field("Address", &address);
    out.field("POIN", format_tokens(poin));
    out.field("ONE", format_tokens(one));
    out.field("Tip", out.dim(&format!("block {tip_height}")));
    out.footer();
    Ok(ExitCode::SUCCESS)
}
