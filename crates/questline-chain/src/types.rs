// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the chain API.

use serde::{Deserialize, Serialize};

/// `GET /extended/v1/tx/{tx_id}` (only the fields we read).
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionResponse {
    pub tx_id: Option<String>,
    pub tx_status: String,
    #[serde(default)]
    pub tx_result: Option<TxResult>,
}

/// Clarity result of an executed transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TxResult {
    #[serde(default)]
    pub hex: Option<String>,
    #[serde(default)]
    pub repr: Option<String>,
}

/// `POST /v2/map_entry/...` response.
#[derive(Debug, Clone, Deserialize)]
pub struct MapEntryResponse {
    pub data: String,
    #[serde(default)]
    pub proof: Option<String>,
}

/// `POST /v2/contracts/call-read/...` request body.
#[derive(Debug, Clone, Serialize)]
pub struct CallReadRequest {
    pub sender: String,
    pub arguments: Vec<String>,
}

/// `POST /v2/contracts/call-read/...` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CallReadResponse {
    pub okay: bool,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub cause: Option<String>,
}

/// `GET /v2/info` (only the fields we read).
#[derive(Debug, Clone, Deserialize)]
pub struct InfoResponse {
    pub stacks_tip_height: u64,
}

/// Error body returned by the API on 4xx/5xx.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Extracts the error code from a result repr such as `(err u101)`.
pub fn parse_error_code(repr: &str) -> Option<String> {
    let inner = repr.trim().strip_prefix("(err ")?.strip_suffix(')')?.trim();
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}
