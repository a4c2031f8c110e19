// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Stacks chain API.
//!
//! Provides [`StacksClient`] which handles URL construction, JSON decoding and
//! one retry on transient statuses (429, 500, 502, 503, 504).

use std::time::Duration;

use questline_core::QuestlineError;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::types::{
    ApiErrorResponse, CallReadRequest, CallReadResponse, InfoResponse, MapEntryResponse,
    TransactionResponse,
};

/// HTTP client for chain API reads.
#[derive(Debug, Clone)]
pub struct StacksClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl StacksClient {
    /// Creates a client for `base_url` (e.g. `https://api.hiro.so`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, QuestlineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuestlineError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Overrides the delay before the retry of a transient failure.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches a transaction. `Ok(None)` when the indexer does not know it yet.
    pub async fn transaction(
        &self,
        tx_id: &str,
    ) -> Result<Option<TransactionResponse>, QuestlineError> {
        let url = format!("{}/extended/v1/tx/{tx_id}", self.base_url);
        self.send("transaction", || self.client.get(&url)).await
    }

    /// Looks up `key_hex` in a data map; the response carries the hex of an optional.
    pub async fn map_entry(
        &self,
        address: &str,
        contract: &str,
        map: &str,
        key_hex: &str,
    ) -> Result<MapEntryResponse, QuestlineError> {
        let url = format!(
            "{}/v2/map_entry/{address}/{contract}/{map}?proof=0",
            self.base_url
        );
        let key = key_hex.to_string();
        self.send("map_entry", || self.client.post(&url).json(&key))
            .await?
            .ok_or_else(|| not_found("map", &format!("{address}.{contract}::{map}")))
    }

    /// Evaluates a read-only function.
    pub async fn call_read(
        &self,
        address: &str,
        contract: &str,
        function: &str,
        request: &CallReadRequest,
    ) -> Result<CallReadResponse, QuestlineError> {
        let url = format!(
            "{}/v2/contracts/call-read/{address}/{contract}/{function}",
            self.base_url
        );
        self.send("call_read", || self.client.post(&url).json(request))
            .await?
            .ok_or_else(|| not_found("function", &format!("{address}.{contract}::{function}")))
    }

    /// Node info, including the chain tip height.
    pub async fn info(&self) -> Result<InfoResponse, QuestlineError> {
        let url = format!("{}/v2/info", self.base_url);
        self.send("info", || self.client.get(&url))
            .await?
            .ok_or_else(|| not_found("endpoint", "/v2/info"))
    }

    /// Sends the request built by `build`, retrying once on transient failures.
    async fn send<T, F>(&self, endpoint: &str, build: F) -> Result<Option<T>, QuestlineError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(endpoint, attempt, "retrying chain request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = match build().send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(endpoint, attempt, error = %e, "chain request failed");
                    last_error = Some(QuestlineError::Transport {
                        message: format!("{endpoint} request failed: {e}"),
                        source: Some(Box::new(e)),
                    });
                    continue;
                }
            };

            let status = response.status();
            debug!(endpoint, status = %status, attempt, "chain response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| QuestlineError::Transport {
                    message: format!("failed to read {endpoint} response: {e}"),
                    source: Some(Box::new(e)),
                })?;
                let parsed = serde_json::from_str(&body).map_err(|e| QuestlineError::Codec(
                    format!("failed to parse {endpoint} response: {e}"),
                ))?;
                return Ok(Some(parsed));
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }

            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api) => format!(
                    "chain API error on {endpoint} ({status}): {}{}",
                    api.error,
                    api.message.map(|m| format!(": {m}")).unwrap_or_default()
                ),
                Err(_) => format!("chain API returned {status} on {endpoint}: {body}"),
            };

            if is_transient_error(status) {
                warn!(endpoint, status = %status, "transient chain error");
                last_error = Some(QuestlineError::transport(message));
                continue;
            }

            return Err(QuestlineError::Internal(message));
        }

        Err(last_error.unwrap_or_else(|| {
            QuestlineError::transport(format!("{endpoint} request failed after retries"))
        }))
    }
}

fn not_found(kind: &str, what: &str) -> QuestlineError {
    QuestlineError::Internal(format!("{kind} {what} not found"))
}

/// Returns true for HTTP status codes worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}
