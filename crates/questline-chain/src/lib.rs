// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stacks chain API adapter for the Questline engine.
//!
//! Implements [`TxStatusAdapter`] and [`ChainReadAdapter`] over the public
//! chain HTTP API. Clarity values travel as `0x`-prefixed consensus hex.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use questline_config::model::NetworkConfig;
use questline_core::error::QuestlineError;
use questline_core::traits::{ChainReadAdapter, PluginAdapter, TxStatusAdapter};
use questline_core::types::{
    AdapterType, ContractId, HealthStatus, TxId, TxStatus, TxStatusReport, WalletAddress,
};
use questline_core::ClarityValue;
use tracing::{debug, info};

use crate::client::StacksClient;
use crate::types::{parse_error_code, CallReadRequest};

/// Chain adapter backed by [`StacksClient`].
#[derive(Debug, Clone)]
pub struct StacksChainAdapter {
    client: StacksClient,
}

impl StacksChainAdapter {
    pub fn new(config: &NetworkConfig) -> Result<Self, QuestlineError> {
        let client = StacksClient::new(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        info!(api = %client.base_url(), "chain adapter initialized");
        Ok(Self { client })
    }

    pub fn with_client(client: StacksClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for StacksChainAdapter {
    fn name(&self) -> &str {
        "stacks-api"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ChainRead
    }

    async fn health_check(&self) -> Result<HealthStatus, QuestlineError> {
        match self.client.info().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) if e.is_transient() => Ok(HealthStatus::Degraded(e.to_string())),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), QuestlineError> {
        Ok(())
    }
}

#[async_trait]
impl TxStatusAdapter for StacksChainAdapter {
    async fn tx_status(&self, tx_id: &TxId) -> Result<TxStatusReport, QuestlineError> {
        let Some(tx) = self.client.transaction(&tx_id.0).await? else {
            // Freshly broadcast transactions 404 until the indexer sees them.
            return Err(QuestlineError::transport(format!(
                "transaction {} not indexed yet",
                tx_id.short()
            )));
        };

        let status = TxStatus::parse(&tx.tx_status);
        let error_code = if status.is_terminal() && !status.is_success() {
            tx.tx_result
                .as_ref()
                .and_then(|r| r.repr.as_deref())
                .and_then(parse_error_code)
        } else {
            None
        };
        debug!(tx_id = %tx_id.short(), status = %status, "transaction status");

        Ok(TxStatusReport {
            tx_id: tx_id.clone(),
            status,
            error_code,
        })
    }
}

#[async_trait]
impl ChainReadAdapter for StacksChainAdapter {
    async fn map_entry(
        &self,
        contract: &ContractId,
        map: &str,
        key: &ClarityValue,
    ) -> Result<ClarityValue, QuestlineError> {
        let response = self
            .client
            .map_entry(&contract.address, &contract.name, map, &key.to_hex()?)
            .await?;
        ClarityValue::from_hex(&response.data)
    }

    async fn call_read_only(
        &self,
        contract: &ContractId,
        function: &str,
        sender: &WalletAddress,
        args: &[ClarityValue],
    ) -> Result<ClarityValue, QuestlineError> {
        let request = CallReadRequest {
            sender: sender.0.clone(),
            arguments: args
                .iter()
                .map(ClarityValue::to_hex)
                .collect::<Result<Vec<_>, _>>()?,
        };
        let response = self
            .client
            .call_read(&contract.address, &contract.name, function, &request)
            .await?;

        match (response.okay, response.result) {
            (true, Some(result)) => ClarityValue::from_hex(&result),
            (_, _) => Err(QuestlineError::Internal(format!(
                "read-only call {contract}::{function} failed: {}",
                response.cause.unwrap_or_else(|| "no result".to_string())
            ))),
        }
    }

    async fn tip_height(&self) -> Result<u64, QuestlineError> {
        Ok(self.client.info().await?.stacks_tip_height)
    }
}
