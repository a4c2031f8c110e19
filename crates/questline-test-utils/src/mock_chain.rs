// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chain endpoints for deterministic testing.
//!
//! Transaction statuses are scripted per tx id; the last scripted step
//! repeats once the script runs out. Contract state is a lookup table keyed
//! by contract, map or function, and the rendered Clarity arguments.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use questline_core::{
    AdapterType, ChainReadAdapter, ClarityValue, ContractId, HealthStatus, PluginAdapter,
    QuestlineError, TxId, TxStatus, TxStatusAdapter, TxStatusReport, WalletAddress,
};

/// One scripted answer of the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusStep {
    Status {
        status: TxStatus,
        error_code: Option<String>,
    },
    /// Network failure or a not-yet-indexed transaction.
    Unreachable,
}

impl StatusStep {
    pub fn pending() -> Self {
        StatusStep::Status {
            status: TxStatus::Pending,
            error_code: None,
        }
    }

    pub fn success() -> Self {
        StatusStep::Status {
            status: TxStatus::Success,
            error_code: None,
        }
    }

    pub fn abort(error_code: &str) -> Self {
        StatusStep::Status {
            status: TxStatus::AbortByResponse,
            error_code: Some(error_code.to_string()),
        }
    }
}

/// Scripted status and read endpoints.
pub struct MockChain {
    scripts: Mutex<HashMap<TxId, VecDeque<StatusStep>>>,
    default_step: Mutex<StatusStep>,
    status_queries: Mutex<HashMap<TxId, usize>>,
    map_entries: Mutex<HashMap<String, ClarityValue>>,
    read_only: Mutex<HashMap<String, ClarityValue>>,
    tip_height: AtomicU64,
    reads_fail: AtomicBool,
    reads: AtomicUsize,
}

fn map_key(contract: &ContractId, map: &str, key: &ClarityValue) -> String {
    format!("{}/{map}/{key}", contract.name)
}

fn read_key(contract: &ContractId, function: &str, args: &[ClarityValue]) -> String {
    let args: Vec<String> = args.iter().map(ToString::to_string).collect();
    format!("{}/{function}/{}", contract.name, args.join(" "))
}

impl MockChain {
    /// Unknown transactions stay pending; every lookup answers `none`.
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            default_step: Mutex::new(StatusStep::pending()),
            status_queries: Mutex::new(HashMap::new()),
            map_entries: Mutex::new(HashMap::new()),
            read_only: Mutex::new(HashMap::new()),
            tip_height: AtomicU64::new(1),
            reads_fail: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
        }
    }

    /// Script the answers for `tx_id`, in order.
    pub async fn script(&self, tx_id: &str, steps: impl IntoIterator<Item = StatusStep>) {
        self.scripts
            .lock()
            .await
            .insert(TxId(tx_id.to_string()), steps.into_iter().collect());
    }

    /// Answer for transactions without a script.
    pub async fn set_default_step(&self, step: StatusStep) {
        *self.default_step.lock().await = step;
    }

    /// Status queries issued for `tx_id` so far.
    pub async fn status_queries(&self, tx_id: &str) -> usize {
        self.status_queries
            .lock()
            .await
            .get(&TxId(tx_id.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub async fn total_status_queries(&self) -> usize {
        self.status_queries.lock().await.values().sum()
    }

    pub async fn set_map_entry(
        &self,
        contract: &ContractId,
        map: &str,
        key: &ClarityValue,
        value: ClarityValue,
    ) {
        self.map_entries
            .lock()
            .await
            .insert(map_key(contract, map, key), value);
    }

    pub async fn set_read_only(
        &self,
        contract: &ContractId,
        function: &str,
        args: &[ClarityValue],
        value: ClarityValue,
    ) {
        self.read_only
            .lock()
            .await
            .insert(read_key(contract, function, args), value);
    }

    pub fn set_tip_height(&self, height: u64) {
        self.tip_height.store(height, Ordering::SeqCst);
    }

    /// Make every contract read fail with a transport error.
    pub fn fail_reads(&self, fail: bool) {
        self.reads_fail.store(fail, Ordering::SeqCst);
    }

    /// Contract reads (map entries, read-only calls, tip queries) so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn begin_read(&self) -> Result<(), QuestlineError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.reads_fail.load(Ordering::SeqCst) {
            tracing::debug!("mock chain read failed on request");
            return Err(QuestlineError::transport("mock chain unreachable"));
        }
        Ok(())
    }
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChain {
    fn name(&self) -> &str {
        "mock-chain"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ChainRead
    }

    async fn health_check(&self) -> Result<HealthStatus, QuestlineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), QuestlineError> {
        Ok(())
    }
}

#[async_trait]
impl TxStatusAdapter for MockChain {
    async fn tx_status(&self, tx_id: &TxId) -> Result<TxStatusReport, QuestlineError> {
        *self
            .status_queries
            .lock()
            .await
            .entry(tx_id.clone())
            .or_insert(0) += 1;

        let step = {
            let mut scripts = self.scripts.lock().await;
            match scripts.get_mut(tx_id) {
                Some(steps) if steps.len() > 1 => steps.pop_front(),
                Some(steps) => steps.front().cloned(),
                None => None,
            }
        };
        let step = match step {
            Some(step) => step,
            None => self.default_step.lock().await.clone(),
        };
        tracing::debug!(tx_id = %tx_id, step = ?step, "mock chain answered status query");

        match step {
            StatusStep::Status { status, error_code } => Ok(TxStatusReport {
                tx_id: tx_id.clone(),
                status,
                error_code,
            }),
            StatusStep::Unreachable => Err(QuestlineError::transport(format!(
                "transaction {tx_id} not indexed yet"
            ))),
        }
    }
}

#[async_trait]
impl ChainReadAdapter for MockChain {
    async fn map_entry(
        &self,
        contract: &ContractId,
        map: &str,
        key: &ClarityValue,
    ) -> Result<ClarityValue, QuestlineError> {
        self.begin_read()?;
        Ok(self
            .map_entries
            .lock()
            .await
            .get(&map_key(contract, map, key))
            .cloned()
            .unwrap_or(ClarityValue::OptionalNone))
    }

    async fn call_read_only(
        &self,
        contract: &ContractId,
        function: &str,
        _sender: &WalletAddress,
        args: &[ClarityValue],
    ) -> Result<ClarityValue, QuestlineError> {
        self.begin_read()?;
        Ok(self
            .read_only
            .lock()
            .await
            .get(&read_key(contract, function, args))
            .cloned()
            .unwrap_or(ClarityValue::OptionalNone))
    }

    async fn tip_height(&self) -> Result<u64, QuestlineError> {
        self.begin_read()?;
        Ok(self.tip_height.load(Ordering::SeqCst))
    }
}
