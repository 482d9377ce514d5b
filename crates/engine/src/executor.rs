//! Sequential execution of configuration chunks.
//!
//! Chunks run one at a time against a single deploying key, with a delay
//! between transactions so consecutive submissions cannot race on the same
//! nonce. Every execution path resolves to a [`ConfigurationTransaction`];
//! a failed chunk is recorded and the loop moves on.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collaborators::DeploymentBackend;
use crate::modules::ModuleCategory;
use crate::planner::ConfigurationChunk;

/// Final status of one configuration transaction.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Success,
    Failed,
    /// Not attempted because the deployment deadline expired first.
    Skipped,
}

/// Record of one chunk execution attempt. Append-only: the executor creates
/// exactly one per chunk and never rewrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationTransaction {
    pub category: ModuleCategory,
    pub tx_hash: String,
    pub gas_used: u64,
    pub status: TxStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Tuning knobs for the chunk pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorSettings {
    /// Wait between consecutive chunk transactions. Crude nonce-collision
    /// control for the shared deploying key.
    pub inter_chunk_delay: Duration,
    /// Hard cap on a single configure call; expiry records a failed
    /// transaction instead of hanging.
    pub chunk_timeout: Duration,
    /// Overall budget for the chunk sequence. Chunks that have not started
    /// when it expires are recorded as skipped.
    pub deadline: Option<Duration>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            inter_chunk_delay: Duration::from_secs(2),
            chunk_timeout: Duration::from_secs(60),
            deadline: None,
        }
    }
}

/// Execute a chunk plan against a deployed contract, strictly sequentially.
///
/// Never returns an error: per-chunk failures are isolated into their
/// transaction records so one bad chunk cannot abort the rest of the
/// sequence.
pub async fn execute_chunks<B: DeploymentBackend>(
    backend: &B,
    contract_address: &str,
    chunks: &[ConfigurationChunk],
    actor: &str,
    settings: &ExecutorSettings,
) -> Vec<ConfigurationTransaction> {
    let started = Instant::now();
    let mut transactions = Vec::with_capacity(chunks.len());
    let mut expired = false;

    for (index, chunk) in chunks.iter().enumerate() {
        if !expired {
            if index > 0 && !settings.inter_chunk_delay.is_zero() {
                tokio::time::sleep(settings.inter_chunk_delay).await;
            }
            if let Some(deadline) = settings.deadline
                && started.elapsed() >= deadline
            {
                tracing::warn!(
                    category = %chunk.category,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Deployment deadline expired, skipping remaining chunks"
                );
                expired = true;
            }
        }

        if expired {
            transactions.push(skipped_transaction(chunk));
            continue;
        }

        transactions.push(execute_chunk(backend, contract_address, chunk, actor, settings).await);
    }

    transactions
}

/// Execute a single chunk. Infallible by contract: every outcome, including
/// collaborator errors and timeouts, becomes a transaction record.
pub async fn execute_chunk<B: DeploymentBackend>(
    backend: &B,
    contract_address: &str,
    chunk: &ConfigurationChunk,
    actor: &str,
    settings: &ExecutorSettings,
) -> ConfigurationTransaction {
    tracing::info!(
        category = %chunk.category,
        contract = %contract_address,
        gas_estimate = chunk.gas_estimate,
        "Executing configuration chunk"
    );

    let call = backend.configure(contract_address, chunk.category, chunk.data.clone(), actor);

    let result = match tokio::time::timeout(settings.chunk_timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "configure call timed out after {}s",
            settings.chunk_timeout.as_secs()
        )),
    };

    match result {
        Ok(outcome) => {
            tracing::info!(
                category = %chunk.category,
                tx_hash = %outcome.transaction_hash,
                gas_used = outcome.gas_used,
                "Configuration chunk applied"
            );
            ConfigurationTransaction {
                category: chunk.category,
                tx_hash: outcome.transaction_hash,
                gas_used: outcome.gas_used,
                status: TxStatus::Success,
                timestamp: Utc::now(),
                data: Some(chunk.data.clone()),
                error: None,
            }
        }
        Err(e) => {
            tracing::warn!(
                category = %chunk.category,
                error = %e,
                "Configuration chunk failed, continuing with remaining chunks"
            );
            ConfigurationTransaction {
                category: chunk.category,
                tx_hash: String::new(),
                gas_used: 0,
                status: TxStatus::Failed,
                timestamp: Utc::now(),
                data: Some(chunk.data.clone()),
                error: Some(format!("{e:#}")),
            }
        }
    }
}

fn skipped_transaction(chunk: &ConfigurationChunk) -> ConfigurationTransaction {
    ConfigurationTransaction {
        category: chunk.category,
        tx_hash: String::new(),
        gas_used: 0,
        status: TxStatus::Skipped,
        timestamp: Utc::now(),
        data: Some(chunk.data.clone()),
        error: Some("deployment deadline expired before execution".to_string()),
    }
}

/// Gas saved versus the plan, summed over successful chunks and clamped at
/// zero per chunk. Failed and skipped chunks contribute nothing.
pub fn estimated_savings(
    chunks: &[ConfigurationChunk],
    transactions: &[ConfigurationTransaction],
) -> u64 {
    chunks
        .iter()
        .zip(transactions)
        .filter(|(_, tx)| tx.status == TxStatus::Success)
        .map(|(chunk, tx)| chunk.gas_estimate.saturating_sub(tx.gas_used))
        .sum()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::Result;

    use super::*;
    use crate::collaborators::{ConfigureOutcome, DeployOutcome, DeployRequest};

    /// Backend double that fails for a chosen set of categories and records
    /// every call.
    struct ScriptedBackend {
        fail_on: Vec<ModuleCategory>,
        gas_per_call: u64,
        calls: Mutex<Vec<ModuleCategory>>,
    }

    impl ScriptedBackend {
        fn new(fail_on: Vec<ModuleCategory>, gas_per_call: u64) -> Self {
            Self { fail_on, gas_per_call, calls: Mutex::new(Vec::new()) }
        }
    }

    impl DeploymentBackend for ScriptedBackend {
        async fn deploy(&self, _request: DeployRequest, _actor: &str) -> Result<DeployOutcome> {
            unreachable!("executor tests never deploy a base contract")
        }

        async fn configure(
            &self,
            _contract_address: &str,
            category: ModuleCategory,
            _data: serde_json::Value,
            _actor: &str,
        ) -> Result<ConfigureOutcome> {
            self.calls.lock().unwrap().push(category);
            if self.fail_on.contains(&category) {
                anyhow::bail!("simulated revert for {category}");
            }
            Ok(ConfigureOutcome {
                transaction_hash: format!("0x{:064x}", 42),
                gas_used: self.gas_per_call,
            })
        }
    }

    fn chunk(category: ModuleCategory, gas_estimate: u64) -> ConfigurationChunk {
        ConfigurationChunk {
            category,
            priority: 10,
            data: serde_json::json!({ "module": category, "enabled": true }),
            gas_estimate,
            dependencies: vec![],
        }
    }

    fn fast_settings() -> ExecutorSettings {
        ExecutorSettings {
            inter_chunk_delay: Duration::ZERO,
            chunk_timeout: Duration::from_secs(5),
            deadline: None,
        }
    }

    #[tokio::test]
    async fn test_partial_failure_isolation() {
        let chunks = vec![
            chunk(ModuleCategory::Compliance, 50_000),
            chunk(ModuleCategory::Vesting, 120_000),
            chunk(ModuleCategory::Fees, 50_000),
            chunk(ModuleCategory::Votes, 80_000),
        ];
        let backend = ScriptedBackend::new(vec![ModuleCategory::Vesting], 40_000);

        let txs =
            execute_chunks(&backend, "0xdeployed", &chunks, "alice", &fast_settings()).await;

        assert_eq!(txs.len(), 4);
        assert_eq!(txs[0].status, TxStatus::Success);
        assert_eq!(txs[1].status, TxStatus::Failed);
        assert!(txs[1].error.as_ref().unwrap().contains("simulated revert"));
        assert_eq!(txs[1].gas_used, 0);
        assert!(txs[1].tx_hash.is_empty());
        assert_eq!(txs[2].status, TxStatus::Success);
        assert_eq!(txs[3].status, TxStatus::Success);
        // All four chunks reached the backend despite the failure.
        assert_eq!(backend.calls.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_savings_clamped_per_chunk() {
        let chunks = vec![
            chunk(ModuleCategory::Compliance, 50_000),
            chunk(ModuleCategory::Fees, 30_000),
        ];
        // Actual usage above the fees estimate: that chunk contributes zero,
        // it must not eat into the compliance savings.
        let backend = ScriptedBackend::new(vec![], 40_000);
        let txs =
            execute_chunks(&backend, "0xdeployed", &chunks, "alice", &fast_settings()).await;

        assert_eq!(estimated_savings(&chunks, &txs), 10_000);
    }

    #[tokio::test]
    async fn test_failed_chunks_contribute_no_savings() {
        let chunks = vec![
            chunk(ModuleCategory::Compliance, 50_000),
            chunk(ModuleCategory::Fees, 50_000),
        ];
        let backend = ScriptedBackend::new(vec![ModuleCategory::Fees], 10_000);
        let txs =
            execute_chunks(&backend, "0xdeployed", &chunks, "alice", &fast_settings()).await;

        assert_eq!(estimated_savings(&chunks, &txs), 40_000);
    }

    #[tokio::test]
    async fn test_deadline_skips_remaining_chunks() {
        let chunks = vec![
            chunk(ModuleCategory::Compliance, 50_000),
            chunk(ModuleCategory::Fees, 50_000),
            chunk(ModuleCategory::Votes, 80_000),
        ];
        let backend = ScriptedBackend::new(vec![], 40_000);
        let settings = ExecutorSettings {
            // The delay before chunk 2 burns through the whole budget.
            inter_chunk_delay: Duration::from_millis(30),
            chunk_timeout: Duration::from_secs(5),
            deadline: Some(Duration::from_millis(10)),
        };

        let txs = execute_chunks(&backend, "0xdeployed", &chunks, "alice", &settings).await;

        assert_eq!(txs.len(), 3);
        assert_eq!(txs[0].status, TxStatus::Success);
        assert_eq!(txs[1].status, TxStatus::Skipped);
        assert_eq!(txs[2].status, TxStatus::Skipped);
        assert_eq!(backend.calls.lock().unwrap().len(), 1);
        assert!(txs[1].error.as_ref().unwrap().contains("deadline"));
    }

    #[tokio::test]
    async fn test_chunk_timeout_records_failure() {
        struct HangingBackend;

        impl DeploymentBackend for HangingBackend {
            async fn deploy(
                &self,
                _request: DeployRequest,
                _actor: &str,
            ) -> Result<DeployOutcome> {
                unreachable!()
            }

            async fn configure(
                &self,
                _contract_address: &str,
                _category: ModuleCategory,
                _data: serde_json::Value,
                _actor: &str,
            ) -> Result<ConfigureOutcome> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!()
            }
        }

        let chunks = vec![chunk(ModuleCategory::Compliance, 50_000)];
        let settings = ExecutorSettings {
            inter_chunk_delay: Duration::ZERO,
            chunk_timeout: Duration::from_millis(20),
            deadline: None,
        };

        let txs = execute_chunks(&HangingBackend, "0xdeployed", &chunks, "alice", &settings).await;
        assert_eq!(txs[0].status, TxStatus::Failed);
        assert!(txs[0].error.as_ref().unwrap().contains("timed out"));
    }
}
