//! End-to-end deployment flows against an in-process backend double.

use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use tokensmith_engine::collaborators::{
    AuditEvent, AuditSink, ConfigureOutcome, DeployOutcome, DeployStatus,
};
use tokensmith_engine::modules::StrategyAllocation;
use tokensmith_engine::{
    DeployOptions, DeployRequest, DeploymentBackend, DeploymentStrategy, Environment,
    ExecutorSettings, MemoryStore, ModuleCategory, ModuleConfig, TokenConfiguration,
    TokenDeployer, TokenStandard, TxStatus,
};

/// Backend double recording every call. Configure fails for the categories
/// listed in `fail_on`.
#[derive(Default)]
struct RecordingBackend {
    fail_on: Vec<ModuleCategory>,
    deploys: Mutex<Vec<DeployRequest>>,
    configures: Mutex<Vec<ModuleCategory>>,
}

impl RecordingBackend {
    fn failing_on(fail_on: Vec<ModuleCategory>) -> Self {
        Self { fail_on, ..Self::default() }
    }

    fn deploy_count(&self) -> usize {
        self.deploys.lock().unwrap().len()
    }

    fn configure_count(&self) -> usize {
        self.configures.lock().unwrap().len()
    }
}

impl DeploymentBackend for &RecordingBackend {
    async fn deploy(&self, request: DeployRequest, _actor: &str) -> Result<DeployOutcome> {
        self.deploys.lock().unwrap().push(request);
        Ok(DeployOutcome {
            status: DeployStatus::Success,
            token_address: Some("0xdeployed".to_string()),
            transaction_hash: Some("0xbase".to_string()),
            gas_used: 2_500_000,
            error: None,
        })
    }

    async fn configure(
        &self,
        _contract_address: &str,
        category: ModuleCategory,
        _data: serde_json::Value,
        _actor: &str,
    ) -> Result<ConfigureOutcome> {
        self.configures.lock().unwrap().push(category);
        if self.fail_on.contains(&category) {
            anyhow::bail!("simulated revert for {category}");
        }
        Ok(ConfigureOutcome { transaction_hash: format!("0x{category}"), gas_used: 45_000 })
    }
}

/// Audit sink double that keeps every event.
#[derive(Default)]
struct CapturingAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl AuditSink for &CapturingAudit {
    async fn record(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn token(id: &str, standard: TokenStandard, blocks: Vec<ModuleConfig>) -> TokenConfiguration {
    TokenConfiguration {
        id: id.to_string(),
        name: "Flow Test".to_string(),
        symbol: "FLW".to_string(),
        standard,
        blockchain: "ethereum".to_string(),
        environment: Environment::Testnet,
        blocks,
    }
}

fn vault_token(id: &str) -> TokenConfiguration {
    // 6 strategies at weight 5 puts the score past the vault chunking
    // threshold, so auto-routing selects chunked.
    token(
        id,
        TokenStandard::Vault,
        vec![
            ModuleConfig::YieldStrategy {
                enabled: true,
                strategies: (0..6)
                    .map(|i| StrategyAllocation {
                        strategy: format!("strategy-{i}"),
                        allocation_bps: 1_000,
                    })
                    .collect(),
            },
            ModuleConfig::WithdrawalQueue { enabled: true, max_queue_len: 100 },
            ModuleConfig::Router { enabled: true, adapters: vec!["uniswap-v3".to_string()] },
        ],
    )
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::level_filters::LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

fn fast_settings() -> ExecutorSettings {
    ExecutorSettings {
        inter_chunk_delay: Duration::ZERO,
        chunk_timeout: Duration::from_secs(5),
        deadline: None,
    }
}

fn deployer<'a>(
    backend: &'a RecordingBackend,
    config: TokenConfiguration,
) -> TokenDeployer<MemoryStore, &'a RecordingBackend> {
    init_tracing();
    TokenDeployer::new(MemoryStore::new().with(config), backend)
        .with_settings(fast_settings())
}

#[tokio::test]
async fn test_bare_token_deploys_basic_with_single_call() {
    let backend = RecordingBackend::default();
    let deployer = deployer(&backend, token("tok-basic", TokenStandard::Fungible, vec![]));

    let result = deployer
        .deploy("tok-basic", "alice", "test", DeployOptions::default())
        .await;

    assert!(result.success);
    assert_eq!(result.strategy, Some(DeploymentStrategy::Basic));
    assert!(result.configuration_txs.is_empty());
    assert_eq!(result.token_address.as_deref(), Some("0xdeployed"));
    assert_eq!(backend.deploy_count(), 1);
    assert_eq!(backend.configure_count(), 0);
}

#[tokio::test]
async fn test_chunked_deployment_applies_every_chunk() {
    let backend = RecordingBackend::default();
    let deployer = deployer(&backend, vault_token("tok-vault"));

    let result = deployer
        .deploy("tok-vault", "alice", "test", DeployOptions::default())
        .await;

    assert!(result.success);
    assert_eq!(result.strategy, Some(DeploymentStrategy::Chunked));
    assert_eq!(result.configuration_txs.len(), 3);
    assert!(result.configuration_txs.iter().all(|tx| tx.status == TxStatus::Success));
    assert_eq!(backend.deploy_count(), 1);
    assert_eq!(backend.configure_count(), 3);
    // Base gas plus three configure transactions.
    assert_eq!(result.gas_used, 2_500_000 + 3 * 45_000);
    assert!(result.gas_optimization.is_some());
    // yield_strategy is a dependency of the other two, so it ran first.
    assert_eq!(backend.configures.lock().unwrap()[0], ModuleCategory::YieldStrategy);
}

#[tokio::test]
async fn test_failed_chunk_does_not_abort_the_rest() {
    let backend = RecordingBackend::failing_on(vec![ModuleCategory::WithdrawalQueue]);
    let deployer = deployer(&backend, vault_token("tok-vault"));

    let result = deployer
        .deploy("tok-vault", "alice", "test", DeployOptions::default())
        .await;

    assert!(!result.success);
    assert_eq!(result.configuration_txs.len(), 3);
    assert_eq!(backend.configure_count(), 3);

    let by_category = |category| {
        result
            .configuration_txs
            .iter()
            .find(|tx| tx.category == category)
            .unwrap()
    };
    assert_eq!(by_category(ModuleCategory::YieldStrategy).status, TxStatus::Success);
    assert_eq!(by_category(ModuleCategory::WithdrawalQueue).status, TxStatus::Failed);
    assert_eq!(by_category(ModuleCategory::Router).status, TxStatus::Success);

    assert_eq!(result.unapplied_categories(), vec![ModuleCategory::WithdrawalQueue]);
    assert!(result.error.as_ref().unwrap().contains("1 of 3"));
    // The base contract stays deployed and is reported for follow-up.
    assert_eq!(result.token_address.as_deref(), Some("0xdeployed"));
}

#[tokio::test]
async fn test_forced_strategy_overrides_recommendation() {
    let backend = RecordingBackend::default();
    let deployer = deployer(&backend, vault_token("tok-vault"));

    let result = deployer
        .deploy(
            "tok-vault",
            "alice",
            "test",
            DeployOptions {
                force_strategy: "enhanced".parse().unwrap(),
                ..DeployOptions::default()
            },
        )
        .await;

    assert!(result.success);
    assert_eq!(result.strategy, Some(DeploymentStrategy::Enhanced));
    assert!(result.configuration_txs.is_empty());
    assert_eq!(backend.configure_count(), 0);

    // Enhanced carries the full configuration in the deploy payload.
    let deploys = backend.deploys.lock().unwrap();
    assert!(deploys[0].config.get("blocks").is_some());
}

#[tokio::test]
async fn test_recommendation_makes_no_backend_calls() {
    let backend = RecordingBackend::default();
    let deployer = deployer(&backend, vault_token("tok-vault"));

    let recommendation = deployer.recommendation("tok-vault").await;

    assert_eq!(recommendation.strategy, DeploymentStrategy::Chunked);
    assert_eq!(recommendation.chunk_count, 3);
    assert!(recommendation.costs.chunked.gas > 0);
    assert!(recommendation.costs.chunked.gas < recommendation.costs.enhanced.gas);
    assert_eq!(backend.deploy_count(), 0);
    assert_eq!(backend.configure_count(), 0);
}

#[tokio::test]
async fn test_unknown_token_yields_structured_failure() {
    let backend = RecordingBackend::default();
    let audit = CapturingAudit::default();
    let deployer = TokenDeployer::new(MemoryStore::new(), &backend).with_audit(&audit);

    let result = deployer
        .deploy("tok-missing", "alice", "test", DeployOptions::default())
        .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Token not found"));
    assert_eq!(backend.deploy_count(), 0);

    // Even a rejected attempt leaves an audit record.
    let events = audit.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        AuditEvent::DeploymentRejected { token_id, reason, .. }
            if token_id == "tok-missing" && reason == "Token not found"
    ));
}

#[tokio::test]
async fn test_unknown_token_recommendation_falls_back_to_basic() {
    let backend = RecordingBackend::default();
    let deployer = TokenDeployer::new(MemoryStore::new(), &backend);

    let recommendation = deployer.recommendation("tok-missing").await;

    assert_eq!(recommendation.strategy, DeploymentStrategy::Basic);
    assert!(recommendation.standard.is_none());
    assert_eq!(recommendation.chunk_count, 0);
    assert!(
        recommendation.assessment.warnings.iter().any(|w| w.contains("not found")),
        "fallback must say why: {:?}",
        recommendation.assessment.warnings
    );
    assert_eq!(backend.deploy_count(), 0);
}

#[tokio::test]
async fn test_critical_finding_blocks_when_requested() {
    let backend = RecordingBackend::default();
    let audit = CapturingAudit::default();
    let config = token("tok-sec", TokenStandard::SecurityToken, vec![]);
    let deployer = deployer(&backend, config).with_audit(&audit);

    let result = deployer
        .deploy(
            "tok-sec",
            "alice",
            "test",
            DeployOptions { block_on_critical: true, ..DeployOptions::default() },
        )
        .await;

    assert!(!result.success);
    assert!(result.error.as_ref().unwrap().contains("pre-flight"));
    assert_eq!(backend.deploy_count(), 0);

    let events = audit.events.lock().unwrap();
    assert!(matches!(
        &events[..],
        [AuditEvent::DeploymentRejected { reason, .. }] if reason.contains("pre-flight")
    ));
}
