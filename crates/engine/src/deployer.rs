//! The deployment orchestrator.
//!
//! [`TokenDeployer`] ties the pipeline together: load the configuration,
//! analyze it, select a strategy, deploy the base contract, run the chunk
//! sequence when chunking was selected, and aggregate everything into one
//! [`UnifiedDeploymentResult`]. `deploy` never returns an error; every
//! failure mode is folded into the result so callers get the same shape
//! whether the deployment landed or not.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::analyzer::{self, ComplexityAssessment, ComplexitySnapshot};
use crate::collaborators::{
    AuditEvent, AuditSink, ConfigStore, DeployRequest, DeployStatus, DeploymentBackend,
    TracingAuditSink,
};
use crate::executor::{self, ConfigurationTransaction, ExecutorSettings, TxStatus};
use crate::modules::TokenConfiguration;
use crate::planner::{self, ConfigurationChunk};
use crate::standard::TokenStandard;
use crate::strategy::{self, DeploymentStrategy, StrategyOverride};
use crate::validation::{self, Severity, ValidationFinding};

/// Pricing assumptions used to turn gas into a dollar figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    pub gas_price_gwei: f64,
    pub eth_price_usd: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self { gas_price_gwei: 20.0, eth_price_usd: 2_500.0 }
    }
}

impl CostModel {
    pub fn estimate(&self, gas: u64) -> CostEstimate {
        let eth = gas as f64 * self.gas_price_gwei * 1e-9;
        CostEstimate { gas, usd: eth * self.eth_price_usd }
    }

    pub fn costs(&self, gas: &crate::analyzer::GasEstimate) -> StrategyCosts {
        StrategyCosts {
            basic: self.estimate(gas.basic),
            enhanced: self.estimate(gas.enhanced),
            chunked: self.estimate(gas.chunked),
        }
    }
}

/// A gas figure with its dollar translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub gas: u64,
    pub usd: f64,
}

/// Cost estimates for every strategy, so callers can compare.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyCosts {
    pub basic: CostEstimate,
    pub enhanced: CostEstimate,
    pub chunked: CostEstimate,
}

/// How the selected strategy paid off, attached to chunked results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasOptimization {
    pub technique: String,
    /// Planned-versus-actual gas over successful chunks.
    pub estimated_savings: u64,
    pub reliability_note: String,
}

/// Aggregated outcome of one deployment attempt. Same shape for every
/// strategy and every failure mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedDeploymentResult {
    pub token_id: String,
    pub standard: Option<TokenStandard>,
    pub strategy: Option<DeploymentStrategy>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    pub gas_used: u64,
    /// One record per planned chunk; empty for basic and enhanced runs.
    pub configuration_txs: Vec<ConfigurationTransaction>,
    /// Individual failure messages, one per chunk that did not land.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<ComplexitySnapshot>,
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_optimization: Option<GasOptimization>,
    pub deployment_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UnifiedDeploymentResult {
    fn failure(token_id: &str, error: impl Into<String>) -> Self {
        Self {
            token_id: token_id.to_string(),
            standard: None,
            strategy: None,
            success: false,
            token_address: None,
            transaction_hash: None,
            gas_used: 0,
            configuration_txs: Vec::new(),
            errors: Vec::new(),
            complexity: None,
            warnings: Vec::new(),
            gas_optimization: None,
            deployment_time_ms: 0,
            error: Some(error.into()),
        }
    }

    /// Categories whose configuration did not land, for follow-up.
    pub fn unapplied_categories(&self) -> Vec<crate::modules::ModuleCategory> {
        self.configuration_txs
            .iter()
            .filter(|tx| tx.status != TxStatus::Success)
            .map(|tx| tx.category)
            .collect()
    }
}

/// Read-only strategy preview for a stored token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecommendation {
    pub token_id: String,
    /// Absent when the token could not be loaded and the recommendation fell
    /// back to the conservative default.
    pub standard: Option<TokenStandard>,
    pub strategy: DeploymentStrategy,
    pub assessment: ComplexityAssessment,
    pub findings: Vec<ValidationFinding>,
    pub chunk_count: usize,
    /// Cost of each strategy under the configured price model, so the
    /// recommendation can be second-guessed.
    pub costs: StrategyCosts,
}

/// Caller-supplied knobs for one deployment.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    pub force_strategy: StrategyOverride,
    /// Deploying wallet, forwarded to the collaborator.
    pub wallet_address: Option<String>,
    /// Fee cap in wei, forwarded to the collaborator.
    pub max_fee_per_gas: Option<u64>,
    /// Overall time budget; overrides the executor settings' deadline.
    pub deadline: Option<std::time::Duration>,
    /// Refuse to deploy when pre-flight finds a critical issue.
    pub block_on_critical: bool,
}

/// The deployment engine. Collaborators are injected; the deployer owns no
/// connections and holds no global state.
pub struct TokenDeployer<S, B, A = TracingAuditSink> {
    store: S,
    backend: B,
    audit: A,
    settings: ExecutorSettings,
    cost_model: CostModel,
}

impl<S: ConfigStore, B: DeploymentBackend> TokenDeployer<S, B, TracingAuditSink> {
    pub fn new(store: S, backend: B) -> Self {
        Self {
            store,
            backend,
            audit: TracingAuditSink,
            settings: ExecutorSettings::default(),
            cost_model: CostModel::default(),
        }
    }
}

impl<S: ConfigStore, B: DeploymentBackend, A: AuditSink> TokenDeployer<S, B, A> {
    pub fn with_audit<A2: AuditSink>(self, audit: A2) -> TokenDeployer<S, B, A2> {
        TokenDeployer {
            store: self.store,
            backend: self.backend,
            audit,
            settings: self.settings,
            cost_model: self.cost_model,
        }
    }

    pub fn with_settings(mut self, settings: ExecutorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    /// Deploy a stored token. Infallible by contract: storage misses,
    /// pre-flight blocks, collaborator errors and partial chunk failures all
    /// come back as a result with `success == false` and the relevant detail
    /// filled in.
    pub async fn deploy(
        &self,
        token_id: &str,
        actor: &str,
        scope: &str,
        options: DeployOptions,
    ) -> UnifiedDeploymentResult {
        let started = Instant::now();

        let config = match self.store.get(token_id).await {
            Ok(Some(config)) => config.normalized(),
            Ok(None) => {
                tracing::warn!(%token_id, "Token not found in configuration store");
                return self
                    .reject(token_id, actor, scope, "Token not found".to_string(), started)
                    .await;
            }
            Err(e) => {
                tracing::error!(%token_id, error = %e, "Configuration store lookup failed");
                return self
                    .reject(
                        token_id,
                        actor,
                        scope,
                        format!("configuration store error: {e:#}"),
                        started,
                    )
                    .await;
            }
        };

        let findings = validation::preflight(&config);
        let mut warnings: Vec<String> = findings
            .iter()
            .filter(|f| f.severity >= Severity::Warning)
            .map(|f| f.message.clone())
            .collect();
        if options.block_on_critical && validation::has_critical(&findings) {
            let detail = findings
                .iter()
                .filter(|f| f.severity == Severity::Critical)
                .map(|f| f.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            let mut result = self
                .reject(
                    token_id,
                    actor,
                    scope,
                    format!("blocked by pre-flight validation: {detail}"),
                    started,
                )
                .await;
            result.standard = Some(config.standard);
            result.warnings = warnings;
            return result;
        }

        let assessment = analyzer::analyze(&config);
        warnings.extend(assessment.warnings.iter().cloned());
        let selected = strategy::route(config.standard, &assessment, options.force_strategy);
        let fingerprint = config_fingerprint(&config);

        tracing::info!(
            %token_id,
            standard = %config.standard,
            strategy = %selected,
            score = assessment.score,
            level = %assessment.level,
            "Deploying token"
        );

        self.audit
            .record(AuditEvent::DeploymentStarted {
                token_id: token_id.to_string(),
                actor: actor.to_string(),
                scope: scope.to_string(),
                standard: config.standard,
                strategy: selected,
                complexity: assessment.snapshot(),
                config_fingerprint: fingerprint.clone(),
            })
            .await;

        let mut result = self
            .run_strategy(&config, selected, actor, &options)
            .await;
        result.token_id = token_id.to_string();
        result.complexity = Some(assessment.snapshot());
        warnings.append(&mut result.warnings);
        result.warnings = warnings;
        result.deployment_time_ms = started.elapsed().as_millis() as u64;

        self.audit
            .record(AuditEvent::DeploymentCompleted {
                token_id: token_id.to_string(),
                actor: actor.to_string(),
                strategy: selected,
                success: result.success,
                gas_used: result.gas_used,
                duration_ms: result.deployment_time_ms,
                config_fingerprint: fingerprint,
                error: result.error.clone(),
            })
            .await;

        result
    }

    async fn run_strategy(
        &self,
        config: &TokenConfiguration,
        selected: DeploymentStrategy,
        actor: &str,
        options: &DeployOptions,
    ) -> UnifiedDeploymentResult {
        let payload = match selected {
            // Basic and chunked both deploy a bare base contract; enhanced
            // supplies the full configuration at construction time.
            DeploymentStrategy::Basic | DeploymentStrategy::Chunked => config.base_payload(),
            DeploymentStrategy::Enhanced => match serde_json::to_value(config) {
                Ok(value) => value,
                Err(e) => {
                    return UnifiedDeploymentResult::failure(
                        &config.id,
                        format!("failed to serialize configuration: {e}"),
                    );
                }
            },
        };

        let request = DeployRequest {
            contract_type: config.standard,
            config: payload,
            blockchain: config.blockchain.clone(),
            environment: config.environment,
            wallet_address: options.wallet_address.clone(),
            max_fee_per_gas: options.max_fee_per_gas,
        };

        let outcome = match self.backend.deploy(request, actor).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(token_id = %config.id, error = %e, "Base deployment call failed");
                let mut result = UnifiedDeploymentResult::failure(
                    &config.id,
                    format!("deployment failed: {e:#}"),
                );
                result.standard = Some(config.standard);
                result.strategy = Some(selected);
                return result;
            }
        };

        let mut result = UnifiedDeploymentResult {
            token_id: config.id.clone(),
            standard: Some(config.standard),
            strategy: Some(selected),
            success: outcome.status == DeployStatus::Success,
            token_address: outcome.token_address.clone(),
            transaction_hash: outcome.transaction_hash.clone(),
            gas_used: outcome.gas_used,
            configuration_txs: Vec::new(),
            errors: Vec::new(),
            complexity: None,
            warnings: Vec::new(),
            gas_optimization: None,
            deployment_time_ms: 0,
            error: outcome.error.clone(),
        };

        if !result.success {
            result.error = Some(
                result
                    .error
                    .take()
                    .unwrap_or_else(|| "collaborator reported a failed deployment".to_string()),
            );
            return result;
        }

        if selected != DeploymentStrategy::Chunked {
            return result;
        }

        let Some(address) = result.token_address.clone() else {
            result.success = false;
            result.error =
                Some("collaborator returned no contract address for a chunked deployment".to_string());
            return result;
        };

        let chunks = planner::plan(config);
        let txs = self
            .execute_plan(&address, &chunks, actor, options.deadline)
            .await;

        result.gas_used += txs.iter().map(|tx| tx.gas_used).sum::<u64>();
        result.errors = txs
            .iter()
            .filter(|tx| tx.status != TxStatus::Success)
            .filter_map(|tx| tx.error.as_ref().map(|e| format!("{}: {e}", tx.category)))
            .collect();
        let failed = txs.iter().filter(|tx| tx.status != TxStatus::Success).count();
        if failed > 0 {
            result.success = false;
            result.error = Some(format!(
                "{failed} of {} configuration chunk(s) did not complete",
                txs.len()
            ));
            result.warnings.push(
                "base contract is deployed; failed chunks can be re-applied individually"
                    .to_string(),
            );
        }
        result.gas_optimization = Some(GasOptimization {
            technique: "chunked_deployment".to_string(),
            estimated_savings: executor::estimated_savings(&chunks, &txs),
            reliability_note: "each module configured in its own transaction; a failed module \
                               does not revert the others"
                .to_string(),
        });
        result.configuration_txs = txs;

        result
    }

    async fn execute_plan(
        &self,
        address: &str,
        chunks: &[ConfigurationChunk],
        actor: &str,
        deadline: Option<std::time::Duration>,
    ) -> Vec<ConfigurationTransaction> {
        let settings = ExecutorSettings {
            deadline: deadline.or(self.settings.deadline),
            ..self.settings
        };
        executor::execute_chunks(&self.backend, address, chunks, actor, &settings).await
    }

    /// Preview the strategy decision for a stored token without touching the
    /// deployment backend.
    ///
    /// Infallible so pollers never need an error branch: an unknown token or
    /// a misbehaving store yields the conservative basic/low default with a
    /// warning describing why.
    pub async fn recommendation(&self, token_id: &str) -> StrategyRecommendation {
        let config = match self.store.get(token_id).await {
            Ok(Some(config)) => config.normalized(),
            Ok(None) => {
                tracing::warn!(%token_id, "Token not found, returning default recommendation");
                return self.fallback_recommendation(token_id, "Token not found");
            }
            Err(e) => {
                tracing::error!(%token_id, error = %e, "Configuration store lookup failed");
                return self.fallback_recommendation(
                    token_id,
                    format!("configuration store error: {e:#}"),
                );
            }
        };

        let assessment = analyzer::analyze(&config);
        let selected =
            strategy::route(config.standard, &assessment, StrategyOverride::Auto);
        let chunks = planner::plan(&config);

        StrategyRecommendation {
            token_id: token_id.to_string(),
            standard: Some(config.standard),
            strategy: selected,
            findings: validation::preflight(&config),
            chunk_count: chunks.len(),
            costs: self.cost_model.costs(&assessment.gas_estimate),
            assessment,
        }
    }

    fn fallback_recommendation(
        &self,
        token_id: &str,
        warning: impl Into<String>,
    ) -> StrategyRecommendation {
        let assessment = ComplexityAssessment::safe_default(warning);
        StrategyRecommendation {
            token_id: token_id.to_string(),
            standard: None,
            strategy: assessment.recommended_strategy,
            findings: Vec::new(),
            chunk_count: 0,
            costs: self.cost_model.costs(&assessment.gas_estimate),
            assessment,
        }
    }

    async fn reject(
        &self,
        token_id: &str,
        actor: &str,
        scope: &str,
        reason: String,
        started: Instant,
    ) -> UnifiedDeploymentResult {
        self.audit
            .record(AuditEvent::DeploymentRejected {
                token_id: token_id.to_string(),
                actor: actor.to_string(),
                scope: scope.to_string(),
                reason: reason.clone(),
            })
            .await;
        let mut result = UnifiedDeploymentResult::failure(token_id, reason);
        result.deployment_time_ms = started.elapsed().as_millis() as u64;
        result
    }
}

/// Stable hex digest of a configuration, recorded with audit events so a
/// deployment can be tied to the exact configuration it ran against.
pub fn config_fingerprint(config: &TokenConfiguration) -> String {
    match serde_json::to_vec(config) {
        Ok(bytes) => hex::encode(Sha256::digest(&bytes)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fingerprint configuration");
            String::new()
        }
    }
}
