//! External collaborator interfaces.
//!
//! The engine never talks to a chain or a database directly; it is handed a
//! [`ConfigStore`], a [`DeploymentBackend`] and an [`AuditSink`] by its
//! caller. Lifecycle of those clients is owned by the caller - there are no
//! process-wide singletons.

use std::collections::HashMap;
use std::future::Future;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::modules::{Environment, ModuleCategory, TokenConfiguration};
use crate::standard::TokenStandard;
use crate::strategy::DeploymentStrategy;

/// Collaborator-reported status of a base deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeployStatus {
    Success,
    Failed,
}

/// Request to deploy a new base contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployRequest {
    pub contract_type: TokenStandard,
    pub config: serde_json::Value,
    pub blockchain: String,
    pub environment: Environment,
    /// Deploying wallet; the collaborator falls back to its own key when
    /// absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    /// Fee cap in wei, passed through to the collaborator's gas market logic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<u64>,
}

/// The collaborator's answer to a base deployment request.
///
/// Both shapes are explicit: a failed deployment is a `Failed` status with an
/// error message, not a transport error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployOutcome {
    pub status: DeployStatus,
    #[serde(default)]
    pub token_address: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub gas_used: u64,
    #[serde(default)]
    pub error: Option<String>,
}

/// The collaborator's answer to a configure-existing-contract call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigureOutcome {
    pub transaction_hash: String,
    pub gas_used: u64,
}

/// Read access to persisted token configurations.
pub trait ConfigStore: Send + Sync {
    /// Fetch a token configuration. `Ok(None)` means not found; errors are
    /// reserved for the store itself misbehaving.
    fn get(
        &self,
        token_id: &str,
    ) -> impl Future<Output = Result<Option<TokenConfiguration>>> + Send;
}

/// The external system that submits and confirms on-chain transactions.
///
/// Opaque to the engine: transport, signing, nonce management and gas-market
/// logic all live behind this trait.
pub trait DeploymentBackend: Send + Sync {
    /// Deploy a new base contract.
    fn deploy(
        &self,
        request: DeployRequest,
        actor: &str,
    ) -> impl Future<Output = Result<DeployOutcome>> + Send;

    /// Apply one configuration payload to an already-deployed contract.
    fn configure(
        &self,
        contract_address: &str,
        category: ModuleCategory,
        data: serde_json::Value,
        actor: &str,
    ) -> impl Future<Output = Result<ConfigureOutcome>> + Send;
}

/// One audit trail event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// The attempt ended before a strategy was ever selected: unknown token,
    /// store failure or a blocking pre-flight finding.
    DeploymentRejected {
        token_id: String,
        actor: String,
        scope: String,
        reason: String,
    },
    DeploymentStarted {
        token_id: String,
        actor: String,
        scope: String,
        standard: TokenStandard,
        strategy: DeploymentStrategy,
        complexity: crate::analyzer::ComplexitySnapshot,
        config_fingerprint: String,
    },
    DeploymentCompleted {
        token_id: String,
        actor: String,
        strategy: DeploymentStrategy,
        success: bool,
        gas_used: u64,
        duration_ms: u64,
        config_fingerprint: String,
        #[serde(default)]
        error: Option<String>,
    },
}

/// Fire-and-forget audit sink.
///
/// Implementations must swallow their own failures; a broken audit pipeline
/// is never allowed to fail a deployment.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent) -> impl Future<Output = ()> + Send;
}

/// Default audit sink that emits structured tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) {
        match &event {
            AuditEvent::DeploymentRejected { token_id, actor, scope, reason } => {
                tracing::warn!(
                    %token_id,
                    %actor,
                    %scope,
                    %reason,
                    "Deployment rejected"
                );
            }
            AuditEvent::DeploymentStarted {
                token_id,
                actor,
                standard,
                strategy,
                complexity,
                config_fingerprint,
                ..
            } => {
                tracing::info!(
                    %token_id,
                    %actor,
                    %standard,
                    %strategy,
                    score = complexity.score,
                    level = %complexity.level,
                    fingerprint = %config_fingerprint,
                    "Deployment started"
                );
            }
            AuditEvent::DeploymentCompleted {
                token_id,
                actor,
                strategy,
                success,
                gas_used,
                duration_ms,
                error,
                ..
            } => {
                tracing::info!(
                    %token_id,
                    %actor,
                    %strategy,
                    success,
                    gas_used,
                    duration_ms,
                    error = error.as_deref().unwrap_or(""),
                    "Deployment finished"
                );
            }
        }
    }
}

/// In-memory configuration store.
///
/// Backs the CLI (which loads configurations from files) and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tokens: HashMap<String, TokenConfiguration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, config: TokenConfiguration) {
        self.tokens.insert(config.id.clone(), config);
    }

    pub fn with(mut self, config: TokenConfiguration) -> Self {
        self.insert(config);
        self
    }
}

impl ConfigStore for MemoryStore {
    async fn get(&self, token_id: &str) -> Result<Option<TokenConfiguration>> {
        Ok(self.tokens.get(token_id).cloned())
    }
}
