//! Strategy decision engine for modular token deployments.
//!
//! Given a stored token configuration, the engine scores its complexity,
//! selects a deployment strategy (basic, enhanced or chunked), plans and
//! executes the configuration chunk sequence when chunking wins, and folds
//! everything into a single result shape regardless of strategy or outcome.
//!
//! The engine performs no I/O of its own: persistence, transaction submission
//! and audit recording are injected through the traits in [`collaborators`].

pub mod analyzer;
pub mod collaborators;
pub mod deployer;
pub mod executor;
pub mod http;
pub mod modules;
pub mod planner;
pub mod standard;
pub mod strategy;
pub mod validation;

pub use analyzer::{ComplexityAssessment, ComplexityLevel, GasEstimate, analyze};
pub use collaborators::{
    AuditEvent, AuditSink, ConfigStore, DeployOutcome, DeployRequest, DeployStatus,
    DeploymentBackend, MemoryStore, TracingAuditSink,
};
pub use deployer::{
    CostEstimate, CostModel, DeployOptions, GasOptimization, StrategyCosts,
    StrategyRecommendation, TokenDeployer, UnifiedDeploymentResult,
};
pub use executor::{ConfigurationTransaction, ExecutorSettings, TxStatus};
pub use http::HttpBackend;
pub use modules::{Environment, ModuleCategory, ModuleConfig, TokenConfiguration};
pub use planner::{ConfigurationChunk, plan};
pub use standard::TokenStandard;
pub use strategy::{DeploymentStrategy, StrategyOverride};
pub use validation::{Severity, ValidationFinding, preflight};
