//! Complexity analysis of token configurations.
//!
//! Scoring is a pure function of the configuration and the standard's
//! profile: the same input always yields the same assessment, and enabling an
//! additional module can only raise the score. Analysis never blocks a
//! deployment - a malformed configuration degrades to the safe low/basic
//! default with a warning instead of erroring.

use serde::{Deserialize, Serialize};

use crate::modules::TokenConfiguration;
use crate::standard::{BASE_DEPLOY_GAS, TokenStandard};
use crate::strategy::DeploymentStrategy;

/// Complexity classification of a configuration.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
    Extreme,
}

/// Gas estimates per deployment strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasEstimate {
    pub basic: u64,
    pub enhanced: u64,
    pub chunked: u64,
}

/// The compact complexity view attached to results and audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexitySnapshot {
    pub level: ComplexityLevel,
    pub score: u32,
    pub feature_count: usize,
}

/// The outcome of analyzing one token configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityAssessment {
    pub level: ComplexityLevel,
    pub score: u32,
    pub feature_count: usize,
    pub recommended_strategy: DeploymentStrategy,
    pub requires_chunking: bool,
    /// Human-readable notes citing the counts that drove the decision.
    pub reasoning: Vec<String>,
    /// Advisory findings; never fatal at this stage.
    pub warnings: Vec<String>,
    pub gas_estimate: GasEstimate,
}

impl ComplexityAssessment {
    /// The safe default used when analysis cannot run.
    pub fn safe_default(warning: impl Into<String>) -> Self {
        Self {
            level: ComplexityLevel::Low,
            score: 0,
            feature_count: 0,
            recommended_strategy: DeploymentStrategy::Basic,
            requires_chunking: false,
            reasoning: vec!["analysis unavailable, defaulting to basic deployment".to_string()],
            warnings: vec![warning.into()],
            gas_estimate: GasEstimate {
                basic: BASE_DEPLOY_GAS,
                enhanced: BASE_DEPLOY_GAS,
                chunked: BASE_DEPLOY_GAS,
            },
        }
    }

    pub fn snapshot(&self) -> ComplexitySnapshot {
        ComplexitySnapshot {
            level: self.level,
            score: self.score,
            feature_count: self.feature_count,
        }
    }
}

/// Extra base-transaction cost assumed per configuration chunk.
const PER_CHUNK_TX_OVERHEAD: u64 = 21_000;

/// Analyze a token configuration against its standard's profile.
///
/// Pure and deterministic; performs no I/O.
pub fn analyze(config: &TokenConfiguration) -> ComplexityAssessment {
    let profile = config.standard.profile();
    let enabled = config.enabled_blocks();

    let mut score: u32 = 0;
    let mut reasoning = Vec::new();
    let mut warnings = Vec::new();
    let mut oversized_collection = None;
    let mut config_gas: u64 = 0;
    let mut chunk_count: u64 = 0;

    for block in &enabled {
        let category = block.category();
        let weight = profile.module_weight(category);
        let items = block.item_count();
        score += weight * items as u32;

        if block.is_collection_backed() {
            if items == 0 {
                warnings.push(format!(
                    "{category} is enabled but its collection is empty; it will configure nothing"
                ));
            } else {
                reasoning.push(format!(
                    "{category}: {items} item(s) at weight {weight} adds {}",
                    weight * items as u32
                ));
            }
            if items > profile.max_collection_items {
                oversized_collection = Some((category, items));
            }
        } else {
            reasoning.push(format!("{category}: enabled at weight {weight}"));
        }

        if block.has_payload() {
            let spec = profile.chunk_spec(category);
            config_gas += spec.per_item_gas * items.max(1) as u64;
            chunk_count += 1;
        }
    }

    let feature_count = enabled.len();
    let thresholds = profile.level_thresholds;
    let level = if score < thresholds.medium {
        ComplexityLevel::Low
    } else if score < thresholds.high {
        ComplexityLevel::Medium
    } else if score < thresholds.extreme {
        ComplexityLevel::High
    } else {
        ComplexityLevel::Extreme
    };

    let requires_chunking = score > profile.chunking_threshold || oversized_collection.is_some();
    let recommended_strategy = if feature_count == 0 {
        DeploymentStrategy::Basic
    } else if requires_chunking {
        DeploymentStrategy::Chunked
    } else {
        DeploymentStrategy::Enhanced
    };

    if feature_count == 0 {
        reasoning.push("no modules enabled, basic deployment suffices".to_string());
    } else {
        reasoning.push(format!(
            "{feature_count} module(s) enabled, complexity score {score} classified {level}"
        ));
        if let Some((category, items)) = oversized_collection {
            reasoning.push(format!(
                "{category} has {items} items, above the single-transaction limit of {} for {}; \
                 chunked deployment required",
                profile.max_collection_items, config.standard
            ));
        } else if score > profile.chunking_threshold {
            reasoning.push(format!(
                "score {score} exceeds the chunking threshold {} for {}",
                profile.chunking_threshold, config.standard
            ));
        }
    }

    // The enhanced estimate carries a single-transaction premium; chunked pays
    // a base transaction per chunk instead.
    let gas_estimate = GasEstimate {
        basic: BASE_DEPLOY_GAS,
        enhanced: BASE_DEPLOY_GAS + config_gas + config_gas * 3 / 10,
        chunked: BASE_DEPLOY_GAS + config_gas + PER_CHUNK_TX_OVERHEAD * chunk_count,
    };

    ComplexityAssessment {
        level,
        score,
        feature_count,
        recommended_strategy,
        requires_chunking,
        reasoning,
        warnings,
        gas_estimate,
    }
}

/// Analyze a raw, possibly malformed configuration value.
///
/// This is the fail-safe boundary: anything that does not deserialize into a
/// [`TokenConfiguration`] for the given standard yields the safe low/basic
/// default plus a warning describing the failure. It never errors, so a
/// broken stored configuration can never block deployment on its own.
pub fn analyze_raw(standard: TokenStandard, raw: &serde_json::Value) -> ComplexityAssessment {
    if raw.is_null() {
        return ComplexityAssessment::safe_default("configuration is null, assuming no modules");
    }

    match serde_json::from_value::<TokenConfiguration>(raw.clone()) {
        Ok(config) if config.standard == standard => analyze(&config.normalized()),
        Ok(config) => {
            let mut assessment = analyze(&config.clone().normalized());
            assessment.warnings.push(format!(
                "configuration declares standard {} but {} was requested",
                config.standard, standard
            ));
            assessment
        }
        Err(e) => {
            tracing::warn!(%standard, error = %e, "Failed to parse raw configuration");
            ComplexityAssessment::safe_default(format!("configuration failed to parse: {e}"))
        }
    }
}
