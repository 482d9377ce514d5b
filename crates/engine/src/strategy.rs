//! Deployment strategy selection.

use serde::{Deserialize, Serialize};

use crate::analyzer::ComplexityAssessment;
use crate::standard::TokenStandard;

/// How a token gets deployed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStrategy {
    /// Single simple transaction, base contract only.
    Basic,
    /// Single transaction carrying the full feature set.
    Enhanced,
    /// Base transaction plus a sequence of configuration transactions.
    Chunked,
}

/// Caller intent for strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyOverride {
    /// Use the analyzer's recommendation.
    #[default]
    Auto,
    /// Deploy with this strategy regardless of the assessment.
    Force(DeploymentStrategy),
}

impl std::str::FromStr for StrategyOverride {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            Ok(StrategyOverride::Auto)
        } else {
            s.parse::<DeploymentStrategy>().map(StrategyOverride::Force)
        }
    }
}

impl std::fmt::Display for StrategyOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyOverride::Auto => write!(f, "auto"),
            StrategyOverride::Force(strategy) => write!(f, "{strategy}"),
        }
    }
}

/// Select the deployment strategy for a token.
///
/// Side-effect free. An explicit override wins unconditionally; otherwise the
/// assessment's recommendation is used as-is.
pub fn route(
    standard: TokenStandard,
    assessment: &ComplexityAssessment,
    override_: StrategyOverride,
) -> DeploymentStrategy {
    let strategy = match override_ {
        StrategyOverride::Force(forced) => {
            tracing::debug!(%standard, %forced, "Strategy forced by caller");
            forced
        }
        StrategyOverride::Auto => assessment.recommended_strategy,
    };
    tracing::debug!(
        %standard,
        %strategy,
        score = assessment.score,
        level = %assessment.level,
        "Deployment strategy selected"
    );
    strategy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{ComplexityLevel, GasEstimate};

    fn assessment(recommended: DeploymentStrategy) -> ComplexityAssessment {
        ComplexityAssessment {
            level: ComplexityLevel::Medium,
            score: 15,
            feature_count: 3,
            recommended_strategy: recommended,
            requires_chunking: recommended == DeploymentStrategy::Chunked,
            reasoning: vec![],
            warnings: vec![],
            gas_estimate: GasEstimate { basic: 1, enhanced: 2, chunked: 3 },
        }
    }

    #[test]
    fn test_override_wins_unconditionally() {
        for recommended in [
            DeploymentStrategy::Basic,
            DeploymentStrategy::Enhanced,
            DeploymentStrategy::Chunked,
        ] {
            let selected = route(
                TokenStandard::Fungible,
                &assessment(recommended),
                StrategyOverride::Force(DeploymentStrategy::Chunked),
            );
            assert_eq!(selected, DeploymentStrategy::Chunked);
        }
    }

    #[test]
    fn test_auto_follows_recommendation() {
        let selected = route(
            TokenStandard::Vault,
            &assessment(DeploymentStrategy::Enhanced),
            StrategyOverride::Auto,
        );
        assert_eq!(selected, DeploymentStrategy::Enhanced);
    }

    #[test]
    fn test_override_parsing() {
        assert_eq!("auto".parse::<StrategyOverride>().unwrap(), StrategyOverride::Auto);
        assert_eq!(
            "chunked".parse::<StrategyOverride>().unwrap(),
            StrategyOverride::Force(DeploymentStrategy::Chunked)
        );
        assert!("yolo".parse::<StrategyOverride>().is_err());
    }
}
