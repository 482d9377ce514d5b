//! Pre-flight validation of token configurations.
//!
//! Findings are advisory: they ride along on results as warnings and only
//! block a deployment when the caller opts into treating critical findings as
//! fatal.

use serde::{Deserialize, Serialize};

use crate::modules::{ModuleCategory, ModuleConfig, TokenConfiguration};
use crate::standard::TokenStandard;

/// Severity of a pre-flight finding.
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
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// One pre-flight finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub severity: Severity,
    pub module: Option<ModuleCategory>,
    pub message: String,
}

impl ValidationFinding {
    fn new(severity: Severity, module: Option<ModuleCategory>, message: impl Into<String>) -> Self {
        Self { severity, module, message: message.into() }
    }
}

/// Run pre-flight checks against a normalized configuration.
pub fn preflight(config: &TokenConfiguration) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();

    if config.standard == TokenStandard::SecurityToken {
        let compliance = config.module(ModuleCategory::Compliance);
        let kyc = matches!(
            compliance,
            Some(ModuleConfig::Compliance { enabled: true, kyc_required: true, .. })
        );
        if !kyc {
            findings.push(ValidationFinding::new(
                Severity::Critical,
                Some(ModuleCategory::Compliance),
                "security token without KYC-enforcing compliance module",
            ));
        }
        if config.module(ModuleCategory::Controllers).is_none_or(|m| !m.has_payload()) {
            findings.push(ValidationFinding::new(
                Severity::Warning,
                Some(ModuleCategory::Controllers),
                "security token without controllers; forced transfers will be unavailable",
            ));
        }
    }

    if config.standard == TokenStandard::Vault
        && config.module(ModuleCategory::YieldStrategy).is_none_or(|m| !m.has_payload())
    {
        findings.push(ValidationFinding::new(
            Severity::Warning,
            Some(ModuleCategory::YieldStrategy),
            "vault without yield strategies will hold assets idle",
        ));
    }

    for block in config.enabled_blocks() {
        match block {
            ModuleConfig::Fractionalization { .. }
                if config.standard != TokenStandard::NonFungible =>
            {
                findings.push(ValidationFinding::new(
                    Severity::Critical,
                    Some(ModuleCategory::Fractionalization),
                    format!("fractionalization is only supported on non-fungible tokens, not {}", config.standard),
                ));
            }
            ModuleConfig::Fees { transfer_fee_bps, recipient, .. } => {
                if *transfer_fee_bps > 0 && recipient.is_none() {
                    findings.push(ValidationFinding::new(
                        Severity::Warning,
                        Some(ModuleCategory::Fees),
                        "transfer fee configured without a recipient; fees will accrue to the contract",
                    ));
                }
                if *transfer_fee_bps > 1_000 {
                    findings.push(ValidationFinding::new(
                        Severity::Warning,
                        Some(ModuleCategory::Fees),
                        format!("transfer fee of {transfer_fee_bps} bps is above 10%"),
                    ));
                }
            }
            ModuleConfig::YieldStrategy { strategies, .. } => {
                let total: u32 = strategies.iter().map(|s| s.allocation_bps as u32).sum();
                if total > 10_000 {
                    findings.push(ValidationFinding::new(
                        Severity::Critical,
                        Some(ModuleCategory::YieldStrategy),
                        format!("strategy allocations sum to {total} bps, above 100%"),
                    ));
                }
            }
            ModuleConfig::Timelock { min_delay_secs, .. } if *min_delay_secs == 0 => {
                findings.push(ValidationFinding::new(
                    Severity::Info,
                    Some(ModuleCategory::Timelock),
                    "timelock enabled with zero delay has no effect",
                ));
            }
            _ => {}
        }
    }

    findings
}

/// Whether any finding is critical.
pub fn has_critical(findings: &[ValidationFinding]) -> bool {
    findings.iter().any(|f| f.severity == Severity::Critical)
}
