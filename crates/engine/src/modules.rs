//! The token module configuration model.
//!
//! A token configuration is a base identity (id, standard, chain target) plus
//! a set of optional feature blocks. Each block is a tagged [`ModuleConfig`]
//! variant with typed fields, so an unknown or malformed module key fails at
//! deserialization time instead of silently configuring nothing.

use serde::{Deserialize, Serialize};

use crate::standard::TokenStandard;

/// Deployment target environment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Mainnet,
    Testnet,
}

/// A token configuration as read from the config store.
///
/// Read-only to the engine; it is re-read on every deployment attempt so a
/// stale complexity decision cannot outlive an edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenConfiguration {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub standard: TokenStandard,
    pub blockchain: String,
    pub environment: Environment,
    #[serde(default)]
    pub blocks: Vec<ModuleConfig>,
}

/// The category tag of a module block.
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
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModuleCategory {
    Compliance,
    Vesting,
    Documents,
    PolicyEngine,
    Fees,
    Permit,
    Votes,
    Timelock,
    Royalty,
    Rental,
    Soulbound,
    Fractionalization,
    SupplyCap,
    UriManagement,
    GranularApproval,
    SlotManager,
    FeeStrategy,
    WithdrawalQueue,
    YieldStrategy,
    Router,
    MultiAssetVault,
    TransferRestrictions,
    Controllers,
    Partitions,
    GeographicRestrictions,
    Custody,
}

/// One vesting schedule entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VestingSchedule {
    pub beneficiary: String,
    pub amount: u128,
    pub cliff_secs: u64,
    pub duration_secs: u64,
}

/// A reference to an off-chain legal or disclosure document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub name: String,
    pub uri: String,
    pub content_hash: String,
}

/// One rule evaluated by the on-chain policy engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub name: String,
    pub condition: String,
    pub action: String,
}

/// A semi-fungible slot definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDef {
    pub slot_id: u64,
    pub name: String,
    #[serde(default)]
    pub transferable: bool,
}

/// One tier of a tiered fee strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeTier {
    pub threshold: u128,
    pub fee_bps: u16,
}

/// An allocation into a yield strategy, in basis points of vault assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyAllocation {
    pub strategy: String,
    pub allocation_bps: u16,
}

/// An asset slot of a multi-asset vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAllocation {
    pub asset: String,
    pub target_bps: u16,
}

/// A security-token partition definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionDef {
    pub name: String,
    pub amount: u128,
    #[serde(default)]
    pub transferable: bool,
}

/// One optional feature block of a token configuration.
///
/// Every variant carries `enabled`; when a block is disabled its dependent
/// fields are treated as absent regardless of what is still sitting in
/// storage (see [`ModuleConfig::normalized`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "module", rename_all = "snake_case")]
pub enum ModuleConfig {
    Compliance {
        enabled: bool,
        #[serde(default)]
        kyc_required: bool,
        #[serde(default)]
        whitelist: Vec<String>,
        #[serde(default)]
        max_holders: Option<u32>,
    },
    Vesting {
        enabled: bool,
        #[serde(default)]
        schedules: Vec<VestingSchedule>,
    },
    Documents {
        enabled: bool,
        #[serde(default)]
        documents: Vec<DocumentRef>,
    },
    PolicyEngine {
        enabled: bool,
        #[serde(default)]
        rules: Vec<PolicyRule>,
    },
    Fees {
        enabled: bool,
        #[serde(default)]
        transfer_fee_bps: u16,
        #[serde(default)]
        recipient: Option<String>,
    },
    Permit {
        enabled: bool,
    },
    Votes {
        enabled: bool,
        #[serde(default)]
        quorum_bps: u16,
    },
    Timelock {
        enabled: bool,
        #[serde(default)]
        min_delay_secs: u64,
    },
    Royalty {
        enabled: bool,
        #[serde(default)]
        royalty_bps: u16,
        #[serde(default)]
        receiver: Option<String>,
    },
    Rental {
        enabled: bool,
        #[serde(default)]
        max_duration_secs: u64,
    },
    Soulbound {
        enabled: bool,
    },
    Fractionalization {
        enabled: bool,
        #[serde(default)]
        share_supply: u64,
    },
    SupplyCap {
        enabled: bool,
        #[serde(default)]
        max_supply: u128,
    },
    UriManagement {
        enabled: bool,
        #[serde(default)]
        base_uri: Option<String>,
    },
    GranularApproval {
        enabled: bool,
    },
    SlotManager {
        enabled: bool,
        #[serde(default)]
        slots: Vec<SlotDef>,
    },
    FeeStrategy {
        enabled: bool,
        #[serde(default)]
        tiers: Vec<FeeTier>,
    },
    WithdrawalQueue {
        enabled: bool,
        #[serde(default)]
        max_queue_len: u32,
    },
    YieldStrategy {
        enabled: bool,
        #[serde(default)]
        strategies: Vec<StrategyAllocation>,
    },
    Router {
        enabled: bool,
        #[serde(default)]
        adapters: Vec<String>,
    },
    MultiAssetVault {
        enabled: bool,
        #[serde(default)]
        assets: Vec<AssetAllocation>,
    },
    TransferRestrictions {
        enabled: bool,
        #[serde(default)]
        lockup_secs: u64,
        #[serde(default)]
        restricted_countries: Vec<String>,
    },
    Controllers {
        enabled: bool,
        #[serde(default)]
        controllers: Vec<String>,
    },
    Partitions {
        enabled: bool,
        #[serde(default)]
        partitions: Vec<PartitionDef>,
    },
    GeographicRestrictions {
        enabled: bool,
        #[serde(default)]
        allowed_countries: Vec<String>,
    },
    Custody {
        enabled: bool,
        #[serde(default)]
        custodian: Option<String>,
    },
}

impl ModuleConfig {
    /// The category tag of this block.
    pub fn category(&self) -> ModuleCategory {
        match self {
            ModuleConfig::Compliance { .. } => ModuleCategory::Compliance,
            ModuleConfig::Vesting { .. } => ModuleCategory::Vesting,
            ModuleConfig::Documents { .. } => ModuleCategory::Documents,
            ModuleConfig::PolicyEngine { .. } => ModuleCategory::PolicyEngine,
            ModuleConfig::Fees { .. } => ModuleCategory::Fees,
            ModuleConfig::Permit { .. } => ModuleCategory::Permit,
            ModuleConfig::Votes { .. } => ModuleCategory::Votes,
            ModuleConfig::Timelock { .. } => ModuleCategory::Timelock,
            ModuleConfig::Royalty { .. } => ModuleCategory::Royalty,
            ModuleConfig::Rental { .. } => ModuleCategory::Rental,
            ModuleConfig::Soulbound { .. } => ModuleCategory::Soulbound,
            ModuleConfig::Fractionalization { .. } => ModuleCategory::Fractionalization,
            ModuleConfig::SupplyCap { .. } => ModuleCategory::SupplyCap,
            ModuleConfig::UriManagement { .. } => ModuleCategory::UriManagement,
            ModuleConfig::GranularApproval { .. } => ModuleCategory::GranularApproval,
            ModuleConfig::SlotManager { .. } => ModuleCategory::SlotManager,
            ModuleConfig::FeeStrategy { .. } => ModuleCategory::FeeStrategy,
            ModuleConfig::WithdrawalQueue { .. } => ModuleCategory::WithdrawalQueue,
            ModuleConfig::YieldStrategy { .. } => ModuleCategory::YieldStrategy,
            ModuleConfig::Router { .. } => ModuleCategory::Router,
            ModuleConfig::MultiAssetVault { .. } => ModuleCategory::MultiAssetVault,
            ModuleConfig::TransferRestrictions { .. } => ModuleCategory::TransferRestrictions,
            ModuleConfig::Controllers { .. } => ModuleCategory::Controllers,
            ModuleConfig::Partitions { .. } => ModuleCategory::Partitions,
            ModuleConfig::GeographicRestrictions { .. } => ModuleCategory::GeographicRestrictions,
            ModuleConfig::Custody { .. } => ModuleCategory::Custody,
        }
    }

    /// Whether the block is switched on.
    pub fn is_enabled(&self) -> bool {
        match self {
            ModuleConfig::Compliance { enabled, .. }
            | ModuleConfig::Vesting { enabled, .. }
            | ModuleConfig::Documents { enabled, .. }
            | ModuleConfig::PolicyEngine { enabled, .. }
            | ModuleConfig::Fees { enabled, .. }
            | ModuleConfig::Permit { enabled }
            | ModuleConfig::Votes { enabled, .. }
            | ModuleConfig::Timelock { enabled, .. }
            | ModuleConfig::Royalty { enabled, .. }
            | ModuleConfig::Rental { enabled, .. }
            | ModuleConfig::Soulbound { enabled }
            | ModuleConfig::Fractionalization { enabled, .. }
            | ModuleConfig::SupplyCap { enabled, .. }
            | ModuleConfig::UriManagement { enabled, .. }
            | ModuleConfig::GranularApproval { enabled }
            | ModuleConfig::SlotManager { enabled, .. }
            | ModuleConfig::FeeStrategy { enabled, .. }
            | ModuleConfig::WithdrawalQueue { enabled, .. }
            | ModuleConfig::YieldStrategy { enabled, .. }
            | ModuleConfig::Router { enabled, .. }
            | ModuleConfig::MultiAssetVault { enabled, .. }
            | ModuleConfig::TransferRestrictions { enabled, .. }
            | ModuleConfig::Controllers { enabled, .. }
            | ModuleConfig::Partitions { enabled, .. }
            | ModuleConfig::GeographicRestrictions { enabled, .. }
            | ModuleConfig::Custody { enabled, .. } => *enabled,
        }
    }

    /// Number of configurable items in this block.
    ///
    /// Collection-backed modules report their collection length, scalar
    /// modules count as one item.
    pub fn item_count(&self) -> usize {
        match self {
            ModuleConfig::Compliance { whitelist, .. } => whitelist.len().max(1),
            ModuleConfig::Vesting { schedules, .. } => schedules.len(),
            ModuleConfig::Documents { documents, .. } => documents.len(),
            ModuleConfig::PolicyEngine { rules, .. } => rules.len(),
            ModuleConfig::SlotManager { slots, .. } => slots.len(),
            ModuleConfig::FeeStrategy { tiers, .. } => tiers.len(),
            ModuleConfig::YieldStrategy { strategies, .. } => strategies.len(),
            ModuleConfig::Router { adapters, .. } => adapters.len(),
            ModuleConfig::MultiAssetVault { assets, .. } => assets.len(),
            ModuleConfig::TransferRestrictions { restricted_countries, .. } => {
                restricted_countries.len().max(1)
            }
            ModuleConfig::Controllers { controllers, .. } => controllers.len(),
            ModuleConfig::Partitions { partitions, .. } => partitions.len(),
            ModuleConfig::GeographicRestrictions { allowed_countries, .. } => {
                allowed_countries.len()
            }
            _ => 1,
        }
    }

    /// Whether this block is backed by a collection that must be non-empty to
    /// have any on-chain effect.
    pub fn is_collection_backed(&self) -> bool {
        matches!(
            self.category(),
            ModuleCategory::Vesting
                | ModuleCategory::Documents
                | ModuleCategory::PolicyEngine
                | ModuleCategory::SlotManager
                | ModuleCategory::FeeStrategy
                | ModuleCategory::YieldStrategy
                | ModuleCategory::Router
                | ModuleCategory::MultiAssetVault
                | ModuleCategory::Controllers
                | ModuleCategory::Partitions
                | ModuleCategory::GeographicRestrictions
        )
    }

    /// Whether this block would contribute an actual configuration step.
    ///
    /// A disabled block never does; an enabled collection-backed block with an
    /// empty collection has nothing to execute either.
    pub fn has_payload(&self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        !self.is_collection_backed() || self.item_count() > 0
    }

    /// Re-zero dependent fields when the block is disabled.
    ///
    /// The UI layer is supposed to clear dependent fields on disable, but
    /// stale values do survive in storage; the engine must not let them leak
    /// into scoring or chunk payloads.
    pub fn normalized(self) -> Self {
        if self.is_enabled() {
            return self;
        }
        match self {
            ModuleConfig::Compliance { .. } => ModuleConfig::Compliance {
                enabled: false,
                kyc_required: false,
                whitelist: Vec::new(),
                max_holders: None,
            },
            ModuleConfig::Vesting { .. } => {
                ModuleConfig::Vesting { enabled: false, schedules: Vec::new() }
            }
            ModuleConfig::Documents { .. } => {
                ModuleConfig::Documents { enabled: false, documents: Vec::new() }
            }
            ModuleConfig::PolicyEngine { .. } => {
                ModuleConfig::PolicyEngine { enabled: false, rules: Vec::new() }
            }
            ModuleConfig::Fees { .. } => {
                ModuleConfig::Fees { enabled: false, transfer_fee_bps: 0, recipient: None }
            }
            ModuleConfig::Permit { .. } => ModuleConfig::Permit { enabled: false },
            ModuleConfig::Votes { .. } => ModuleConfig::Votes { enabled: false, quorum_bps: 0 },
            ModuleConfig::Timelock { .. } => {
                ModuleConfig::Timelock { enabled: false, min_delay_secs: 0 }
            }
            ModuleConfig::Royalty { .. } => {
                ModuleConfig::Royalty { enabled: false, royalty_bps: 0, receiver: None }
            }
            ModuleConfig::Rental { .. } => {
                ModuleConfig::Rental { enabled: false, max_duration_secs: 0 }
            }
            ModuleConfig::Soulbound { .. } => ModuleConfig::Soulbound { enabled: false },
            ModuleConfig::Fractionalization { .. } => {
                ModuleConfig::Fractionalization { enabled: false, share_supply: 0 }
            }
            ModuleConfig::SupplyCap { .. } => {
                ModuleConfig::SupplyCap { enabled: false, max_supply: 0 }
            }
            ModuleConfig::UriManagement { .. } => {
                ModuleConfig::UriManagement { enabled: false, base_uri: None }
            }
            ModuleConfig::GranularApproval { .. } => {
                ModuleConfig::GranularApproval { enabled: false }
            }
            ModuleConfig::SlotManager { .. } => {
                ModuleConfig::SlotManager { enabled: false, slots: Vec::new() }
            }
            ModuleConfig::FeeStrategy { .. } => {
                ModuleConfig::FeeStrategy { enabled: false, tiers: Vec::new() }
            }
            ModuleConfig::WithdrawalQueue { .. } => {
                ModuleConfig::WithdrawalQueue { enabled: false, max_queue_len: 0 }
            }
            ModuleConfig::YieldStrategy { .. } => {
                ModuleConfig::YieldStrategy { enabled: false, strategies: Vec::new() }
            }
            ModuleConfig::Router { .. } => {
                ModuleConfig::Router { enabled: false, adapters: Vec::new() }
            }
            ModuleConfig::MultiAssetVault { .. } => {
                ModuleConfig::MultiAssetVault { enabled: false, assets: Vec::new() }
            }
            ModuleConfig::TransferRestrictions { .. } => ModuleConfig::TransferRestrictions {
                enabled: false,
                lockup_secs: 0,
                restricted_countries: Vec::new(),
            },
            ModuleConfig::Controllers { .. } => {
                ModuleConfig::Controllers { enabled: false, controllers: Vec::new() }
            }
            ModuleConfig::Partitions { .. } => {
                ModuleConfig::Partitions { enabled: false, partitions: Vec::new() }
            }
            ModuleConfig::GeographicRestrictions { .. } => {
                ModuleConfig::GeographicRestrictions {
                    enabled: false,
                    allowed_countries: Vec::new(),
                }
            }
            ModuleConfig::Custody { .. } => {
                ModuleConfig::Custody { enabled: false, custodian: None }
            }
        }
    }
}

impl TokenConfiguration {
    /// Normalize every block, re-zeroing dependent fields of disabled modules.
    pub fn normalized(mut self) -> Self {
        self.blocks = self.blocks.into_iter().map(ModuleConfig::normalized).collect();
        self
    }

    /// The first block of the given category, if configured.
    pub fn module(&self, category: ModuleCategory) -> Option<&ModuleConfig> {
        self.blocks.iter().find(|b| b.category() == category)
    }

    /// Enabled blocks, deduplicated by category (first declaration wins).
    pub fn enabled_blocks(&self) -> Vec<&ModuleConfig> {
        let mut seen = Vec::new();
        let mut out = Vec::new();
        for block in &self.blocks {
            let category = block.category();
            if block.is_enabled() && !seen.contains(&category) {
                seen.push(category);
                out.push(block);
            }
        }
        out
    }

    /// The base deployment payload: identity fields without module blocks.
    pub fn base_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "symbol": self.symbol,
            "standard": self.standard,
            "blockchain": self.blockchain,
            "environment": self.environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vesting(enabled: bool, n: usize) -> ModuleConfig {
        ModuleConfig::Vesting {
            enabled,
            schedules: (0..n)
                .map(|i| VestingSchedule {
                    beneficiary: format!("0x{:040x}", i),
                    amount: 1_000,
                    cliff_secs: 0,
                    duration_secs: 86_400,
                })
                .collect(),
        }
    }

    #[test]
    fn test_disabled_module_is_rezeroed() {
        let stale = vesting(false, 3);
        let normalized = stale.normalized();
        assert_eq!(normalized, ModuleConfig::Vesting { enabled: false, schedules: Vec::new() });
    }

    #[test]
    fn test_enabled_module_survives_normalization() {
        let block = vesting(true, 2);
        assert_eq!(block.clone().normalized(), block);
    }

    #[test]
    fn test_has_payload() {
        assert!(vesting(true, 2).has_payload());
        assert!(!vesting(true, 0).has_payload());
        assert!(!vesting(false, 2).has_payload());
        assert!(ModuleConfig::Permit { enabled: true }.has_payload());
        assert!(!ModuleConfig::Permit { enabled: false }.has_payload());
    }

    #[test]
    fn test_unknown_module_tag_is_rejected() {
        let raw = serde_json::json!({ "module": "teleportation", "enabled": true });
        assert!(serde_json::from_value::<ModuleConfig>(raw).is_err());
    }

    #[test]
    fn test_module_tag_round_trip() {
        let block = ModuleConfig::YieldStrategy {
            enabled: true,
            strategies: vec![StrategyAllocation {
                strategy: "aave-v3".to_string(),
                allocation_bps: 5_000,
            }],
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["module"], "yield_strategy");
        let back: ModuleConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_configuration_parses_from_toml() {
        let raw = r#"
            id = "tok-1"
            name = "Treasury Vault"
            symbol = "TVLT"
            standard = "vault"
            blockchain = "ethereum"
            environment = "mainnet"

            [[blocks]]
            module = "yield_strategy"
            enabled = true
            strategies = [{ strategy = "aave-v3", allocation_bps = 6000 }]

            [[blocks]]
            module = "withdrawal_queue"
            enabled = true
            max_queue_len = 100
        "#;
        let config: TokenConfiguration = toml::from_str(raw).unwrap();
        assert_eq!(config.standard, crate::standard::TokenStandard::Vault);
        assert_eq!(config.blocks.len(), 2);
        assert_eq!(config.blocks[0].category(), ModuleCategory::YieldStrategy);
    }

    #[test]
    fn test_enabled_blocks_dedups_by_category() {
        let config = TokenConfiguration {
            id: "tok-1".to_string(),
            name: "Test".to_string(),
            symbol: "TST".to_string(),
            standard: crate::standard::TokenStandard::Fungible,
            blockchain: "ethereum".to_string(),
            environment: Environment::Testnet,
            blocks: vec![vesting(true, 1), vesting(true, 5), ModuleConfig::Permit { enabled: true }],
        };
        let enabled = config.enabled_blocks();
        assert_eq!(enabled.len(), 2);
        assert_eq!(enabled[0].item_count(), 1);
    }
}
