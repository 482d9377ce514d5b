//! Token standards and their deployment profiles.
//!
//! Each standard carries a declarative [`StandardProfile`]: module weights for
//! complexity scoring, level thresholds, the chunking cutoffs and the chunk
//! specs used by the planner. The engine is generic over the profile, so
//! adding a standard means adding a table entry, not another copy of the
//! analyzer/router/executor logic.

use serde::{Deserialize, Serialize};

use crate::modules::ModuleCategory;

/// The supported token standards.
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
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TokenStandard {
    Fungible,
    NonFungible,
    MultiToken,
    SemiFungible,
    SecurityToken,
    Vault,
    WrappedFungible,
    RebasingFungible,
}

/// Score thresholds mapping a complexity score to a level.
///
/// A score below `medium` is low, below `high` is medium, below `extreme`
/// is high, anything else is extreme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelThresholds {
    pub medium: u32,
    pub high: u32,
    pub extreme: u32,
}

/// One post-deployment configuration step as declared by a profile.
///
/// `priority` orders chunk execution (ascending). `dependencies` list the
/// categories that must be configured on-chain before this one; they are
/// declared explicitly, never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpec {
    pub category: ModuleCategory,
    pub priority: u32,
    pub per_item_gas: u64,
    pub dependencies: &'static [ModuleCategory],
}

/// Declarative deployment profile for one token standard.
#[derive(Debug, Clone, Copy)]
pub struct StandardProfile {
    pub standard: TokenStandard,
    /// Complexity weight per module. Modules not listed score
    /// [`DEFAULT_MODULE_WEIGHT`] per configured item.
    pub module_weights: &'static [(ModuleCategory, u32)],
    pub level_thresholds: LevelThresholds,
    /// Score above which the chunked strategy is required.
    pub chunking_threshold: u32,
    /// Hard cardinality limit: any single collection larger than this forces
    /// the chunked strategy regardless of score.
    pub max_collection_items: usize,
    /// Per-standard overrides of the canonical chunk table.
    pub chunk_overrides: &'static [ChunkSpec],
}

/// Weight applied to modules a profile does not list explicitly.
pub const DEFAULT_MODULE_WEIGHT: u32 = 1;

/// Gas cost assumed for the base contract deployment itself.
pub const BASE_DEPLOY_GAS: u64 = 2_500_000;

impl StandardProfile {
    /// Complexity weight for a module category under this standard.
    pub fn module_weight(&self, category: ModuleCategory) -> u32 {
        self.module_weights
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, w)| *w)
            .unwrap_or(DEFAULT_MODULE_WEIGHT)
    }

    /// Chunk spec for a category: the profile override if declared, otherwise
    /// the canonical table entry.
    pub fn chunk_spec(&self, category: ModuleCategory) -> ChunkSpec {
        self.chunk_overrides
            .iter()
            .chain(CANONICAL_CHUNKS.iter())
            .find(|spec| spec.category == category)
            .copied()
            .expect("canonical chunk table covers every module category")
    }

    /// Position of a category in the canonical table, used as the stable
    /// tie-break when chunk priorities are equal.
    pub fn canonical_index(category: ModuleCategory) -> usize {
        CANONICAL_CHUNKS
            .iter()
            .position(|spec| spec.category == category)
            .expect("canonical chunk table covers every module category")
    }
}

impl TokenStandard {
    /// The deployment profile for this standard.
    pub fn profile(&self) -> &'static StandardProfile {
        match self {
            TokenStandard::Fungible => &FUNGIBLE_PROFILE,
            TokenStandard::NonFungible => &NON_FUNGIBLE_PROFILE,
            TokenStandard::MultiToken => &MULTI_TOKEN_PROFILE,
            TokenStandard::SemiFungible => &SEMI_FUNGIBLE_PROFILE,
            TokenStandard::SecurityToken => &SECURITY_TOKEN_PROFILE,
            TokenStandard::Vault => &VAULT_PROFILE,
            TokenStandard::WrappedFungible => &WRAPPED_FUNGIBLE_PROFILE,
            TokenStandard::RebasingFungible => &REBASING_FUNGIBLE_PROFILE,
        }
    }
}

use ModuleCategory::*;

/// The canonical chunk table.
///
/// Covers every module category. Priorities group configuration into phases:
/// supply/compliance plumbing first, governance next, economics after that,
/// and feature extensions last. Declaration order doubles as the stable
/// tie-break for equal priorities.
pub const CANONICAL_CHUNKS: &[ChunkSpec] = &[
    ChunkSpec { category: SupplyCap, priority: 10, per_item_gas: 30_000, dependencies: &[] },
    ChunkSpec { category: Compliance, priority: 20, per_item_gas: 45_000, dependencies: &[] },
    ChunkSpec { category: GeographicRestrictions, priority: 25, per_item_gas: 35_000, dependencies: &[Compliance] },
    ChunkSpec { category: TransferRestrictions, priority: 30, per_item_gas: 50_000, dependencies: &[Compliance] },
    ChunkSpec { category: Controllers, priority: 35, per_item_gas: 45_000, dependencies: &[Compliance] },
    ChunkSpec { category: Partitions, priority: 40, per_item_gas: 75_000, dependencies: &[] },
    ChunkSpec { category: SlotManager, priority: 40, per_item_gas: 55_000, dependencies: &[] },
    ChunkSpec { category: UriManagement, priority: 45, per_item_gas: 35_000, dependencies: &[] },
    ChunkSpec { category: Permit, priority: 50, per_item_gas: 30_000, dependencies: &[] },
    ChunkSpec { category: Votes, priority: 50, per_item_gas: 80_000, dependencies: &[] },
    ChunkSpec { category: Timelock, priority: 55, per_item_gas: 70_000, dependencies: &[Votes] },
    ChunkSpec { category: Fees, priority: 60, per_item_gas: 50_000, dependencies: &[] },
    ChunkSpec { category: FeeStrategy, priority: 60, per_item_gas: 65_000, dependencies: &[] },
    ChunkSpec { category: Royalty, priority: 65, per_item_gas: 40_000, dependencies: &[] },
    ChunkSpec { category: Documents, priority: 70, per_item_gas: 60_000, dependencies: &[] },
    ChunkSpec { category: PolicyEngine, priority: 75, per_item_gas: 90_000, dependencies: &[Compliance] },
    ChunkSpec { category: Vesting, priority: 80, per_item_gas: 120_000, dependencies: &[] },
    ChunkSpec { category: YieldStrategy, priority: 85, per_item_gas: 110_000, dependencies: &[] },
    ChunkSpec { category: MultiAssetVault, priority: 85, per_item_gas: 95_000, dependencies: &[] },
    ChunkSpec { category: WithdrawalQueue, priority: 90, per_item_gas: 85_000, dependencies: &[YieldStrategy] },
    ChunkSpec { category: Router, priority: 95, per_item_gas: 70_000, dependencies: &[YieldStrategy] },
    ChunkSpec { category: Rental, priority: 100, per_item_gas: 60_000, dependencies: &[] },
    ChunkSpec { category: Soulbound, priority: 100, per_item_gas: 25_000, dependencies: &[] },
    ChunkSpec { category: Fractionalization, priority: 105, per_item_gas: 150_000, dependencies: &[] },
    ChunkSpec { category: GranularApproval, priority: 110, per_item_gas: 40_000, dependencies: &[] },
    ChunkSpec { category: Custody, priority: 115, per_item_gas: 60_000, dependencies: &[Controllers] },
];

static FUNGIBLE_PROFILE: StandardProfile = StandardProfile {
    standard: TokenStandard::Fungible,
    module_weights: &[
        (Compliance, 2),
        (Vesting, 3),
        (Fees, 2),
        (Votes, 2),
        (Timelock, 2),
        (PolicyEngine, 3),
    ],
    level_thresholds: LevelThresholds { medium: 10, high: 30, extreme: 60 },
    chunking_threshold: 30,
    max_collection_items: 20,
    chunk_overrides: &[],
};

static NON_FUNGIBLE_PROFILE: StandardProfile = StandardProfile {
    standard: TokenStandard::NonFungible,
    module_weights: &[
        (Royalty, 2),
        (Rental, 3),
        (Fractionalization, 4),
        (Documents, 2),
        (PolicyEngine, 3),
    ],
    level_thresholds: LevelThresholds { medium: 10, high: 30, extreme: 60 },
    chunking_threshold: 30,
    max_collection_items: 20,
    chunk_overrides: &[],
};

static MULTI_TOKEN_PROFILE: StandardProfile = StandardProfile {
    standard: TokenStandard::MultiToken,
    module_weights: &[
        (UriManagement, 2),
        (GranularApproval, 2),
        (SupplyCap, 2),
        (Fees, 2),
    ],
    level_thresholds: LevelThresholds { medium: 12, high: 32, extreme: 64 },
    chunking_threshold: 35,
    max_collection_items: 25,
    chunk_overrides: &[],
};

static SEMI_FUNGIBLE_PROFILE: StandardProfile = StandardProfile {
    standard: TokenStandard::SemiFungible,
    module_weights: &[
        (SlotManager, 4),
        (GranularApproval, 2),
        (UriManagement, 2),
    ],
    level_thresholds: LevelThresholds { medium: 8, high: 25, extreme: 50 },
    chunking_threshold: 25,
    // Slot counts above this are unreliable in a single transaction.
    max_collection_items: 10,
    chunk_overrides: &[],
};

static SECURITY_TOKEN_PROFILE: StandardProfile = StandardProfile {
    standard: TokenStandard::SecurityToken,
    module_weights: &[
        (Compliance, 4),
        (Partitions, 5),
        (Controllers, 3),
        (Documents, 3),
        (TransferRestrictions, 3),
        (GeographicRestrictions, 2),
        (Custody, 3),
        (Vesting, 3),
        (PolicyEngine, 4),
    ],
    level_thresholds: LevelThresholds { medium: 8, high: 25, extreme: 50 },
    chunking_threshold: 25,
    max_collection_items: 15,
    chunk_overrides: &[],
};

static VAULT_PROFILE: StandardProfile = StandardProfile {
    standard: TokenStandard::Vault,
    module_weights: &[
        (YieldStrategy, 5),
        (MultiAssetVault, 4),
        (FeeStrategy, 3),
        (WithdrawalQueue, 3),
        (Router, 2),
    ],
    level_thresholds: LevelThresholds { medium: 8, high: 25, extreme: 50 },
    chunking_threshold: 25,
    // More than 10 strategies or asset slots goes multi-transaction.
    max_collection_items: 10,
    chunk_overrides: &[],
};

static WRAPPED_FUNGIBLE_PROFILE: StandardProfile = StandardProfile {
    standard: TokenStandard::WrappedFungible,
    module_weights: &[(Fees, 2), (SupplyCap, 2)],
    level_thresholds: LevelThresholds { medium: 12, high: 35, extreme: 70 },
    chunking_threshold: 40,
    max_collection_items: 25,
    chunk_overrides: &[],
};

static REBASING_FUNGIBLE_PROFILE: StandardProfile = StandardProfile {
    standard: TokenStandard::RebasingFungible,
    module_weights: &[(SupplyCap, 3), (Fees, 2), (PolicyEngine, 3)],
    level_thresholds: LevelThresholds { medium: 10, high: 30, extreme: 60 },
    chunking_threshold: 30,
    max_collection_items: 20,
    chunk_overrides: &[],
};

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_canonical_table_covers_every_category() {
        for category in ModuleCategory::iter() {
            assert!(
                CANONICAL_CHUNKS.iter().any(|s| s.category == category),
                "no canonical chunk spec for {category}"
            );
        }
    }

    #[test]
    fn test_canonical_table_has_no_duplicates() {
        for (i, spec) in CANONICAL_CHUNKS.iter().enumerate() {
            assert!(
                !CANONICAL_CHUNKS[i + 1..].iter().any(|s| s.category == spec.category),
                "duplicate canonical chunk spec for {}",
                spec.category
            );
        }
    }

    #[test]
    fn test_dependencies_have_lower_priority() {
        // A dependency must never be declared with a higher priority than its
        // dependents, otherwise the planner would have to reorder every plan.
        for spec in CANONICAL_CHUNKS {
            for dep in spec.dependencies {
                let dep_spec = CANONICAL_CHUNKS
                    .iter()
                    .find(|s| s.category == *dep)
                    .expect("dependency present in canonical table");
                assert!(
                    dep_spec.priority <= spec.priority,
                    "{} depends on {} but is ordered before it",
                    spec.category,
                    dep
                );
            }
        }
    }

    #[test]
    fn test_profile_weight_fallback() {
        let profile = TokenStandard::Fungible.profile();
        assert_eq!(profile.module_weight(ModuleCategory::Compliance), 2);
        assert_eq!(profile.module_weight(ModuleCategory::Soulbound), DEFAULT_MODULE_WEIGHT);
    }

    #[test]
    fn test_standard_display_round_trip() {
        use std::str::FromStr;
        assert_eq!(TokenStandard::SecurityToken.to_string(), "security-token");
        assert_eq!(
            TokenStandard::from_str("security-token").unwrap(),
            TokenStandard::SecurityToken
        );
    }
}
