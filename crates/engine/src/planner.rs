//! Decomposition of a configuration into ordered configuration chunks.
//!
//! The plan is purely a gas/reliability optimization: applying every chunk's
//! payload in order to a freshly deployed base contract must end in the same
//! state as supplying the whole configuration at construction time.

use serde::{Deserialize, Serialize};

use crate::modules::{ModuleCategory, TokenConfiguration};
use crate::standard::StandardProfile;

/// One unit of post-deployment configuration work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationChunk {
    pub category: ModuleCategory,
    pub priority: u32,
    /// The module payload, exactly as it would appear in a full construction
    /// config.
    pub data: serde_json::Value,
    pub gas_estimate: u64,
    /// Categories that must be configured before this chunk. Dependencies on
    /// categories absent from the plan are trivially satisfied.
    pub dependencies: Vec<ModuleCategory>,
}

/// Plan the chunk sequence for a configuration.
///
/// Deterministic: identical configuration produces an identical list in an
/// identical order. One chunk per non-trivially-configured category; enabled
/// modules with empty collections emit nothing. The result is ordered by
/// ascending priority with the canonical table order as the stable tie-break,
/// then adjusted so no chunk precedes one of its dependencies.
pub fn plan(config: &TokenConfiguration) -> Vec<ConfigurationChunk> {
    let profile = config.standard.profile();

    let mut chunks: Vec<ConfigurationChunk> = config
        .enabled_blocks()
        .into_iter()
        .filter(|block| block.has_payload())
        .map(|block| {
            let category = block.category();
            let spec = profile.chunk_spec(category);
            ConfigurationChunk {
                category,
                priority: spec.priority,
                data: serde_json::to_value(block)
                    .expect("module configs serialize infallibly"),
                gas_estimate: spec.per_item_gas * block.item_count().max(1) as u64,
                dependencies: spec.dependencies.to_vec(),
            }
        })
        .collect();

    // Stable order: priority ascending, canonical declaration order on ties.
    chunks.sort_by_key(|c| (c.priority, StandardProfile::canonical_index(c.category)));

    order_by_dependencies(chunks)
}

/// Topological pass over the priority-sorted chunks.
///
/// Canonical priorities already respect the declared dependencies, but a
/// profile override may invert them; this keeps the plan valid either way.
/// Kahn's algorithm, always picking the ready chunk with the lowest
/// (priority, canonical index), so the output stays deterministic.
fn order_by_dependencies(chunks: Vec<ConfigurationChunk>) -> Vec<ConfigurationChunk> {
    let present: Vec<ModuleCategory> = chunks.iter().map(|c| c.category).collect();
    let mut remaining: Vec<ConfigurationChunk> = chunks;
    let mut ordered = Vec::with_capacity(remaining.len());
    let mut done: Vec<ModuleCategory> = Vec::new();

    while !remaining.is_empty() {
        let ready = remaining.iter().position(|chunk| {
            chunk
                .dependencies
                .iter()
                .all(|dep| done.contains(dep) || !present.contains(dep))
        });
        match ready {
            Some(idx) => {
                let chunk = remaining.remove(idx);
                done.push(chunk.category);
                ordered.push(chunk);
            }
            None => {
                // Dependency cycle in a profile table would be a table bug;
                // fall back to the priority order rather than dropping work.
                tracing::warn!(
                    categories = ?remaining.iter().map(|c| c.category).collect::<Vec<_>>(),
                    "Dependency cycle in chunk plan, falling back to priority order"
                );
                ordered.append(&mut remaining);
            }
        }
    }

    ordered
}

/// Total planned gas across all chunks.
pub fn total_gas(chunks: &[ConfigurationChunk]) -> u64 {
    chunks.iter().map(|c| c.gas_estimate).sum()
}
