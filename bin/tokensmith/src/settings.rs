use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tokensmith_engine::{CostModel, ExecutorSettings};
use url::Url;

/// CLI settings, layered as defaults < settings file < TOKENSMITH_* env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the deployment collaborator.
    pub endpoint: String,
    /// Wait between consecutive configuration transactions, in seconds.
    pub inter_chunk_delay_secs: u64,
    /// Per-transaction timeout, in seconds.
    pub chunk_timeout_secs: u64,
    pub gas_price_gwei: f64,
    pub eth_price_usd: f64,
    /// Default actor recorded in the audit trail.
    pub actor: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/".to_string(),
            inter_chunk_delay_secs: 2,
            chunk_timeout_secs: 60,
            gas_price_gwei: 20.0,
            eth_price_usd: 2_500.0,
            actor: None,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("TOKENSMITH_"))
            .extract()
            .with_context(|| format!("Failed to load settings from {}", path.display()))
    }

    pub fn endpoint_url(&self) -> Result<Url> {
        Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid collaborator endpoint: {}", self.endpoint))
    }

    pub fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            inter_chunk_delay: Duration::from_secs(self.inter_chunk_delay_secs),
            chunk_timeout: Duration::from_secs(self.chunk_timeout_secs),
            deadline: None,
        }
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel { gas_price_gwei: self.gas_price_gwei, eth_price_usd: self.eth_price_usd }
    }
}
