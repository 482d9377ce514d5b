use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokensmith_engine::StrategyOverride;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "tokensmith")]
#[command(
    author,
    version,
    about = "Decide and run deployment strategies for modular token configurations"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "TOKENSMITH_VERBOSITY", default_value_t = LevelFilter::INFO, global = true)]
    pub verbosity: LevelFilter,

    /// Path to the settings file.
    ///
    /// Values from this file are overridden by TOKENSMITH_* environment
    /// variables.
    #[arg(long, alias = "conf", env = "TOKENSMITH_SETTINGS", default_value = "Tokensmith.toml", global = true)]
    pub settings: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyze a token configuration and print the recommended strategy.
    ///
    /// Read-only: never contacts the deployment collaborator.
    Recommend {
        /// Path to the token configuration file (TOML).
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print the configuration chunk plan for a token.
    Plan {
        /// Path to the token configuration file (TOML).
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Deploy a token with the selected strategy.
    Deploy {
        /// Path to the token configuration file (TOML).
        #[arg(short, long)]
        config: PathBuf,

        /// Who is performing the deployment, for the audit trail.
        #[arg(long, env = "TOKENSMITH_ACTOR")]
        actor: Option<String>,

        /// Collaborator endpoint, overriding the settings file.
        #[arg(long, env = "TOKENSMITH_ENDPOINT")]
        endpoint: Option<String>,

        /// Deploying wallet address, forwarded to the collaborator.
        #[arg(long)]
        wallet_address: Option<String>,

        /// Fee cap in wei, forwarded to the collaborator.
        #[arg(long)]
        max_fee_per_gas: Option<u64>,

        /// Strategy override: auto, basic, enhanced or chunked.
        #[arg(long, default_value_t = StrategyOverride::Auto)]
        force_strategy: StrategyOverride,

        /// Overall time budget for the deployment, in seconds.
        #[arg(long)]
        deadline_secs: Option<u64>,

        /// Refuse to deploy when pre-flight validation finds a critical issue.
        #[arg(long)]
        block_on_critical: bool,

        /// Analyze and plan only; do not contact the collaborator.
        #[arg(long)]
        dry_run: bool,
    },
}
