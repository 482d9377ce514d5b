//! tokensmith is a CLI for deciding and running deployment strategies for
//! modular token configurations.

mod cli;
mod output;
mod settings;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command};
use settings::Settings;
use tokensmith_engine::{
    DeployOptions, HttpBackend, MemoryStore, TokenConfiguration, TokenDeployer, planner,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let settings = Settings::load(&cli.settings)?;

    match cli.command {
        Command::Recommend { config } => {
            let token = load_token(&config)?;
            let deployer = build_deployer(&settings, token.clone())?;
            let recommendation = deployer.recommendation(&token.id).await;
            output::print_recommendation(&recommendation);
        }
        Command::Plan { config } => {
            let token = load_token(&config)?.normalized();
            output::print_plan(&planner::plan(&token));
        }
        Command::Deploy {
            config,
            actor,
            endpoint,
            wallet_address,
            max_fee_per_gas,
            force_strategy,
            deadline_secs,
            block_on_critical,
            dry_run,
        } => {
            let mut settings = settings;
            if let Some(endpoint) = endpoint {
                settings.endpoint = endpoint;
            }
            let token = load_token(&config)?;
            let deployer = build_deployer(&settings, token.clone())?;

            if dry_run {
                let recommendation = deployer.recommendation(&token.id).await;
                output::print_recommendation(&recommendation);
                output::print_plan(&planner::plan(&token.normalized()));
                return Ok(());
            }

            let actor = actor
                .or_else(|| settings.actor.clone())
                .unwrap_or_else(|| "tokensmith-cli".to_string());
            let scope = format!("cli-{:08x}", rand::random::<u32>());
            let options = DeployOptions {
                force_strategy,
                wallet_address,
                max_fee_per_gas,
                deadline: deadline_secs.map(Duration::from_secs),
                block_on_critical,
            };

            tracing::info!(
                token_id = %token.id,
                %actor,
                %scope,
                endpoint = %settings.endpoint,
                "Starting deployment..."
            );

            let result = deployer.deploy(&token.id, &actor, &scope, options).await;
            output::print_result(&result);

            if !result.success {
                anyhow::bail!(
                    "deployment of {} did not complete: {}",
                    token.id,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    Ok(())
}

fn load_token(path: &Path) -> Result<TokenConfiguration> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read token configuration {}", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("Failed to parse token configuration {}", path.display()))
}

fn build_deployer(
    settings: &Settings,
    token: TokenConfiguration,
) -> Result<TokenDeployer<MemoryStore, HttpBackend>> {
    let backend = HttpBackend::new(settings.endpoint_url()?)?;
    let store = MemoryStore::new().with(token);
    Ok(TokenDeployer::new(store, backend)
        .with_settings(settings.executor_settings())
        .with_cost_model(settings.cost_model()))
}
