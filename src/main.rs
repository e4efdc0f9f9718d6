use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scour::cli::{commands, Cli, Commands};
use scour::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Scrape {
            url,
            json,
            static_only,
        } => {
            commands::scrape(config, &url, json, static_only).await?;
        }
        Commands::Resolve { url, offline } => {
            commands::resolve(config, &url, offline).await?;
        }
        Commands::ConfigPath => {
            commands::config_path()?;
        }
    }

    Ok(())
}
