pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scour")]
#[command(about = "Extract clean article text from arbitrary web pages", long_about = None)]
pub struct Cli {
    /// Path to a config file (default: ~/.config/scour/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract an article from a URL
    Scrape {
        /// URL of the page to extract
        url: String,

        /// Print the full article as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Never escalate to the browser tier
        #[arg(long)]
        static_only: bool,
    },
    /// Unwrap an aggregator-obfuscated URL without extracting
    Resolve {
        /// Aggregator URL to unwrap
        url: String,

        /// Only attempt local token decoding, no network probe
        #[arg(long)]
        offline: bool,
    },
    /// Print the config file path
    ConfigPath,
}
