mod cli;
mod config;
mod error;
mod models;
mod services;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::EloConfig;

#[derive(Parser)]
#[command(name = "matchelo")]
#[command(about = "Pre-match ELO ratings and feature tables from historical match results")]
struct Cli {
    /// Seed rating for teams never seen before (overrides ELO_INITIAL_RATING)
    #[arg(long, global = true)]
    initial_rating: Option<f64>,

    /// Rating update sensitivity (overrides ELO_K_FACTOR)
    #[arg(short, long, global = true)]
    k_factor: Option<f64>,

    /// Fail on malformed rows instead of dropping them
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rate every match and write the feature table
    Features {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, default_value = "csv")]
        format: String,
    },
    /// Show final ratings, strongest first
    Ratings {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        top: Option<usize>,
    },
    /// Show one team's rating trajectory
    Team {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        name: String,
        /// Also print the expected score against this opponent
        #[arg(short, long)]
        against: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables (RUST_LOG included)
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = EloConfig::from_env()?.with_overrides(cli.initial_rating, cli.k_factor)?;
    tracing::debug!("Using {:?}", config);

    match cli.command {
        Commands::Features { input, output, format } => {
            tracing::info!("Building features from {}", input.display());
            cli::build_features(&input, &output, &format, cli.strict, config).await?;
        }
        Commands::Ratings { input, top } => {
            tracing::info!("Computing ratings from {}", input.display());
            cli::show_ratings(&input, top, cli.strict, config).await?;
        }
        Commands::Team { input, name, against } => {
            tracing::info!("Querying team: {}", name);
            cli::query_team(&input, &name, against.as_deref(), cli.strict, config).await?;
        }
    }

    Ok(())
}
