//! # Journals API Main Entry Point
//!
//! `journals serve` (the default) migrates, seeds and serves; `migrate` and
//! `seed` run those steps on their own.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use journals::{
    config::{AppConfig, ConfigLoader},
    db, seeds,
    server::run_server,
    telemetry::init_tracing,
};

#[derive(Parser, Debug)]
#[command(name = "journals")]
#[command(about = "Multi-tenant academic journal platform API", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Apply migrations, seed defaults (unless disabled) and serve the API
    Serve,
    /// Apply pending database migrations
    Migrate,
    /// Seed default roles and email templates
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    init_tracing(&config).context("initializing telemetry")?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => db::run_migrations(&db).await,
        Command::Seed => seeds::seed_defaults(&db).await,
        Command::Serve => {
            prepare_database(&config, &db).await?;
            run_server(config, db).await
        }
    }
}

async fn prepare_database(config: &AppConfig, db: &sea_orm::DatabaseConnection) -> Result<()> {
    db::run_migrations(db).await?;
    if config.seed_defaults {
        seeds::seed_defaults(db).await?;
    }
    Ok(())
}
