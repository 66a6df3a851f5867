use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod ingest;
mod reconcile;
mod report;

#[derive(Debug, Parser)]
#[command(name = "chanrec")]
#[command(about = "Multi-channel order resolution and inventory reconciliation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run pending database migrations
    Migrate,
    /// Seed canonical products and identifier mappings from the mappings file
    Seed,
    /// Ingest raw order line items from a JSON-lines file
    Ingest {
        /// Path to a file with one JSON order line item per line
        file: PathBuf,
    },
    /// Resolve line items, apply stock deltas, and recompute daily aggregates
    Reconcile {
        /// First observation date to include (UTC, inclusive)
        #[arg(long)]
        from: NaiveDate,

        /// First observation date to exclude (UTC)
        #[arg(long)]
        to: NaiveDate,

        /// Resolve and report without writing stock or aggregate changes
        #[arg(long)]
        dry_run: bool,
    },
    /// Print daily aggregates for a date range and recent reconcile runs
    Report {
        /// First date to include (inclusive)
        #[arg(long)]
        from: NaiveDate,

        /// First date to exclude
        #[arg(long)]
        to: NaiveDate,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = chanrec_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let pool_config = chanrec_db::PoolConfig::from_app_config(&config);
    let pool = chanrec_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Migrate => {
            let applied = chanrec_db::run_migrations(&pool).await?;
            println!("applied {applied} migrations");
        }
        Commands::Seed => {
            let file = chanrec_core::MappingsFile::load(&config.mappings_path)?;
            let count = chanrec_db::seed_catalog(&pool, &file).await?;
            println!(
                "seeded {count} rows ({} products, {} mappings) from {}",
                file.products.len(),
                file.mappings.len(),
                config.mappings_path.display()
            );
        }
        Commands::Ingest { file } => ingest::run_ingest(&pool, &file).await?,
        Commands::Reconcile { from, to, dry_run } => {
            reconcile::run_reconcile(&pool, &config, from, to, dry_run).await?;
        }
        Commands::Report { from, to } => report::run_report(&pool, from, to).await?,
    }

    Ok(())
}

/// Mark a run failed, logging rather than propagating if even that fails.
async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = chanrec_db::fail_reconcile_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark reconcile run as failed"
        );
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
