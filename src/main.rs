#![allow(clippy::result_large_err)]

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use till_buddy::{
    config::{
        database::{create_connection, create_tables, get_database_url},
        settings::load_default_settings,
    },
    core::stats::table_counts,
    errors::Result,
    migration::{MigrationMode, Migrator, PhaseReport, WriteMode, replicate_products},
    source::{hygraph::HygraphClient, probe},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Records requested by `check` per entity
const PROBE_SAMPLE: u32 = 5;

#[derive(Parser, Debug)]
#[command(name = "till-buddy", version, about = "Till backend and content API migration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Copy products, sales and sold items from the content API into the database
    Migrate {
        /// Delete all sold items, sales and products before migrating
        #[arg(long, default_value_t = false)]
        fresh: bool,
        /// Override the page size from migrate.toml
        #[arg(long)]
        page_size: Option<u32>,
        /// Plain inserts; rows that already exist are reported as failures
        #[arg(long, default_value_t = false)]
        insert_only: bool,
    },
    /// Copy every product into a second content API project
    CopyProducts,
    /// Query a few records from the content API and count rows in the database
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();

    let cli = Cli::parse();
    let mut settings = load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {e}"))?
        .migration;

    match cli.command {
        Commands::Migrate {
            fresh,
            page_size,
            insert_only,
        } => {
            if let Some(page_size) = page_size {
                settings.page_size = page_size;
            }
            let source = HygraphClient::from_env("HYGRAPH")?;
            let db = connect().await?;

            let mode = if fresh {
                MigrationMode::Fresh
            } else {
                MigrationMode::Incremental
            };
            let write_mode = if insert_only {
                WriteMode::Insert
            } else {
                WriteMode::Upsert
            };

            let report = Migrator::new(&db, &source)
                .with_settings(settings)
                .with_mode(mode)
                .with_write_mode(write_mode)
                .run()
                .await
                .inspect_err(|e| error!("Migration aborted: {e}"))?;

            log_failures(&report.products);
            log_failures(&report.sales);
            for line in report.to_string().lines() {
                info!("{line}");
            }
        }
        Commands::CopyProducts => {
            let source = HygraphClient::from_env("HYGRAPH")?;
            let target = HygraphClient::from_env("HYGRAPH_TARGET")?;

            let report = replicate_products(&source, &target, &settings)
                .await
                .inspect_err(|e| error!("Product copy aborted: {e}"))?;

            log_failures(&report);
            info!("{report}");
        }
        Commands::Check => {
            let source = HygraphClient::from_env("HYGRAPH")?;
            let summary = probe(&source, PROBE_SAMPLE)
                .await
                .inspect_err(|e| error!("Content API check failed: {e}"))?;
            for product in &summary.products {
                info!(
                    "Product {}: {}",
                    product.id.as_deref().unwrap_or("?"),
                    product.name.as_deref().unwrap_or("?")
                );
            }

            let db = connect().await?;
            let counts = table_counts(&db).await?;
            info!("Database rows - {counts}");
        }
    }

    Ok(())
}

async fn connect() -> Result<sea_orm::DatabaseConnection> {
    // The default SQLite file lives under data/, which SQLite will not create.
    if get_database_url().starts_with("sqlite://data/") {
        std::fs::create_dir_all("data")?;
    }

    let db = create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    create_tables(&db).await?;
    info!("Database ready");
    Ok(db)
}

fn log_failures(report: &PhaseReport) {
    for failure in report.failures() {
        warn!("{} {}: {}", report.entity, failure.key, failure.outcome);
    }
}
