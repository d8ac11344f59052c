use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

use catalog_sync::application::SyncService;
use catalog_sync::infrastructure::logging::init_logging_with_config;
use catalog_sync::infrastructure::{AppConfig, DatabaseConnection, HttpClient, SqliteCatalog};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Configuration file (TOML, YAML or JSON); environment variables are always read
    #[arg(long)]
    config: Option<String>,

    /// Write the planned changes to the target catalog
    #[arg(long, default_value_t = false)]
    apply: bool,

    /// Override sync.batch_size
    #[arg(long)]
    batch_size: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(batch_size) = args.batch_size {
        config.sync.batch_size = batch_size;
        config.validate().context("Invalid --batch-size")?;
    }

    init_logging_with_config(&config.logging)?;
    info!("Starting sync");

    let db = DatabaseConnection::new(&config.catalog.database_url).await?;
    db.migrate().await.context("Failed to migrate catalog database")?;
    let catalog = Arc::new(SqliteCatalog::new(db.pool().clone()));

    let transport = Arc::new(HttpClient::new(config.source.http_client())?);
    let service = SyncService::new(&config, transport, catalog)?;

    let report = service.run().await.context("Sync run failed")?;
    if report.is_partial() {
        warn!("Source fetch was cut short by a timeout; the plan covers partial data");
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    if args.apply {
        let summary = service
            .apply(&report.change_set)
            .await
            .context("Failed to apply change set")?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!("Dry run, pass --apply to write {} changes", report.update_count + report.insert_count);
    }

    Ok(())
}
