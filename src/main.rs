use std::sync::Arc;

use anyhow::Context;
use record_store::config::Config;
use record_store::{DatabaseDriver, MySqlDriver, RecordStore, StoreConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.app.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Environment: {}", config.app.env);

    // Tables named on the command line are bound with default settings.
    let mut bindings = config.load_stores()?;
    bindings.extend(std::env::args().skip(1).map(StoreConfig::new));
    if bindings.is_empty() {
        anyhow::bail!("No tables to inspect: set RECORD_STORES_FILE or pass table names");
    }

    let pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;
    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.max_connections
    );

    let driver: Arc<dyn DatabaseDriver> = Arc::new(MySqlDriver::new(pool));
    for binding in bindings {
        let store = RecordStore::new(driver.clone(), binding)?;
        let fields = store.fields().await?;
        let count = store.count().await?;

        tracing::info!(table = %store.table(), fields = fields.len(), count, "Inspected table");
        println!("{}\t{} rows\t{}", store.table(), count, fields.join(", "));
    }

    Ok(())
}
