use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use historia::api::start_records_server;
use historia::config::{self, AggregationLimits};
use historia::{RecordService, SqliteStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Historia starting v{}", config::APP_VERSION);

    let db_path = config::database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let store = SqliteStore::open(&db_path)?;
    tracing::info!(path = %db_path.display(), "database opened");

    let service = Arc::new(RecordService::from_store(&store, AggregationLimits::from_env()));

    let mut server = start_records_server(service, &config::bind_addr()).await?;
    tracing::info!(addr = %server.addr, "records API listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    server.shutdown();

    Ok(())
}
