use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memberpay::api;
use memberpay::config::Config;
use memberpay::context::AppContext;
use memberpay::db::init_database;
use memberpay::processor::ProcessorClient;
use memberpay::worker::RolloverWorker;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,memberpay=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    info!("Initialized configuration");

    // Initialize database
    let db = Arc::new(init_database(&config.database).await?);
    info!("Connected to database");

    // Payment processor client
    let processor = Arc::new(ProcessorClient::new(config.processor.clone()));

    let ctx = AppContext::new(db.clone(), processor, config);

    // Start the monthly rollover scheduler
    let worker = RolloverWorker::new(db);
    let worker_handle = tokio::spawn(async move {
        if let Err(e) = worker.run().await {
            error!("Rollover worker error: {}", e);
        }
    });

    // Start API server
    let api_handle = tokio::spawn(async move {
        if let Err(e) = api::start_api_server(ctx).await {
            error!("API server error: {}", e);
        }
    });

    // Handle shutdown signals
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, initiating graceful shutdown"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }

    worker_handle.abort();
    api_handle.abort();

    info!("Memberpay shutdown complete");
    Ok(())
}
