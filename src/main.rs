//! # Order Sync Service Main Entry Point
//!
//! Wires the configuration, database pool, background worker, scheduler,
//! and HTTP server together.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use migration::{Migrator, MigratorTrait};
use ordersync::{
    config::ConfigLoader,
    db,
    repositories::InMemorySyncStatusStore,
    scheduler::SyncScheduler,
    server::{AppState, run_server},
    storefront::RestStorefrontClient,
    sync::{JobQueue, SyncOrchestrator, SyncWorker},
    telemetry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::new().load()?;
    telemetry::init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = db::init_pool(&config).await?;
    Migrator::up(&db, None).await?;

    let db = Arc::new(db);
    let queue = Arc::new(JobQueue::new(db.clone(), config.backoff.clone()));
    let storefront = Arc::new(RestStorefrontClient::new(
        config.storefront_api_version.clone(),
    ));
    let status = Arc::new(InMemorySyncStatusStore::new());

    let orchestrator = Arc::new(SyncOrchestrator::new(
        db.clone(),
        queue.clone(),
        storefront,
        status.clone(),
        config.sync.clone(),
        config.scheduler.clone(),
    ));

    let shutdown = CancellationToken::new();

    let worker = Arc::new(SyncWorker::new(
        queue.clone(),
        orchestrator,
        config.worker.clone(),
    ));
    tokio::spawn(worker.run(shutdown.clone()));

    let scheduler = SyncScheduler::new(config.scheduler.clone(), queue.clone());
    tokio::spawn(scheduler.run(shutdown.clone()));

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                shutdown.cancel();
            }
        });
    }

    let state = AppState {
        db: db.as_ref().clone(),
        queue,
        status,
    };

    run_server(&config, state, shutdown).await
}
