use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use lapse_engine::{NotificationClient, NotificationListener};
use lapse_events::EventBus;
use lapse_pipeline::collaborators::{ExifDateExtractor, ImageThumbnailer};
use lapse_pipeline::{Consumers, ReferenceCounter, ResultCorrelator, StatusPropagator};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lapse_worker::{Stores, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = WorkerConfig::from_env().context("Invalid worker configuration")?;
    init_tracing(config.json_logs);
    tracing::info!(
        engine_api_url = %config.engine_api_url,
        engine_ws_url = %config.engine_ws_url,
        image = %config.container_image,
        "Loaded worker configuration",
    );

    // --- Stores ---
    let stores = Stores::open(&config).await?;

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::new(config.event_bus_capacity));
    let cancel = CancellationToken::new();

    // --- Pipeline consumers ---
    let correlator = ResultCorrelator::new(
        stores.folders.clone(),
        stores.items.clone(),
        Arc::new(ImageThumbnailer::new(config.thumbnail_size)),
        Arc::new(ExifDateExtractor),
        config.assetstore_root.clone(),
    );
    let consumer_handles = Consumers {
        correlator: Arc::new(correlator),
        status: Arc::new(StatusPropagator::new(stores.folders.clone())),
        counter: Arc::new(ReferenceCounter::new(stores.folders.clone())),
    }
    .spawn(&event_bus, &cancel);
    tracing::info!("Pipeline consumers started");

    // --- Engine notifications ---
    let listener = NotificationListener::new(
        NotificationClient::new(config.engine_ws_url.clone()),
        Arc::clone(&event_bus),
    );
    let listener_handle = listener.spawn(cancel.child_token());
    tracing::info!("Worker ready");

    shutdown_signal().await;

    // --- Shutdown ---
    tracing::info!("Shutting down worker");
    cancel.cancel();

    // Consumers finish the event they are applying before their handles
    // resolve.
    let _ = tokio::time::timeout(Duration::from_secs(5), listener_handle).await;
    for handle in consumer_handles {
        if tokio::time::timeout(Duration::from_secs(10), handle).await.is_err() {
            tracing::warn!("Consumer did not stop within 10s");
        }
    }
    drop(event_bus);

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lapse_worker=debug,lapse_pipeline=debug,lapse_engine=info".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
