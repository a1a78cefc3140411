//! Wiring for the `lapse-worker` binary.

pub mod config;

use std::sync::Arc;

use lapse_db::{FolderStore, ItemStore, MemoryStore, PgStore};
use lapse_engine::EngineApi;
use lapse_events::EventBus;
use lapse_pipeline::{JobSubmitter, TimelapseLibrary};

pub use config::{ConfigError, WorkerConfig};

/// The repositories every pipeline component is built from.
#[derive(Clone)]
pub struct Stores {
    pub folders: Arc<dyn FolderStore>,
    pub items: Arc<dyn ItemStore>,
}

impl Stores {
    /// Postgres when `DATABASE_URL` is set (migrations applied), otherwise
    /// a process-local in-memory store.
    pub async fn open(config: &WorkerConfig) -> anyhow::Result<Self> {
        let Some(database_url) = &config.database_url else {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            let store = Arc::new(MemoryStore::new());
            return Ok(Self {
                folders: store.clone(),
                items: store,
            });
        };

        let pool = lapse_db::create_pool(database_url).await?;
        tracing::info!("Database connection pool created");

        lapse_db::health_check(&pool).await?;
        tracing::info!("Database health check passed");

        lapse_db::run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");

        let store = Arc::new(PgStore::new(pool));
        Ok(Self {
            folders: store.clone(),
            items: store,
        })
    }
}

/// Caller-facing operations: job submission and timelapse bookkeeping.
///
/// The worker binary only runs the consumers and the listener; a front end
/// embedding this crate builds `Services` to drive submissions.
pub struct Services {
    pub submitter: Arc<JobSubmitter>,
    pub library: Arc<TimelapseLibrary>,
}

impl Services {
    pub fn build(config: &WorkerConfig, stores: &Stores, bus: Arc<EventBus>) -> Self {
        let engine = Arc::new(EngineApi::new(config.engine_api_url.clone()));
        Self {
            submitter: Arc::new(JobSubmitter::new(
                stores.folders.clone(),
                engine,
                config.submitter_config(),
            )),
            library: Arc::new(TimelapseLibrary::new(
                stores.folders.clone(),
                stores.items.clone(),
                bus,
            )),
        }
    }
}
