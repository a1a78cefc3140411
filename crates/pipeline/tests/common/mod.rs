#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use lapse_core::JobStatus;
use lapse_db::models::{CreateFolder, CreateItem, Folder, Item};
use lapse_db::{FolderStore, ItemStore, MemoryStore};
use lapse_engine::{ContainerJob, EngineError, ExecutionEngine, JobHandle};
use lapse_pipeline::collaborators::{TakenDateExtractor, ThumbnailError, ThumbnailService};
use lapse_pipeline::ResultCorrelator;

/// Engine double that records every job and can be told to refuse.
#[derive(Default)]
pub struct FakeEngine {
    pub jobs: Mutex<Vec<ContainerJob>>,
    pub fail: bool,
}

impl FakeEngine {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn submitted(&self) -> Vec<ContainerJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionEngine for FakeEngine {
    async fn submit(&self, job: &ContainerJob) -> Result<JobHandle, EngineError> {
        if self.fail {
            return Err(EngineError::Api {
                status: 503,
                body: "engine offline".into(),
            });
        }
        self.jobs.lock().unwrap().push(job.clone());
        Ok(JobHandle {
            job_id: uuid::Uuid::now_v7(),
            target_id: job.target_id,
            title: job.title.clone(),
            status: JobStatus::Queued,
        })
    }
}

/// Thumbnail double counting calls; optionally always fails.
#[derive(Default)]
pub struct FakeThumbnails {
    pub calls: AtomicUsize,
    pub fail: bool,
}

#[async_trait]
impl ThumbnailService for FakeThumbnails {
    async fn generate(&self, _item: &Item, source: &Path) -> Result<PathBuf, ThumbnailError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ThumbnailError::Task("renderer crashed".into()));
        }
        Ok(source.with_extension("preview.jpg"))
    }
}

/// Capture-time double returning a fixed value.
#[derive(Default)]
pub struct FixedDate(pub Option<NaiveDateTime>);

#[async_trait]
impl TakenDateExtractor for FixedDate {
    async fn taken_at(&self, _source: &Path) -> Option<NaiveDateTime> {
        self.0
    }
}

pub fn owner() -> uuid::Uuid {
    uuid::Uuid::now_v7()
}

/// A timelapse folder and its `_input` child.
pub async fn timelapse(store: &MemoryStore, name: &str) -> (Folder, Folder) {
    let target = FolderStore::create(
        store,
        &CreateFolder {
            is_timelapse: true,
            ..CreateFolder::new(owner(), name)
        },
    )
    .await
    .unwrap();
    let input = store.ensure_child(&target, "_input").await.unwrap();
    (target, input)
}

pub async fn item(store: &MemoryStore, folder_id: uuid::Uuid, name: &str) -> Item {
    ItemStore::create(
        store,
        &CreateItem {
            folder_id,
            name: name.into(),
            is_series: false,
        },
    )
    .await
    .unwrap()
}

pub async fn folder(store: &MemoryStore, id: uuid::Uuid) -> Option<Folder> {
    FolderStore::find_by_id(store, id).await.unwrap()
}

pub fn correlator(
    store: &Arc<MemoryStore>,
    thumbnails: Arc<FakeThumbnails>,
    dates: FixedDate,
) -> ResultCorrelator {
    ResultCorrelator::new(
        store.clone(),
        store.clone(),
        thumbnails,
        Arc::new(dates),
        "/assetstore",
    )
}
