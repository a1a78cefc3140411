//! Postgres repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. [`PgStore`] adapts them to the
//! [`FolderStore`](crate::store::FolderStore) and
//! [`ItemStore`](crate::store::ItemStore) interfaces.

pub mod folder_repo;
pub mod item_repo;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use lapse_core::types::DbId;
use lapse_core::JobStatus;
use sqlx::PgPool;

pub use folder_repo::FolderRepo;
pub use item_repo::ItemRepo;

use crate::models::{CreateFolder, CreateItem, Folder, Item, OutputItem, SubmissionRecord};
use crate::store::{FolderStore, ItemStore, StoreResult};

/// Postgres-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderStore for PgStore {
    async fn create(&self, input: &CreateFolder) -> StoreResult<Folder> {
        FolderRepo::create(&self.pool, input).await
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<Folder>> {
        FolderRepo::find_by_id(&self.pool, id).await
    }

    async fn ensure_child(&self, parent: &Folder, name: &str) -> StoreResult<Folder> {
        FolderRepo::ensure_child(&self.pool, parent, name).await
    }

    async fn set_input_folder(&self, id: DbId, input_folder_id: DbId) -> StoreResult<bool> {
        FolderRepo::set_input_folder(&self.pool, id, input_folder_id).await
    }

    async fn record_submission(&self, id: DbId, record: &SubmissionRecord) -> StoreResult<bool> {
        FolderRepo::record_submission(&self.pool, id, record).await
    }

    async fn append_output_item(
        &self,
        id: DbId,
        stream: &str,
        item: &OutputItem,
    ) -> StoreResult<bool> {
        FolderRepo::append_output_item(&self.pool, id, stream, item).await
    }

    async fn set_job_status(&self, id: DbId, status: JobStatus) -> StoreResult<bool> {
        FolderRepo::set_job_status(&self.pool, id, status).await
    }

    async fn adjust_child_count(&self, id: DbId, delta: i64) -> StoreResult<bool> {
        FolderRepo::adjust_child_count(&self.pool, id, delta).await
    }

    async fn set_example_flag(&self, id: DbId, enabled: bool) -> StoreResult<bool> {
        FolderRepo::set_example_flag(&self.pool, id, enabled).await
    }

    async fn find_example_folder(&self) -> StoreResult<Option<Folder>> {
        FolderRepo::find_example_folder(&self.pool).await
    }

    async fn list_timelapses(&self, owner_id: DbId) -> StoreResult<Vec<Folder>> {
        FolderRepo::list_timelapses(&self.pool, owner_id).await
    }
}

#[async_trait]
impl ItemStore for PgStore {
    async fn create(&self, input: &CreateItem) -> StoreResult<Item> {
        ItemRepo::create(&self.pool, input).await
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<Item>> {
        ItemRepo::find_by_id(&self.pool, id).await
    }

    async fn apply_ordinal(
        &self,
        id: DbId,
        index: u64,
        taken_at: Option<NaiveDateTime>,
    ) -> StoreResult<Option<Item>> {
        ItemRepo::apply_ordinal(&self.pool, id, index, taken_at).await
    }

    async fn remove(&self, id: DbId) -> StoreResult<Option<Item>> {
        ItemRepo::remove(&self.pool, id).await
    }

    async fn list_in_folder(&self, folder_id: DbId) -> StoreResult<Vec<Item>> {
        ItemRepo::list_in_folder(&self.pool, folder_id).await
    }
}
