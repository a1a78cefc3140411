//! Repository interfaces consumed by the pipeline.
//!
//! Every mutating method is a single targeted operation scoped by entity
//! id: a field set, an additive append, or an increment. Implementations
//! must apply each one atomically with respect to concurrent calls, and a
//! mutation whose target does not exist matches nothing and returns
//! `Ok(false)` rather than an error.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use lapse_core::types::DbId;
use lapse_core::JobStatus;

use crate::models::{CreateFolder, CreateItem, Folder, Item, OutputItem, SubmissionRecord};

/// Errors surfaced by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be decoded into its domain type.
    #[error("Corrupt {column} on {entity} {id}: {reason}")]
    Corrupt {
        entity: &'static str,
        column: &'static str,
        id: DbId,
        reason: String,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Folder persistence.
#[async_trait]
pub trait FolderStore: Send + Sync {
    async fn create(&self, input: &CreateFolder) -> StoreResult<Folder>;

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<Folder>>;

    /// Return the child of `parent` named `name`, creating it if absent.
    ///
    /// Safe to call repeatedly and concurrently: all callers observe the
    /// same folder.
    async fn ensure_child(&self, parent: &Folder, name: &str) -> StoreResult<Folder>;

    /// Set `input_folder_id`.
    async fn set_input_folder(&self, id: DbId, input_folder_id: DbId) -> StoreResult<bool>;

    /// Write job id, `QUEUED` status, mask rect, output folder, and empty
    /// per-stream output lists.
    async fn record_submission(&self, id: DbId, record: &SubmissionRecord) -> StoreResult<bool>;

    /// Append `item` to `output_items[stream]`, creating the list if needed.
    async fn append_output_item(
        &self,
        id: DbId,
        stream: &str,
        item: &OutputItem,
    ) -> StoreResult<bool>;

    /// Assign `job_status`, leaving every other field alone.
    async fn set_job_status(&self, id: DbId, status: JobStatus) -> StoreResult<bool>;

    /// Add `delta` to `child_count`.
    async fn adjust_child_count(&self, id: DbId, delta: i64) -> StoreResult<bool>;

    async fn set_example_flag(&self, id: DbId, enabled: bool) -> StoreResult<bool>;

    async fn find_example_folder(&self) -> StoreResult<Option<Folder>>;

    /// Timelapse folders owned by `owner_id`, newest first.
    async fn list_timelapses(&self, owner_id: DbId) -> StoreResult<Vec<Folder>>;
}

/// Item persistence.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn create(&self, input: &CreateItem) -> StoreResult<Item>;

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<Item>>;

    /// Prefix the item's name with its ordinal and keep the unprefixed name
    /// in `original_name`.
    ///
    /// The prefix is always applied to the original name, so replaying the
    /// same rename is idempotent. `taken_at` only overwrites when `Some`.
    /// Returns the updated item, or `None` if it no longer exists.
    async fn apply_ordinal(
        &self,
        id: DbId,
        index: u64,
        taken_at: Option<NaiveDateTime>,
    ) -> StoreResult<Option<Item>>;

    /// Delete the item, returning it if it existed.
    async fn remove(&self, id: DbId) -> StoreResult<Option<Item>>;

    /// Items in a folder, ordered by name.
    async fn list_in_folder(&self, folder_id: DbId) -> StoreResult<Vec<Item>>;
}
