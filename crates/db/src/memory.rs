//! In-process store backed by hash maps.
//!
//! Each operation takes the table's write lock for its whole duration, so
//! every mutation is atomic with respect to concurrent callers. Used by the
//! worker when no database is configured and throughout the tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use lapse_core::naming::ordinal_prefix;
use lapse_core::types::{new_id, DbId};
use lapse_core::JobStatus;
use tokio::sync::RwLock;

use crate::models::{CreateFolder, CreateItem, Folder, Item, OutputItem, SubmissionRecord};
use crate::store::{FolderStore, ItemStore, StoreResult};

/// Hash-map backed implementation of [`FolderStore`] and [`ItemStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    folders: RwLock<HashMap<DbId, Folder>>,
    items: RwLock<HashMap<DbId, Item>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete a folder outright. Test helper for "target was deleted" cases.
    pub async fn delete_folder(&self, id: DbId) -> bool {
        self.folders.write().await.remove(&id).is_some()
    }

    pub async fn folder_count(&self) -> usize {
        self.folders.read().await.len()
    }

    /// Apply `f` to the folder under the write lock; `false` if absent.
    async fn mutate_folder(&self, id: DbId, f: impl FnOnce(&mut Folder)) -> bool {
        match self.folders.write().await.get_mut(&id) {
            Some(folder) => {
                f(folder);
                true
            }
            None => false,
        }
    }
}

fn build_folder(input: &CreateFolder) -> Folder {
    Folder {
        id: new_id(),
        name: input.name.clone(),
        parent_id: input.parent_id,
        owner_id: input.owner_id,
        description: input.description.clone(),
        is_timelapse: input.is_timelapse,
        is_study: input.is_study,
        is_example_folder: false,
        input_folder_id: None,
        output_folder_id: None,
        job_id: None,
        job_status: None,
        mask_rect: None,
        output_items: Default::default(),
        child_count: 0,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl FolderStore for MemoryStore {
    async fn create(&self, input: &CreateFolder) -> StoreResult<Folder> {
        let folder = build_folder(input);
        self.folders.write().await.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<Folder>> {
        Ok(self.folders.read().await.get(&id).cloned())
    }

    async fn ensure_child(&self, parent: &Folder, name: &str) -> StoreResult<Folder> {
        let mut folders = self.folders.write().await;
        if let Some(existing) = folders
            .values()
            .find(|f| f.parent_id == Some(parent.id) && f.name == name)
        {
            return Ok(existing.clone());
        }
        let folder = build_folder(&CreateFolder::new(parent.owner_id, name).under(parent.id));
        folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn set_input_folder(&self, id: DbId, input_folder_id: DbId) -> StoreResult<bool> {
        Ok(self
            .mutate_folder(id, |f| f.input_folder_id = Some(input_folder_id))
            .await)
    }

    async fn record_submission(&self, id: DbId, record: &SubmissionRecord) -> StoreResult<bool> {
        Ok(self
            .mutate_folder(id, |f| {
                f.job_id = Some(record.job_id);
                f.job_status = Some(JobStatus::Queued);
                f.mask_rect = Some(record.mask_rect);
                f.output_folder_id = Some(record.output_folder_id);
                f.output_items = record.initial_output_items();
            })
            .await)
    }

    async fn append_output_item(
        &self,
        id: DbId,
        stream: &str,
        item: &OutputItem,
    ) -> StoreResult<bool> {
        Ok(self
            .mutate_folder(id, |f| {
                f.output_items
                    .entry(stream.to_string())
                    .or_default()
                    .push(item.clone());
            })
            .await)
    }

    async fn set_job_status(&self, id: DbId, status: JobStatus) -> StoreResult<bool> {
        Ok(self.mutate_folder(id, |f| f.job_status = Some(status)).await)
    }

    async fn adjust_child_count(&self, id: DbId, delta: i64) -> StoreResult<bool> {
        Ok(self.mutate_folder(id, |f| f.child_count += delta).await)
    }

    async fn set_example_flag(&self, id: DbId, enabled: bool) -> StoreResult<bool> {
        Ok(self
            .mutate_folder(id, |f| f.is_example_folder = enabled)
            .await)
    }

    async fn find_example_folder(&self) -> StoreResult<Option<Folder>> {
        Ok(self
            .folders
            .read()
            .await
            .values()
            .filter(|f| f.is_example_folder)
            .min_by_key(|f| f.created_at)
            .cloned())
    }

    async fn list_timelapses(&self, owner_id: DbId) -> StoreResult<Vec<Folder>> {
        let mut out: Vec<Folder> = self
            .folders
            .read()
            .await
            .values()
            .filter(|f| f.is_timelapse && f.owner_id == owner_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn create(&self, input: &CreateItem) -> StoreResult<Item> {
        let item = Item {
            id: new_id(),
            folder_id: input.folder_id,
            name: input.name.clone(),
            original_name: None,
            taken_at: None,
            is_series: input.is_series,
            created_at: Utc::now(),
        };
        self.items.write().await.insert(item.id, item.clone());
        Ok(item)
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<Item>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn apply_ordinal(
        &self,
        id: DbId,
        index: u64,
        taken_at: Option<NaiveDateTime>,
    ) -> StoreResult<Option<Item>> {
        let mut items = self.items.write().await;
        let Some(item) = items.get_mut(&id) else {
            return Ok(None);
        };
        let original = item.original_name.clone().unwrap_or_else(|| item.name.clone());
        item.name = format!("{}{original}", ordinal_prefix(index));
        item.original_name = Some(original);
        if taken_at.is_some() {
            item.taken_at = taken_at;
        }
        Ok(Some(item.clone()))
    }

    async fn remove(&self, id: DbId) -> StoreResult<Option<Item>> {
        Ok(self.items.write().await.remove(&id))
    }

    async fn list_in_folder(&self, folder_id: DbId) -> StoreResult<Vec<Item>> {
        let mut out: Vec<Item> = self
            .items
            .read()
            .await
            .values()
            .filter(|i| i.folder_id == folder_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}
