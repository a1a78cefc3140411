//! Timelapse and study bookkeeping around the job pipeline.
//!
//! Creates the folder layout a timelapse run expects, manages the example
//! gallery flag, and owns series items under studies. Creating or removing
//! an item publishes an [`ItemEvent`] so the reference counter can follow.

use std::sync::Arc;

use chrono::Utc;
use lapse_core::naming::{default_timelapse_name, INPUT_FOLDER_NAME};
use lapse_core::types::DbId;
use lapse_db::models::{CreateFolder, CreateItem, Folder, Item};
use lapse_db::{FolderStore, ItemStore};
use lapse_events::{EventBus, ItemEvent, ItemLifecycle};
use serde::Deserialize;
use validator::Validate;

use crate::error::PipelineError;

/// Input for [`TimelapseLibrary::create_study`].
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStudy {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
}

/// Input for [`TimelapseLibrary::create_series`].
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSeries {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

pub struct TimelapseLibrary {
    folders: Arc<dyn FolderStore>,
    items: Arc<dyn ItemStore>,
    bus: Arc<EventBus>,
}

impl TimelapseLibrary {
    pub fn new(folders: Arc<dyn FolderStore>, items: Arc<dyn ItemStore>, bus: Arc<EventBus>) -> Self {
        Self {
            folders,
            items,
            bus,
        }
    }

    /// Create a timelapse folder with its `_input` child and return the
    /// input folder, which is where ranked images get uploaded.
    pub async fn create_timelapse(
        &self,
        owner_id: DbId,
        name: Option<String>,
    ) -> Result<Folder, PipelineError> {
        let name = match name.map(|n| n.trim().to_string()) {
            Some(n) if !n.is_empty() => n,
            _ => default_timelapse_name(Utc::now()),
        };

        let timelapse = self
            .folders
            .create(&CreateFolder {
                is_timelapse: true,
                ..CreateFolder::new(owner_id, name)
            })
            .await?;
        let input = self.folders.ensure_child(&timelapse, INPUT_FOLDER_NAME).await?;
        self.folders.set_input_folder(timelapse.id, input.id).await?;

        tracing::info!(
            timelapse_id = %timelapse.id,
            input_folder_id = %input.id,
            %owner_id,
            "Timelapse created",
        );
        Ok(input)
    }

    pub async fn list_timelapses(&self, owner_id: DbId) -> Result<Vec<Folder>, PipelineError> {
        Ok(self.folders.list_timelapses(owner_id).await?)
    }

    /// Flag or unflag `folder_id` as the example gallery.
    pub async fn set_example_folder(
        &self,
        folder_id: DbId,
        enabled: bool,
    ) -> Result<(), PipelineError> {
        if !self.folders.set_example_flag(folder_id, enabled).await? {
            return Err(PipelineError::NotFound {
                entity: "folder",
                id: folder_id,
            });
        }
        tracing::info!(%folder_id, enabled, "Example folder flag set");
        Ok(())
    }

    /// Items of the example folder, or nothing when none is flagged.
    pub async fn list_examples(&self) -> Result<Vec<Item>, PipelineError> {
        match self.folders.find_example_folder().await? {
            Some(folder) => Ok(self.items.list_in_folder(folder.id).await?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn create_study(
        &self,
        owner_id: DbId,
        input: CreateStudy,
    ) -> Result<Folder, PipelineError> {
        input.validate()?;

        let study = self
            .folders
            .create(&CreateFolder {
                description: input.description,
                is_study: true,
                ..CreateFolder::new(owner_id, input.name)
            })
            .await?;

        tracing::info!(study_id = %study.id, %owner_id, "Study created");
        Ok(study)
    }

    /// Add a series item to a study.
    pub async fn create_series(
        &self,
        study_id: DbId,
        input: CreateSeries,
    ) -> Result<Item, PipelineError> {
        input.validate()?;

        let study = self
            .folders
            .find_by_id(study_id)
            .await?
            .ok_or(PipelineError::NotFound {
                entity: "study",
                id: study_id,
            })?;
        if !study.is_study {
            return Err(PipelineError::Validation(format!(
                "Folder {study_id} is not a study"
            )));
        }

        let item = self
            .items
            .create(&CreateItem {
                folder_id: study.id,
                name: input.name,
                is_series: true,
            })
            .await?;

        self.bus.publish(ItemEvent::Created(lifecycle(&item)));
        tracing::info!(item_id = %item.id, %study_id, "Series created");
        Ok(item)
    }

    /// Delete an item. Returns the removed item, or `None` if it was
    /// already gone, in which case no event is published.
    pub async fn remove_item(&self, item_id: DbId) -> Result<Option<Item>, PipelineError> {
        let removed = self.items.remove(item_id).await?;
        if let Some(item) = &removed {
            self.bus.publish(ItemEvent::Removed(lifecycle(item)));
            tracing::info!(%item_id, folder_id = %item.folder_id, "Item removed");
        }
        Ok(removed)
    }
}

fn lifecycle(item: &Item) -> ItemLifecycle {
    ItemLifecycle {
        item_id: item.id,
        folder_id: item.folder_id,
        is_series: item.is_series,
    }
}
