//! Keeps `child_count` on a study in step with its series.

use std::sync::Arc;

use lapse_db::FolderStore;
use lapse_events::ItemEvent;

use crate::error::PipelineError;

/// Consumer of [`ItemEvent`]s.
///
/// Each creation of a series item adds one to its folder's count and each
/// removal subtracts one, as a single increment in the store. Removals are
/// not deduplicated, so a replayed removal can drive the count below zero.
pub struct ReferenceCounter {
    folders: Arc<dyn FolderStore>,
}

impl ReferenceCounter {
    pub fn new(folders: Arc<dyn FolderStore>) -> Self {
        Self { folders }
    }

    /// Returns whether a count was adjusted.
    pub async fn handle(&self, event: &ItemEvent) -> Result<bool, PipelineError> {
        let (item, delta) = match event {
            ItemEvent::Created(item) => (item, 1),
            ItemEvent::Removed(item) => (item, -1),
        };
        if !item.is_series {
            return Ok(false);
        }

        let applied = self.folders.adjust_child_count(item.folder_id, delta).await?;
        tracing::debug!(
            item_id = %item.item_id,
            folder_id = %item.folder_id,
            delta,
            applied,
            "Series count adjusted",
        );
        Ok(applied)
    }
}
