//! Mirrors engine job status onto the target folder.

use std::sync::Arc;

use lapse_db::FolderStore;
use lapse_events::JobUpdated;

use crate::error::PipelineError;

/// Consumer of [`JobUpdated`] events.
pub struct StatusPropagator {
    folders: Arc<dyn FolderStore>,
}

impl StatusPropagator {
    pub fn new(folders: Arc<dyn FolderStore>) -> Self {
        Self { folders }
    }

    /// Assign the reported status to the target.
    ///
    /// Returns `false` when the notification carries no status or target, or
    /// the target is gone. Notifications are applied as they arrive; the last
    /// one written wins.
    pub async fn handle(&self, update: &JobUpdated) -> Result<bool, PipelineError> {
        let (Some(target_id), Some(status)) = (update.target_id, update.status) else {
            tracing::trace!(job_id = %update.job_id, "Job notification without target or status");
            return Ok(false);
        };

        let applied = self.folders.set_job_status(target_id, status).await?;
        if applied {
            tracing::info!(job_id = %update.job_id, %target_id, %status, "Job status updated");
        } else {
            tracing::debug!(job_id = %update.job_id, %target_id, "Job target no longer exists");
        }
        Ok(applied)
    }
}
