//! Routes finalized uploads back to the entity they belong to.
//!
//! Every upload on the platform passes through here. The echoed reference
//! is decoded once into a [`Correlation`]; anything unrecognized is
//! skipped without touching the store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lapse_core::types::DbId;
use lapse_core::Correlation;
use lapse_db::models::{Item, OutputItem};
use lapse_db::{FolderStore, ItemStore};
use lapse_events::UploadFinalized;

use crate::collaborators::{TakenDateExtractor, ThumbnailService};
use crate::error::PipelineError;

/// What a single upload resulted in.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrelationOutcome {
    /// No recognizable reference; nothing changed.
    Ignored,
    /// A ranked input was renamed with its ordinal.
    Renamed(Item),
    /// An output was appended to `output_items[stream]` on the target.
    Appended { target_id: DbId, stream: String },
    /// The referenced item or target no longer exists.
    Unmatched,
}

/// Consumer of [`UploadFinalized`] events.
pub struct ResultCorrelator {
    folders: Arc<dyn FolderStore>,
    items: Arc<dyn ItemStore>,
    thumbnails: Arc<dyn ThumbnailService>,
    dates: Arc<dyn TakenDateExtractor>,
    /// Base for relative upload paths.
    assetstore_root: PathBuf,
}

impl ResultCorrelator {
    pub fn new(
        folders: Arc<dyn FolderStore>,
        items: Arc<dyn ItemStore>,
        thumbnails: Arc<dyn ThumbnailService>,
        dates: Arc<dyn TakenDateExtractor>,
        assetstore_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            folders,
            items,
            thumbnails,
            dates,
            assetstore_root: assetstore_root.into(),
        }
    }

    pub async fn handle(
        &self,
        upload: &UploadFinalized,
    ) -> Result<CorrelationOutcome, PipelineError> {
        match Correlation::decode(upload.reference.as_deref()) {
            Correlation::Sequence { sequence_index } => {
                self.rename_ordinal(upload, sequence_index).await
            }
            Correlation::StreamAppend {
                target_id,
                result_stream,
            } => self.append_output(upload, target_id, result_stream).await,
            Correlation::Unrecognized => {
                tracing::trace!(file_id = %upload.file_id, "Upload carries no timelapse reference");
                Ok(CorrelationOutcome::Ignored)
            }
        }
    }

    async fn rename_ordinal(
        &self,
        upload: &UploadFinalized,
        index: u64,
    ) -> Result<CorrelationOutcome, PipelineError> {
        let source = upload.path.as_deref().map(|p| self.resolve(p));

        let taken_at = match &source {
            Some(path) => self.dates.taken_at(path).await,
            None => None,
        };

        let Some(item) = self.items.apply_ordinal(upload.item_id, index, taken_at).await? else {
            tracing::debug!(item_id = %upload.item_id, index, "Ranked input no longer exists");
            return Ok(CorrelationOutcome::Unmatched);
        };

        tracing::info!(
            item_id = %item.id,
            name = %item.name,
            has_taken_at = item.taken_at.is_some(),
            "Ranked input renamed",
        );

        match &source {
            Some(path) => {
                if let Err(e) = self.thumbnails.generate(&item, path).await {
                    tracing::warn!(
                        item_id = %item.id,
                        path = %path.display(),
                        error = %e,
                        "Preview generation failed",
                    );
                }
            }
            None => {
                tracing::debug!(item_id = %item.id, "Upload has no local path, skipping preview");
            }
        }

        Ok(CorrelationOutcome::Renamed(item))
    }

    async fn append_output(
        &self,
        upload: &UploadFinalized,
        target_id: DbId,
        stream: String,
    ) -> Result<CorrelationOutcome, PipelineError> {
        let entry = OutputItem {
            file_id: upload.file_id,
            name: upload.name.clone(),
        };

        if !self
            .folders
            .append_output_item(target_id, &stream, &entry)
            .await?
        {
            tracing::debug!(%target_id, stream = %stream, "Output target no longer exists");
            return Ok(CorrelationOutcome::Unmatched);
        }

        tracing::info!(
            %target_id,
            stream = %stream,
            file_id = %upload.file_id,
            "Output appended",
        );
        Ok(CorrelationOutcome::Appended { target_id, stream })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.assetstore_root.join(path)
    }
}
