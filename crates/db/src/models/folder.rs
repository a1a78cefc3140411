//! Folder entity and DTOs.
//!
//! A folder is the target entity of a timelapse run: it carries the job
//! id and status, the mask rectangle, and the per-stream output lists.
//! Studies reuse the same table with `child_count` tracking their series.

use std::collections::BTreeMap;

use lapse_core::types::{DbId, Timestamp};
use lapse_core::{JobStatus, MaskRect};
use serde::{Deserialize, Serialize};

/// One artifact appended to a result stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputItem {
    pub file_id: DbId,
    pub name: String,
}

/// Result stream name -> artifacts in arrival order.
pub type OutputItems = BTreeMap<String, Vec<OutputItem>>;

/// A row from the `folders` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Folder {
    pub id: DbId,
    pub name: String,
    pub parent_id: Option<DbId>,
    pub owner_id: DbId,
    pub description: Option<String>,
    pub is_timelapse: bool,
    pub is_study: bool,
    pub is_example_folder: bool,
    pub input_folder_id: Option<DbId>,
    pub output_folder_id: Option<DbId>,
    pub job_id: Option<DbId>,
    pub job_status: Option<JobStatus>,
    pub mask_rect: Option<MaskRect>,
    pub output_items: OutputItems,
    pub child_count: i64,
    pub created_at: Timestamp,
}

/// DTO for creating a folder.
#[derive(Debug, Clone)]
pub struct CreateFolder {
    pub name: String,
    pub parent_id: Option<DbId>,
    pub owner_id: DbId,
    pub description: Option<String>,
    pub is_timelapse: bool,
    pub is_study: bool,
}

impl CreateFolder {
    /// A plain top-level folder owned by `owner_id`.
    pub fn new(owner_id: DbId, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
            owner_id,
            description: None,
            is_timelapse: false,
            is_study: false,
        }
    }

    /// Place the folder under `parent_id`.
    pub fn under(mut self, parent_id: DbId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Fields written onto the target folder after a successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionRecord {
    pub job_id: DbId,
    pub mask_rect: MaskRect,
    pub output_folder_id: DbId,
    /// Declared result streams; each starts as an empty sequence.
    pub streams: Vec<String>,
}

impl SubmissionRecord {
    /// The `output_items` map this submission initialises.
    pub fn initial_output_items(&self) -> OutputItems {
        self.streams
            .iter()
            .map(|s| (s.clone(), Vec::new()))
            .collect()
    }
}
