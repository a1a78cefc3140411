//! Event payloads carried on the bus.
//!
//! [`PlatformEvent`] is a closed, tagged union: each consumer subscribes to
//! exactly one payload kind through [`EventKind`] instead of matching on
//! string event names.

use std::path::PathBuf;

use chrono::Utc;
use lapse_core::types::{DbId, Timestamp};
use lapse_core::JobStatus;
use serde::{Deserialize, Serialize};

/// An artifact finished uploading into the assetstore.
///
/// Emitted for every upload, timelapse-related or not; `reference` is the
/// raw correlation string echoed by the engine, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFinalized {
    pub file_id: DbId,
    /// Item that owns the uploaded file.
    pub item_id: DbId,
    pub name: String,
    /// Location of the file contents, when stored on local disk.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub reference: Option<String>,
}

/// A job changed status inside the execution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdated {
    pub job_id: DbId,
    #[serde(default, rename = "targetEntityId")]
    pub target_id: Option<DbId>,
    #[serde(default)]
    pub status: Option<JobStatus>,
}

/// Identity of an item that was created or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemLifecycle {
    pub item_id: DbId,
    pub folder_id: DbId,
    pub is_series: bool,
}

/// Item lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transition", content = "item", rename_all = "snake_case")]
pub enum ItemEvent {
    Created(ItemLifecycle),
    Removed(ItemLifecycle),
}

/// Payload of a [`PlatformEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum EventPayload {
    Upload(UploadFinalized),
    Job(JobUpdated),
    Item(ItemEvent),
}

/// A domain event with its publication time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformEvent {
    pub payload: EventPayload,
    /// When the event was published (UTC).
    pub timestamp: Timestamp,
}

impl PlatformEvent {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            payload,
            timestamp: Utc::now(),
        }
    }
}

impl From<UploadFinalized> for PlatformEvent {
    fn from(value: UploadFinalized) -> Self {
        Self::new(EventPayload::Upload(value))
    }
}

impl From<JobUpdated> for PlatformEvent {
    fn from(value: JobUpdated) -> Self {
        Self::new(EventPayload::Job(value))
    }
}

impl From<ItemEvent> for PlatformEvent {
    fn from(value: ItemEvent) -> Self {
        Self::new(EventPayload::Item(value))
    }
}

/// A payload kind that can be selected out of the event stream.
pub trait EventKind: Clone + Send + 'static {
    /// Short name used in logs.
    const NAME: &'static str;

    fn select(event: &PlatformEvent) -> Option<Self>;
}

impl EventKind for UploadFinalized {
    const NAME: &'static str = "upload";

    fn select(event: &PlatformEvent) -> Option<Self> {
        match &event.payload {
            EventPayload::Upload(e) => Some(e.clone()),
            _ => None,
        }
    }
}

impl EventKind for JobUpdated {
    const NAME: &'static str = "job";

    fn select(event: &PlatformEvent) -> Option<Self> {
        match &event.payload {
            EventPayload::Job(e) => Some(e.clone()),
            _ => None,
        }
    }
}

impl EventKind for ItemEvent {
    const NAME: &'static str = "item";

    fn select(event: &PlatformEvent) -> Option<Self> {
        match &event.payload {
            EventPayload::Item(e) => Some(e.clone()),
            _ => None,
        }
    }
}
