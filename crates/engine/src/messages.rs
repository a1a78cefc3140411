//! Engine notification message types and parser.
//!
//! The engine sends JSON messages over WebSocket with the shape
//! `{"type": "<kind>", "data": {...}}`. This module deserializes them
//! into a strongly-typed [`EngineMessage`] enum.

use lapse_events::{JobUpdated, UploadFinalized};
use serde::Deserialize;

/// All known engine notification types.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EngineMessage {
    /// A result hook finished uploading an artifact.
    #[serde(rename = "upload_finalized")]
    UploadFinalized(UploadFinalized),

    /// A job changed status.
    #[serde(rename = "job_status")]
    JobStatus(JobUpdated),

    /// Keep-alive with the engine's queue depth.
    #[serde(rename = "heartbeat")]
    Heartbeat(HeartbeatData),
}

/// Payload for `heartbeat` messages.
#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatData {
    #[serde(default)]
    pub queue_remaining: i32,
}

/// Parse an engine WebSocket text message into a typed enum.
///
/// Returns `Err` for malformed JSON or unknown `type` values.
/// Callers should log unknown types and continue.
pub fn parse_message(text: &str) -> Result<EngineMessage, serde_json::Error> {
    serde_json::from_str(text)
}
