//! Correlation reference attached to engine uploads.
//!
//! At submission time every result hook carries an opaque reference string.
//! The engine echoes it back unchanged on the upload-finalized notification
//! of every artifact written under that hook's output volume, which lets the
//! correlator route the artifact back to where it belongs.
//!
//! Uploads unrelated to timelapse processing carry no reference or some
//! other shape; those decode to [`Correlation::Unrecognized`] and are
//! skipped without error.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Decoded correlation reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum Correlation {
    /// One of an ordered set of ranked input images.
    #[serde(rename = "sequence", rename_all = "camelCase")]
    Sequence { sequence_index: u64 },

    /// An output of a job, appended to `output_items[result_stream]` on the
    /// target folder.
    #[serde(rename = "stream-append", rename_all = "camelCase")]
    StreamAppend {
        target_id: DbId,
        result_stream: String,
    },

    /// Absent, malformed, or of an unknown shape.
    #[serde(other, skip_serializing)]
    Unrecognized,
}

impl Correlation {
    /// Reference for a job output stream.
    pub fn stream_append(target_id: DbId, result_stream: impl Into<String>) -> Self {
        Self::StreamAppend {
            target_id,
            result_stream: result_stream.into(),
        }
    }

    /// Reference for a ranked input at `sequence_index`.
    pub fn sequence(sequence_index: u64) -> Self {
        Self::Sequence { sequence_index }
    }

    /// Eagerly decode a raw reference string. Never fails.
    pub fn decode(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Unrecognized;
        };
        match serde_json::from_str::<Self>(raw) {
            Ok(Self::StreamAppend { result_stream, .. }) if result_stream.is_empty() => {
                Self::Unrecognized
            }
            Ok(decoded) => decoded,
            Err(_) => Self::Unrecognized,
        }
    }

    /// Serialize to the opaque string handed to the engine.
    ///
    /// Returns `None` for [`Correlation::Unrecognized`], which has no wire form.
    pub fn encode(&self) -> Option<String> {
        match self {
            Self::Unrecognized => None,
            other => serde_json::to_string(other).ok(),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized)
    }
}
