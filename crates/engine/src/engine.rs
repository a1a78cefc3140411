//! The execution-engine seam.
//!
//! [`ExecutionEngine::submit`] is fire-and-forget: it resolves once the job
//! is queued and hands back a [`JobHandle`]. Everything after that (status
//! transitions, produced artifacts) arrives through the notification
//! channel, never through this call.

use async_trait::async_trait;
use lapse_core::types::DbId;
use lapse_core::JobStatus;
use serde::Serialize;

use crate::container::ContainerJob;

/// A queued job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobHandle {
    pub job_id: DbId,
    pub target_id: DbId,
    pub title: String,
    /// Status at the moment of submission.
    pub status: JobStatus,
}

/// Errors from submitting to the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The engine returned a non-2xx status code.
    #[error("Engine API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Something that runs container jobs.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn submit(&self, job: &ContainerJob) -> Result<JobHandle, EngineError>;
}
