//! REST API client for the execution engine.
//!
//! Wraps job submission over HTTP using [`reqwest`]. Submission only
//! queues the job; its progress arrives later over the notification
//! WebSocket (see [`crate::listener`]).

use async_trait::async_trait;
use lapse_core::types::DbId;
use lapse_core::JobStatus;
use serde::Deserialize;

use crate::container::ContainerJob;
use crate::engine::{EngineError, ExecutionEngine, JobHandle};

/// HTTP client for a single engine instance.
#[derive(Debug, Clone)]
pub struct EngineApi {
    client: reqwest::Client,
    api_url: String,
}

/// Response returned by the engine's `/jobs` endpoint after queuing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Engine-assigned job identifier.
    pub job_id: DbId,
    /// Initial status; engines that omit it are treated as `QUEUED`.
    #[serde(default)]
    pub status: Option<JobStatus>,
}

impl EngineApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://engine:8080`.
    pub fn new(api_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
        }
    }

    /// Queue a container job.
    ///
    /// Sends `POST /jobs` with the job description. Returns as soon as the
    /// engine has accepted the job.
    pub async fn submit_job(&self, job: &ContainerJob) -> Result<SubmitResponse, EngineError> {
        let response = self
            .client
            .post(format!("{}/jobs", self.api_url))
            .json(job)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, or turn it into an
    /// [`EngineError::Api`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, EngineError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(EngineError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, EngineError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ExecutionEngine for EngineApi {
    async fn submit(&self, job: &ContainerJob) -> Result<JobHandle, EngineError> {
        let response = self.submit_job(job).await?;

        tracing::info!(
            job_id = %response.job_id,
            target_id = %job.target_id,
            image = %job.image,
            "Job submitted to engine",
        );

        Ok(JobHandle {
            job_id: response.job_id,
            target_id: job.target_id,
            title: job.title.clone(),
            status: response.status.unwrap_or(JobStatus::Queued),
        })
    }
}
