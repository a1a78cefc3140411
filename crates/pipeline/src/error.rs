use lapse_core::types::DbId;
use lapse_core::CoreError;
use lapse_db::StoreError;
use lapse_engine::EngineError;

/// Errors surfaced by the pipeline components.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Caller-supplied parameters were rejected before any side effect.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// The engine was unreachable or refused the job.
    #[error("Job submission failed: {0}")]
    Submission(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CoreError> for PipelineError {
    fn from(err: CoreError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for PipelineError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
