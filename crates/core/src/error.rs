/// Rejected domain values.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid maskRect: {0}")]
    InvalidMaskRect(String),

    #[error("Unknown job status '{0}'")]
    UnknownJobStatus(String),
}
