use std::path::PathBuf;
use thiserror::Error;

/// The main error type for vocsort operations.
///
/// Every variant is fatal for the operation that raised it. Operations do
/// not roll back, so a tree touched by an aborted run should be re-indexed
/// before it is trusted again.
#[derive(Debug, Error)]
pub enum VocsortError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed annotation {path}: {message}")]
    MalformedAnnotation { path: PathBuf, message: String },

    #[error("Precondition violated: {message}")]
    PreconditionViolation { message: String },

    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    #[error("Failed to traverse {path}: {message}")]
    Traversal { path: PathBuf, message: String },

    #[error("Invalid sample parameters: {message}")]
    InvalidSampleParams { message: String },

    #[error("Invalid category key '{raw}': {message}")]
    InvalidCategoryKey { raw: String, message: String },

    #[error("Failed to serialize report as JSON: {source}")]
    ReportJson {
        #[source]
        source: serde_json::Error,
    },
}

impl VocsortError {
    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        VocsortError::PreconditionViolation {
            message: message.into(),
        }
    }
}
