//! Common error type and result alias.
//!
//! Every failure inside the evaluation pipeline is classified into one of
//! these kinds before it reaches a caller; transport errors never leak out raw.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Dify API key is not configured")]
    Configuration,

    #[error("Failed to read image '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload failed. Status: {status}, Body: {body}")]
    Upload { status: u16, body: String },

    #[error("Workflow request failed. Status: {status}, Body: {body}")]
    Workflow { status: u16, body: String },

    #[error("{0}")]
    Unexpected(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Wrap any other failure with a short description of what was being attempted.
    pub fn unexpected(context: &str, err: impl std::fmt::Display) -> Self {
        AppError::Unexpected(format!("{}: {}", context, err))
    }

    /// Upstream HTTP status, for upload and workflow failures.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AppError::Upload { status, .. } | AppError::Workflow { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Configuration => "configuration_error",
            AppError::Read { .. } => "read_error",
            AppError::Upload { .. } => "upload_error",
            AppError::Workflow { .. } => "workflow_error",
            AppError::Unexpected(_) => "unexpected_error",
        }
    }
}
