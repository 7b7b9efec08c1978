use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("Please select at least one file to summarize.")]
    EmptySelection,

    #[error("A summarization run is already in progress")]
    RunInProgress,

    #[error("Failed to upload {file}: {reason}")]
    Upload { file: String, reason: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(String),
}
