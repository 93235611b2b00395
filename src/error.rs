use thiserror::Error;

pub type Result<T> = std::result::Result<T, BoardError>;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Issue not found: {0}")]
    IssueNotFound(String),

    #[error("Invalid issue ID: {0:?}")]
    InvalidIssueId(String),

    #[error("Invalid severity {0}: severity must be at least 1")]
    InvalidSeverity(u32),

    #[error("Invalid issue status: {0}")]
    InvalidStatus(String),

    #[error("Invalid issue priority: {0}")]
    InvalidPriority(String),

    #[error("You do not have permission to {action}")]
    PermissionDenied { action: String },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Other(String),
}
