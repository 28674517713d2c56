//! Error types for rollout-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from rollout-core
    #[error(transparent)]
    Core(#[from] rollout_core::Error),

    /// Error from rollout-fs
    #[error(transparent)]
    Fs(#[from] rollout_fs::Error),

    /// JSON output could not be produced
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
