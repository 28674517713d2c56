//! Error types for rollout-git

use std::path::PathBuf;

/// Result type for rollout-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in rollout-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Ref '{git_ref}' not found (looked for {remote}/{git_ref}, a tag, or a commit)")]
    RefNotFound { git_ref: String, remote: String },

    #[error("Fetch from remote '{remote}' failed: {message}")]
    FetchFailed { remote: String, message: String },

    #[error("Clone of branch '{branch}' into {dest} failed: {message}")]
    CloneFailed {
        branch: String,
        dest: PathBuf,
        message: String,
    },

    #[error("Path is not valid UTF-8 and cannot be used as a clone source: {path}")]
    InvalidPath { path: PathBuf },
}
