//! Error types for rollout-core

use std::path::PathBuf;

/// Result type for rollout-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving an inventory or pinning playbooks.
///
/// Nothing is retried internally; every variant carries the names and paths
/// needed to diagnose the failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid environment, configuration, hosts file or manifest
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Playbook repository is not a working copy under the playbook path
    #[error("Repository {repository} not found in {playbook_path}")]
    RepositoryNotFound {
        repository: String,
        playbook_path: PathBuf,
    },

    /// Resolved playbook directory lacks the declared playbook file
    #[error("Playbook {repository}/{file} not found at {path}")]
    PlaybookFileNotFound {
        repository: String,
        file: String,
        path: PathBuf,
    },

    /// Fetch, pin or clone failed in a playbook repository
    #[error("Version control operation '{operation}' failed for repository {repository}: {source}")]
    VersionControl {
        repository: String,
        operation: &'static str,
        #[source]
        source: rollout_git::Error,
    },

    /// A variable source could not produce a mapping
    #[error("Variable source '{source_name}' failed for {scope} '{name}': {message}")]
    VariableSource {
        source_name: String,
        scope: &'static str,
        name: String,
        message: String,
    },

    /// Filesystem error from rollout-fs
    #[error(transparent)]
    Fs(#[from] rollout_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Classify a failure to load a configuration document.
    ///
    /// Unparseable or mistyped content is a configuration error naming the
    /// file; I/O failures stay [`Error::Fs`].
    pub fn config_document(err: rollout_fs::Error) -> Self {
        match err {
            rollout_fs::Error::Parse { .. } | rollout_fs::Error::UnsupportedFormat { .. } => {
                Self::config(err.to_string())
            }
            other => Self::Fs(other),
        }
    }
}
