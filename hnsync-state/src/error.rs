//! Error types for hnsync-state.

use std::path::PathBuf;

use thiserror::Error;

use hnsync_core::CoreError;

/// All errors that can arise from snapshot, stage and lock operations.
#[derive(Debug, Error)]
pub enum StateError {
    /// An error from core path or ledger handling.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Underlying I/O failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (stage save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load — includes file path context.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A referenced snapshot file does not exist.
    #[error("snapshot not found: {filename}")]
    SnapshotNotFound { filename: String },

    /// Snapshot content does not hash to its filename. Never auto-repaired.
    #[error("snapshot integrity violation in {filename}: content hashes to {actual}")]
    IntegrityViolation { filename: String, actual: String },

    /// Staging a path inside the state directory is forbidden.
    #[error("refusing to stage path inside the state directory: {path}")]
    ProtectedPath { path: PathBuf },

    /// Another apply holds the project lock.
    #[error("project is locked by another process ({path}); remove the file if the owner is gone")]
    AlreadyLocked { path: PathBuf },
}

/// Convenience constructor for [`StateError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StateError {
    StateError::Io {
        path: path.into(),
        source,
    }
}
