//! Error types for hnsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from core ledger and content operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load — includes file path and line context.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Front matter block is not valid YAML.
    #[error("invalid front matter: {source}")]
    FrontMatter {
        #[source]
        source: serde_yaml::Error,
    },

    /// No directory containing `hashnode.sum` or `.hashnode/` above `start`.
    #[error("no hnsync project found above {start} (run `hnsync init`)")]
    ProjectNotFound { start: PathBuf },

    /// The path resolves outside the project root.
    #[error("path is outside the repository: {path}")]
    OutsideRepo { path: PathBuf },

    /// The ledger's publication identity does not match `publication.yml`.
    #[error("ledger publication id ({ledger}) does not match configured publication ({configured})")]
    WrongPublication { ledger: String, configured: String },

    /// The publication metadata file is missing or incomplete.
    #[error("publication metadata not found at {path}; run `hnsync init`")]
    PublicationNotFound { path: PathBuf },
}

/// Convenience constructor for [`CoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
