//! Error types for hnsync-engine.

use thiserror::Error;

use hnsync_core::CoreError;
use hnsync_gateway::GatewayError;
use hnsync_state::StateError;

/// All errors that can arise from planning and applying.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Ledger, front matter or path handling failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Snapshot, stage or lock failure.
    #[error(transparent)]
    State(#[from] StateError),

    /// Remote gateway failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A create action has no usable title, or the title is too short.
    #[error("invalid input for {path}: {reason}")]
    InvalidInput { path: String, reason: String },

    /// On-disk content diverged from the staged snapshot.
    #[error("staged content changed for {path}; re-stage or rerun with --force")]
    StaleStaging { path: String },

    /// A destructive action was requested without the confirmation flag.
    #[error("confirmation required: deleting {path} removes the remote post; rerun with --yes")]
    ConfirmationRequired { path: String },

    /// The run was interrupted; remaining items were skipped and no state was
    /// committed.
    #[error("apply cancelled; remaining items were not executed and no state was committed")]
    Cancelled,
}
