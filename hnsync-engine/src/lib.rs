//! # hnsync-engine
//!
//! The reconciliation core: a pure diff engine that turns (ledger, stage,
//! working tree) into an ordered plan of typed actions, and a transactional
//! applier that executes the plan against the remote gateway, committing the
//! ledger atomically and clearing the stage only after every item succeeds.

pub mod apply;
pub mod diff_view;
pub mod error;
pub mod payload;
pub mod plan;

pub use apply::{apply, ApplyOptions, ApplyOutcome, ApplyReport, ExecutedAction};
pub use diff_view::{staged_diffs, StagedDiff};
pub use error::EngineError;
pub use plan::{diff, ActionKind, PlanAction, WorkingTree};
