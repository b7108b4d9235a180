//! # hnsync-state
//!
//! Local persistence primitives: the content-addressable snapshot store, the
//! staging area and the cross-process project lock. All operations take an
//! explicit [`hnsync_core::Project`] context.

pub mod error;
pub mod lock;
pub mod snapshot;
pub mod stage;

pub use error::StateError;
pub use lock::ProjectLock;
pub use snapshot::{GcStats, Snapshot};
pub use stage::{ItemKind, Operation, Stage, StagedItem};
