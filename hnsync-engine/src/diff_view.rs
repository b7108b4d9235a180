//! Unified diffs between staged snapshots and the working tree.
//!
//! Backs `hnsync stage diff`: shows what changed on disk since each item was
//! staged, so the user can decide between re-staging and `--force`.

use similar::TextDiff;

use hnsync_core::Project;
use hnsync_state::snapshot;
use hnsync_state::stage::{ItemKind, Operation, Stage};

use crate::error::EngineError;

/// A single staged-vs-disk diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedDiff {
    pub path: String,
    pub unified: String,
}

/// Diff every staged modify item (or just `path_filter`) against the current
/// on-disk content. Items whose disk content matches the snapshot produce no
/// entry.
pub fn staged_diffs(
    project: &Project,
    stage: &Stage,
    path_filter: Option<&str>,
) -> Result<Vec<StagedDiff>, EngineError> {
    let mut diffs = Vec::new();

    for (path, item) in &stage.items {
        if item.kind != ItemKind::Article || item.operation != Operation::Modify {
            continue;
        }
        if let Some(filter) = path_filter {
            if path != filter {
                continue;
            }
        }
        let Some(snapshot_name) = item.snapshot.as_deref() else {
            continue;
        };

        let staged_bytes = snapshot::get(project, snapshot_name)?;
        let staged = String::from_utf8_lossy(&staged_bytes).into_owned();
        let current = read_or_empty(project, path)?;
        if staged == current {
            continue;
        }

        let old_header = format!("a/{path}");
        let new_header = format!("b/{path}");
        let unified = TextDiff::from_lines(&staged, &current)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string();

        diffs.push(StagedDiff {
            path: path.clone(),
            unified,
        });
    }

    Ok(diffs)
}

fn read_or_empty(project: &Project, path: &str) -> Result<String, EngineError> {
    let abs = project.resolve(path);
    match std::fs::read(&abs) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(EngineError::State(hnsync_state::StateError::Io {
            path: abs,
            source: err,
        })),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
