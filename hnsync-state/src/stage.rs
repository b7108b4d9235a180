//! The staging area: declarative intent per tracked path.
//!
//! Persisted as a single YAML document at `{state-dir}/hashnode.stage` with a
//! version integer and an `items` map keyed by normalized path (articles) or
//! slug (series). Staging a file captures a snapshot of its bytes; the stage
//! entry records the checksum and snapshot filename so the applier can ship
//! exactly what was reviewed.

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hnsync_core::ledger::atomic_write;
use hnsync_core::{sha256_hex, slug::slugify, Project};

use crate::error::{io_err, StateError};
use crate::snapshot;

/// Current stage document version.
pub const STAGE_VERSION: u32 = 1;

/// What kind of remote object a staged item addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Article,
    Series,
}

/// The staged intent for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Add or update — content exists and was snapshotted.
    Modify,
    /// Intent to remove the remote object.
    Delete,
}

/// A unit of work waiting to be planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedItem {
    pub kind: ItemKind,
    /// Normalized path (articles) or slug (series).
    pub key: String,
    pub operation: Operation,
    /// SHA-256 of the staged bytes; absent for delete intents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// Snapshot filename in `{state-dir}/snapshots/`; absent for deletes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
    /// Display name for series items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub staged_at: DateTime<Utc>,
}

/// The staging area document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub version: u32,
    #[serde(default, deserialize_with = "hnsync_core::types::null_as_default")]
    pub items: BTreeMap<String, StagedItem>,
}

impl Default for Stage {
    fn default() -> Self {
        Self {
            version: STAGE_VERSION,
            items: BTreeMap::new(),
        }
    }
}

impl Stage {
    /// Reset to empty; persists on the next [`save`].
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Snapshot filenames referenced by any item — the GC reachable set.
    pub fn snapshot_refs(&self) -> BTreeSet<String> {
        self.items
            .values()
            .filter_map(|item| item.snapshot.clone())
            .collect()
    }
}

/// Outcome of staging a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageDirReport {
    pub staged: Vec<String>,
    pub skipped: Vec<String>,
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load the stage, returning an empty stage when the file is absent. A nil
/// items map normalizes to an empty map.
pub fn load(project: &Project) -> Result<Stage, StateError> {
    let path = project.stage_path();
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Stage::default()),
        Err(err) => return Err(io_err(&path, err)),
    };
    let stage: Stage =
        serde_yaml::from_str(&contents).map_err(|source| StateError::Parse { path, source })?;
    Ok(stage)
}

/// Persist the stage atomically.
pub fn save(project: &Project, stage: &Stage) -> Result<(), StateError> {
    let yaml = serde_yaml::to_string(stage)?;
    atomic_write(&project.stage_path(), yaml.as_bytes())?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Staging operations
// ---------------------------------------------------------------------------

/// Stage a single file for modify: validate the path, snapshot the bytes and
/// record the intent. Returns the normalized key.
pub fn stage_add(project: &Project, stage: &mut Stage, path: &Path) -> Result<String, StateError> {
    let key = validated_key(project, path)?;
    let abs = project.resolve(&key);
    let content = std::fs::read(&abs).map_err(|e| io_err(&abs, e))?;

    let checksum = sha256_hex(&content);
    let snap = snapshot::create(project, &content)?;

    stage.items.insert(
        key.clone(),
        StagedItem {
            kind: ItemKind::Article,
            key: key.clone(),
            operation: Operation::Modify,
            checksum: Some(checksum),
            snapshot: Some(snap.filename),
            name: None,
            staged_at: Utc::now(),
        },
    );
    tracing::debug!("staged modify: {key}");
    Ok(key)
}

/// Record a delete intent for a path. The file need not exist on disk — a
/// delete intent for an already-removed file is legal and necessary.
pub fn stage_remove(project: &Project, stage: &mut Stage, path: &Path) -> Result<String, StateError> {
    let key = validated_key(project, path)?;
    stage.items.insert(
        key.clone(),
        StagedItem {
            kind: ItemKind::Article,
            key: key.clone(),
            operation: Operation::Delete,
            checksum: None,
            snapshot: None,
            name: None,
            staged_at: Utc::now(),
        },
    );
    tracing::debug!("staged delete: {key}");
    Ok(key)
}

/// Drop an item from the stage. Returns whether anything was removed; a
/// missing entry is a no-op.
pub fn unstage(project: &Project, stage: &mut Stage, path: &Path) -> Result<bool, StateError> {
    let key = project.normalize(path)?;
    Ok(stage.items.remove(&key).is_some())
}

/// Stage a series creation under its deterministic local slug.
pub fn stage_series(stage: &mut Stage, name: &str) -> String {
    let slug = slugify(name);
    stage.items.insert(
        slug.clone(),
        StagedItem {
            kind: ItemKind::Series,
            key: slug.clone(),
            operation: Operation::Modify,
            checksum: None,
            snapshot: None,
            name: Some(name.to_owned()),
            staged_at: Utc::now(),
        },
    );
    slug
}

/// Walk `dir` and stage every Markdown file found, skipping the state
/// directory entirely (the walk never descends into it).
pub fn stage_dir(
    project: &Project,
    stage: &mut Stage,
    dir: &Path,
) -> Result<StageDirReport, StateError> {
    let mut report = StageDirReport::default();
    walk(project, stage, dir, &mut report)?;
    report.staged.sort();
    report.skipped.sort();
    Ok(report)
}

fn walk(
    project: &Project,
    stage: &mut Stage,
    dir: &Path,
    report: &mut StageDirReport,
) -> Result<(), StateError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();

        if path.is_dir() {
            // Directory-skip, not file-filter: never descend into state.
            if project.is_state_path(&path) {
                continue;
            }
            walk(project, stage, &path, report)?;
            continue;
        }

        if !is_markdown(&path) {
            report.skipped.push(path.display().to_string());
            continue;
        }

        match stage_add(project, stage, &path) {
            Ok(key) => report.staged.push(key),
            Err(StateError::Core(_)) | Err(StateError::ProtectedPath { .. }) => {
                report.skipped.push(path.display().to_string());
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

/// True when the current on-disk checksum differs from the staged one, or the
/// file is missing while a checksum is staged. Used by the applier to refuse
/// shipping stale snapshots without explicit confirmation.
pub fn is_stale(project: &Project, item: &StagedItem) -> bool {
    let Some(staged_checksum) = item.checksum.as_deref() else {
        return false;
    };
    let abs = project.resolve(&item.key);
    match std::fs::read(&abs) {
        Ok(bytes) => sha256_hex(&bytes) != staged_checksum,
        Err(err) if err.kind() == ErrorKind::NotFound => true,
        Err(_) => true,
    }
}

fn validated_key(project: &Project, path: &Path) -> Result<String, StateError> {
    if project.is_state_path(path) {
        return Err(StateError::ProtectedPath {
            path: path.to_path_buf(),
        });
    }
    Ok(project.normalize(path)?)
}

fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown")
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
