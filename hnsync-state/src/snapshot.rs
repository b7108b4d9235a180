//! Content-addressable snapshot store under `{state-dir}/snapshots/`.
//!
//! A snapshot's filename is the hex SHA-256 of its contents plus `.md`, so
//! identical content deduplicates by construction and concurrent writers
//! racing on the same digest write identical bytes. Files are written via the
//! shared temp-and-rename protocol; readers never see partial content.

use std::io::ErrorKind;

use chrono::{DateTime, Utc};

use hnsync_core::ledger::atomic_write;
use hnsync_core::{sha256_hex, Project};

use crate::error::{io_err, StateError};
use crate::stage::Stage;

/// Metadata for a stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Hex SHA-256 of the contents; also the filename stem.
    pub digest: String,
    /// `{digest}.md`
    pub filename: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// Statistics returned by [`gc`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcStats {
    pub total: usize,
    pub referenced: usize,
    pub removed: usize,
    pub removed_list: Vec<String>,
    pub errors: Vec<String>,
    pub skipped: usize,
}

/// Store `bytes` as a snapshot, returning its metadata.
///
/// If a snapshot with the same digest already exists the call is a no-op and
/// the existing record is returned.
pub fn create(project: &Project, bytes: &[u8]) -> Result<Snapshot, StateError> {
    let digest = sha256_hex(bytes);
    let filename = format!("{digest}.md");
    let path = project.snapshots_dir().join(&filename);

    if let Ok(meta) = std::fs::metadata(&path) {
        return Ok(Snapshot {
            digest,
            filename,
            size: meta.len(),
            created_at: modified_time(&meta),
        });
    }

    atomic_write(&path, bytes)?;
    tracing::debug!("snapshot created: {filename}");
    Ok(Snapshot {
        digest,
        filename,
        size: bytes.len() as u64,
        created_at: Utc::now(),
    })
}

/// Read a snapshot's contents.
pub fn get(project: &Project, filename: &str) -> Result<Vec<u8>, StateError> {
    let path = project.snapshots_dir().join(filename);
    match std::fs::read(&path) {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(StateError::SnapshotNotFound {
            filename: filename.to_owned(),
        }),
        Err(err) => Err(io_err(&path, err)),
    }
}

/// Re-hash a snapshot's contents and compare against its filename stem.
///
/// A mismatch is reported, never repaired.
pub fn validate(project: &Project, filename: &str) -> Result<(), StateError> {
    let contents = get(project, filename)?;
    let expected = filename.strip_suffix(".md").unwrap_or(filename);
    let actual = sha256_hex(&contents);
    if actual != expected {
        return Err(StateError::IntegrityViolation {
            filename: filename.to_owned(),
            actual,
        });
    }
    Ok(())
}

/// Enumerate snapshot filenames, skipping anything that is not 64 lowercase
/// hex characters followed by `.md`.
pub fn list(project: &Project) -> Result<Vec<String>, StateError> {
    let dir = project.snapshots_dir();
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(io_err(&dir, err)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_err(&dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_snapshot_name(&name) && entry.path().is_file() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Remove a snapshot file; an absent file is not an error.
pub fn delete(project: &Project, filename: &str) -> Result<(), StateError> {
    let path = project.snapshots_dir().join(filename);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(&path, err)),
    }
}

/// Delete every snapshot not referenced by a stage item.
///
/// With `verify` set, each *reachable* snapshot is integrity-checked first;
/// corrupt ones are left untouched and listed in `errors`. In dry-run mode no
/// files are deleted but the stats report what would be removed.
pub fn gc(project: &Project, stage: &Stage, dry_run: bool, verify: bool) -> Result<GcStats, StateError> {
    let mut stats = GcStats::default();

    let all = list(project)?;
    stats.total = all.len();
    if all.is_empty() {
        return Ok(stats);
    }

    let reachable = stage.snapshot_refs();
    stats.referenced = reachable.len();

    for filename in all {
        let is_referenced = reachable.contains(filename.as_str());

        if verify && is_referenced {
            if let Err(err) = validate(project, &filename) {
                tracing::warn!("snapshot {filename} failed integrity check: {err}");
                stats.errors.push(format!("{filename}: {err}"));
                stats.skipped += 1;
                continue;
            }
        }

        if is_referenced {
            continue;
        }

        if dry_run {
            stats.removed_list.push(filename);
            stats.removed += 1;
        } else {
            match delete(project, &filename) {
                Ok(()) => {
                    stats.removed_list.push(filename);
                    stats.removed += 1;
                }
                Err(err) => {
                    tracing::warn!("failed to remove snapshot {filename}: {err}");
                    stats.errors.push(format!("{filename}: {err}"));
                    stats.skipped += 1;
                }
            }
        }
    }

    Ok(stats)
}

fn is_snapshot_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".md") else {
        return false;
    };
    stem.len() == 64
        && stem
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn modified_time(meta: &std::fs::Metadata) -> DateTime<Utc> {
    meta.modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{ItemKind, Operation, StagedItem};
    use std::fs;
    use tempfile::TempDir;

    fn project() -> (TempDir, Project) {
        let tmp = TempDir::new().expect("tempdir");
        let project = Project::open(tmp.path());
        (tmp, project)
    }

    fn stage_with_snapshot(filename: &str) -> Stage {
        let mut stage = Stage::default();
        stage.items.insert(
            "posts/a.md".to_string(),
            StagedItem {
                kind: ItemKind::Article,
                key: "posts/a.md".to_string(),
                operation: Operation::Modify,
                checksum: Some(filename.trim_end_matches(".md").to_string()),
                snapshot: Some(filename.to_string()),
                name: None,
                staged_at: Utc::now(),
            },
        );
        stage
    }

    #[test]
    fn create_is_content_addressed_and_idempotent() {
        let (_tmp, project) = project();
        let first = create(&project, b"hello").expect("create");
        assert_eq!(first.filename, format!("{}.md", first.digest));
        assert_eq!(first.digest, sha256_hex(b"hello"));

        let second = create(&project, b"hello").expect("recreate");
        assert_eq!(second.digest, first.digest);
        assert_eq!(list(&project).expect("list").len(), 1);
    }

    #[test]
    fn get_round_trips_content() {
        let (_tmp, project) = project();
        let snap = create(&project, b"content bytes").expect("create");
        let bytes = get(&project, &snap.filename).expect("get");
        assert_eq!(bytes, b"content bytes");
    }

    #[test]
    fn get_missing_snapshot_is_not_found() {
        let (_tmp, project) = project();
        let err = get(&project, &format!("{}.md", "0".repeat(64))).unwrap_err();
        assert!(matches!(err, StateError::SnapshotNotFound { .. }));
    }

    #[test]
    fn validate_detects_corruption() {
        let (_tmp, project) = project();
        let snap = create(&project, b"original").expect("create");
        assert!(validate(&project, &snap.filename).is_ok());

        fs::write(project.snapshots_dir().join(&snap.filename), b"tampered").expect("tamper");
        let err = validate(&project, &snap.filename).unwrap_err();
        assert!(matches!(err, StateError::IntegrityViolation { .. }));
    }

    #[test]
    fn list_skips_foreign_files() {
        let (_tmp, project) = project();
        let snap = create(&project, b"x").expect("create");
        fs::write(project.snapshots_dir().join("README.txt"), b"nope").expect("write");
        fs::write(project.snapshots_dir().join("short.md"), b"nope").expect("write");
        fs::write(
            project.snapshots_dir().join(format!("{}.md", "Z".repeat(64))),
            b"nope",
        )
        .expect("write");

        assert_eq!(list(&project).expect("list"), vec![snap.filename]);
    }

    #[test]
    fn delete_missing_is_a_noop() {
        let (_tmp, project) = project();
        delete(&project, &format!("{}.md", "a".repeat(64))).expect("delete absent");
    }

    #[test]
    fn gc_removes_only_unreachable_snapshots() {
        let (_tmp, project) = project();
        let kept = create(&project, b"kept").expect("create kept");
        let _doomed = create(&project, b"doomed").expect("create doomed");

        let stage = stage_with_snapshot(&kept.filename);
        let stats = gc(&project, &stage, false, false).expect("gc");

        assert_eq!(stats.total, 2);
        assert_eq!(stats.removed, 1);
        let remaining = list(&project).expect("list");
        assert_eq!(remaining, vec![kept.filename]);
    }

    #[test]
    fn gc_dry_run_deletes_nothing() {
        let (_tmp, project) = project();
        create(&project, b"one").expect("create");
        create(&project, b"two").expect("create");

        let stats = gc(&project, &Stage::default(), true, false).expect("gc");
        assert_eq!(stats.removed, 2);
        assert_eq!(list(&project).expect("list").len(), 2, "dry-run must not delete");
    }

    #[test]
    fn gc_verify_skips_corrupt_referenced_snapshots() {
        let (_tmp, project) = project();
        let snap = create(&project, b"will corrupt").expect("create");
        fs::write(project.snapshots_dir().join(&snap.filename), b"corrupted").expect("tamper");

        let stage = stage_with_snapshot(&snap.filename);
        let stats = gc(&project, &stage, false, true).expect("gc");

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.errors.len(), 1);
        assert!(
            project.snapshots_dir().join(&snap.filename).exists(),
            "corrupt referenced snapshot must not be removed"
        );
    }

    #[test]
    fn gc_on_empty_store_is_empty_stats() {
        let (_tmp, project) = project();
        let stats = gc(&project, &Stage::default(), false, false).expect("gc");
        assert_eq!(stats, GcStats::default());
    }
}
