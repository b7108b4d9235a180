//! Cross-process project lock.
//!
//! A single exclusive file at `{state-dir}/hashnode.lock` created with
//! create-or-fail semantics. The file carries the owner pid and acquisition
//! time, one `key=value` per line. Liveness of the owner pid is not probed;
//! stale locks are the user's responsibility. The guard releases the lock on
//! all exit paths via `Drop`.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};

use hnsync_core::Project;

use crate::error::{io_err, StateError};

/// RAII guard for the project lock. Dropping it removes the lock file.
#[derive(Debug)]
pub struct ProjectLock {
    path: PathBuf,
}

impl ProjectLock {
    /// Acquire the lock, failing with `AlreadyLocked` when another process
    /// holds it.
    pub fn acquire(project: &Project) -> Result<Self, StateError> {
        let path = project.lock_path();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(StateError::AlreadyLocked { path })
            }
            Err(err) => return Err(io_err(&path, err)),
        };

        let body = format!(
            "pid={}\ncreated={}\n",
            std::process::id(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        file.write_all(body.as_bytes()).map_err(|e| io_err(&path, e))?;
        tracing::debug!("acquired project lock: {}", path.display());
        Ok(Self { path })
    }

    /// Release explicitly, surfacing removal errors. Equivalent to dropping
    /// the guard except that failures are reported instead of logged.
    pub fn release(self) -> Result<(), StateError> {
        let path = self.path.clone();
        std::mem::forget(self);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_err(&path, err)),
        }
    }
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                tracing::warn!("failed to remove lock {}: {err}", self.path.display());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn acquire_writes_pid_and_created_lines() {
        let tmp = TempDir::new().expect("tempdir");
        let project = Project::open(tmp.path());
        let lock = ProjectLock::acquire(&project).expect("acquire");

        let body = std::fs::read_to_string(project.lock_path()).expect("read lock");
        let mut lines = body.lines();
        let pid_line = lines.next().expect("pid line");
        let created_line = lines.next().expect("created line");
        assert_eq!(pid_line, format!("pid={}", std::process::id()));
        assert!(created_line.starts_with("created="));
        assert!(created_line.ends_with('Z'), "created must be UTC RFC 3339");

        drop(lock);
    }

    #[test]
    fn second_acquire_fails_while_held() {
        let tmp = TempDir::new().expect("tempdir");
        let project = Project::open(tmp.path());
        let _held = ProjectLock::acquire(&project).expect("first");

        let err = ProjectLock::acquire(&project).unwrap_err();
        assert!(matches!(err, StateError::AlreadyLocked { .. }));
    }

    #[test]
    fn drop_releases_the_lock() {
        let tmp = TempDir::new().expect("tempdir");
        let project = Project::open(tmp.path());
        {
            let _lock = ProjectLock::acquire(&project).expect("acquire");
            assert!(project.lock_path().exists());
        }
        assert!(!project.lock_path().exists(), "drop must remove the lock file");

        // Reacquire works after release.
        let _again = ProjectLock::acquire(&project).expect("reacquire");
    }

    #[test]
    fn explicit_release_removes_the_file() {
        let tmp = TempDir::new().expect("tempdir");
        let project = Project::open(tmp.path());
        let lock = ProjectLock::acquire(&project).expect("acquire");
        lock.release().expect("release");
        assert!(!project.lock_path().exists());
    }
}
