//! Project context: root discovery and state-directory paths.
//!
//! The root is resolved once (walking upward from a start directory) and the
//! resulting [`Project`] is threaded explicitly through every operation.
//! Nothing in this crate caches the root in process-global state, so tests
//! can run in parallel against independent temp directories.

use std::path::{Component, Path, PathBuf};

use crate::error::CoreError;

/// Repository state directory, excluded from staging and traversal.
pub const STATE_DIR: &str = ".hashnode";
/// Ledger file at the repository root; committed to version control.
pub const LEDGER_FILE: &str = "hashnode.sum";
/// Stage file under the state directory; local only.
pub const STAGE_FILE: &str = "hashnode.stage";
/// Transient lock file under the state directory.
pub const LOCK_FILE: &str = "hashnode.lock";
/// Publication metadata written by `init`, under the state directory.
pub const PUBLICATION_FILE: &str = "publication.yml";
/// Snapshot store directory under the state directory.
pub const SNAPSHOTS_DIR: &str = "snapshots";

/// Resolved project context. All absolute ↔ relative conversions anchor at
/// [`Project::root`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Walk upward from `start` looking for a directory that contains either
    /// the ledger file or the state directory.
    pub fn discover(start: &Path) -> Result<Self, CoreError> {
        let start_abs = absolute(start)?;
        let mut dir = start_abs.clone();
        loop {
            if dir.join(LEDGER_FILE).is_file() || dir.join(STATE_DIR).is_dir() {
                return Ok(Self { root: dir });
            }
            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => return Err(CoreError::ProjectNotFound { start: start_abs }),
            }
        }
    }

    /// Use `root` directly as the project root without probing (init, tests).
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(LEDGER_FILE)
    }

    pub fn stage_path(&self) -> PathBuf {
        self.state_dir().join(STAGE_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.state_dir().join(LOCK_FILE)
    }

    pub fn publication_path(&self) -> PathBuf {
        self.state_dir().join(PUBLICATION_FILE)
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.state_dir().join(SNAPSHOTS_DIR)
    }

    /// Normalize `path` into the canonical article key: repository-relative
    /// with forward slashes. Fails with `OutsideRepo` when the path does not
    /// live under the project root.
    pub fn normalize(&self, path: &Path) -> Result<String, CoreError> {
        let abs = absolute(path)?;
        let rel = abs
            .strip_prefix(&self.root)
            .map_err(|_| CoreError::OutsideRepo { path: abs.clone() })?;
        Ok(to_slash(rel))
    }

    /// Resolve a normalized key back to an absolute filesystem path.
    pub fn resolve(&self, normalized: &str) -> PathBuf {
        let mut out = self.root.clone();
        for part in normalized.split('/').filter(|p| !p.is_empty()) {
            out.push(part);
        }
        out
    }

    /// True when `path` lies inside the state directory. Such paths are never
    /// staged, never read as content and skipped during traversal.
    pub fn is_state_path(&self, path: &Path) -> bool {
        match absolute(path) {
            Ok(abs) => abs.starts_with(self.state_dir()),
            Err(_) => false,
        }
    }
}

/// Absolutize and lexically normalize (`.`/`..` components) without touching
/// the filesystem, so missing files (delete intents) still normalize.
fn absolute(path: &Path) -> Result<PathBuf, CoreError> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| crate::error::io_err(path, e))?
            .join(path)
    };

    let mut out = PathBuf::new();
    for comp in joined.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

fn to_slash(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn discover_finds_root_by_ledger_file() {
        let tmp = TempDir::new().expect("tempdir");
        fs::write(tmp.path().join(LEDGER_FILE), "version: 1\n").expect("write ledger");
        let nested = tmp.path().join("posts").join("2024");
        fs::create_dir_all(&nested).expect("mkdir");

        let project = Project::discover(&nested).expect("discover");
        assert!(project.ledger_path().is_file());
        assert!(nested.starts_with(project.root()));
    }

    #[test]
    fn discover_finds_root_by_state_dir() {
        let tmp = TempDir::new().expect("tempdir");
        fs::create_dir_all(tmp.path().join(STATE_DIR)).expect("mkdir state");
        let project = Project::discover(tmp.path()).expect("discover");
        assert_eq!(project.state_dir(), project.root().join(STATE_DIR));
    }

    #[test]
    fn discover_fails_without_markers() {
        let tmp = TempDir::new().expect("tempdir");
        let err = Project::discover(tmp.path()).unwrap_err();
        assert!(matches!(err, CoreError::ProjectNotFound { .. }));
    }

    #[test]
    fn normalize_produces_forward_slash_relative_keys() {
        let tmp = TempDir::new().expect("tempdir");
        let project = Project::open(tmp.path());
        let key = project
            .normalize(&tmp.path().join("posts").join("a.md"))
            .expect("normalize");
        assert_eq!(key, "posts/a.md");
    }

    #[test]
    fn normalize_rejects_paths_outside_root() {
        let root = TempDir::new().expect("root");
        let other = TempDir::new().expect("other");
        let project = Project::open(root.path());
        let err = project.normalize(&other.path().join("a.md")).unwrap_err();
        assert!(matches!(err, CoreError::OutsideRepo { .. }));
    }

    #[test]
    fn normalize_handles_dotdot_without_filesystem() {
        let tmp = TempDir::new().expect("tempdir");
        let project = Project::open(tmp.path());
        // posts/../posts/a.md collapses lexically even though nothing exists.
        let path = tmp.path().join("posts").join("..").join("posts").join("a.md");
        assert_eq!(project.normalize(&path).expect("normalize"), "posts/a.md");
    }

    #[test]
    fn resolve_round_trips_normalized_keys() {
        let tmp = TempDir::new().expect("tempdir");
        let project = Project::open(tmp.path());
        let abs = project.resolve("posts/a.md");
        assert_eq!(project.normalize(&abs).expect("normalize"), "posts/a.md");
    }

    #[test]
    fn state_paths_are_recognized() {
        let tmp = TempDir::new().expect("tempdir");
        let project = Project::open(tmp.path());
        assert!(project.is_state_path(&project.stage_path()));
        assert!(project.is_state_path(&project.snapshots_dir().join("x.md")));
        assert!(!project.is_state_path(&tmp.path().join("posts").join("a.md")));
    }
}
