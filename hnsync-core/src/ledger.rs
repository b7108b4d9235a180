//! Ledger load/save and publication metadata.
//!
//! The ledger is a single YAML document at `{root}/hashnode.sum`, committed to
//! the user's version control system. Serialization is deterministic (sorted
//! map keys, stable encoding) so content-equal ledgers are byte-equal files.
//! Writes go through the same temp-and-rename protocol as every other state
//! file.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};
use crate::project::Project;
use crate::types::{Ledger, PublicationId, PublicationRecord};

/// Current ledger document version.
pub const LEDGER_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Publication metadata (written by init)
// ---------------------------------------------------------------------------

/// Contents of `{state-dir}/publication.yml`: the publication this repository
/// is bound to. System-owned; not edited by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationMeta {
    pub publication_id: PublicationId,
    pub publication_slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_username: Option<String>,
}

impl PublicationMeta {
    /// Load from `{state-dir}/publication.yml`.
    pub fn load(project: &Project) -> Result<Self, CoreError> {
        let path = project.publication_path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(CoreError::PublicationNotFound { path })
            }
            Err(err) => return Err(io_err(&path, err)),
        };
        serde_yaml::from_str(&contents).map_err(|source| CoreError::Parse { path, source })
    }

    /// Persist to `{state-dir}/publication.yml` atomically.
    pub fn save(&self, project: &Project) -> Result<(), CoreError> {
        let yaml = serde_yaml::to_string(self)?;
        atomic_write(&project.publication_path(), yaml.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load the ledger from `{root}/hashnode.sum`.
///
/// Returns `Ok(None)` when the file does not exist — absence is a normal
/// pre-init state, distinct from a parse or I/O error. Null maps decode to
/// empty maps.
pub fn load(project: &Project) -> Result<Option<Ledger>, CoreError> {
    let path = project.ledger_path();
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(&path, err)),
    };
    let ledger: Ledger =
        serde_yaml::from_str(&contents).map_err(|source| CoreError::Parse { path, source })?;
    Ok(Some(ledger))
}

/// Atomically save the ledger to `{root}/hashnode.sum`.
pub fn save(project: &Project, ledger: &Ledger) -> Result<(), CoreError> {
    let yaml = serde_yaml::to_string(ledger)?;
    atomic_write(&project.ledger_path(), yaml.as_bytes())
}

/// A fresh ledger bound to `meta`'s publication, with empty tables.
pub fn from_publication(meta: &PublicationMeta) -> Ledger {
    Ledger {
        version: LEDGER_VERSION,
        publication: PublicationRecord {
            id: meta.publication_id.clone(),
            slug: meta.publication_slug.clone(),
            title: meta.title.clone(),
        },
        series: BTreeMap::new(),
        articles: BTreeMap::new(),
    }
}

/// Enforce that the ledger belongs to the configured publication.
pub fn validate_against(ledger: &Ledger, meta: &PublicationMeta) -> Result<(), CoreError> {
    if ledger.publication.id != meta.publication_id {
        return Err(CoreError::WrongPublication {
            ledger: ledger.publication.id.to_string(),
            configured: meta.publication_id.to_string(),
        });
    }
    Ok(())
}

/// Write-to-temp-in-same-directory then rename. The temp sibling guarantees
/// the rename is atomic on the same filesystem; readers never observe a
/// partial file.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), CoreError> {
    let Some(dir) = path.parent() else {
        return Err(io_err(
            path,
            std::io::Error::other("path has no parent directory"),
        ));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_owned());
    let tmp = dir.join(format!(".tmp-{file_name}"));
    std::fs::write(&tmp, data).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
