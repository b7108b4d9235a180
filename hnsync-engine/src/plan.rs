//! The diff engine: a pure function from (ledger, stage, working tree) to an
//! ordered plan of typed actions.
//!
//! The working tree is captured into memory before planning so the function
//! itself does no I/O — running it twice over the same inputs yields
//! identical plans. Rename detection is a content-hash heuristic with a
//! safeguard against treating copies as moves: the old path must be gone
//! from disk or carry a staged delete.

use std::collections::{BTreeMap, BTreeSet};

use hnsync_core::{Ledger, PostId, Project};
use hnsync_state::stage::{ItemKind, Operation, Stage, StagedItem};

use crate::error::EngineError;

/// The kind of remote mutation an action maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Create,
    Update,
    Delete,
    Skip,
}

/// One entry of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanAction {
    pub kind: ActionKind,
    pub item: ItemKind,
    /// Normalized path (articles) or local slug (series).
    pub path: String,
    /// Set when a rename was detected: the path the ledger knows.
    pub previous_path: Option<String>,
    pub remote_id: Option<PostId>,
    /// Display title where known (ledger cache or staged series name).
    pub title: Option<String>,
    pub reason: String,
    /// The content checksum the action will ship, where applicable.
    pub checksum: Option<String>,
}

/// In-memory capture of the working tree: normalized path → current on-disk
/// checksum. Paths absent from the map are absent from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTree {
    files: BTreeMap<String, String>,
}

impl WorkingTree {
    /// Read the on-disk checksum of every path named by the stage or the
    /// ledger. Only these paths can appear in a plan, so nothing else needs
    /// capturing.
    pub fn capture(
        project: &Project,
        ledger: &Ledger,
        stage: &Stage,
    ) -> Result<Self, EngineError> {
        let mut paths: BTreeSet<&str> = ledger.articles.keys().map(String::as_str).collect();
        for (key, item) in &stage.items {
            if item.kind == ItemKind::Article {
                paths.insert(key.as_str());
            }
        }

        let mut files = BTreeMap::new();
        for path in paths {
            let abs = project.resolve(path);
            match std::fs::read(&abs) {
                Ok(bytes) => {
                    files.insert(path.to_owned(), hnsync_core::sha256_hex(&bytes));
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(EngineError::State(hnsync_state::StateError::Io {
                        path: abs,
                        source: err,
                    }))
                }
            }
        }
        Ok(Self { files })
    }

    /// Build a tree from explicit entries (tests).
    pub fn from_entries<I, P, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        Self {
            files: entries
                .into_iter()
                .map(|(p, c)| (p.into(), c.into()))
                .collect(),
        }
    }

    pub fn checksum(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}

/// Compute the plan. Pure: depends only on the three inputs.
pub fn diff(ledger: &Ledger, stage: &Stage, tree: &WorkingTree) -> Vec<PlanAction> {
    // Index builds over the ledger.
    let by_path = &ledger.articles;
    let mut by_checksum: BTreeMap<&str, &str> = BTreeMap::new();
    for (path, article) in by_path {
        // Articles without a remote id are unpublished drafts; indexing them
        // would manufacture false renames.
        if article.id.is_some() {
            by_checksum.insert(article.checksum.as_str(), path.as_str());
        }
    }

    // Delete intents consumed by a rename produce no standalone action.
    let consumed = rename_consumed_paths(ledger, stage, tree, &by_checksum);

    let mut plan = Vec::new();
    for (path, item) in &stage.items {
        match item.kind {
            ItemKind::Series => plan.push(plan_series(ledger, path, item)),
            ItemKind::Article => {
                if item.operation == Operation::Delete && consumed.contains(path.as_str()) {
                    continue;
                }
                plan.push(plan_article(ledger, stage, tree, &by_checksum, path, item));
            }
        }
    }
    plan
}

fn plan_series(ledger: &Ledger, slug: &str, item: &StagedItem) -> PlanAction {
    if ledger.series.contains_key(slug) {
        PlanAction {
            kind: ActionKind::Skip,
            item: ItemKind::Series,
            path: slug.to_owned(),
            previous_path: None,
            remote_id: None,
            title: item.name.clone(),
            reason: "series exists".to_owned(),
            checksum: None,
        }
    } else {
        PlanAction {
            kind: ActionKind::Create,
            item: ItemKind::Series,
            path: slug.to_owned(),
            previous_path: None,
            remote_id: None,
            title: item.name.clone(),
            reason: "new series".to_owned(),
            checksum: None,
        }
    }
}

fn plan_article(
    ledger: &Ledger,
    stage: &Stage,
    tree: &WorkingTree,
    by_checksum: &BTreeMap<&str, &str>,
    path: &str,
    item: &StagedItem,
) -> PlanAction {
    let known = ledger.articles.get(path);

    if item.operation == Operation::Delete {
        return match known.and_then(|a| a.id.clone()) {
            Some(remote_id) => PlanAction {
                kind: ActionKind::Delete,
                item: ItemKind::Article,
                path: path.to_owned(),
                previous_path: None,
                remote_id: Some(remote_id),
                title: known.and_then(|a| a.title.clone()),
                reason: "marked for deletion".to_owned(),
                checksum: None,
            },
            None => PlanAction {
                kind: ActionKind::Skip,
                item: ItemKind::Article,
                path: path.to_owned(),
                previous_path: None,
                remote_id: None,
                title: known.and_then(|a| a.title.clone()),
                reason: "delete requested but not published".to_owned(),
                checksum: None,
            },
        };
    }

    // Resolve the current checksum: staged value, else the snapshot filename
    // stem (the filename *is* the digest), else the working tree.
    let current = item
        .checksum
        .clone()
        .or_else(|| snapshot_digest(item))
        .or_else(|| tree.checksum(path).map(str::to_owned));
    let Some(current) = current else {
        return PlanAction {
            kind: ActionKind::Skip,
            item: ItemKind::Article,
            path: path.to_owned(),
            previous_path: None,
            remote_id: None,
            title: None,
            reason: "staged file missing".to_owned(),
            checksum: None,
        };
    };

    match known {
        None => {
            if let Some(old_path) = rename_source(ledger, stage, tree, by_checksum, &current) {
                let old = &ledger.articles[old_path];
                return PlanAction {
                    kind: ActionKind::Update,
                    item: ItemKind::Article,
                    path: path.to_owned(),
                    previous_path: Some(old_path.to_owned()),
                    remote_id: old.id.clone(),
                    title: old.title.clone(),
                    reason: "rename detected".to_owned(),
                    checksum: Some(current),
                };
            }
            PlanAction {
                kind: ActionKind::Create,
                item: ItemKind::Article,
                path: path.to_owned(),
                previous_path: None,
                remote_id: None,
                title: None,
                reason: "new article".to_owned(),
                checksum: Some(current),
            }
        }
        Some(article) => match &article.id {
            None => PlanAction {
                kind: ActionKind::Create,
                item: ItemKind::Article,
                path: path.to_owned(),
                previous_path: None,
                remote_id: None,
                title: article.title.clone(),
                reason: "draft promotion".to_owned(),
                checksum: Some(current),
            },
            Some(remote_id) => {
                if current != article.checksum {
                    PlanAction {
                        kind: ActionKind::Update,
                        item: ItemKind::Article,
                        path: path.to_owned(),
                        previous_path: None,
                        remote_id: Some(remote_id.clone()),
                        title: article.title.clone(),
                        reason: "content changed".to_owned(),
                        checksum: Some(current),
                    }
                } else {
                    PlanAction {
                        kind: ActionKind::Skip,
                        item: ItemKind::Article,
                        path: path.to_owned(),
                        previous_path: None,
                        remote_id: Some(remote_id.clone()),
                        title: article.title.clone(),
                        reason: "up to date".to_owned(),
                        checksum: Some(current),
                    }
                }
            }
        },
    }
}

/// The ledger path a staged modify item renames, if any.
///
/// A rename requires the ledger to know this exact content under another
/// path, and that path to be gone from disk or staged for delete — a
/// copy-with-same-content keeps the original and is not a move.
fn rename_source<'a>(
    ledger: &Ledger,
    stage: &Stage,
    tree: &WorkingTree,
    by_checksum: &BTreeMap<&str, &'a str>,
    current: &str,
) -> Option<&'a str> {
    let old_path = *by_checksum.get(current)?;
    if ledger.articles[old_path].id.is_none() {
        return None;
    }
    let staged_delete = stage
        .items
        .get(old_path)
        .map(|it| it.operation == Operation::Delete)
        .unwrap_or(false);
    if !tree.exists(old_path) || staged_delete {
        Some(old_path)
    } else {
        None
    }
}

/// Old paths consumed as rename sources; their delete intents emit nothing.
fn rename_consumed_paths<'a>(
    ledger: &Ledger,
    stage: &Stage,
    tree: &WorkingTree,
    by_checksum: &BTreeMap<&str, &'a str>,
) -> BTreeSet<&'a str> {
    let mut consumed = BTreeSet::new();
    for (path, item) in &stage.items {
        if item.kind != ItemKind::Article
            || item.operation != Operation::Modify
            || ledger.articles.contains_key(path)
        {
            continue;
        }
        let current = item.checksum.clone().or_else(|| snapshot_digest(item));
        if let Some(current) = current {
            if let Some(old) = rename_source(ledger, stage, tree, by_checksum, &current) {
                consumed.insert(old);
            }
        }
    }
    consumed
}

fn snapshot_digest(item: &StagedItem) -> Option<String> {
    item.snapshot
        .as_deref()
        .map(|name| name.strip_suffix(".md").unwrap_or(name).to_owned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
