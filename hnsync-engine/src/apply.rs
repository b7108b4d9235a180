//! The transactional applier.
//!
//! Owns the only write path to the remote. Holds the project lock for the
//! whole run, validates every precondition before the first remote call of
//! its kind, executes plan items in dependency order (series creations, then
//! deletes, then article creates/updates) and commits all ledger changes in
//! one atomic write only after every item succeeded. A failure at any item
//! aborts the rest: the on-disk ledger and stage are untouched, the lock is
//! released, and the error surfaces to the caller.

use std::sync::atomic::{AtomicBool, Ordering};

use hnsync_core::frontmatter::parse_document;
use hnsync_core::ledger::PublicationMeta;
use hnsync_core::types::ArticleRecord;
use hnsync_core::{ledger, Ledger, Project};
use hnsync_gateway::types::CreateSeriesInput;
use hnsync_gateway::Gateway;
use hnsync_state::snapshot::{self, GcStats};
use hnsync_state::stage::{self, ItemKind, Stage, StagedItem};
use hnsync_state::ProjectLock;

use crate::error::EngineError;
use crate::payload;
use crate::plan::{diff, ActionKind, PlanAction, WorkingTree};

/// Minimum accepted title length for a create.
pub const MIN_TITLE_LEN: usize = 6;

/// Caller-controlled switches for a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Confirm destructive deletions.
    pub yes: bool,
    /// Ship stale snapshots anyway.
    pub force: bool,
    /// Plan and validate, but mutate nothing.
    pub dry_run: bool,
}

/// One executed plan item, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedAction {
    pub kind: ActionKind,
    pub item: ItemKind,
    pub path: String,
    pub remote_id: Option<String>,
}

/// Summary of a completed apply.
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub actions: Vec<ExecutedAction>,
    pub gc: GcStats,
}

/// What an apply run did.
#[derive(Debug)]
pub enum ApplyOutcome {
    /// The stage was empty; nothing was locked in for execution.
    NothingToApply,
    /// Dry-run: the validated plan, with no mutations issued.
    DryRun { plan: Vec<PlanAction> },
    Applied(ApplyReport),
}

/// Execute the stage against the remote.
///
/// `cancel` is polled between items; when set, the in-flight call completes,
/// remaining items are skipped, queued ledger changes are discarded and the
/// run returns [`EngineError::Cancelled`].
pub fn apply(
    project: &Project,
    gateway: &dyn Gateway,
    options: &ApplyOptions,
    cancel: &AtomicBool,
) -> Result<ApplyOutcome, EngineError> {
    let lock = ProjectLock::acquire(project)?;

    let mut stage = stage::load(project)?;
    if stage.is_empty() {
        return Ok(ApplyOutcome::NothingToApply);
    }

    let meta = PublicationMeta::load(project)?;
    let mut working = match ledger::load(project)? {
        Some(loaded) => {
            ledger::validate_against(&loaded, &meta)?;
            loaded
        }
        None => ledger::from_publication(&meta),
    };

    let tree = WorkingTree::capture(project, &working, &stage)?;
    let plan = diff(&working, &stage, &tree);

    let titles = validate_preconditions(project, &working, &stage, &plan)?;

    if options.dry_run {
        return Ok(ApplyOutcome::DryRun { plan });
    }

    // Destructive runs are rejected before the first remote call.
    if let Some(delete) = plan.iter().find(|action| action.kind == ActionKind::Delete) {
        if !options.yes {
            return Err(EngineError::ConfirmationRequired {
                path: delete.path.clone(),
            });
        }
    }

    let mut ordered: Vec<&PlanAction> = plan
        .iter()
        .filter(|action| action.kind != ActionKind::Skip)
        .collect();
    ordered.sort_by_key(|action| execution_rank(action));

    let mut report = ApplyReport {
        skipped: plan.len() - ordered.len(),
        ..ApplyReport::default()
    };

    for action in ordered {
        if cancel.load(Ordering::SeqCst) {
            tracing::info!("cancellation requested; aborting before {}", action.path);
            return Err(EngineError::Cancelled);
        }
        execute(project, gateway, options, &mut working, &stage, &titles, action)?;
        record(&mut report, action);
    }

    // All items succeeded: commit every queued ledger change in one atomic
    // write. A failure here leaves the stage intact for a retry.
    ledger::save(project, &working)?;

    stage.clear();
    stage::save(project, &stage)?;

    report.gc = snapshot::gc(project, &stage, false, false)?;

    lock.release()?;
    Ok(ApplyOutcome::Applied(report))
}

// ---------------------------------------------------------------------------
// Preconditions
// ---------------------------------------------------------------------------

/// Reject the run before any remote call: creates need a resolvable title of
/// at least [`MIN_TITLE_LEN`] characters, staged series need a name. Returns
/// the resolved titles keyed by path for execution.
fn validate_preconditions(
    project: &Project,
    working: &Ledger,
    stage: &Stage,
    plan: &[PlanAction],
) -> Result<std::collections::BTreeMap<String, String>, EngineError> {
    let mut titles = std::collections::BTreeMap::new();

    for action in plan {
        match (action.kind, action.item) {
            (ActionKind::Create, ItemKind::Series) => {
                if action.title.as_deref().map_or(true, str::is_empty) {
                    return Err(EngineError::InvalidInput {
                        path: action.path.clone(),
                        reason: "staged series has no name".to_owned(),
                    });
                }
            }
            (ActionKind::Create, ItemKind::Article) => {
                let title = resolve_create_title(project, working, stage, &action.path)?;
                let Some(title) = title else {
                    return Err(EngineError::InvalidInput {
                        path: action.path.clone(),
                        reason: "no title in front matter".to_owned(),
                    });
                };
                if title.trim().chars().count() < MIN_TITLE_LEN {
                    return Err(EngineError::InvalidInput {
                        path: action.path.clone(),
                        reason: format!(
                            "title \"{title}\" is shorter than {MIN_TITLE_LEN} characters"
                        ),
                    });
                }
                titles.insert(action.path.clone(), title);
            }
            _ => {}
        }
    }
    Ok(titles)
}

/// Title for a create: ledger cache, then snapshot front matter, then disk
/// front matter.
fn resolve_create_title(
    project: &Project,
    working: &Ledger,
    stage: &Stage,
    path: &str,
) -> Result<Option<String>, EngineError> {
    if let Some(cached) = working
        .articles
        .get(path)
        .and_then(|article| article.title.clone())
    {
        return Ok(Some(cached));
    }

    if let Some(item) = stage.items.get(path) {
        if let Some(snapshot_name) = item.snapshot.as_deref() {
            let bytes = snapshot::get(project, snapshot_name)?;
            let content = String::from_utf8_lossy(&bytes);
            if let Some(title) = hnsync_core::frontmatter::parse_title(&content)? {
                return Ok(Some(title));
            }
        }
    }

    let abs = project.resolve(path);
    match std::fs::read(&abs) {
        Ok(bytes) => {
            let content = String::from_utf8_lossy(&bytes);
            Ok(hnsync_core::frontmatter::parse_title(&content)?)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(EngineError::State(hnsync_state::StateError::Io {
            path: abs,
            source: err,
        })),
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Series creations come first, then deletes, then article creates/updates —
/// deletes free slugs the creates may reuse, and articles may reference a
/// series created in the same run.
fn execution_rank(action: &PlanAction) -> u8 {
    match (action.item, action.kind) {
        (ItemKind::Series, _) => 0,
        (_, ActionKind::Delete) => 1,
        _ => 2,
    }
}

fn execute(
    project: &Project,
    gateway: &dyn Gateway,
    options: &ApplyOptions,
    working: &mut Ledger,
    stage: &Stage,
    titles: &std::collections::BTreeMap<String, String>,
    action: &PlanAction,
) -> Result<(), EngineError> {
    match (action.item, action.kind) {
        (ItemKind::Series, ActionKind::Create) => execute_series_create(gateway, working, action),
        (ItemKind::Article, ActionKind::Delete) => execute_delete(gateway, working, action),
        (ItemKind::Article, ActionKind::Update) => {
            execute_update(project, gateway, options, working, stage, action)
        }
        (ItemKind::Article, ActionKind::Create) => {
            execute_create(project, gateway, working, stage, titles, action)
        }
        _ => Ok(()),
    }
}

fn execute_series_create(
    gateway: &dyn Gateway,
    working: &mut Ledger,
    action: &PlanAction,
) -> Result<(), EngineError> {
    let name = action.title.clone().unwrap_or_default();
    let input = CreateSeriesInput {
        publication_id: working.publication.id.clone(),
        name,
        slug: action.path.clone(),
        description_markdown: None,
    };
    let created = gateway.create_series(&input)?;
    tracing::info!("created series {} -> {}", action.path, created.id);
    working.set_series(hnsync_core::SeriesRecord {
        id: created.id,
        name: created.name,
        slug: action.path.clone(),
        posts: None,
    });
    Ok(())
}

fn execute_delete(
    gateway: &dyn Gateway,
    working: &mut Ledger,
    action: &PlanAction,
) -> Result<(), EngineError> {
    let remote_id = action
        .remote_id
        .clone()
        .ok_or_else(|| EngineError::InvalidInput {
            path: action.path.clone(),
            reason: "delete action without a remote id".to_owned(),
        })?;
    gateway.remove_post(&remote_id)?;
    tracing::info!("deleted remote post {} -> {remote_id}", action.path);
    working.remove_article(&action.path);
    Ok(())
}

fn execute_update(
    project: &Project,
    gateway: &dyn Gateway,
    options: &ApplyOptions,
    working: &mut Ledger,
    stage: &Stage,
    action: &PlanAction,
) -> Result<(), EngineError> {
    let remote_id = action
        .remote_id
        .clone()
        .ok_or_else(|| EngineError::InvalidInput {
            path: action.path.clone(),
            reason: "update action without a remote id".to_owned(),
        })?;

    let item = stage.items.get(&action.path);

    // Staleness re-check immediately before the mutation: the snapshot being
    // shipped must still match the working tree unless forced.
    if let Some(item) = item {
        if stage::is_stale(project, item) {
            if !options.force {
                return Err(EngineError::StaleStaging {
                    path: action.path.clone(),
                });
            }
            tracing::warn!("forcing apply despite stale staging for {}", action.path);
        }
    }

    let content = load_content(project, item, &action.path)?;
    let doc = parse_document(&content)?;
    let title = doc
        .title()
        .map(str::to_owned)
        .or_else(|| action.title.clone());

    let input = payload::update_input(
        &remote_id,
        title.clone(),
        doc.body.clone(),
        doc.front_matter.as_ref(),
        working,
    );
    gateway.update_post(&input)?;
    tracing::info!("updated post {} -> {remote_id}", action.path);

    let checksum = stored_checksum(item, &content);
    let previous = action
        .previous_path
        .as_deref()
        .and_then(|prev| working.articles.get(prev).cloned());
    let slug = doc
        .front_matter
        .as_ref()
        .and_then(|fm| fm.slug.clone())
        .or_else(|| previous.as_ref().and_then(|p| p.slug.clone()))
        .or_else(|| {
            working
                .articles
                .get(&action.path)
                .and_then(|a| a.slug.clone())
        });

    working.set_article(
        &action.path,
        ArticleRecord {
            id: Some(remote_id),
            checksum,
            slug,
            title,
        },
    );
    if let Some(prev) = action.previous_path.as_deref() {
        working.remove_article(prev);
    }
    Ok(())
}

fn execute_create(
    project: &Project,
    gateway: &dyn Gateway,
    working: &mut Ledger,
    stage: &Stage,
    titles: &std::collections::BTreeMap<String, String>,
    action: &PlanAction,
) -> Result<(), EngineError> {
    let item = stage.items.get(&action.path);
    let content = load_content(project, item, &action.path)?;
    let doc = parse_document(&content)?;
    let title = titles
        .get(&action.path)
        .cloned()
        .ok_or_else(|| EngineError::InvalidInput {
            path: action.path.clone(),
            reason: "no title resolved for create".to_owned(),
        })?;

    let input = payload::publish_input(
        &working.publication.id,
        title.clone(),
        doc.body.clone(),
        doc.front_matter.as_ref(),
        working,
    );
    let created = gateway.publish_post(&input)?;
    tracing::info!("created post {} -> {}", action.path, created.id);

    let checksum = stored_checksum(item, &content);
    working.set_article(
        &action.path,
        ArticleRecord {
            id: Some(created.id),
            checksum,
            slug: Some(created.slug),
            title: Some(title),
        },
    );
    Ok(())
}

/// Article bytes for execution: the snapshot captured at staging time is
/// preferred; disk is the fallback for items staged without one.
fn load_content(
    project: &Project,
    item: Option<&StagedItem>,
    path: &str,
) -> Result<String, EngineError> {
    if let Some(snapshot_name) = item.and_then(|it| it.snapshot.as_deref()) {
        let bytes = snapshot::get(project, snapshot_name)?;
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }
    let abs = project.resolve(path);
    let bytes = std::fs::read(&abs).map_err(|source| {
        EngineError::State(hnsync_state::StateError::Io { path: abs, source })
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn stored_checksum(item: Option<&StagedItem>, content: &str) -> String {
    item.and_then(|it| it.checksum.clone())
        .unwrap_or_else(|| hnsync_core::sha256_hex(content.as_bytes()))
}

fn record(report: &mut ApplyReport, action: &PlanAction) {
    match action.kind {
        ActionKind::Create => report.created += 1,
        ActionKind::Update => report.updated += 1,
        ActionKind::Delete => report.deleted += 1,
        ActionKind::Skip => report.skipped += 1,
    }
    report.actions.push(ExecutedAction {
        kind: action.kind,
        item: action.item,
        path: action.path.clone(),
        remote_id: action.remote_id.as_ref().map(|id| id.to_string()),
    });
}
