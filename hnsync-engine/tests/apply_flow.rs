//! Applier behavior against a scripted mock gateway: the fresh-create,
//! update, rename, confirmation and failure-atomicity flows.

use std::cell::{Cell, RefCell};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};

use tempfile::TempDir;

use hnsync_core::ledger::{self, PublicationMeta};
use hnsync_core::types::{PostId, PublicationId, SeriesId};
use hnsync_core::{sha256_hex, Project};
use hnsync_engine::{apply, ApplyOptions, ApplyOutcome, EngineError};
use hnsync_gateway::types::{
    CreateSeriesInput, CreatedPost, PublicationPage, PublishPostInput, RemoteSeries,
    UpdatePostInput, UserIdentity,
};
use hnsync_gateway::{Gateway, GatewayError};
use hnsync_state::stage;

// ---------------------------------------------------------------------------
// Mock gateway
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Publish { title: String, body: String },
    Update { id: String, body: Option<String> },
    Remove { id: String },
    CreateSeries { name: String, slug: String },
}

/// Records every mutation; optionally fails the nth one (1-based).
#[derive(Default)]
struct MockGateway {
    calls: RefCell<Vec<Call>>,
    fail_on: Option<usize>,
    counter: Cell<usize>,
    next_id: Cell<u32>,
}

impl MockGateway {
    fn new() -> Self {
        Self::default()
    }

    fn failing_on(n: usize) -> Self {
        Self {
            fail_on: Some(n),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn tick(&self) -> Result<(), GatewayError> {
        let n = self.counter.get() + 1;
        self.counter.set(n);
        if self.fail_on == Some(n) {
            return Err(GatewayError::Api {
                message: "scripted failure".to_owned(),
            });
        }
        Ok(())
    }

    fn fresh_id(&self) -> String {
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        format!("p-{n}")
    }
}

impl Gateway for MockGateway {
    fn me(&self) -> Result<UserIdentity, GatewayError> {
        Ok(UserIdentity {
            username: "tester".into(),
            publications: vec![],
        })
    }

    fn publication_page(
        &self,
        _publication: &PublicationId,
        _first: usize,
        _after: Option<&str>,
    ) -> Result<PublicationPage, GatewayError> {
        Ok(PublicationPage {
            posts: vec![],
            series: vec![],
            has_next_page: false,
            end_cursor: None,
        })
    }

    fn publish_post(&self, input: &PublishPostInput) -> Result<CreatedPost, GatewayError> {
        self.tick()?;
        self.calls.borrow_mut().push(Call::Publish {
            title: input.title.clone(),
            body: input.content_markdown.clone(),
        });
        let id = self.fresh_id();
        Ok(CreatedPost {
            id: PostId::from(id.as_str()),
            slug: format!("slug-{id}"),
        })
    }

    fn update_post(&self, input: &UpdatePostInput) -> Result<(), GatewayError> {
        self.tick()?;
        self.calls.borrow_mut().push(Call::Update {
            id: input.id.to_string(),
            body: input.content_markdown.clone(),
        });
        Ok(())
    }

    fn remove_post(&self, id: &PostId) -> Result<(), GatewayError> {
        self.tick()?;
        self.calls.borrow_mut().push(Call::Remove { id: id.to_string() });
        Ok(())
    }

    fn create_series(&self, input: &CreateSeriesInput) -> Result<RemoteSeries, GatewayError> {
        self.tick()?;
        self.calls.borrow_mut().push(Call::CreateSeries {
            name: input.name.clone(),
            slug: input.slug.clone(),
        });
        Ok(RemoteSeries {
            id: SeriesId::from("s-9"),
            name: input.name.clone(),
            slug: input.slug.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

fn init_project() -> (TempDir, Project) {
    let tmp = TempDir::new().expect("tempdir");
    let project = Project::open(tmp.path());
    PublicationMeta {
        publication_id: PublicationId::from("pub-1"),
        publication_slug: "blog".into(),
        title: Some("Blog".into()),
        owner_username: None,
    }
    .save(&project)
    .expect("publication meta");
    (tmp, project)
}

fn write_article(project: &Project, rel: &str, title: &str, body: &str) -> String {
    let content = format!("---\ntitle: \"{title}\"\n---\n\n{body}\n");
    let abs = project.resolve(rel);
    fs::create_dir_all(abs.parent().expect("parent")).expect("mkdir");
    fs::write(&abs, &content).expect("write");
    content
}

fn stage_paths(project: &Project, paths: &[&str]) {
    let mut st = stage::load(project).expect("load stage");
    for rel in paths {
        stage::stage_add(project, &mut st, &project.resolve(rel)).expect("stage add");
    }
    stage::save(project, &st).expect("save stage");
}

fn stage_delete(project: &Project, rel: &str) {
    let mut st = stage::load(project).expect("load stage");
    stage::stage_remove(project, &mut st, &project.resolve(rel)).expect("stage rm");
    stage::save(project, &st).expect("save stage");
}

fn run(project: &Project, gateway: &MockGateway, options: ApplyOptions) -> Result<ApplyOutcome, EngineError> {
    let cancel = AtomicBool::new(false);
    apply(project, gateway, &options, &cancel)
}

fn yes() -> ApplyOptions {
    ApplyOptions {
        yes: true,
        ..ApplyOptions::default()
    }
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

#[test]
fn empty_stage_is_nothing_to_apply() {
    let (_tmp, project) = init_project();
    let gateway = MockGateway::new();
    let outcome = run(&project, &gateway, ApplyOptions::default()).expect("apply");
    assert!(matches!(outcome, ApplyOutcome::NothingToApply));
    assert!(gateway.calls().is_empty());
}

#[test]
fn fresh_create_publishes_and_commits_everything() {
    let (_tmp, project) = init_project();
    let content = write_article(&project, "posts/a.md", "Hello World Essay", "Body.");
    stage_paths(&project, &["posts/a.md"]);

    let gateway = MockGateway::new();
    let outcome = run(&project, &gateway, ApplyOptions::default()).expect("apply");

    let ApplyOutcome::Applied(report) = outcome else {
        panic!("expected Applied");
    };
    assert_eq!(report.created, 1);
    assert_eq!(
        gateway.calls(),
        vec![Call::Publish {
            title: "Hello World Essay".into(),
            body: "Body.\n".into(),
        }]
    );

    // Ledger carries the returned identity and the full-file checksum.
    let ledger = ledger::load(&project).expect("load").expect("present");
    let row = ledger.articles.get("posts/a.md").expect("article row");
    assert_eq!(row.id, Some(PostId::from("p-1")));
    assert_eq!(row.checksum, sha256_hex(content.as_bytes()));
    assert_eq!(row.title.as_deref(), Some("Hello World Essay"));

    // Stage cleared, snapshots collected, lock gone.
    assert!(stage::load(&project).expect("stage").is_empty());
    assert!(hnsync_state::snapshot::list(&project).expect("list").is_empty());
    assert!(!project.lock_path().exists());
}

#[test]
fn unchanged_restage_skips_without_remote_calls() {
    let (_tmp, project) = init_project();
    write_article(&project, "posts/a.md", "Hello World Essay", "Body.");
    stage_paths(&project, &["posts/a.md"]);
    let gateway = MockGateway::new();
    run(&project, &gateway, ApplyOptions::default()).expect("first apply");

    // Re-stage the identical file: the plan is one skip, nothing executes.
    stage_paths(&project, &["posts/a.md"]);
    let ledger_before = fs::read(project.ledger_path()).expect("ledger bytes");
    let outcome = run(&project, &gateway, ApplyOptions::default()).expect("second apply");

    let ApplyOutcome::Applied(report) = outcome else {
        panic!("expected Applied");
    };
    assert_eq!(report.created + report.updated + report.deleted, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(gateway.calls().len(), 1, "no new remote calls");
    assert_eq!(
        fs::read(project.ledger_path()).expect("ledger bytes"),
        ledger_before,
        "ledger is byte-identical after a no-op apply"
    );
}

#[test]
fn content_change_updates_and_refreshes_checksum() {
    let (_tmp, project) = init_project();
    write_article(&project, "posts/a.md", "Hello World Essay", "Body.");
    stage_paths(&project, &["posts/a.md"]);
    let gateway = MockGateway::new();
    run(&project, &gateway, ApplyOptions::default()).expect("first apply");

    let revised = write_article(&project, "posts/a.md", "Hello World Essay", "Revised.");
    stage_paths(&project, &["posts/a.md"]);
    run(&project, &gateway, ApplyOptions::default()).expect("second apply");

    let calls = gateway.calls();
    assert_eq!(
        calls[1],
        Call::Update {
            id: "p-1".into(),
            body: Some("Revised.\n".into()),
        }
    );

    let ledger = ledger::load(&project).expect("load").expect("present");
    let row = ledger.articles.get("posts/a.md").expect("row");
    assert_eq!(row.checksum, sha256_hex(revised.as_bytes()));
    assert!(stage::load(&project).expect("stage").is_empty());
}

#[test]
fn rename_is_one_update_and_rekeys_the_ledger() {
    let (_tmp, project) = init_project();
    let content = write_article(&project, "posts/a.md", "Hello World Essay", "Body.");
    stage_paths(&project, &["posts/a.md"]);
    let gateway = MockGateway::new();
    run(&project, &gateway, ApplyOptions::default()).expect("first apply");

    // Rename on disk, stage the new path and the delete intent.
    let from = project.resolve("posts/a.md");
    let to = project.resolve("posts/b.md");
    fs::rename(&from, &to).expect("rename");
    stage_paths(&project, &["posts/b.md"]);
    stage_delete(&project, "posts/a.md");

    run(&project, &gateway, yes()).expect("second apply");

    let calls = gateway.calls();
    assert_eq!(calls.len(), 2, "publish then a single rename update");
    assert!(matches!(&calls[1], Call::Update { id, .. } if id == "p-1"));

    let ledger = ledger::load(&project).expect("load").expect("present");
    assert!(!ledger.articles.contains_key("posts/a.md"));
    let row = ledger.articles.get("posts/b.md").expect("renamed row");
    assert_eq!(row.id, Some(PostId::from("p-1")));
    assert_eq!(row.checksum, sha256_hex(content.as_bytes()));
}

#[test]
fn failure_mid_apply_leaves_ledger_stage_and_lock_pristine() {
    let (_tmp, project) = init_project();
    write_article(&project, "x.md", "First Article", "One.");
    write_article(&project, "y.md", "Second Article", "Two.");
    stage_paths(&project, &["x.md", "y.md"]);
    let gateway = MockGateway::new();
    run(&project, &gateway, ApplyOptions::default()).expect("seed apply");

    write_article(&project, "x.md", "First Article", "One revised.");
    write_article(&project, "y.md", "Second Article", "Two revised.");
    stage_paths(&project, &["x.md", "y.md"]);

    let ledger_before = fs::read(project.ledger_path()).expect("ledger bytes");
    let stage_before = fs::read(project.stage_path()).expect("stage bytes");

    // First update succeeds, second fails.
    let failing = MockGateway::failing_on(2);
    let err = run(&project, &failing, ApplyOptions::default()).unwrap_err();
    assert!(matches!(err, EngineError::Gateway(GatewayError::Api { .. })));

    assert_eq!(
        fs::read(project.ledger_path()).expect("ledger bytes"),
        ledger_before,
        "ledger must be untouched after a failed run"
    );
    assert_eq!(
        fs::read(project.stage_path()).expect("stage bytes"),
        stage_before,
        "stage must be preserved for retry"
    );
    assert!(!project.lock_path().exists(), "lock released on failure");
}

#[test]
fn delete_without_confirmation_is_rejected_before_any_call() {
    let (_tmp, project) = init_project();
    write_article(&project, "posts/a.md", "Hello World Essay", "Body.");
    stage_paths(&project, &["posts/a.md"]);
    let gateway = MockGateway::new();
    run(&project, &gateway, ApplyOptions::default()).expect("seed apply");

    stage_delete(&project, "posts/a.md");
    let stage_before = fs::read(project.stage_path()).expect("stage bytes");

    let err = run(&project, &gateway, ApplyOptions::default()).unwrap_err();
    assert!(matches!(err, EngineError::ConfirmationRequired { .. }));
    assert!(err.to_string().contains("confirmation required"));
    assert_eq!(gateway.calls().len(), 1, "no remote call was issued");
    assert_eq!(
        fs::read(project.stage_path()).expect("stage bytes"),
        stage_before
    );

    // Confirmed: the remove goes out and the row disappears.
    run(&project, &gateway, yes()).expect("confirmed apply");
    assert_eq!(
        gateway.calls().last(),
        Some(&Call::Remove { id: "p-1".into() })
    );
    let ledger = ledger::load(&project).expect("load").expect("present");
    assert!(ledger.articles.is_empty());
    assert!(stage::load(&project).expect("stage").is_empty());
}

#[test]
fn stale_staging_is_rejected_unless_forced() {
    let (_tmp, project) = init_project();
    write_article(&project, "posts/a.md", "Hello World Essay", "Body.");
    stage_paths(&project, &["posts/a.md"]);
    let gateway = MockGateway::new();
    run(&project, &gateway, ApplyOptions::default()).expect("seed apply");

    write_article(&project, "posts/a.md", "Hello World Essay", "Staged.");
    stage_paths(&project, &["posts/a.md"]);
    // Disk moves on after staging.
    write_article(&project, "posts/a.md", "Hello World Essay", "Drifted.");

    let err = run(&project, &gateway, ApplyOptions::default()).unwrap_err();
    assert!(matches!(err, EngineError::StaleStaging { .. }));

    let outcome = run(
        &project,
        &gateway,
        ApplyOptions {
            force: true,
            ..ApplyOptions::default()
        },
    )
    .expect("forced apply");
    assert!(matches!(outcome, ApplyOutcome::Applied(_)));

    // The snapshot (staged content), not the drifted disk state, was shipped.
    assert!(matches!(
        gateway.calls().last(),
        Some(Call::Update { body: Some(body), .. }) if body == "Staged.\n"
    ));
}

#[test]
fn dry_run_validates_but_mutates_nothing() {
    let (_tmp, project) = init_project();
    write_article(&project, "posts/a.md", "Hello World Essay", "Body.");
    stage_paths(&project, &["posts/a.md"]);

    let gateway = MockGateway::new();
    let outcome = run(
        &project,
        &gateway,
        ApplyOptions {
            dry_run: true,
            ..ApplyOptions::default()
        },
    )
    .expect("dry run");

    let ApplyOutcome::DryRun { plan } = outcome else {
        panic!("expected DryRun");
    };
    assert_eq!(plan.len(), 1);
    assert!(gateway.calls().is_empty());
    assert!(ledger::load(&project).expect("load").is_none());
    assert!(!stage::load(&project).expect("stage").is_empty());
    assert!(!project.lock_path().exists());
}

#[test]
fn dry_run_shows_deletes_without_demanding_confirmation() {
    let (_tmp, project) = init_project();
    write_article(&project, "posts/a.md", "Hello World Essay", "Body.");
    stage_paths(&project, &["posts/a.md"]);
    let gateway = MockGateway::new();
    run(&project, &gateway, ApplyOptions::default()).expect("seed apply");

    stage_delete(&project, "posts/a.md");
    let outcome = run(
        &project,
        &gateway,
        ApplyOptions {
            dry_run: true,
            ..ApplyOptions::default()
        },
    )
    .expect("dry run plans deletes without --yes");

    let ApplyOutcome::DryRun { plan } = outcome else {
        panic!("expected DryRun");
    };
    assert_eq!(plan.len(), 1);
    assert_eq!(gateway.calls().len(), 1, "no remote call was issued");
}

#[test]
fn missing_or_short_title_rejects_the_whole_run() {
    let (_tmp, project) = init_project();
    let abs = project.resolve("posts/short.md");
    fs::create_dir_all(abs.parent().expect("parent")).expect("mkdir");
    fs::write(&abs, "---\ntitle: Hi\n---\n\nBody.\n").expect("write");
    stage_paths(&project, &["posts/short.md"]);

    let gateway = MockGateway::new();
    let err = run(&project, &gateway, ApplyOptions::default()).unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput { .. }));
    assert!(gateway.calls().is_empty());
}

#[test]
fn cancellation_skips_execution_and_commits_nothing() {
    let (_tmp, project) = init_project();
    write_article(&project, "posts/a.md", "Hello World Essay", "Body.");
    stage_paths(&project, &["posts/a.md"]);

    let gateway = MockGateway::new();
    let cancel = AtomicBool::new(false);
    cancel.store(true, Ordering::SeqCst);
    let err = apply(&project, &gateway, &ApplyOptions::default(), &cancel).unwrap_err();

    assert!(matches!(err, EngineError::Cancelled));
    assert!(gateway.calls().is_empty());
    assert!(ledger::load(&project).expect("load").is_none());
    assert!(!stage::load(&project).expect("stage").is_empty());
    assert!(!project.lock_path().exists());
}

#[test]
fn held_lock_blocks_a_second_apply() {
    let (_tmp, project) = init_project();
    write_article(&project, "posts/a.md", "Hello World Essay", "Body.");
    stage_paths(&project, &["posts/a.md"]);

    let _held = hnsync_state::ProjectLock::acquire(&project).expect("hold lock");
    let gateway = MockGateway::new();
    let err = run(&project, &gateway, ApplyOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::State(hnsync_state::StateError::AlreadyLocked { .. })
    ));
    assert!(gateway.calls().is_empty());
}

#[test]
fn series_created_before_article_that_references_it() {
    let (_tmp, project) = init_project();
    let abs = project.resolve("posts/a.md");
    fs::create_dir_all(abs.parent().expect("parent")).expect("mkdir");
    fs::write(
        &abs,
        "---\ntitle: \"Hello World Essay\"\nseries: Rust Deep Dives\n---\n\nBody.\n",
    )
    .expect("write");

    let mut st = stage::load(&project).expect("load");
    stage::stage_series(&mut st, "Rust Deep Dives");
    stage::stage_add(&project, &mut st, &abs).expect("stage add");
    stage::save(&project, &st).expect("save");

    let gateway = MockGateway::new();
    run(&project, &gateway, ApplyOptions::default()).expect("apply");

    let calls = gateway.calls();
    assert!(
        matches!(&calls[0], Call::CreateSeries { slug, .. } if slug == "rust-deep-dives"),
        "series creation must precede the article publish"
    );
    assert!(matches!(&calls[1], Call::Publish { .. }));

    let ledger = ledger::load(&project).expect("load").expect("present");
    let series = ledger.series.get("rust-deep-dives").expect("series row");
    assert_eq!(series.id, SeriesId::from("s-9"));
}
