//! End-to-end CLI flows short of the network: staging, planning, state
//! integrity checks and the confirmation exit path.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

use hnsync_core::ledger::{self, PublicationMeta};
use hnsync_core::types::{ArticleRecord, PostId, PublicationId};
use hnsync_core::{sha256_hex, Project};

fn hnsync_cmd(project_dir: &Path, home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("hnsync"));
    cmd.current_dir(project_dir)
        .env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("HASHNODE_TOKEN");
    cmd
}

/// A project directory with publication metadata and an empty ledger, as
/// `init` would leave it.
fn init_project(workspace: &TempDir) -> (PathBuf, Project) {
    let dir = workspace.path().join("blog");
    fs::create_dir_all(&dir).expect("create project dir");
    let project = Project::open(&dir);
    let meta = PublicationMeta {
        publication_id: PublicationId::from("pub-1"),
        publication_slug: "my-blog".into(),
        title: Some("My Blog".into()),
        owner_username: Some("tester".into()),
    };
    meta.save(&project).expect("publication meta");
    ledger::save(&project, &ledger::from_publication(&meta)).expect("ledger");
    (dir, project)
}

fn write_article(project: &Project, rel: &str, title: &str, body: &str) -> String {
    let content = format!("---\ntitle: \"{title}\"\n---\n\n{body}\n");
    let abs = project.resolve(rel);
    fs::create_dir_all(abs.parent().expect("parent")).expect("mkdir");
    fs::write(&abs, &content).expect("write article");
    content
}

#[test]
fn stage_add_then_plan_shows_a_create() {
    let workspace = TempDir::new().expect("workspace");
    let home = TempDir::new().expect("home");
    let (dir, project) = init_project(&workspace);
    write_article(&project, "posts/a.md", "Hello World Essay", "Body.");

    hnsync_cmd(&dir, home.path())
        .args(["stage", "add", "posts/a.md"])
        .assert()
        .success()
        .stdout(contains("1 article(s) staged"));

    hnsync_cmd(&dir, home.path())
        .args(["plan"])
        .assert()
        .success()
        .stdout(contains("create"))
        .stdout(contains("new article"))
        .stdout(contains("posts/a.md"));
}

#[test]
fn plan_short_prints_counts_only() {
    let workspace = TempDir::new().expect("workspace");
    let home = TempDir::new().expect("home");
    let (dir, project) = init_project(&workspace);
    write_article(&project, "posts/a.md", "Hello World Essay", "Body.");

    hnsync_cmd(&dir, home.path())
        .args(["stage", "add", "posts/a.md"])
        .assert()
        .success();

    hnsync_cmd(&dir, home.path())
        .args(["plan", "--short"])
        .assert()
        .success()
        .stdout(contains("+1 ~0 -0 ·0"));
}

#[test]
fn staging_a_directory_walks_markdown_files() {
    let workspace = TempDir::new().expect("workspace");
    let home = TempDir::new().expect("home");
    let (dir, project) = init_project(&workspace);
    write_article(&project, "posts/a.md", "Hello World Essay", "A.");
    write_article(&project, "posts/nested/b.md", "Second Long Title", "B.");
    fs::write(project.resolve("posts/notes.txt"), "not markdown").expect("txt");

    hnsync_cmd(&dir, home.path())
        .args(["stage", "add", "posts"])
        .assert()
        .success()
        .stdout(contains("2 article(s) staged"))
        .stdout(contains("1 file(s) ignored"));
}

#[test]
fn stage_reset_removes_the_entry() {
    let workspace = TempDir::new().expect("workspace");
    let home = TempDir::new().expect("home");
    let (dir, project) = init_project(&workspace);
    write_article(&project, "posts/a.md", "Hello World Essay", "Body.");

    hnsync_cmd(&dir, home.path())
        .args(["stage", "add", "posts/a.md"])
        .assert()
        .success();
    hnsync_cmd(&dir, home.path())
        .args(["stage", "reset", "posts/a.md"])
        .assert()
        .success()
        .stdout(contains("unstaged"));

    hnsync_cmd(&dir, home.path())
        .args(["plan"])
        .assert()
        .success()
        .stdout(contains("Nothing staged"));
}

#[test]
fn staging_inside_state_dir_is_rejected() {
    let workspace = TempDir::new().expect("workspace");
    let home = TempDir::new().expect("home");
    let (dir, project) = init_project(&workspace);
    let sneaky = project.state_dir().join("sneaky.md");
    fs::write(&sneaky, "nope").expect("write");

    hnsync_cmd(&dir, home.path())
        .args(["stage", "add", ".hashnode/sneaky.md"])
        .assert()
        .failure()
        .stderr(contains("state directory"));
}

#[test]
fn delete_without_confirmation_exits_one_with_message() {
    let workspace = TempDir::new().expect("workspace");
    let home = TempDir::new().expect("home");
    let (dir, project) = init_project(&workspace);

    // Seed a published article so the delete intent maps to a remote post.
    let content = write_article(&project, "posts/a.md", "Hello World Essay", "Body.");
    let mut working = ledger::load(&project).expect("load").expect("present");
    working.set_article(
        "posts/a.md",
        ArticleRecord {
            id: Some(PostId::from("p-1")),
            checksum: sha256_hex(content.as_bytes()),
            slug: Some("a".into()),
            title: Some("Hello World Essay".into()),
        },
    );
    ledger::save(&project, &working).expect("save ledger");

    hnsync_cmd(&dir, home.path())
        .args(["stage", "rm", "posts/a.md"])
        .assert()
        .success();

    let assert = hnsync_cmd(&dir, home.path())
        .env("HASHNODE_TOKEN", "test-token")
        .args(["apply"])
        .assert()
        .failure()
        .stderr(contains("confirmation required"));
    let code = assert.get_output().status.code();
    assert_eq!(code, Some(1), "destructive op without --yes exits 1");

    // The stage survives the rejection.
    hnsync_cmd(&dir, home.path())
        .args(["plan"])
        .assert()
        .success()
        .stdout(contains("marked for deletion"));
}

#[test]
fn apply_dry_run_needs_no_token_and_mutates_nothing() {
    let workspace = TempDir::new().expect("workspace");
    let home = TempDir::new().expect("home");
    let (dir, project) = init_project(&workspace);
    write_article(&project, "posts/a.md", "Hello World Essay", "Body.");
    let ledger_before = fs::read(project.ledger_path()).expect("ledger bytes");

    hnsync_cmd(&dir, home.path())
        .args(["stage", "add", "posts/a.md"])
        .assert()
        .success();

    hnsync_cmd(&dir, home.path())
        .args(["apply", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("dry-run"))
        .stdout(contains("new article"));

    assert_eq!(
        fs::read(project.ledger_path()).expect("ledger bytes"),
        ledger_before,
        "dry-run must not touch the ledger"
    );
}

#[test]
fn gc_dry_run_then_real_run_cleans_unreferenced_snapshots() {
    let workspace = TempDir::new().expect("workspace");
    let home = TempDir::new().expect("home");
    let (dir, project) = init_project(&workspace);
    write_article(&project, "posts/a.md", "Hello World Essay", "Body.");

    // Stage then unstage: the snapshot stays behind, unreferenced.
    hnsync_cmd(&dir, home.path())
        .args(["stage", "add", "posts/a.md"])
        .assert()
        .success();
    hnsync_cmd(&dir, home.path())
        .args(["stage", "reset", "posts/a.md"])
        .assert()
        .success();

    hnsync_cmd(&dir, home.path())
        .args(["gc", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("would remove: 1"));
    assert_eq!(
        hnsync_state::snapshot::list(&project).expect("list").len(),
        1,
        "dry-run must not delete"
    );

    hnsync_cmd(&dir, home.path())
        .args(["gc"])
        .assert()
        .success()
        .stdout(contains("removed:    1"));
    assert!(hnsync_state::snapshot::list(&project).expect("list").is_empty());
}

#[test]
fn validate_flags_corrupted_snapshots() {
    let workspace = TempDir::new().expect("workspace");
    let home = TempDir::new().expect("home");
    let (dir, project) = init_project(&workspace);

    let snapshots = project.snapshots_dir();
    fs::create_dir_all(&snapshots).expect("mkdir");
    fs::write(snapshots.join(format!("{}.md", "0".repeat(64))), "tampered").expect("write");

    hnsync_cmd(&dir, home.path())
        .args(["validate"])
        .assert()
        .failure()
        .stdout(contains("integrity"));

    // A clean store validates.
    fs::remove_file(snapshots.join(format!("{}.md", "0".repeat(64)))).expect("rm");
    hnsync_cmd(&dir, home.path())
        .args(["validate"])
        .assert()
        .success()
        .stdout(contains("state is consistent"));
}

#[test]
fn status_json_has_stable_schema() {
    let workspace = TempDir::new().expect("workspace");
    let home = TempDir::new().expect("home");
    let (dir, project) = init_project(&workspace);
    write_article(&project, "posts/a.md", "Hello World Essay", "Body.");

    hnsync_cmd(&dir, home.path())
        .args(["stage", "add", "posts/a.md"])
        .assert()
        .success();

    let assert = hnsync_cmd(&dir, home.path())
        .args(["status", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let payload: serde_json::Value = serde_json::from_str(&stdout).expect("status json");

    assert_eq!(payload["summary"]["staged"], 1);
    assert_eq!(payload["summary"]["articles"], 0);
    let row = &payload["staged"][0];
    assert_eq!(row["path"], "posts/a.md");
    assert_eq!(row["planned"], "create");
    assert_eq!(row["stale"], false);
}

#[test]
fn commands_outside_a_project_fail_with_guidance() {
    let outside = TempDir::new().expect("outside");
    let home = TempDir::new().expect("home");

    hnsync_cmd(outside.path(), home.path())
        .args(["plan"])
        .assert()
        .failure()
        .stderr(contains("hnsync init"));
}

#[test]
fn unknown_arguments_exit_two() {
    let workspace = TempDir::new().expect("workspace");
    let home = TempDir::new().expect("home");
    let (dir, _project) = init_project(&workspace);

    let assert = hnsync_cmd(&dir, home.path())
        .args(["plan", "--bogus-flag"])
        .assert()
        .failure();
    assert_eq!(assert.get_output().status.code(), Some(2));
}
