//! `hnsync stage` — manage the staging area.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use hnsync_engine::{diff, staged_diffs, ActionKind, WorkingTree};
use hnsync_state::stage;

use super::current_project;
use crate::commands::plan::working_ledger;

/// Subcommands of `hnsync stage`.
#[derive(Subcommand, Debug)]
pub enum StageCommand {
    /// Stage files (or whole directories) for the next apply.
    Add {
        /// Markdown files or directories to stage.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Record a delete intent for a path (the file may already be gone).
    Rm { path: PathBuf },

    /// Remove a path from the stage without touching the file.
    Reset { path: PathBuf },

    /// List staged items grouped by planned action.
    List,

    /// Unified diff of each staged snapshot against the working tree.
    Diff { path: Option<PathBuf> },
}

pub fn run(command: StageCommand) -> Result<()> {
    let project = current_project()?;
    match command {
        StageCommand::Add { paths } => {
            let mut st = stage::load(&project)?;
            let mut staged = 0usize;
            let mut skipped = 0usize;
            for path in &paths {
                if path.is_dir() {
                    let report = stage::stage_dir(&project, &mut st, path)?;
                    staged += report.staged.len();
                    skipped += report.skipped.len();
                } else {
                    let key = stage::stage_add(&project, &mut st, path)?;
                    println!("  staged {key}");
                    staged += 1;
                }
            }
            stage::save(&project, &st)?;
            println!("{} {staged} article(s) staged", "✓".green());
            if skipped > 0 {
                println!("  {skipped} file(s) ignored (not Markdown)");
            }
            println!("Next: hnsync plan");
            Ok(())
        }
        StageCommand::Rm { path } => {
            let mut st = stage::load(&project)?;
            let key = stage::stage_remove(&project, &mut st, &path)?;
            stage::save(&project, &st)?;
            println!("{} marked for deletion: {key}", "✓".green());
            println!("The remote post is removed on the next `hnsync apply --yes`.");
            Ok(())
        }
        StageCommand::Reset { path } => {
            let mut st = stage::load(&project)?;
            let removed = stage::unstage(&project, &mut st, &path)?;
            stage::save(&project, &st)?;
            if removed {
                println!("{} unstaged {}", "✓".green(), path.display());
            } else {
                println!("not staged: {}", path.display());
            }
            Ok(())
        }
        StageCommand::List => {
            let st = stage::load(&project)?;
            if st.is_empty() {
                println!("Staged items (0):\n  (none)");
                return Ok(());
            }
            let ledger = working_ledger(&project)?;
            let tree = WorkingTree::capture(&project, &ledger, &st)?;
            let plan = diff(&ledger, &st, &tree);

            println!("Staged items ({}):\n", plan.len());
            print_group(&plan, ActionKind::Create, "will create");
            print_group(&plan, ActionKind::Update, "will update");
            print_group(&plan, ActionKind::Delete, "will delete");
            print_group(&plan, ActionKind::Skip, "no change");
            Ok(())
        }
        StageCommand::Diff { path } => {
            let st = stage::load(&project)?;
            let filter = path
                .as_deref()
                .map(|p| project.normalize(p))
                .transpose()
                .context("cannot normalize path")?;
            let diffs = staged_diffs(&project, &st, filter.as_deref())?;
            if diffs.is_empty() {
                println!("No differences between staged snapshots and the working tree.");
                return Ok(());
            }
            for d in diffs {
                print!("{}", d.unified);
            }
            Ok(())
        }
    }
}

fn print_group(plan: &[hnsync_engine::PlanAction], kind: ActionKind, label: &str) {
    let rows: Vec<_> = plan.iter().filter(|a| a.kind == kind).collect();
    if rows.is_empty() {
        return;
    }
    let marker = match kind {
        ActionKind::Create => "+".green().to_string(),
        ActionKind::Update => "~".yellow().to_string(),
        ActionKind::Delete => "−".red().to_string(),
        ActionKind::Skip => "·".bright_black().to_string(),
    };
    println!("{marker} {label} ({})", rows.len());
    for action in rows {
        let display = action.title.as_deref().unwrap_or(&action.path);
        println!("  - {display} ({})", action.path);
    }
    println!();
}
