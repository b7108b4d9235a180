//! `hnsync plan` — render the plan the next apply would execute.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use hnsync_core::ledger::{self, PublicationMeta};
use hnsync_core::{Ledger, Project};
use hnsync_engine::{diff, ActionKind, PlanAction, WorkingTree};
use hnsync_state::stage;

use super::current_project;

/// Arguments for `hnsync plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// One-line summary only.
    #[arg(long, short)]
    pub short: bool,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let project = current_project()?;
        let st = stage::load(&project)?;
        if st.is_empty() {
            println!("Nothing staged. Stage files with `hnsync stage add <path>`.");
            return Ok(());
        }

        let working = working_ledger(&project)?;
        let tree = WorkingTree::capture(&project, &working, &st)?;
        let plan = diff(&working, &st, &tree);
        render_plan(&project, &st, &plan, self.short);
        Ok(())
    }
}

/// The ledger to plan against: the committed one (validated against the
/// configured publication) or a fresh one bound to it.
pub(crate) fn working_ledger(project: &Project) -> Result<Ledger> {
    let meta = PublicationMeta::load(project)?;
    match ledger::load(project)? {
        Some(loaded) => {
            ledger::validate_against(&loaded, &meta)?;
            Ok(loaded)
        }
        None => Ok(ledger::from_publication(&meta)),
    }
}

/// Shared plan rendering for `plan` and `apply --dry-run`.
pub(crate) fn render_plan(project: &Project, st: &stage::Stage, plan: &[PlanAction], short: bool) {
    let creates = count(plan, ActionKind::Create);
    let updates = count(plan, ActionKind::Update);
    let deletes = count(plan, ActionKind::Delete);
    let skips = count(plan, ActionKind::Skip);

    if short {
        println!("+{creates} ~{updates} -{deletes} ·{skips}");
        return;
    }

    println!("Publish plan ({} item(s)):\n", plan.len());
    for action in plan {
        let (marker, verb) = match action.kind {
            ActionKind::Create => ("+".green().bold().to_string(), "create"),
            ActionKind::Update => ("~".yellow().bold().to_string(), "update"),
            ActionKind::Delete => ("-".red().bold().to_string(), "delete"),
            ActionKind::Skip => ("·".bright_black().to_string(), "skip"),
        };
        let display = action.title.as_deref().unwrap_or(&action.path);
        println!("{marker} {verb} {display}");
        println!("    path:   {}", action.path);
        if let Some(previous) = &action.previous_path {
            println!("    from:   {previous}");
        }
        if let Some(id) = &action.remote_id {
            println!("    remote: {id}");
        }
        println!("    reason: {}", action.reason);
        if let Some(item) = st.items.get(&action.path) {
            if stage::is_stale(project, item) {
                println!(
                    "    {}",
                    "warning: file changed after staging — re-stage required".yellow()
                );
            }
        }
    }

    println!();
    println!("Summary: {creates} create, {updates} update, {deletes} delete, {skips} skip");
    if creates + updates + deletes > 0 {
        println!("Ready to publish: hnsync apply");
    }
}

fn count(plan: &[PlanAction], kind: ActionKind) -> usize {
    plan.iter().filter(|a| a.kind == kind).count()
}
