//! `hnsync apply` — commit staged intent to the remote.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use hnsync_engine::{apply, ActionKind, ApplyOptions, ApplyOutcome};
use hnsync_gateway::HttpGateway;
use hnsync_state::stage;

use super::current_project;
use crate::commands::plan::render_plan;
use crate::token;

/// Arguments for `hnsync apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Confirm destructive deletions.
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Ship staged snapshots even when the working tree has moved on.
    #[arg(long)]
    pub force: bool,

    /// Validate and show the plan without issuing mutations.
    #[arg(long)]
    pub dry_run: bool,

    /// API token (overrides $HASHNODE_TOKEN and the home config).
    #[arg(long)]
    pub token: Option<String>,
}

impl ApplyArgs {
    pub fn run(self) -> Result<()> {
        let project = current_project()?;

        // Dry runs never reach the network; don't demand a token for them.
        let token = match token::resolve(self.token.clone()) {
            Ok(token) => token,
            Err(_) if self.dry_run => String::from("dry-run"),
            Err(err) => return Err(err),
        };
        let gateway = HttpGateway::new(token)?;

        // On SIGINT the in-flight remote call completes, remaining items are
        // skipped, and nothing is committed.
        let cancel = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&cancel))
            .context("cannot install interrupt handler")?;

        let options = ApplyOptions {
            yes: self.yes,
            force: self.force,
            dry_run: self.dry_run,
        };
        let outcome = apply(&project, &gateway, &options, &cancel)?;

        match outcome {
            ApplyOutcome::NothingToApply => {
                println!("Nothing staged; nothing to apply.");
            }
            ApplyOutcome::DryRun { plan } => {
                let st = stage::load(&project)?;
                println!("{}", "[dry-run] no changes were made".bright_black());
                render_plan(&project, &st, &plan, false);
            }
            ApplyOutcome::Applied(report) => {
                for action in &report.actions {
                    let id = action.remote_id.as_deref().unwrap_or("-");
                    let verb = match action.kind {
                        ActionKind::Create => "created",
                        ActionKind::Update => "updated",
                        ActionKind::Delete => "deleted",
                        ActionKind::Skip => "skipped",
                    };
                    println!("  {verb} {} -> {id}", action.path);
                }
                println!(
                    "{} apply complete: {} created, {} updated, {} deleted, {} skipped",
                    "✓".green(),
                    report.created,
                    report.updated,
                    report.deleted,
                    report.skipped
                );
                if report.gc.removed > 0 {
                    println!("  gc: removed {} unreferenced snapshot(s)", report.gc.removed);
                }
            }
        }
        Ok(())
    }
}
