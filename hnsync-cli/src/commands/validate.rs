//! `hnsync validate` — snapshot integrity and ledger consistency checks.

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use hnsync_core::ledger::{self, PublicationMeta};
use hnsync_state::{snapshot, stage};

use super::current_project;

/// Arguments for `hnsync validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    pub fn run(self) -> Result<()> {
        let project = current_project()?;
        let mut problems = 0usize;

        // Every snapshot file must hash to its filename. Violations are
        // reported, never repaired.
        let snapshots = snapshot::list(&project)?;
        for filename in &snapshots {
            if let Err(err) = snapshot::validate(&project, filename) {
                println!("{} {err}", "✗".red());
                problems += 1;
            }
        }
        println!("checked {} snapshot(s)", snapshots.len());

        // Every staged modify item must point at an existing snapshot.
        let st = stage::load(&project)?;
        for (path, item) in &st.items {
            if let Some(name) = item.snapshot.as_deref() {
                if let Err(err) = snapshot::get(&project, name) {
                    println!("{} staged item {path}: {err}", "✗".red());
                    problems += 1;
                }
            }
        }

        // The ledger must belong to the configured publication.
        let meta = PublicationMeta::load(&project)?;
        match ledger::load(&project)? {
            Some(loaded) => {
                if let Err(err) = ledger::validate_against(&loaded, &meta) {
                    println!("{} {err}", "✗".red());
                    problems += 1;
                }
            }
            None => println!("note: no ledger yet (nothing applied)"),
        }

        if problems > 0 {
            bail!("{problems} validation problem(s) found");
        }
        println!("{} state is consistent", "✓".green());
        Ok(())
    }
}
