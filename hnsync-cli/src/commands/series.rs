//! `hnsync series` — declarative series management.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use hnsync_state::stage::{self, ItemKind};

use super::current_project;
use crate::commands::plan::working_ledger;

/// Subcommands of `hnsync series`.
#[derive(Subcommand, Debug)]
pub enum SeriesCommand {
    /// Stage a series creation (idempotent by name).
    Create {
        /// Series display name.
        #[arg(long, short)]
        name: String,
    },

    /// List series known to the ledger and staged for creation.
    List,
}

pub fn run(command: SeriesCommand) -> Result<()> {
    let project = current_project()?;
    match command {
        SeriesCommand::Create { name } => {
            let working = working_ledger(&project)?;
            if let Some(existing) = working.resolve_series(&name) {
                println!(
                    "No-op: series '{}' already exists (slug={}, id={})",
                    existing.name, existing.slug, existing.id
                );
                return Ok(());
            }

            let mut st = stage::load(&project)?;
            let already = st
                .items
                .values()
                .any(|it| it.kind == ItemKind::Series && it.name.as_deref() == Some(name.as_str()));
            if already {
                println!("No-op: series '{name}' is already staged");
                return Ok(());
            }

            let slug = stage::stage_series(&mut st, &name);
            stage::save(&project, &st)?;
            println!("{} staged series '{name}' (slug={slug})", "✓".green());
            println!("The series is created remotely on the next `hnsync apply`.");
            Ok(())
        }
        SeriesCommand::List => {
            let working = working_ledger(&project)?;
            let st = stage::load(&project)?;

            if working.series.is_empty() {
                println!("No series in the ledger.");
            } else {
                println!("Series ({}):", working.series.len());
                for (slug, series) in &working.series {
                    println!("  {slug} — {} (id={})", series.name, series.id);
                }
            }

            let staged: Vec<_> = st
                .items
                .values()
                .filter(|it| it.kind == ItemKind::Series)
                .collect();
            if !staged.is_empty() {
                println!("Staged for creation ({}):", staged.len());
                for item in staged {
                    println!("  {} — {}", item.key, item.name.as_deref().unwrap_or("?"));
                }
            }
            Ok(())
        }
    }
}
