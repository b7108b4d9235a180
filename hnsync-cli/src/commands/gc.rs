//! `hnsync gc` — remove unreferenced snapshots.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use hnsync_state::{snapshot, stage};

use super::current_project;

/// Arguments for `hnsync gc`.
#[derive(Args, Debug)]
pub struct GcArgs {
    /// Show what would be removed without deleting anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Integrity-check referenced snapshots; corrupt ones are reported and
    /// left untouched.
    #[arg(long)]
    pub verify: bool,
}

impl GcArgs {
    pub fn run(self) -> Result<()> {
        let project = current_project()?;
        let st = stage::load(&project)?;
        let stats = snapshot::gc(&project, &st, self.dry_run, self.verify)?;

        let mode = if self.dry_run { " (dry-run)" } else { "" };
        println!("Snapshot garbage collection{mode}");
        println!("  total:      {}", stats.total);
        println!("  referenced: {}", stats.referenced);
        if self.dry_run {
            println!("  would remove: {}", stats.removed);
        } else {
            println!("  removed:    {}", stats.removed);
        }
        if stats.skipped > 0 {
            println!("  skipped:    {}", stats.skipped);
        }

        for filename in &stats.removed_list {
            println!("    - {filename}");
        }
        for error in &stats.errors {
            println!("  {} {error}", "!".red());
        }

        if self.dry_run && stats.removed > 0 {
            println!("Run without --dry-run to remove {} snapshot(s).", stats.removed);
        } else if stats.total == stats.referenced {
            println!("{} all snapshots are referenced", "✓".green());
        }
        Ok(())
    }
}
