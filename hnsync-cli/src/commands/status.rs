//! `hnsync status` — staged items, staleness and ledger summary.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use hnsync_engine::{diff, ActionKind, WorkingTree};
use hnsync_state::stage::{self, Operation};

use super::current_project;
use crate::commands::plan::working_ledger;

/// Arguments for `hnsync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone)]
struct StagedRow {
    path: String,
    operation: String,
    planned: String,
    reason: String,
    stale: bool,
    staged_age: String,
}

#[derive(Serialize)]
struct StatusJson {
    summary: SummaryJson,
    staged: Vec<StagedRowJson>,
}

#[derive(Serialize)]
struct SummaryJson {
    articles: usize,
    series: usize,
    staged: usize,
    stale: usize,
}

#[derive(Serialize)]
struct StagedRowJson {
    path: String,
    operation: String,
    planned: String,
    reason: String,
    stale: bool,
    staged_age: String,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "path")]
    path: String,
    #[tabled(rename = "operation")]
    operation: String,
    #[tabled(rename = "planned")]
    planned: String,
    #[tabled(rename = "reason")]
    reason: String,
    #[tabled(rename = "staged")]
    staged: String,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let project = current_project()?;
        let working = working_ledger(&project)?;
        let st = stage::load(&project)?;
        let tree = WorkingTree::capture(&project, &working, &st)?;
        let plan = diff(&working, &st, &tree);

        let mut rows = Vec::new();
        for action in &plan {
            let item = st.items.get(&action.path);
            let stale = item.map(|it| stage::is_stale(&project, it)).unwrap_or(false);
            rows.push(StagedRow {
                path: action.path.clone(),
                operation: item
                    .map(|it| match it.operation {
                        Operation::Modify => "modify".to_owned(),
                        Operation::Delete => "delete".to_owned(),
                    })
                    .unwrap_or_default(),
                planned: planned_key(action.kind).to_owned(),
                reason: action.reason.clone(),
                stale,
                staged_age: item
                    .map(|it| format_age(Utc::now().signed_duration_since(it.staged_at)))
                    .unwrap_or_else(|| "-".to_owned()),
            });
        }

        let stale_count = rows.iter().filter(|r| r.stale).count();

        if self.json {
            let payload = StatusJson {
                summary: SummaryJson {
                    articles: working.articles.len(),
                    series: working.series.len(),
                    staged: rows.len(),
                    stale: stale_count,
                },
                staged: rows
                    .into_iter()
                    .map(|row| StagedRowJson {
                        path: row.path,
                        operation: row.operation,
                        planned: row.planned,
                        reason: row.reason,
                        stale: row.stale,
                        staged_age: row.staged_age,
                    })
                    .collect(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize status")?
            );
            return Ok(());
        }

        println!(
            "hnsync v{} | publication '{}' | {} article(s) | {} series | {} staged",
            env!("CARGO_PKG_VERSION"),
            working.publication.slug,
            working.articles.len(),
            working.series.len(),
            rows.len(),
        );

        if rows.is_empty() {
            println!("Nothing staged. Stage files with `hnsync stage add <path>`.");
            return Ok(());
        }

        let table_rows: Vec<StatusTableRow> = rows
            .iter()
            .map(|row| StatusTableRow {
                path: row.path.clone(),
                operation: row.operation.clone(),
                planned: if row.stale {
                    format!("{} {}", row.planned, "(stale)".yellow())
                } else {
                    row.planned.clone()
                },
                reason: row.reason.clone(),
                staged: row.staged_age.clone(),
            })
            .collect();
        let mut table = Table::new(table_rows);
        table.with(Style::rounded());
        println!("{table}");

        if stale_count > 0 {
            println!(
                "{}",
                format!("{stale_count} staged item(s) changed on disk — re-stage or apply --force")
                    .yellow()
            );
        }
        Ok(())
    }
}

fn planned_key(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Create => "create",
        ActionKind::Update => "update",
        ActionKind::Delete => "delete",
        ActionKind::Skip => "skip",
    }
}

fn format_age(age: chrono::Duration) -> String {
    let seconds = age.num_seconds().max(0) as u64;
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
