//! hnsync — content-as-code publishing for Hashnode.
//!
//! # Usage
//!
//! ```text
//! hnsync init [--publication <id|slug>] [--token <t>] [--save-token]
//! hnsync stage add <path>...
//! hnsync stage rm <path>
//! hnsync stage reset <path>
//! hnsync stage list
//! hnsync stage diff [<path>]
//! hnsync plan [--short]
//! hnsync apply [--yes] [--force] [--dry-run]
//! hnsync status [--json]
//! hnsync series create --name <name>
//! hnsync import
//! hnsync gc [--dry-run] [--verify]
//! hnsync validate
//! ```

mod commands;
mod token;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    apply::ApplyArgs, gc::GcArgs, import::ImportArgs, init::InitArgs, plan::PlanArgs,
    series::SeriesCommand, stage::StageCommand, status::StatusArgs, validate::ValidateArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "hnsync",
    version,
    about = "Treat a directory of Markdown files as the source of truth for a Hashnode publication",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bind this repository to a Hashnode publication.
    Init(InitArgs),

    /// Manage the staging area (what the next apply will ship).
    Stage {
        #[command(subcommand)]
        command: StageCommand,
    },

    /// Show the plan the next apply would execute.
    Plan(PlanArgs),

    /// Commit staged changes to the remote publication.
    Apply(ApplyArgs),

    /// Show staged items, staleness and ledger summary.
    Status(StatusArgs),

    /// Manage series.
    Series {
        #[command(subcommand)]
        command: SeriesCommand,
    },

    /// Import remote posts and series into files and the ledger.
    Import(ImportArgs),

    /// Garbage collect unreferenced snapshots.
    Gc(GcArgs),

    /// Check snapshot integrity and ledger consistency.
    Validate(ValidateArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Stage { command } => commands::stage::run(command),
        Commands::Plan(args) => args.run(),
        Commands::Apply(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Series { command } => commands::series::run(command),
        Commands::Import(args) => args.run(),
        Commands::Gc(args) => args.run(),
        Commands::Validate(args) => args.run(),
    }
}
