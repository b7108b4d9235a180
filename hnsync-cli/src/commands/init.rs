//! `hnsync init` — bind the current directory to a Hashnode publication.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use hnsync_core::ledger::{self, PublicationMeta};
use hnsync_core::Project;
use hnsync_gateway::{Gateway, HttpGateway};

use crate::token;

/// Arguments for `hnsync init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Publication to bind, by id or slug. May be omitted when the account
    /// has exactly one publication.
    #[arg(long)]
    pub publication: Option<String>,

    /// API token (overrides $HASHNODE_TOKEN and the home config).
    #[arg(long)]
    pub token: Option<String>,

    /// Persist the token to ~/.hnsync/config.yml (mode 0600).
    #[arg(long)]
    pub save_token: bool,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let cwd = std::env::current_dir().context("cannot determine current directory")?;
        let project = Project::open(&cwd);
        if project.publication_path().exists() {
            bail!(
                "repository already initialized: {} exists",
                project.publication_path().display()
            );
        }

        let token = token::resolve(self.token.clone())?;
        let gateway = HttpGateway::new(token.clone())?;

        println!("Verifying token and fetching publications...");
        let identity = gateway.me().context("token verification failed")?;
        if identity.publications.is_empty() {
            bail!("no publications found for @{}", identity.username);
        }

        let publication = match self.publication.as_deref() {
            Some(wanted) => identity
                .publications
                .iter()
                .find(|p| p.id.0 == wanted || p.slug == wanted)
                .with_context(|| {
                    let known: Vec<String> = identity
                        .publications
                        .iter()
                        .map(|p| format!("{} ({})", p.slug, p.id))
                        .collect();
                    format!(
                        "publication '{wanted}' not found; available: {}",
                        known.join(", ")
                    )
                })?,
            None if identity.publications.len() == 1 => &identity.publications[0],
            None => {
                let known: Vec<String> = identity
                    .publications
                    .iter()
                    .map(|p| format!("{} ({})", p.slug, p.id))
                    .collect();
                bail!(
                    "account has {} publications; pick one with --publication: {}",
                    identity.publications.len(),
                    known.join(", ")
                );
            }
        };

        let meta = PublicationMeta {
            publication_id: publication.id.clone(),
            publication_slug: publication.slug.clone(),
            title: Some(publication.title.clone()),
            owner_username: Some(identity.username.clone()),
        };
        meta.save(&project)?;

        // Seed an empty ledger unless one is already committed.
        if ledger::load(&project)?.is_none() {
            ledger::save(&project, &ledger::from_publication(&meta))?;
        }

        if self.save_token {
            token::save(&token)?;
            println!("Token saved to ~/.hnsync/config.yml");
        }

        println!(
            "{} Initialized for '{}' as @{}",
            "✓".green(),
            publication.title,
            identity.username
        );
        println!("  Publication metadata: {}", project.publication_path().display());
        println!("  Ledger: {}", project.ledger_path().display());
        println!("  Files under {} are CLI-owned; do not edit them by hand.", project.state_dir().display());
        Ok(())
    }
}
