//! `hnsync import` — bootstrap local files and the ledger from the remote.
//!
//! Pages through the publication (the API caps pages at 50 posts), refreshes
//! the series table, writes Markdown files for posts the ledger does not know
//! and records every post's identity and content checksum.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use hnsync_core::ledger::{self, PublicationMeta};
use hnsync_core::types::ArticleRecord;
use hnsync_core::{sha256_hex, slug::slugify, Project};
use hnsync_gateway::{Gateway, HttpGateway, MAX_PAGE_SIZE};
use hnsync_state::ProjectLock;

use crate::token;

/// Arguments for `hnsync import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// API token (overrides $HASHNODE_TOKEN and the home config).
    #[arg(long)]
    pub token: Option<String>,
}

impl ImportArgs {
    pub fn run(self) -> Result<()> {
        let project = super::current_project()?;
        let _lock = ProjectLock::acquire(&project)?;

        let token = token::resolve(self.token.clone())?;
        let gateway = HttpGateway::new(token)?;

        let meta = PublicationMeta::load(&project)?;
        let mut working = match ledger::load(&project)? {
            Some(loaded) => {
                ledger::validate_against(&loaded, &meta)?;
                loaded
            }
            None => ledger::from_publication(&meta),
        };

        println!("Fetching publication data (paginated)...");
        let mut posts = Vec::new();
        let mut series = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let page = gateway.publication_page(
                &meta.publication_id,
                MAX_PAGE_SIZE,
                after.as_deref(),
            )?;
            println!(
                "  fetched page: {} post(s) (has_next={})",
                page.posts.len(),
                page.has_next_page
            );
            if series.is_empty() {
                series = page.series;
            }
            posts.extend(page.posts);
            if !page.has_next_page {
                break;
            }
            after = page.end_cursor;
        }
        println!("Total posts fetched: {}", posts.len());

        // The API is the source of truth for series structure.
        for remote in series {
            working.set_series(hnsync_core::SeriesRecord {
                id: remote.id,
                name: remote.name,
                slug: remote.slug,
                posts: None,
            });
        }

        // Existing id → path mappings survive; everything else gets a file.
        let mut id_to_path = std::collections::HashMap::new();
        for (path, article) in &working.articles {
            if let Some(id) = &article.id {
                id_to_path.insert(id.clone(), path.clone());
            }
        }

        let mut written = 0usize;
        let mut refreshed = 0usize;
        for post in posts {
            let checksum = sha256_hex(post.markdown.as_bytes());
            let path = match id_to_path.get(&post.id) {
                Some(path) => path.clone(),
                None => fresh_path(&project, &post.slug, &post.title)?,
            };

            // New posts get a file; a known path whose file went missing is
            // restored from remote. Present files are left untouched.
            let abs = project.resolve(&path);
            if abs.exists() {
                refreshed += 1;
            } else {
                std::fs::write(&abs, post.markdown.as_bytes())
                    .with_context(|| format!("cannot write {path}"))?;
                written += 1;
            }

            working.set_article(
                &path,
                ArticleRecord {
                    id: Some(post.id),
                    checksum,
                    slug: Some(post.slug),
                    title: Some(post.title),
                },
            );
        }

        ledger::save(&project, &working)?;
        println!(
            "{} import complete: {written} file(s) written, {refreshed} entry(ies) refreshed, {} series",
            "✓".green(),
            working.series.len()
        );
        Ok(())
    }
}

/// A repository path for a new post: `{slug}.md`, with `-N` suffixes on
/// collision.
fn fresh_path(project: &Project, slug: &str, title: &str) -> Result<String> {
    let base = if slug.is_empty() {
        slugify(title)
    } else {
        slug.to_owned()
    };
    let base = if base.is_empty() { "post".to_owned() } else { base };

    let mut candidate = format!("{base}.md");
    let mut n = 1u32;
    while project.resolve(&candidate).exists() {
        candidate = format!("{base}-{n}.md");
        n += 1;
        if n > 1000 {
            anyhow::bail!("too many filename collisions for {base}");
        }
    }
    let abs: PathBuf = project.resolve(&candidate);
    if let Some(parent) = abs.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("cannot create {}", parent.display()))?;
    }
    Ok(candidate)
}
