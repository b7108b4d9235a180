pub mod apply;
pub mod gc;
pub mod import;
pub mod init;
pub mod plan;
pub mod series;
pub mod stage;
pub mod status;
pub mod validate;

use anyhow::{Context, Result};
use hnsync_core::Project;

/// Locate the project from the current directory.
pub(crate) fn current_project() -> Result<Project> {
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    Ok(Project::discover(&cwd)?)
}
