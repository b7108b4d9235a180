//! Token resolution and home-config persistence.
//!
//! Resolution order: explicit `--token` flag, then `$HASHNODE_TOKEN`, then
//! the home config at `~/.hnsync/config.yml` (written by
//! `init --save-token`, mode 0600).

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct HomeConfig {
    token: String,
}

fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(".hnsync").join("config.yml"))
}

/// Resolve the bearer token for remote calls.
pub fn resolve(flag: Option<String>) -> Result<String> {
    if let Some(token) = flag {
        if !token.trim().is_empty() {
            return Ok(token);
        }
    }
    if let Ok(token) = hnsync_gateway::token_from_env() {
        return Ok(token);
    }
    let path = config_path()?;
    let contents = std::fs::read_to_string(&path).with_context(|| {
        format!(
            "no API token found; set ${}, pass --token, or run `hnsync init --save-token`",
            hnsync_gateway::TOKEN_ENV_VAR
        )
    })?;
    let config: HomeConfig = serde_yaml::from_str(&contents)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    if config.token.trim().is_empty() {
        anyhow::bail!("config file {} has an empty token", path.display());
    }
    Ok(config.token)
}

/// Persist the token to the home config with owner-only permissions.
pub fn save(token: &str) -> Result<()> {
    let path = config_path()?;
    let dir = path.parent().context("config path has no parent")?;
    std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    set_dir_permissions(dir)?;

    let yaml = serde_yaml::to_string(&HomeConfig {
        token: token.to_owned(),
    })?;
    std::fs::write(&path, yaml).with_context(|| format!("cannot write {}", path.display()))?;
    set_file_permissions(&path)?;
    Ok(())
}

#[cfg(unix)]
fn set_dir_permissions(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &std::path::Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &std::path::Path) -> Result<()> {
    Ok(())
}
