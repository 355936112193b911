//! Path utilities for TerseURL directory resolution.

use std::path::PathBuf;

use crate::error::{Result, StoreError};

const TERSEURL_DIR: &str = ".terseurl";
const CONFIG_FILE: &str = "authorization.toml";
const DB_FILE: &str = "authorization.redb";

/// Environment variable to override the TerseURL directory.
const TERSEURL_DIR_ENV: &str = "TERSEURL_DIR";

/// Resolve the TerseURL data directory.
/// Priority: TERSEURL_DIR env var > ~/.terseurl/
pub fn resolve_terseurl_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(TERSEURL_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(TERSEURL_DIR))
        .ok_or_else(|| StoreError::Config("failed to determine home directory".to_string()))
}

/// Ensure the TerseURL directory exists and return its path.
pub fn ensure_terseurl_dir() -> Result<PathBuf> {
    let dir = resolve_terseurl_dir()?;
    std::fs::create_dir_all(&dir).map_err(|err| {
        StoreError::Config(format!("failed to create {}: {err}", dir.display()))
    })?;
    Ok(dir)
}

/// Get the store config path: ~/.terseurl/authorization.toml
pub fn default_config_path() -> Result<PathBuf> {
    Ok(resolve_terseurl_dir()?.join(CONFIG_FILE))
}

/// Get the database path: ~/.terseurl/authorization.redb
pub fn default_db_path() -> Result<PathBuf> {
    Ok(resolve_terseurl_dir()?.join(DB_FILE))
}
