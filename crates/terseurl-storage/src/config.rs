//! Authorization store configuration.
//!
//! Loaded from `~/.terseurl/authorization.toml` when present, with
//! environment overrides applied on top:
//!
//! ```toml
//! backend = "redb"
//! path = "/var/lib/terseurl/authorization.redb"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;
use crate::error::{Result, StoreError};
use crate::paths;

const BACKEND_ENV: &str = "TERSEURL_AUTHZ_BACKEND";
const PATH_ENV: &str = "TERSEURL_AUTHZ_PATH";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: BackendKind,
    /// Database file for the redb backend. Defaults to
    /// `~/.terseurl/authorization.redb`.
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn memory() -> Self {
        Self::default()
    }

    pub fn redb(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendKind::Redb,
            path: Some(path.into()),
        }
    }

    /// Load from the default config path, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_path(paths::default_config_path()?)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file. A missing file yields the default config.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No store config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|err| StoreError::Config(format!("failed to read {}: {err}", path.display())))?;
        let config: Self = toml::from_str(&content)
            .map_err(|err| StoreError::Config(format!("failed to parse {}: {err}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TERSEURL_AUTHZ_BACKEND` and `TERSEURL_AUTHZ_PATH` when set.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(std::env::var(BACKEND_ENV).ok(), std::env::var(PATH_ENV).ok())
    }

    /// Apply explicit overrides; blank values are ignored.
    pub fn apply_overrides(&mut self, backend: Option<String>, path: Option<String>) -> Result<()> {
        if let Some(backend) = backend.filter(|value| !value.trim().is_empty()) {
            self.backend = backend.parse()?;
        }
        if let Some(path) = path.filter(|value| !value.trim().is_empty()) {
            self.path = Some(PathBuf::from(path));
        }
        self.validate()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.path
            && path.as_os_str().is_empty()
        {
            return Err(StoreError::Config("database path must not be empty".to_string()));
        }

        if self.backend == BackendKind::Memory && self.path.is_some() {
            tracing::warn!("Database path is ignored by the memory backend");
        }

        Ok(())
    }

    /// Database file the redb backend should open.
    pub fn resolved_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => {
                paths::ensure_terseurl_dir()?;
                paths::default_db_path()
            }
        }
    }
}
