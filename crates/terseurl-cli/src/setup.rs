//! CLI setup module
//!
//! Resolves the store configuration and opens the authorization store.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use terseurl_storage::{AuthStore, BackendKind, OpContext, StoreConfig};

/// Config file values, overridden by `--backend` and `--db-path`.
/// Without `--config`, the default file and `TERSEURL_AUTHZ_*` variables apply.
pub fn load_config(
    config_path: Option<&Path>,
    backend: Option<String>,
    db_path: Option<String>,
) -> Result<StoreConfig> {
    let mut config = match config_path {
        Some(path) => StoreConfig::load_from_path(path)?,
        None => StoreConfig::load()?,
    };
    config.apply_overrides(backend, db_path)?;
    Ok(config)
}

pub fn open_store(config: &StoreConfig) -> Result<AuthStore> {
    if config.backend == BackendKind::Memory {
        tracing::warn!("Using the memory backend, changes are discarded when the command exits");
    }
    Ok(AuthStore::from_config(config)?)
}

pub fn op_context(timeout_secs: Option<u64>) -> OpContext {
    match timeout_secs {
        Some(secs) => OpContext::with_timeout(Duration::from_secs(secs)),
        None => OpContext::background(),
    }
}
