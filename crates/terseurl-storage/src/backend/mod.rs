//! Primary relation backends.
//!
//! A backend owns the user -> (shortened URL -> permission) relation and
//! nothing else. Locking and the reverse index live in the store, so a
//! backend only needs to read rows and apply write batches atomically.

mod durable;
mod memory;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::OpContext;
use crate::error::{Result, StoreError};
use crate::permission::UserPermissions;

pub use durable::RedbRelation;
pub use memory::MemoryRelation;

/// Which backend a store runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    Redb,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => f.write_str("memory"),
            BackendKind::Redb => f.write_str("redb"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "redb" => Ok(BackendKind::Redb),
            other => Err(StoreError::Config(format!("unknown backend: {other}"))),
        }
    }
}

/// One change to the primary relation.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationWrite {
    /// Replace the user's whole row.
    Put {
        user: String,
        permissions: UserPermissions,
    },
    Remove {
        user: String,
    },
    /// Drop every row.
    Clear,
}

/// Storage for the primary relation.
pub trait RelationBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Load one user's row.
    fn load(&self, user: &str) -> Result<Option<UserPermissions>>;

    /// Load every row.
    fn scan(&self) -> Result<Vec<(String, UserPermissions)>>;

    /// Apply all writes, in order, as a single unit. On error none of them
    /// may be visible.
    fn commit(&mut self, ctx: &OpContext, writes: Vec<RelationWrite>) -> Result<()>;

    /// Release the underlying storage.
    fn close(&mut self) -> Result<()>;
}
