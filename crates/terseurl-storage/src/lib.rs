//! TerseURL Storage - authorization index store
//!
//! Tracks which users may do what with each shortened URL, and answers the
//! question from both directions: "which shortened URLs can this user touch"
//! and "which users can touch this shortened URL".
//!
//! # Architecture
//!
//! The user -> (shortened URL -> permission) relation is the only state a
//! backend stores. The shortened URL -> users direction is a [`ReverseIndex`]
//! kept in memory by [`AuthStore`], updated under the same locks as the
//! relation and rebuilt from it whenever a store is opened.
//!
//! # Backends
//!
//! - `memory` - volatile, for tests and single-process deployments
//! - `redb` - one `authorization` table row per user

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod paths;
pub mod permission;
pub mod reverse_index;
pub mod store;

pub use backend::{BackendKind, MemoryRelation, RedbRelation, RelationBackend, RelationWrite};
pub use config::StoreConfig;
pub use context::OpContext;
pub use error::{EntityKind, Result, StoreError};
pub use permission::{Permission, ResourceBatch, ResourcePermissions, UserBatch, UserPermissions};
pub use reverse_index::{ReverseIndex, UserSet};
pub use store::{AuthStore, AuthorizationStore, StoreStats};

pub use tokio_util::sync::CancellationToken;
