//! Storage error types.

use std::fmt;

use thiserror::Error;

/// Which side of the relation a missing key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Shortened,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => f.write_str("user"),
            EntityKind::Shortened => f.write_str("shortened URL"),
        }
    }
}

/// Authorization store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A named user or shortened URL has no authorization data.
    #[error("{kind} not found: {key}")]
    NotFound { kind: EntityKind, key: String },

    /// The reverse index and the primary relation disagree.
    ///
    /// Only a defect inside this crate can produce this; callers should alarm
    /// on it instead of treating it as missing data.
    #[error("authorization index out of sync for {resource}@{user}: {detail}")]
    InvariantViolation {
        resource: String,
        user: String,
        detail: String,
    },

    /// Underlying database failure.
    #[error("storage failure during {operation} (key: {}): {source}", .key.as_deref().unwrap_or("*"))]
    Storage {
        operation: &'static str,
        key: Option<String>,
        #[source]
        source: redb::Error,
    },

    /// A persisted record could not be encoded or decoded.
    #[error("serialization failure during {operation} (key: {key}): {source}")]
    Serialization {
        operation: &'static str,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{operation} was cancelled")]
    Cancelled { operation: &'static str },

    #[error("{operation} exceeded its deadline")]
    DeadlineExceeded { operation: &'static str },

    #[error("authorization store is closed")]
    Closed,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StoreError {
    pub(crate) fn not_found(kind: EntityKind, key: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub(crate) fn invariant(
        resource: impl Into<String>,
        user: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        let err = StoreError::InvariantViolation {
            resource: resource.into(),
            user: user.into(),
            detail: detail.into(),
        };
        tracing::error!("{err}");
        err
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, StoreError::InvariantViolation { .. })
    }

    /// True for I/O and (de)serialization failures of a durable backend.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            StoreError::Storage { .. } | StoreError::Serialization { .. }
        )
    }
}

/// Build a `map_err` adapter that wraps any redb error with its operation and key.
pub(crate) fn storage_err<E>(
    operation: &'static str,
    key: Option<&str>,
) -> impl FnOnce(E) -> StoreError
where
    E: Into<redb::Error>,
{
    let key = key.map(str::to_string);
    move |source| StoreError::Storage {
        operation,
        key,
        source: source.into(),
    }
}

/// Result type alias for authorization store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
