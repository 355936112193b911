//! Authorization store.
//!
//! Keeps two views of the same relation in step:
//!
//! 1. the primary relation, user -> (shortened URL -> permission), owned by a
//!    [`RelationBackend`] and the only durable state;
//! 2. the [`ReverseIndex`], shortened URL -> users, rebuilt from (1) on open.
//!
//! For every (shortened URL, user) pair, the user is in the index entry for
//! the shortened URL exactly when the primary relation holds a record for it.
//!
//! Lock order is fixed: the primary relation lock is always taken before the
//! index lock. `LockPair` is the only way to reach either lock.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::Serialize;

use crate::backend::{BackendKind, MemoryRelation, RedbRelation, RelationBackend, RelationWrite};
use crate::config::StoreConfig;
use crate::context::OpContext;
use crate::error::{EntityKind, Result, StoreError};
use crate::permission::{
    Permission, ResourceBatch, ResourcePermissions, UserBatch, UserPermissions,
};
use crate::reverse_index::{ReverseIndex, UserSet};

/// Operations on authorization data, as consumed by the HTTP layer.
///
/// Every call is one transaction: on error, neither view has changed.
pub trait AuthorizationStore: Send + Sync {
    /// Merge each user's permissions into what they already hold. Shortened
    /// URLs not in the batch are left alone.
    fn append(&self, ctx: &OpContext, batch: UserBatch) -> Result<()>;

    /// Replace each user's permissions with exactly the given map.
    fn overwrite(&self, ctx: &OpContext, batch: UserBatch) -> Result<()>;

    /// Remove every user's record for the given shortened URLs. An empty slice
    /// removes all authorization data. Unknown shortened URLs are ignored.
    fn delete_shortened(&self, ctx: &OpContext, shortened_urls: &[String]) -> Result<()>;

    /// Remove the given users' records. An empty slice removes all
    /// authorization data. Unknown users are ignored.
    fn delete_users(&self, ctx: &OpContext, users: &[String]) -> Result<()>;

    /// Export the given users' permissions, or every user's if none are named.
    fn read_users(&self, ctx: &OpContext, users: &[String]) -> Result<UserBatch>;

    /// Export the permissions held over the given shortened URLs, or over
    /// every shortened URL if none are named.
    fn read_shortened(&self, ctx: &OpContext, shortened_urls: &[String]) -> Result<ResourceBatch>;

    /// Release the backend.
    fn close(&self, ctx: &OpContext) -> Result<()>;
}

/// Both locks, always acquired primary first.
struct LockPair {
    relation: RwLock<Box<dyn RelationBackend>>,
    index: RwLock<ReverseIndex>,
}

// Fields drop in declaration order, so the index lock is released first.
struct WriteGuard<'a> {
    index: RwLockWriteGuard<'a, ReverseIndex>,
    relation: RwLockWriteGuard<'a, Box<dyn RelationBackend>>,
}

struct ReadGuard<'a> {
    index: RwLockReadGuard<'a, ReverseIndex>,
    relation: RwLockReadGuard<'a, Box<dyn RelationBackend>>,
}

impl LockPair {
    fn write(&self) -> WriteGuard<'_> {
        let relation = self.relation.write();
        let index = self.index.write();
        WriteGuard { index, relation }
    }

    fn read(&self) -> ReadGuard<'_> {
        let relation = self.relation.read();
        let index = self.index.read();
        ReadGuard { index, relation }
    }

    /// Shared access to the primary relation alone.
    fn read_relation(&self) -> RwLockReadGuard<'_, Box<dyn RelationBackend>> {
        self.relation.read()
    }
}

/// Counts reported by [`AuthStore::stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub backend: BackendKind,
    pub users: usize,
    pub shortened_urls: usize,
    pub grants: usize,
}

/// The authorization store over any [`RelationBackend`].
pub struct AuthStore {
    locks: LockPair,
    kind: BackendKind,
}

fn row_write(user: String, permissions: UserPermissions) -> RelationWrite {
    if permissions.is_empty() {
        RelationWrite::Remove { user }
    } else {
        RelationWrite::Put { user, permissions }
    }
}

fn index_pair(pairs: &mut HashMap<String, UserSet>, shortened: &str, user: &str) {
    pairs
        .entry(shortened.to_string())
        .or_default()
        .insert(user);
}

impl AuthStore {
    /// A store whose contents live only in this process.
    pub fn in_memory() -> Self {
        Self::from_parts(Box::new(MemoryRelation::new()), ReverseIndex::new())
    }

    /// Open a durable store at `path`, rebuilding the index from disk.
    pub fn open_redb(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_backend(Box::new(RedbRelation::open(path)?))
    }

    /// Build the store the config asks for.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        match config.backend {
            BackendKind::Memory => Ok(Self::in_memory()),
            BackendKind::Redb => Self::open_redb(config.resolved_path()?),
        }
    }

    /// Wrap an existing backend. The index is derived from its current rows
    /// before the store is returned.
    pub fn with_backend(backend: Box<dyn RelationBackend>) -> Result<Self> {
        let index = ReverseIndex::from_relation(backend.scan()?);
        tracing::info!(
            "Rebuilt authorization index with {} shortened URLs from {} backend",
            index.resource_count(),
            backend.kind()
        );
        Ok(Self::from_parts(backend, index))
    }

    fn from_parts(backend: Box<dyn RelationBackend>, index: ReverseIndex) -> Self {
        let kind = backend.kind();
        Self {
            locks: LockPair {
                relation: RwLock::new(backend),
                index: RwLock::new(index),
            },
            kind,
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    /// Whether `user` holds a record satisfying `needed` for every named
    /// shortened URL. With none named, every shortened URL the user holds is
    /// checked. A user without records is never authorized.
    pub fn authorize(
        &self,
        ctx: &OpContext,
        user: &str,
        shortened_urls: &[String],
        needed: &Permission,
    ) -> Result<bool> {
        let relation = self.locks.read_relation();
        ctx.check("authorize")?;

        let Some(row) = relation.load(user)? else {
            return Ok(false);
        };

        if shortened_urls.is_empty() {
            return Ok(!row.is_empty() && row.values().all(|held| held.satisfies(needed)));
        }
        Ok(shortened_urls
            .iter()
            .all(|shortened| row.get(shortened).is_some_and(|held| held.satisfies(needed))))
    }

    /// Check the index against a fresh derivation from the primary relation.
    pub fn verify(&self, ctx: &OpContext) -> Result<()> {
        let guard = self.locks.read();
        ctx.check("verify")?;

        let derived = ReverseIndex::from_relation(guard.relation.scan()?);

        for (shortened, users) in derived.iter() {
            let indexed = guard.index.users_of(shortened);
            for user in users {
                if !indexed.is_some_and(|set| set.contains(user)) {
                    return Err(StoreError::invariant(
                        shortened.as_str(),
                        user.as_str(),
                        "record missing from reverse index",
                    ));
                }
            }
        }

        for (shortened, users) in guard.index.iter() {
            let stored = derived.users_of(shortened);
            for user in users {
                if !stored.is_some_and(|set| set.contains(user)) {
                    return Err(StoreError::invariant(
                        shortened.as_str(),
                        user.as_str(),
                        "indexed without a primary record",
                    ));
                }
            }
        }

        Ok(())
    }

    /// Replace the index with one derived from the primary relation.
    /// Returns the number of shortened URLs indexed.
    pub fn rebuild_index(&self, ctx: &OpContext) -> Result<usize> {
        let mut guard = self.locks.write();
        ctx.check("rebuild_index")?;

        *guard.index = ReverseIndex::from_relation(guard.relation.scan()?);
        let count = guard.index.resource_count();
        tracing::info!("Rebuilt authorization index with {} shortened URLs", count);
        Ok(count)
    }

    pub fn stats(&self, ctx: &OpContext) -> Result<StoreStats> {
        let guard = self.locks.read();
        ctx.check("stats")?;

        Ok(StoreStats {
            backend: self.kind,
            users: guard.relation.scan()?.len(),
            shortened_urls: guard.index.resource_count(),
            grants: guard.index.pair_count(),
        })
    }

    fn wipe(guard: &mut WriteGuard<'_>, ctx: &OpContext) -> Result<()> {
        guard.relation.commit(ctx, vec![RelationWrite::Clear])?;
        guard.index.clear();
        tracing::debug!("Deleted all authorization data");
        Ok(())
    }
}

impl AuthorizationStore for AuthStore {
    fn append(&self, ctx: &OpContext, batch: UserBatch) -> Result<()> {
        let mut guard = self.locks.write();
        ctx.check("append")?;

        let mut added = HashMap::new();
        let mut writes = Vec::with_capacity(batch.len());
        for (user, permissions) in batch {
            if permissions.is_empty() {
                continue;
            }
            for shortened in permissions.keys() {
                index_pair(&mut added, shortened, &user);
            }

            let mut row = guard.relation.load(&user)?.unwrap_or_default();
            row.extend(permissions);
            writes.push(RelationWrite::Put {
                user,
                permissions: row,
            });
        }

        let count = writes.len();
        guard.relation.commit(ctx, writes)?;
        guard.index.add(added);
        tracing::debug!("Appended authorization data for {} users", count);
        Ok(())
    }

    fn overwrite(&self, ctx: &OpContext, batch: UserBatch) -> Result<()> {
        let mut guard = self.locks.write();
        ctx.check("overwrite")?;

        let mut added = HashMap::new();
        let mut removed = HashMap::new();
        let mut writes = Vec::with_capacity(batch.len());
        for (user, permissions) in batch {
            // Diff against what is stored now, not the incoming row.
            if let Some(previous) = guard.relation.load(&user)? {
                for shortened in previous.keys() {
                    if !permissions.contains_key(shortened) {
                        index_pair(&mut removed, shortened, &user);
                    }
                }
            }
            for shortened in permissions.keys() {
                index_pair(&mut added, shortened, &user);
            }
            writes.push(row_write(user, permissions));
        }

        let count = writes.len();
        guard.relation.commit(ctx, writes)?;
        guard.index.remove(removed);
        guard.index.add(added);
        tracing::debug!("Overwrote authorization data for {} users", count);
        Ok(())
    }

    fn delete_shortened(&self, ctx: &OpContext, shortened_urls: &[String]) -> Result<()> {
        let mut guard = self.locks.write();
        ctx.check("delete_shortened")?;

        if shortened_urls.is_empty() {
            return Self::wipe(&mut guard, ctx);
        }

        // The index gives the affected users without touching every row.
        let mut dropped: HashMap<String, UserSet> = HashMap::new();
        let mut affected: HashMap<String, Vec<String>> = HashMap::new();
        for shortened in shortened_urls {
            if dropped.contains_key(shortened) {
                continue;
            }
            let users = match guard.index.read(std::slice::from_ref(shortened)) {
                Ok(mut found) => found.remove(shortened).unwrap_or_default(),
                Err(err) if err.is_not_found() => continue,
                Err(err) => return Err(err),
            };
            for user in users {
                affected.entry(user).or_default().push(shortened.clone());
            }
            dropped.insert(shortened.clone(), UserSet::new());
        }

        let mut writes = Vec::with_capacity(affected.len());
        for (user, lost) in affected {
            let Some(mut row) = guard.relation.load(&user)? else {
                return Err(StoreError::invariant(
                    lost[0].as_str(),
                    user.as_str(),
                    "indexed user has no primary record",
                ));
            };
            for shortened in &lost {
                if row.remove(shortened).is_none() {
                    return Err(StoreError::invariant(
                        shortened.as_str(),
                        user.as_str(),
                        "indexed pair missing from primary relation",
                    ));
                }
            }
            writes.push(row_write(user, row));
        }

        let count = dropped.len();
        guard.relation.commit(ctx, writes)?;
        guard.index.remove(dropped);
        tracing::debug!("Deleted authorization data for {} shortened URLs", count);
        Ok(())
    }

    fn delete_users(&self, ctx: &OpContext, users: &[String]) -> Result<()> {
        let mut guard = self.locks.write();
        ctx.check("delete_users")?;

        if users.is_empty() {
            return Self::wipe(&mut guard, ctx);
        }

        let mut removed = HashMap::new();
        let mut writes = Vec::with_capacity(users.len());
        for user in users {
            let Some(previous) = guard.relation.load(user)? else {
                continue;
            };
            for shortened in previous.keys() {
                index_pair(&mut removed, shortened, user);
            }
            writes.push(RelationWrite::Remove { user: user.clone() });
        }

        let count = writes.len();
        guard.relation.commit(ctx, writes)?;
        guard.index.remove(removed);
        tracing::debug!("Deleted authorization data for {} users", count);
        Ok(())
    }

    fn read_users(&self, ctx: &OpContext, users: &[String]) -> Result<UserBatch> {
        let relation = self.locks.read_relation();
        ctx.check("read_users")?;

        if users.is_empty() {
            return Ok(relation.scan()?.into_iter().collect());
        }

        let mut found = UserBatch::with_capacity(users.len());
        for user in users {
            let row = relation
                .load(user)?
                .ok_or_else(|| StoreError::not_found(EntityKind::User, user.as_str()))?;
            found.insert(user.clone(), row);
        }
        Ok(found)
    }

    fn read_shortened(&self, ctx: &OpContext, shortened_urls: &[String]) -> Result<ResourceBatch> {
        let guard = self.locks.read();
        ctx.check("read_shortened")?;

        let candidates = guard.index.read(shortened_urls)?;

        // Rows are loaded at most once per call; a full export scans instead.
        let mut rows: HashMap<String, UserPermissions> = if shortened_urls.is_empty() {
            guard.relation.scan()?.into_iter().collect()
        } else {
            HashMap::new()
        };

        let mut found = ResourceBatch::with_capacity(candidates.len());
        for (shortened, users) in candidates {
            let mut holders = ResourcePermissions::with_capacity(users.len());
            for user in users {
                if !rows.contains_key(&user) {
                    let row = guard.relation.load(&user)?.ok_or_else(|| {
                        StoreError::invariant(
                            shortened.as_str(),
                            user.as_str(),
                            "indexed user has no primary record",
                        )
                    })?;
                    rows.insert(user.clone(), row);
                }

                let permission = rows
                    .get(&user)
                    .and_then(|row| row.get(&shortened))
                    .copied()
                    .ok_or_else(|| {
                        StoreError::invariant(
                            shortened.as_str(),
                            user.as_str(),
                            "indexed pair missing from primary relation",
                        )
                    })?;
                holders.insert(user, permission);
            }
            found.insert(shortened, holders);
        }
        Ok(found)
    }

    fn close(&self, ctx: &OpContext) -> Result<()> {
        let mut guard = self.locks.write();
        ctx.check("close")?;

        guard.relation.close()?;
        guard.index.clear();
        tracing::info!("Closed {} authorization store", self.kind);
        Ok(())
    }
}
