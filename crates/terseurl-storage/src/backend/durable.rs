//! Durable primary relation backed by redb.
//!
//! One row per user in the `authorization` table. The value is the JSON
//! encoding of that user's shortened URL -> permission map.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};

use super::{BackendKind, RelationBackend, RelationWrite};
use crate::context::OpContext;
use crate::error::{Result, StoreError, storage_err};
use crate::permission::UserPermissions;

const AUTHORIZATION_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("authorization");

pub struct RedbRelation {
    db: Option<Arc<Database>>,
}

impl RedbRelation {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(storage_err("open", path.to_str()))?;
        tracing::info!("Opened authorization database at {}", path.display());
        Self::new(Arc::new(db))
    }

    /// Use an already open database, creating the table if needed.
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write().map_err(storage_err("create_table", None))?;
        write_txn
            .open_table(AUTHORIZATION_TABLE)
            .map_err(storage_err("create_table", None))?;
        write_txn.commit().map_err(storage_err("create_table", None))?;

        Ok(Self { db: Some(db) })
    }

    fn db(&self) -> Result<&Arc<Database>> {
        self.db.as_ref().ok_or(StoreError::Closed)
    }
}

fn decode(operation: &'static str, user: &str, bytes: &[u8]) -> Result<UserPermissions> {
    serde_json::from_slice(bytes).map_err(|source| StoreError::Serialization {
        operation,
        key: user.to_string(),
        source,
    })
}

fn encode(user: &str, permissions: &UserPermissions) -> Result<Vec<u8>> {
    serde_json::to_vec(permissions).map_err(|source| StoreError::Serialization {
        operation: "encode",
        key: user.to_string(),
        source,
    })
}

/// Last chance to back out before anything becomes durable.
fn commit_or_abort(ctx: &OpContext, write_txn: WriteTransaction) -> Result<()> {
    if let Err(err) = ctx.check("commit") {
        write_txn.abort().map_err(storage_err("abort", None))?;
        return Err(err);
    }
    write_txn.commit().map_err(storage_err("commit", None))
}

impl RelationBackend for RedbRelation {
    fn kind(&self) -> BackendKind {
        BackendKind::Redb
    }

    fn load(&self, user: &str) -> Result<Option<UserPermissions>> {
        let read_txn = self
            .db()?
            .begin_read()
            .map_err(storage_err("load", Some(user)))?;
        let table = read_txn
            .open_table(AUTHORIZATION_TABLE)
            .map_err(storage_err("load", Some(user)))?;

        match table.get(user).map_err(storage_err("load", Some(user)))? {
            Some(value) => Ok(Some(decode("load", user, value.value())?)),
            None => Ok(None),
        }
    }

    fn scan(&self) -> Result<Vec<(String, UserPermissions)>> {
        let read_txn = self
            .db()?
            .begin_read()
            .map_err(storage_err("scan", None))?;
        let table = read_txn
            .open_table(AUTHORIZATION_TABLE)
            .map_err(storage_err("scan", None))?;

        let mut rows = Vec::new();
        for item in table.iter().map_err(storage_err("scan", None))? {
            let (key, value) = item.map_err(storage_err("scan", None))?;
            let user = key.value().to_string();
            let permissions = decode("scan", &user, value.value())?;
            rows.push((user, permissions));
        }

        Ok(rows)
    }

    fn commit(&mut self, ctx: &OpContext, writes: Vec<RelationWrite>) -> Result<()> {
        ctx.check("commit")?;

        let write_txn = self
            .db()?
            .begin_write()
            .map_err(storage_err("commit", None))?;
        {
            let mut table = write_txn
                .open_table(AUTHORIZATION_TABLE)
                .map_err(storage_err("commit", None))?;

            for write in &writes {
                match write {
                    RelationWrite::Put { user, permissions } => {
                        let bytes = encode(user, permissions)?;
                        table
                            .insert(user.as_str(), bytes.as_slice())
                            .map_err(storage_err("put", Some(user)))?;
                    }
                    RelationWrite::Remove { user } => {
                        table
                            .remove(user.as_str())
                            .map_err(storage_err("remove", Some(user)))?;
                    }
                    RelationWrite::Clear => {
                        let mut users = Vec::new();
                        for item in table.iter().map_err(storage_err("clear", None))? {
                            let (key, _) = item.map_err(storage_err("clear", None))?;
                            users.push(key.value().to_string());
                        }
                        for user in &users {
                            table
                                .remove(user.as_str())
                                .map_err(storage_err("clear", Some(user)))?;
                        }
                    }
                }
            }
        }

        commit_or_abort(ctx, write_txn)?;
        tracing::debug!("Committed {} authorization writes", writes.len());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.db.take().is_some() {
            tracing::info!("Closed authorization database");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::Permission;
    use tempfile::tempdir;
    use tokio_util::sync::CancellationToken;

    fn setup() -> (RedbRelation, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.redb");
        let relation = RedbRelation::open(db_path).unwrap();
        (relation, temp_dir)
    }

    fn put(user: &str, shortened: &str, permission: Permission) -> RelationWrite {
        RelationWrite::Put {
            user: user.to_string(),
            permissions: [(shortened.to_string(), permission)].into_iter().collect(),
        }
    }

    fn owner_row(shortened: &str) -> UserPermissions {
        [(shortened.to_string(), Permission::owner())].into_iter().collect()
    }

    #[test]
    fn test_put_and_load() {
        let (mut relation, _temp_dir) = setup();
        let permission = Permission::default().with_read_summary().with_write_terse();

        relation
            .commit(&OpContext::background(), vec![put("alice", "abc", permission)])
            .unwrap();

        let row = relation.load("alice").unwrap().unwrap();
        assert_eq!(row["abc"], permission);
        assert!(relation.load("bob").unwrap().is_none());
    }

    #[test]
    fn test_remove_and_clear() {
        let (mut relation, _temp_dir) = setup();
        let ctx = OpContext::background();

        relation
            .commit(
                &ctx,
                vec![
                    put("alice", "abc", Permission::owner()),
                    put("bob", "abc", Permission::default()),
                    put("carol", "xyz", Permission::default()),
                ],
            )
            .unwrap();
        relation
            .commit(
                &ctx,
                vec![RelationWrite::Remove {
                    user: "bob".to_string(),
                }],
            )
            .unwrap();
        assert_eq!(relation.scan().unwrap().len(), 2);

        relation.commit(&ctx, vec![RelationWrite::Clear]).unwrap();
        assert!(relation.scan().unwrap().is_empty());
    }

    #[test]
    fn test_rows_survive_reopen() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.redb");

        {
            let mut relation = RedbRelation::open(&db_path).unwrap();
            relation
                .commit(&OpContext::background(), vec![put("alice", "abc", Permission::owner())])
                .unwrap();
            relation.close().unwrap();
        }

        let relation = RedbRelation::open(&db_path).unwrap();
        let rows = relation.scan().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "alice");
        assert!(rows[0].1["abc"].owner);
    }

    #[test]
    fn test_cancelled_commit_writes_nothing() {
        let (mut relation, _temp_dir) = setup();
        let token = CancellationToken::new();
        token.cancel();

        let err = relation
            .commit(
                &OpContext::with_cancellation(token),
                vec![put("alice", "abc", Permission::owner())],
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Cancelled { .. }));
        assert!(relation.load("alice").unwrap().is_none());
    }

    #[test]
    fn test_cancelled_after_writes_aborts_transaction() {
        let temp_dir = tempdir().unwrap();
        let db = Arc::new(Database::create(temp_dir.path().join("test.redb")).unwrap());
        let relation = RedbRelation::new(db.clone()).unwrap();

        let token = CancellationToken::new();
        let ctx = OpContext::with_cancellation(token.clone());
        let write_txn = db.begin_write().unwrap();
        {
            let mut table = write_txn.open_table(AUTHORIZATION_TABLE).unwrap();
            let bytes = encode("alice", &owner_row("abc")).unwrap();
            table.insert("alice", bytes.as_slice()).unwrap();
        }
        token.cancel();

        let err = commit_or_abort(&ctx, write_txn).unwrap_err();
        assert!(matches!(err, StoreError::Cancelled { operation: "commit" }));
        assert!(relation.load("alice").unwrap().is_none());
    }

    #[test]
    fn test_commit_or_abort_commits_when_live() {
        let temp_dir = tempdir().unwrap();
        let db = Arc::new(Database::create(temp_dir.path().join("test.redb")).unwrap());
        let relation = RedbRelation::new(db.clone()).unwrap();

        let write_txn = db.begin_write().unwrap();
        {
            let mut table = write_txn.open_table(AUTHORIZATION_TABLE).unwrap();
            let bytes = encode("alice", &owner_row("abc")).unwrap();
            table.insert("alice", bytes.as_slice()).unwrap();
        }

        commit_or_abort(&OpContext::background(), write_txn).unwrap();
        assert!(relation.load("alice").unwrap().unwrap()["abc"].owner);
    }

    #[test]
    fn test_closed_backend_fails() {
        let (mut relation, _temp_dir) = setup();
        relation.close().unwrap();
        assert!(matches!(relation.load("alice"), Err(StoreError::Closed)));
        assert!(matches!(relation.scan(), Err(StoreError::Closed)));
    }

    #[test]
    fn test_corrupt_row_is_serialization_error() {
        let temp_dir = tempdir().unwrap();
        let db = Arc::new(Database::create(temp_dir.path().join("test.redb")).unwrap());
        let relation = RedbRelation::new(db.clone()).unwrap();

        let write_txn = db.begin_write().unwrap();
        {
            let mut table = write_txn.open_table(AUTHORIZATION_TABLE).unwrap();
            table.insert("alice", b"not json".as_slice()).unwrap();
        }
        write_txn.commit().unwrap();

        let err = relation.load("alice").unwrap_err();
        assert!(err.is_backend_failure());
        assert!(matches!(err, StoreError::Serialization { ref key, .. } if key == "alice"));
    }
}
