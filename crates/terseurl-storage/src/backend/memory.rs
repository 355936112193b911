//! Volatile primary relation. Contents do not survive a restart.

use std::collections::HashMap;

use super::{BackendKind, RelationBackend, RelationWrite};
use crate::context::OpContext;
use crate::error::Result;
use crate::permission::UserPermissions;

#[derive(Debug, Default)]
pub struct MemoryRelation {
    users: HashMap<String, UserPermissions>,
}

impl MemoryRelation {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RelationBackend for MemoryRelation {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn load(&self, user: &str) -> Result<Option<UserPermissions>> {
        Ok(self.users.get(user).cloned())
    }

    fn scan(&self) -> Result<Vec<(String, UserPermissions)>> {
        Ok(self
            .users
            .iter()
            .map(|(user, permissions)| (user.clone(), permissions.clone()))
            .collect())
    }

    fn commit(&mut self, ctx: &OpContext, writes: Vec<RelationWrite>) -> Result<()> {
        // Nothing below can fail, so a single pre-check is enough.
        ctx.check("commit")?;

        for write in writes {
            match write {
                RelationWrite::Put { user, permissions } => {
                    self.users.insert(user, permissions);
                }
                RelationWrite::Remove { user } => {
                    self.users.remove(&user);
                }
                RelationWrite::Clear => self.users.clear(),
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.users = HashMap::new();
        Ok(())
    }
}
