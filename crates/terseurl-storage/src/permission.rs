//! Permission records for a (user, shortened URL) pair.
//!
//! Having any record at all for a pair grants read access to the shortened
//! URL's core data; the flags below add capabilities on top of that.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Capabilities a user holds over one shortened URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Permission {
    /// Unrestricted access. Only an owner may change other users' records
    /// for the same shortened URL.
    pub owner: bool,
    pub read_summary: bool,
    pub read_visits: bool,
    /// May change where the shortened URL points.
    pub write_terse: bool,
}

impl Permission {
    /// A record carrying only the owner flag.
    pub fn owner() -> Self {
        Self {
            owner: true,
            ..Self::default()
        }
    }

    pub fn with_read_summary(mut self) -> Self {
        self.read_summary = true;
        self
    }

    pub fn with_read_visits(mut self) -> Self {
        self.read_visits = true;
        self
    }

    pub fn with_write_terse(mut self) -> Self {
        self.write_terse = true;
        self
    }

    /// Whether this record grants everything `needed` asks for.
    ///
    /// Owners satisfy any request.
    pub fn satisfies(&self, needed: &Permission) -> bool {
        if self.owner {
            return true;
        }
        !(needed.owner
            || (needed.read_summary && !self.read_summary)
            || (needed.read_visits && !self.read_visits)
            || (needed.write_terse && !self.write_terse))
    }
}

/// Shortened URL -> permission, for a single user.
pub type UserPermissions = HashMap<String, Permission>;

/// User -> permission, for a single shortened URL.
pub type ResourcePermissions = HashMap<String, Permission>;

/// User -> that user's permissions.
pub type UserBatch = HashMap<String, UserPermissions>;

/// Shortened URL -> the permissions every user holds over it.
pub type ResourceBatch = HashMap<String, ResourcePermissions>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_satisfies_everything() {
        let need_all = Permission::owner()
            .with_read_summary()
            .with_read_visits()
            .with_write_terse();
        assert!(Permission::owner().satisfies(&need_all));
    }

    #[test]
    fn test_flags_must_match() {
        let granted = Permission::default().with_read_visits();

        assert!(granted.satisfies(&Permission::default()));
        assert!(granted.satisfies(&Permission::default().with_read_visits()));
        assert!(!granted.satisfies(&Permission::default().with_read_summary()));
        assert!(!granted.satisfies(&Permission::owner()));
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(Permission::default().with_write_terse()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "owner": false,
                "read_summary": false,
                "read_visits": false,
                "write_terse": true,
            })
        );
    }

    #[test]
    fn test_missing_fields_default_to_false() {
        let parsed: Permission = serde_json::from_str(r#"{"read_summary": true}"#).unwrap();
        assert_eq!(parsed, Permission::default().with_read_summary());
    }
}
