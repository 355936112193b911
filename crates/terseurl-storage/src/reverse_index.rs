//! Shortened URL -> user index.
//!
//! Derived entirely from the primary relation and never persisted. It holds
//! no policy of its own; the store decides what to add and remove.

use std::collections::hash_set;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{EntityKind, Result, StoreError};
use crate::permission::UserPermissions;

/// A set of unique user identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserSet(HashSet<String>);

impl UserSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the user was not already present.
    pub fn insert(&mut self, user: impl Into<String>) -> bool {
        self.0.insert(user.into())
    }

    pub fn remove(&mut self, user: &str) -> bool {
        self.0.remove(user)
    }

    pub fn contains(&self, user: &str) -> bool {
        self.0.contains(user)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> hash_set::Iter<'_, String> {
        self.0.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for UserSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for UserSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl IntoIterator for UserSet {
    type Item = String;
    type IntoIter = hash_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a UserSet {
    type Item = &'a String;
    type IntoIter = hash_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Mapping of shortened URLs to the users holding any permission over them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseIndex {
    entries: HashMap<String, UserSet>,
}

impl ReverseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the index from `(user, permissions)` rows of the primary relation.
    pub fn from_relation<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, UserPermissions)>,
    {
        let mut index = Self::new();
        for (user, permissions) in rows {
            for shortened in permissions.into_keys() {
                index
                    .entries
                    .entry(shortened)
                    .or_default()
                    .insert(user.clone());
            }
        }
        index
    }

    /// Union each user set into the entry for its shortened URL.
    pub fn add(&mut self, pairs: HashMap<String, UserSet>) {
        for (shortened, users) in pairs {
            if users.is_empty() {
                continue;
            }
            self.entries.entry(shortened).or_default().extend(users);
        }
    }

    /// Remove users from shortened URL entries.
    ///
    /// An empty user set drops the whole entry. An entry left without users is
    /// dropped too. Unknown shortened URLs and users are ignored.
    pub fn remove(&mut self, pairs: HashMap<String, UserSet>) {
        for (shortened, users) in pairs {
            if users.is_empty() {
                self.entries.remove(&shortened);
                continue;
            }

            let Some(current) = self.entries.get_mut(&shortened) else {
                continue;
            };
            for user in &users {
                current.remove(user);
            }
            if current.is_empty() {
                self.entries.remove(&shortened);
            }
        }
    }

    /// Read the users for the given shortened URLs, or every entry if none are given.
    pub fn read(&self, shortened_urls: &[String]) -> Result<HashMap<String, UserSet>> {
        if shortened_urls.is_empty() {
            return Ok(self.entries.clone());
        }

        let mut found = HashMap::with_capacity(shortened_urls.len());
        for shortened in shortened_urls {
            let users = self
                .entries
                .get(shortened)
                .ok_or_else(|| StoreError::not_found(EntityKind::Shortened, shortened.as_str()))?;
            found.insert(shortened.clone(), users.clone());
        }
        Ok(found)
    }

    pub fn users_of(&self, shortened: &str) -> Option<&UserSet> {
        self.entries.get(shortened)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn resource_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of (shortened URL, user) pairs.
    pub fn pair_count(&self) -> usize {
        self.entries.values().map(UserSet::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &UserSet)> {
        self.entries.iter()
    }
}
