//! Change-aware object wrapper.
//!
//! Keyed counterpart of [`crate::ChangeAwareArray`]: `set` and `delete`
//! record the key under that key's push policy. Values written by the
//! server go through [`ChangeAwareObject::set_from_server`] and are never
//! recorded.

#[cfg(test)]
#[path = "object_test.rs"]
mod object_test;

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::rc::Rc;

use crate::array::{link_child, unlink};
use crate::policy::PushToServer;
use crate::tracker::{ChangeKey, ChangeListener, ChangeTracker};
use crate::value::ClientValue;

pub struct ChangeAwareObject {
    pub(crate) entries: BTreeMap<String, ClientValue>,
    pub(crate) state: Rc<ChangeTracker>,
}

impl fmt::Debug for ChangeAwareObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeAwareObject")
            .field("entries", &self.entries)
            .field("state", &self.state)
            .finish()
    }
}

impl Default for ChangeAwareObject {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeAwareObject {
    /// Empty client-created object; its first encode is a full value.
    #[must_use]
    pub fn new() -> Self {
        Self::from_entries(BTreeMap::new())
    }

    /// Client-created object holding `entries`.
    #[must_use]
    pub fn from_entries(entries: BTreeMap<String, ClientValue>) -> Self {
        let object = Self { entries, state: ChangeTracker::new(0, true, PushToServer::Allow) };
        object.relink();
        object
    }

    /// Object built from a full server value.
    pub(crate) fn from_server(
        entries: BTreeMap<String, ClientValue>,
        version: i64,
        default_policy: PushToServer,
        policies: BTreeMap<String, PushToServer>,
    ) -> Self {
        let state = ChangeTracker::new(version, false, default_policy);
        state.set_policies(default_policy, policies);
        let object = Self { entries, state };
        object.relink();
        object
    }

    /// Server-owned object (a component model) whose keys carry the given policies.
    #[must_use]
    pub fn with_policies(default_policy: PushToServer, policies: BTreeMap<String, PushToServer>) -> Self {
        Self::from_server(BTreeMap::new(), 0, default_policy, policies)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ClientValue> {
        self.entries.get(key)
    }

    /// In-place access; plain mutations through this are not recorded.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut ClientValue> {
        self.entries.get_mut(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ClientValue> {
        self.entries.iter()
    }

    /// Assign by reference and record `key`.
    pub fn set(&mut self, key: &str, value: impl Into<ClientValue>) {
        self.put(key, value.into());
        self.state.mark_changed(ChangeKey::Key(key.to_owned()));
    }

    /// Remove `key`; the next delta sends it as null.
    pub fn delete(&mut self, key: &str) -> Option<ClientValue> {
        let removed = self.entries.remove(key)?;
        unlink(&removed);
        self.state.mark_changed(ChangeKey::Key(key.to_owned()));
        Some(removed)
    }

    /// Assign a value that came from the server; nothing is recorded.
    pub fn set_from_server(&mut self, key: &str, value: ClientValue) {
        self.put(key, value);
    }

    /// Record a change inside the value at `key` that assignment could not see.
    pub fn mark_element_as_having_deep_changes(&self, key: &str) {
        self.state.mark_changed(ChangeKey::Key(key.to_owned()));
    }

    pub fn set_change_listener(&self, listener: Option<ChangeListener>) {
        self.state.set_change_listener(listener);
    }

    #[must_use]
    pub fn internal_state(&self) -> &ChangeTracker {
        &self.state
    }

    fn put(&mut self, key: &str, value: ClientValue) {
        link_child(&value, &self.state, ChangeKey::Key(key.to_owned()));
        if let Some(previous) = self.entries.insert(key.to_owned(), value) {
            unlink(&previous);
        }
    }

    pub(crate) fn relink(&self) {
        for (key, value) in &self.entries {
            link_child(value, &self.state, ChangeKey::Key(key.clone()));
        }
    }
}

impl<'a> IntoIterator for &'a ChangeAwareObject {
    type Item = (&'a String, &'a ClientValue);
    type IntoIter = btree_map::Iter<'a, String, ClientValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
