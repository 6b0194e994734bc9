//! Change-aware array wrapper.
//!
//! Element assignment records the index; structural edits (insert, remove,
//! append past the end) only record that the whole array must be resent.
//! Mutating an element through [`ChangeAwareArray::get_mut`] records
//! nothing unless the element is itself a wrapper (whose own changes climb
//! up here) or the caller marks it with
//! [`ChangeAwareArray::mark_element_as_having_deep_changes`].

#[cfg(test)]
#[path = "array_test.rs"]
mod array_test;

use std::fmt;
use std::rc::Rc;

use crate::policy::PushToServer;
use crate::tracker::{ChangeKey, ChangeListener, ChangeTracker};
use crate::value::ClientValue;

pub struct ChangeAwareArray {
    pub(crate) items: Vec<ClientValue>,
    pub(crate) state: Rc<ChangeTracker>,
}

impl fmt::Debug for ChangeAwareArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeAwareArray")
            .field("items", &self.items)
            .field("state", &self.state)
            .finish()
    }
}

impl Default for ChangeAwareArray {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeAwareArray {
    /// Empty client-created array; its first encode is a full value.
    #[must_use]
    pub fn new() -> Self {
        Self::from_items(Vec::new())
    }

    /// Client-created array holding `items`.
    #[must_use]
    pub fn from_items(items: Vec<ClientValue>) -> Self {
        let array = Self { items, state: ChangeTracker::new(0, true, PushToServer::Allow) };
        array.relink();
        array
    }

    /// Array built from a full server value.
    pub(crate) fn from_server(items: Vec<ClientValue>, version: i64, element_policy: PushToServer) -> Self {
        let array = Self { items, state: ChangeTracker::new(version, false, element_policy) };
        array.relink();
        array
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ClientValue> {
        self.items.get(index)
    }

    /// In-place access; plain mutations through this are not recorded.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut ClientValue> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClientValue> {
        self.items.iter()
    }

    /// Assign by reference.
    ///
    /// Inside the current bounds this records `index`; at or past the end the
    /// array grows (gaps filled with null) and must be resent in full.
    pub fn set(&mut self, index: usize, value: impl Into<ClientValue>) {
        let value = value.into();
        if index < self.items.len() {
            self.link(&value, index);
            let previous = std::mem::replace(&mut self.items[index], value);
            unlink(&previous);
            self.state.mark_changed(ChangeKey::Index(index));
            return;
        }
        self.items.resize_with(index, ClientValue::default);
        self.link(&value, index);
        self.items.push(value);
        self.state.mark_full_change();
    }

    pub fn push(&mut self, value: impl Into<ClientValue>) {
        let value = value.into();
        self.link(&value, self.items.len());
        self.items.push(value);
        self.state.mark_full_change();
    }

    /// Insert at `index`, shifting later elements; past the end pads with null.
    pub fn insert(&mut self, index: usize, value: impl Into<ClientValue>) {
        if index > self.items.len() {
            self.items.resize_with(index, ClientValue::default);
        }
        self.items.insert(index, value.into());
        self.relink();
        self.state.mark_full_change();
    }

    pub fn remove(&mut self, index: usize) -> Option<ClientValue> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        unlink(&removed);
        self.relink();
        self.state.mark_full_change();
        Some(removed)
    }

    /// Remove `delete_count` elements at `start` and insert `replacement` there.
    pub fn splice(&mut self, start: usize, delete_count: usize, replacement: Vec<ClientValue>) -> Vec<ClientValue> {
        let start = start.min(self.items.len());
        let end = start.saturating_add(delete_count).min(self.items.len());
        let removed: Vec<ClientValue> = self.items.splice(start..end, replacement).collect();
        removed.iter().for_each(unlink);
        self.relink();
        self.state.mark_full_change();
        removed
    }

    /// Record a change inside element `index` that assignment could not see.
    pub fn mark_element_as_having_deep_changes(&self, index: usize) {
        self.state.mark_changed(ChangeKey::Index(index));
    }

    pub fn set_change_listener(&self, listener: Option<ChangeListener>) {
        self.state.set_change_listener(listener);
    }

    #[must_use]
    pub fn internal_state(&self) -> &ChangeTracker {
        &self.state
    }

    fn link(&self, value: &ClientValue, index: usize) {
        link_child(value, &self.state, ChangeKey::Index(index));
    }

    /// Point every nested wrapper at its current index.
    pub(crate) fn relink(&self) {
        for (index, item) in self.items.iter().enumerate() {
            self.link(item, index);
        }
    }
}

impl<'a> IntoIterator for &'a ChangeAwareArray {
    type Item = &'a ClientValue;
    type IntoIter = std::slice::Iter<'a, ClientValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

pub(crate) fn link_child(value: &ClientValue, parent: &Rc<ChangeTracker>, key: ChangeKey) {
    match value {
        ClientValue::Array(a) => a.state.link_parent(parent, key),
        ClientValue::Object(o) => o.state.link_parent(parent, key),
        _ => {}
    }
}

/// Move the listener and parent link of a replaced wrapper onto its successor.
pub(crate) fn carry_wiring(previous: &ClientValue, next: &ClientValue) {
    if let (Some(previous), Some(next)) = (tracker_of(previous), tracker_of(next)) {
        next.inherit_wiring(previous);
    }
}

fn tracker_of(value: &ClientValue) -> Option<&ChangeTracker> {
    match value {
        ClientValue::Array(a) => Some(&*a.state),
        ClientValue::Object(o) => Some(&*o.state),
        _ => None,
    }
}

pub(crate) fn unlink(value: &ClientValue) {
    match value {
        ClientValue::Array(a) => a.state.unlink_parent(),
        ClientValue::Object(o) => o.state.unlink_parent(),
        _ => {}
    }
}
