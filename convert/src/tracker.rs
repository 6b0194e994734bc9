//! Change bookkeeping shared by every change-aware wrapper.
//!
//! DESIGN
//! ======
//! A wrapper owns its elements; its [`ChangeTracker`] sits behind an `Rc`
//! so a nested wrapper can point back at the slot it occupies in its parent
//! through a `Weak` link. A change recorded on a nested wrapper marks that
//! slot as changed in the parent and keeps climbing, so the root property
//! learns about it without scanning.
//!
//! The tracker never bumps the content version itself: the version is what
//! the server last sent and only the converters update it.

#[cfg(test)]
#[path = "tracker_test.rs"]
mod tracker_test;

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::policy::PushToServer;

/// Listener invoked on every recorded change with the `do_not_push_now` flag.
pub type ChangeListener = Rc<dyn Fn(bool)>;

/// Index (arrays) or key (objects) of a changed slot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeKey {
    Index(usize),
    Key(String),
}

impl fmt::Display for ChangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "[{i}]"),
            Self::Key(k) => write!(f, ".{k}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct PolicyTable {
    default: PushToServer,
    by_key: BTreeMap<String, PushToServer>,
}

struct ParentLink {
    tracker: Weak<ChangeTracker>,
    key: ChangeKey,
}

pub struct ChangeTracker {
    version: Cell<i64>,
    changed: RefCell<BTreeSet<ChangeKey>>,
    full_change: Cell<bool>,
    policies: RefCell<PolicyTable>,
    listener: RefCell<Option<ChangeListener>>,
    parent: RefCell<Option<ParentLink>>,
}

impl fmt::Debug for ChangeTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeTracker")
            .field("version", &self.version.get())
            .field("changed", &self.changed.borrow())
            .field("full_change", &self.full_change.get())
            .field("policies", &self.policies.borrow())
            .finish_non_exhaustive()
    }
}

impl ChangeTracker {
    pub(crate) fn new(version: i64, full_change: bool, default_policy: PushToServer) -> Rc<Self> {
        Rc::new(Self {
            version: Cell::new(version),
            changed: RefCell::new(BTreeSet::new()),
            full_change: Cell::new(full_change),
            policies: RefCell::new(PolicyTable { default: default_policy, by_key: BTreeMap::new() }),
            listener: RefCell::new(None),
            parent: RefCell::new(None),
        })
    }

    // =========================================================================
    // STATE
    // =========================================================================

    /// Content version last received from the server (0 for client-created values).
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version.get()
    }

    pub(crate) fn set_version(&self, version: i64) {
        self.version.set(version);
    }

    /// Slots changed since the last flush, in index/key order.
    #[must_use]
    pub fn changed_keys(&self) -> Vec<ChangeKey> {
        self.changed.borrow().iter().cloned().collect()
    }

    /// Whether the next encode has to send the whole value.
    #[must_use]
    pub fn is_full_change(&self) -> bool {
        self.full_change.get()
    }

    /// Whether anything at all would be sent on the next encode.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.full_change.get() || !self.changed.borrow().is_empty()
    }

    /// Forget everything recorded so far; called once a delta was produced.
    pub fn clear_changes(&self) {
        self.changed.borrow_mut().clear();
        self.full_change.set(false);
    }

    /// Effective push policy of one slot.
    #[must_use]
    pub fn policy_for(&self, key: &ChangeKey) -> PushToServer {
        let table = self.policies.borrow();
        match key {
            ChangeKey::Key(k) => table.by_key.get(k).copied().unwrap_or(table.default),
            ChangeKey::Index(_) => table.default,
        }
    }

    /// Replace the policy table.
    pub(crate) fn set_policies(&self, default: PushToServer, by_key: BTreeMap<String, PushToServer>) {
        *self.policies.borrow_mut() = PolicyTable { default, by_key };
    }

    pub fn set_change_listener(&self, listener: Option<ChangeListener>) {
        *self.listener.borrow_mut() = listener;
    }

    // =========================================================================
    // RECORDING
    // =========================================================================

    /// Record a by-reference (or explicitly marked deep) change of one slot.
    pub(crate) fn mark_changed(&self, key: ChangeKey) {
        let policy = self.policy_for(&key);
        if !policy.records_changes() {
            return;
        }
        self.changed.borrow_mut().insert(key);
        self.notify(policy.do_not_push_now());
    }

    /// Record a structural change (insert, remove, append) that forces a full send.
    pub(crate) fn mark_full_change(&self) {
        let policy = self.policies.borrow().default;
        if !policy.records_changes() {
            return;
        }
        self.full_change.set(true);
        self.notify(policy.do_not_push_now());
    }

    fn child_changed(&self, key: ChangeKey, do_not_push_now: bool) {
        if !self.policy_for(&key).records_changes() {
            return;
        }
        self.changed.borrow_mut().insert(key);
        self.notify(do_not_push_now);
    }

    fn notify(&self, do_not_push_now: bool) {
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener(do_not_push_now);
        }

        let parent = self
            .parent
            .borrow()
            .as_ref()
            .and_then(|link| link.tracker.upgrade().map(|tracker| (tracker, link.key.clone())));
        if let Some((tracker, key)) = parent {
            tracker.child_changed(key, do_not_push_now);
        }
    }

    // =========================================================================
    // NESTING
    // =========================================================================

    pub(crate) fn link_parent(&self, parent: &Rc<ChangeTracker>, key: ChangeKey) {
        *self.parent.borrow_mut() = Some(ParentLink { tracker: Rc::downgrade(parent), key });
    }

    pub(crate) fn unlink_parent(&self) {
        *self.parent.borrow_mut() = None;
    }

    /// Take over the listener and parent link of the tracker this one replaces.
    pub(crate) fn inherit_wiring(&self, previous: &ChangeTracker) {
        *self.listener.borrow_mut() = previous.listener.borrow().clone();
        let link = previous
            .parent
            .borrow()
            .as_ref()
            .map(|link| ParentLink { tracker: Weak::clone(&link.tracker), key: link.key.clone() });
        *self.parent.borrow_mut() = link;
    }
}
