//! Push-to-server policies.
//!
//! Levels are ordered `Reject < Allow < Shallow < Deep`. A slot's effective
//! level is the minimum of what it declares and its parent's effective
//! level; a slot that declares nothing inherits the parent level.

#[cfg(test)]
#[path = "policy_test.rs"]
mod policy_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushToServer {
    /// Never sent to the server.
    #[default]
    Reject,
    /// Sent only when explicitly flagged as changed.
    Allow,
    /// By-reference changes detected and queued, not flushed right away.
    Shallow,
    /// Changes detected and flushed immediately.
    Deep,
}

impl PushToServer {
    /// Parse the `s` entry of a server property description (`0..=3` or a name).
    #[must_use]
    pub fn from_server(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match n.as_i64()? {
                0 => Some(Self::Reject),
                1 => Some(Self::Allow),
                2 => Some(Self::Shallow),
                3 => Some(Self::Deep),
                _ => None,
            },
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "reject" => Some(Self::Reject),
                "allow" => Some(Self::Allow),
                "shallow" => Some(Self::Shallow),
                "deep" => Some(Self::Deep),
                _ => None,
            },
            _ => None,
        }
    }

    /// Effective level of a child slot under a parent whose effective level is `self`.
    #[must_use]
    pub fn combine_with_child(self, declared: Option<Self>) -> Self {
        declared.map_or(self, |child| child.min(self))
    }

    /// Listener flag for a change recorded under this level.
    #[must_use]
    pub fn do_not_push_now(self) -> bool {
        self != Self::Deep
    }

    /// Whether client mutations under this level are recorded at all.
    #[must_use]
    pub fn records_changes(self) -> bool {
        self != Self::Reject
    }
}
