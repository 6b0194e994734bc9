//! Form cache errors.

use wire::ErrorCode;

use crate::node::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// A structural delta names a parent that is neither in the batch nor in the cache.
    #[error("unresolved parent: {0}")]
    UnresolvedParent(String),
    /// The node was removed from the arena.
    #[error("no such node: {0}")]
    UnknownNode(NodeId),
    /// Children can only be added to containers, parts and form components.
    #[error("node {0} cannot hold children")]
    NotAContainer(NodeId),
    /// A node cannot become its own ancestor.
    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
}

impl ErrorCode for CacheError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnresolvedParent(_) => "E_UNRESOLVED_PARENT",
            Self::UnknownNode(_) => "E_UNKNOWN_NODE",
            Self::NotAContainer(_) => "E_NOT_A_CONTAINER",
            Self::Cycle { .. } => "E_CYCLE",
        }
    }
}
