//! Error and outcome types for field tree operations

use crate::NodeId;
use thiserror::Error;

/// Precondition violations. These indicate a caller bug and leave the tree
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Index {index} out of range for parent {parent} with {len} children")]
    IndexOutOfRange {
        parent: NodeId,
        index: usize,
        len: usize,
    },

    #[error("Operation not allowed on the root node")]
    RootNotAllowed,

    #[error("Node {0} is not attached to the tree")]
    Detached(NodeId),

    #[error("Node {0} is already attached to a parent")]
    AlreadyAttached(NodeId),

    #[error("Empty sibling run")]
    EmptyRun,

    #[error("Nodes do not share a parent")]
    MixedParents,

    #[error("Nodes are not a contiguous run of siblings")]
    NotContiguous,

    #[error("Node {node} is not a sibling of the current selection")]
    SelectionParentMismatch { node: NodeId },

    #[error("Tree structure error: {0}")]
    Structure(String),
}

pub type Result<T> = std::result::Result<T, TreeError>;

/// A structural edit that could not be applied because the run sits at an
/// edge of the tree. The tree is unchanged and callers normally ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    NoPrecedingSibling,
    NoFollowingSibling,
    NoGrandparent,
}

impl std::fmt::Display for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Boundary::NoPrecedingSibling => "no preceding sibling",
            Boundary::NoFollowingSibling => "no following sibling",
            Boundary::NoGrandparent => "no grandparent",
        };
        f.write_str(text)
    }
}

/// Result of a structural edit that may hit a boundary.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome<T> {
    Applied(T),
    Boundary(Boundary),
}

impl<T> EditOutcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied(_))
    }

    /// The applied value, or `None` at a boundary
    pub fn applied(self) -> Option<T> {
        match self {
            EditOutcome::Applied(value) => Some(value),
            EditOutcome::Boundary(_) => None,
        }
    }
}
