//! Command system for field tree editing
//!
//! A command is created after its edit has been performed on the tree and
//! holds enough state to reverse it exactly and perform it again.

use crate::Result;
use field_tree::{FieldTree, NodeId};

/// Direction a recorded command is replayed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    Undo,
    Redo,
}

/// Trait for all undoable edits
pub trait Command: std::fmt::Debug + Send {
    /// Perform the edit again after it has been reverted
    fn apply(&mut self, tree: &mut FieldTree) -> Result<()>;

    /// Reverse the edit, restoring exact positions and values
    fn revert(&mut self, tree: &mut FieldTree) -> Result<()>;

    /// Get a display name for this command
    fn display_name(&self) -> &str;

    /// Nodes to highlight once the command has been replayed. An empty
    /// list keeps whatever is still selectable of the current selection.
    fn selection_after(&self, _replay: Replay) -> Vec<NodeId> {
        Vec::new()
    }

    /// Whether replaying changes the shape of the tree, as opposed to
    /// attribute values only
    fn is_structural(&self) -> bool {
        true
    }

    /// Whether views of the tree have to be redrawn after the command is
    /// performed, undone or redone
    fn needs_redisplay(&self) -> bool {
        self.is_structural()
    }
}
