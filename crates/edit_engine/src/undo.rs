//! Undo/redo manager with a linear history

use crate::{Command, Result};
use field_tree::FieldTree;

/// What the history currently allows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    Clean,
    HasUndo,
    HasRedo,
    HasBoth,
}

/// Manages undo and redo stacks
pub struct UndoManager {
    /// Stack of commands that can be undone
    undo_stack: Vec<Box<dyn Command>>,
    /// Stack of commands that can be redone
    redo_stack: Vec<Box<dyn Command>>,
    /// Maximum number of undo entries, 0 for no limit
    max_entries: usize,
}

impl UndoManager {
    /// Create a new undo manager
    pub fn new() -> Self {
        Self::with_limit(100)
    }

    /// Create with a custom history limit
    pub fn with_limit(max_entries: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries,
        }
    }

    /// Record a command that has just been performed. Any redoable
    /// commands are discarded.
    pub fn post(&mut self, command: Box<dyn Command>) {
        tracing::debug!(command = command.display_name(), "posting edit");
        self.redo_stack.clear();
        self.undo_stack.push(command);

        if self.max_entries > 0 && self.undo_stack.len() > self.max_entries {
            let excess = self.undo_stack.len() - self.max_entries;
            self.undo_stack.drain(..excess);
        }
    }

    /// Revert the most recent command. Returns the reverted command, or
    /// `None` when there was nothing to undo.
    pub fn undo(&mut self, tree: &mut FieldTree) -> Result<Option<&dyn Command>> {
        let Some(mut command) = self.undo_stack.pop() else {
            return Ok(None);
        };
        if let Err(e) = command.revert(tree) {
            tracing::warn!(command = command.display_name(), "undo failed: {}", e);
            self.undo_stack.push(command);
            return Err(e);
        }
        tracing::debug!(command = command.display_name(), "undo");
        self.redo_stack.push(command);
        Ok(self.redo_stack.last().map(|c| c.as_ref()))
    }

    /// Re-apply the most recently undone command. Returns the command, or
    /// `None` when there was nothing to redo.
    pub fn redo(&mut self, tree: &mut FieldTree) -> Result<Option<&dyn Command>> {
        let Some(mut command) = self.redo_stack.pop() else {
            return Ok(None);
        };
        if let Err(e) = command.apply(tree) {
            tracing::warn!(command = command.display_name(), "redo failed: {}", e);
            self.redo_stack.push(command);
            return Err(e);
        }
        tracing::debug!(command = command.display_name(), "redo");
        self.undo_stack.push(command);
        Ok(self.undo_stack.last().map(|c| c.as_ref()))
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn state(&self) -> HistoryState {
        match (self.can_undo(), self.can_redo()) {
            (false, false) => HistoryState::Clean,
            (true, false) => HistoryState::HasUndo,
            (false, true) => HistoryState::HasRedo,
            (true, true) => HistoryState::HasBoth,
        }
    }

    /// Label for an undo button
    pub fn undo_presentation_name(&self) -> String {
        match self.undo_stack.last() {
            Some(command) => format!("Undo {}", command.display_name()),
            None => "Cannot Undo".to_string(),
        }
    }

    /// Label for a redo button
    pub fn redo_presentation_name(&self) -> String {
        match self.redo_stack.last() {
            Some(command) => format!("Redo {}", command.display_name()),
            None => "Cannot Redo".to_string(),
        }
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UndoManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoManager")
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttributeEditKind, EditAttributes};
    use field_tree::{mutator, values, Attributes, FieldNode, NodeId, VALUE};

    fn tree_with_field() -> (FieldTree, NodeId) {
        let mut tree = FieldTree::new(Attributes::new());
        let root = tree.root_id();
        let id = mutator::insert_child(&mut tree, root, FieldNode::new(), 0).unwrap();
        (tree, id)
    }

    fn set_value(tree: &mut FieldTree, id: NodeId, value: &str) -> Box<dyn Command> {
        let change = values::set_attribute(tree, id, VALUE, Some(value.to_string()))
            .unwrap()
            .unwrap();
        Box::new(EditAttributes::new(
            AttributeEditKind::SetAttribute(VALUE.to_string()),
            vec![change],
        ))
    }

    fn value(tree: &FieldTree, id: NodeId) -> Option<&str> {
        tree.get(id).unwrap().attributes.get(VALUE)
    }

    #[test]
    fn test_undo_redo_cycle() {
        let (mut tree, id) = tree_with_field();
        let mut manager = UndoManager::new();
        assert_eq!(manager.state(), HistoryState::Clean);

        let cmd = set_value(&mut tree, id, "1");
        manager.post(cmd);
        let cmd = set_value(&mut tree, id, "2");
        manager.post(cmd);
        assert_eq!(manager.state(), HistoryState::HasUndo);
        assert_eq!(manager.undo_presentation_name(), "Undo Edit value");

        manager.undo(&mut tree).unwrap();
        assert_eq!(value(&tree, id), Some("1"));
        assert_eq!(manager.state(), HistoryState::HasBoth);

        manager.undo(&mut tree).unwrap();
        assert_eq!(value(&tree, id), None);
        assert_eq!(manager.state(), HistoryState::HasRedo);
        assert_eq!(manager.undo_presentation_name(), "Cannot Undo");

        manager.redo(&mut tree).unwrap();
        manager.redo(&mut tree).unwrap();
        assert_eq!(value(&tree, id), Some("2"));
        assert_eq!(manager.redo_presentation_name(), "Cannot Redo");
    }

    #[test]
    fn test_underflow_is_noop() {
        let (mut tree, _) = tree_with_field();
        let mut manager = UndoManager::new();
        assert!(manager.undo(&mut tree).unwrap().is_none());
        assert!(manager.redo(&mut tree).unwrap().is_none());
    }

    #[test]
    fn test_post_after_undo_discards_redo() {
        let (mut tree, id) = tree_with_field();
        let mut manager = UndoManager::new();
        for v in ["1", "2", "3"] {
            let cmd = set_value(&mut tree, id, v);
            manager.post(cmd);
        }
        manager.undo(&mut tree).unwrap();
        manager.undo(&mut tree).unwrap();
        assert_eq!(manager.redo_len(), 2);

        let cmd = set_value(&mut tree, id, "4");
        manager.post(cmd);
        assert_eq!(manager.redo_len(), 0);
        assert!(!manager.can_redo());
        assert_eq!(manager.undo_len(), 2);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let (mut tree, id) = tree_with_field();
        let mut manager = UndoManager::with_limit(2);
        for v in ["1", "2", "3"] {
            let cmd = set_value(&mut tree, id, v);
            manager.post(cmd);
        }
        assert_eq!(manager.undo_len(), 2);
        manager.undo(&mut tree).unwrap();
        manager.undo(&mut tree).unwrap();
        assert_eq!(value(&tree, id), Some("1"));
        assert!(!manager.can_undo());
    }

    #[test]
    fn test_failed_undo_keeps_command() {
        let (mut tree, id) = tree_with_field();
        let mut manager = UndoManager::new();
        let cmd = set_value(&mut tree, id, "1");
        manager.post(cmd);
        tree.detach(id).unwrap();

        assert!(manager.undo(&mut tree).is_err());
        assert_eq!(manager.undo_len(), 1);
        assert_eq!(manager.redo_len(), 0);
    }
}
