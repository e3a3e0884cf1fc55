//! Selection model - the set of highlighted fields
//!
//! The selection is either empty, exactly the root, or a contiguous run of
//! siblings under one parent. Selecting a sibling outside the current range
//! pulls in every sibling in between so the run stays contiguous.

use crate::{FieldTree, NodeId, Result, SiblingRun, TreeError};

/// Highlighted fields of one tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    /// Non-root members in sibling order
    fields: Vec<NodeId>,
    root_selected: bool,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highlight `node`.
    ///
    /// Without `clear_others`, `node` must be a sibling of the current
    /// members; otherwise the call fails and the selection is unchanged.
    pub fn select(&mut self, tree: &mut FieldTree, node: NodeId, clear_others: bool) -> Result<()> {
        tree.node(node)?;

        if tree.is_root(node) {
            self.clear(tree);
            self.root_selected = true;
            tree.set_highlighted(node, true);
            return Ok(());
        }

        let parent = tree.parent(node).ok_or(TreeError::Detached(node))?;
        if !clear_others {
            if let Some(current) = self.parent(tree) {
                if current != parent {
                    return Err(TreeError::SelectionParentMismatch { node });
                }
            }
        }

        if clear_others {
            self.clear(tree);
        } else if self.root_selected {
            self.root_selected = false;
            tree.set_highlighted(tree.root_id(), false);
        }

        if self.fields.is_empty() {
            self.fields.push(node);
            tree.set_highlighted(node, true);
            return Ok(());
        }

        let index = tree.sibling_index(node).ok_or(TreeError::Detached(node))?;
        let (min, max) = self.bounds(tree);

        if index > max {
            for i in max + 1..=index {
                if let Some(sibling) = tree.child(parent, i) {
                    self.fields.push(sibling);
                    tree.set_highlighted(sibling, true);
                }
            }
        } else if index < min {
            for i in (index..min).rev() {
                if let Some(sibling) = tree.child(parent, i) {
                    self.fields.insert(0, sibling);
                    tree.set_highlighted(sibling, true);
                }
            }
        }
        tracing::trace!(selected = self.fields.len(), "selection extended");
        Ok(())
    }

    /// Replace the selection with a validated sibling run
    pub fn select_run(&mut self, tree: &mut FieldTree, ids: &[NodeId]) -> Result<()> {
        let run = SiblingRun::resolve(tree, ids)?;
        self.clear(tree);
        for &id in run.ids() {
            tree.set_highlighted(id, true);
        }
        self.fields = run.into_ids();
        Ok(())
    }

    /// Remove every highlight
    pub fn clear(&mut self, tree: &mut FieldTree) {
        for &id in &self.fields {
            tree.set_highlighted(id, false);
        }
        if self.root_selected {
            tree.set_highlighted(tree.root_id(), false);
        }
        self.fields.clear();
        self.root_selected = false;
    }

    /// Forget the selection without touching any tree, e.g. after the tree
    /// it referred to has been replaced
    pub fn reset(&mut self) {
        self.fields.clear();
        self.root_selected = false;
    }

    /// Drop members that are no longer attached. If the survivors no longer
    /// form a run the selection is cleared.
    pub fn prune(&mut self, tree: &mut FieldTree) {
        self.fields.retain(|&id| tree.contains(id));
        if self.fields.is_empty() {
            return;
        }
        match SiblingRun::resolve(tree, &self.fields) {
            Ok(run) => self.fields = run.into_ids(),
            Err(_) => self.clear(tree),
        }
    }

    /// Non-root members, in sibling order
    pub fn fields(&self) -> &[NodeId] {
        &self.fields
    }

    /// Highlighted nodes as seen by callers: `[root]` when the root is
    /// selected, the member run otherwise
    pub fn highlighted(&self, tree: &FieldTree) -> Vec<NodeId> {
        if self.root_selected {
            vec![tree.root_id()]
        } else {
            self.fields.clone()
        }
    }

    pub fn is_root_selected(&self) -> bool {
        self.root_selected
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.fields.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.fields.len() + usize::from(self.root_selected)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && !self.root_selected
    }

    pub fn first(&self) -> Option<NodeId> {
        self.fields.first().copied()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.fields.last().copied()
    }

    /// Common parent of the members
    pub fn parent(&self, tree: &FieldTree) -> Option<NodeId> {
        self.fields.first().and_then(|&id| tree.parent(id))
    }

    fn bounds(&self, tree: &FieldTree) -> (usize, usize) {
        let mut indices = self.fields.iter().filter_map(|&id| tree.sibling_index(id));
        let first = indices.next().unwrap_or(0);
        indices.fold((first, first), |(min, max), i| (min.min(i), max.max(i)))
    }
}
