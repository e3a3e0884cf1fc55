//! Commands for structural edits: adding, deleting, moving, promoting,
//! demoting, duplicating and importing fields

use crate::{Command, EditError, Replay, Result};
use field_tree::mutator::{self, Insertion, Removal, RunMove};
use field_tree::{EditOutcome, FieldTree, NodeId, Subtree};

/// How an [`InsertFields`] command came about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertKind {
    Add,
    Duplicate,
    Import,
}

/// New fields inserted as consecutive children of one parent
#[derive(Debug)]
pub struct InsertFields {
    kind: InsertKind,
    parent: NodeId,
    index: usize,
    ids: Vec<NodeId>,
    /// Subtrees held while the insertion is undone
    detached: Vec<Subtree>,
}

impl InsertFields {
    pub fn new(kind: InsertKind, insertion: Insertion) -> Self {
        Self {
            kind,
            parent: insertion.parent,
            index: insertion.index,
            ids: insertion.ids,
            detached: Vec::new(),
        }
    }

    pub fn added(insertion: Insertion) -> Self {
        Self::new(InsertKind::Add, insertion)
    }

    pub fn duplicated(insertion: Insertion) -> Self {
        Self::new(InsertKind::Duplicate, insertion)
    }

    pub fn imported(insertion: Insertion) -> Self {
        Self::new(InsertKind::Import, insertion)
    }

    pub fn kind(&self) -> InsertKind {
        self.kind
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }
}

impl Command for InsertFields {
    fn apply(&mut self, tree: &mut FieldTree) -> Result<()> {
        if self.detached.len() != self.ids.len() {
            return Err(EditError::ReplayFailed(format!(
                "{}: nothing to re-insert",
                self.display_name()
            )));
        }
        tree.node(self.parent)?;
        for (offset, subtree) in std::mem::take(&mut self.detached).into_iter().enumerate() {
            tree.attach(self.parent, self.index + offset, subtree)?;
        }
        Ok(())
    }

    fn revert(&mut self, tree: &mut FieldTree) -> Result<()> {
        expect_children_at(tree, self.parent, self.index, &self.ids)?;
        let mut detached = Vec::with_capacity(self.ids.len());
        for &id in &self.ids {
            let (_, _, subtree) = tree.detach(id)?;
            detached.push(subtree);
        }
        self.detached = detached;
        Ok(())
    }

    fn display_name(&self) -> &str {
        match self.kind {
            InsertKind::Add => "Add New Field",
            InsertKind::Duplicate => "Duplicate Fields",
            InsertKind::Import => "Import Fields",
        }
    }

    fn selection_after(&self, replay: Replay) -> Vec<NodeId> {
        match replay {
            Replay::Redo => self.ids.clone(),
            Replay::Undo => Vec::new(),
        }
    }
}

/// Fields removed from the tree
#[derive(Debug)]
pub struct DeleteFields {
    ids: Vec<NodeId>,
    /// Removed subtrees, in removal order, while the deletion is in effect
    removals: Vec<Removal>,
}

impl DeleteFields {
    pub fn new(removals: Vec<Removal>) -> Self {
        Self {
            ids: removals.iter().map(Removal::id).collect(),
            removals,
        }
    }
}

impl Command for DeleteFields {
    fn apply(&mut self, tree: &mut FieldTree) -> Result<()> {
        self.removals = mutator::delete_nodes(tree, &self.ids)?;
        Ok(())
    }

    fn revert(&mut self, tree: &mut FieldTree) -> Result<()> {
        if self.removals.len() != self.ids.len() {
            return Err(EditError::ReplayFailed("Delete Fields: nothing to restore".into()));
        }
        mutator::restore_removals(tree, std::mem::take(&mut self.removals))?;
        Ok(())
    }

    fn display_name(&self) -> &str {
        "Delete Fields"
    }

    fn selection_after(&self, replay: Replay) -> Vec<NodeId> {
        match replay {
            Replay::Undo => self.ids.clone(),
            Replay::Redo => Vec::new(),
        }
    }
}

/// Direction of a [`MoveFields`] command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// A run of siblings swapped with its neighbour
#[derive(Debug, Clone)]
pub struct MoveFields {
    direction: MoveDirection,
    ids: Vec<NodeId>,
}

impl MoveFields {
    pub fn new(direction: MoveDirection, ids: Vec<NodeId>) -> Self {
        Self { direction, ids }
    }

    fn shift(&self, tree: &mut FieldTree, direction: MoveDirection) -> Result<()> {
        let outcome = match direction {
            MoveDirection::Up => mutator::move_up(tree, &self.ids)?,
            MoveDirection::Down => mutator::move_down(tree, &self.ids)?,
        };
        match outcome {
            EditOutcome::Applied(_) => Ok(()),
            EditOutcome::Boundary(boundary) => Err(EditError::ReplayFailed(format!(
                "{}: {boundary}",
                self.display_name()
            ))),
        }
    }
}

impl Command for MoveFields {
    fn apply(&mut self, tree: &mut FieldTree) -> Result<()> {
        self.shift(tree, self.direction)
    }

    fn revert(&mut self, tree: &mut FieldTree) -> Result<()> {
        let opposite = match self.direction {
            MoveDirection::Up => MoveDirection::Down,
            MoveDirection::Down => MoveDirection::Up,
        };
        self.shift(tree, opposite)
    }

    fn display_name(&self) -> &str {
        match self.direction {
            MoveDirection::Up => "Move Fields Up",
            MoveDirection::Down => "Move Fields Down",
        }
    }

    fn selection_after(&self, _replay: Replay) -> Vec<NodeId> {
        self.ids.clone()
    }
}

/// A run moved up one level, out of its parent
#[derive(Debug, Clone)]
pub struct PromoteFields {
    movement: RunMove,
}

impl PromoteFields {
    pub fn new(movement: RunMove) -> Self {
        Self { movement }
    }
}

impl Command for PromoteFields {
    fn apply(&mut self, tree: &mut FieldTree) -> Result<()> {
        move_forward(tree, &self.movement)
    }

    fn revert(&mut self, tree: &mut FieldTree) -> Result<()> {
        move_back(tree, &self.movement)
    }

    fn display_name(&self) -> &str {
        "Promote Fields"
    }

    fn selection_after(&self, _replay: Replay) -> Vec<NodeId> {
        self.movement.ids.clone()
    }
}

/// A run moved down one level, into its preceding sibling
#[derive(Debug, Clone)]
pub struct DemoteFields {
    movement: RunMove,
}

impl DemoteFields {
    pub fn new(movement: RunMove) -> Self {
        Self { movement }
    }
}

impl Command for DemoteFields {
    fn apply(&mut self, tree: &mut FieldTree) -> Result<()> {
        move_forward(tree, &self.movement)
    }

    fn revert(&mut self, tree: &mut FieldTree) -> Result<()> {
        move_back(tree, &self.movement)
    }

    fn display_name(&self) -> &str {
        "Demote Fields"
    }

    fn selection_after(&self, _replay: Replay) -> Vec<NodeId> {
        self.movement.ids.clone()
    }
}

fn move_forward(tree: &mut FieldTree, movement: &RunMove) -> Result<()> {
    expect_children_at(tree, movement.from_parent, movement.from_index, &movement.ids)?;
    mutator::move_run(tree, &movement.ids, movement.to_parent, movement.to_index)?;
    Ok(())
}

fn move_back(tree: &mut FieldTree, movement: &RunMove) -> Result<()> {
    expect_children_at(tree, movement.to_parent, movement.to_index, &movement.ids)?;
    mutator::move_run(tree, &movement.ids, movement.from_parent, movement.from_index)?;
    Ok(())
}

/// Check that `ids` sit under `parent` starting at `index` before replaying
fn expect_children_at(tree: &FieldTree, parent: NodeId, index: usize, ids: &[NodeId]) -> Result<()> {
    let children = tree.node(parent)?.children();
    let found = children.get(index..index + ids.len());
    if found != Some(ids) {
        return Err(EditError::ReplayFailed(format!(
            "expected {} fields under {parent} at index {index}",
            ids.len()
        )));
    }
    Ok(())
}
