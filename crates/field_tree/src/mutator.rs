//! Structural edit algorithms
//!
//! Stateless functions over a [`FieldTree`]. Each one validates its inputs
//! before touching the tree, so a returned error means nothing changed.
//! Edits that run into the edge of the tree report an
//! [`EditOutcome::Boundary`] instead of an error.

use crate::attributes::LOCK_ATTRIBUTES;
use crate::{
    Boundary, EditOutcome, FieldNode, FieldTree, ImportSource, NodeId, Result, Subtree, TreeError,
};
use std::collections::HashSet;

/// A contiguous run of siblings under one parent, in sibling order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingRun {
    parent: NodeId,
    start: usize,
    ids: Vec<NodeId>,
}

impl SiblingRun {
    /// Resolve ids into a run. The ids may be given in any order but must
    /// share a parent and cover an unbroken range of sibling indices.
    pub fn resolve(tree: &FieldTree, ids: &[NodeId]) -> Result<Self> {
        let first = *ids.first().ok_or(TreeError::EmptyRun)?;
        if ids.iter().any(|&id| tree.is_root(id)) {
            return Err(TreeError::RootNotAllowed);
        }
        let parent = tree
            .node(first)?
            .parent()
            .ok_or(TreeError::Detached(first))?;

        let mut indexed = Vec::with_capacity(ids.len());
        for &id in ids {
            let node = tree.node(id)?;
            if node.parent() != Some(parent) {
                return Err(TreeError::MixedParents);
            }
            let index = tree
                .sibling_index(id)
                .ok_or(TreeError::Detached(id))?;
            indexed.push((index, id));
        }
        indexed.sort_by_key(|&(index, _)| index);

        let start = indexed[0].0;
        if indexed
            .iter()
            .enumerate()
            .any(|(offset, &(index, _))| index != start + offset)
        {
            return Err(TreeError::NotContiguous);
        }

        Ok(Self {
            parent,
            start,
            ids: indexed.into_iter().map(|(_, id)| id).collect(),
        })
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    /// Sibling index of the first node
    pub fn start(&self) -> usize {
        self.start
    }

    /// Sibling index just past the last node
    pub fn end(&self) -> usize {
        self.start + self.ids.len()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn into_ids(self) -> Vec<NodeId> {
        self.ids
    }
}

/// Where a run was moved from and to by a promote or demote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMove {
    pub ids: Vec<NodeId>,
    pub from_parent: NodeId,
    pub from_index: usize,
    pub to_parent: NodeId,
    pub to_index: usize,
}

/// Nodes inserted as consecutive children of one parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub parent: NodeId,
    pub index: usize,
    pub ids: Vec<NodeId>,
}

/// A node removed by [`delete_nodes`], with everything needed to put it back
#[derive(Debug, Clone)]
pub struct Removal {
    pub parent: NodeId,
    pub index: usize,
    pub subtree: Subtree,
}

impl Removal {
    pub fn id(&self) -> NodeId {
        self.subtree.root_id()
    }
}

/// Insert a fresh node under `parent` at `index`
pub fn insert_child(
    tree: &mut FieldTree,
    parent: NodeId,
    node: FieldNode,
    index: usize,
) -> Result<NodeId> {
    if node.parent().is_some() || node.child_count() > 0 || tree.contains(node.id()) {
        return Err(TreeError::AlreadyAttached(node.id()));
    }
    let id = node.id();
    tree.attach(parent, index, Subtree::single(node))?;
    Ok(id)
}

/// Detach the given nodes. A node whose ancestor is also listed goes out
/// with that ancestor's subtree and gets no removal of its own.
///
/// Removals are returned in the order they happened; restoring them in
/// reverse order puts every node back at its exact position.
pub fn delete_nodes(tree: &mut FieldTree, ids: &[NodeId]) -> Result<Vec<Removal>> {
    for &id in ids {
        if tree.is_root(id) {
            return Err(TreeError::RootNotAllowed);
        }
        if !tree.contains(id) {
            return Err(TreeError::Detached(id));
        }
    }

    let listed: HashSet<NodeId> = ids.iter().copied().collect();
    let mut seen = HashSet::new();
    let targets: Vec<NodeId> = ids
        .iter()
        .copied()
        .filter(|&id| seen.insert(id))
        .filter(|&id| !tree.ancestors(id).any(|a| listed.contains(&a)))
        .collect();

    let mut removals = Vec::with_capacity(targets.len());
    for id in targets {
        let (parent, index, subtree) = tree.detach(id)?;
        removals.push(Removal {
            parent,
            index,
            subtree,
        });
    }
    Ok(removals)
}

/// Undo [`delete_nodes`]: reattach in reverse removal order
pub fn restore_removals(tree: &mut FieldTree, removals: Vec<Removal>) -> Result<Vec<NodeId>> {
    let mut restored = Vec::with_capacity(removals.len());
    for removal in removals.into_iter().rev() {
        let id = removal.id();
        tree.attach(removal.parent, removal.index, removal.subtree)?;
        restored.push(id);
    }
    restored.reverse();
    Ok(restored)
}

/// Swap the run with its preceding sibling
pub fn move_up(tree: &mut FieldTree, ids: &[NodeId]) -> Result<EditOutcome<SiblingRun>> {
    let run = SiblingRun::resolve(tree, ids)?;
    if run.start == 0 {
        return Ok(EditOutcome::Boundary(Boundary::NoPrecedingSibling));
    }
    let preceding = tree
        .child(run.parent, run.start - 1)
        .ok_or(TreeError::NotContiguous)?;
    // after removing the preceding sibling the run starts one slot earlier
    tree.relink(preceding, run.parent, run.end() - 1)?;
    Ok(EditOutcome::Applied(SiblingRun {
        start: run.start - 1,
        ..run
    }))
}

/// Swap the run with its following sibling
pub fn move_down(tree: &mut FieldTree, ids: &[NodeId]) -> Result<EditOutcome<SiblingRun>> {
    let run = SiblingRun::resolve(tree, ids)?;
    let Some(following) = tree.child(run.parent, run.end()) else {
        return Ok(EditOutcome::Boundary(Boundary::NoFollowingSibling));
    };
    tree.relink(following, run.parent, run.start)?;
    Ok(EditOutcome::Applied(SiblingRun {
        start: run.start + 1,
        ..run
    }))
}

/// Make the run siblings of its parent, placed right after the parent
pub fn promote(tree: &mut FieldTree, ids: &[NodeId]) -> Result<EditOutcome<RunMove>> {
    let run = SiblingRun::resolve(tree, ids)?;
    let Some(grandparent) = tree.parent(run.parent) else {
        return Ok(EditOutcome::Boundary(Boundary::NoGrandparent));
    };
    let parent_index = tree
        .sibling_index(run.parent)
        .ok_or(TreeError::Detached(run.parent))?;
    let to_index = parent_index + 1;

    for (offset, &id) in run.ids.iter().enumerate() {
        tree.relink(id, grandparent, to_index + offset)?;
    }
    Ok(EditOutcome::Applied(RunMove {
        from_parent: run.parent,
        from_index: run.start,
        to_parent: grandparent,
        to_index,
        ids: run.ids,
    }))
}

/// Make the run the last children of its preceding sibling
pub fn demote(tree: &mut FieldTree, ids: &[NodeId]) -> Result<EditOutcome<RunMove>> {
    let run = SiblingRun::resolve(tree, ids)?;
    if run.start == 0 {
        return Ok(EditOutcome::Boundary(Boundary::NoPrecedingSibling));
    }
    let new_parent = tree
        .child(run.parent, run.start - 1)
        .ok_or(TreeError::NotContiguous)?;
    let to_index = tree.children(new_parent).len();

    for (offset, &id) in run.ids.iter().enumerate() {
        tree.relink(id, new_parent, to_index + offset)?;
    }
    Ok(EditOutcome::Applied(RunMove {
        from_parent: run.parent,
        from_index: run.start,
        to_parent: new_parent,
        to_index,
        ids: run.ids,
    }))
}

/// Move a run to consecutive positions under `parent` starting at `index`.
/// None of the ids may currently be a child of `parent`.
pub fn move_run(tree: &mut FieldTree, ids: &[NodeId], parent: NodeId, index: usize) -> Result<()> {
    let len = tree.node(parent)?.child_count();
    if index > len {
        return Err(TreeError::IndexOutOfRange { parent, index, len });
    }
    for &id in ids {
        if tree.is_root(id) {
            return Err(TreeError::RootNotAllowed);
        }
        let node = tree.node(id)?;
        if node.parent() == Some(parent) {
            return Err(TreeError::Structure(format!("{id} already lives under {parent}")));
        }
        if id == parent || tree.is_ancestor(id, parent) {
            return Err(TreeError::Structure(format!("cannot move {id} beneath itself")));
        }
    }

    for (offset, &id) in ids.iter().enumerate() {
        tree.relink(id, parent, index + offset)?;
    }
    Ok(())
}

/// Deep-copy the run and insert the copies right after it
pub fn duplicate(tree: &mut FieldTree, ids: &[NodeId], keep_locks: bool) -> Result<Insertion> {
    let run = SiblingRun::resolve(tree, ids)?;
    let mut copies = Vec::with_capacity(run.len());
    for &id in run.ids() {
        let mut copy = tree.copy_subtree(id)?;
        if !keep_locks {
            copy.strip_attributes(&LOCK_ATTRIBUTES);
        }
        copies.push(copy);
    }
    attach_all(tree, run.parent, run.end(), copies)
}

/// Deep-copy nodes from another tree and insert them at `index` under `parent`
pub fn import_nodes<S: ImportSource + ?Sized>(
    tree: &mut FieldTree,
    source: &S,
    source_ids: &[NodeId],
    parent: NodeId,
    index: usize,
) -> Result<Insertion> {
    let len = tree.node(parent)?.child_count();
    if index > len {
        return Err(TreeError::IndexOutOfRange { parent, index, len });
    }
    let copies = source_ids
        .iter()
        .map(|&id| source.copy_subtree(id))
        .collect::<Result<Vec<_>>>()?;
    attach_all(tree, parent, index, copies)
}

fn attach_all(
    tree: &mut FieldTree,
    parent: NodeId,
    index: usize,
    subtrees: Vec<Subtree>,
) -> Result<Insertion> {
    let mut ids = Vec::with_capacity(subtrees.len());
    for (offset, subtree) in subtrees.into_iter().enumerate() {
        ids.push(subtree.root_id());
        tree.attach(parent, index + offset, subtree)?;
    }
    Ok(Insertion { parent, index, ids })
}
