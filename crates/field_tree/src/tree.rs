//! Field tree storage and link maintenance

use crate::attributes::{input_type, INPUT_TYPE};
use crate::{Attributes, FieldNode, NodeId, Result, TreeError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An ordered tree of fields.
///
/// Only nodes reachable from the root live in the storage map. Detaching a
/// node moves it, together with its whole subtree, out into a [`Subtree`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawFieldTree")]
pub struct FieldTree {
    root: NodeId,
    nodes: HashMap<NodeId, FieldNode>,
}

/// Serialized form of a [`FieldTree`], checked before it becomes one
#[derive(Deserialize)]
struct RawFieldTree {
    root: NodeId,
    nodes: HashMap<NodeId, FieldNode>,
}

impl TryFrom<RawFieldTree> for FieldTree {
    type Error = TreeError;

    fn try_from(raw: RawFieldTree) -> Result<Self> {
        let tree = FieldTree {
            root: raw.root,
            nodes: raw.nodes,
        };
        tree.validate()?;
        Ok(tree)
    }
}

/// A detached subtree owned outside any tree.
///
/// Produced by detaching or deep-copying a node, and consumed by
/// [`FieldTree::attach`].
#[derive(Debug, Clone)]
pub struct Subtree {
    root: NodeId,
    nodes: HashMap<NodeId, FieldNode>,
}

/// Anything nodes can be imported from: another tree, a clipboard subtree.
pub trait ImportSource {
    fn source_root(&self) -> NodeId;

    /// Deep copy of the node and its descendants under fresh ids
    fn copy_subtree(&self, id: NodeId) -> Result<Subtree>;
}

impl FieldTree {
    /// Create a tree holding only a root with the given attributes
    pub fn new(root_attributes: Attributes) -> Self {
        let root = FieldNode::with_attributes(root_attributes);
        let root_id = root.id();
        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);
        Self {
            root: root_id,
            nodes,
        }
    }

    /// A blank protocol: a title root with one default step under it
    pub fn blank_protocol() -> Self {
        let mut tree = Self::new([(INPUT_TYPE, input_type::PROTOCOL_TITLE)].into_iter().collect());
        let step = FieldNode::with_attributes([(INPUT_TYPE, input_type::FIXED_STEP)].into_iter().collect());
        let root = tree.root_id();
        // a fresh node under an existing root cannot fail
        let _ = tree.attach(root, 0, Subtree::single(step));
        tree
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> Option<&FieldNode> {
        self.nodes.get(&self.root)
    }

    pub fn get(&self, id: NodeId) -> Option<&FieldNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut FieldNode> {
        self.nodes.get_mut(&id)
    }

    /// Like [`get`](Self::get) but reports a missing node as an error
    pub fn node(&self, id: NodeId) -> Result<&FieldNode> {
        self.nodes.get(&id).ok_or(TreeError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut FieldNode> {
        self.nodes.get_mut(&id).ok_or(TreeError::NodeNotFound(id))
    }

    /// Whether the node is attached to this tree
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of attached nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        id == self.root
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.children()).unwrap_or(&[])
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent())
    }

    /// Zero-based position among the parent's children
    pub fn sibling_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.nodes.get(&parent)?.child_index(id)
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Whether `ancestor` is a strict ancestor of `id`
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Pre-order walk of the subtree rooted at `id`, including `id`
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            nodes: &self.nodes,
            stack: vec![id],
        }
    }

    /// Pre-order walk of the whole tree
    pub fn iter(&self) -> Descendants<'_> {
        self.descendants(self.root)
    }

    /// Attach a detached subtree under `parent` at `index`
    pub fn attach(&mut self, parent: NodeId, index: usize, subtree: Subtree) -> Result<()> {
        let len = self.node(parent)?.child_count();
        if index > len {
            return Err(TreeError::IndexOutOfRange { parent, index, len });
        }
        if let Some(clash) = subtree.nodes.keys().find(|id| self.nodes.contains_key(id)) {
            return Err(TreeError::AlreadyAttached(*clash));
        }

        let Subtree { root, mut nodes } = subtree;
        if let Some(node) = nodes.get_mut(&root) {
            node.set_parent(Some(parent));
        }
        self.nodes.extend(nodes);
        self.node_mut(parent)?.insert_child(index, root);
        Ok(())
    }

    /// Detach a node and its subtree. Returns the former parent, the former
    /// sibling index and the detached subtree.
    pub fn detach(&mut self, id: NodeId) -> Result<(NodeId, usize, Subtree)> {
        if self.is_root(id) {
            return Err(TreeError::RootNotAllowed);
        }
        let parent = self.parent(id).ok_or(TreeError::Detached(id))?;
        let index = self
            .sibling_index(id)
            .ok_or_else(|| TreeError::Structure(format!("{id} missing from its parent")))?;

        let ids: Vec<NodeId> = self.descendants(id).map(|n| n.id()).collect();
        self.node_mut(parent)?.remove_child_at(index);

        let mut nodes = HashMap::with_capacity(ids.len());
        for node_id in ids {
            if let Some(node) = self.nodes.remove(&node_id) {
                nodes.insert(node_id, node);
            }
        }
        if let Some(node) = nodes.get_mut(&id) {
            node.set_parent(None);
            node.set_highlighted(false);
        }
        Ok((parent, index, Subtree { root: id, nodes }))
    }

    /// Move an attached node to `new_parent` at `index`. The index is
    /// interpreted after the node has been removed from its old position.
    pub fn relink(&mut self, id: NodeId, new_parent: NodeId, index: usize) -> Result<()> {
        if self.is_root(id) {
            return Err(TreeError::RootNotAllowed);
        }
        let old_parent = self.parent(id).ok_or(TreeError::NodeNotFound(id))?;
        let new_len = self.node(new_parent)?.child_count();
        if new_parent == id || self.is_ancestor(id, new_parent) {
            return Err(TreeError::Structure(format!(
                "cannot move {id} beneath itself"
            )));
        }
        let len = if new_parent == old_parent { new_len - 1 } else { new_len };
        if index > len {
            return Err(TreeError::IndexOutOfRange {
                parent: new_parent,
                index,
                len,
            });
        }

        let old_index = self
            .sibling_index(id)
            .ok_or_else(|| TreeError::Structure(format!("{id} missing from its parent")))?;
        self.node_mut(old_parent)?.remove_child_at(old_index);
        self.node_mut(new_parent)?.insert_child(index, id);
        self.node_mut(id)?.set_parent(Some(new_parent));
        Ok(())
    }

    /// Check the parent/child link invariants over the whole storage
    pub fn validate(&self) -> Result<()> {
        if !self.nodes.contains_key(&self.root) {
            return Err(TreeError::NodeNotFound(self.root));
        }
        if self.parent(self.root).is_some() {
            return Err(TreeError::Structure("root has a parent".into()));
        }
        for (&id, node) in &self.nodes {
            if node.id() != id {
                return Err(TreeError::Structure(format!("{} stored under {id}", node.id())));
            }
            for &child in node.children() {
                let child_node = self.node(child)?;
                if child_node.parent() != Some(node.id()) {
                    return Err(TreeError::Structure(format!(
                        "{child} does not point back to {}",
                        node.id()
                    )));
                }
            }
            if let Some(parent) = node.parent() {
                let count = self
                    .node(parent)?
                    .children()
                    .iter()
                    .filter(|&&c| c == node.id())
                    .count();
                if count != 1 {
                    return Err(TreeError::Structure(format!(
                        "{} appears {count} times under {parent}",
                        node.id()
                    )));
                }
            } else if node.id() != self.root {
                return Err(TreeError::Structure(format!("{} has no parent", node.id())));
            }
        }
        if self.iter().count() != self.nodes.len() {
            return Err(TreeError::Structure("unreachable nodes in storage".into()));
        }
        Ok(())
    }

    pub(crate) fn set_highlighted(&mut self, id: NodeId, highlighted: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.set_highlighted(highlighted);
        }
    }
}

impl Default for FieldTree {
    fn default() -> Self {
        Self::blank_protocol()
    }
}

impl ImportSource for FieldTree {
    fn source_root(&self) -> NodeId {
        self.root
    }

    fn copy_subtree(&self, id: NodeId) -> Result<Subtree> {
        deep_copy(&self.nodes, id)
    }
}

impl Subtree {
    /// Wrap a freshly created node. Nodes taken from a tree carry links and
    /// must go through [`FieldTree::detach`] instead.
    pub fn single(node: FieldNode) -> Self {
        let mut node = node;
        node.set_parent(None);
        node.children_mut().clear();
        let root = node.id();
        let mut nodes = HashMap::new();
        nodes.insert(root, node);
        Self { root, nodes }
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&FieldNode> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order walk from the subtree root
    pub fn iter(&self) -> Descendants<'_> {
        Descendants {
            nodes: &self.nodes,
            stack: vec![self.root],
        }
    }

    /// Remove the named attributes from every node of the subtree
    pub fn strip_attributes(&mut self, names: &[&str]) {
        for node in self.nodes.values_mut() {
            for name in names {
                node.attributes.remove(name);
            }
        }
    }
}

impl ImportSource for Subtree {
    fn source_root(&self) -> NodeId {
        self.root
    }

    fn copy_subtree(&self, id: NodeId) -> Result<Subtree> {
        deep_copy(&self.nodes, id)
    }
}

fn deep_copy(nodes: &HashMap<NodeId, FieldNode>, id: NodeId) -> Result<Subtree> {
    let source = nodes.get(&id).ok_or(TreeError::NodeNotFound(id))?;
    let mut copied = HashMap::new();
    let root = copy_into(nodes, source, None, &mut copied);
    Ok(Subtree {
        root,
        nodes: copied,
    })
}

fn copy_into(
    nodes: &HashMap<NodeId, FieldNode>,
    source: &FieldNode,
    parent: Option<NodeId>,
    out: &mut HashMap<NodeId, FieldNode>,
) -> NodeId {
    let mut copy = source.fresh_copy();
    copy.set_parent(parent);
    let copy_id = copy.id();
    for child in source.children() {
        if let Some(child_node) = nodes.get(child) {
            let child_copy = copy_into(nodes, child_node, Some(copy_id), out);
            copy.children_mut().push(child_copy);
        }
    }
    out.insert(copy_id, copy);
    copy_id
}

/// Iterator over a node's ancestors, nearest first
pub struct Ancestors<'a> {
    tree: &'a FieldTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Pre-order iterator over a subtree
pub struct Descendants<'a> {
    nodes: &'a HashMap<NodeId, FieldNode>,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a FieldNode;

    fn next(&mut self) -> Option<&'a FieldNode> {
        while let Some(id) = self.stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                self.stack.extend(node.children().iter().rev());
                return Some(node);
            }
        }
        None
    }
}
