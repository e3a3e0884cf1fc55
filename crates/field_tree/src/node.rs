//! Field node type

use crate::{Attributes, FieldPayload, NodeId};
use serde::{Deserialize, Serialize};

/// One field of the tree: an attribute bag plus ordered child links.
///
/// Parent and child links are ids into the owning [`crate::FieldTree`]; they
/// are only changed by the tree's attach/detach/relink operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldNode {
    id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub attributes: Attributes,
    /// Transient highlight flag, owned by the selection set
    #[serde(skip)]
    highlighted: bool,
}

impl FieldNode {
    /// Create a detached node with no attributes
    pub fn new() -> Self {
        Self::with_attributes(Attributes::new())
    }

    /// Create a detached node with the given attributes
    pub fn with_attributes(attributes: Attributes) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            children: Vec::new(),
            attributes,
            highlighted: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub(crate) fn set_highlighted(&mut self, highlighted: bool) {
        self.highlighted = highlighted;
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn insert_child(&mut self, index: usize, child: NodeId) {
        self.children.insert(index, child);
    }

    pub(crate) fn remove_child_at(&mut self, index: usize) -> NodeId {
        self.children.remove(index)
    }

    pub(crate) fn child_index(&self, child: NodeId) -> Option<usize> {
        self.children.iter().position(|&id| id == child)
    }

    /// Copy of this node under a fresh id, without links or highlight
    pub(crate) fn fresh_copy(&self) -> Self {
        Self::with_attributes(self.attributes.clone())
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.children
    }
}

impl Default for FieldNode {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldPayload for FieldNode {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    fn set_attribute(&mut self, name: &str, value: Option<String>) -> Option<String> {
        self.attributes.set_attribute(name, value)
    }
}
