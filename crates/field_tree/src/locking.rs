//! Lock and form-completeness queries

use crate::attributes::{
    ELEMENT_NAME, LOCKED_FIELD_USER_NAME, LOCKED_FIELD_UTC, LOCK_LEVEL, REQUIRED_FIELD,
};
use crate::{Attributes, FieldNode, FieldPayload, FieldTree, NodeId};
use serde::{Deserialize, Serialize};

/// How strongly a field is locked. `AllAttributes` outranks `Template`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LockLevel {
    /// The structure is fixed, values may still be filled in
    Template,
    /// Nothing may be edited
    AllAttributes,
}

impl LockLevel {
    pub const TEMPLATE: &'static str = "lockedTemplate";
    pub const ALL_ATTRIBUTES: &'static str = "lockedAllAttributes";

    pub fn as_str(&self) -> &'static str {
        match self {
            LockLevel::Template => Self::TEMPLATE,
            LockLevel::AllAttributes => Self::ALL_ATTRIBUTES,
        }
    }

    /// Any lock level other than all-attributes counts as a template lock
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "" => None,
            Self::ALL_ATTRIBUTES => Some(LockLevel::AllAttributes),
            _ => Some(LockLevel::Template),
        }
    }
}

impl std::fmt::Display for LockLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn lock_level(field: &impl FieldPayload) -> Option<LockLevel> {
    field.attribute(LOCK_LEVEL).and_then(LockLevel::parse)
}

/// Highest lock level among the fields
pub fn max_lock_level<'a>(fields: impl IntoIterator<Item = &'a FieldNode>) -> Option<LockLevel> {
    fields.into_iter().filter_map(|field| lock_level(field)).max()
}

/// Highest lock level among the given nodes and all their descendants
pub fn max_subtree_lock_level(tree: &FieldTree, roots: &[NodeId]) -> Option<LockLevel> {
    max_lock_level(roots.iter().flat_map(|&id| tree.descendants(id)))
}

/// Whether any node, or any of its ancestors, carries `name`
pub fn is_attribute_set_in_lineage(tree: &FieldTree, ids: &[NodeId], name: &str) -> bool {
    ids.iter().any(|&id| has_attribute(tree, id, name) || is_ancestor_attribute_set(tree, &[id], name))
}

/// Whether any strict ancestor of the nodes carries `name`
pub fn is_ancestor_attribute_set(tree: &FieldTree, ids: &[NodeId], name: &str) -> bool {
    ids.iter()
        .any(|&id| tree.ancestors(id).any(|ancestor| has_attribute(tree, ancestor, name)))
}

/// A node is locked when it or an ancestor has a lock time stamp
pub fn is_locked(tree: &FieldTree, id: NodeId) -> bool {
    is_attribute_set_in_lineage(tree, &[id], LOCKED_FIELD_UTC)
}

/// Lock details (name, time stamp, user, level) of each locked node
pub fn locked_fields_attributes(tree: &FieldTree, ids: &[NodeId]) -> Vec<Attributes> {
    ids.iter()
        .filter(|&&id| is_locked(tree, id))
        .filter_map(|&id| tree.get(id))
        .map(|field| {
            [ELEMENT_NAME, LOCKED_FIELD_UTC, LOCKED_FIELD_USER_NAME, LOCK_LEVEL]
                .into_iter()
                .filter_map(|name| field.attribute(name).map(|value| (name, value)))
                .collect()
        })
        .collect()
}

/// Whether a field marked as required has been left empty
pub fn is_any_required_field_empty(tree: &FieldTree) -> bool {
    tree.iter()
        .any(|field| field.is_attribute_true(REQUIRED_FIELD) && !field.is_field_filled())
}

/// Whether loading defaults would overwrite something: a field with a
/// default value whose value attribute is already filled
pub fn is_any_default_field_filled<'a>(fields: impl IntoIterator<Item = &'a FieldNode>) -> bool {
    fields.into_iter().any(|field| {
        field.default_value().is_some() && field.current_value().is_some_and(|v| !v.is_empty())
    })
}

fn has_attribute(tree: &FieldTree, id: NodeId, name: &str) -> bool {
    tree.get(id).is_some_and(|field| field.attribute(name).is_some())
}
