//! Attribute-value edits: setting attributes, loading defaults, clearing
//! values, scaling numbers, locking and marking fields as required.
//!
//! Every function validates all target ids first and returns the list of
//! changes it made, which is enough to revert or replay the edit.

use crate::attributes::{input_type, LOCKED_FIELD_UTC, LOCK_ATTRIBUTES, REQUIRED_FIELD};
use crate::{FieldPayload, FieldTree, NodeId, Result};
use std::collections::HashSet;

/// One attribute going from `before` to `after` (`None` means absent)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    pub node: NodeId,
    pub name: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Set or remove a single attribute
pub fn set_attribute(
    tree: &mut FieldTree,
    node: NodeId,
    name: &str,
    value: Option<String>,
) -> Result<Option<AttributeChange>> {
    tree.node(node)?;
    Ok(change(tree, node, name, value))
}

/// Re-apply recorded changes
pub fn apply_changes(tree: &mut FieldTree, changes: &[AttributeChange]) -> Result<()> {
    ensure_present(tree, changes.iter().map(|c| c.node))?;
    for c in changes {
        tree.node_mut(c.node)?.set_attribute(&c.name, c.after.clone());
    }
    Ok(())
}

/// Revert recorded changes, last change first
pub fn revert_changes(tree: &mut FieldTree, changes: &[AttributeChange]) -> Result<()> {
    ensure_present(tree, changes.iter().map(|c| c.node))?;
    for c in changes.iter().rev() {
        tree.node_mut(c.node)?.set_attribute(&c.name, c.before.clone());
    }
    Ok(())
}

/// Copy each field's default value into its value attribute, for the given
/// nodes and all their descendants
pub fn copy_default_values(tree: &mut FieldTree, roots: &[NodeId]) -> Result<Vec<AttributeChange>> {
    let targets = subtree_nodes(tree, roots)?;
    let mut changes = Vec::new();
    for id in targets {
        let Ok(node) = tree.node(id) else { continue };
        let Some(default) = node.default_value().map(str::to_string) else {
            continue;
        };
        let value_attribute = node.value_attribute().to_string();
        changes.extend(change(tree, id, &value_attribute, Some(default)));
    }
    Ok(changes)
}

/// Remove the value of every field that has one, for the given nodes and
/// all their descendants
pub fn clear_values(tree: &mut FieldTree, roots: &[NodeId]) -> Result<Vec<AttributeChange>> {
    let targets = subtree_nodes(tree, roots)?;
    let mut changes = Vec::new();
    for id in targets {
        let Ok(node) = tree.node(id) else { continue };
        let value_attribute = node.value_attribute().to_string();
        changes.extend(change(tree, id, &value_attribute, None));
    }
    Ok(changes)
}

/// Multiply the value of number fields by `factor`. Other field types and
/// values that do not parse as numbers are left alone.
pub fn multiply_values(tree: &mut FieldTree, ids: &[NodeId], factor: f64) -> Result<Vec<AttributeChange>> {
    ensure_present(tree, ids.iter().copied())?;
    let mut changes = Vec::new();
    for &id in ids {
        let node = tree.node(id)?;
        if node.input_type() != Some(input_type::NUMBER_FIELD) {
            continue;
        }
        let Some(number) = node.current_value().and_then(|v| v.trim().parse::<f64>().ok()) else {
            continue;
        };
        let value_attribute = node.value_attribute().to_string();
        let scaled = (number * factor).to_string();
        changes.extend(change(tree, id, &value_attribute, Some(scaled)));
    }
    Ok(changes)
}

/// Stamp the fields as locked at `locked_at_millis` (UTC) with the extra
/// locking attributes, e.g. user name and lock level
pub fn lock_fields(
    tree: &mut FieldTree,
    ids: &[NodeId],
    locking_attributes: &[(String, String)],
    locked_at_millis: i64,
) -> Result<Vec<AttributeChange>> {
    ensure_present(tree, ids.iter().copied())?;
    let mut changes = Vec::new();
    for &id in ids {
        changes.extend(change(tree, id, LOCKED_FIELD_UTC, Some(locked_at_millis.to_string())));
        for (name, value) in locking_attributes {
            changes.extend(change(tree, id, name, Some(value.clone())));
        }
    }
    Ok(changes)
}

/// Remove every lock attribute from the fields
pub fn unlock_fields(tree: &mut FieldTree, ids: &[NodeId]) -> Result<Vec<AttributeChange>> {
    ensure_present(tree, ids.iter().copied())?;
    let mut changes = Vec::new();
    for &id in ids {
        for name in LOCK_ATTRIBUTES {
            changes.extend(change(tree, id, name, None));
        }
    }
    Ok(changes)
}

pub fn set_required(tree: &mut FieldTree, ids: &[NodeId], required: bool) -> Result<Vec<AttributeChange>> {
    ensure_present(tree, ids.iter().copied())?;
    let value = required.then(|| "true".to_string());
    let mut changes = Vec::new();
    for &id in ids {
        changes.extend(change(tree, id, REQUIRED_FIELD, value.clone()));
    }
    Ok(changes)
}

fn change(tree: &mut FieldTree, node: NodeId, name: &str, after: Option<String>) -> Option<AttributeChange> {
    let field = tree.get_mut(node)?;
    if field.attribute(name) == after.as_deref() {
        return None;
    }
    let before = field.set_attribute(name, after.clone());
    Some(AttributeChange {
        node,
        name: name.to_string(),
        before,
        after,
    })
}

fn ensure_present(tree: &FieldTree, ids: impl IntoIterator<Item = NodeId>) -> Result<()> {
    for id in ids {
        tree.node(id)?;
    }
    Ok(())
}

/// Pre-order nodes of every subtree, each visited once
fn subtree_nodes(tree: &FieldTree, roots: &[NodeId]) -> Result<Vec<NodeId>> {
    ensure_present(tree, roots.iter().copied())?;
    let mut seen = HashSet::new();
    Ok(roots
        .iter()
        .flat_map(|&root| tree.descendants(root))
        .map(|node| node.id())
        .filter(|&id| seen.insert(id))
        .collect())
}
