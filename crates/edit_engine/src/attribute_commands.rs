//! Commands for attribute-value edits

use crate::{Command, Result};
use field_tree::values::{self, AttributeChange};
use field_tree::{FieldTree, INPUT_TYPE};

/// Which editing action produced an [`EditAttributes`] command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeEditKind {
    SetAttribute(String),
    LoadDefaults,
    ClearFields,
    MultiplyValues,
    LockFields,
    UnlockFields,
    RequiredFields,
}

/// A batch of attribute changes undone and redone together
#[derive(Debug, Clone)]
pub struct EditAttributes {
    kind: AttributeEditKind,
    label: String,
    changes: Vec<AttributeChange>,
}

impl EditAttributes {
    pub fn new(kind: AttributeEditKind, changes: Vec<AttributeChange>) -> Self {
        let label = match &kind {
            AttributeEditKind::SetAttribute(name) => format!("Edit {name}"),
            AttributeEditKind::LoadDefaults => "Load Default Values".to_string(),
            AttributeEditKind::ClearFields => "Clear Fields".to_string(),
            AttributeEditKind::MultiplyValues => "Multiply Values".to_string(),
            AttributeEditKind::LockFields => "Lock Fields".to_string(),
            AttributeEditKind::UnlockFields => "Unlock Fields".to_string(),
            AttributeEditKind::RequiredFields => "Set Required Fields".to_string(),
        };
        Self {
            kind,
            label,
            changes,
        }
    }

    pub fn kind(&self) -> &AttributeEditKind {
        &self.kind
    }

    pub fn changes(&self) -> &[AttributeChange] {
        &self.changes
    }
}

impl Command for EditAttributes {
    fn apply(&mut self, tree: &mut FieldTree) -> Result<()> {
        values::apply_changes(tree, &self.changes)?;
        Ok(())
    }

    fn revert(&mut self, tree: &mut FieldTree) -> Result<()> {
        values::revert_changes(tree, &self.changes)?;
        Ok(())
    }

    fn display_name(&self) -> &str {
        &self.label
    }

    fn is_structural(&self) -> bool {
        false
    }

    /// A changed input type turns the field into another kind of field
    fn needs_redisplay(&self) -> bool {
        self.changes.iter().any(|change| change.name == INPUT_TYPE)
    }
}
