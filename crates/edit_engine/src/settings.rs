//! Editor settings
//!
//! Settings are plain serde structs; every key is optional in the JSON form
//! and falls back to its default.

use crate::Result;
use field_tree::{input_type, Attributes, ELEMENT_NAME, INPUT_TYPE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main editor settings container
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EditorSettings {
    /// Undo history settings
    pub history: HistorySettings,
    /// Attributes given to fields created by "Add New Field"
    pub new_field: NewFieldSettings,
    /// Whether duplicated fields keep their lock attributes
    pub duplicate_lock_attributes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistorySettings {
    /// Maximum number of undoable edits kept, 0 for no limit
    pub max_entries: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { max_entries: 100 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NewFieldSettings {
    pub input_type: String,
    pub element_name: String,
}

impl Default for NewFieldSettings {
    fn default() -> Self {
        Self {
            input_type: input_type::FIXED_STEP.to_string(),
            element_name: "New Field".to_string(),
        }
    }
}

impl NewFieldSettings {
    pub fn attributes(&self) -> Attributes {
        [
            (ELEMENT_NAME, self.element_name.as_str()),
            (INPUT_TYPE, self.input_type.as_str()),
        ]
        .into_iter()
        .collect()
    }
}

impl EditorSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&contents)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded editor settings");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EditError;

    #[test]
    fn test_defaults() {
        let settings = EditorSettings::default();
        assert_eq!(settings.history.max_entries, 100);
        assert_eq!(settings.new_field.input_type, "FixedStep");
        assert!(!settings.duplicate_lock_attributes);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let settings = EditorSettings::from_json(r#"{"history": {"max_entries": 5}}"#).unwrap();
        assert_eq!(settings.history.max_entries, 5);
        assert_eq!(settings.new_field, NewFieldSettings::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut settings = EditorSettings::default();
        settings.duplicate_lock_attributes = true;
        settings.new_field.element_name = "Step".into();
        let json = settings.to_json().unwrap();
        assert_eq!(EditorSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");
        std::fs::write(&path, r#"{"new_field": {"input_type": "TextField"}}"#).unwrap();

        let settings = EditorSettings::load(&path).unwrap();
        assert_eq!(settings.new_field.input_type, "TextField");
        assert_eq!(settings.new_field.element_name, "New Field");

        let missing = EditorSettings::load(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(EditError::Io(_))));
    }

    #[test]
    fn test_invalid_json() {
        let result = EditorSettings::from_json("{ not json");
        assert!(matches!(result, Err(EditError::Settings(_))));
    }
}
