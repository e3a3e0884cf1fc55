//! Field attributes and the payload capability interface
//!
//! Every node carries an ordered bag of string attributes. The editing
//! actions only rely on a handful of well-known names, collected here.

use serde::{Deserialize, Serialize};

/// Display name of the field
pub const ELEMENT_NAME: &str = "elementName";
/// Kind of form field (see the `input_type` module)
pub const INPUT_TYPE: &str = "inputType";
/// Default value loaded by "Load Default Values"
pub const DEFAULT: &str = "default";
/// Current value entered by the user
pub const VALUE: &str = "value";
/// `"true"` when the field must be filled in
pub const REQUIRED_FIELD: &str = "required";
/// UTC milliseconds at which the field was locked
pub const LOCKED_FIELD_UTC: &str = "lockedFieldUTC";
pub const LOCKED_FIELD_USER_NAME: &str = "lockedFieldUserName";
pub const LOCK_LEVEL: &str = "lockLevel";
/// Editor version stamped on the root before saving
pub const VERSION: &str = "version";

/// Attributes describing a lock. Duplicates do not inherit them.
pub const LOCK_ATTRIBUTES: [&str; 3] = [LOCKED_FIELD_UTC, LOCKED_FIELD_USER_NAME, LOCK_LEVEL];

/// Well-known values of the `inputType` attribute
pub mod input_type {
    pub const PROTOCOL_TITLE: &str = "ProtocolTitle";
    pub const FIXED_STEP: &str = "FixedStep";
    pub const TEXT_FIELD: &str = "TextField";
    pub const NUMBER_FIELD: &str = "NumberField";
    pub const CUSTOM: &str = "Custom";
}

/// Capability interface over a field's attribute bag.
///
/// The editing algorithms never look at a concrete payload type; they read
/// and write named attributes and use the default/current value pairing.
pub trait FieldPayload {
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Set (`Some`) or remove (`None`) an attribute, returning the previous value
    fn set_attribute(&mut self, name: &str, value: Option<String>) -> Option<String>;

    fn input_type(&self) -> Option<&str> {
        self.attribute(INPUT_TYPE)
    }

    fn name(&self) -> Option<&str> {
        self.attribute(ELEMENT_NAME)
    }

    fn default_value(&self) -> Option<&str> {
        self.attribute(DEFAULT)
    }

    /// Name of the attribute that holds the current value, and receives the
    /// default value when defaults are loaded
    fn value_attribute(&self) -> &str {
        VALUE
    }

    fn current_value(&self) -> Option<&str> {
        self.attribute(self.value_attribute())
    }

    fn is_attribute_true(&self, name: &str) -> bool {
        self.attribute(name)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// A field is filled when its current value is present and not blank
    fn is_field_filled(&self) -> bool {
        self.current_value().is_some_and(|v| !v.trim().is_empty())
    }
}

/// Ordered list of named string attributes.
///
/// Insertion order is preserved so external serializers can reproduce the
/// original attribute order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, keeping its position if it already exists.
    /// Returns the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive search over attribute values
    pub fn contains_search_word(&self, word: &str) -> bool {
        let needle = word.to_lowercase();
        self.entries
            .iter()
            .any(|(_, value)| value.to_lowercase().contains(&needle))
    }
}

impl FieldPayload for Attributes {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.get(name)
    }

    fn set_attribute(&mut self, name: &str, value: Option<String>) -> Option<String> {
        match value {
            Some(value) => self.set(name, value),
            None => self.remove(name),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in iter {
            attributes.set(name, value);
        }
        attributes
    }
}
