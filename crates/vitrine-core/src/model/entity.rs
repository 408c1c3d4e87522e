// ── Entities and drafts ──

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{EntityId, Value};

/// Attribute name → value, in insertion order.
pub type Attributes = IndexMap<String, Value>;

/// A single managed record: an identifier plus an open attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up an attribute. Missing keys are `None`, never a panic.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Display text of an attribute, empty when missing.
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(ToString::to_string).unwrap_or_default()
    }

    /// Overlay `patch` onto this entity's attributes. The id never changes.
    pub fn apply(&mut self, patch: &Draft) {
        for (key, value) in patch.iter() {
            self.attributes.insert(key.clone(), value.clone());
        }
    }

    /// The attributes as an editable draft (e.g. to prefill an edit form).
    pub fn to_draft(&self) -> Draft {
        Draft(self.attributes.clone())
    }
}

/// Attribute values submitted by a form, or a partial patch.
///
/// A draft has no id: identifiers are assigned by the data-access
/// collaborator on create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Draft(Attributes);

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_attributes(self) -> Attributes {
        self.0
    }
}

impl From<Attributes> for Draft {
    fn from(attributes: Attributes) -> Self {
        Self(attributes)
    }
}

impl FromIterator<(String, Value)> for Draft {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Draft {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_attributes_are_tolerated() {
        let e = Entity::new("1").with("name", "Alpha");
        assert!(e.get("price").is_none());
        assert_eq!(e.text("price"), "");
        assert_eq!(e.text("name"), "Alpha");
    }

    #[test]
    fn apply_overlays_patch_and_keeps_id() {
        let mut e = Entity::new("1").with("name", "Alpha").with("price", 10_i64);
        e.apply(&Draft::new().with("price", 12_i64).with("featured", true));
        assert_eq!(e.id.as_str(), "1");
        assert_eq!(e.get("price"), Some(&Value::from(12_i64)));
        assert_eq!(e.get("featured"), Some(&Value::from(true)));
        assert_eq!(e.get("name"), Some(&Value::from("Alpha")));
    }

    #[test]
    fn entity_serializes_flat() {
        let e = Entity::new("7").with("name", "Seven");
        let json = serde_json::to_value(&e).expect("serialize");
        assert_eq!(json, serde_json::json!({ "id": "7", "name": "Seven" }));
    }
}
