//! Message file model.
//!
//! A `MessageFile` is the snapshot record of one primary-language file: its
//! stable numeric id, the key/value baseline, and the transient per-run state
//! (statuses and per-mutation values) that is never persisted.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::status::PropertyStatus;

/// Values and statuses for one set of keys.
///
/// Used for the translated values of one mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMap {
    values: IndexMap<String, String>,
    statuses: HashMap<String, PropertyStatus>,
}

impl PropertyMap {
    /// Value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set the value for `key`, returning the previous one.
    pub fn put(&mut self, key: &str, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.to_string(), value.into())
    }

    /// Set value and status together.
    pub fn put_with_status(&mut self, key: &str, value: impl Into<String>, status: PropertyStatus) {
        self.put(key, value);
        self.statuses.insert(key.to_string(), status);
    }

    /// Status of `key`.
    #[must_use]
    pub fn status(&self, key: &str) -> Option<PropertyStatus> {
        self.statuses.get(key).copied()
    }

    /// Whether `key` has a value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate `(key, value)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no key has a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Snapshot record of one primary message file.
///
/// Serializes to `{"id": 3, "properties": {...}}`; statuses and mutation
/// values stay in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFile {
    /// Stable id, assigned once and never reused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,

    /// Baseline key/value map.
    #[serde(default)]
    properties: IndexMap<String, String>,

    #[serde(skip)]
    statuses: HashMap<String, PropertyStatus>,

    #[serde(skip)]
    mutations: IndexMap<String, PropertyMap>,
}

impl MessageFile {
    /// Create an empty record with the given id.
    #[must_use]
    pub fn with_id(id: u32) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Baseline value for `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Store a primary value and derive its status from the previous value.
    ///
    /// Returns the previous value.
    pub fn put_property(&mut self, key: &str, value: impl Into<String>) -> Option<String> {
        let value = value.into();
        let status = PropertyStatus::compare(self.value(key), &value);
        self.statuses.insert(key.to_string(), status);
        self.properties.insert(key.to_string(), value)
    }

    /// Store a primary value with an explicit status.
    pub fn put_property_with_status(&mut self, key: &str, value: impl Into<String>, status: PropertyStatus) {
        self.properties.insert(key.to_string(), value.into());
        self.statuses.insert(key.to_string(), status);
    }

    /// Drop a key from the baseline.
    pub fn remove_property(&mut self, key: &str) -> Option<String> {
        self.statuses.remove(key);
        self.properties.shift_remove(key)
    }

    /// Status of the primary value for `key`.
    #[must_use]
    pub fn status(&self, key: &str) -> Option<PropertyStatus> {
        self.statuses.get(key).copied()
    }

    /// Overwrite the status for `key`.
    pub fn set_status(&mut self, key: &str, status: PropertyStatus) {
        self.statuses.insert(key.to_string(), status);
    }

    /// Baseline keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Baseline `(key, value)` pairs in order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of baseline keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the baseline is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Values collected for `mutation`.
    #[must_use]
    pub fn mutation(&self, mutation: &str) -> Option<&PropertyMap> {
        self.mutations.get(mutation)
    }

    /// Values collected for `mutation`, created on demand.
    pub fn mutation_mut(&mut self, mutation: &str) -> &mut PropertyMap {
        self.mutations.entry(mutation.to_string()).or_default()
    }

    /// Record one translated value.
    pub fn put_mutation_value(&mut self, mutation: &str, key: &str, value: impl Into<String>) -> Option<String> {
        self.mutation_mut(mutation).put(key, value)
    }

    /// Record with this id and `baseline`'s values for the keys still present here.
    #[must_use]
    pub fn rebased_on(&self, baseline: Option<&MessageFile>) -> Self {
        let properties = baseline
            .map(|b| {
                b.properties
                    .iter()
                    .filter(|(key, _)| self.properties.contains_key(key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            id: self.id,
            properties,
            ..Self::default()
        }
    }

    /// Forget all transient statuses and mutation values.
    pub fn clear_transient(&mut self) {
        self.statuses.clear();
        self.mutations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_property_derives_status() {
        let mut file = MessageFile::with_id(1);
        file.put_property("a", "1");
        assert_eq!(file.status("a"), Some(PropertyStatus::New));
        file.put_property("a", "1");
        assert_eq!(file.status("a"), Some(PropertyStatus::Unchanged));
        assert_eq!(file.put_property("a", "2").as_deref(), Some("1"));
        assert_eq!(file.status("a"), Some(PropertyStatus::Changed));
    }

    #[test]
    fn test_serialization_excludes_transient_state() {
        let mut file = MessageFile::with_id(7);
        file.put_property("greeting", "Hello");
        file.put_mutation_value("de", "greeting", "Hallo");

        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json, serde_json::json!({"id": 7, "properties": {"greeting": "Hello"}}));
    }

    #[test]
    fn test_deserialize_without_id() {
        let file: MessageFile = serde_json::from_str(r#"{"properties": {"k": "v"}}"#).unwrap();
        assert_eq!(file.id, None);
        assert_eq!(file.value("k"), Some("v"));
    }

    #[test]
    fn test_remove_property_keeps_order() {
        let mut file = MessageFile::default();
        file.put_property("a", "1");
        file.put_property("b", "2");
        file.put_property("c", "3");
        file.remove_property("b");
        assert_eq!(file.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(file.status("b"), None);
    }

    #[test]
    fn test_mutation_values() {
        let mut file = MessageFile::default();
        assert!(file.mutation("de").is_none());
        file.put_mutation_value("de", "k", "v");
        assert_eq!(file.mutation("de").unwrap().get("k"), Some("v"));
        file.clear_transient();
        assert!(file.mutation("de").is_none());
    }
}
