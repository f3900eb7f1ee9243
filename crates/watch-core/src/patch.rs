use serde_json::{Map, Value};
use std::collections::BTreeMap;
use watch_models::Document;

/// A single field change in a partial update.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Set(Value),
    Delete,
}

/// Partial update of a document, keyed by dotted field path (`watchedEpisodes.2`).
///
/// Contains exactly the keys an operation changed; an empty patch means "nothing to write".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    entries: BTreeMap<String, FieldUpdate>,
}

impl FieldPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(path.into(), FieldUpdate::Set(value.into()));
        self
    }

    pub fn delete(&mut self, path: impl Into<String>) -> &mut Self {
        self.entries.insert(path.into(), FieldUpdate::Delete);
        self
    }

    pub fn get(&self, path: &str) -> Option<&FieldUpdate> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldUpdate)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Later entries win on identical paths
    pub fn merge(&mut self, other: FieldPatch) {
        self.entries.extend(other.entries);
    }

    /// Apply to a document in place. Intermediate objects are created for `Set`;
    /// `Delete` of a missing path is a no-op.
    pub fn apply_to(&self, document: &mut Document) {
        for (path, update) in &self.entries {
            let segments: Vec<&str> = path.split('.').collect();
            match update {
                FieldUpdate::Set(value) => set_path(document, &segments, value.clone()),
                FieldUpdate::Delete => delete_path(document, &segments),
            }
        }
    }
}

fn set_path(map: &mut Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            map.insert(last.to_string(), value);
        }
        [head, rest @ ..] => {
            let child = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child_map) = child {
                set_path(child_map, rest, value);
            }
        }
    }
}

fn delete_path(map: &mut Map<String, Value>, segments: &[&str]) {
    match segments {
        [] => {}
        [last] => {
            map.remove(*last);
        }
        [head, rest @ ..] => {
            if let Some(Value::Object(child_map)) = map.get_mut(*head) {
                delete_path(child_map, rest);
            }
        }
    }
}
