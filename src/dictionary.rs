//! Locale dictionary tree.
//!
//! A dictionary is a tree whose leaves are translatable strings and whose
//! inner nodes are namespace levels. Anything else found in a JSON file
//! (arrays, numbers, booleans, null) is rejected as malformed instead of being
//! passed through.

mod ops;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use serde_json::Value;
use thiserror::Error;

pub use ops::{
    Additions,
    deep_merge,
    diff_additions,
    diff_missing,
    flatten,
    unflatten,
};

/// Errors raised while building or converting a dictionary tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A value in the source JSON is neither a string nor an object.
    #[error("Malformed dictionary at '{path}': expected a string or an object, found {found}")]
    Malformed { path: String, found: &'static str },

    /// Two flat entries disagree on whether a path is a leaf or a namespace.
    #[error("Conflicting dictionary paths at '{path}': a key cannot be both a string and a namespace")]
    PathConflict { path: String },

    /// A flat key produced an empty path segment (e.g. `"a..b"`).
    #[error("Empty path segment in key '{key}'")]
    EmptySegment { key: String },
}

/// A single node of a locale dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Translatable text. Placeholders such as `{name}` are kept verbatim.
    Leaf(String),
    /// Namespace grouping.
    Branch(Dictionary),
}

impl Node {
    /// Returns the branch if this node is one.
    #[must_use]
    pub const fn as_branch(&self) -> Option<&Dictionary> {
        match self {
            Self::Branch(dict) => Some(dict),
            Self::Leaf(_) => None,
        }
    }

    /// Returns the text if this node is a leaf.
    #[must_use]
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Self::Leaf(text) => Some(text),
            Self::Branch(_) => None,
        }
    }
}

/// Mapping level of a locale dictionary. Key order follows the source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    /// Child nodes in insertion order.
    entries: IndexMap<String, Node>,
}

impl Dictionary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.entries.get_mut(key)
    }

    /// Inserts a child, replacing any previous node with the same key.
    pub fn insert(&mut self, key: impl Into<String>, node: Node) -> Option<Node> {
        self.entries.insert(key.into(), node)
    }

    /// Inserts a leaf. Convenience for building fixtures and flat merges.
    pub fn insert_leaf(&mut self, key: impl Into<String>, text: impl Into<String>) -> Option<Node> {
        self.insert(key, Node::Leaf(text.into()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.entries.iter()
    }

    /// Counts the leaves of the whole tree.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.entries
            .values()
            .map(|node| match node {
                Node::Leaf(_) => 1,
                Node::Branch(dict) => dict.leaf_count(),
            })
            .sum()
    }

    /// Looks up a leaf by its path segments.
    #[must_use]
    pub fn leaf_at(&self, path: &[&str]) -> Option<&str> {
        let (last, parents) = path.split_last()?;
        let mut current = self;
        for segment in parents {
            current = current.get(segment)?.as_branch()?;
        }
        current.get(last)?.as_leaf()
    }

    /// All leaves with their path segments, in tree order.
    ///
    /// Unlike [`flatten`] no separator is involved, so keys that contain the
    /// separator character stay unambiguous.
    #[must_use]
    pub fn leaves(&self) -> Vec<(Vec<String>, String)> {
        let mut result = Vec::new();
        let mut prefix = Vec::new();
        self.collect_leaves(&mut prefix, &mut result);
        result
    }

    /// Recursive worker for [`Self::leaves`].
    fn collect_leaves(&self, prefix: &mut Vec<String>, result: &mut Vec<(Vec<String>, String)>) {
        for (key, node) in &self.entries {
            prefix.push(key.clone());
            match node {
                Node::Leaf(text) => result.push((prefix.clone(), text.clone())),
                Node::Branch(dict) => dict.collect_leaves(prefix, result),
            }
            prefix.pop();
        }
    }

    /// Replaces the text of an existing leaf. Returns `false` if there is no leaf at `path`.
    pub fn set_leaf(&mut self, path: &[String], text: impl Into<String>) -> bool {
        let Some((last, parents)) = path.split_last() else {
            return false;
        };
        let mut current = self;
        for segment in parents {
            match current.entries.get_mut(segment) {
                Some(Node::Branch(child)) => current = child,
                _ => return false,
            }
        }
        match current.entries.get_mut(last) {
            Some(Node::Leaf(existing)) => {
                *existing = text.into();
                true
            }
            _ => false,
        }
    }

    /// Converts a parsed JSON document into a dictionary.
    ///
    /// # Errors
    /// Returns [`TreeError::Malformed`] if the root is not an object or any
    /// nested value is not a string or object.
    pub fn from_json(value: &Value) -> Result<Self, TreeError> {
        match value {
            Value::Object(map) => {
                let mut dict = Self::new();
                for (key, child) in map {
                    dict.insert(key.clone(), node_from_json(child, key)?);
                }
                Ok(dict)
            }
            other => Err(TreeError::Malformed { path: String::new(), found: json_kind(other) }),
        }
    }

    /// Converts the dictionary back into JSON, preserving key order.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, node)| {
                    let value = match node {
                        Node::Leaf(text) => Value::String(text.clone()),
                        Node::Branch(dict) => dict.to_json(),
                    };
                    (key.clone(), value)
                })
                .collect(),
        )
    }

    /// Pretty-printed JSON with a trailing newline, the on-disk format of locale files.
    ///
    /// # Errors
    /// Only fails if serialization itself fails, which does not happen for string trees.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }
}

impl<K: Into<String>> FromIterator<(K, Node)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, Node)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}

impl IntoIterator for Dictionary {
    type Item = (String, Node);
    type IntoIter = indexmap::map::IntoIter<String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Recursively converts one JSON value, tracking the dotted path for error messages.
fn node_from_json(value: &Value, path: &str) -> Result<Node, TreeError> {
    match value {
        Value::String(text) => Ok(Node::Leaf(text.clone())),
        Value::Object(map) => {
            let mut dict = Dictionary::new();
            for (key, child) in map {
                dict.insert(key.clone(), node_from_json(child, &format!("{path}.{key}"))?);
            }
            Ok(Node::Branch(dict))
        }
        other => Err(TreeError::Malformed { path: path.to_string(), found: json_kind(other) }),
    }
}

/// Human readable JSON type name.
const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl Serialize for Dictionary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, node) in &self.entries {
            map.serialize_entry(key, node)?;
        }
        map.end()
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(text) => serializer.serialize_str(text),
            Self::Branch(dict) => dict.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Dictionary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}
