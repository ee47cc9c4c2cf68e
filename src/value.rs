//! Canonical tree model
//!
//! Every conversion decodes its source into a [`Value`] tree and encodes
//! that tree into the target. Trees are plain owned data: acyclic, finite,
//! each child owned by exactly one parent.

use crate::error::{Error, MalformedInput, Result};
use crate::scalar::Scalar;
use indexmap::map::{IntoIter, Iter};
use indexmap::IndexMap;

/// A node of the canonical tree
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit absence of a value
    Null,
    /// A typed leaf
    Scalar(Scalar),
    /// An ordered list of children
    Sequence(Vec<Value>),
    /// An ordered set of uniquely keyed children
    Mapping(Mapping),
}

impl Value {
    /// Create a string scalar without type inference
    pub fn string(text: impl Into<String>) -> Self {
        Value::Scalar(Scalar::String(text.into()))
    }

    /// Create a scalar by inferring its type from text
    pub fn infer(text: &str) -> Self {
        Value::Scalar(crate::scalar::infer(text))
    }

    /// Check if this is Null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null, an empty mapping, an empty sequence or an empty string.
    ///
    /// These are the values XML cannot tell apart.
    pub fn is_empty_like(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Scalar(Scalar::String(s)) => s.is_empty(),
            Value::Scalar(_) => false,
            Value::Sequence(items) => items.is_empty(),
            Value::Mapping(map) => map.is_empty(),
        }
    }

    /// Get the scalar payload
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Get the sequence payload
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Get the mapping payload
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key if this is a mapping
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Nesting depth; leaves and empty containers have depth 1
    pub fn depth(&self) -> usize {
        match self {
            Value::Null | Value::Scalar(_) => 1,
            Value::Sequence(items) => 1 + items.iter().map(Value::depth).max().unwrap_or(0),
            Value::Mapping(map) => 1 + map.values().map(Value::depth).max().unwrap_or(0),
        }
    }

    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Scalar(s) => s.kind().name(),
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Value::Scalar(value)
    }
}

impl From<Mapping> for Value {
    fn from(value: Mapping) -> Self {
        Value::Mapping(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Sequence(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Scalar(Scalar::Bool(value))
    }
}

impl From<i64> for Value {
    /// Narrowest integer scalar holding the value
    fn from(value: i64) -> Self {
        Value::Scalar(Scalar::integer(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(Scalar::Double(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::string(value)
    }
}

/// Insertion-ordered mapping with unique keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: IndexMap<String, Value>,
}

impl Mapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mapping with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Build a mapping from entries, failing on the first duplicate key
    pub fn from_entries<K, I>(entries: I) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut map = Mapping::new();
        for (key, value) in entries {
            map.try_insert(key, value)?;
        }
        Ok(map)
    }

    /// Insert a new entry; a duplicate key is a [`Error::MalformedInput`]
    pub fn try_insert(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(Error::MalformedInput(MalformedInput::new(format!(
                "duplicate mapping key '{}'",
                key
            ))));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Insert or replace an entry, keeping the original position on replace
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Builder-style [`Mapping::insert`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value.into());
        self
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Check if a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the mapping is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.entries.iter()
    }

    /// Iterate over keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Iterate over values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    /// The only entry, if the mapping has exactly one
    pub fn single_entry(&self) -> Option<(&String, &Value)> {
        if self.entries.len() == 1 {
            self.entries.first()
        } else {
            None
        }
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
