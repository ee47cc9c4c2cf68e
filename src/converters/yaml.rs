//! YAML adapter
//!
//! YAML scalars are treated as text. [`parse_stream`] reads the text twice:
//! once into `serde_yaml::Value` to learn the shape of each document, then
//! again guided by that shape so every plain or quoted scalar is kept as its
//! source text. The adapter types that text with [`crate::scalar::infer`],
//! so `0x10` or `.inf` stay strings here exactly as they would in XML.
//!
//! A YAML stream is a `Vec<serde_yaml::Value>`, one entry per document.

use super::Adapter;
use crate::comparison::{index_path, key_path};
use crate::error::{Error, MalformedInput, Result};
use crate::limits::Limits;
use crate::scalar::Scalar;
use crate::value::{Mapping, Value};
use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_yaml::{Mapping as YamlMapping, Number, Value as YamlValue};
use std::fmt;

/// Parse a (possibly multi-document) YAML text into a stream.
///
/// Scalars come back as `Value::String` holding their source text; nulls,
/// tagged nodes and structure are kept as `serde_yaml` resolved them.
pub fn parse_stream(text: &str) -> Result<Vec<YamlValue>> {
    let shapes = serde_yaml::Deserializer::from_str(text)
        .map(YamlValue::deserialize)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(malformed_yaml)?;

    serde_yaml::Deserializer::from_str(text)
        .zip(&shapes)
        .map(|(document, shape)| SourceText(shape).deserialize(document))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(malformed_yaml)
}

fn malformed_yaml(e: serde_yaml::Error) -> Error {
    Error::malformed(format!("invalid YAML: {}", e))
}

/// Re-reads a node whose shape is already known, keeping scalar text
struct SourceText<'a>(&'a YamlValue);

impl<'de, 'a> DeserializeSeed<'de> for SourceText<'a> {
    type Value = YamlValue;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<YamlValue, D::Error> {
        match self.0 {
            YamlValue::Null => {
                IgnoredAny::deserialize(deserializer)?;
                Ok(YamlValue::Null)
            }
            YamlValue::Bool(_) | YamlValue::Number(_) | YamlValue::String(_) => {
                String::deserialize(deserializer).map(YamlValue::String)
            }
            YamlValue::Sequence(items) => deserializer.deserialize_seq(SourceSequence(items)),
            YamlValue::Mapping(entries) => deserializer.deserialize_map(SourceMapping(entries)),
            YamlValue::Tagged(_) => YamlValue::deserialize(deserializer),
        }
    }
}

struct SourceSequence<'a>(&'a [YamlValue]);

impl<'de, 'a> Visitor<'de> for SourceSequence<'a> {
    type Value = YamlValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a sequence of {} items", self.0.len())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<YamlValue, A::Error> {
        let mut items = Vec::with_capacity(self.0.len());
        for shape in self.0 {
            match seq.next_element_seed(SourceText(shape))? {
                Some(item) => items.push(item),
                None => return Err(de::Error::invalid_length(items.len(), &self)),
            }
        }
        Ok(YamlValue::Sequence(items))
    }
}

struct SourceMapping<'a>(&'a YamlMapping);

impl<'de, 'a> Visitor<'de> for SourceMapping<'a> {
    type Value = YamlValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a mapping of {} entries", self.0.len())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<YamlValue, A::Error> {
        let mut entries = YamlMapping::with_capacity(self.0.len());
        for (key_shape, value_shape) in self.0 {
            let key = map
                .next_key_seed(SourceText(key_shape))?
                .ok_or_else(|| <A::Error as de::Error>::invalid_length(entries.len(), &self))?;
            // `1` and `'1'` are distinct keys until both become text.
            if entries.contains_key(&key) {
                return Err(de::Error::custom(format_args!(
                    "duplicate entry with key {:?}",
                    key.as_str().unwrap_or_default()
                )));
            }
            let item = map.next_value_seed(SourceText(value_shape))?;
            entries.insert(key, item);
        }
        Ok(YamlValue::Mapping(entries))
    }
}

/// Write a stream; multi-document streams get `---` separators
pub fn write_stream(documents: &[YamlValue]) -> Result<String> {
    if let [single] = documents {
        return Ok(serde_yaml::to_string(single)?);
    }
    let mut out = String::new();
    for document in documents {
        out.push_str("---\n");
        out.push_str(&serde_yaml::to_string(document)?);
    }
    Ok(out)
}

/// Converts between `serde_yaml::Value` and the canonical tree
#[derive(Debug, Clone, Default)]
pub struct YamlAdapter {
    limits: Limits,
}

impl YamlAdapter {
    /// Create an adapter with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Set limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Decode every document of a stream
    pub fn decode_stream(&self, documents: &[YamlValue]) -> Result<Vec<Value>> {
        self.limits.check_documents(documents.len())?;
        documents.iter().map(|document| self.decode(document)).collect()
    }

    /// Decode a stream that must hold exactly one document
    pub fn decode_single(&self, documents: &[YamlValue]) -> Result<Value> {
        match documents {
            [] => Err(Error::InvalidArgument(
                "YAML stream holds no document".to_string(),
            )),
            [document] => self.decode(document),
            _ => Err(Error::MultiDocument(documents.len())),
        }
    }

    /// Encode a tree as a one-document stream
    pub fn encode_stream(&self, value: &Value) -> Result<Vec<YamlValue>> {
        Ok(vec![self.encode(value)?])
    }

    /// Encode several trees as a multi-document stream
    pub fn encode_documents(&self, values: &[Value]) -> Result<Vec<YamlValue>> {
        self.limits.check_documents(values.len())?;
        values.iter().map(|value| self.encode(value)).collect()
    }

    fn decode_value(&self, yaml: &YamlValue, depth: usize, path: &str) -> Result<Value> {
        self.limits.check_depth(depth)?;

        match yaml {
            YamlValue::Null => Ok(Value::Null),
            YamlValue::Bool(_) | YamlValue::Number(_) | YamlValue::String(_) => {
                Ok(Value::infer(&scalar_text(yaml).unwrap_or_default()))
            }
            YamlValue::Sequence(items) => Ok(Value::Sequence(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.decode_value(item, depth + 1, &index_path(path, i)))
                    .collect::<Result<_>>()?,
            )),
            YamlValue::Mapping(entries) => {
                let mut map = Mapping::with_capacity(entries.len());
                for (key, item) in entries {
                    let key = mapping_key(key, path)?;
                    let item_path = key_path(path, &key);
                    if map.contains_key(&key) {
                        return Err(MalformedInput::new(format!("duplicate mapping key '{}'", key))
                            .with_path(item_path)
                            .into());
                    }
                    let item = self.decode_value(item, depth + 1, &item_path)?;
                    map.insert(key, item);
                }
                Ok(Value::Mapping(map))
            }
            YamlValue::Tagged(tagged) => {
                log::debug!("ignoring YAML tag {} at {}", tagged.tag, path);
                self.decode_value(&tagged.value, depth, path)
            }
        }
    }

    fn encode_value(&self, value: &Value, depth: usize) -> Result<YamlValue> {
        self.limits.check_depth(depth)?;

        Ok(match value {
            Value::Null => YamlValue::Null,
            Value::Scalar(scalar) => encode_scalar(scalar),
            Value::Sequence(items) => YamlValue::Sequence(
                items
                    .iter()
                    .map(|item| self.encode_value(item, depth + 1))
                    .collect::<Result<_>>()?,
            ),
            Value::Mapping(map) => {
                let mut entries = YamlMapping::with_capacity(map.len());
                for (key, item) in map {
                    entries.insert(
                        YamlValue::String(key.clone()),
                        self.encode_value(item, depth + 1)?,
                    );
                }
                YamlValue::Mapping(entries)
            }
        })
    }
}

impl Adapter for YamlAdapter {
    type Native = YamlValue;

    fn decode(&self, native: &YamlValue) -> Result<Value> {
        self.decode_value(native, 1, "$")
    }

    fn encode(&self, value: &Value) -> Result<YamlValue> {
        self.encode_value(value, 1)
    }

    fn is_lossy(&self) -> bool {
        false
    }
}

fn scalar_text(yaml: &YamlValue) -> Option<String> {
    match yaml {
        YamlValue::Bool(b) => Some(b.to_string()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Tagged(tagged) => scalar_text(&tagged.value),
        _ => None,
    }
}

fn mapping_key(key: &YamlValue, path: &str) -> Result<String> {
    match key {
        YamlValue::Null => Ok("null".to_string()),
        other => scalar_text(other).ok_or_else(|| {
            MalformedInput::new("YAML mapping key must be a scalar")
                .with_path(path)
                .with_instance(format!("{:?}", key))
                .into()
        }),
    }
}

fn encode_scalar(scalar: &Scalar) -> YamlValue {
    match scalar {
        Scalar::Bool(b) => YamlValue::Bool(*b),
        Scalar::UInt8(v) => YamlValue::Number(Number::from(*v)),
        Scalar::Int32(v) => YamlValue::Number(Number::from(*v)),
        Scalar::Int64(v) => YamlValue::Number(Number::from(*v)),
        Scalar::Double(v) => YamlValue::Number(Number::from(*v)),
        Scalar::Decimal(_)
        | Scalar::DateTime(_)
        | Scalar::DateTimeOffset(_)
        | Scalar::String(_) => YamlValue::String(scalar.render()),
    }
}
