//! JSON adapter
//!
//! JSON values are already typed, so this adapter is close to the
//! identity. Strings are never re-inferred: `"44"` stays a string.
//!
//! [`parse_json`] reads JSON text and rejects objects that repeat a key,
//! which `serde_json::Value` would otherwise resolve silently (last wins).

use super::Adapter;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::scalar::Scalar;
use crate::value::{Mapping, Value};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Number, Value as JsonValue};
use std::fmt;

/// Parse JSON text, failing on any object with a repeated key
pub fn parse_json(text: &str) -> Result<JsonValue> {
    serde_json::from_str::<UniqueKeys>(text)
        .map(|parsed| parsed.0)
        .map_err(|e| Error::malformed(format!("invalid JSON: {}", e)))
}

struct UniqueKeys(JsonValue);

impl<'de> Deserialize<'de> for UniqueKeys {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(UniqueKeysVisitor).map(UniqueKeys)
    }
}

struct UniqueKeysVisitor;

impl<'de> Visitor<'de> for UniqueKeysVisitor {
    type Value = JsonValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<JsonValue, E> {
        Ok(JsonValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<JsonValue, E> {
        Ok(JsonValue::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<JsonValue, E> {
        Ok(JsonValue::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<JsonValue, E> {
        Ok(Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<JsonValue, E> {
        Ok(JsonValue::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<JsonValue, E> {
        Ok(JsonValue::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<JsonValue, E> {
        Ok(JsonValue::Null)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<JsonValue, A::Error> {
        let mut items = Vec::new();
        while let Some(UniqueKeys(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(JsonValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<JsonValue, A::Error> {
        let mut object = Map::new();
        while let Some(key) = map.next_key::<String>()? {
            if object.contains_key(&key) {
                return Err(de::Error::custom(format_args!("duplicate key `{}`", key)));
            }
            let UniqueKeys(item) = map.next_value()?;
            object.insert(key, item);
        }
        Ok(JsonValue::Object(object))
    }
}

/// Converts between `serde_json::Value` and the canonical tree
#[derive(Debug, Clone, Default)]
pub struct JsonAdapter {
    limits: Limits,
}

impl JsonAdapter {
    /// Create an adapter with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Set limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Encode a tree whose root must be a mapping (a JSON object document)
    pub fn encode_object(&self, value: &Value) -> Result<Map<String, JsonValue>> {
        match self.encode(value)? {
            JsonValue::Object(map) => Ok(map),
            _ => Err(Error::UnsupportedShape(format!(
                "a JSON object document needs a mapping root, found {}",
                value.type_name()
            ))),
        }
    }

    fn decode_value(&self, json: &JsonValue, depth: usize) -> Result<Value> {
        self.limits.check_depth(depth)?;

        Ok(match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Scalar(Scalar::Bool(*b)),
            JsonValue::Number(n) => Value::Scalar(decode_number(n)),
            JsonValue::String(s) => Value::string(s.as_str()),
            JsonValue::Array(items) => Value::Sequence(
                items
                    .iter()
                    .map(|item| self.decode_value(item, depth + 1))
                    .collect::<Result<_>>()?,
            ),
            JsonValue::Object(object) => {
                let mut map = Mapping::with_capacity(object.len());
                for (key, item) in object {
                    map.try_insert(key.as_str(), self.decode_value(item, depth + 1)?)?;
                }
                Value::Mapping(map)
            }
        })
    }

    fn encode_value(&self, value: &Value, depth: usize) -> Result<JsonValue> {
        self.limits.check_depth(depth)?;

        Ok(match value {
            Value::Null => JsonValue::Null,
            Value::Scalar(scalar) => encode_scalar(scalar),
            Value::Sequence(items) => JsonValue::Array(
                items
                    .iter()
                    .map(|item| self.encode_value(item, depth + 1))
                    .collect::<Result<_>>()?,
            ),
            Value::Mapping(map) => {
                let mut object = Map::with_capacity(map.len());
                for (key, item) in map {
                    object.insert(key.clone(), self.encode_value(item, depth + 1)?);
                }
                JsonValue::Object(object)
            }
        })
    }
}

impl Adapter for JsonAdapter {
    type Native = JsonValue;

    fn decode(&self, native: &JsonValue) -> Result<Value> {
        self.decode_value(native, 1)
    }

    fn encode(&self, value: &Value) -> Result<JsonValue> {
        self.encode_value(value, 1)
    }

    fn is_lossy(&self) -> bool {
        false
    }
}

fn decode_number(n: &Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        Scalar::integer(i)
    } else if let Some(u) = n.as_u64() {
        // Above i64::MAX
        Scalar::Decimal(Decimal::from(u))
    } else {
        Scalar::Double(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn encode_scalar(scalar: &Scalar) -> JsonValue {
    match scalar {
        Scalar::Bool(b) => JsonValue::Bool(*b),
        Scalar::UInt8(v) => JsonValue::from(*v),
        Scalar::Int32(v) => JsonValue::from(*v),
        Scalar::Int64(v) => JsonValue::from(*v),
        Scalar::Double(v) => match Number::from_f64(*v) {
            Some(n) => JsonValue::Number(n),
            None => {
                log::debug!("non-finite double {} encoded as a JSON string", v);
                JsonValue::String(scalar.render())
            }
        },
        Scalar::Decimal(d) => encode_decimal(d),
        Scalar::DateTime(_) | Scalar::DateTimeOffset(_) => JsonValue::String(scalar.render()),
        Scalar::String(s) => JsonValue::String(s.clone()),
    }
}

// A decimal becomes a JSON number when no digits are lost, else a string.
fn encode_decimal(d: &Decimal) -> JsonValue {
    if d.fract().is_zero() {
        if let Some(i) = d.to_i64() {
            return JsonValue::from(i);
        }
        if let Some(u) = d.to_u64() {
            return JsonValue::from(u);
        }
    }
    if let Some(n) = d
        .to_f64()
        .filter(|f| Decimal::from_f64(*f).as_ref() == Some(d))
        .and_then(Number::from_f64)
    {
        return JsonValue::Number(n);
    }
    JsonValue::String(d.to_string())
}
