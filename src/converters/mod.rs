//! Format adapters
//!
//! This module provides the adapters that translate between each format's
//! native tree and the canonical [`Value`] tree:
//!
//! - [`JsonAdapter`]: `serde_json::Value`
//! - [`XmlAdapter`]: [`crate::xml::XmlDocument`]
//! - [`YamlAdapter`]: `serde_yaml::Value` (and multi-document streams)
//!
//! Every transcoding is `decode` with the source adapter followed by
//! `encode` with the target adapter.

mod base;
mod json;
mod xml;
mod yaml;

pub use base::{
    AttributeNameFactory, AttributePrefixStrategy, DollarPrefix, MappedKey,
    NamespaceMappingStrategy, PrefixAttributeNames, XmlConfig, DEFAULT_ARRAY_ITEM_ELEMENT_NAME,
    DEFAULT_ATTRIBUTE_PREFIX, DEFAULT_ROOT_ELEMENT_NAME, DEFAULT_TEXT_KEY,
};
pub use json::{parse_json, JsonAdapter};
pub use xml::XmlAdapter;
pub use yaml::{parse_stream, write_stream, YamlAdapter};

use crate::error::Result;
use crate::value::Value;

/// Translation between a format's native tree and the canonical tree
pub trait Adapter {
    /// The format's native document type
    type Native;

    /// Decode a native document into a canonical tree
    fn decode(&self, native: &Self::Native) -> Result<Value>;

    /// Encode a canonical tree into a native document
    fn encode(&self, value: &Value) -> Result<Self::Native>;

    /// Returns true if some canonical trees do not survive encode then decode
    fn is_lossy(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lossiness() {
        assert!(!JsonAdapter::new().is_lossy());
        assert!(!YamlAdapter::new().is_lossy());
        assert!(XmlAdapter::new().is_lossy());
    }

    #[test]
    fn test_adapters_as_trait_objects() {
        fn roundtrip<A: Adapter>(adapter: &A, value: &Value) -> Value {
            let native = adapter.encode(value).unwrap();
            adapter.decode(&native).unwrap()
        }

        let value = Value::Mapping(crate::value::Mapping::new().with("a", 1i64));
        assert_eq!(roundtrip(&JsonAdapter::new(), &value), value);
        assert_eq!(roundtrip(&YamlAdapter::new(), &value), value);
        assert_eq!(roundtrip(&XmlAdapter::new(), &value), value);
    }
}
