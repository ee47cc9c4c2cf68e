//! Base converter types and traits
//!
//! This module provides the call-site configuration shared by the
//! adapters: the XML naming strategies and [`XmlConfig`].

use crate::limits::Limits;
use std::fmt;
use std::sync::Arc;

/// Default root element name when encoding XML
pub const DEFAULT_ROOT_ELEMENT_NAME: &str = "root";

/// Default element name for items of a top-level sequence
pub const DEFAULT_ARRAY_ITEM_ELEMENT_NAME: &str = "item";

/// Default prefix marking attribute keys
pub const DEFAULT_ATTRIBUTE_PREFIX: &str = "$";

/// Key holding element text content
pub const DEFAULT_TEXT_KEY: &str = "#text";

/// Names the mapping key produced for an XML attribute (decode side)
pub trait AttributeNameFactory: Send + Sync {
    /// Key for an attribute named `attribute_name` (`local` or `prefix:local`)
    fn attribute_key(&self, attribute_name: &str) -> String;
}

impl<F> AttributeNameFactory for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn attribute_key(&self, attribute_name: &str) -> String {
        self(attribute_name)
    }
}

/// Prefixes attribute names with a fixed string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixAttributeNames {
    prefix: String,
}

impl PrefixAttributeNames {
    /// Create a factory with the given prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for PrefixAttributeNames {
    fn default() -> Self {
        Self::new(DEFAULT_ATTRIBUTE_PREFIX)
    }
}

impl AttributeNameFactory for PrefixAttributeNames {
    fn attribute_key(&self, attribute_name: &str) -> String {
        format!("{}{}", self.prefix, attribute_name)
    }
}

/// How a mapping key maps onto XML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedKey {
    /// Whether the key becomes an attribute
    pub is_attribute: bool,
    /// Attribute or element name, before sanitization
    pub name: String,
}

impl MappedKey {
    /// An element named `name`
    pub fn element(name: impl Into<String>) -> Self {
        Self {
            is_attribute: false,
            name: name.into(),
        }
    }

    /// An attribute named `name`
    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            is_attribute: true,
            name: name.into(),
        }
    }
}

/// Decides attribute vs. element for a mapping key (encode side)
pub trait NamespaceMappingStrategy: Send + Sync {
    /// Map a key to an attribute or element name
    fn map_key(&self, key: &str) -> MappedKey;
}

impl<F> NamespaceMappingStrategy for F
where
    F: Fn(&str) -> MappedKey + Send + Sync,
{
    fn map_key(&self, key: &str) -> MappedKey {
        self(key)
    }
}

/// Keys starting with a prefix are attributes named by the remainder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePrefixStrategy {
    prefix: String,
}

impl AttributePrefixStrategy {
    /// Create a strategy with the given prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl NamespaceMappingStrategy for AttributePrefixStrategy {
    fn map_key(&self, key: &str) -> MappedKey {
        match key.strip_prefix(self.prefix.as_str()) {
            Some(name) if !self.prefix.is_empty() => MappedKey::attribute(name),
            _ => MappedKey::element(key),
        }
    }
}

/// The default strategy: `$name` is the attribute `name`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DollarPrefix;

impl NamespaceMappingStrategy for DollarPrefix {
    fn map_key(&self, key: &str) -> MappedKey {
        match key.strip_prefix(DEFAULT_ATTRIBUTE_PREFIX) {
            Some(name) => MappedKey::attribute(name),
            None => MappedKey::element(key),
        }
    }
}

/// Configuration for the XML adapter
#[derive(Clone)]
pub struct XmlConfig {
    /// Name of the element wrapping an encoded document
    root_element_name: String,
    /// Element name for items of a top-level sequence
    array_item_element_name: String,
    /// Key used for text content
    text_key: String,
    /// Attribute key naming on decode
    attribute_name_factory: Arc<dyn AttributeNameFactory>,
    /// Attribute/element decision on encode
    namespace_mapping_strategy: Arc<dyn NamespaceMappingStrategy>,
    /// Recursion limits
    limits: Limits,
}

impl Default for XmlConfig {
    fn default() -> Self {
        Self {
            root_element_name: DEFAULT_ROOT_ELEMENT_NAME.to_string(),
            array_item_element_name: DEFAULT_ARRAY_ITEM_ELEMENT_NAME.to_string(),
            text_key: DEFAULT_TEXT_KEY.to_string(),
            attribute_name_factory: Arc::new(PrefixAttributeNames::default()),
            namespace_mapping_strategy: Arc::new(DollarPrefix),
            limits: Limits::default(),
        }
    }
}

impl fmt::Debug for XmlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlConfig")
            .field("root_element_name", &self.root_element_name)
            .field("array_item_element_name", &self.array_item_element_name)
            .field("text_key", &self.text_key)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl XmlConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the root element name
    pub fn root_element_name(&self) -> &str {
        &self.root_element_name
    }

    /// Get the array item element name
    pub fn array_item_element_name(&self) -> &str {
        &self.array_item_element_name
    }

    /// Get the text key
    pub fn text_key(&self) -> &str {
        &self.text_key
    }

    /// Get the attribute name factory
    pub fn attribute_name_factory(&self) -> &dyn AttributeNameFactory {
        self.attribute_name_factory.as_ref()
    }

    /// Get the namespace mapping strategy
    pub fn namespace_mapping_strategy(&self) -> &dyn NamespaceMappingStrategy {
        self.namespace_mapping_strategy.as_ref()
    }

    /// Get the limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Set root element name
    pub fn with_root_element_name(mut self, name: impl Into<String>) -> Self {
        self.root_element_name = name.into();
        self
    }

    /// Set array item element name
    pub fn with_array_item_element_name(mut self, name: impl Into<String>) -> Self {
        self.array_item_element_name = name.into();
        self
    }

    /// Set text key
    pub fn with_text_key(mut self, key: impl Into<String>) -> Self {
        self.text_key = key.into();
        self
    }

    /// Set attribute name factory
    pub fn with_attribute_name_factory(
        mut self,
        factory: impl AttributeNameFactory + 'static,
    ) -> Self {
        self.attribute_name_factory = Arc::new(factory);
        self
    }

    /// Set namespace mapping strategy
    pub fn with_namespace_mapping_strategy(
        mut self,
        strategy: impl NamespaceMappingStrategy + 'static,
    ) -> Self {
        self.namespace_mapping_strategy = Arc::new(strategy);
        self
    }

    /// Use `prefix` both to name attributes on decode and to detect them on encode
    pub fn with_attribute_prefix(self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.with_attribute_name_factory(PrefixAttributeNames::new(prefix.clone()))
            .with_namespace_mapping_strategy(AttributePrefixStrategy::new(prefix))
    }

    /// Set limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}
