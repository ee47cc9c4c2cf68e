//! XML adapter
//!
//! Decoding turns an element into a mapping: attributes become keys named
//! by the [`AttributeNameFactory`](super::AttributeNameFactory), non-blank
//! text becomes the text key, and child elements are grouped by name (one
//! occurrence is a value, several are a sequence). A mapping holding only
//! text collapses to the bare scalar.
//!
//! Encoding walks a mapping with the two namespace passes from
//! [`crate::namespaces`]. Sequence-valued properties repeat the property
//! name; only a top-level sequence (or a sequence nested directly in
//! another) uses the array item element name.
//!
//! XML has no way to tell Null, an empty mapping, an empty sequence and an
//! empty string apart: all of them encode to an empty element, which
//! decodes to an empty mapping.

use super::{Adapter, XmlConfig};
use crate::error::{Error, Result};
use crate::names::{make_valid_xml_name, split_prefixed, validate_qname};
use crate::namespaces::{plan_properties, NamespaceBindings, NamespaceContext, QName};
use crate::scalar::Scalar;
use crate::value::{Mapping, Value};
use crate::xml::{XmlDocument, XmlElement};
use indexmap::IndexMap;

/// Converts between [`XmlDocument`] and the canonical tree
#[derive(Debug, Clone, Default)]
pub struct XmlAdapter {
    config: XmlConfig,
}

impl XmlAdapter {
    /// Create an adapter with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an adapter with a custom configuration
    pub fn with_config(config: XmlConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &XmlConfig {
        &self.config
    }

    /// Decode one element (its name is not part of the result)
    pub fn decode_element(&self, element: &XmlElement) -> Result<Value> {
        log::debug!("decoding XML element <{}>", element.qualified_name());
        self.decode_at(element, 1)
    }

    /// Encode a tree as an element named by the configured root name
    pub fn encode_element(&self, value: &Value) -> Result<XmlElement> {
        let root_name = self.config.root_element_name();
        if root_name.is_empty() {
            return Err(Error::InvalidArgument(
                "root element name must not be empty".to_string(),
            ));
        }
        validate_qname(root_name)?;

        let item_name = self.config.array_item_element_name();
        if item_name.is_empty() {
            return Err(Error::InvalidArgument(
                "array item element name must not be empty".to_string(),
            ));
        }
        validate_qname(item_name)?;

        log::debug!("encoding {} as XML root <{}>", value.type_name(), root_name);

        // The root may use a prefix declared by its own mapping.
        let scope = match value {
            Value::Mapping(map) => NamespaceContext::new().with_bindings(
                &NamespaceBindings::collect(map, self.config.namespace_mapping_strategy())?,
            ),
            _ => NamespaceContext::new(),
        };
        let root = scope.resolve(root_name)?;
        self.encode_at(root, value, &NamespaceContext::new(), 1)
    }

    fn decode_at(&self, element: &XmlElement, depth: usize) -> Result<Value> {
        let limits = self.config.limits();
        limits.check_depth(depth)?;
        limits.check_attributes(element.attributes.len() + element.namespace_declarations.len())?;

        let factory = self.config.attribute_name_factory();
        let text_key = self.config.text_key();
        let mut map = Mapping::new();

        for binding in &element.namespace_declarations {
            map.try_insert(
                factory.attribute_key(&binding.attribute_name()),
                Value::string(binding.uri.as_str()),
            )?;
        }

        for attr in &element.attributes {
            map.try_insert(
                factory.attribute_key(&attr.name.qualified_name()),
                Value::infer(&attr.value),
            )?;
        }

        let text = element.text_content();
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            // Typed text ignores padding; string text keeps it.
            let value = match Value::infer(trimmed) {
                Value::Scalar(Scalar::String(_)) => Value::string(text.as_str()),
                typed => typed,
            };
            map.try_insert(text_key, value)?;
        }

        let mut groups: IndexMap<String, Vec<Value>> = IndexMap::new();
        for child in element.child_elements() {
            let decoded = self.decode_at(child, depth + 1)?;
            groups.entry(child.qualified_name()).or_default().push(decoded);
        }
        for (name, mut items) in groups {
            let value = if items.len() == 1 {
                items.pop().unwrap_or(Value::Null)
            } else {
                Value::Sequence(items)
            };
            map.try_insert(name, value)?;
        }

        if let Some((key, value)) = map.single_entry() {
            if key == text_key {
                log::trace!("collapsing text-only <{}>", element.qualified_name());
                return Ok(value.clone());
            }
        }

        Ok(Value::Mapping(map))
    }

    fn encode_at(
        &self,
        name: QName,
        value: &Value,
        scope: &NamespaceContext,
        depth: usize,
    ) -> Result<XmlElement> {
        self.config.limits().check_depth(depth)?;

        match value {
            Value::Null => Ok(XmlElement::new(name)),
            Value::Scalar(scalar) => {
                let mut element = XmlElement::new(name);
                let text = scalar.render();
                if !text.is_empty() {
                    element.add_text(text);
                }
                Ok(element)
            }
            Value::Sequence(items) => {
                let mut element = XmlElement::new(name);
                for item in items {
                    let item_name = self.item_name(scope);
                    element.add_child(self.encode_at(item_name, item, scope, depth + 1)?);
                }
                Ok(element)
            }
            Value::Mapping(map) => self.encode_mapping(name, map, scope, depth),
        }
    }

    fn encode_mapping(
        &self,
        name: QName,
        map: &Mapping,
        parent: &NamespaceContext,
        depth: usize,
    ) -> Result<XmlElement> {
        let plan = plan_properties(
            map,
            parent,
            self.config.namespace_mapping_strategy(),
            self.config.text_key(),
        )?;

        let mut element = XmlElement::new(name);
        for binding in plan.bindings.iter() {
            element.declare_namespace(binding.clone());
        }

        for property in plan.properties.iter().filter(|p| p.is_attribute) {
            let text = match property.value {
                Value::Scalar(scalar) => scalar.render(),
                Value::Null => String::new(),
                other => {
                    return Err(Error::UnsupportedShape(format!(
                        "attribute '{}' needs a scalar value, found {}",
                        property.raw_name,
                        other.type_name()
                    )))
                }
            };
            element.add_attribute(property.qname(), text);
        }
        self.config
            .limits()
            .check_attributes(element.attributes.len() + element.namespace_declarations.len())?;

        match plan.text {
            Some(Value::Scalar(scalar)) => {
                let text = scalar.render();
                if !text.is_empty() {
                    element.add_text(text);
                }
            }
            Some(Value::Null) | None => {}
            Some(other) => {
                return Err(Error::UnsupportedShape(format!(
                    "'{}' needs a scalar value, found {}",
                    self.config.text_key(),
                    other.type_name()
                )))
            }
        }

        for property in plan.properties.iter().filter(|p| !p.is_attribute) {
            match property.value {
                Value::Sequence(items) => {
                    for item in items {
                        element.add_child(self.encode_at(
                            property.qname(),
                            item,
                            &plan.scope,
                            depth + 1,
                        )?);
                    }
                }
                other => {
                    element.add_child(self.encode_at(
                        property.qname(),
                        other,
                        &plan.scope,
                        depth + 1,
                    )?);
                }
            }
        }

        Ok(element)
    }

    fn item_name(&self, scope: &NamespaceContext) -> QName {
        let raw = self.config.array_item_element_name();
        match split_prefixed(raw).and_then(|(prefix, local)| {
            scope
                .get_namespace(prefix)
                .map(|ns| QName::prefixed(prefix, local, ns))
        }) {
            Some(qname) => qname,
            None => QName {
                prefix: None,
                local_name: make_valid_xml_name(raw),
                namespace: scope.get_default_namespace().map(str::to_string),
            },
        }
    }
}

impl Adapter for XmlAdapter {
    type Native = XmlDocument;

    fn decode(&self, native: &XmlDocument) -> Result<Value> {
        let root = native.root().ok_or_else(|| {
            Error::InvalidArgument("XML document has no root element".to_string())
        })?;
        self.decode_element(root)
    }

    fn encode(&self, value: &Value) -> Result<XmlDocument> {
        Ok(XmlDocument::with_root(self.encode_element(value)?))
    }

    fn is_lossy(&self) -> bool {
        true
    }
}
