//! XML namespace handling
//!
//! This module provides qualified names, prefix scopes, and the two-pass
//! namespace resolution used when a canonical mapping is encoded as an
//! XML element:
//!
//! 1. [`NamespaceBindings::collect`] scans the mapping for `xmlns` and
//!    `xmlns:prefix` attribute keys and records the declared bindings.
//! 2. [`plan_properties`] resolves every remaining key against the
//!    bindings in scope and produces an immutable list of
//!    [`PropertyDescriptor`]s.
//!
//! Both passes finish before any XML node is built, so a malformed
//! declaration or an unbound prefix never leaves a half-built element.

use crate::converters::NamespaceMappingStrategy;
use crate::error::{Error, Result};
use crate::names::{is_valid_ncname, make_valid_xml_name, split_prefixed};
use crate::value::{Mapping, Value};
use crate::XML_NAMESPACE;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// Prefix reserved for namespace declarations
pub const XMLNS_PREFIX: &str = "xmlns";

/// Prefix implicitly bound to [`XML_NAMESPACE`]
pub const XML_PREFIX: &str = "xml";

/// Qualified name of an element or attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Prefix as written in the document (None for unprefixed names)
    pub prefix: Option<Prefix>,
    /// Local name
    pub local_name: String,
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
}

impl QName {
    /// Create a QName without a prefix or namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local_name: local_name.into(),
            namespace: None,
        }
    }

    /// Create an unprefixed QName in a namespace (default namespace)
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local_name: local_name.into(),
            namespace: Some(namespace.into()),
        }
    }

    /// Create a prefixed QName bound to a namespace
    pub fn prefixed(
        prefix: impl Into<String>,
        local_name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            prefix: Some(prefix.into()),
            local_name: local_name.into(),
            namespace: Some(namespace.into()),
        }
    }

    /// The name as written in a document: `prefix:local` or `local`
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Namespace context for resolving prefixes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamespaceContext {
    /// Mapping from prefix to namespace URI
    prefixes: HashMap<Prefix, NamespaceUri>,
    /// Default namespace (no prefix)
    default_namespace: Option<NamespaceUri>,
}

impl NamespaceContext {
    /// Create a new empty namespace context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace prefix mapping
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Set the default namespace; an empty URI undeclares it
    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        let namespace = namespace.into();
        self.default_namespace = if namespace.is_empty() {
            None
        } else {
            Some(namespace)
        };
    }

    /// Get the namespace for a prefix, including the implicit `xml` binding
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        if prefix == XML_PREFIX {
            return Some(XML_NAMESPACE);
        }
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    /// Get the default namespace
    pub fn get_default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// A child scope: this context overridden by `bindings`
    pub fn with_bindings(&self, bindings: &NamespaceBindings) -> NamespaceContext {
        let mut scope = self.clone();
        for binding in bindings.iter() {
            match &binding.prefix {
                Some(prefix) => scope.add_prefix(prefix.clone(), binding.uri.clone()),
                None => scope.set_default_namespace(binding.uri.clone()),
            }
        }
        scope
    }

    /// Resolve a prefixed name to a QName
    pub fn resolve(&self, prefixed_name: &str) -> Result<QName> {
        if let Some((prefix, local)) = prefixed_name.split_once(':') {
            let namespace = self
                .get_namespace(prefix)
                .ok_or_else(|| Error::Namespace(format!("Unknown prefix: {}", prefix)))?;
            Ok(QName::prefixed(prefix, local, namespace))
        } else {
            Ok(QName {
                prefix: None,
                local_name: prefixed_name.to_string(),
                namespace: self.default_namespace.clone(),
            })
        }
    }
}

/// One `xmlns` / `xmlns:prefix` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceBinding {
    /// Declared prefix; None for the default namespace
    pub prefix: Option<Prefix>,
    /// Namespace URI
    pub uri: NamespaceUri,
}

impl NamespaceBinding {
    /// Attribute name of this declaration: `xmlns` or `xmlns:prefix`
    pub fn attribute_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", XMLNS_PREFIX, prefix),
            None => XMLNS_PREFIX.to_string(),
        }
    }
}

/// Namespace declarations found on one mapping, in key order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceBindings {
    bindings: Vec<NamespaceBinding>,
}

impl NamespaceBindings {
    /// Pass 1: collect declarations from the attribute keys of `mapping`.
    ///
    /// Fails on a bare `xmlns:` key, a prefix that is not an NCName, a
    /// prefix declared twice, or a non-scalar namespace URI.
    pub fn collect(mapping: &Mapping, strategy: &dyn NamespaceMappingStrategy) -> Result<Self> {
        let mut bindings = NamespaceBindings::default();
        let mut seen: HashSet<Option<String>> = HashSet::new();

        for (key, value) in mapping {
            let mapped = strategy.map_key(key);
            if !mapped.is_attribute {
                continue;
            }
            let Some(prefix) = declared_prefix(&mapped.name)? else {
                continue;
            };
            let uri = namespace_uri(key, value)?;

            if prefix.is_some() && uri.is_empty() {
                return Err(Error::Namespace(format!(
                    "'{}' binds a prefix to an empty namespace URI",
                    key
                )));
            }
            if prefix.as_deref() == Some(XML_PREFIX) && uri != XML_NAMESPACE {
                return Err(Error::Namespace(format!(
                    "'{}' rebinds the reserved 'xml' prefix",
                    key
                )));
            }
            if !seen.insert(prefix.clone()) {
                return Err(Error::Namespace(format!(
                    "duplicate declaration of prefix '{}'",
                    prefix.as_deref().unwrap_or("")
                )));
            }

            log::trace!("namespace binding {:?} -> {}", prefix, uri);
            bindings.bindings.push(NamespaceBinding { prefix, uri });
        }

        Ok(bindings)
    }

    /// Iterate over the bindings in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &NamespaceBinding> {
        self.bindings.iter()
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if there are no bindings
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// `Some(None)` for `xmlns`, `Some(Some(p))` for `xmlns:p`, `None` otherwise.
fn declared_prefix(name: &str) -> Result<Option<Option<String>>> {
    if name == XMLNS_PREFIX {
        return Ok(Some(None));
    }
    let Some(prefix) = name.strip_prefix("xmlns:") else {
        return Ok(None);
    };
    if prefix.is_empty() {
        return Err(Error::Namespace(format!(
            "malformed namespace declaration '{}': missing prefix",
            name
        )));
    }
    if !is_valid_ncname(prefix) || prefix == XMLNS_PREFIX {
        return Err(Error::Namespace(format!(
            "malformed namespace declaration '{}': invalid prefix",
            name
        )));
    }
    Ok(Some(Some(prefix.to_string())))
}

fn namespace_uri(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::Scalar(scalar) => Ok(scalar.render()),
        Value::Null => Ok(String::new()),
        other => Err(Error::Namespace(format!(
            "namespace declaration '{}' must be a scalar URI, found {}",
            key,
            other.type_name()
        ))),
    }
}

/// Per-property plan consumed when emitting XML
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor<'a> {
    /// Whether the property becomes an attribute
    pub is_attribute: bool,
    /// Key as it appears in the mapping
    pub raw_name: &'a str,
    /// Valid XML name written to the document (`prefix:local` or `local`)
    pub xml_name: String,
    /// Resolved namespace URI
    pub namespace: Option<NamespaceUri>,
    /// Namespace prefix, when the key was prefixed
    pub prefix: Option<Prefix>,
    /// Local part of the name
    pub local_name: String,
    /// Property value
    pub value: &'a Value,
}

impl PropertyDescriptor<'_> {
    /// The qualified name of this property
    pub fn qname(&self) -> QName {
        QName {
            prefix: self.prefix.clone(),
            local_name: self.local_name.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

/// Result of both passes over one mapping
#[derive(Debug, Clone)]
pub struct PropertyPlan<'a> {
    /// Declarations made by this mapping
    pub bindings: NamespaceBindings,
    /// Scope in effect for this element and its children
    pub scope: NamespaceContext,
    /// Value of the text key, if present
    pub text: Option<&'a Value>,
    /// Every other property, in key order
    pub properties: Vec<PropertyDescriptor<'a>>,
}

/// Run both namespace passes over `mapping`.
///
/// `parent` is the scope of the enclosing element; `text_key` names the
/// entry that carries element text rather than a child.
pub fn plan_properties<'a>(
    mapping: &'a Mapping,
    parent: &NamespaceContext,
    strategy: &dyn NamespaceMappingStrategy,
    text_key: &str,
) -> Result<PropertyPlan<'a>> {
    let bindings = NamespaceBindings::collect(mapping, strategy)?;
    let scope = parent.with_bindings(&bindings);

    let mut text = None;
    let mut properties = Vec::with_capacity(mapping.len());
    let mut attribute_names: HashSet<String> = HashSet::new();

    for (key, value) in mapping {
        if key == text_key {
            text = Some(value);
            continue;
        }

        let mapped = strategy.map_key(key);
        if mapped.is_attribute && declared_prefix(&mapped.name)?.is_some() {
            continue;
        }

        let descriptor = resolve_property(key, mapped.is_attribute, &mapped.name, value, &scope)?;
        if descriptor.is_attribute && !attribute_names.insert(descriptor.xml_name.clone()) {
            return Err(Error::Name(format!(
                "attribute name '{}' is produced by more than one key",
                descriptor.xml_name
            )));
        }
        properties.push(descriptor);
    }

    Ok(PropertyPlan {
        bindings,
        scope,
        text,
        properties,
    })
}

fn resolve_property<'a>(
    raw_name: &'a str,
    is_attribute: bool,
    name: &str,
    value: &'a Value,
    scope: &NamespaceContext,
) -> Result<PropertyDescriptor<'a>> {
    if let Some((prefix, local)) = split_prefixed(name) {
        if prefix == XMLNS_PREFIX {
            return Err(Error::Namespace(format!(
                "'{}' uses the reserved 'xmlns' prefix outside a declaration",
                raw_name
            )));
        }
        let namespace = scope.get_namespace(prefix).ok_or_else(|| {
            Error::Namespace(format!(
                "prefix '{}' of '{}' has no xmlns declaration in scope",
                prefix, raw_name
            ))
        })?;
        return Ok(PropertyDescriptor {
            is_attribute,
            raw_name,
            xml_name: format!("{}:{}", prefix, local),
            namespace: Some(namespace.to_string()),
            prefix: Some(prefix.to_string()),
            local_name: local.to_string(),
            value,
        });
    }

    let local_name = make_valid_xml_name(name);
    // Unprefixed attributes never take the default namespace.
    let namespace = if is_attribute {
        None
    } else {
        scope.get_default_namespace().map(str::to_string)
    };

    Ok(PropertyDescriptor {
        is_attribute,
        raw_name,
        xml_name: local_name.clone(),
        namespace,
        prefix: None,
        local_name,
        value,
    })
}
