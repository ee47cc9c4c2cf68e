//! XML document tree
//!
//! This module provides the in-memory XML tree the XML adapter consumes
//! and produces, together with the text-level edges around it: parsing
//! with `quick-xml`, importing a `roxmltree` document, and writing with
//! the `quick-xml` writer.
//!
//! Comments and processing instructions are dropped when parsing.

use crate::error::{Error, Result};
use crate::namespaces::{NamespaceBinding, NamespaceContext, QName, XMLNS_PREFIX, XML_PREFIX};
use crate::XML_NAMESPACE;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A node in element content
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// Child element
    Element(XmlElement),
    /// Character data
    Text(String),
    /// CDATA section
    CData(String),
}

/// An attribute with its qualified name
#[derive(Debug, Clone, PartialEq)]
pub struct XmlAttribute {
    /// Attribute name
    pub name: QName,
    /// Attribute value (unescaped)
    pub value: String,
}

impl XmlAttribute {
    /// Create a new attribute
    pub fn new(name: QName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// XML Element in the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Element qualified name
    pub name: QName,
    /// `xmlns` / `xmlns:prefix` declarations made on this element
    pub namespace_declarations: Vec<NamespaceBinding>,
    /// Element attributes, in document order
    pub attributes: Vec<XmlAttribute>,
    /// Child content, in document order
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create a new element
    pub fn new(name: QName) -> Self {
        Self {
            name,
            namespace_declarations: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an element with an unprefixed, namespace-less name
    pub fn local(name: impl Into<String>) -> Self {
        Self::new(QName::local(name))
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.name.local_name
    }

    /// Get the name as written: `prefix:local` or `local`
    pub fn qualified_name(&self) -> String {
        self.name.qualified_name()
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace.as_deref()
    }

    /// Get an attribute value by its qualified name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.qualified_name() == name)
            .map(|attr| attr.value.as_str())
    }

    /// Add a namespace declaration
    pub fn declare_namespace(&mut self, binding: NamespaceBinding) {
        self.namespace_declarations.push(binding);
    }

    /// Add an attribute
    pub fn add_attribute(&mut self, name: QName, value: impl Into<String>) {
        self.attributes.push(XmlAttribute::new(name, value));
    }

    /// Add a child element
    pub fn add_child(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Append character data
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlNode::Text(text.into()));
    }

    /// Append a CDATA section
    pub fn add_cdata(&mut self, text: impl Into<String>) {
        self.children.push(XmlNode::CData(text.into()));
    }

    /// Builder-style [`XmlElement::add_attribute`] for an unprefixed attribute
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.add_attribute(QName::local(name), value);
        self
    }

    /// Builder-style [`XmlElement::add_child`]
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.add_child(child);
        self
    }

    /// Builder-style [`XmlElement::add_text`]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.add_text(text);
        self
    }

    /// Iterate over child elements
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Concatenated text and CDATA of the direct children
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for node in &self.children {
            match node {
                XmlNode::Text(t) | XmlNode::CData(t) => text.push_str(t),
                XmlNode::Element(_) => {}
            }
        }
        text
    }

    /// Check if the element has no attributes, declarations or content
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self.namespace_declarations.is_empty()
            && self.children.is_empty()
    }

    /// Serialize this element
    pub fn to_xml_string(&self, options: &WriteOptions) -> Result<String> {
        let mut writer = match options.indent {
            Some(width) => Writer::new_with_indent(Vec::new(), b' ', width),
            None => Writer::new(Vec::new()),
        };

        if options.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(write_error)?;
        }
        write_element(&mut writer, self)?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| Error::Xml(format!("Writer produced invalid UTF-8: {}", e)))
    }

    /// Import an element subtree from a `roxmltree` node
    pub fn from_roxmltree(node: roxmltree::Node<'_, '_>) -> Self {
        let tag = node.tag_name();
        let name = qname_from_expanded(node, tag.namespace(), tag.name());
        let mut element = XmlElement::new(name);

        let inherited: Vec<(Option<&str>, &str)> = node
            .parent_element()
            .map(|parent| parent.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
            .unwrap_or_default();
        for ns in node.namespaces() {
            if ns.name() == Some(XML_PREFIX) || inherited.contains(&(ns.name(), ns.uri())) {
                continue;
            }
            element.declare_namespace(NamespaceBinding {
                prefix: ns.name().map(str::to_string),
                uri: ns.uri().to_string(),
            });
        }

        for attr in node.attributes() {
            let name = match attr.namespace() {
                Some(uri) => qname_from_expanded(node, Some(uri), attr.name()),
                None => QName::local(attr.name()),
            };
            element.add_attribute(name, attr.value());
        }

        for child in node.children() {
            if child.is_element() {
                element.add_child(XmlElement::from_roxmltree(child));
            } else if child.is_text() {
                element.add_text(child.text().unwrap_or_default());
            }
        }

        element
    }
}

fn qname_from_expanded(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> QName {
    match namespace {
        Some(uri) => QName {
            prefix: node.lookup_prefix(uri).map(str::to_string),
            local_name: local.to_string(),
            namespace: Some(uri.to_string()),
        },
        None => QName::local(local),
    }
}

fn write_error(e: quick_xml::Error) -> Error {
    Error::Xml(format!("Failed to write XML: {}", e))
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &XmlElement) -> Result<()> {
    let name = element.qualified_name();
    let mut start = BytesStart::new(name.as_str());

    // Declarations first, then regular attributes.
    for binding in &element.namespace_declarations {
        start.push_attribute((binding.attribute_name().as_str(), binding.uri.as_str()));
    }
    for attr in &element.attributes {
        start.push_attribute((attr.name.qualified_name().as_str(), attr.value.as_str()));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_error);
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    for child in &element.children {
        match child {
            XmlNode::Element(child) => write_element(writer, child)?,
            XmlNode::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error)?,
            XmlNode::CData(text) => writer
                .write_event(Event::CData(BytesCData::new(text.as_str())))
                .map_err(write_error)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(write_error)
}

/// Options for serializing XML
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WriteOptions {
    /// Indentation width; None writes everything on one line
    pub indent: Option<usize>,
    /// Whether to emit an `<?xml ...?>` declaration
    pub declaration: bool,
}

impl WriteOptions {
    /// Compact output without a declaration
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output with a declaration
    pub fn pretty() -> Self {
        Self {
            indent: Some(2),
            declaration: true,
        }
    }

    /// Set indentation width
    pub fn with_indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }

    /// Set whether to emit a declaration
    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }
}

/// XML Document representation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlDocument {
    /// Root element of the document
    pub root: Option<XmlElement>,
}

impl XmlDocument {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document around a root element
    pub fn with_root(root: XmlElement) -> Self {
        Self { root: Some(root) }
    }

    /// Get the root element
    pub fn root(&self) -> Option<&XmlElement> {
        self.root.as_ref()
    }

    /// Import a parsed `roxmltree` document
    pub fn from_roxmltree(doc: &roxmltree::Document<'_>) -> Self {
        Self::with_root(XmlElement::from_roxmltree(doc.root_element()))
    }

    /// Serialize the document; an empty document is an error
    pub fn to_xml_string(&self, options: &WriteOptions) -> Result<String> {
        self.root
            .as_ref()
            .ok_or_else(|| Error::InvalidArgument("XML document has no root element".to_string()))?
            .to_xml_string(options)
    }

    /// Parse an XML document from a string
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_reader(xml.as_bytes());

        let mut doc = XmlDocument::new();
        let mut element_stack: Vec<(XmlElement, NamespaceContext)> = Vec::new();
        let document_scope = NamespaceContext::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let scope = element_stack
                        .last()
                        .map(|(_, scope)| scope)
                        .unwrap_or(&document_scope);
                    let (element, scope) = Self::parse_element(&e, scope)?;
                    element_stack.push((element, scope));
                }
                Ok(Event::End(_)) => {
                    if let Some((current, _)) = element_stack.pop() {
                        Self::attach(&mut doc, &mut element_stack, current)?;
                    }
                }
                Ok(Event::Empty(e)) => {
                    let scope = element_stack
                        .last()
                        .map(|(_, scope)| scope)
                        .unwrap_or(&document_scope);
                    let (element, _) = Self::parse_element(&e, scope)?;
                    Self::attach(&mut doc, &mut element_stack, element)?;
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::malformed(format!("Failed to unescape text: {}", e)))?
                        .to_string();
                    if let Some((current, _)) = element_stack.last_mut() {
                        current.add_text(text);
                    } else if !text.trim().is_empty() {
                        return Err(Error::malformed("Text outside the root element".to_string()));
                    }
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8(e.into_inner().into_owned())
                        .map_err(|e| Error::malformed(format!("Invalid CDATA content: {}", e)))?;
                    if let Some((current, _)) = element_stack.last_mut() {
                        current.add_cdata(text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::malformed(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Ignore other events (comments, processing instructions, etc.)
            }
            buf.clear();
        }

        if let Some((open, _)) = element_stack.last() {
            return Err(Error::malformed(format!(
                "Unexpected end of input inside <{}>",
                open.qualified_name()
            )));
        }

        Ok(doc)
    }

    fn attach(
        doc: &mut XmlDocument,
        stack: &mut [(XmlElement, NamespaceContext)],
        element: XmlElement,
    ) -> Result<()> {
        if let Some((parent, _)) = stack.last_mut() {
            parent.add_child(element);
        } else if doc.root.is_some() {
            return Err(Error::malformed(format!(
                "Second root element <{}>",
                element.qualified_name()
            )));
        } else {
            doc.root = Some(element);
        }
        Ok(())
    }

    /// Parse element from BytesStart event
    fn parse_element(
        start: &BytesStart,
        parent_scope: &NamespaceContext,
    ) -> Result<(XmlElement, NamespaceContext)> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| Error::malformed(format!("Invalid element name: {}", e)))?
            .to_string();

        let mut declarations = Vec::new();
        let mut raw_attributes = Vec::new();
        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::malformed(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::malformed(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::malformed(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            // Handle namespace declarations
            if attr_name == XMLNS_PREFIX {
                declarations.push(NamespaceBinding {
                    prefix: None,
                    uri: attr_value,
                });
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                declarations.push(NamespaceBinding {
                    prefix: Some(prefix.to_string()),
                    uri: attr_value,
                });
            } else {
                raw_attributes.push((attr_name, attr_value));
            }
        }

        let mut scope = parent_scope.clone();
        for binding in &declarations {
            match &binding.prefix {
                Some(prefix) => scope.add_prefix(prefix.clone(), binding.uri.clone()),
                None => scope.set_default_namespace(binding.uri.clone()),
            }
        }

        let mut element = XmlElement::new(resolve_name(&scope, &name, false)?);
        element.namespace_declarations = declarations;
        for (attr_name, attr_value) in raw_attributes {
            element.add_attribute(resolve_name(&scope, &attr_name, true)?, attr_value);
        }

        Ok((element, scope))
    }
}

fn resolve_name(scope: &NamespaceContext, name: &str, is_attribute: bool) -> Result<QName> {
    match name.split_once(':') {
        Some((prefix, local)) => {
            let namespace = if prefix == XML_PREFIX {
                XML_NAMESPACE
            } else {
                scope.get_namespace(prefix).ok_or_else(|| {
                    Error::Namespace(format!("Unbound prefix '{}' in <{}>", prefix, name))
                })?
            };
            Ok(QName::prefixed(prefix, local, namespace))
        }
        None if is_attribute => Ok(QName::local(name)),
        None => Ok(match scope.get_default_namespace() {
            Some(uri) => QName::namespaced(uri, name),
            None => QName::local(name),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let doc = XmlDocument::new();
        assert!(doc.root.is_none());
        assert!(matches!(
            doc.to_xml_string(&WriteOptions::new()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<root><child>text</child></root>"#;
        let doc = XmlDocument::parse(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.local_name(), "root");
        assert_eq!(root.children.len(), 1);
        let child = root.child_elements().next().unwrap();
        assert_eq!(child.local_name(), "child");
        assert_eq!(child.text_content(), "text");
    }

    #[test]
    fn test_parse_with_attributes() {
        let xml = r#"<root attr1="value1" attr2="a &amp; b"><child/></root>"#;
        let doc = XmlDocument::parse(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.get_attribute("attr1"), Some("value1"));
        assert_eq!(root.get_attribute("attr2"), Some("a & b"));
    }

    #[test]
    fn test_parse_with_namespaces() {
        let xml = r#"<root xmlns="http://example.com" xmlns:x="urn:x"><x:child x:flag="1"/><plain/></root>"#;
        let doc = XmlDocument::parse(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.namespace(), Some("http://example.com"));
        assert_eq!(root.namespace_declarations.len(), 2);

        let children: Vec<_> = root.child_elements().collect();
        assert_eq!(children[0].qualified_name(), "x:child");
        assert_eq!(children[0].namespace(), Some("urn:x"));
        assert_eq!(children[0].attributes[0].name.namespace.as_deref(), Some("urn:x"));
        assert_eq!(children[1].namespace(), Some("http://example.com"));
    }

    #[test]
    fn test_parse_rejects_unbound_prefix() {
        let err = XmlDocument::parse("<q:root/>").unwrap_err();
        assert!(matches!(err, Error::Namespace(_)));
    }

    #[test]
    fn test_parse_xml_prefix_is_implicit() {
        let doc = XmlDocument::parse(r#"<root xml:lang="en"/>"#).unwrap();
        let root = doc.root.unwrap();
        assert_eq!(root.attributes[0].name.namespace.as_deref(), Some(XML_NAMESPACE));
    }

    #[test]
    fn test_parse_cdata_and_comments() {
        let xml = r#"<root><!-- note --><![CDATA[a < b]]><?pi data?></root>"#;
        let root = XmlDocument::parse(xml).unwrap().root.unwrap();
        assert_eq!(root.children, vec![XmlNode::CData("a < b".to_string())]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for text in ["<root><a></b></root>", "<root>", "<a/><b/>", "<a x='1' x='2'/>"] {
            let err = XmlDocument::parse(text).unwrap_err();
            assert!(matches!(err, Error::MalformedInput(_)), "{}: {:?}", text, err);
        }
    }

    #[test]
    fn test_write_compact() {
        let root = XmlElement::local("root")
            .with_attribute("id", "5")
            .with_child(XmlElement::local("a").with_text("1 < 2"))
            .with_child(XmlElement::local("c"));

        let xml = root.to_xml_string(&WriteOptions::new()).unwrap();
        assert_eq!(xml, r#"<root id="5"><a>1 &lt; 2</a><c/></root>"#);
    }

    #[test]
    fn test_write_declarations_before_attributes() {
        let mut root = XmlElement::new(QName::prefixed("x", "root", "urn:x"));
        root.add_attribute(QName::local("id"), "1");
        root.declare_namespace(NamespaceBinding {
            prefix: Some("x".to_string()),
            uri: "urn:x".to_string(),
        });

        let xml = root.to_xml_string(&WriteOptions::new()).unwrap();
        assert_eq!(xml, r#"<x:root xmlns:x="urn:x" id="1"/>"#);
    }

    #[test]
    fn test_write_then_parse() {
        let xml = r#"<root xmlns:x="urn:x"><x:a>1</x:a><b><![CDATA[raw]]></b></root>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let written = doc.to_xml_string(&WriteOptions::new()).unwrap();
        assert_eq!(written, xml);
    }

    #[test]
    fn test_write_with_declaration() {
        let xml = XmlElement::local("root")
            .to_xml_string(&WriteOptions::pretty())
            .unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.ends_with("<root/>"));
    }

    #[test]
    fn test_from_roxmltree() {
        let text = r#"<root xmlns:x="urn:x" id="7"><x:child x:flag="yes">hi</x:child></root>"#;
        let parsed = roxmltree::Document::parse(text).unwrap();
        let doc = XmlDocument::from_roxmltree(&parsed);

        let root = doc.root.unwrap();
        assert_eq!(root.namespace_declarations.len(), 1);
        assert_eq!(root.get_attribute("id"), Some("7"));

        let child = root.child_elements().next().unwrap();
        assert_eq!(child.qualified_name(), "x:child");
        assert!(child.namespace_declarations.is_empty());
        assert_eq!(child.get_attribute("x:flag"), Some("yes"));
        assert_eq!(child.text_content(), "hi");
    }
}
