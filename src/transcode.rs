//! Pairwise conversions
//!
//! Each conversion is exactly `decode` with the source adapter followed by
//! `encode` with the target adapter; no adapter talks to another one.
//!
//! ## Example
//!
//! ```rust
//! use treeconv::transcode::{transcode_str, Format, TranscodeOptions};
//!
//! let xml = transcode_str("a: 1\nb: true\nc: null\n", Format::Yaml, Format::Xml, &TranscodeOptions::default())?;
//! assert_eq!(xml, "<root><a>1</a><b>true</b><c/></root>");
//! # Ok::<(), treeconv::Error>(())
//! ```

use crate::converters::{parse_json, parse_stream, write_stream, Adapter, JsonAdapter, XmlAdapter, XmlConfig, YamlAdapter};
use crate::error::{Error, Result};
use crate::value::Value;
use crate::xml::{WriteOptions, XmlDocument};
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Convert a JSON value to an XML document
pub fn json_to_xml(json: &JsonValue, config: &XmlConfig) -> Result<XmlDocument> {
    let value = JsonAdapter::new().decode(json)?;
    XmlAdapter::with_config(config.clone()).encode(&value)
}

/// Convert an XML document to a JSON value
pub fn xml_to_json(doc: &XmlDocument, config: &XmlConfig) -> Result<JsonValue> {
    let value = XmlAdapter::with_config(config.clone()).decode(doc)?;
    JsonAdapter::new().encode(&value)
}

/// Convert a JSON value to a YAML document
pub fn json_to_yaml(json: &JsonValue) -> Result<YamlValue> {
    let value = JsonAdapter::new().decode(json)?;
    YamlAdapter::new().encode(&value)
}

/// Convert a YAML document to a JSON value
pub fn yaml_to_json(yaml: &YamlValue) -> Result<JsonValue> {
    let value = YamlAdapter::new().decode(yaml)?;
    JsonAdapter::new().encode(&value)
}

/// Convert every document of a YAML stream to a JSON value
pub fn yaml_stream_to_json(stream: &[YamlValue]) -> Result<Vec<JsonValue>> {
    let json = JsonAdapter::new();
    YamlAdapter::new()
        .decode_stream(stream)?
        .iter()
        .map(|value| json.encode(value))
        .collect()
}

/// Convert an XML document to a YAML document
pub fn xml_to_yaml(doc: &XmlDocument, config: &XmlConfig) -> Result<YamlValue> {
    let value = XmlAdapter::with_config(config.clone()).decode(doc)?;
    YamlAdapter::new().encode(&value)
}

/// Convert a YAML document to an XML document
pub fn yaml_to_xml(yaml: &YamlValue, config: &XmlConfig) -> Result<XmlDocument> {
    let value = YamlAdapter::new().decode(yaml)?;
    XmlAdapter::with_config(config.clone()).encode(&value)
}

/// Supported text formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// JSON
    Json,
    /// YAML
    Yaml,
    /// XML
    Xml,
}

impl Format {
    /// Detect the format from a file extension
    pub fn from_extension(path: &Path) -> Option<Format> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    /// Lowercase name of the format
    pub fn name(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Xml => "xml",
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "xml" => Ok(Format::Xml),
            other => Err(Error::InvalidArgument(format!("unknown format '{}'", other))),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options for text-level conversion
#[derive(Debug, Clone, Default)]
pub struct TranscodeOptions {
    /// XML adapter configuration
    pub xml: XmlConfig,
    /// Indent JSON and XML output
    pub pretty: bool,
    /// Emit an XML declaration
    pub xml_declaration: bool,
}

impl TranscodeOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the XML configuration
    pub fn with_xml_config(mut self, config: XmlConfig) -> Self {
        self.xml = config;
        self
    }

    /// Set pretty printing
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Set whether XML output starts with a declaration
    pub fn with_xml_declaration(mut self, declaration: bool) -> Self {
        self.xml_declaration = declaration;
        self
    }

    fn write_options(&self) -> WriteOptions {
        WriteOptions::new()
            .with_indent(self.pretty.then_some(2))
            .with_declaration(self.xml_declaration)
    }
}

/// Parse text in `format` and decode it into a canonical tree.
///
/// A YAML input must hold exactly one document.
pub fn decode_str(input: &str, format: Format, options: &TranscodeOptions) -> Result<Value> {
    match format {
        Format::Json => {
            JsonAdapter::new().decode(&parse_json(input)?)
        }
        Format::Yaml => YamlAdapter::new().decode_single(&parse_stream(input)?),
        Format::Xml => {
            let doc = XmlDocument::parse(input)?;
            XmlAdapter::with_config(options.xml.clone()).decode(&doc)
        }
    }
}

/// Encode a canonical tree and write it as text in `format`
pub fn encode_str(value: &Value, format: Format, options: &TranscodeOptions) -> Result<String> {
    match format {
        Format::Json => {
            let json = JsonAdapter::new().encode(value)?;
            Ok(if options.pretty {
                serde_json::to_string_pretty(&json)?
            } else {
                serde_json::to_string(&json)?
            })
        }
        Format::Yaml => write_stream(&YamlAdapter::new().encode_stream(value)?),
        Format::Xml => XmlAdapter::with_config(options.xml.clone())
            .encode(value)?
            .to_xml_string(&options.write_options()),
    }
}

/// Convert text from one format to another
pub fn transcode_str(
    input: &str,
    from: Format,
    to: Format,
    options: &TranscodeOptions,
) -> Result<String> {
    log::debug!("transcoding {} -> {}", from, to);
    let value = decode_str(input, from, options)?;
    encode_str(&value, to, options)
}
