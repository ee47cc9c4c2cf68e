//! # treeconv
//!
//! Lossless-as-possible conversion between JSON, YAML and XML through a
//! single canonical tree.
//!
//! ## Features
//!
//! - One scalar typing ladder shared by every untyped format
//! - Canonical tree with ordered, unique-keyed mappings
//! - XML name sanitization and two-pass namespace resolution
//! - Adapters for `serde_json`, `serde_yaml` and a native XML tree
//! - An equivalence oracle with strict and lenient modes
//!
//! ## Example
//!
//! ```rust
//! use treeconv::converters::{Adapter, XmlAdapter, YamlAdapter, parse_stream};
//! use treeconv::xml::WriteOptions;
//!
//! let stream = parse_stream("a: 1\nb: true\nc: null\n")?;
//! let value = YamlAdapter::new().decode_single(&stream)?;
//! let xml = XmlAdapter::new().encode(&value)?.to_xml_string(&WriteOptions::new())?;
//! assert_eq!(xml, "<root><a>1</a><b>true</b><c/></root>");
//! # Ok::<(), treeconv::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Canonical model
pub mod scalar;
pub mod value;

// XML naming
pub mod names;
pub mod namespaces;
pub mod xml;

// Conversion
pub mod converters;
pub mod transcode;

// Testing support
pub mod comparison;

// Re-exports for convenience
pub use comparison::{compare, equal, CompareMode, Comparison, Difference};
pub use converters::{Adapter, JsonAdapter, XmlAdapter, XmlConfig, YamlAdapter};
pub use error::{Error, Result};
pub use scalar::{infer, Scalar, ScalarKind};
pub use value::{Mapping, Value};

/// Version of the treeconv library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
