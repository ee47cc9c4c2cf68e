//! Error types for treeconv
//!
//! This module defines all error types used throughout the library.
//! Every adapter fails fast with one of these kinds; no partial tree is
//! ever returned alongside an error.

use std::fmt;
use thiserror::Error;

/// Result type alias using treeconv Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for treeconv operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required input was absent or empty
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A single-document view was requested of a multi-document stream
    #[error("multi-document error: expected a single document, found {0}")]
    MultiDocument(usize),

    /// Malformed or unresolvable namespace declaration/usage
    #[error("namespace error: {0}")]
    Namespace(String),

    /// The tree has no defined mapping into the target format
    #[error("unsupported shape: {0}")]
    UnsupportedShape(String),

    /// Input could not be parsed or decoded
    ///
    /// Every native parse failure (XML, JSON or YAML text) surfaces here,
    /// as do duplicate mapping keys and structured YAML keys.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] MalformedInput),

    /// Name error (invalid XML name)
    #[error("name error: {0}")]
    Name(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// XML writing error
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON writing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML writing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Shorthand for a [`MalformedInput`] error without a path
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedInput(MalformedInput::new(message))
    }
}

/// Malformed input error with the location of the offending node
#[derive(Debug, Clone)]
pub struct MalformedInput {
    /// Error message
    pub message: String,
    /// Path to the offending node in the source tree
    pub path: Option<String>,
    /// Snippet of the offending node
    pub instance: Option<String>,
}

impl MalformedInput {
    /// Create a new malformed input error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            instance: None,
        }
    }

    /// Set the path of the offending node
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the instance snippet
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }
}

impl fmt::Display for MalformedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref path) = self.path {
            write!(f, " (at {})", path)?;
        }

        if let Some(ref instance) = self.instance {
            write!(f, "\n\nInstance:\n{}", instance)?;
        }

        Ok(())
    }
}

impl std::error::Error for MalformedInput {}
