//! Comparison report
//!
//! These structures serialize with serde so a comparison can be printed
//! as JSON by the command-line tool or stored next to test fixtures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How strictly two trees are compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    /// Types, child counts and values must match
    #[default]
    Strict,
    /// Null, empty mapping, empty sequence, empty string and absence are equivalent
    Lenient,
}

impl CompareMode {
    /// Mode for a `lenient_null_is_empty` flag
    pub fn from_lenient(lenient: bool) -> Self {
        if lenient {
            CompareMode::Lenient
        } else {
            CompareMode::Strict
        }
    }

    /// Check if this is the lenient mode
    pub fn is_lenient(self) -> bool {
        self == CompareMode::Lenient
    }
}

/// One place where two trees disagree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    /// Location in the tree (`$`, `$.a[2].b`, `$['odd key']`)
    pub path: String,

    /// What differs
    pub reason: String,

    /// Left-hand value, rendered for display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,

    /// Right-hand value, rendered for display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
}

impl Difference {
    /// Create a difference without rendered values
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
            left: None,
            right: None,
        }
    }

    /// Attach rendered left and right values
    pub fn with_values(mut self, left: Option<String>, right: Option<String>) -> Self {
        self.left = left;
        self.right = right;
        self
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)?;
        if self.left.is_some() || self.right.is_some() {
            write!(
                f,
                " (left: {}, right: {})",
                self.left.as_deref().unwrap_or("<absent>"),
                self.right.as_deref().unwrap_or("<absent>")
            )?;
        }
        Ok(())
    }
}

/// Result of comparing two trees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    /// Mode the comparison ran in
    pub mode: CompareMode,

    /// Every difference found, in traversal order
    pub differences: Vec<Difference>,
}

impl Comparison {
    /// Check if the trees are equivalent
    pub fn is_equal(&self) -> bool {
        self.differences.is_empty()
    }

    /// The first difference, if any
    pub fn first_difference(&self) -> Option<&Difference> {
        self.differences.first()
    }
}

/// Append a mapping key to a path
pub fn key_path(parent: &str, key: &str) -> String {
    let simple = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-'));
    if simple {
        format!("{}.{}", parent, key)
    } else {
        format!("{}['{}']", parent, key.replace('\'', "\\'"))
    }
}

/// Append a sequence index to a path
pub fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}
