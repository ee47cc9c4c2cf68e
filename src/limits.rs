//! Limits and constraints for tree conversion
//!
//! Every adapter walks its input recursively. These limits bound that
//! recursion so a hostile or accidentally cyclic-looking input (deeply
//! nested arrays, XML bombs) fails with an error instead of exhausting
//! the stack.

use crate::error::{Error, Result};

/// Conversion limits configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum nesting depth of a tree
    pub max_depth: usize,

    /// Maximum number of documents accepted from one YAML stream
    pub max_documents: usize,

    /// Maximum number of attributes per XML element
    pub max_attributes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 1000,
            max_documents: 10_000,
            max_attributes: 1000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_depth: 100,
            max_documents: 100,
            max_attributes: 100,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_depth: 10_000,
            max_documents: 1_000_000,
            max_attributes: 10_000,
        }
    }

    /// Set the maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Check if nesting depth is within limits
    pub fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            Err(Error::LimitExceeded(format!(
                "nesting depth {} exceeds maximum {}",
                depth, self.max_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the number of documents is within limits
    pub fn check_documents(&self, count: usize) -> Result<()> {
        if count > self.max_documents {
            Err(Error::LimitExceeded(format!(
                "document count {} exceeds maximum {}",
                count, self.max_documents
            )))
        } else {
            Ok(())
        }
    }

    /// Check if number of attributes is within limits
    pub fn check_attributes(&self, count: usize) -> Result<()> {
        if count > self.max_attributes {
            Err(Error::LimitExceeded(format!(
                "attribute count {} exceeds maximum {}",
                count, self.max_attributes
            )))
        } else {
            Ok(())
        }
    }
}
