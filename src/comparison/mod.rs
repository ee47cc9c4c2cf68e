//! Equivalence of canonical trees
//!
//! This module defines what "equal after a round trip" means. Strict mode
//! is used between JSON and YAML; lenient mode is used whenever XML is on
//! one side, since XML cannot tell null from empty.

mod oracle;
mod report;

pub use oracle::{compare, equal};
pub use report::{index_path, key_path, CompareMode, Comparison, Difference};
