//! XML name validation and sanitization
//!
//! This module provides validation for XML names, NCNames, and QNames
//! according to the XML 1.0 (fifth edition) productions, and the
//! [`make_valid_xml_name`] sanitizer that turns arbitrary mapping keys
//! into element and attribute names.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Name used when sanitizing an empty key
pub const UNNAMED: &str = "unnamed";

// Names beginning with "xml" in any case are reserved by XML 1.0.
static RESERVED_XML_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i)xml").unwrap());

/// Check the XML `NameStartChar` production, excluding ':'
pub fn is_name_start_char(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | '_'
        | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

/// Check the XML `NameChar` production, excluding ':'
pub fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

/// Check if a string is a valid QName (qualified name)
pub fn is_valid_qname(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    // QName can be "prefix:localName" or just "localName"
    if let Some((prefix, local)) = name.split_once(':') {
        is_valid_ncname(prefix) && is_valid_ncname(local)
    } else {
        is_valid_ncname(name)
    }
}

/// Validate a QName and return an error if invalid
pub fn validate_qname(name: &str) -> Result<()> {
    if is_valid_qname(name) {
        Ok(())
    } else {
        Err(Error::Name(format!("Invalid QName: '{}'", name)))
    }
}

/// Split a key into `(prefix, local)` only when it is a well-formed
/// prefixed QName; anything else is treated as a plain name.
pub fn split_prefixed(key: &str) -> Option<(&str, &str)> {
    match key.split_once(':') {
        Some((prefix, local)) if is_valid_ncname(prefix) && is_valid_ncname(local) => {
            Some((prefix, local))
        }
        _ => None,
    }
}

/// Turn an arbitrary key into a valid XML NCName.
///
/// - every character that is not a `NameChar` (including ':') becomes '_'
/// - an empty key becomes [`UNNAMED`]
/// - a first character that is not a `NameStartChar` gets a '_' prefix
/// - a name starting with "xml" (any case) gets a '_' prefix
pub fn make_valid_xml_name(raw: &str) -> String {
    if raw.is_empty() {
        return UNNAMED.to_string();
    }

    let mut name: String = raw
        .chars()
        .map(|c| if is_name_char(c) { c } else { '_' })
        .collect();

    if !name.chars().next().is_some_and(is_name_start_char) {
        name.insert(0, '_');
    }

    if RESERVED_XML_PREFIX.is_match(&name) {
        name.insert(0, '_');
    }

    name
}
