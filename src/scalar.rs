//! Scalar typing engine
//!
//! XML text, XML attribute values and YAML scalars are untyped text. This
//! module infers the most specific scalar type for such text and renders
//! typed scalars back to text that infers to the same type and value.
//!
//! The inference ladder is defined once, here, and is shared by every
//! adapter:
//!
//! 1. boolean
//! 2. 8-bit unsigned integer
//! 3. 32-bit signed integer
//! 4. 64-bit signed integer
//! 5. double (finite only)
//! 6. arbitrary-precision decimal
//! 7. date-time without offset
//! 8. date-time with offset
//! 9. string (fallback, never fails)
//!
//! The first rung that parses wins.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;

static DECIMAL_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").unwrap());

/// Naive date-time layouts accepted by [`infer`], tried in order.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Offset date-time layouts accepted after RFC 3339 fails.
const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f %z"];

const NAIVE_RENDER_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A single typed leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Boolean value
    Bool(bool),
    /// 8-bit unsigned integer
    UInt8(u8),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// Double-precision float
    Double(f64),
    /// Arbitrary-precision decimal
    Decimal(Decimal),
    /// Date-time without offset
    DateTime(NaiveDateTime),
    /// Date-time with an explicit UTC offset
    DateTimeOffset(DateTime<FixedOffset>),
    /// String value
    String(String),
}

/// The type tag of a [`Scalar`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Boolean
    Bool,
    /// 8-bit unsigned integer
    UInt8,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// Double-precision float
    Double,
    /// Arbitrary-precision decimal
    Decimal,
    /// Date-time without offset
    DateTime,
    /// Date-time with offset
    DateTimeOffset,
    /// String
    String,
}

impl ScalarKind {
    /// Check if this kind is numeric
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ScalarKind::UInt8
                | ScalarKind::Int32
                | ScalarKind::Int64
                | ScalarKind::Double
                | ScalarKind::Decimal
        )
    }

    /// Short lowercase name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "boolean",
            ScalarKind::UInt8 => "uint8",
            ScalarKind::Int32 => "int32",
            ScalarKind::Int64 => "int64",
            ScalarKind::Double => "double",
            ScalarKind::Decimal => "decimal",
            ScalarKind::DateTime => "datetime",
            ScalarKind::DateTimeOffset => "datetimeoffset",
            ScalarKind::String => "string",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Infer the most specific scalar for a piece of text.
///
/// Never fails: text that matches no typed rung (including the empty
/// string) becomes [`Scalar::String`].
pub fn infer(text: &str) -> Scalar {
    if let Some(b) = parse_bool(text) {
        return Scalar::Bool(b);
    }
    if let Some(v) = parse_u8(text) {
        return Scalar::UInt8(v);
    }
    if let Ok(v) = text.parse::<i32>() {
        return Scalar::Int32(v);
    }
    if let Ok(v) = text.parse::<i64>() {
        return Scalar::Int64(v);
    }
    if let Some(v) = parse_double(text) {
        return Scalar::Double(v);
    }
    if let Some(v) = parse_decimal(text) {
        return Scalar::Decimal(v);
    }
    if let Some(v) = parse_datetime(text) {
        return Scalar::DateTime(v);
    }
    if let Some(v) = parse_datetime_offset(text) {
        return Scalar::DateTimeOffset(v);
    }
    Scalar::String(text.to_string())
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

// A negative zero ("-0", "-00") is still a valid unsigned byte.
fn parse_u8(text: &str) -> Option<u8> {
    match text.strip_prefix('-') {
        Some(rest) if !rest.starts_with(['+', '-']) => match rest.parse::<u8>() {
            Ok(0) => Some(0),
            _ => None,
        },
        _ => text.parse::<u8>().ok(),
    }
}

fn parse_double(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    if !DECIMAL_LITERAL.is_match(text) {
        return None;
    }
    text.parse::<Decimal>().ok()
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn parse_datetime_offset(text: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    OFFSET_DATETIME_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(text, format).ok())
}

impl Scalar {
    /// Build the narrowest integer scalar that holds `value`
    pub fn integer(value: i64) -> Scalar {
        if let Ok(v) = u8::try_from(value) {
            Scalar::UInt8(v)
        } else if let Ok(v) = i32::try_from(value) {
            Scalar::Int32(v)
        } else {
            Scalar::Int64(value)
        }
    }

    /// Get the type tag of this scalar
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::UInt8(_) => ScalarKind::UInt8,
            Scalar::Int32(_) => ScalarKind::Int32,
            Scalar::Int64(_) => ScalarKind::Int64,
            Scalar::Double(_) => ScalarKind::Double,
            Scalar::Decimal(_) => ScalarKind::Decimal,
            Scalar::DateTime(_) => ScalarKind::DateTime,
            Scalar::DateTimeOffset(_) => ScalarKind::DateTimeOffset,
            Scalar::String(_) => ScalarKind::String,
        }
    }

    /// Check if this is a numeric scalar
    pub fn is_numeric(&self) -> bool {
        self.kind().is_numeric()
    }

    /// Get the string payload, if this is a string scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render to canonical text.
    ///
    /// [`infer`] maps the result back to an equal scalar of the same kind
    /// for every scalar that [`infer`] can produce.
    pub fn render(&self) -> String {
        match self {
            Scalar::Bool(b) => (if *b { "true" } else { "false" }).to_string(),
            Scalar::UInt8(v) => v.to_string(),
            Scalar::Int32(v) => v.to_string(),
            Scalar::Int64(v) => v.to_string(),
            // Debug formatting is the shortest round-trip form and always
            // keeps a '.' or an exponent, so 1.0 does not collapse to "1".
            Scalar::Double(v) => format!("{:?}", v),
            Scalar::Decimal(d) => d.to_string(),
            Scalar::DateTime(dt) => dt.format(NAIVE_RENDER_FORMAT).to_string(),
            Scalar::DateTimeOffset(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            Scalar::String(s) => s.clone(),
        }
    }

    /// Numeric value as a decimal, only when the conversion is exact.
    ///
    /// Whole doubles always convert. Fractional doubles convert only when
    /// the retained decimal maps back to the same double; anything smaller
    /// than the decimal scale gives `None`.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Scalar::UInt8(v) => Some(Decimal::from(*v)),
            Scalar::Int32(v) => Some(Decimal::from(*v)),
            Scalar::Int64(v) => Some(Decimal::from(*v)),
            Scalar::Double(v) => Decimal::from_f64_retain(*v)
                .filter(|d| v.fract() == 0.0 || (!d.is_zero() && d.to_f64() == Some(*v))),
            Scalar::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Numeric value as a double
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Scalar::UInt8(v) => Some(f64::from(*v)),
            Scalar::Int32(v) => Some(f64::from(*v)),
            Scalar::Int64(v) => Some(*v as f64),
            Scalar::Double(v) => Some(*v),
            Scalar::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<u8> for Scalar {
    fn from(value: u8) -> Self {
        Scalar::UInt8(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int32(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int64(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Double(value)
    }
}

impl From<Decimal> for Scalar {
    fn from(value: Decimal) -> Self {
        Scalar::Decimal(value)
    }
}

impl From<NaiveDateTime> for Scalar {
    fn from(value: NaiveDateTime) -> Self {
        Scalar::DateTime(value)
    }
}

impl From<DateTime<FixedOffset>> for Scalar {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Scalar::DateTimeOffset(value)
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}
