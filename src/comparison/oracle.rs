//! Tree equivalence
//!
//! Mappings compare by key regardless of order; sequences compare by
//! position. Numeric scalars compare by value at decimal granularity, so
//! `44` and `44.0` are equal while `"44"` and `44` are not.

use super::report::{index_path, key_path, CompareMode, Comparison, Difference};
use crate::scalar::Scalar;
use crate::value::Value;

/// Compare two trees and collect every difference
pub fn compare(left: &Value, right: &Value, mode: CompareMode) -> Comparison {
    let mut differences = Vec::new();
    compare_at(Some(left), Some(right), "$", mode, &mut differences);
    Comparison { mode, differences }
}

/// Check two trees for equivalence
pub fn equal(left: &Value, right: &Value, lenient_null_is_empty: bool) -> bool {
    compare(left, right, CompareMode::from_lenient(lenient_null_is_empty)).is_equal()
}

// Absent counts as empty in lenient mode.
fn is_empty_equivalent(value: Option<&Value>) -> bool {
    value.map_or(true, Value::is_empty_like)
}

fn describe(value: Option<&Value>) -> Option<String> {
    value.map(|value| match value {
        Value::Null => "null".to_string(),
        Value::Scalar(scalar) => format!("{} {:?}", scalar.kind(), scalar.render()),
        Value::Sequence(items) => format!("sequence of {}", items.len()),
        Value::Mapping(map) => format!("mapping of {}", map.len()),
    })
}

fn compare_at(
    left: Option<&Value>,
    right: Option<&Value>,
    path: &str,
    mode: CompareMode,
    out: &mut Vec<Difference>,
) {
    if mode.is_lenient() && is_empty_equivalent(left) && is_empty_equivalent(right) {
        return;
    }

    let (l, r) = match (left, right) {
        (Some(l), Some(r)) => (l, r),
        (None, _) | (_, None) => {
            let reason = if left.is_none() {
                "missing on the left"
            } else {
                "missing on the right"
            };
            out.push(Difference::new(path, reason).with_values(describe(left), describe(right)));
            return;
        }
    };

    match (l, r) {
        (Value::Null, Value::Null) => {}
        (Value::Scalar(a), Value::Scalar(b)) => {
            if let Some(reason) = scalar_difference(a, b) {
                out.push(Difference::new(path, reason).with_values(describe(left), describe(right)));
            }
        }
        (Value::Sequence(a), Value::Sequence(b)) => {
            if a.len() != b.len() {
                out.push(
                    Difference::new(path, "sequence lengths differ")
                        .with_values(describe(left), describe(right)),
                );
                return;
            }
            for (i, (x, y)) in a.iter().zip(b).enumerate() {
                compare_at(Some(x), Some(y), &index_path(path, i), mode, out);
            }
        }
        (Value::Mapping(a), Value::Mapping(b)) => {
            for (key, x) in a {
                compare_at(Some(x), b.get(key), &key_path(path, key), mode, out);
            }
            for (key, y) in b {
                if !a.contains_key(key) {
                    compare_at(None, Some(y), &key_path(path, key), mode, out);
                }
            }
        }
        _ => out.push(
            Difference::new(
                path,
                format!("type mismatch: {} vs {}", l.type_name(), r.type_name()),
            )
            .with_values(describe(left), describe(right)),
        ),
    }
}

fn scalar_difference(a: &Scalar, b: &Scalar) -> Option<String> {
    if a.is_numeric() && b.is_numeric() {
        let same = match (a, b) {
            (Scalar::Double(x), Scalar::Double(y)) => x == y,
            _ => match (a.to_decimal(), b.to_decimal()) {
                (Some(x), Some(y)) => x == y,
                // No exact decimal
                _ => a.to_f64() == b.to_f64(),
            },
        };
        return (!same).then(|| "numbers differ".to_string());
    }

    if a.kind() != b.kind() {
        return Some(format!("type mismatch: {} vs {}", a.kind(), b.kind()));
    }
    (a != b).then(|| "values differ".to_string())
}
