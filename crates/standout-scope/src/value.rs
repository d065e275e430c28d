//! Value comparison for criteria and ordering.
//!
//! Records and criteria both carry [`serde_json::Value`]s. This module
//! defines how two such values compare: numerically across integer and
//! float representations, lexicographically for strings and arrays, and
//! not at all across mismatched types.

use std::cmp::Ordering;

use serde_json::Value;

/// Numeric value with its original precision.
///
/// JSON numbers are held as one of three variants so that integer
/// comparisons stay exact. Comparisons between different variants go
/// through `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Compares two numbers, handling mixed types.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),
            // Pairs outside the shared i64 range order by sign alone.
            (Number::I64(a), Number::U64(b)) if a < 0 || b > i64::MAX as u64 => {
                Some(Ordering::Less)
            }
            (Number::U64(a), Number::I64(b)) if b < 0 || a > i64::MAX as u64 => {
                Some(Ordering::Greater)
            }
            (Number::I64(a), Number::U64(b)) => Some(a.cmp(&(b as i64))),
            (Number::U64(a), Number::I64(b)) => Some((a as i64).cmp(&b)),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

impl From<&serde_json::Number> for Number {
    fn from(n: &serde_json::Number) -> Self {
        if let Some(i) = n.as_i64() {
            Number::I64(i)
        } else if let Some(u) = n.as_u64() {
            Number::U64(u)
        } else {
            Number::F64(n.as_f64().unwrap_or(f64::NAN))
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

/// Compares two values of the same kind.
///
/// - Numbers: numerically, across integer and float representations
/// - Strings: lexicographically
/// - Booleans: `false < true`
/// - Null: equal to null
/// - Arrays: element-wise, then by length
///
/// Returns `None` for mismatched kinds, objects, and NaN.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => Number::from(a).compare(Number::from(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Array(a), Value::Array(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                match compare_values(x, y)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(a.len().cmp(&b.len()))
        }
        _ => None,
    }
}

/// Tests two values for equality.
///
/// Comparable values are equal when they compare `Equal` (so `1 == 1.0`);
/// anything else falls back to structural equality.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match compare_values(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}

/// Returns the kind name of a value, for error messages.
pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn number_comparisons_same_type() {
        assert_eq!(
            Number::I64(5).compare(Number::I64(10)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::U64(10).compare(Number::U64(5)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Number::F64(5.0).compare(Number::F64(5.0)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn number_comparisons_mixed_types() {
        assert_eq!(
            Number::I64(5).compare(Number::U64(10)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::I64(-1).compare(Number::U64(u64::MAX)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::U64(u64::MAX).compare(Number::I64(i64::MAX)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Number::I64(5).compare(Number::F64(5.0)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn number_nan_comparison() {
        assert_eq!(Number::F64(f64::NAN).compare(Number::F64(1.0)), None);
    }

    fn number(value: Value) -> Number {
        match value {
            Value::Number(n) => Number::from(&n),
            other => panic!("not a number: {other}"),
        }
    }

    #[test]
    fn json_number_conversion() {
        assert_eq!(number(json!(-3)), Number::I64(-3));
        assert_eq!(number(json!(u64::MAX)), Number::U64(u64::MAX));
        assert_eq!(number(json!(1.5)), Number::F64(1.5));
    }

    #[test]
    fn compare_scalars() {
        assert_eq!(
            compare_values(&json!("apple"), &json!("banana")),
            Some(Ordering::Less)
        );
        assert_eq!(compare_values(&json!(2), &json!(1.5)), Some(Ordering::Greater));
        assert_eq!(
            compare_values(&json!(false), &json!(true)),
            Some(Ordering::Less)
        );
        assert_eq!(compare_values(&json!(null), &json!(null)), Some(Ordering::Equal));
    }

    #[test]
    fn compare_arrays() {
        assert_eq!(
            compare_values(&json!([1, 2]), &json!([1, 3])),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare_values(&json!([1, 2]), &json!([1])),
            Some(Ordering::Greater)
        );
        assert_eq!(compare_values(&json!([1, "a"]), &json!([1, 2])), None);
    }

    #[test]
    fn compare_type_mismatch() {
        assert_eq!(compare_values(&json!("1"), &json!(1)), None);
        assert_eq!(compare_values(&json!(null), &json!(0)), None);
        assert_eq!(compare_values(&json!({}), &json!({})), None);
    }

    #[test]
    fn equality() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(values_equal(&json!({"a": 1}), &json!({"a": 1})));
        assert!(!values_equal(&json!("1"), &json!(1)));
        assert!(!values_equal(&json!(null), &json!("x")));
    }
}
