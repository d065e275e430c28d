//! Atomic filter predicates.
//!
//! A [`Criterion`] is a single `(attribute, operator, value)` predicate.
//! Criteria are validated when they are constructed and never change
//! afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ScopeError};
use crate::operator::Operator;
use crate::record::Record;
use crate::value::{compare_values, kind, values_equal};

/// A single filter predicate.
///
/// A criterion consists of:
/// - An attribute name (the record key to read)
/// - An operator (how to compare)
/// - A value (what to compare against)
///
/// Membership operators (`one_of`, `not_one_of`) take an array value and
/// ordering operators a single non-array value. Equality operators take
/// either, comparing arrays element by element.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use standout_scope::{Criterion, Operator};
///
/// let criterion = Criterion::new("year", Operator::GreaterThan, 2000).unwrap();
/// assert!(criterion.test(&json!({"year": 2001})));
/// assert!(!criterion.test(&json!({"year": 1999})));
///
/// // The tuple form resolves operator tokens.
/// let same = Criterion::try_from(("year", "gt", 2000)).unwrap();
/// assert_eq!(criterion, same);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Criterion {
    attribute: String,
    operator: Operator,
    value: Value,
}

impl Criterion {
    /// Creates a new criterion.
    ///
    /// Fails with [`ScopeError::Argument`] when the attribute is empty or
    /// the value's shape doesn't fit the operator.
    pub fn new(
        attribute: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Result<Self> {
        let attribute = attribute.into();
        let value = value.into();

        if attribute.is_empty() {
            return Err(ScopeError::Argument(
                "criterion attribute must be a non-empty string".to_string(),
            ));
        }

        match (operator, value.is_array()) {
            (op, false) if op.is_membership() => Err(ScopeError::Argument(format!(
                "operator '{operator}' expects an array, got {}",
                kind(&value)
            ))),
            (op, true) if op.is_comparison() => Err(ScopeError::Argument(format!(
                "operator '{operator}' expects a single value, got array"
            ))),
            _ => Ok(Criterion {
                attribute,
                operator,
                value,
            }),
        }
    }

    /// Returns the attribute name.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Returns the operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the comparison value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Splits the criterion into its attribute, operator and value.
    pub fn into_parts(self) -> (String, Operator, Value) {
        (self.attribute, self.operator, self.value)
    }

    /// Tests this criterion against a record.
    ///
    /// A missing attribute reads as `null`. Ordering operators never match
    /// values that don't compare (type mismatch, null, NaN).
    pub fn test<R: Record + ?Sized>(&self, record: &R) -> bool {
        let actual = record.attribute_or_null(&self.attribute);

        match self.operator {
            Operator::Equal => values_equal(actual, &self.value),
            Operator::NotEqual => !values_equal(actual, &self.value),
            Operator::OneOf => self.contains(actual),
            Operator::NotOneOf => !self.contains(actual),
            op => compare_values(actual, &self.value).is_some_and(|ord| op.eval_ordering(ord)),
        }
    }

    fn contains(&self, actual: &Value) -> bool {
        self.value
            .as_array()
            .is_some_and(|items| items.iter().any(|item| values_equal(actual, item)))
    }
}

impl<'s, S, V> TryFrom<(S, &'s str, V)> for Criterion
where
    S: Into<String>,
    V: Into<Value>,
{
    type Error = ScopeError;

    fn try_from((attribute, token, value): (S, &'s str, V)) -> Result<Self> {
        Criterion::new(attribute, token.parse()?, value)
    }
}

impl TryFrom<Value> for Criterion {
    type Error = ScopeError;

    /// Accepts exactly `[attribute, operator, value]`.
    fn try_from(value: Value) -> Result<Self> {
        match &value {
            Value::Array(parts) => match parts.as_slice() {
                [Value::String(attribute), Value::String(token), operand] => {
                    Criterion::new(attribute.clone(), token.parse()?, operand.clone())
                }
                _ => Err(malformed(&value)),
            },
            _ => Err(malformed(&value)),
        }
    }
}

fn malformed(value: &Value) -> ScopeError {
    ScopeError::Argument(format!(
        "malformed criterion: expected [attribute, operator, value], got {value}"
    ))
}

impl From<Criterion> for Value {
    fn from(criterion: Criterion) -> Self {
        Value::Array(vec![
            Value::String(criterion.attribute),
            Value::String(criterion.operator.as_str().to_string()),
            criterion.value,
        ])
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.attribute, self.operator, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn criterion(attribute: &str, op: Operator, value: Value) -> Criterion {
        Criterion::new(attribute, op, value).unwrap()
    }

    #[test]
    fn equal_and_not_equal() {
        let eq = criterion("title", Operator::Equal, json!("B"));
        assert!(eq.test(&json!({"title": "B"})));
        assert!(!eq.test(&json!({"title": "A"})));
        assert!(!eq.test(&json!({"title": "b"}))); // case sensitive

        let ne = criterion("title", Operator::NotEqual, json!("B"));
        assert!(!ne.test(&json!({"title": "B"})));
        assert!(ne.test(&json!({"title": "A"})));
    }

    #[test]
    fn missing_attribute_reads_as_null() {
        let eq_null = criterion("deleted_at", Operator::Equal, Value::Null);
        assert!(eq_null.test(&json!({"id": 1})));

        let ne = criterion("title", Operator::NotEqual, json!("B"));
        assert!(ne.test(&json!({"id": 1})));

        let gt = criterion("year", Operator::GreaterThan, json!(2000));
        assert!(!gt.test(&json!({"id": 1})));
    }

    #[test]
    fn membership() {
        let one_of = criterion("title", Operator::OneOf, json!(["a", "b"]));
        assert!(one_of.test(&json!({"title": "a"})));
        assert!(one_of.test(&json!({"title": "b"})));
        assert!(!one_of.test(&json!({"title": "c"})));

        let not_one_of = criterion("title", Operator::NotOneOf, json!(["a", "b"]));
        assert!(!not_one_of.test(&json!({"title": "a"})));
        assert!(not_one_of.test(&json!({"title": "c"})));
        assert!(not_one_of.test(&json!({})));
    }

    #[test]
    fn number_comparisons() {
        let record = json!({"count": 10});

        assert!(criterion("count", Operator::GreaterThan, json!(9)).test(&record));
        assert!(!criterion("count", Operator::GreaterThan, json!(10)).test(&record));
        assert!(criterion("count", Operator::GreaterThanOrEqual, json!(10)).test(&record));
        assert!(!criterion("count", Operator::GreaterThanOrEqual, json!(11)).test(&record));
        assert!(criterion("count", Operator::LessThan, json!(11)).test(&record));
        assert!(!criterion("count", Operator::LessThan, json!(10)).test(&record));
        assert!(criterion("count", Operator::LessThanOrEqual, json!(10)).test(&record));
        assert!(!criterion("count", Operator::LessThanOrEqual, json!(9.5)).test(&record));
    }

    #[test]
    fn mixed_numeric_representations() {
        let eq = criterion("count", Operator::Equal, json!(10));
        assert!(eq.test(&json!({"count": 10.0})));
    }

    #[test]
    fn type_mismatch_doesnt_compare() {
        let gt = criterion("title", Operator::GreaterThan, json!(1));
        assert!(!gt.test(&json!({"title": "z"})));

        let lt = criterion("title", Operator::LessThan, json!(1));
        assert!(!lt.test(&json!({"title": "z"})));
    }

    #[test]
    fn equality_against_arrays() {
        let eq = criterion("tags", Operator::Equal, json!(["a", "b"]));
        assert!(eq.test(&json!({"tags": ["a", "b"]})));
        assert!(!eq.test(&json!({"tags": "a"})));
        assert!(!eq.test(&json!({"tags": ["b", "a"]})));

        let ne = criterion("tags", Operator::NotEqual, json!(["a"]));
        assert!(ne.test(&json!({"tags": ["a", "b"]})));
        assert!(!ne.test(&json!({"tags": ["a"]})));
    }

    #[test]
    fn rejects_empty_attribute() {
        let err = Criterion::new("", Operator::Equal, 1).unwrap_err();
        assert!(matches!(err, ScopeError::Argument(_)));
    }

    #[test]
    fn rejects_value_shape_mismatch() {
        assert!(matches!(
            Criterion::new("title", Operator::OneOf, "a"),
            Err(ScopeError::Argument(_))
        ));
        assert!(matches!(
            Criterion::new("title", Operator::GreaterThan, json!([1])),
            Err(ScopeError::Argument(_))
        ));
    }

    #[test]
    fn tuple_form_resolves_tokens() {
        let c = Criterion::try_from(("year", "gte", 2000)).unwrap();
        assert_eq!(c.operator(), Operator::GreaterThanOrEqual);

        let err = Criterion::try_from(("year", "between", 2000)).unwrap_err();
        assert!(matches!(err, ScopeError::UnknownOperator { ref name, .. } if name == "between"));
    }

    #[test]
    fn json_form_requires_three_elements() {
        let c = Criterion::try_from(json!(["title", "eq", "B"])).unwrap();
        assert_eq!(c.attribute(), "title");
        assert_eq!(c.value(), &json!("B"));

        for malformed in [
            json!(["title", "eq"]),
            json!(["title", "eq", "B", "extra"]),
            json!({"title": "B"}),
            json!([1, "eq", "B"]),
        ] {
            assert!(matches!(
                Criterion::try_from(malformed),
                Err(ScopeError::Argument(_))
            ));
        }
    }

    #[test]
    fn serde_round_trips_as_tuple() {
        let c = criterion("tags", Operator::OneOf, json!(["x"]));
        let encoded = serde_json::to_value(&c).unwrap();
        assert_eq!(encoded, json!(["tags", "one_of", ["x"]]));

        let decoded: Criterion = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, c);

        assert!(serde_json::from_value::<Criterion>(json!(["tags", "in", ["x"]])).is_err());
    }

    #[test]
    fn display() {
        let c = criterion("title", Operator::Equal, json!("B"));
        assert_eq!(c.to_string(), "title eq \"B\"");
    }
}
