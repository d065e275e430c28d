//! Filter expressions and the criteria parser.
//!
//! A filter expression is either a mapping from attribute names to values,
//! or a closure that receives an [`Operators`] context and returns such a
//! mapping. [`parse`] turns either form into an ordered list of
//! [`Criterion`]s.
//!
//! # Mapping entries
//!
//! | Entry | Criterion |
//! |-------|-----------|
//! | `"title" => "B"` | `title eq "B"` |
//! | `"tags" => ["a", "b"]` | `tags eq ["a","b"]` |
//! | `"tags" => ops.one_of(["a", "b"])` | `tags one_of ["a","b"]` |
//! | `"year" => ops.greater_than(2000)` | `year gt 2000` |
//!
//! # Example
//!
//! ```
//! use standout_scope::{parse, Expression, Filter, Operator};
//!
//! let criteria = parse(Expression::closure(|ops| {
//!     Ok(Filter::new()
//!         .with("author", "X")
//!         .with("year", ops.greater_than(2000)))
//! }))
//! .unwrap();
//!
//! assert_eq!(criteria.len(), 2);
//! assert_eq!(criteria[1].operator(), Operator::GreaterThan);
//! ```

use std::fmt;

use serde_json::Value;
use tracing::trace;

use crate::criterion::Criterion;
use crate::error::{BoxError, Result, ScopeError};
use crate::operator::Operator;

/// Result returned by expression closures.
pub type EvalResult = std::result::Result<Filter, BoxError>;

type ExpressionFn = dyn Fn(&Operators) -> EvalResult + Send + Sync;

/// A declarative filter description.
pub enum Expression {
    /// No filter at all; parses to no criteria.
    Empty,
    /// An attribute-to-term mapping.
    Mapping(Filter),
    /// A JSON object of attribute-to-value pairs.
    Json(Value),
    /// A closure evaluated against the operator context.
    Closure(Box<ExpressionFn>),
}

impl Expression {
    /// Wraps a closure that builds a [`Filter`] from the operator context.
    pub fn closure<F>(f: F) -> Self
    where
        F: Fn(&Operators) -> EvalResult + Send + Sync + 'static,
    {
        Expression::Closure(Box::new(f))
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Empty => f.write_str("Empty"),
            Expression::Mapping(filter) => f.debug_tuple("Mapping").field(filter).finish(),
            Expression::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Expression::Closure(_) => f.write_str("Closure(..)"),
        }
    }
}

impl From<Filter> for Expression {
    fn from(filter: Filter) -> Self {
        Expression::Mapping(filter)
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::Json(value)
    }
}

impl From<()> for Expression {
    fn from(_: ()) -> Self {
        Expression::Empty
    }
}

/// The operator half of a criterion, before an attribute is attached.
///
/// Produced by the [`Operators`] context; the parser injects the attribute
/// name from the mapping key.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    operator: Operator,
    value: Value,
}

impl Partial {
    /// Returns the operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the comparison value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    fn complete(self, attribute: &str) -> Result<Criterion> {
        Criterion::new(attribute, self.operator, self.value)
    }
}

/// The right-hand side of a mapping entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// A plain value, matched by equality.
    Literal(Value),
    /// An operator call from the expression context.
    Partial(Partial),
}

impl From<Partial> for Term {
    fn from(partial: Partial) -> Self {
        Term::Partial(partial)
    }
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        Term::Literal(value)
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::Literal(Value::from(s))
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Term::Literal(Value::from(s))
    }
}

impl From<bool> for Term {
    fn from(b: bool) -> Self {
        Term::Literal(Value::from(b))
    }
}

impl From<i32> for Term {
    fn from(n: i32) -> Self {
        Term::Literal(Value::from(n))
    }
}

impl From<i64> for Term {
    fn from(n: i64) -> Self {
        Term::Literal(Value::from(n))
    }
}

impl From<u32> for Term {
    fn from(n: u32) -> Self {
        Term::Literal(Value::from(n))
    }
}

impl From<u64> for Term {
    fn from(n: u64) -> Self {
        Term::Literal(Value::from(n))
    }
}

impl From<f64> for Term {
    fn from(n: f64) -> Self {
        Term::Literal(Value::from(n))
    }
}

/// An ordered attribute-to-term mapping.
///
/// Keys keep their insertion order, which is the order of the parsed
/// criteria. Inserting an existing key replaces its term in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    entries: Vec<(String, Term)>,
}

impl Filter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Filter::default()
    }

    /// Adds an entry, builder style.
    pub fn with(mut self, attribute: impl Into<String>, term: impl Into<Term>) -> Self {
        self.insert(attribute, term);
        self
    }

    /// Adds an entry, replacing the term of an existing key.
    pub fn insert(&mut self, attribute: impl Into<String>, term: impl Into<Term>) {
        let attribute = attribute.into();
        let term = term.into();
        match self.entries.iter_mut().find(|(key, _)| *key == attribute) {
            Some(entry) => entry.1 = term,
            None => self.entries.push((attribute, term)),
        }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the filter has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.entries.iter().map(|(key, term)| (key.as_str(), term))
    }

    /// Converts the entries into criteria.
    pub fn into_criteria(self) -> Result<Vec<Criterion>> {
        self.entries
            .into_iter()
            .map(|(attribute, term)| {
                if attribute.is_empty() {
                    return Err(ScopeError::InvalidExpression(
                        "filter keys must be non-empty strings".to_string(),
                    ));
                }
                match term {
                    Term::Partial(partial) => partial.complete(&attribute),
                    Term::Literal(value) => Criterion::new(attribute, Operator::Equal, value),
                }
            })
            .collect()
    }
}

impl<K, T> FromIterator<(K, T)> for Filter
where
    K: Into<String>,
    T: Into<Term>,
{
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut filter = Filter::new();
        for (attribute, term) in iter {
            filter.insert(attribute, term);
        }
        filter
    }
}

impl TryFrom<Value> for Filter {
    type Error = ScopeError;

    /// Accepts a JSON object; `null` is an empty filter.
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            Value::Null => Ok(Filter::new()),
            other => Err(ScopeError::InvalidExpression(format!(
                "expected a mapping of attributes to values, got {other}"
            ))),
        }
    }
}

/// The operator context handed to expression closures.
///
/// Each method returns a [`Partial`] to be used as a mapping term.
#[derive(Debug, Clone, Copy, Default)]
pub struct Operators;

impl Operators {
    /// `attribute == value`
    pub fn equal(&self, value: impl Into<Value>) -> Partial {
        self.partial(Operator::Equal, value.into())
    }

    /// `attribute != value`
    pub fn not_equal(&self, value: impl Into<Value>) -> Partial {
        self.partial(Operator::NotEqual, value.into())
    }

    /// `attribute` is one of `values`
    pub fn one_of<I, T>(&self, values: I) -> Partial
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.partial(Operator::OneOf, sequence(values))
    }

    /// `attribute` is none of `values`
    pub fn not_one_of<I, T>(&self, values: I) -> Partial
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.partial(Operator::NotOneOf, sequence(values))
    }

    /// `attribute > value`
    pub fn greater_than(&self, value: impl Into<Value>) -> Partial {
        self.partial(Operator::GreaterThan, value.into())
    }

    /// `attribute >= value`
    pub fn greater_than_or_equal(&self, value: impl Into<Value>) -> Partial {
        self.partial(Operator::GreaterThanOrEqual, value.into())
    }

    /// `attribute < value`
    pub fn less_than(&self, value: impl Into<Value>) -> Partial {
        self.partial(Operator::LessThan, value.into())
    }

    /// `attribute <= value`
    pub fn less_than_or_equal(&self, value: impl Into<Value>) -> Partial {
        self.partial(Operator::LessThanOrEqual, value.into())
    }

    /// Calls an operator by name (token or method name).
    ///
    /// Fails with [`ScopeError::UnknownOperator`] when the name is outside
    /// the operator set.
    pub fn call(&self, name: &str, value: impl Into<Value>) -> Result<Partial> {
        let operator: Operator = name.parse()?;
        Ok(self.partial(operator, value.into()))
    }

    fn partial(&self, operator: Operator, value: Value) -> Partial {
        Partial { operator, value }
    }
}

fn sequence<I, T>(values: I) -> Value
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    Value::Array(values.into_iter().map(Into::into).collect())
}

/// Parses a filter expression into criteria.
///
/// Errors:
/// - [`ScopeError::InvalidExpression`] for a non-mapping or an empty key
/// - [`ScopeError::UnknownOperator`] for an operator name outside the set
/// - [`ScopeError::Argument`] for a value whose shape doesn't fit its operator
/// - [`ScopeError::UncaughtEvaluation`] for any other closure failure
pub fn parse(expression: impl Into<Expression>) -> Result<Vec<Criterion>> {
    let expression = expression.into();
    trace!(?expression, "parsing filter expression");

    let filter = match expression {
        Expression::Empty => return Ok(Vec::new()),
        Expression::Mapping(filter) => filter,
        Expression::Json(value) => Filter::try_from(value)?,
        Expression::Closure(f) => evaluate(f.as_ref())?,
    };

    let criteria = filter.into_criteria()?;
    trace!(count = criteria.len(), "parsed criteria");
    Ok(criteria)
}

fn evaluate(f: &ExpressionFn) -> Result<Filter> {
    f(&Operators).map_err(|err| match err.downcast::<ScopeError>() {
        Ok(err) => *err,
        Err(source) => ScopeError::UncaughtEvaluation { source },
    })
}
