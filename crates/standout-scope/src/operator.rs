//! Comparison operators for criteria.
//!
//! The [`Operator`] enum is the closed set of operators a [`Criterion`]
//! can carry. Each operator has a short token (`eq`, `gte`, ...) used in
//! criterion tuples and error messages, and a method name (`equal`,
//! `greater_than_or_equal`, ...) used by the expression context.
//!
//! [`Criterion`]: crate::Criterion

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScopeError;

/// Comparison operator for a criterion.
///
/// Operators fall into two groups:
/// - **Membership**: `OneOf`, `NotOneOf` - the value is a sequence
/// - **Scalar**: `Equal`, `NotEqual`, `GreaterThan`, `GreaterThanOrEqual`,
///   `LessThan`, `LessThanOrEqual` - the value is a single value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Equal (exact match).
    #[serde(rename = "eq", alias = "equal")]
    Equal,
    /// Not equal.
    #[serde(rename = "ne", alias = "not_equal")]
    NotEqual,
    /// Attribute value is one of the given values.
    #[serde(rename = "one_of")]
    OneOf,
    /// Attribute value is none of the given values.
    #[serde(rename = "not_one_of")]
    NotOneOf,
    /// Greater than.
    #[serde(rename = "gt", alias = "greater_than")]
    GreaterThan,
    /// Greater than or equal.
    #[serde(rename = "gte", alias = "greater_than_or_equal")]
    GreaterThanOrEqual,
    /// Less than.
    #[serde(rename = "lt", alias = "less_than")]
    LessThan,
    /// Less than or equal.
    #[serde(rename = "lte", alias = "less_than_or_equal")]
    LessThanOrEqual,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: [Operator; 8] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::OneOf,
        Operator::NotOneOf,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThan,
        Operator::LessThanOrEqual,
    ];

    /// Returns `true` if this operator tests sequence membership.
    pub fn is_membership(self) -> bool {
        matches!(self, Operator::OneOf | Operator::NotOneOf)
    }

    /// Returns `true` if this operator compares by ordering.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::GreaterThan
                | Operator::GreaterThanOrEqual
                | Operator::LessThan
                | Operator::LessThanOrEqual
        )
    }

    /// Evaluates a comparison given an ordering result.
    ///
    /// Only meaningful for the comparison operators; membership operators
    /// always yield `false`.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Operator::Equal => ordering == Ordering::Equal,
            Operator::NotEqual => ordering != Ordering::Equal,
            Operator::GreaterThan => ordering == Ordering::Greater,
            Operator::GreaterThanOrEqual => ordering != Ordering::Less,
            Operator::LessThan => ordering == Ordering::Less,
            Operator::LessThanOrEqual => ordering != Ordering::Greater,
            Operator::OneOf | Operator::NotOneOf => false,
        }
    }

    /// Returns the short token of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "eq",
            Operator::NotEqual => "ne",
            Operator::OneOf => "one_of",
            Operator::NotOneOf => "not_one_of",
            Operator::GreaterThan => "gt",
            Operator::GreaterThanOrEqual => "gte",
            Operator::LessThan => "lt",
            Operator::LessThanOrEqual => "lte",
        }
    }

    /// Returns the name of the expression-context method for this operator.
    pub fn method_name(self) -> &'static str {
        match self {
            Operator::Equal => "equal",
            Operator::NotEqual => "not_equal",
            Operator::OneOf => "one_of",
            Operator::NotOneOf => "not_one_of",
            Operator::GreaterThan => "greater_than",
            Operator::GreaterThanOrEqual => "greater_than_or_equal",
            Operator::LessThan => "less_than",
            Operator::LessThanOrEqual => "less_than_or_equal",
        }
    }

    /// Ranks the valid operator names by edit distance to `name`.
    ///
    /// Returns the names within `max(2, len / 3)` edits, closest first.
    /// When nothing is that close, every token is returned so the caller
    /// still sees the valid set.
    pub fn suggestions(name: &str) -> Vec<String> {
        let threshold = (name.chars().count() / 3).max(2);

        let mut ranked: Vec<(usize, usize, &'static str)> = Operator::ALL
            .iter()
            .enumerate()
            .filter_map(|(index, op)| {
                let by_token = (edit_distance(name, op.as_str()), op.as_str());
                let by_method = (edit_distance(name, op.method_name()), op.method_name());
                let (distance, candidate) = if by_method.0 < by_token.0 {
                    by_method
                } else {
                    by_token
                };
                (distance <= threshold).then_some((distance, index, candidate))
            })
            .collect();

        if ranked.is_empty() {
            return Operator::ALL.iter().map(|op| op.as_str().to_string()).collect();
        }

        ranked.sort_unstable();
        ranked
            .into_iter()
            .map(|(_, _, candidate)| candidate.to_string())
            .collect()
    }
}

impl FromStr for Operator {
    type Err = ScopeError;

    /// Parses either the short token or the method name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == s || op.method_name() == s)
            .ok_or_else(|| {
                let suggestions = Operator::suggestions(s);
                tracing::debug!(operator = s, ?suggestions, "unknown operator");
                ScopeError::UnknownOperator {
                    name: s.to_string(),
                    suggestions,
                }
            })
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Levenshtein distance over chars.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
