//! The in-memory scope family.
//!
//! [`MemoryBuilder`] retargets a [`Scope`] tree into a [`MemoryScope`]:
//! the same tree shape, with every criterion compiled once into a
//! [`Predicate`] closure. Evaluating a compiled tree against many records
//! skips the per-record operator dispatch that [`Criterion::test`] does.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::builder::ScopeBuilder;
use crate::criterion::Criterion;
use crate::operator::Operator;
use crate::record::Record;
use crate::scope::{Evaluate, Scope};
use crate::value::{compare_values, values_equal};

/// A compiled criterion: tests one record.
pub type Predicate = Arc<dyn Fn(&dyn Record) -> bool + Send + Sync>;

/// Compiles a criterion into a predicate.
///
/// The predicate agrees with [`Criterion::test`] on every record.
pub fn compile(criterion: &Criterion) -> Predicate {
    let attribute = criterion.attribute().to_string();
    let expected = criterion.value().clone();

    match criterion.operator() {
        Operator::Equal => Arc::new(move |record: &dyn Record| {
            values_equal(record.attribute_or_null(&attribute), &expected)
        }),
        Operator::NotEqual => Arc::new(move |record: &dyn Record| {
            !values_equal(record.attribute_or_null(&attribute), &expected)
        }),
        Operator::OneOf => {
            let items = into_items(expected);
            Arc::new(move |record: &dyn Record| {
                let actual = record.attribute_or_null(&attribute);
                items.iter().any(|item| values_equal(actual, item))
            })
        }
        Operator::NotOneOf => {
            let items = into_items(expected);
            Arc::new(move |record: &dyn Record| {
                let actual = record.attribute_or_null(&attribute);
                !items.iter().any(|item| values_equal(actual, item))
            })
        }
        Operator::GreaterThan => ordered(attribute, expected, |o| o == Ordering::Greater),
        Operator::GreaterThanOrEqual => ordered(attribute, expected, |o| o != Ordering::Less),
        Operator::LessThan => ordered(attribute, expected, |o| o == Ordering::Less),
        Operator::LessThanOrEqual => ordered(attribute, expected, |o| o != Ordering::Greater),
    }
}

fn into_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        // Membership criteria always carry an array.
        other => vec![other],
    }
}

fn ordered(attribute: String, expected: Value, accept: fn(Ordering) -> bool) -> Predicate {
    Arc::new(move |record: &dyn Record| {
        compare_values(record.attribute_or_null(&attribute), &expected).is_some_and(accept)
    })
}

/// A criterion paired with its compiled predicate.
#[derive(Clone)]
pub struct CompiledCriterion {
    criterion: Criterion,
    predicate: Predicate,
}

impl CompiledCriterion {
    /// Compiles `criterion`.
    pub fn new(criterion: Criterion) -> Self {
        let predicate = compile(&criterion);
        CompiledCriterion {
            criterion,
            predicate,
        }
    }

    /// Returns the source criterion.
    pub fn criterion(&self) -> &Criterion {
        &self.criterion
    }

    /// Tests a record.
    pub fn test(&self, record: &dyn Record) -> bool {
        (self.predicate)(record)
    }
}

impl fmt::Debug for CompiledCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompiledCriterion")
            .field(&self.criterion)
            .finish()
    }
}

/// A scope tree with compiled criteria.
#[derive(Debug, Clone)]
pub enum MemoryScope {
    /// Matches every record.
    All,
    /// Matches no record.
    None,
    /// No constraint; matches every record.
    Null,
    /// Matches when every criterion matches.
    Criteria(Vec<CompiledCriterion>),
    /// Matches when every child matches.
    Conjunction(Vec<MemoryScope>),
    /// Matches when any child matches.
    Disjunction(Vec<MemoryScope>),
    /// Matches when not every child matches.
    Negation(Vec<MemoryScope>),
}

impl MemoryScope {
    /// Converts back into a plain [`Scope`] with the same structure.
    pub fn to_scope(&self) -> Scope {
        let children = |scopes: &[MemoryScope]| -> Vec<Scope> {
            scopes.iter().map(MemoryScope::to_scope).collect()
        };

        match self {
            MemoryScope::All => Scope::All,
            MemoryScope::None => Scope::None,
            MemoryScope::Null => Scope::Null,
            MemoryScope::Criteria(criteria) => {
                Scope::Criteria(criteria.iter().map(|c| c.criterion.clone()).collect())
            }
            MemoryScope::Conjunction(scopes) => Scope::Conjunction(children(scopes)),
            MemoryScope::Disjunction(scopes) => Scope::Disjunction(children(scopes)),
            MemoryScope::Negation(scopes) => Scope::Negation(children(scopes)),
        }
    }

    /// Combines two compiled scopes with AND, following [`Scope::and`].
    ///
    /// Compiled leaves move into the result without recompiling.
    pub fn and(self, other: MemoryScope) -> MemoryScope {
        match (self, other) {
            (MemoryScope::Null, other) | (other, MemoryScope::Null) => other,
            (MemoryScope::All, other) | (other, MemoryScope::All) => other,
            (MemoryScope::None, _) | (_, MemoryScope::None) => MemoryScope::None,
            (MemoryScope::Conjunction(mut left), MemoryScope::Conjunction(right)) => {
                left.extend(right);
                MemoryScope::Conjunction(left)
            }
            (MemoryScope::Conjunction(mut left), other) => {
                left.push(other);
                MemoryScope::Conjunction(left)
            }
            (this, MemoryScope::Conjunction(right)) => {
                let mut children = Vec::with_capacity(right.len() + 1);
                children.push(this);
                children.extend(right);
                MemoryScope::Conjunction(children)
            }
            (this, other) => MemoryScope::Conjunction(vec![this, other]),
        }
    }

    /// Combines two compiled scopes with OR, following [`Scope::or`].
    pub fn or(self, other: MemoryScope) -> MemoryScope {
        match (self, other) {
            (MemoryScope::Null, other) | (other, MemoryScope::Null) => other,
            (MemoryScope::All, _) | (_, MemoryScope::All) => MemoryScope::All,
            (MemoryScope::None, other) | (other, MemoryScope::None) => other,
            (MemoryScope::Disjunction(mut left), MemoryScope::Disjunction(right)) => {
                left.extend(right);
                MemoryScope::Disjunction(left)
            }
            (MemoryScope::Disjunction(mut left), other) => {
                left.push(other);
                MemoryScope::Disjunction(left)
            }
            (this, MemoryScope::Disjunction(right)) => {
                let mut children = Vec::with_capacity(right.len() + 1);
                children.push(this);
                children.extend(right);
                MemoryScope::Disjunction(children)
            }
            (this, other) => MemoryScope::Disjunction(vec![this, other]),
        }
    }

    /// Returns the logical complement, following [`Scope::invert`].
    pub fn invert(self) -> MemoryScope {
        match self {
            MemoryScope::All => MemoryScope::None,
            MemoryScope::None => MemoryScope::All,
            MemoryScope::Null => MemoryScope::Null,
            leaf @ MemoryScope::Criteria(_) => MemoryScope::Negation(vec![leaf]),
            MemoryScope::Conjunction(children) => {
                MemoryScope::Disjunction(children.into_iter().map(MemoryScope::invert).collect())
            }
            MemoryScope::Disjunction(children) => {
                MemoryScope::Conjunction(children.into_iter().map(MemoryScope::invert).collect())
            }
            MemoryScope::Negation(mut children) if children.len() == 1 => children.swap_remove(0),
            MemoryScope::Negation(children) => MemoryScope::Conjunction(children),
        }
    }
}

impl Evaluate for MemoryScope {
    fn matches(&self, record: &dyn Record) -> bool {
        match self {
            MemoryScope::All | MemoryScope::Null => true,
            MemoryScope::None => false,
            MemoryScope::Criteria(criteria) => criteria.iter().all(|c| c.test(record)),
            MemoryScope::Conjunction(children) => children.iter().all(|s| s.matches(record)),
            MemoryScope::Disjunction(children) => children.iter().any(|s| s.matches(record)),
            MemoryScope::Negation(children) => !children.iter().all(|s| s.matches(record)),
        }
    }
}

impl fmt::Display for MemoryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_scope())
    }
}

/// Builds [`MemoryScope`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryBuilder;

impl ScopeBuilder for MemoryBuilder {
    type Scope = MemoryScope;

    fn all(&self) -> MemoryScope {
        MemoryScope::All
    }

    fn none(&self) -> MemoryScope {
        MemoryScope::None
    }

    fn null(&self) -> MemoryScope {
        MemoryScope::Null
    }

    fn criteria(&self, criteria: Vec<Criterion>) -> MemoryScope {
        MemoryScope::Criteria(criteria.into_iter().map(CompiledCriterion::new).collect())
    }

    fn conjunction(&self, children: Vec<MemoryScope>) -> MemoryScope {
        MemoryScope::Conjunction(children)
    }

    fn disjunction(&self, children: Vec<MemoryScope>) -> MemoryScope {
        MemoryScope::Disjunction(children)
    }

    fn negation(&self, children: Vec<MemoryScope>) -> MemoryScope {
        MemoryScope::Negation(children)
    }
}
