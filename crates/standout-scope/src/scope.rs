//! Scopes: composable filter trees.
//!
//! A [`Scope`] is an immutable tree of filter predicates. Leaves are
//! lists of [`Criterion`]s or one of the three constants ([`Scope::All`],
//! [`Scope::None`], [`Scope::Null`]); inner nodes combine children with
//! AND, OR, or NAND.
//!
//! Composition never mutates: [`Scope::and`], [`Scope::or`] and
//! [`Scope::invert`] take their operands by value and return a new tree,
//! normalized by the usual boolean identities:
//!
//! ```text
//! Null ∧ X = X       All ∧ X = X       None ∧ X = None
//! Null ∨ X = X       All ∨ X = All     None ∨ X = X
//! ¬(A ∧ B) = ¬A ∨ ¬B                   ¬(A ∨ B) = ¬A ∧ ¬B
//! ```
//!
//! Nested conjunctions (and disjunctions) are flattened as they are built,
//! so `(A ∧ B) ∧ (C ∧ D)` is a single four-child conjunction.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use standout_scope::{Expression, Filter, Scope};
//!
//! let by_author = Scope::build(json!({"author": "X"})).unwrap();
//! let recent = Scope::build(Expression::closure(|ops| {
//!     Ok(Filter::new().with("year", ops.greater_than(2000)))
//! }))
//! .unwrap();
//!
//! let scope = by_author.and(recent);
//! let books = vec![
//!     json!({"author": "X", "year": 1999}),
//!     json!({"author": "X", "year": 2001}),
//! ];
//!
//! let matched = scope.filter(&books);
//! assert_eq!(matched, vec![&books[1]]);
//! ```

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use crate::builder::{GenericBuilder, Input, ScopeBuilder};
use crate::criterion::Criterion;
use crate::error::Result;
use crate::record::Record;

/// A composable, immutable filter-predicate tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Scope {
    /// Matches every record.
    All,
    /// Matches no record.
    None,
    /// No constraint configured yet. Matches every record, and vanishes
    /// when composed with anything else.
    #[default]
    Null,
    /// Matches when every criterion matches.
    Criteria(Vec<Criterion>),
    /// Matches when every child matches.
    Conjunction(Vec<Scope>),
    /// Matches when any child matches. Empty matches nothing.
    Disjunction(Vec<Scope>),
    /// Matches when not every child matches (NAND).
    Negation(Vec<Scope>),
}

impl Scope {
    /// Builds a scope from an expression or an existing scope, using the
    /// [`GenericBuilder`].
    pub fn build(input: impl Into<Input>) -> Result<Scope> {
        GenericBuilder.build(input)
    }

    /// Returns `true` for [`Scope::All`].
    pub fn is_all(&self) -> bool {
        matches!(self, Scope::All)
    }

    /// Returns `true` for [`Scope::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Scope::None)
    }

    /// Returns `true` for [`Scope::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Scope::Null)
    }

    /// Returns the direct children of a container scope.
    pub fn children(&self) -> &[Scope] {
        match self {
            Scope::Conjunction(children)
            | Scope::Disjunction(children)
            | Scope::Negation(children) => children,
            _ => &[],
        }
    }

    /// Returns every criterion in the tree, depth first.
    pub fn criteria(&self) -> impl Iterator<Item = &Criterion> + '_ {
        let mut out = Vec::new();
        self.collect_criteria(&mut out);
        out.into_iter()
    }

    fn collect_criteria<'s>(&'s self, out: &mut Vec<&'s Criterion>) {
        match self {
            Scope::Criteria(criteria) => out.extend(criteria.iter()),
            other => {
                for child in other.children() {
                    child.collect_criteria(out);
                }
            }
        }
    }

    /// Combines two scopes with AND.
    pub fn and(self, other: Scope) -> Scope {
        match (self, other) {
            (Scope::Null, other) | (other, Scope::Null) => other,
            (Scope::All, other) | (other, Scope::All) => other,
            (Scope::None, _) | (_, Scope::None) => Scope::None,
            (Scope::Conjunction(mut left), Scope::Conjunction(right)) => {
                left.extend(right);
                Scope::Conjunction(left)
            }
            (Scope::Conjunction(mut left), other) => {
                left.push(other);
                Scope::Conjunction(left)
            }
            (this, Scope::Conjunction(right)) => {
                let mut children = Vec::with_capacity(right.len() + 1);
                children.push(this);
                children.extend(right);
                Scope::Conjunction(children)
            }
            (this, other) => Scope::Conjunction(vec![this, other]),
        }
    }

    /// Combines two scopes with OR.
    pub fn or(self, other: Scope) -> Scope {
        match (self, other) {
            (Scope::Null, other) | (other, Scope::Null) => other,
            (Scope::All, _) | (_, Scope::All) => Scope::All,
            (Scope::None, other) | (other, Scope::None) => other,
            (Scope::Disjunction(mut left), Scope::Disjunction(right)) => {
                left.extend(right);
                Scope::Disjunction(left)
            }
            (Scope::Disjunction(mut left), other) => {
                left.push(other);
                Scope::Disjunction(left)
            }
            (this, Scope::Disjunction(right)) => {
                let mut children = Vec::with_capacity(right.len() + 1);
                children.push(this);
                children.extend(right);
                Scope::Disjunction(children)
            }
            (this, other) => Scope::Disjunction(vec![this, other]),
        }
    }

    /// Narrows this scope to records that do *not* match `input`.
    ///
    /// Equivalent to `self.and(Scope::build(input)?.invert())`.
    pub fn not(self, input: impl Into<Input>) -> Result<Scope> {
        Ok(self.and(Scope::build(input)?.invert()))
    }

    /// Returns the logical complement of this scope.
    ///
    /// Containers are pushed through De Morgan's laws; a criteria leaf is
    /// wrapped in a [`Scope::Negation`], and inverting a negation unwraps
    /// it again. `Null` stays `Null`: there is no constraint to invert.
    pub fn invert(self) -> Scope {
        match self {
            Scope::All => Scope::None,
            Scope::None => Scope::All,
            Scope::Null => Scope::Null,
            leaf @ Scope::Criteria(_) => Scope::Negation(vec![leaf]),
            Scope::Conjunction(children) => {
                Scope::Disjunction(children.into_iter().map(Scope::invert).collect())
            }
            Scope::Disjunction(children) => {
                Scope::Conjunction(children.into_iter().map(Scope::invert).collect())
            }
            Scope::Negation(mut children) if children.len() == 1 => children.swap_remove(0),
            Scope::Negation(children) => Scope::Conjunction(children),
        }
    }

    /// Tests whether a record matches this scope.
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        match self {
            Scope::All | Scope::Null => true,
            Scope::None => false,
            Scope::Criteria(criteria) => criteria.iter().all(|c| c.test(record)),
            Scope::Conjunction(children) => children.iter().all(|s| s.matches(record)),
            Scope::Disjunction(children) => children.iter().any(|s| s.matches(record)),
            Scope::Negation(children) => !children.iter().all(|s| s.matches(record)),
        }
    }

    /// Returns the records matching this scope, in their original order.
    pub fn filter<'r, R: Record>(&self, records: &'r [R]) -> Vec<&'r R> {
        records.iter().filter(|r| self.matches(*r)).collect()
    }
}

/// A scope family that can be evaluated against records.
///
/// Every family must agree with [`Scope::matches`] on every record.
pub trait Evaluate {
    /// Tests whether a record matches.
    fn matches(&self, record: &dyn Record) -> bool;

    /// Returns the records that match, in their original order.
    fn filter<'r, R: Record>(&self, records: &'r [R]) -> Vec<&'r R>
    where
        Self: Sized,
    {
        records
            .iter()
            .filter(|r| Evaluate::matches(self, *r))
            .collect()
    }
}

impl Evaluate for Scope {
    fn matches(&self, record: &dyn Record) -> bool {
        Scope::matches(self, record)
    }
}

impl From<Criterion> for Scope {
    fn from(criterion: Criterion) -> Self {
        Scope::Criteria(vec![criterion])
    }
}

impl BitAnd for Scope {
    type Output = Scope;

    fn bitand(self, rhs: Scope) -> Scope {
        self.and(rhs)
    }
}

impl BitOr for Scope {
    type Output = Scope;

    fn bitor(self, rhs: Scope) -> Scope {
        self.or(rhs)
    }
}

impl Not for Scope {
    type Output = Scope;

    fn not(self) -> Scope {
        self.invert()
    }
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    separator: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => f.write_str("TRUE"),
            Scope::None => f.write_str("FALSE"),
            Scope::Null => f.write_str("NULL"),
            Scope::Criteria(criteria) if criteria.len() == 1 => write!(f, "{}", criteria[0]),
            Scope::Criteria(criteria) => {
                f.write_str("(")?;
                write_joined(f, criteria, " AND ")?;
                f.write_str(")")
            }
            Scope::Conjunction(children) if children.is_empty() => f.write_str("TRUE"),
            Scope::Conjunction(children) => {
                f.write_str("(")?;
                write_joined(f, children, " AND ")?;
                f.write_str(")")
            }
            Scope::Disjunction(children) if children.is_empty() => f.write_str("FALSE"),
            Scope::Disjunction(children) => {
                f.write_str("(")?;
                write_joined(f, children, " OR ")?;
                f.write_str(")")
            }
            Scope::Negation(children) if children.len() == 1 => write!(f, "NOT {}", children[0]),
            Scope::Negation(children) => {
                f.write_str("NOT (")?;
                write_joined(f, children, " AND ")?;
                f.write_str(")")
            }
        }
    }
}
