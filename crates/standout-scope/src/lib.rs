//! Scope - composable filter scopes and in-memory query evaluation.
//!
//! Scope provides a backend-agnostic representation of filter predicates
//! that can be combined with AND, OR and NOT, normalized by boolean-algebra
//! identities, and evaluated against in-memory records. It supports:
//!
//! - Declarative filter expressions: mappings, JSON objects, or closures
//!   over an operator context
//! - A closed set of scope variants with consistent composition rules
//! - Builder families that retarget scope trees onto evaluation backends
//! - Queries with multi-key ordering, limit and offset
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use standout_scope::{Dir, Expression, Filter, Query};
//!
//! let books = vec![
//!     json!({"title": "A", "author": "X", "year": 1999}),
//!     json!({"title": "B", "author": "X", "year": 2001}),
//!     json!({"title": "C", "author": "Y", "year": 2004}),
//! ];
//!
//! let query = Query::new(&books)
//!     .filter(json!({"author": "X"}))
//!     .unwrap()
//!     .or_filter(Expression::closure(|ops| {
//!         Ok(Filter::new().with("year", ops.greater_than_or_equal(2004)))
//!     }))
//!     .unwrap()
//!     .order_by("year", Dir::Desc);
//!
//! let titles: Vec<_> = query.iter().map(|b| b["title"].clone()).collect();
//! assert_eq!(titles, [json!("C"), json!("B"), json!("A")]);
//! ```
//!
//! # Composition Rules
//!
//! ```text
//! Null ∧ X = X       All ∧ X = X       None ∧ X = None
//! Null ∨ X = X       All ∨ X = All     None ∨ X = X
//! ¬All = None        ¬None = All       ¬Null = Null
//! ¬(A ∧ B) = ¬A ∨ ¬B                   ¬(A ∨ B) = ¬A ∧ ¬B
//! ```
//!
//! # Operators
//!
//! | Token | Method | Matches when the attribute |
//! |-------|--------|----------------------------|
//! | `eq` | `equal` | equals the value |
//! | `ne` | `not_equal` | differs from the value |
//! | `one_of` | `one_of` | is in the array |
//! | `not_one_of` | `not_one_of` | is not in the array |
//! | `gt` | `greater_than` | sorts after the value |
//! | `gte` | `greater_than_or_equal` | sorts after or equal |
//! | `lt` | `less_than` | sorts before the value |
//! | `lte` | `less_than_or_equal` | sorts before or equal |
//!
//! A missing attribute reads as `null`. Ordering operators never match
//! values of different kinds.

mod builder;
mod compile;
mod criterion;
mod error;
mod operator;
mod ordering;
mod parser;
mod query;
mod record;
mod scope;
mod value;

// Re-export public API
pub use builder::{validate, GenericBuilder, Input, ScopeBuilder};
pub use compile::{compile, CompiledCriterion, MemoryBuilder, MemoryScope, Predicate};
pub use criterion::Criterion;
pub use error::{BoxError, Result, ScopeError};
pub use operator::Operator;
pub use ordering::{compare_by_orderings, compare_for_sort, Dir, OrderBy};
pub use parser::{parse, EvalResult, Expression, Filter, Operators, Partial, Term};
pub use query::Query;
pub use record::Record;
pub use scope::{Evaluate, Scope};
pub use value::{compare_values, values_equal, Number};
