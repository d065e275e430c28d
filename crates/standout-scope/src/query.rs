//! Query builder and executor.
//!
//! A [`Query`] couples a [`Scope`] with ordering and pagination, and
//! evaluates it against a borrowed slice of records. Evaluation always runs
//! in the same order:
//!
//! ```text
//! scope filter → stable multi-key sort → offset → limit
//! ```
//!
//! Queries are values: every mutator returns a new query and leaves the
//! receiver untouched. The compiled scope and the evaluated results are
//! memoized per instance.

use std::fmt;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::builder::{Input, ScopeBuilder};
use crate::compile::MemoryBuilder;
use crate::error::Result;
use crate::ordering::{compare_by_orderings, Dir, OrderBy};
use crate::record::Record;
use crate::scope::{Evaluate, Scope};

/// A query over a slice of records.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use standout_scope::{Dir, Expression, Filter, Query};
///
/// let books = vec![
///     json!({"title": "C", "year": 2004}),
///     json!({"title": "A", "year": 1999}),
///     json!({"title": "B", "year": 2001}),
/// ];
///
/// let query = Query::new(&books)
///     .filter(Expression::closure(|ops| {
///         Ok(Filter::new().with("year", ops.greater_than(2000)))
///     }))
///     .unwrap()
///     .order_by("title", Dir::Asc)
///     .limit(1);
///
/// assert_eq!(query.to_vec(), vec![&books[2]]);
/// assert!(query.exists());
/// ```
pub struct Query<'a, R, B = MemoryBuilder>
where
    B: ScopeBuilder,
{
    records: &'a [R],
    builder: B,
    scope: Scope,
    orderings: Vec<OrderBy>,
    limit: Option<usize>,
    offset: Option<usize>,
    compiled: OnceCell<B::Scope>,
    results: OnceCell<Vec<&'a R>>,
}

impl<'a, R: Record> Query<'a, R> {
    /// Creates a query over `records` that matches everything.
    pub fn new(records: &'a [R]) -> Self {
        Query::with_builder(records, MemoryBuilder)
    }
}

impl<'a, R, B> Query<'a, R, B>
where
    R: Record,
    B: ScopeBuilder + Clone,
    B::Scope: Evaluate,
{
    /// Creates a query that evaluates through the given scope family.
    pub fn with_builder(records: &'a [R], builder: B) -> Self {
        Query {
            records,
            builder,
            scope: Scope::Null,
            orderings: Vec::new(),
            limit: None,
            offset: None,
            compiled: OnceCell::new(),
            results: OnceCell::new(),
        }
    }

    fn derive(&self, scope: Scope) -> Self {
        Query {
            records: self.records,
            builder: self.builder.clone(),
            scope,
            orderings: self.orderings.clone(),
            limit: self.limit,
            offset: self.offset,
            compiled: OnceCell::new(),
            results: OnceCell::new(),
        }
    }

    // ========================================================================
    // Filtering
    // ========================================================================

    /// Narrows the query to records matching `input` as well.
    #[doc(alias = "where")]
    pub fn filter(&self, input: impl Into<Input>) -> Result<Self> {
        let scope = Scope::build(input)?;
        Ok(self.derive(self.scope.clone().and(scope)))
    }

    /// Widens the query to records matching `input` as well.
    pub fn or_filter(&self, input: impl Into<Input>) -> Result<Self> {
        let scope = Scope::build(input)?;
        Ok(self.derive(self.scope.clone().or(scope)))
    }

    /// Narrows the query to records that do not match `input`.
    pub fn exclude(&self, input: impl Into<Input>) -> Result<Self> {
        Ok(self.derive(self.scope.clone().not(input)?))
    }

    /// Narrows the query by an already built scope.
    pub fn scope(&self, scope: Scope) -> Self {
        self.derive(self.scope.clone().and(scope))
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Replaces the ordering clauses.
    ///
    /// A field listed twice keeps its first position and its last direction.
    pub fn order<I, O>(&self, orderings: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<OrderBy>,
    {
        let mut query = self.derive(self.scope.clone());
        query.orderings.clear();
        for order_by in orderings {
            upsert_ordering(&mut query.orderings, order_by.into());
        }
        query
    }

    /// Appends an ordering clause.
    ///
    /// Ordering by a field that is already ordered changes that clause's
    /// direction in place.
    pub fn order_by(&self, field: &str, dir: Dir) -> Self {
        let mut query = self.derive(self.scope.clone());
        upsert_ordering(&mut query.orderings, OrderBy::new(field, dir));
        query
    }

    /// Appends an ascending ordering clause.
    pub fn order_asc(&self, field: &str) -> Self {
        self.order_by(field, Dir::Asc)
    }

    /// Appends a descending ordering clause.
    pub fn order_desc(&self, field: &str) -> Self {
        self.order_by(field, Dir::Desc)
    }

    // ========================================================================
    // Limits
    // ========================================================================

    /// Sets the maximum number of results to return.
    pub fn limit(&self, n: usize) -> Self {
        let mut query = self.derive(self.scope.clone());
        query.limit = Some(n);
        query
    }

    /// Sets the number of results to skip.
    pub fn offset(&self, n: usize) -> Self {
        let mut query = self.derive(self.scope.clone());
        query.offset = Some(n);
        query
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Returns the scope.
    pub fn get_scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns the ordering clauses.
    pub fn orderings(&self) -> &[OrderBy] {
        &self.orderings
    }

    /// Returns the limit, if set.
    pub fn get_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns the offset, if set.
    pub fn get_offset(&self) -> Option<usize> {
        self.offset
    }

    /// Returns the records this query runs over.
    pub fn records(&self) -> &'a [R] {
        self.records
    }

    // ========================================================================
    // Execution
    // ========================================================================

    fn compiled(&self) -> &B::Scope {
        self.compiled
            .get_or_init(|| self.builder.transform(self.scope.clone()))
    }

    /// Tests if a single record matches this query's scope.
    pub fn matches(&self, record: &R) -> bool {
        self.compiled().matches(record)
    }

    fn evaluate(&self) -> Vec<&'a R> {
        let scope = self.compiled();
        let mut results: Vec<&'a R> = self
            .records
            .iter()
            .filter(|record| scope.matches(*record))
            .collect();
        let matched = results.len();

        if !self.orderings.is_empty() {
            results.sort_by(|a, b| compare_by_orderings(*a, *b, &self.orderings));
        }

        let results = paginate(results, self.offset, self.limit);
        debug!(
            records = self.records.len(),
            matched,
            returned = results.len(),
            scope = %self.scope,
            "evaluated query"
        );
        results
    }

    /// Iterates over the results.
    ///
    /// Unordered queries stream lazily; ordered queries sort first. Every
    /// call runs the pipeline again.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &'a R> + '_> {
        if !self.orderings.is_empty() {
            return Box::new(self.evaluate().into_iter());
        }

        let scope = self.compiled();
        let offset = self.offset.unwrap_or(0);
        let limit = self.limit.unwrap_or(usize::MAX);
        Box::new(
            self.records
                .iter()
                .filter(move |record| scope.matches(*record))
                .skip(offset)
                .take(limit),
        )
    }

    /// Returns the results, evaluating once per query instance.
    pub fn to_vec(&self) -> Vec<&'a R> {
        self.results.get_or_init(|| self.evaluate()).clone()
    }

    /// Returns `true` if any record matches the scope.
    ///
    /// Ordering and pagination are ignored; stops at the first match.
    pub fn exists(&self) -> bool {
        let scope = self.compiled();
        self.records.iter().any(|record| scope.matches(record))
    }

    /// Counts the results, after pagination.
    pub fn count(&self) -> usize {
        self.results.get_or_init(|| self.evaluate()).len()
    }

    /// Returns the first result.
    pub fn first(&self) -> Option<&'a R> {
        match self.results.get() {
            Some(results) => results.first().copied(),
            None => self.iter().next(),
        }
    }
}

fn upsert_ordering(orderings: &mut Vec<OrderBy>, order_by: OrderBy) {
    match orderings.iter_mut().find(|o| o.field == order_by.field) {
        Some(existing) => existing.dir = order_by.dir,
        None => orderings.push(order_by),
    }
}

fn paginate<T>(mut items: Vec<T>, offset: Option<usize>, limit: Option<usize>) -> Vec<T> {
    let offset = offset.unwrap_or(0);
    if offset > 0 {
        if offset >= items.len() {
            return Vec::new();
        }
        items.drain(..offset);
    }

    if let Some(limit) = limit {
        items.truncate(limit);
    }

    items
}

impl<'a, R, B> fmt::Debug for Query<'a, R, B>
where
    B: ScopeBuilder,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("records", &self.records.len())
            .field("scope", &self.scope)
            .field("orderings", &self.orderings)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish()
    }
}
