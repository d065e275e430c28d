//! Scope builders.
//!
//! A [`ScopeBuilder`] is a family of scope constructors. Every family
//! provides the same seven primitives, and the trait derives the rest:
//! building from expressions, validated construction of containers, and
//! retargeting a [`Scope`] tree into the family.
//!
//! Two families ship with the crate: [`GenericBuilder`] builds plain
//! [`Scope`] trees, and [`MemoryBuilder`](crate::MemoryBuilder) compiles
//! them into predicate trees for repeated in-memory evaluation.

use serde_json::Value;
use tracing::trace;

use crate::criterion::Criterion;
use crate::error::{Result, ScopeError};
use crate::parser::{parse, Expression, Filter};
use crate::scope::Scope;

/// Anything a builder can build from: an expression or an existing scope.
#[derive(Debug)]
pub enum Input {
    /// A filter expression to parse.
    Expression(Expression),
    /// A scope to retarget.
    Scope(Scope),
}

impl From<Expression> for Input {
    fn from(expression: Expression) -> Self {
        Input::Expression(expression)
    }
}

impl From<Filter> for Input {
    fn from(filter: Filter) -> Self {
        Input::Expression(filter.into())
    }
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Input::Expression(value.into())
    }
}

impl From<()> for Input {
    fn from(_: ()) -> Self {
        Input::Expression(Expression::Empty)
    }
}

impl From<Scope> for Input {
    fn from(scope: Scope) -> Self {
        Input::Scope(scope)
    }
}

impl From<Criterion> for Input {
    fn from(criterion: Criterion) -> Self {
        Input::Scope(criterion.into())
    }
}

/// A family of scope constructors.
pub trait ScopeBuilder {
    /// The scope type this family produces.
    type Scope;

    /// Matches everything.
    fn all(&self) -> Self::Scope;

    /// Matches nothing.
    fn none(&self) -> Self::Scope;

    /// No constraint.
    fn null(&self) -> Self::Scope;

    /// AND of criteria.
    fn criteria(&self, criteria: Vec<Criterion>) -> Self::Scope;

    /// AND of child scopes.
    fn conjunction(&self, children: Vec<Self::Scope>) -> Self::Scope;

    /// OR of child scopes.
    fn disjunction(&self, children: Vec<Self::Scope>) -> Self::Scope;

    /// NAND of child scopes.
    fn negation(&self, children: Vec<Self::Scope>) -> Self::Scope;

    /// Takes `scope` over unchanged when it already belongs to this family.
    ///
    /// Hands the scope back otherwise, and [`transform`](Self::transform)
    /// rebuilds it node by node.
    fn adopt(&self, scope: Scope) -> std::result::Result<Self::Scope, Scope> {
        Err(scope)
    }

    /// Rebuilds a scope tree in this family, preserving its structure.
    fn transform(&self, scope: Scope) -> Self::Scope {
        let scope = match self.adopt(scope) {
            Ok(adopted) => return adopted,
            Err(scope) => scope,
        };

        match scope {
            Scope::All => self.all(),
            Scope::None => self.none(),
            Scope::Null => self.null(),
            Scope::Criteria(criteria) => self.criteria(criteria),
            Scope::Conjunction(children) => self.conjunction(self.transform_all(children)),
            Scope::Disjunction(children) => self.disjunction(self.transform_all(children)),
            Scope::Negation(children) => self.negation(self.transform_all(children)),
        }
    }

    /// Transforms each scope in turn.
    fn transform_all(&self, scopes: Vec<Scope>) -> Vec<Self::Scope> {
        scopes.into_iter().map(|s| self.transform(s)).collect()
    }

    /// Builds a scope from an expression, or retargets an existing scope.
    ///
    /// An expression that yields no criteria builds a null scope.
    fn build(&self, input: impl Into<Input>) -> Result<Self::Scope> {
        match input.into() {
            Input::Scope(scope) => Ok(self.transform(scope)),
            Input::Expression(expression) => {
                let criteria = parse(expression)?;
                trace!(count = criteria.len(), "building scope from criteria");
                if criteria.is_empty() {
                    Ok(self.null())
                } else {
                    self.build_criteria(criteria)
                }
            }
        }
    }

    /// Builds a criteria scope; the list must not be empty.
    fn build_criteria(&self, criteria: Vec<Criterion>) -> Result<Self::Scope> {
        if criteria.is_empty() {
            return Err(ScopeError::Argument(
                "a criteria scope needs at least one criterion".to_string(),
            ));
        }
        Ok(self.criteria(criteria))
    }

    /// Builds a conjunction of `scopes`.
    ///
    /// With `safe` set, every child is validated first.
    fn build_conjunction(&self, scopes: Vec<Scope>, safe: bool) -> Result<Self::Scope> {
        Ok(self.conjunction(self.prepare(scopes, safe)?))
    }

    /// Builds a disjunction of `scopes`.
    ///
    /// With `safe` set, every child is validated first.
    fn build_disjunction(&self, scopes: Vec<Scope>, safe: bool) -> Result<Self::Scope> {
        Ok(self.disjunction(self.prepare(scopes, safe)?))
    }

    /// Builds a negation of `scopes`.
    ///
    /// With `safe` set, every child is validated first.
    fn build_negation(&self, scopes: Vec<Scope>, safe: bool) -> Result<Self::Scope> {
        Ok(self.negation(self.prepare(scopes, safe)?))
    }

    #[doc(hidden)]
    fn prepare(&self, scopes: Vec<Scope>, safe: bool) -> Result<Vec<Self::Scope>> {
        if safe {
            scopes.iter().try_for_each(validate)?;
        }
        Ok(self.transform_all(scopes))
    }
}

/// Checks that a scope tree is well formed.
///
/// Every criteria leaf must hold at least one criterion.
pub fn validate(scope: &Scope) -> Result<()> {
    match scope {
        Scope::Criteria(criteria) if criteria.is_empty() => Err(ScopeError::Argument(
            "a criteria scope needs at least one criterion".to_string(),
        )),
        other => other.children().iter().try_for_each(validate),
    }
}

/// Builds plain [`Scope`] trees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenericBuilder;

impl ScopeBuilder for GenericBuilder {
    type Scope = Scope;

    fn all(&self) -> Scope {
        Scope::All
    }

    fn none(&self) -> Scope {
        Scope::None
    }

    fn null(&self) -> Scope {
        Scope::Null
    }

    fn criteria(&self, criteria: Vec<Criterion>) -> Scope {
        Scope::Criteria(criteria)
    }

    fn conjunction(&self, children: Vec<Scope>) -> Scope {
        Scope::Conjunction(children)
    }

    fn disjunction(&self, children: Vec<Scope>) -> Scope {
        Scope::Disjunction(children)
    }

    fn negation(&self, children: Vec<Scope>) -> Scope {
        Scope::Negation(children)
    }

    fn adopt(&self, scope: Scope) -> std::result::Result<Scope, Scope> {
        Ok(scope)
    }
}
