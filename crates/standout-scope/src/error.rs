//! Error types for the scope crate.

use thiserror::Error;

/// Boxed error returned by expression closures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur when parsing expressions or building scopes.
///
/// Every error is deterministic: the engine performs no I/O, so the same
/// input always fails the same way.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// The expression was not shaped like a filter mapping.
    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    /// An operator name outside the fixed operator set.
    #[error("unknown operator '{name}'{}", did_you_mean(.suggestions))]
    UnknownOperator {
        name: String,
        suggestions: Vec<String>,
    },

    /// An expression closure failed with an error of its own.
    #[error("expression closure failed: {source}")]
    UncaughtEvaluation {
        #[source]
        source: BoxError,
    },

    /// A structural violation: malformed criterion, empty criteria list.
    #[error("invalid argument: {0}")]
    Argument(String),
}

impl ScopeError {
    /// Returns the suggestion list of an `UnknownOperator` error.
    pub fn suggestions(&self) -> &[String] {
        match self {
            ScopeError::UnknownOperator { suggestions, .. } => suggestions,
            _ => &[],
        }
    }
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

/// Result type for scope operations.
pub type Result<T> = std::result::Result<T, ScopeError>;
