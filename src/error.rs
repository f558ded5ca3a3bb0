//! Typed failure results for the fallible corners of the symbolic engine.
//!
//! Most of the engine recovers from these internally (see each call site);
//! `SymExError` exists so that the handful of genuinely-fallible leaf
//! operations (expression construction, evaluation, binding, translation)
//! have something other than a panic to report. Nothing in this crate lets
//! one of these escape out of the simplifier or the rewrite pass — see
//! `simplify.rs` and `pass.rs` for where each variant is caught and turned
//! into "leave the input unchanged".

use failure_derive::Fail;

/// A typed error produced by a fallible operation in the symbolic engine.
#[derive(Debug, Fail, Clone, PartialEq, Eq)]
pub enum SymExError {
    /// Malformed expression construction: a binary operator is missing a
    /// child, or a non-leaf node was given the `Invalid` operator.
    #[fail(display = "structural error: {}", _0)]
    Structural(String),

    /// A directive could not be unified with the subject expression. Not a
    /// hard error in the usual sense, just the matcher's negative outcome.
    #[fail(display = "no match")]
    MatchFailure,

    /// A symbol table rejected a binding: either the match-variable's kind
    /// rejects the candidate expression, or it is already bound to a
    /// structurally different expression.
    #[fail(display = "binding conflict for {}", _0)]
    BindingConflict(String),

    /// `evaluate()` was called on a tree that still contains variables, or
    /// on an operator outside the evaluable set.
    #[fail(display = "evaluation unavailable: {}", _0)]
    EvaluationUnavailable(String),

    /// A bounded resource was exhausted: join-recursion depth, constant
    /// magnitude safety cap, or (reported, not raised, since eviction is
    /// silent) simplifier cache capacity.
    #[fail(display = "capacity exceeded: {}", _0)]
    CapacityExceeded(String),
}

/// Convenience alias, mirroring the teacher's `CodegenResult<T>`.
pub type SymExResult<T> = Result<T, SymExError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_stable() {
        assert_eq!(
            format!("{}", SymExError::MatchFailure),
            "no match".to_string()
        );
        assert_eq!(
            format!("{}", SymExError::Structural("missing rhs".into())),
            "structural error: missing rhs".to_string()
        );
    }
}
