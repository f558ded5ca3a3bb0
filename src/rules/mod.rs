//! Rule tables (spec §4.H): the three immutable, ordered lists the
//! simplifier tries against every node.
//!
//! Each list is built once, lazily, behind a `OnceLock`, and never mutated
//! afterwards — matching the teacher's `meta/src/shared/legalize.rs`
//! transform-group organization (`narrow`/`widen`/`expand` there becomes
//! `universal`/`joins`/`boolean` here), just evaluated against a live
//! expression DAG at runtime instead of compiled to Rust source by a build
//! script. Ordering within a list is preference order: `Simplifier` tries
//! rules top-to-bottom and accepts the first whose translated, recursively
//! simplified candidate strictly reduces complexity.

mod boolean;
mod joins;
mod universal;

use std::sync::OnceLock;

use crate::directive::Directive;

/// A single rewrite rule: `from` matches a subject, `to` is translated
/// under the resulting bindings, and an optional `condition` must reduce
/// to a true constant (under the same bindings) for the rule to fire.
#[derive(Debug, Clone)]
pub struct Rule {
    /// The pattern a subject must structurally match for this rule to apply.
    pub from: Directive,
    /// The replacement, translated under the bindings `from` produced.
    pub to: Directive,
    /// An optional extra directive that must evaluate to a true constant
    /// (under the same bindings) before the rule is accepted.
    pub condition: Option<Directive>,
}

impl Rule {
    /// An unconditional rewrite rule.
    pub fn new(from: Directive, to: Directive) -> Self {
        Rule { from, to, condition: None }
    }

    /// A rewrite rule that only fires when `condition` holds.
    pub fn guarded(from: Directive, to: Directive, condition: Directive) -> Self {
        Rule { from, to, condition: Some(condition) }
    }
}

/// Universal simplifiers: identity laws, double-negation, and
/// width-preserving normalizations that apply regardless of operator
/// category (spec §4.H).
pub fn universal() -> &'static [Rule] {
    static TABLE: OnceLock<Vec<Rule>> = OnceLock::new();
    TABLE.get_or_init(universal::build)
}

/// Join descriptors: rules combining two already-simplified subexpressions
/// across an outer operator, applied under the simplifier's bounded
/// join-depth counter (spec §4.H, §4.I step 7).
pub fn joins() -> &'static [Rule] {
    static TABLE: OnceLock<Vec<Rule>> = OnceLock::new();
    TABLE.get_or_init(joins::build)
}

/// Boolean-specific simplifiers: comparisons and logical operators (spec
/// §4.H).
pub fn boolean() -> &'static [Rule] {
    static TABLE: OnceLock<Vec<Rule>> = OnceLock::new();
    TABLE.get_or_init(boolean::build)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_non_empty_and_stable() {
        assert!(!universal().is_empty());
        assert!(!joins().is_empty());
        assert!(!boolean().is_empty());
        let a = universal() as *const _;
        let b = universal() as *const _;
        assert_eq!(a, b, "table must be built once and reused");
    }
}
