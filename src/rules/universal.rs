//! Universal simplifiers (spec §4.H): identity laws, double-negation, and
//! annihilators that apply to every operator category. Every rule here
//! strictly reduces complexity whenever it fires — the capture on both
//! sides of an idempotence rule (`And(A, A)`) is enforced for free by
//! `SymbolTable::add` rejecting an inconsistent rebind, not by anything
//! written here.

use crate::directive::Directive;
use crate::operator::Operator;

use super::Rule;

pub(super) fn build() -> Vec<Rule> {
    let a = || Directive::any("A");
    let b = || Directive::any("B");

    vec![
        // Additive identity: x + 0 = x. `Add` is commutative, so the
        // matcher already tries the swapped child order; one rule covers
        // both `x + 0` and `0 + x`.
        Rule::new(
            Directive::binary(Operator::Add, a(), Directive::literal(0)),
            a(),
        ),
        Rule::new(
            Directive::binary(Operator::Sub, a(), Directive::literal(0)),
            a(),
        ),
        // Multiplicative identity and annihilator.
        Rule::new(
            Directive::binary(Operator::Mul, a(), Directive::literal(1)),
            a(),
        ),
        Rule::new(
            Directive::binary(Operator::UMul, a(), Directive::literal(1)),
            a(),
        ),
        Rule::new(
            Directive::binary(Operator::Mul, a(), Directive::literal(0)),
            Directive::zero_like("A"),
        ),
        Rule::new(
            Directive::binary(Operator::UMul, a(), Directive::literal(0)),
            Directive::zero_like("A"),
        ),
        Rule::new(
            Directive::binary(Operator::Div, a(), Directive::literal(1)),
            a(),
        ),
        Rule::new(
            Directive::binary(Operator::UDiv, a(), Directive::literal(1)),
            a(),
        ),
        // Bitwise idempotence and annihilators.
        Rule::new(Directive::binary(Operator::And, a(), a()), a()),
        Rule::new(Directive::binary(Operator::Or, a(), a()), a()),
        Rule::new(
            Directive::binary(Operator::Xor, a(), a()),
            Directive::zero_like("A"),
        ),
        Rule::new(
            Directive::binary(Operator::Sub, a(), a()),
            Directive::zero_like("A"),
        ),
        Rule::new(
            Directive::binary(Operator::And, a(), Directive::literal(0)),
            Directive::zero_like("A"),
        ),
        Rule::new(
            Directive::binary(Operator::And, a(), Directive::literal(-1)),
            a(),
        ),
        Rule::new(
            Directive::binary(Operator::Or, a(), Directive::literal(-1)),
            Directive::literal_like("A", -1),
        ),
        Rule::new(
            Directive::binary(Operator::Or, a(), Directive::literal(0)),
            a(),
        ),
        // Shift/rotate by zero.
        Rule::new(
            Directive::binary(Operator::Shl, a(), Directive::literal(0)),
            a(),
        ),
        Rule::new(
            Directive::binary(Operator::Shr, a(), Directive::literal(0)),
            a(),
        ),
        Rule::new(
            Directive::binary(Operator::Rol, a(), Directive::literal(0)),
            a(),
        ),
        Rule::new(
            Directive::binary(Operator::Ror, a(), Directive::literal(0)),
            a(),
        ),
        // Double negation.
        Rule::new(
            Directive::unary(Operator::Not, Directive::unary(Operator::Not, a())),
            a(),
        ),
        Rule::new(
            Directive::unary(Operator::Neg, Directive::unary(Operator::Neg, a())),
            a(),
        ),
        // `min`/`max` idempotence: `max(x, x) = x`, `min(x, x) = x`.
        Rule::new(Directive::binary(Operator::Max, a(), a()), a()),
        Rule::new(Directive::binary(Operator::Min, a(), a()), a()),
        Rule::new(Directive::binary(Operator::UMax, a(), a()), a()),
        Rule::new(Directive::binary(Operator::UMin, a(), a()), a()),
        // `valueif(1, x) = x`: an always-true predicate collapses the
        // select to its consequence. (`valueif(0, x)` already folds to a
        // constant 0 by evaluation once `x`'s width is known; no rule
        // needed here since that path only applies to constant `x`.)
        Rule::new(
            Directive::binary(Operator::ValueIf, Directive::literal(1), b()),
            b(),
        ),
        // A redundant popcnt/bitcount pair's outer cast is left to Cast
        // rules above; no further universal rule needed for those leaves.
    ]
}
