//! Join descriptors (spec §4.H): rules applied after both children of an
//! outer operator have already been simplified, combining them across that
//! operator. Unlike universal simplifiers these may temporarily *increase*
//! depth before the simplifier recursively simplifies the candidate back
//! down — reassociation below builds an inner `Add(U1, U2)` of two
//! constants that didn't exist in the input, relying on the recursive
//! `simplify` call in `Simplifier::apply_first_reducing` to fold it before
//! the net complexity is compared. The simplifier bounds this recursion
//! with its join-depth counter (spec §4.I step 7) so a pathological chain
//! of reassociations can't recurse forever.

use crate::directive::Directive;
use crate::operator::Operator;

use super::Rule;

pub(super) fn build() -> Vec<Rule> {
    let a = || Directive::any("A");
    let u1 = || Directive::const_capture("U1");
    let u2 = || Directive::const_capture("U2");

    vec![
        // Factoring: `a*b + a*c = a*(b+c)`. Works for any placement of the
        // shared factor across the two `Mul` terms — `Mul` and `Add` are
        // both commutative, so the matcher's per-node swapped-order trials
        // compound to cover all four arrangements.
        Rule::new(
            Directive::binary(
                Operator::Add,
                Directive::binary(Operator::Mul, a(), Directive::any("B")),
                Directive::binary(Operator::Mul, a(), Directive::any("C")),
            ),
            Directive::binary(
                Operator::Mul,
                a(),
                Directive::binary(Operator::Add, Directive::any("B"), Directive::any("C")),
            ),
        ),
        Rule::new(
            Directive::binary(
                Operator::Add,
                Directive::binary(Operator::UMul, a(), Directive::any("B")),
                Directive::binary(Operator::UMul, a(), Directive::any("C")),
            ),
            Directive::binary(
                Operator::UMul,
                a(),
                Directive::binary(Operator::Add, Directive::any("B"), Directive::any("C")),
            ),
        ),
        // Reassociation-and-fold: `(x + c1) + c2 = x + (c1 + c2)`. The
        // inner `Add(U1, U2)` is two literal constants, so the recursive
        // simplify call folds it to a single constant before the outer
        // complexity comparison.
        Rule::new(
            Directive::binary(Operator::Add, Directive::binary(Operator::Add, a(), u1()), u2()),
            Directive::binary(Operator::Add, a(), Directive::binary(Operator::Add, u1(), u2())),
        ),
        Rule::new(
            Directive::binary(Operator::Mul, Directive::binary(Operator::Mul, a(), u1()), u2()),
            Directive::binary(Operator::Mul, a(), Directive::binary(Operator::Mul, u1(), u2())),
        ),
        Rule::new(
            Directive::binary(Operator::And, Directive::binary(Operator::And, a(), u1()), u2()),
            Directive::binary(Operator::And, a(), Directive::binary(Operator::And, u1(), u2())),
        ),
        Rule::new(
            Directive::binary(Operator::Or, Directive::binary(Operator::Or, a(), u1()), u2()),
            Directive::binary(Operator::Or, a(), Directive::binary(Operator::Or, u1(), u2())),
        ),
    ]
}
