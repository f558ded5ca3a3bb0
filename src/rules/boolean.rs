//! Boolean-specific simplifiers (spec §4.H): comparisons and logical
//! operators. Applied by the simplifier only when the subject's operator
//! category is `Comparison` or `Logical` (spec §4.I step 6).

use crate::directive::Directive;
use crate::operator::Operator;

use super::Rule;

pub(super) fn build() -> Vec<Rule> {
    let a = || Directive::any("A");
    let b = || Directive::any("B");

    let reflexive = |op: Operator, truth: i128| {
        Rule::new(
            Directive::binary(op, a(), a()),
            Directive::sized_literal(truth, 1),
        )
    };

    vec![
        // Self-comparison folding: `x == x` is always true, `x < x` is
        // always false, and so on for the full signed/unsigned comparison
        // family.
        reflexive(Operator::Eq, 1),
        reflexive(Operator::Ne, 0),
        reflexive(Operator::Lt, 0),
        reflexive(Operator::Le, 1),
        reflexive(Operator::Gt, 0),
        reflexive(Operator::Ge, 1),
        reflexive(Operator::Ult, 0),
        reflexive(Operator::Ule, 1),
        reflexive(Operator::Ugt, 0),
        reflexive(Operator::Uge, 1),
        // Logical idempotence and double negation.
        Rule::new(Directive::binary(Operator::LAnd, a(), a()), a()),
        Rule::new(Directive::binary(Operator::LOr, a(), a()), a()),
        Rule::new(
            Directive::unary(Operator::LNot, Directive::unary(Operator::LNot, a())),
            a(),
        ),
        // Logical annihilators/identities, width-independent since a
        // logical operator's operands and result are conventionally
        // 1-bit.
        Rule::new(
            Directive::binary(Operator::LAnd, a(), Directive::literal(0)),
            Directive::sized_literal(0, 1),
        ),
        Rule::new(
            Directive::binary(Operator::LOr, a(), Directive::literal(1)),
            Directive::sized_literal(1, 1),
        ),
        Rule::new(
            Directive::binary(Operator::LAnd, a(), Directive::literal(1)),
            a(),
        ),
        Rule::new(
            Directive::binary(Operator::LOr, a(), Directive::literal(0)),
            a(),
        ),
        // De Morgan, in the complexity-reducing direction: two negations and
        // an outer `LOr`/`LAnd` (3 ops) collapse to one negation over the
        // dual operator (2 ops). The expanding direction (push a `LNot`
        // inward through an `LAnd`/`LOr`) is never taken here since it would
        // only ever increase node count, which `apply_first_reducing` never
        // accepts.
        Rule::new(
            Directive::binary(
                Operator::LOr,
                Directive::unary(Operator::LNot, a()),
                Directive::unary(Operator::LNot, b()),
            ),
            Directive::unary(Operator::LNot, Directive::binary(Operator::LAnd, a(), b())),
        ),
        Rule::new(
            Directive::binary(
                Operator::LAnd,
                Directive::unary(Operator::LNot, a()),
                Directive::unary(Operator::LNot, b()),
            ),
            Directive::unary(Operator::LNot, Directive::binary(Operator::LOr, a(), b())),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expression;
    use crate::simplify::Simplifier;
    use crate::uid::UniqueIdentifier;

    fn var(name: &str) -> Expression {
        Expression::variable(UniqueIdentifier::name(name)).unwrap()
    }

    #[test]
    fn de_morgan_or_of_nots_collapses_to_not_of_and() {
        let x = var("x");
        let y = var("y");
        let expr = Expression::binary(
            Expression::unary(Operator::LNot, x.clone()).unwrap(),
            Operator::LOr,
            Expression::unary(Operator::LNot, y.clone()).unwrap(),
        )
        .unwrap();
        let simplifier = Simplifier::new();
        let simplified = simplifier.simplify(&expr);
        assert_eq!(simplified.operator(), Operator::LNot);
        let inner = simplified.rhs().unwrap();
        assert_eq!(inner.operator(), Operator::LAnd);
    }

    #[test]
    fn de_morgan_and_of_nots_collapses_to_not_of_or() {
        let x = var("x");
        let y = var("y");
        let expr = Expression::binary(
            Expression::unary(Operator::LNot, x.clone()).unwrap(),
            Operator::LAnd,
            Expression::unary(Operator::LNot, y.clone()).unwrap(),
        )
        .unwrap();
        let simplifier = Simplifier::new();
        let simplified = simplifier.simplify(&expr);
        assert_eq!(simplified.operator(), Operator::LNot);
        let inner = simplified.rhs().unwrap();
        assert_eq!(inner.operator(), Operator::LOr);
    }
}
