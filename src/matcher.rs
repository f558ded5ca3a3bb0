//! `fast_match`: unifies a directive pattern against a concrete expression,
//! producing zero or more `SymbolTable`s (spec §4.G).
//!
//! Matching an `Iff` directive requires simplifying the bound condition,
//! which is the simplifier's job (`simplify.rs`) — and the simplifier in
//! turn calls `fast_match` to apply rules. Rather than a direct circular
//! module dependency, the caller passes in a simplify callback; the
//! simplifier passes its own `simplify` method, the unit tests here pass a
//! stub that just evaluates closed-form constants.

use crate::directive::Directive;
use crate::expr::Expression;
use crate::symtable::SymbolTable;

/// Attempts to unify `pattern` against `subject`, returning every distinct
/// binding that makes them structurally equal once captures are filled in.
/// `simplify` is consulted only to resolve `Iff` side conditions.
pub fn fast_match(
    pattern: &Directive,
    subject: &Expression,
    simplify: &mut dyn FnMut(&Expression) -> Expression,
) -> Vec<SymbolTable> {
    if !crate::expr::ExpressionSignature::can_match(pattern.signature(), subject.signature()) {
        return Vec::new();
    }

    if let Some((tag, kind)) = pattern.as_capture() {
        let mut table = SymbolTable::new();
        return match table.add(tag, kind, subject) {
            Ok(()) => vec![table],
            Err(_) => Vec::new(),
        };
    }

    if let Some(literal) = pattern.as_literal() {
        return match subject.as_constant() {
            Some(c) if c.signed_value() == literal => vec![SymbolTable::new()],
            _ => Vec::new(),
        };
    }

    if let Some((condition, body)) = pattern.as_iff() {
        let mut accepted = Vec::new();
        for table in fast_match(body, subject, simplify) {
            let condition_expr = match table.translate(condition) {
                Ok(e) => e,
                Err(_) => continue,
            };
            let reduced = simplify(&condition_expr);
            if let Some(c) = reduced.as_constant() {
                if !c.is_zero() {
                    accepted.push(table);
                }
            }
        }
        return accepted;
    }

    let operator = match pattern.operator() {
        Some(op) => op,
        None => return Vec::new(),
    };
    if subject.operator() != operator {
        return Vec::new();
    }

    match (pattern.lhs(), pattern.rhs()) {
        (None, Some(pattern_rhs)) => {
            let subject_rhs = match subject.rhs() {
                Some(r) => r,
                None => return Vec::new(),
            };
            fast_match(pattern_rhs, subject_rhs, simplify)
        }
        (Some(pattern_lhs), Some(pattern_rhs)) => {
            let (subject_lhs, subject_rhs) = match (subject.lhs(), subject.rhs()) {
                (Some(l), Some(r)) => (l, r),
                _ => return Vec::new(),
            };
            let mut out = Vec::new();
            merge_orderings(pattern_lhs, pattern_rhs, subject_lhs, subject_rhs, simplify, &mut out);
            if operator.is_commutative() {
                merge_orderings(pattern_lhs, pattern_rhs, subject_rhs, subject_lhs, simplify, &mut out);
            }
            out
        }
        _ => Vec::new(),
    }
}

fn merge_orderings(
    pattern_lhs: &Directive,
    pattern_rhs: &Directive,
    subject_lhs: &Expression,
    subject_rhs: &Expression,
    simplify: &mut dyn FnMut(&Expression) -> Expression,
    out: &mut Vec<SymbolTable>,
) {
    let left_tables = fast_match(pattern_lhs, subject_lhs, simplify);
    if left_tables.is_empty() {
        return;
    }
    let right_tables = fast_match(pattern_rhs, subject_rhs, simplify);
    for lt in &left_tables {
        for rt in &right_tables {
            if let Ok(merged) = lt.merge(rt) {
                out.push(merged);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::Constant;
    use crate::operator::Operator;
    use crate::uid::UniqueIdentifier;

    fn var(name: &str) -> Expression {
        Expression::variable(UniqueIdentifier::name(name)).unwrap()
    }

    fn konst(v: u64, bits: u32) -> Expression {
        Expression::constant(Constant::new(v, bits).unwrap())
    }

    fn no_simplify(e: &Expression) -> Expression {
        e.evaluate()
            .map(Expression::constant)
            .unwrap_or_else(|_| e.clone())
    }

    #[test]
    fn capture_binds_the_whole_subject() {
        let pattern = Directive::any("A");
        let subject = var("x");
        let tables = fast_match(&pattern, &subject, &mut no_simplify);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].get("A").unwrap(), &subject);
    }

    #[test]
    fn literal_requires_equal_constant() {
        let pattern = Directive::literal(0);
        assert_eq!(fast_match(&pattern, &konst(0, 64), &mut no_simplify).len(), 1);
        assert_eq!(fast_match(&pattern, &konst(1, 64), &mut no_simplify).len(), 0);
    }

    #[test]
    fn operator_match_recurses_on_children() {
        let pattern = Directive::binary(
            Operator::Add,
            Directive::any("A"),
            Directive::literal(0),
        );
        let subject = Expression::binary(var("x"), Operator::Add, konst(0, 64)).unwrap();
        let tables = fast_match(&pattern, &subject, &mut no_simplify);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].get("A").unwrap(), &var("x"));
    }

    #[test]
    fn commutative_operator_tries_both_orderings() {
        let pattern = Directive::binary(
            Operator::Add,
            Directive::any("A"),
            Directive::literal(0),
        );
        let subject = Expression::binary(konst(0, 64), Operator::Add, var("x")).unwrap();
        let tables = fast_match(&pattern, &subject, &mut no_simplify);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].get("A").unwrap(), &var("x"));
    }

    #[test]
    fn non_commutative_operator_does_not_try_swap() {
        let pattern = Directive::binary(
            Operator::Sub,
            Directive::any("A"),
            Directive::literal(0),
        );
        let subject = Expression::binary(konst(0, 64), Operator::Sub, var("x")).unwrap();
        assert!(fast_match(&pattern, &subject, &mut no_simplify).is_empty());
    }

    #[test]
    fn iff_condition_must_reduce_to_true() {
        let pattern = Directive::iff(
            Directive::literal(1),
            Directive::any("A"),
        );
        let tables = fast_match(&pattern, &var("x"), &mut no_simplify);
        assert_eq!(tables.len(), 1);

        let false_pattern = Directive::iff(
            Directive::literal(0),
            Directive::any("A"),
        );
        assert!(fast_match(&false_pattern, &var("x"), &mut no_simplify).is_empty());
    }

    #[test]
    fn matcher_soundness_round_trip() {
        let pattern = Directive::binary(
            Operator::Add,
            Directive::any("A"),
            Directive::any("B"),
        );
        let subject = Expression::binary(var("x"), Operator::Add, konst(5, 64)).unwrap();
        let tables = fast_match(&pattern, &subject, &mut no_simplify);
        assert_eq!(tables.len(), 1);
        let rebuilt = tables[0].translate(&pattern).unwrap();
        assert_eq!(rebuilt, subject);
    }
}
