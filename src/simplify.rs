//! The simplifier engine (spec §4.I): a memoized, bounded-depth rewrite
//! loop driving the matcher and rule tables over an expression DAG.
//!
//! Grounded on the teacher's `scoped_hash_map.rs` bounded/evictable map
//! discipline, combined with the recursion-depth guard an egraph-style
//! rewriter needs to keep mutually-distributing rules from diverging. Each
//! `Simplifier` owns its cache outright rather than reaching for a
//! `thread_local!`: spec §5 requires the cache to be thread-local, and
//! `pass.rs` satisfies that by allocating a fresh `Simplifier` per
//! invocation rather than sharing one across threads.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use crate::directive::Directive;
use crate::expr::Expression;
use crate::matcher::fast_match;
use crate::operator::Category;
use crate::rules::{self, Rule};

/// Cache entries evict once the table holds this many; eviction drops the
/// oldest half in one pass (spec §4.I "Cache discipline").
const CACHE_CAPACITY: usize = 65_536;

/// Hard ceiling on join-rule recursion depth (spec §4.I step 7, default
/// 20).
const JOIN_DEPTH_CEILING: u32 = 20;

struct CacheEntry {
    result: Expression,
    /// `true` only when the insertion that produced this entry ran to
    /// completion without being superseded mid-flight — in this
    /// single-threaded-per-instance design that's always the case once an
    /// entry exists, but the field is kept to mirror spec §4.I's
    /// "cache hits are considered stable only if insertion completed
    /// without being interrupted" language, and to let `pass.rs` assert on
    /// it if a future caller adds cancellation.
    stable: bool,
}

/// A memoized rewriter for one expression tree (or a whole basic block's
/// worth, processed one instruction at a time — see `pass.rs`). Not `Sync`:
/// allocate one per thread, per invocation.
pub struct Simplifier {
    cache: RefCell<HashMap<usize, CacheEntry>>,
    insertion_order: RefCell<VecDeque<usize>>,
    join_depth: Cell<u32>,
}

impl Default for Simplifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Simplifier {
    /// A fresh simplifier with an empty cache and zero join depth.
    pub fn new() -> Self {
        Simplifier {
            cache: RefCell::new(HashMap::new()),
            insertion_order: RefCell::new(VecDeque::new()),
            join_depth: Cell::new(0),
        }
    }

    /// Simplifies `expr` to a semantically equivalent expression whose
    /// complexity is no greater than `expr`'s (spec §4.I, §8.2).
    pub fn simplify(&self, expr: &Expression) -> Expression {
        self.simplify_node(expr)
    }

    fn simplify_node(&self, expr: &Expression) -> Expression {
        // Step 1: already-simplified hint, or a leaf.
        if expr.simplify_hint() {
            return expr.clone();
        }
        if expr.operand_count() == 0 {
            expr.set_simplify_hint();
            return expr.clone();
        }

        // Step 2: cache lookup.
        if let Some(cached) = self.cache_lookup(expr) {
            return cached;
        }

        // Step 3: recursively simplify children, rebuild (hash-consed; a
        // node whose children come back unchanged reuses the same handle
        // via `pool::intern`, not a fresh allocation).
        let rebuilt = self.rebuild_with_simplified_children(expr);

        // Step 4: fold a now-constant subtree directly.
        if !rebuilt.contains_variables() {
            if let Ok(value) = rebuilt.evaluate() {
                let result = Expression::constant(value);
                self.cache_insert(expr, &result);
                result.set_simplify_hint();
                return result;
            }
        }

        let mut current = rebuilt;

        // Steps 5-6: universal simplifiers, then boolean rules when the
        // operator category applies, iterated to a fixed point. Each
        // accepted rewrite strictly reduces complexity, so this loop is
        // finite (spec §4.I "Termination argument").
        loop {
            if let Some(next) = self.apply_first_reducing(&current, rules::universal()) {
                current = next;
                continue;
            }
            let category = current.operator().category();
            if matches!(category, Category::Comparison | Category::Logical) {
                if let Some(next) = self.apply_first_reducing(&current, rules::boolean()) {
                    current = next;
                    continue;
                }
            }
            break;
        }

        // Step 7: join descriptors, guarded by the bounded depth counter.
        if self.join_depth.get() < JOIN_DEPTH_CEILING {
            self.join_depth.set(self.join_depth.get() + 1);
            if let Some(next) = self.apply_first_reducing(&current, rules::joins()) {
                current = next;
            }
            self.join_depth.set(self.join_depth.get() - 1);
        }

        // Step 8: cache and mark stable.
        self.cache_insert(expr, &current);
        current.set_simplify_hint();
        current
    }

    fn rebuild_with_simplified_children(&self, expr: &Expression) -> Expression {
        let op = expr.operator();
        match (expr.lhs(), expr.rhs()) {
            (Some(lhs), Some(rhs)) => {
                let lhs = self.simplify_node(lhs);
                let rhs = self.simplify_node(rhs);
                Expression::binary(lhs, op, rhs)
                    .expect("operator/arity preserved from an already-valid binary node")
            }
            (None, Some(rhs)) => {
                let rhs = self.simplify_node(rhs);
                Expression::unary(op, rhs)
                    .expect("operator/arity preserved from an already-valid unary node")
            }
            _ => expr.clone(),
        }
    }

    /// Tries each rule in order; for the first one whose match (under any
    /// of possibly several bindings) translates and recursively simplifies
    /// to something strictly less complex than `subject`, returns that
    /// result (spec §4.I step 5).
    fn apply_first_reducing(&self, subject: &Expression, table: &[Rule]) -> Option<Expression> {
        for rule in table {
            let tables = fast_match(&rule.from, subject, &mut |e| self.simplify_node(e));
            for binding in &tables {
                if let Some(condition) = &rule.condition {
                    if !self.condition_holds(binding, condition) {
                        continue;
                    }
                }
                let candidate = match binding.translate(&rule.to) {
                    Ok(c) => c,
                    Err(_) => continue,
                };
                let candidate = self.simplify_node(&candidate);
                if candidate.complexity() < subject.complexity() {
                    return Some(candidate);
                }
            }
        }
        None
    }

    fn condition_holds(&self, binding: &crate::symtable::SymbolTable, condition: &Directive) -> bool {
        let expr = match binding.translate(condition) {
            Ok(e) => e,
            Err(_) => return false,
        };
        let reduced = self.simplify_node(&expr);
        matches!(reduced.as_constant(), Some(c) if !c.is_zero())
    }

    fn cache_lookup(&self, expr: &Expression) -> Option<Expression> {
        self.cache
            .borrow()
            .get(&expr.cache_key())
            .filter(|entry| entry.stable)
            .map(|entry| entry.result.clone())
    }

    fn cache_insert(&self, expr: &Expression, result: &Expression) {
        let key = expr.cache_key();
        let mut cache = self.cache.borrow_mut();
        let mut order = self.insertion_order.borrow_mut();
        if !cache.contains_key(&key) {
            if cache.len() >= CACHE_CAPACITY {
                let evict = cache.len() / 2;
                for _ in 0..evict {
                    if let Some(old_key) = order.pop_front() {
                        cache.remove(&old_key);
                    }
                }
            }
            order.push_back(key);
        }
        cache.insert(
            key,
            CacheEntry {
                result: result.clone(),
                stable: true,
            },
        );
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

    #[test]
    fn add_zero_simplifies_to_variable() {
        let s = Simplifier::new();
        let expr = Expression::binary(var("x"), Operator::Add, konst(0, 64)).unwrap();
        let result = s.simplify(&expr);
        assert_eq!(result, var("x"));
    }

    #[test]
    fn mul_zero_simplifies_to_zero() {
        let s = Simplifier::new();
        let expr = Expression::binary(var("x"), Operator::Mul, konst(0, 64)).unwrap();
        let result = s.simplify(&expr);
        assert_eq!(result.as_constant().unwrap().value(), 0);
    }

    #[test]
    fn and_self_simplifies_to_variable() {
        let s = Simplifier::new();
        let x = var("x");
        let expr = Expression::binary(x.clone(), Operator::And, x.clone()).unwrap();
        assert_eq!(s.simplify(&expr), x);
    }

    #[test]
    fn xor_self_simplifies_to_zero() {
        let s = Simplifier::new();
        let x = var("x");
        let expr = Expression::binary(x.clone(), Operator::Xor, x).unwrap();
        let result = s.simplify(&expr);
        assert_eq!(result.as_constant().unwrap().value(), 0);
    }

    #[test]
    fn self_comparison_folds_boolean() {
        let s = Simplifier::new();
        let x = var("x");
        let eq = Expression::binary(x.clone(), Operator::Eq, x.clone()).unwrap();
        assert_eq!(s.simplify(&eq).as_constant().unwrap().value(), 1);

        let lt = Expression::binary(x.clone(), Operator::Lt, x).unwrap();
        assert_eq!(s.simplify(&lt).as_constant().unwrap().value(), 0);
    }

    #[test]
    fn double_negation_cancels() {
        let s = Simplifier::new();
        let x = var("x");
        let expr = Expression::unary(Operator::Neg, Expression::unary(Operator::Neg, x.clone()).unwrap()).unwrap();
        assert_eq!(s.simplify(&expr), x);
    }

    #[test]
    fn distributes_and_folds_constants() {
        let s = Simplifier::new();
        let x = var("x");
        // (x + 0) * (5 + 3)
        let lhs = Expression::binary(x.clone(), Operator::Add, konst(0, 64)).unwrap();
        let rhs = Expression::binary(konst(5, 64), Operator::Add, konst(3, 64)).unwrap();
        let expr = Expression::binary(lhs, Operator::Mul, rhs).unwrap();
        let result = s.simplify(&expr);
        let expected = Expression::binary(x, Operator::Mul, konst(8, 64)).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn factoring_join_rule_fires() {
        let s = Simplifier::new();
        let x = var("x");
        let y = var("y");
        let z = var("z");
        // x*y + x*z -> x*(y+z)
        let lhs = Expression::binary(x.clone(), Operator::Mul, y.clone()).unwrap();
        let rhs = Expression::binary(x.clone(), Operator::Mul, z.clone()).unwrap();
        let expr = Expression::binary(lhs, Operator::Add, rhs).unwrap();
        let result = s.simplify(&expr);
        let expected_inner = Expression::binary(y, Operator::Add, z).unwrap();
        let expected = Expression::binary(x, Operator::Mul, expected_inner).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn idempotence_holds() {
        let s = Simplifier::new();
        let expr = Expression::binary(var("x"), Operator::Add, konst(0, 64)).unwrap();
        let once = s.simplify(&expr);
        let twice = s.simplify(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn complexity_never_increases() {
        let s = Simplifier::new();
        let exprs = vec![
            Expression::binary(var("x"), Operator::Add, konst(0, 64)).unwrap(),
            Expression::binary(var("x"), Operator::Xor, var("x")).unwrap(),
            Expression::binary(konst(10, 64), Operator::Add, konst(20, 64)).unwrap(),
        ];
        for e in exprs {
            let before = e.complexity();
            let after = s.simplify(&e);
            assert!(after.complexity() <= before);
        }
    }
}
