//! `SymbolTable`: the bindings produced by matching a directive against a
//! concrete expression.
//!
//! Fixed-capacity (spec §9: "≈16 slots is sufficient for every rule in the
//! tables") — no rule in `rules/` binds anywhere near that many distinct
//! captures, so a `SmallVec` avoids a heap allocation per match attempt
//! instead of reaching for a general associative map.

use smallvec::SmallVec;

use crate::constant::Constant;
use crate::directive::{CaptureKind, Directive};
use crate::error::{SymExError, SymExResult};
use crate::expr::Expression;
use crate::operator::Operator;

const CAPACITY: usize = 16;

/// A finite mapping from capture tag to the concrete expression it bound
/// to, built up while matching a directive against a subject.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    bindings: SmallVec<[(&'static str, Expression); CAPACITY]>,
}

impl SymbolTable {
    /// An empty symbol table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The expression bound to `tag`, if any.
    pub fn get(&self, tag: &str) -> Option<&Expression> {
        self.bindings.iter().find(|(t, _)| *t == tag).map(|(_, e)| e)
    }

    /// Binds `tag` to `expr` if `kind` accepts it and any existing binding
    /// of `tag` is structurally equal to `expr`.
    pub fn add(&mut self, tag: &'static str, kind: CaptureKind, expr: &Expression) -> SymExResult<()> {
        if !kind.accepts(expr.is_constant(), expr.is_variable()) {
            return Err(SymExError::BindingConflict(tag.to_string()));
        }
        if let Some(existing) = self.get(tag) {
            return if existing == expr {
                Ok(())
            } else {
                Err(SymExError::BindingConflict(tag.to_string()))
            };
        }
        if self.bindings.len() >= CAPACITY {
            return Err(SymExError::CapacityExceeded(format!(
                "symbol table exceeded {} bindings",
                CAPACITY
            )));
        }
        self.bindings.push((tag, expr.clone()));
        Ok(())
    }

    /// Combines two tables produced by matching independent subtrees.
    /// Fails if the same tag is bound to structurally unequal expressions
    /// in each.
    pub fn merge(&self, other: &SymbolTable) -> SymExResult<SymbolTable> {
        let mut result = self.clone();
        for (tag, expr) in other.bindings.iter() {
            if let Some(existing) = result.get(tag) {
                if existing != expr {
                    return Err(SymExError::BindingConflict((*tag).to_string()));
                }
            } else {
                if result.bindings.len() >= CAPACITY {
                    return Err(SymExError::CapacityExceeded(format!(
                        "symbol table exceeded {} bindings",
                        CAPACITY
                    )));
                }
                result.bindings.push((tag, expr.clone()));
            }
        }
        Ok(result)
    }

    /// Rebuilds an expression from `directive` by replacing captures with
    /// their bound expressions and recursively constructing operator nodes.
    /// Fails if a capture in `directive` has no binding here.
    pub fn translate(&self, directive: &Directive) -> SymExResult<Expression> {
        if let Some((tag, _)) = directive.as_capture() {
            return self
                .get(tag)
                .cloned()
                .ok_or_else(|| SymExError::BindingConflict(tag.to_string()));
        }
        if let Some((value, bits)) = directive.as_sized_literal() {
            return Ok(Expression::constant(Constant::from_i64(value as i64, bits)?));
        }
        if let Some((tag, value)) = directive.as_literal_like() {
            let bits = self.get(tag).map(Expression::bit_count).ok_or_else(|| {
                SymExError::BindingConflict(tag.to_string())
            })?;
            return Ok(Expression::constant(Constant::from_i64(value as i64, bits)?));
        }
        if directive.as_literal().is_some() {
            return Err(SymExError::Structural(
                "bare literal directive has no bit width to translate with".to_string(),
            ));
        }
        if let Some((_, body)) = directive.as_iff() {
            return self.translate(body);
        }
        let operator = directive
            .operator()
            .ok_or_else(|| SymExError::Structural("directive has no operator".to_string()))?;
        let rhs = self.translate(
            directive
                .rhs()
                .ok_or_else(|| SymExError::Structural("directive missing rhs".to_string()))?,
        )?;
        match directive.lhs() {
            Some(lhs_directive) => {
                let lhs = self.translate(lhs_directive)?;
                Expression::binary(lhs, operator, rhs)
            }
            None => Expression::unary(operator, rhs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::Constant;
    use crate::directive::Directive;
    use crate::uid::UniqueIdentifier;

    fn var(name: &str) -> Expression {
        Expression::variable(UniqueIdentifier::name(name)).unwrap()
    }

    #[test]
    fn add_rejects_kind_mismatch() {
        let mut table = SymbolTable::new();
        let x = var("x");
        assert!(table.add("U", CaptureKind::Constant, &x).is_err());
        assert!(table.add("V", CaptureKind::Variable, &x).is_ok());
    }

    #[test]
    fn add_rejects_conflicting_rebind() {
        let mut table = SymbolTable::new();
        let x = var("x");
        let y = var("y");
        table.add("A", CaptureKind::Any, &x).unwrap();
        assert!(table.add("A", CaptureKind::Any, &y).is_err());
        assert!(table.add("A", CaptureKind::Any, &x).is_ok());
    }

    #[test]
    fn merge_detects_conflicts() {
        let mut left = SymbolTable::new();
        let mut right = SymbolTable::new();
        left.add("A", CaptureKind::Any, &var("x")).unwrap();
        right.add("A", CaptureKind::Any, &var("y")).unwrap();
        assert!(left.merge(&right).is_err());

        let mut right_ok = SymbolTable::new();
        right_ok.add("A", CaptureKind::Any, &var("x")).unwrap();
        right_ok.add("B", CaptureKind::Any, &var("y")).unwrap();
        let merged = left.merge(&right_ok).unwrap();
        assert_eq!(merged.get("A").unwrap(), &var("x"));
        assert_eq!(merged.get("B").unwrap(), &var("y"));
    }

    #[test]
    fn translate_rebuilds_expression() {
        let mut table = SymbolTable::new();
        table.add("A", CaptureKind::Any, &var("x")).unwrap();
        let pattern = Directive::binary(
            Operator::Add,
            Directive::any("A"),
            Directive::literal_like("A", 0),
        );
        let rebuilt = table.translate(&pattern).unwrap();
        assert_eq!(
            rebuilt,
            Expression::binary(var("x"), Operator::Add, Expression::constant(Constant::new(0, 64).unwrap()))
                .unwrap()
        );
    }

    #[test]
    fn translate_rejects_bare_literal() {
        let table = SymbolTable::new();
        assert!(table.translate(&Directive::literal(0)).is_err());
    }

    #[test]
    fn translate_sized_literal_uses_its_own_width() {
        let table = SymbolTable::new();
        let rebuilt = table.translate(&Directive::sized_literal(1, 1)).unwrap();
        assert_eq!(rebuilt, Expression::constant(Constant::new(1, 1).unwrap()));
    }

    #[test]
    fn translate_fails_on_unbound_capture() {
        let table = SymbolTable::new();
        let pattern = Directive::any("A");
        assert!(table.translate(&pattern).is_err());
    }
}
