//! The directive language: the pattern side of a rewrite rule.
//!
//! A `Directive` mirrors the shape of an `Expression` but its leaves can be
//! typed match variables instead of concrete constants/variables, and its
//! root can be the pseudo-operator `Iff(condition, body)` (spec §4.F). Rule
//! tables (`rules/`) are built once from directives and never mutated, so
//! directives don't need hash-consing — they're built bottom-up with plain
//! `Arc` sharing and their signature is computed once at construction time.

use std::sync::Arc;

use crate::expr::ExpressionSignature;
use crate::operator::Operator;

/// What kind of subject a capture variable accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// Accepts any expression (constant, variable, or operation).
    Any,
    /// Accepts only a variable leaf — the `V` tag family in spec §4.F.
    Variable,
    /// Accepts only a constant leaf — the `U` tag family in spec §4.F.
    Constant,
}

impl CaptureKind {
    /// Whether a subject with the given constant/variable shape satisfies
    /// this capture kind.
    pub fn accepts(self, subject_is_constant: bool, subject_is_variable: bool) -> bool {
        match self {
            CaptureKind::Any => true,
            CaptureKind::Variable => subject_is_variable,
            CaptureKind::Constant => subject_is_constant,
        }
    }
}

#[derive(Debug)]
enum DirectiveKind {
    Capture { tag: &'static str, kind: CaptureKind },
    /// A width-agnostic literal predicate: matches any constant whose
    /// *signed* value equals this one, regardless of bit width. Rules are
    /// built once and reused across every operand width a register might
    /// carry, so a literal like "zero" or "minus one" has to mean the same
    /// thing at 8 bits and at 64 — comparing `signed_value()` gives exactly
    /// that (an all-ones pattern is `-1` at every width).
    Literal(i128),
    /// A replacement-only literal: at `translate` time, builds a constant
    /// of `value` at the same bit width as whatever `tag` is bound to.
    /// Used on a rule's `to` side to produce e.g. "zero, the same width as
    /// the operand that matched" (spec §4.H's `x - x = 0`).
    LiteralLike { tag: &'static str, value: i128 },
    /// A replacement-only literal with a fixed, rule-specified bit width,
    /// independent of any capture (e.g. the 1-bit boolean `1` a
    /// self-comparison folds to).
    SizedLiteral { value: i128, bits: u32 },
    Unary { operator: Operator, rhs: Directive },
    Binary { operator: Operator, lhs: Directive, rhs: Directive },
    /// A side condition attached to the rule's top-level body: the rule
    /// fires only when `condition`, evaluated under the bindings `body`
    /// produced, simplifies to a true (nonzero) constant.
    Iff { condition: Directive, body: Directive },
}

#[derive(Debug)]
struct DirectiveNode {
    kind: DirectiveKind,
    signature: ExpressionSignature,
}

/// A pattern tree used as either side of a `Rule`.
#[derive(Clone, Debug)]
pub struct Directive(Arc<DirectiveNode>);

impl Directive {
    /// An untyped capture (the `A, B, C, D, …` tag family).
    pub fn any(tag: &'static str) -> Directive {
        Self::capture(tag, CaptureKind::Any)
    }

    /// A capture that only accepts a variable leaf (the `V` tag).
    pub fn var_capture(tag: &'static str) -> Directive {
        Self::capture(tag, CaptureKind::Variable)
    }

    /// A capture that only accepts a constant leaf (the `U` tag).
    pub fn const_capture(tag: &'static str) -> Directive {
        Self::capture(tag, CaptureKind::Constant)
    }

    /// A capture variable of the given kind, tagged `tag`.
    pub fn capture(tag: &'static str, kind: CaptureKind) -> Directive {
        Directive(Arc::new(DirectiveNode {
            kind: DirectiveKind::Capture { tag, kind },
            signature: ExpressionSignature::wildcard(),
        }))
    }

    /// A width-agnostic literal predicate (see `DirectiveKind::Literal`).
    /// Match-only: a bare literal carries no bit width of its own, so
    /// `SymbolTable::translate` cannot rebuild a `Constant` from it on a
    /// rule's `to` side. Use `sized_literal` or `literal_like` there.
    pub fn literal(value: i128) -> Directive {
        Directive(Arc::new(DirectiveNode {
            kind: DirectiveKind::Literal(value),
            signature: ExpressionSignature::literal_predicate(),
        }))
    }

    /// A to-side literal with an explicit, fixed bit width — used for
    /// results whose width the rule dictates rather than inheriting from a
    /// matched operand (e.g. a comparison folding to the 1-bit boolean
    /// `1`).
    pub fn sized_literal(value: i128, bits: u32) -> Directive {
        Directive(Arc::new(DirectiveNode {
            kind: DirectiveKind::SizedLiteral { value, bits },
            signature: ExpressionSignature::wildcard(),
        }))
    }

    /// A replacement-only literal sized to match `tag`'s bound width (see
    /// `DirectiveKind::LiteralLike`). Only valid on a rule's `to` side —
    /// `fast_match` never matches against it, so its signature is an
    /// unreachable placeholder.
    pub fn literal_like(tag: &'static str, value: i128) -> Directive {
        Directive(Arc::new(DirectiveNode {
            kind: DirectiveKind::LiteralLike { tag, value },
            signature: ExpressionSignature::wildcard(),
        }))
    }

    /// Shorthand for `literal_like(tag, 0)`.
    pub fn zero_like(tag: &'static str) -> Directive {
        Self::literal_like(tag, 0)
    }

    /// A unary `Op` pattern. Fails to match anything but a unary node with
    /// this operator.
    pub fn unary(operator: Operator, rhs: Directive) -> Directive {
        let signature = ExpressionSignature::unary(operator, rhs.signature());
        Directive(Arc::new(DirectiveNode {
            kind: DirectiveKind::Unary { operator, rhs },
            signature,
        }))
    }

    /// A binary `Op` pattern.
    pub fn binary(operator: Operator, lhs: Directive, rhs: Directive) -> Directive {
        let signature = ExpressionSignature::binary(operator, lhs.signature(), rhs.signature());
        Directive(Arc::new(DirectiveNode {
            kind: DirectiveKind::Binary { operator, lhs, rhs },
            signature,
        }))
    }

    /// Attaches a side condition to `body` (see `DirectiveKind::Iff`).
    pub fn iff(condition: Directive, body: Directive) -> Directive {
        let signature = ExpressionSignature::of_iff_body(body.signature());
        Directive(Arc::new(DirectiveNode {
            kind: DirectiveKind::Iff { condition, body },
            signature,
        }))
    }

    /// The precomputed fast-reject fingerprint for this pattern.
    pub fn signature(&self) -> &ExpressionSignature {
        &self.0.signature
    }

    /// Whether this directive is a capture variable.
    pub fn is_capture(&self) -> bool {
        matches!(self.0.kind, DirectiveKind::Capture { .. })
    }

    /// The tag and kind, if this directive is a capture variable.
    pub fn as_capture(&self) -> Option<(&'static str, CaptureKind)> {
        match &self.0.kind {
            DirectiveKind::Capture { tag, kind } => Some((*tag, *kind)),
            _ => None,
        }
    }

    /// The signed value, if this directive is a width-agnostic literal
    /// predicate.
    pub fn as_literal(&self) -> Option<i128> {
        match &self.0.kind {
            DirectiveKind::Literal(v) => Some(*v),
            _ => None,
        }
    }

    /// The tag and value, if this directive is a `literal_like` to-side
    /// placeholder.
    pub fn as_literal_like(&self) -> Option<(&'static str, i128)> {
        match &self.0.kind {
            DirectiveKind::LiteralLike { tag, value } => Some((*tag, *value)),
            _ => None,
        }
    }

    /// The value and bit width, if this directive is a `sized_literal`.
    pub fn as_sized_literal(&self) -> Option<(i128, u32)> {
        match &self.0.kind {
            DirectiveKind::SizedLiteral { value, bits } => Some((*value, *bits)),
            _ => None,
        }
    }

    /// The operator, if this directive is a unary or binary `Op` pattern.
    pub fn operator(&self) -> Option<Operator> {
        match &self.0.kind {
            DirectiveKind::Unary { operator, .. } | DirectiveKind::Binary { operator, .. } => {
                Some(*operator)
            }
            _ => None,
        }
    }

    /// The left child, present only for a binary `Op` pattern.
    pub fn lhs(&self) -> Option<&Directive> {
        match &self.0.kind {
            DirectiveKind::Binary { lhs, .. } => Some(lhs),
            _ => None,
        }
    }

    /// The right child, present for both unary and binary `Op` patterns.
    pub fn rhs(&self) -> Option<&Directive> {
        match &self.0.kind {
            DirectiveKind::Unary { rhs, .. } | DirectiveKind::Binary { rhs, .. } => Some(rhs),
            _ => None,
        }
    }

    /// The condition and body, if this directive is an `Iff`.
    pub fn as_iff(&self) -> Option<(&Directive, &Directive)> {
        match &self.0.kind {
            DirectiveKind::Iff { condition, body } => Some((condition, body)),
            _ => None,
        }
    }
}
