//! The expression DAG: an immutable, hash-consed symbolic expression tree.
//!
//! Every `Expression` is a cheap `Arc` clone of a canonical, pool-interned
//! node (see `pool`); structurally equal subtrees are always the same
//! allocation, so equality and hashing are O(1) pointer operations. Nodes
//! are built leaves-first, so a parent's hash, depth, complexity, and
//! signature are derived from already-computed child fields rather than by
//! re-walking the subtree.

mod pool;
pub mod signature;

use core::fmt;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::bits;
use crate::constant::Constant;
use crate::error::{SymExError, SymExResult};
use crate::operator::Operator;
use crate::uid::UniqueIdentifier;

pub use signature::ExpressionSignature;

#[derive(Debug)]
enum NodeData {
    Constant(Constant),
    Variable(UniqueIdentifier),
    Unary {
        operator: Operator,
        rhs: Expression,
    },
    Binary {
        operator: Operator,
        lhs: Expression,
        rhs: Expression,
    },
}

#[derive(Debug)]
struct ExprNode {
    data: NodeData,
    depth: u32,
    complexity: u32,
    hash: u64,
    signature: ExpressionSignature,
    bit_count: u32,
    simplify_hint: AtomicBool,
    is_lazy: bool,
}

/// A shared handle to an interned expression node. Cloning is an `Arc`
/// refcount bump, not a deep copy.
#[derive(Clone, Debug)]
pub struct Expression(Arc<ExprNode>);

impl Expression {
    /// Builds a constant leaf.
    pub fn constant(value: Constant) -> Expression {
        let mut hasher = DefaultHasher::new();
        0u8.hash(&mut hasher);
        value.hash(&mut hasher);
        let hash = hasher.finish();
        let signature = ExpressionSignature::leaf_constant(hash);
        let node = ExprNode {
            data: NodeData::Constant(value),
            depth: 0,
            complexity: 0,
            hash,
            signature,
            bit_count: value.bit_count(),
            simplify_hint: AtomicBool::new(false),
            is_lazy: true,
        };
        pool::intern(node)
    }

    /// Builds a variable leaf of the default 64-bit width. Rejects a
    /// numeric identifier: spec §4.D requires variable leaves to carry a
    /// string uid.
    pub fn variable(uid: UniqueIdentifier) -> SymExResult<Expression> {
        Self::variable_sized(uid, 64)
    }

    /// Builds a variable leaf of an explicit bit width — used by the
    /// rewrite pass when lifting a register operand of known width (spec
    /// §4.J's `reg_{id}_{bits}` naming convention bakes the width into the
    /// name itself, so two different widths for "the same" register id
    /// never collide in the hash-consing pool).
    pub fn variable_sized(uid: UniqueIdentifier, bits: u32) -> SymExResult<Expression> {
        if !uid.is_string() {
            return Err(SymExError::Structural(
                "variable leaf requires a named identifier".to_string(),
            ));
        }
        let mut hasher = DefaultHasher::new();
        1u8.hash(&mut hasher);
        uid.hash64().hash(&mut hasher);
        let hash = hasher.finish();
        let signature = ExpressionSignature::leaf_variable(hash);
        let node = ExprNode {
            data: NodeData::Variable(uid),
            depth: 0,
            complexity: 1,
            hash,
            signature,
            bit_count: bits,
            simplify_hint: AtomicBool::new(false),
            is_lazy: true,
        };
        Ok(pool::intern(node))
    }

    /// Builds a unary `Op` node. Fails if `op` is not a unary operator.
    pub fn unary(op: Operator, rhs: Expression) -> SymExResult<Expression> {
        if op == Operator::Invalid {
            return Err(SymExError::Structural(
                "Invalid operator on a non-leaf node".to_string(),
            ));
        }
        if !op.is_unary() {
            return Err(SymExError::Structural(format!(
                "{:?} is not a unary operator",
                op
            )));
        }
        let depth = rhs.depth() + 1;
        let complexity = rhs.complexity() + 1;
        let mut hasher = DefaultHasher::new();
        2u8.hash(&mut hasher);
        op.hash(&mut hasher);
        rhs.hash_value().hash(&mut hasher);
        let hash = hasher.finish();
        let signature = ExpressionSignature::unary(op, rhs.signature());
        let bit_count = result_bit_count(op, None, &rhs);
        let node = ExprNode {
            data: NodeData::Unary { operator: op, rhs },
            depth,
            complexity,
            hash,
            signature,
            bit_count,
            simplify_hint: AtomicBool::new(false),
            is_lazy: true,
        };
        Ok(pool::intern(node))
    }

    /// Builds a binary `Op` node. Fails if `op` is not a binary operator.
    pub fn binary(lhs: Expression, op: Operator, rhs: Expression) -> SymExResult<Expression> {
        if op == Operator::Invalid {
            return Err(SymExError::Structural(
                "Invalid operator on a non-leaf node".to_string(),
            ));
        }
        if !op.is_binary() {
            return Err(SymExError::Structural(format!(
                "{:?} is not a binary operator",
                op
            )));
        }
        let depth = lhs.depth().max(rhs.depth()) + 1;
        let complexity = lhs.complexity() + rhs.complexity() + 1;
        let mut hasher = DefaultHasher::new();
        3u8.hash(&mut hasher);
        op.hash(&mut hasher);
        lhs.hash_value().hash(&mut hasher);
        rhs.hash_value().hash(&mut hasher);
        let hash = hasher.finish();
        let signature = ExpressionSignature::binary(op, lhs.signature(), rhs.signature());
        let bit_count = result_bit_count(op, Some(&lhs), &rhs);
        let node = ExprNode {
            data: NodeData::Binary { operator: op, lhs, rhs },
            depth,
            complexity,
            hash,
            signature,
            bit_count,
            simplify_hint: AtomicBool::new(false),
            is_lazy: true,
        };
        Ok(pool::intern(node))
    }

    // -- accessors --

    /// Whether this node is a constant leaf.
    pub fn is_constant(&self) -> bool {
        matches!(self.0.data, NodeData::Constant(_))
    }

    /// Whether this node is a variable leaf.
    pub fn is_variable(&self) -> bool {
        matches!(self.0.data, NodeData::Variable(_))
    }

    /// Whether this node is a unary or binary `Op` node (i.e. not a leaf).
    pub fn is_operation(&self) -> bool {
        matches!(self.0.data, NodeData::Unary { .. } | NodeData::Binary { .. })
    }

    /// Whether this node is specifically a unary `Op` node.
    pub fn is_unary_op(&self) -> bool {
        matches!(self.0.data, NodeData::Unary { .. })
    }

    /// Whether this node is specifically a binary `Op` node.
    pub fn is_binary_op(&self) -> bool {
        matches!(self.0.data, NodeData::Binary { .. })
    }

    /// The node's operator, or `Invalid` for leaves.
    pub fn operator(&self) -> Operator {
        match &self.0.data {
            NodeData::Constant(_) | NodeData::Variable(_) => Operator::Invalid,
            NodeData::Unary { operator, .. } | NodeData::Binary { operator, .. } => *operator,
        }
    }

    /// The left child, present only for binary operations.
    pub fn lhs(&self) -> Option<&Expression> {
        match &self.0.data {
            NodeData::Binary { lhs, .. } => Some(lhs),
            _ => None,
        }
    }

    /// The right child, present for both unary and binary operations.
    pub fn rhs(&self) -> Option<&Expression> {
        match &self.0.data {
            NodeData::Unary { rhs, .. } | NodeData::Binary { rhs, .. } => Some(rhs),
            _ => None,
        }
    }

    /// 0 for leaves, 1 for a unary op, 2 for a binary op.
    pub fn operand_count(&self) -> usize {
        match &self.0.data {
            NodeData::Constant(_) | NodeData::Variable(_) => 0,
            NodeData::Unary { .. } => 1,
            NodeData::Binary { .. } => 2,
        }
    }

    /// The constant this node holds, or `None` if it isn't a constant leaf.
    pub fn as_constant(&self) -> Option<&Constant> {
        match &self.0.data {
            NodeData::Constant(c) => Some(c),
            _ => None,
        }
    }

    /// The identifier this node holds, or `None` if it isn't a variable leaf.
    pub fn as_variable(&self) -> Option<&UniqueIdentifier> {
        match &self.0.data {
            NodeData::Variable(u) => Some(u),
            _ => None,
        }
    }

    /// The precomputed subtree depth: 0 for a leaf, otherwise one more than
    /// the deepest child.
    pub fn depth(&self) -> u32 {
        self.0.depth
    }

    /// The precomputed node-count complexity (spec §4.I): 0 for a constant,
    /// 1 for a variable, otherwise one more than the sum of the children's.
    pub fn complexity(&self) -> u32 {
        self.0.complexity
    }

    /// The bit width this node evaluates at.
    pub fn bit_count(&self) -> u32 {
        self.0.bit_count
    }

    /// The precomputed structural hash. O(1): never re-walks the subtree.
    pub fn hash_value(&self) -> u64 {
        self.0.hash
    }

    /// The precomputed fast-reject fingerprint used by `matcher::fast_match`.
    pub fn signature(&self) -> &ExpressionSignature {
        &self.0.signature
    }

    /// Whether this exact node has already been run through the simplifier
    /// and found to be its own fixed point. Shared process-wide: setting it
    /// on one handle is visible through every other handle to the same
    /// interned node.
    pub fn simplify_hint(&self) -> bool {
        self.0.simplify_hint.load(Ordering::Acquire)
    }

    pub(crate) fn set_simplify_hint(&self) {
        self.0.simplify_hint.store(true, Ordering::Release);
    }

    /// Always `true`: this crate never implicitly simplifies inside a
    /// constructor (simplification is always an explicit `Simplifier::run`
    /// call), so every node is "lazy" with respect to construction. The
    /// accessor is kept to round out the node shape described in spec §3.
    pub fn is_lazy(&self) -> bool {
        self.0.is_lazy
    }

    /// Identity comparison only — two `Expression`s pointing at the same
    /// interned node. Structural equality additionally falls back to field
    /// comparison in `PartialEq`, but since hash-consing is exhaustive
    /// (every constructor interns), `ptr_eq` already captures it for any
    /// node actually built through this module's constructors.
    pub fn ptr_eq(a: &Expression, b: &Expression) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    fn node_ptr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Identity key for the simplifier's memoization cache (`simplify.rs`).
    /// Two handles to the same interned node always produce the same key;
    /// structurally-equal-but-differently-shaped construction paths can't
    /// happen since every constructor interns through `pool::intern`.
    pub(crate) fn cache_key(&self) -> usize {
        self.node_ptr()
    }

    /// Whether `name` occurs as a variable identifier anywhere in this
    /// subtree. Walks the DAG respecting sharing (a visited set keyed by
    /// node identity) so a diamond-shaped tree is visited once per node.
    pub fn contains_variable(&self, name: &str) -> bool {
        let mut visited = HashSet::new();
        self.contains_variable_rec(name, &mut visited)
    }

    fn contains_variable_rec(&self, name: &str, visited: &mut HashSet<usize>) -> bool {
        if !visited.insert(self.node_ptr()) {
            return false;
        }
        match &self.0.data {
            NodeData::Constant(_) => false,
            NodeData::Variable(uid) => uid.as_name() == Some(name),
            NodeData::Unary { rhs, .. } => rhs.contains_variable_rec(name, visited),
            NodeData::Binary { lhs, rhs, .. } => {
                lhs.contains_variable_rec(name, visited)
                    || rhs.contains_variable_rec(name, visited)
            }
        }
    }

    /// Whether any variable occurs anywhere in this subtree.
    pub fn contains_variables(&self) -> bool {
        let mut visited = HashSet::new();
        self.contains_variables_rec(&mut visited)
    }

    fn contains_variables_rec(&self, visited: &mut HashSet<usize>) -> bool {
        if !visited.insert(self.node_ptr()) {
            return false;
        }
        match &self.0.data {
            NodeData::Constant(_) => false,
            NodeData::Variable(_) => true,
            NodeData::Unary { rhs, .. } => rhs.contains_variables_rec(visited),
            NodeData::Binary { lhs, rhs, .. } => {
                lhs.contains_variables_rec(visited) || rhs.contains_variables_rec(visited)
            }
        }
    }

    /// Replaces every variable leaf named `name` with `replacement`,
    /// leaving every other node structurally identical (constants return
    /// themselves unchanged). Memoized over node identity so a shared
    /// subtree is rebuilt once, not once per occurrence.
    pub fn substitute(&self, name: &str, replacement: &Expression) -> SymExResult<Expression> {
        let mut memo = std::collections::HashMap::new();
        self.substitute_rec(name, replacement, &mut memo)
    }

    fn substitute_rec(
        &self,
        name: &str,
        replacement: &Expression,
        memo: &mut std::collections::HashMap<usize, Expression>,
    ) -> SymExResult<Expression> {
        let key = self.node_ptr();
        if let Some(cached) = memo.get(&key) {
            return Ok(cached.clone());
        }
        let result = match &self.0.data {
            NodeData::Constant(_) => self.clone(),
            NodeData::Variable(uid) => {
                if uid.as_name() == Some(name) {
                    replacement.clone()
                } else {
                    self.clone()
                }
            }
            NodeData::Unary { operator, rhs } => {
                let new_rhs = rhs.substitute_rec(name, replacement, memo)?;
                if Expression::ptr_eq(&new_rhs, rhs) {
                    self.clone()
                } else {
                    Expression::unary(*operator, new_rhs)?
                }
            }
            NodeData::Binary { operator, lhs, rhs } => {
                let new_lhs = lhs.substitute_rec(name, replacement, memo)?;
                let new_rhs = rhs.substitute_rec(name, replacement, memo)?;
                if Expression::ptr_eq(&new_lhs, lhs) && Expression::ptr_eq(&new_rhs, rhs) {
                    self.clone()
                } else {
                    Expression::binary(new_lhs, *operator, new_rhs)?
                }
            }
        };
        memo.insert(key, result.clone());
        Ok(result)
    }

    /// Closed-form evaluation of a variable-free tree. Division/remainder
    /// by zero return zero rather than failing (spec §9, preserved as a
    /// documented total semantics). Shift amounts outside `0..512` return
    /// zero. Operators outside the evaluable set (memory, control) fail
    /// with `EvaluationUnavailable`.
    pub fn evaluate(&self) -> SymExResult<Constant> {
        if self.contains_variables() {
            return Err(SymExError::EvaluationUnavailable(
                "tree contains variables".to_string(),
            ));
        }
        self.evaluate_rec()
    }

    fn evaluate_rec(&self) -> SymExResult<Constant> {
        match &self.0.data {
            NodeData::Constant(c) => Ok(*c),
            NodeData::Variable(_) => Err(SymExError::EvaluationUnavailable(
                "unexpected variable".to_string(),
            )),
            NodeData::Unary { operator, rhs } => evaluate_unary(*operator, rhs),
            NodeData::Binary { operator, lhs, rhs } => evaluate_binary(*operator, lhs, rhs),
        }
    }

    /// Re-tags this expression at a new bit width. A constant is
    /// truncated/extended directly; anything else is wrapped in a
    /// `cast`/`ucast` node whose right child encodes the target width.
    pub fn resize(&self, new_bits: u32, sign_extend: bool) -> SymExResult<Expression> {
        if let Some(c) = self.as_constant() {
            return Ok(Expression::constant(c.resize(new_bits, sign_extend)?));
        }
        let width = Expression::constant(Constant::new(new_bits as u64, 32)?);
        let op = if sign_extend {
            Operator::Cast
        } else {
            Operator::UCast
        };
        Expression::binary(self.clone(), op, width)
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        Expression::ptr_eq(self, other) || self.hash_value() == other.hash_value() && {
            match (&self.0.data, &other.0.data) {
                (NodeData::Constant(a), NodeData::Constant(b)) => a == b,
                (NodeData::Variable(a), NodeData::Variable(b)) => a == b,
                (
                    NodeData::Unary { operator: oa, rhs: ra },
                    NodeData::Unary { operator: ob, rhs: rb },
                ) => oa == ob && ra == rb,
                (
                    NodeData::Binary { operator: oa, lhs: la, rhs: ra },
                    NodeData::Binary { operator: ob, lhs: lb, rhs: rb },
                ) => oa == ob && la == lb && ra == rb,
                _ => false,
            }
        }
    }
}

impl Eq for Expression {}

impl Hash for Expression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_value().hash(state);
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.data {
            NodeData::Constant(c) => write!(f, "{}", c.value()),
            NodeData::Variable(uid) => write!(f, "{}", uid),
            NodeData::Unary { operator, rhs } => write!(f, "{}({})", operator.name(), rhs),
            NodeData::Binary { operator, lhs, rhs } => {
                write!(f, "({} {} {})", lhs, operator.name(), rhs)
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn pool_len_for_tests() -> usize {
    pool::pool_len_for_tests()
}

fn result_bit_count(operator: Operator, lhs: Option<&Expression>, rhs: &Expression) -> u32 {
    use Operator::*;
    match operator {
        Eq | Ne | Lt | Le | Gt | Ge | Ult | Ule | Ugt | Uge | LNot | LAnd | LOr | BitTest => 1,
        Cast | UCast => rhs
            .as_constant()
            .and_then(|c| c.value_u64())
            .map(|v| v as u32)
            .filter(|&b| b > 0 && b <= crate::constant::MAX_BITS)
            .unwrap_or_else(|| lhs.map(Expression::bit_count).unwrap_or_else(|| rhs.bit_count())),
        Mask => lhs.map(Expression::bit_count).unwrap_or_else(|| rhs.bit_count()),
        ValueIf => rhs.bit_count(),
        _ => lhs
            .map(|l| l.bit_count().max(rhs.bit_count()))
            .unwrap_or_else(|| rhs.bit_count()),
    }
}

fn evaluate_unary(operator: Operator, rhs: &Expression) -> SymExResult<Constant> {
    let r = rhs.evaluate_rec()?;
    let bits = rhs.bit_count().max(1);
    use Operator::*;
    match operator {
        Not => Constant::from_u128(!r.value() & bits::zero_extend_mask(bits), bits),
        Neg => Constant::from_u128(
            (r.value().wrapping_neg()) & bits::zero_extend_mask(bits),
            bits,
        ),
        LNot => Constant::new(if r.is_zero() { 1 } else { 0 }, 1),
        Popcnt => Constant::new(r.value().count_ones() as u64, bits),
        Bsf => {
            let v = r.value_u64().unwrap_or(0);
            Constant::new(bits::bit_scan_forward(v).max(-1) as i64 as u64, bits)
        }
        Bsr => {
            let v = r.value_u64().unwrap_or(0);
            Constant::new(bits::bit_scan_reverse(v).max(-1) as i64 as u64, bits)
        }
        BitCount => Constant::new(bits as u64, bits),
        _ => Err(SymExError::EvaluationUnavailable(format!(
            "{:?} is not evaluable",
            operator
        ))),
    }
}

fn evaluate_binary(operator: Operator, lhs: &Expression, rhs: &Expression) -> SymExResult<Constant> {
    let l = lhs.evaluate_rec()?;
    let r = rhs.evaluate_rec()?;
    let bits = lhs.bit_count().max(rhs.bit_count()).max(1);
    let m = bits::zero_extend_mask(bits);
    use Operator::*;
    let bool_const = |b: bool| Constant::new(if b { 1 } else { 0 }, 1);
    match operator {
        And => Constant::from_u128(l.value() & r.value() & m, bits),
        Or => Constant::from_u128((l.value() | r.value()) & m, bits),
        Xor => Constant::from_u128((l.value() ^ r.value()) & m, bits),
        Shl => shift_amount(&r).map_or(Constant::new(0, bits), |n| {
            Constant::from_u128((l.value() << n.min(127)) & m, bits)
        }),
        Shr => shift_amount(&r).map_or(Constant::new(0, bits), |n| {
            Constant::from_u128((l.value() >> n.min(127)) & m, bits)
        }),
        Rol => Ok(Constant::new(
            bits::rotate_left(l.value_u64().unwrap_or(0), r.value_u64().unwrap_or(0) as u32, bits.min(64)),
            bits.min(64),
        )?),
        Ror => Ok(Constant::new(
            bits::rotate_right(l.value_u64().unwrap_or(0), r.value_u64().unwrap_or(0) as u32, bits.min(64)),
            bits.min(64),
        )?),
        Add => Constant::from_u128(l.value().wrapping_add(r.value()) & m, bits),
        Sub => Constant::from_u128(l.value().wrapping_sub(r.value()) & m, bits),
        Mul | UMul => Constant::from_u128(l.value().wrapping_mul(r.value()) & m, bits),
        Div => {
            if r.is_zero() {
                Constant::new(0, bits)
            } else {
                Constant::from_u128(((l.signed_value() / r.signed_value()) as u128) & m, bits)
            }
        }
        UDiv => {
            if r.is_zero() {
                Constant::new(0, bits)
            } else {
                Constant::from_u128((l.value() / r.value()) & m, bits)
            }
        }
        Rem => {
            if r.is_zero() {
                Constant::new(0, bits)
            } else {
                Constant::from_u128(((l.signed_value() % r.signed_value()) as u128) & m, bits)
            }
        }
        URem => {
            if r.is_zero() {
                Constant::new(0, bits)
            } else {
                Constant::from_u128((l.value() % r.value()) & m, bits)
            }
        }
        MulHi => {
            let product = (l.signed_value() as i128).wrapping_mul(r.signed_value() as i128);
            Constant::from_u128(((product >> bits.min(64)) as u128) & m, bits)
        }
        UMulHi => {
            let product = l.value().wrapping_mul(r.value());
            Constant::from_u128((product >> bits.min(64).max(1)) & m, bits)
        }
        Eq => bool_const(l == r),
        Ne => bool_const(l != r),
        Lt => bool_const(l.signed_value() < r.signed_value()),
        Le => bool_const(l.signed_value() <= r.signed_value()),
        Gt => bool_const(l.signed_value() > r.signed_value()),
        Ge => bool_const(l.signed_value() >= r.signed_value()),
        Ult => bool_const(l.value() < r.value()),
        Ule => bool_const(l.value() <= r.value()),
        Ugt => bool_const(l.value() > r.value()),
        Uge => bool_const(l.value() >= r.value()),
        LAnd => bool_const(!l.is_zero() && !r.is_zero()),
        LOr => bool_const(!l.is_zero() || !r.is_zero()),
        Max => Ok(if l.signed_value() >= r.signed_value() { l } else { r }),
        Min => Ok(if l.signed_value() <= r.signed_value() { l } else { r }),
        UMax => Ok(if l.value() >= r.value() { l } else { r }),
        UMin => Ok(if l.value() <= r.value() { l } else { r }),
        BitTest => bool_const(bits::bit_test(l.value_u64().unwrap_or(0), r.value_u64().unwrap_or(0) as u32)),
        Mask => Constant::from_u128(l.value() & bits::zero_extend_mask(r.value_u64().unwrap_or(0) as u32), l.bit_count()),
        BitCount => Constant::new(l.bit_count() as u64, l.bit_count()),
        ValueIf => {
            if l.is_zero() {
                Constant::new(0, r.bit_count())
            } else {
                Ok(r)
            }
        }
        Cast => Ok(l.resize(r.value_u64().unwrap_or(l.bit_count() as u64) as u32, true)?),
        UCast => Ok(l.resize(r.value_u64().unwrap_or(l.bit_count() as u64) as u32, false)?),
        _ => Err(SymExError::EvaluationUnavailable(format!(
            "{:?} is not evaluable",
            operator
        ))),
    }
}

/// A shift/rotate amount outside `0..512` is treated as out-of-range and
/// the caller returns zero, per spec §4.D.
fn shift_amount(amount: &Constant) -> Option<u32> {
    let signed = amount.signed_value();
    if signed < 0 || signed >= 512 {
        None
    } else {
        Some(signed as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Expression {
        Expression::variable(UniqueIdentifier::name(name)).unwrap()
    }

    fn konst(v: u64, bits: u32) -> Expression {
        Expression::constant(Constant::new(v, bits).unwrap())
    }

    #[test]
    fn structurally_equal_subtrees_are_the_same_node() {
        let a = Expression::binary(var("x"), Operator::Add, konst(0, 64)).unwrap();
        let b = Expression::binary(var("x"), Operator::Add, konst(0, 64)).unwrap();
        assert!(Expression::ptr_eq(&a, &b));
        assert_eq!(a.hash_value(), b.hash_value());
    }

    #[test]
    fn depth_and_complexity_are_derived() {
        let leaf = var("x");
        assert_eq!(leaf.depth(), 0);
        assert_eq!(leaf.complexity(), 1);
        let k = konst(5, 64);
        assert_eq!(k.complexity(), 0);

        let add = Expression::binary(leaf.clone(), Operator::Add, k.clone()).unwrap();
        assert_eq!(add.depth(), 1);
        assert_eq!(add.complexity(), 2);
    }

    #[test]
    fn rejects_invalid_operator_shapes() {
        assert!(Expression::unary(Operator::Add, konst(1, 64)).is_err());
        assert!(Expression::binary(konst(1, 64), Operator::Not, konst(1, 64)).is_err());
    }

    #[test]
    fn contains_variable_respects_sharing() {
        let x = var("x");
        let shared = Expression::binary(x.clone(), Operator::Add, x.clone()).unwrap();
        let top = Expression::binary(shared.clone(), Operator::Mul, shared).unwrap();
        assert!(top.contains_variable("x"));
        assert!(!top.contains_variable("y"));
    }

    #[test]
    fn substitute_replaces_only_named_variable() {
        let expr = Expression::binary(var("x"), Operator::Add, var("y")).unwrap();
        let replaced = expr.substitute("x", &konst(7, 64)).unwrap();
        assert!(!replaced.contains_variable("x"));
        assert!(replaced.contains_variable("y"));
    }

    #[test]
    fn evaluate_closed_form() {
        let expr = Expression::binary(konst(10, 64), Operator::Add, konst(20, 64)).unwrap();
        let result = expr.evaluate().unwrap();
        assert_eq!(result.value(), 30);
    }

    #[test]
    fn evaluate_rejects_variables() {
        let expr = Expression::binary(var("x"), Operator::Add, konst(1, 64)).unwrap();
        assert!(expr.evaluate().is_err());
    }

    #[test]
    fn division_by_zero_is_zero_not_error() {
        let expr = Expression::binary(konst(10, 64), Operator::UDiv, konst(0, 64)).unwrap();
        assert_eq!(expr.evaluate().unwrap().value(), 0);
    }

    #[test]
    fn resize_wraps_non_constants_in_cast() {
        let x = var("x");
        let resized = x.resize(32, true).unwrap();
        assert_eq!(resized.operator(), Operator::Cast);
    }

    #[test]
    fn resize_truncates_constants_directly() {
        let k = konst(0x1234, 16);
        let resized = k.resize(8, false).unwrap();
        assert!(resized.is_constant());
        assert_eq!(resized.as_constant().unwrap().value(), 0x34);
    }

    #[test]
    fn display_matches_pretty_printer_shape() {
        let expr = Expression::binary(var("x"), Operator::Add, konst(0, 64)).unwrap();
        assert_eq!(format!("{}", expr), "(x + 0)");
        let unary = Expression::unary(Operator::Not, var("x")).unwrap();
        assert_eq!(format!("{}", unary), "~(x)");
    }
}
