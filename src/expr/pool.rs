//! The hash-consing pool: a process-wide intern table mapping a node's
//! structural shape to its canonical `Expression`.
//!
//! Children are always interned before their parents (the DAG is acyclic
//! by construction — spec §3 "Ownership and lifecycle"), so a child's
//! `Arc` pointer address is stable for the remainder of the process once
//! interned. That lets the pool key on pointer identity of already-interned
//! children instead of re-hashing whole subtrees on every lookup. The pool
//! never evicts: unlike the simplifier's cache (`simplify.rs`), the spec
//! gives interned nodes process-wide lifetime, so entries live until the
//! process exits.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::constant::Constant;
use crate::operator::Operator;
use crate::uid::UniqueIdentifier;

use super::{Expression, ExprNode, NodeData};

#[derive(Clone, PartialEq, Eq, Hash)]
enum NodeKey {
    Constant(Constant),
    Variable(UniqueIdentifier),
    Unary(Operator, usize),
    Binary(Operator, usize, usize),
}

fn pool() -> &'static Mutex<HashMap<NodeKey, Expression>> {
    static POOL: OnceLock<Mutex<HashMap<NodeKey, Expression>>> = OnceLock::new();
    POOL.get_or_init(|| Mutex::new(HashMap::new()))
}

fn ptr_key(expr: &Expression) -> usize {
    Arc::as_ptr(&expr.0) as usize
}

/// Interns a freshly-built node, returning the canonical shared instance —
/// either `node` itself (first time this shape is seen) or a clone of the
/// `Expression` already interned for an equal shape.
pub(super) fn intern(node: ExprNode) -> Expression {
    let key = match &node.data {
        NodeData::Constant(c) => NodeKey::Constant(*c),
        NodeData::Variable(u) => NodeKey::Variable(u.clone()),
        NodeData::Unary { operator, rhs } => NodeKey::Unary(*operator, ptr_key(rhs)),
        NodeData::Binary { operator, lhs, rhs } => {
            NodeKey::Binary(*operator, ptr_key(lhs), ptr_key(rhs))
        }
    };

    let mut guard = pool().lock().expect("expression pool mutex poisoned");
    if let Some(existing) = guard.get(&key) {
        return existing.clone();
    }
    let interned = Expression(Arc::new(node));
    guard.insert(key, interned.clone());
    interned
}

#[cfg(test)]
pub(crate) fn pool_len_for_tests() -> usize {
    pool().lock().expect("expression pool mutex poisoned").len()
}
