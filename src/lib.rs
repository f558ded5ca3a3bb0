//! A hash-consed symbolic expression engine, a rewrite-rule simplifier, and
//! the symbolic-rewrite optimization pass for VTIL-shaped virtual-machine
//! IR.
//!
//! The pieces compose bottom-up:
//!
//! - [`bits`], [`constant`], [`uid`], [`operator`] are the small closed
//!   primitives everything else is built from.
//! - [`expr`] is the hash-consed `Expression` DAG: every [`expr::Expression`]
//!   handle is a cheap `Clone` of an `Arc` into a process-wide interning
//!   pool, so structurally equal subtrees always share one node.
//! - [`directive`] is the pattern language rules are written in;
//!   [`symtable`] and [`matcher`] bind a directive's captures against a
//!   concrete expression.
//! - [`rules`] holds the three rule tables (`universal`, `joins`,
//!   `boolean`) the simplifier draws from.
//! - [`simplify`] drives all of the above into a bounded, memoized rewrite
//!   loop over one expression at a time.
//! - [`host`] is the minimal host-IR contract (registers, operands,
//!   instructions, basic blocks) the rewrite pass lifts from and lowers
//!   into; [`pass`] is that pass itself.
//!
//! [`error::SymExError`] is the one error type shared by every fallible
//! corner of the crate.
#![deny(missing_docs, trivial_numeric_casts, unused_extern_crates)]
#![warn(unused_import_braces)]
#![cfg_attr(feature = "std", deny(unstable_features))]

pub mod bits;
pub mod constant;
pub mod directive;
pub mod error;
pub mod expr;
pub mod host;
pub mod matcher;
pub mod operator;
pub mod pass;
pub mod rules;
pub mod simplify;
pub mod symtable;
pub mod uid;

pub use crate::constant::Constant;
pub use crate::directive::Directive;
pub use crate::error::{SymExError, SymExResult};
pub use crate::expr::{Expression, ExpressionSignature};
pub use crate::host::{BasicBlock, Instruction, Operand, RegisterDescriptor, Routine};
pub use crate::operator::Operator;
pub use crate::pass::SymbolicRewritePass;
pub use crate::simplify::Simplifier;
pub use crate::symtable::SymbolTable;
pub use crate::uid::UniqueIdentifier;

/// Version number of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
