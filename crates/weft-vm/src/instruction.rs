use std::sync::Arc;

use crate::opcode::Opcode;
use crate::value::Value;

/// An immutable compiled instruction sequence, terminated by RETURN.
///
/// Cloning is cheap. A body's identity is the address of its first cell,
/// which the vocabulary uses for reverse lookup.
pub type Code = Arc<[Instruction]>;

/// Address of a body's first cell.
pub fn code_entry(code: &Code) -> usize {
    code.as_ptr() as usize
}

/// One cell of threaded code.
///
/// Parameter cells are only meaningful through the opcode cell before them:
/// a `Literal` follows LITERAL, an `Offset` follows BRANCH or 0BRANCH, a
/// `Callee` follows CALL. Offsets are relative to the cell immediately
/// after the offset cell.
#[derive(Clone, Debug)]
pub enum Instruction {
    /// A primitive opcode.
    Op(Opcode),
    /// Parameter cell: a boxed value to push.
    Literal(Value),
    /// Parameter cell: a signed branch offset.
    Offset(i32),
    /// Parameter cell: entry of the callee's body.
    Callee(Code),
}

impl PartialEq for Instruction {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Instruction::Op(a), Instruction::Op(b)) => a == b,
            (Instruction::Literal(a), Instruction::Literal(b)) => a == b,
            (Instruction::Offset(a), Instruction::Offset(b)) => a == b,
            (Instruction::Callee(a), Instruction::Callee(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
