//! Walking compiled bodies back into operation references.

use weft_core::{Diagnostic, ErrorCode, Span};
use weft_vm::{Code, Instruction, Opcode, Vocabulary};

use crate::opref::OpRef;

/// Recover the operation reference whose opcode cell is at `index`.
///
/// Fails when the cell is a parameter cell, when a parameter cell is
/// missing, or when a callee is not registered in the vocabulary.
fn ref_at(vocab: &Vocabulary, code: &Code, index: usize) -> Result<OpRef, Diagnostic> {
    let cell = code
        .get(index)
        .ok_or_else(|| walk_error("walked past the end of the definition"))?;
    let Instruction::Op(opcode) = cell else {
        return Err(walk_error("not an opcode cell"));
    };
    match opcode {
        Opcode::Call => match code.get(index + 1) {
            Some(Instruction::Callee(callee)) => match vocab.op_at_entry(callee) {
                Some(op) => Ok(OpRef::new(op.clone())),
                None => Err(Diagnostic::error(ErrorCode::E100, Span::DUMMY)
                    .message("callee is not registered in the vocabulary")
                    .build()),
            },
            _ => Err(walk_error("CALL without a callee cell")),
        },
        Opcode::Literal => match code.get(index + 1) {
            Some(Instruction::Literal(value)) => Ok(OpRef::with_literal(
                vocab.primitive(Opcode::Literal),
                value.clone(),
            )),
            _ => Err(walk_error("LITERAL without a value cell")),
        },
        Opcode::Branch | Opcode::ZBranch => match code.get(index + 1) {
            Some(Instruction::Offset(offset)) => {
                Ok(OpRef::with_offset(vocab.primitive(*opcode), *offset))
            }
            _ => Err(walk_error("branch without an offset cell")),
        },
        opcode => Ok(OpRef::new(vocab.primitive(*opcode))),
    }
}

/// Disassemble an entire compiled body, starting from its first cell.
///
/// The result reproduces what the compiler emitted, in order, including
/// the trailing RETURN; the walk stops at the first RETURN it meets.
pub fn disassemble_word(vocab: &Vocabulary, code: &Code) -> Result<Vec<OpRef>, Diagnostic> {
    let mut refs = Vec::new();
    let mut index = 0;
    loop {
        let opref = ref_at(vocab, code, index)?;
        let done = opref.op().opcode() == Some(Opcode::Return);
        index += opref.width();
        refs.push(opref);
        if done {
            return Ok(refs);
        }
    }
}

/// The reference at `index`, or, if `index` points into a parameter cell,
/// the reference owning that parameter. `None` when neither reading works.
pub fn disassemble_at(vocab: &Vocabulary, code: &Code, index: usize) -> Option<OpRef> {
    if let Ok(opref) = ref_at(vocab, code, index) {
        return Some(opref);
    }
    if index > 0
        && let Ok(opref) = ref_at(vocab, code, index - 1)
        && opref.width() == 2
    {
        return Some(opref);
    }
    None
}

fn walk_error(message: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E203, Span::DUMMY)
        .message(format!("disassembly failed: {}", message))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::Compiler;
    use crate::opref::Param;
    use weft_vm::Value;

    #[test]
    fn round_trips_a_straight_line_body() {
        let mut vocab = Vocabulary::new();
        let mut compiler = Compiler::new();
        compiler.parse(&vocab, "3 -4 -", true).unwrap();
        let op = compiler.finish(&mut vocab).unwrap();

        let refs = disassemble_word(&vocab, op.code().unwrap()).unwrap();
        let expected = vec![
            OpRef::literal(Value::num(3.0)),
            OpRef::literal(Value::num(-4.0)),
            OpRef::primitive(Opcode::Minus),
            OpRef::primitive(Opcode::Return),
        ];
        assert_eq!(refs, expected);
    }

    #[test]
    fn round_trips_branches_with_offsets() {
        let mut vocab = Vocabulary::new();
        let mut compiler = Compiler::new();
        compiler
            .parse(&vocab, "53 DUP 13 >= 0BRANCH 5 13 - BRANCH -11", true)
            .unwrap();
        let op = compiler.finish(&mut vocab).unwrap();

        let refs = disassemble_word(&vocab, op.code().unwrap()).unwrap();
        assert_eq!(refs[4].op().opcode(), Some(Opcode::ZBranch));
        assert_eq!(refs[4].param(), &Param::Offset(5));
        assert_eq!(refs[7].op().opcode(), Some(Opcode::Branch));
        assert_eq!(refs[7].param(), &Param::Offset(-11));
        assert_eq!(refs.last().unwrap(), &OpRef::primitive(Opcode::Return));
    }

    #[test]
    fn resolves_callees_through_the_vocabulary() {
        let mut vocab = Vocabulary::new();
        let mut inner = Compiler::named("DOUBLE");
        inner.parse(&vocab, "DUP +", true).unwrap();
        let inner = inner.finish(&mut vocab).unwrap();

        let mut outer = Compiler::new();
        outer.parse(&vocab, "21 DOUBLE", true).unwrap();
        let outer = outer.finish(&mut vocab).unwrap();

        let refs = disassemble_word(&vocab, outer.code().unwrap()).unwrap();
        assert_eq!(refs[1].op().name(), Some("DOUBLE"));
        assert_eq!(refs[1], OpRef::new(inner));
    }

    #[test]
    fn parameter_cells_resolve_to_their_owner() {
        let mut vocab = Vocabulary::new();
        let mut compiler = Compiler::new();
        compiler.parse(&vocab, "42 DUP", true).unwrap();
        let op = compiler.finish(&mut vocab).unwrap();
        let code = op.code().unwrap();

        // Cell 1 is the literal's value cell.
        let owner = disassemble_at(&vocab, code, 1).unwrap();
        assert_eq!(owner, OpRef::literal(Value::num(42.0)));
        // Cell 2 is DUP itself.
        let direct = disassemble_at(&vocab, code, 2).unwrap();
        assert_eq!(direct, OpRef::primitive(Opcode::Dup));
        // Past the end resolves to nothing.
        assert_eq!(disassemble_at(&vocab, code, code.len() + 1), None);
    }

    #[test]
    fn unregistered_callees_fail() {
        use std::sync::Arc;
        use weft_vm::Instruction;

        let vocab = Vocabulary::new();
        // A CALL to a body the vocabulary never saw.
        let stray: Code = Arc::from(vec![Instruction::Op(Opcode::Return)]);
        let code: Code = Arc::from(vec![
            Instruction::Op(Opcode::Call),
            Instruction::Callee(stray),
            Instruction::Op(Opcode::Return),
        ]);
        let err = disassemble_word(&vocab, &code).unwrap_err();
        assert_eq!(err.code(), ErrorCode::E100);
    }
}
