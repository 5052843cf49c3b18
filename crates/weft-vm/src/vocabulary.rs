use std::collections::HashMap;
use std::sync::Arc;

use crate::instruction::{Code, code_entry};
use crate::op::Op;
use crate::opcode::Opcode;

/// The name table: every known operation, looked up by name during parsing
/// and by body entry address during disassembly.
///
/// One vocabulary serves a whole process. It is threaded explicitly through
/// the compiler and disassembler; Rust's borrows enforce the single-writer,
/// multiple-reader discipline (`&mut self` to define, `&self` to read).
pub struct Vocabulary {
    by_name: HashMap<String, Arc<Op>>,
    by_entry: HashMap<usize, Arc<Op>>,
    primitives: Vec<Arc<Op>>,
}

impl Vocabulary {
    /// A vocabulary pre-loaded with every primitive.
    pub fn new() -> Self {
        let mut vocab = Self {
            by_name: HashMap::new(),
            by_entry: HashMap::new(),
            primitives: Vec::with_capacity(Opcode::ALL.len()),
        };
        for opcode in Opcode::ALL {
            let op = Arc::new(Op::primitive(opcode));
            vocab.by_name.insert(opcode.forth_name().to_string(), op.clone());
            vocab.primitives.push(op);
        }
        vocab
    }

    /// Install a finished descriptor and return the shared handle.
    ///
    /// A named op shadows any earlier binding of the same name; the old
    /// descriptor stays reachable through reverse lookup, since compiled
    /// callers still point at its body. Anonymous ops get no name binding
    /// but are still reverse-lookupable.
    pub fn define(&mut self, op: Op) -> Arc<Op> {
        let op = Arc::new(op);
        if let Some(code) = op.code() {
            self.by_entry.insert(code_entry(code), op.clone());
        }
        if let Some(name) = op.name() {
            self.by_name.insert(name.to_string(), op.clone());
        }
        op
    }

    /// Look up an operation by its source-text name. Case-sensitive.
    pub fn lookup(&self, name: &str) -> Option<&Arc<Op>> {
        self.by_name.get(name)
    }

    /// Reverse lookup: the operation whose body starts at this code's
    /// entry cell.
    pub fn op_at_entry(&self, code: &Code) -> Option<&Arc<Op>> {
        self.by_entry.get(&code_entry(code))
    }

    /// The canonical descriptor for a primitive.
    pub fn primitive(&self, opcode: Opcode) -> Arc<Op> {
        self.primitives[opcode as usize].clone()
    }

    /// Number of named entries.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterate over all named entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Op>)> {
        self.by_name.iter().map(|(name, op)| (name.as_str(), op))
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Instruction;
    use weft_core::StackEffect;

    fn return_only() -> Code {
        Arc::from(vec![Instruction::Op(Opcode::Return)])
    }

    #[test]
    fn primitives_are_preinstalled() {
        let vocab = Vocabulary::new();
        assert_eq!(vocab.len(), Opcode::ALL.len());
        let plus = vocab.lookup("+").expect("+ installed");
        assert_eq!(plus.opcode(), Some(Opcode::Plus));
        assert_eq!(vocab.lookup("0BRANCH").unwrap().opcode(), Some(Opcode::ZBranch));
        assert!(vocab.lookup("nope").is_none());
        // Case-sensitive.
        assert!(vocab.lookup("dup").is_none());
    }

    #[test]
    fn primitive_handles_are_canonical() {
        let vocab = Vocabulary::new();
        let a = vocab.primitive(Opcode::Dup);
        let b = vocab.lookup("DUP").unwrap();
        assert!(Arc::ptr_eq(&a, b));
    }

    #[test]
    fn define_installs_both_directions() {
        let mut vocab = Vocabulary::new();
        let code = return_only();
        let op = vocab.define(Op::composed(
            Some("NOP".into()),
            StackEffect::new(0, 0),
            code.clone(),
        ));
        assert!(Arc::ptr_eq(vocab.lookup("NOP").unwrap(), &op));
        assert!(Arc::ptr_eq(vocab.op_at_entry(&code).unwrap(), &op));
    }

    #[test]
    fn anonymous_ops_skip_the_name_table() {
        let mut vocab = Vocabulary::new();
        let before = vocab.len();
        let code = return_only();
        vocab.define(Op::composed(None, StackEffect::new(0, 0), code.clone()));
        assert_eq!(vocab.len(), before);
        assert!(vocab.op_at_entry(&code).is_some());
    }

    #[test]
    fn redefinition_shadows_but_old_body_resolves() {
        let mut vocab = Vocabulary::new();
        let old_code = return_only();
        let old = vocab.define(Op::composed(
            Some("W".into()),
            StackEffect::new(0, 0),
            old_code.clone(),
        ));
        let new_code = return_only();
        let new = vocab.define(Op::composed(
            Some("W".into()),
            StackEffect::new(0, 0),
            new_code.clone(),
        ));
        assert!(Arc::ptr_eq(vocab.lookup("W").unwrap(), &new));
        assert!(Arc::ptr_eq(vocab.op_at_entry(&old_code).unwrap(), &old));
        assert!(Arc::ptr_eq(vocab.op_at_entry(&new_code).unwrap(), &new));
    }
}
