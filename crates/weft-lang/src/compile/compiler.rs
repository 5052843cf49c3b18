use std::sync::Arc;

use weft_core::{Diagnostic, ErrorCode, Span, StackEffect};
use weft_vm::{Code, Instruction, Op, Opcode, ParamKind, Value, Vocabulary};

use super::InstrPos;
use super::control::{ControlEntry, ControlStack, ControlTag};
use super::verify;
use crate::opref::{OpRef, Param};
use crate::tokenizer::{self, TokenKind, Tokenizer};

/// One appended reference and the cell position of its opcode.
pub(crate) struct Slot {
    pub(crate) opref: OpRef,
    pub(crate) pos: InstrPos,
}

/// Assembles one definition from a list of operation references, parsed
/// from source text or appended directly.
///
/// A compiler is created empty, mutated by `add` and `parse`, and consumed
/// exactly once by [`finish`](Compiler::finish), which verifies the stack
/// effect along every control-flow path and freezes the instruction
/// vector. A failed compile leaves the vocabulary untouched.
pub struct Compiler {
    name: Option<String>,
    slots: Vec<Slot>,
    next_pos: usize,
    declared: Option<StackEffect>,
    max_inputs: usize,
    control: ControlStack,
}

impl Compiler {
    /// Start an anonymous definition.
    pub fn new() -> Self {
        Self {
            name: None,
            slots: Vec::new(),
            next_pos: 0,
            declared: None,
            max_inputs: usize::MAX,
            control: ControlStack::new(),
        }
    }

    /// Start a named definition; `finish` will install it under this name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new()
        }
    }

    /// Declare what the stack effect must turn out to be. `finish` fails
    /// if the verified inputs or net differ; a declared effect with a
    /// minimal peak places no peak constraint, an explicit larger peak is
    /// a ceiling. Also caps `max_inputs` at the declared inputs.
    pub fn declare_effect(&mut self, effect: StackEffect) {
        self.declared = Some(effect);
        self.max_inputs = effect.inputs() as usize;
    }

    /// Cap how many values the definition may read from the stack.
    /// Useful in a REPL, where the current stack depth is known.
    pub fn set_max_inputs(&mut self, max_inputs: usize) {
        self.max_inputs = max_inputs;
    }

    /// Append a reference. Returns the position of its opcode cell.
    pub fn add(&mut self, opref: OpRef) -> InstrPos {
        let pos = InstrPos::new(self.next_pos);
        self.next_pos += opref.width();
        self.slots.push(Slot { opref, pos });
        pos
    }

    /// As [`add`](Compiler::add), attaching a source span for diagnostics.
    pub fn add_with_span(&mut self, opref: OpRef, span: Span) -> InstrPos {
        self.add(opref.with_span(span))
    }

    /// The reference previously appended at `pos`.
    pub fn opref_at(&self, pos: InstrPos) -> Option<&OpRef> {
        self.slot_index(pos).map(|i| &self.slots[i].opref)
    }

    /// Position the next `add` will land at.
    pub fn next_pos(&self) -> InstrPos {
        InstrPos::new(self.next_pos)
    }

    /// Emit a BRANCH jumping back to `target`, a position already
    /// appended.
    pub fn add_branch_back_to(&mut self, target: InstrPos) -> InstrPos {
        debug_assert!(self.slot_index(target).is_some(), "no instruction at {target}");
        let offset = target.index() as i64 - (self.next_pos as i64 + 2);
        self.add(OpRef::with_offset(
            Arc::new(Op::primitive(Opcode::Branch)),
            offset as i32,
        ))
    }

    /// Patch the BRANCH or 0BRANCH at `src` to jump to the next position
    /// to be written.
    ///
    /// Panics if `src` does not hold a branch instruction.
    pub fn fix_branch(&mut self, src: InstrPos) {
        let offset = self.next_pos as i64 - (src.index() as i64 + 2);
        self.patch_offset(src, offset as i32);
    }

    fn patch_offset(&mut self, src: InstrPos, offset: i32) {
        let index = self
            .slot_index(src)
            .unwrap_or_else(|| panic!("no instruction at {src}"));
        let slot = &mut self.slots[index];
        assert!(
            slot.opref.param().kind() == ParamKind::Offset,
            "instruction at {src} is not a branch"
        );
        slot.opref.set_offset(offset);
    }

    fn slot_index(&self, pos: InstrPos) -> Option<usize> {
        self.slots
            .binary_search_by_key(&pos.index(), |slot| slot.pos.index())
            .ok()
    }

    /// Break `source` into tokens and append them.
    ///
    /// Structured control words (IF/ELSE/THEN, BEGIN/WHILE/REPEAT) emit
    /// branches resolved through the control stack. With `allow_params`, a
    /// raw branch word may be followed by its integer offset
    /// (`0BRANCH 1`, `BRANCH -11`).
    pub fn parse(
        &mut self,
        vocab: &Vocabulary,
        source: &str,
        allow_params: bool,
    ) -> Result<(), Diagnostic> {
        let mut tokens = Tokenizer::new(source);
        let mut pending_offset: Option<InstrPos> = None;
        while let Some(token) = tokens.next_token()? {
            let span = token.span;
            let pending = pending_offset.take();
            match token.kind {
                TokenKind::Number(n) => {
                    if let Some(site) = pending {
                        if n.fract() != 0.0 {
                            return Err(Diagnostic::error(ErrorCode::E001, span)
                                .label("branch offset must be an integer")
                                .build());
                        }
                        self.patch_offset(site, n as i32);
                    } else {
                        self.add(OpRef::literal(Value::num(n)).with_span(span));
                    }
                }
                TokenKind::Str(s) => {
                    self.add(OpRef::literal(Value::str(s)).with_span(span));
                }
                TokenKind::Word("IF") => {
                    let site = self.add_placeholder(Opcode::ZBranch, span);
                    self.control.push(ControlTag::If, site, span);
                }
                TokenKind::Word("ELSE") => {
                    let branch = self.add_placeholder(Opcode::Branch, span);
                    let site = self.pop_control(&[ControlTag::If], "ELSE", span)?;
                    self.fix_branch(site.pos);
                    self.control.push(ControlTag::Else, branch, span);
                }
                TokenKind::Word("THEN") => {
                    let site =
                        self.pop_control(&[ControlTag::If, ControlTag::Else], "THEN", span)?;
                    self.fix_branch(site.pos);
                }
                TokenKind::Word("BEGIN") => {
                    self.control.push(ControlTag::Begin, self.next_pos(), span);
                }
                TokenKind::Word("WHILE") => {
                    let site = self.add_placeholder(Opcode::ZBranch, span);
                    let begin = self.pop_control(&[ControlTag::Begin], "WHILE", span)?;
                    self.control.push(ControlTag::While, site, span);
                    self.control.push(ControlTag::Begin, begin.pos, begin.span);
                }
                TokenKind::Word("REPEAT") => {
                    let begin = self.pop_control(&[ControlTag::Begin], "REPEAT", span)?;
                    let while_site = self.pop_control(&[ControlTag::While], "REPEAT", span)?;
                    self.add_branch_back_to(begin.pos);
                    self.fix_branch(while_site.pos);
                }
                TokenKind::Word(word) => match vocab.lookup(word) {
                    Some(op) => {
                        let op = op.clone();
                        match op.param_kind() {
                            ParamKind::None => {
                                self.add(OpRef::new(op).with_span(span));
                            }
                            ParamKind::Callee if op.is_composed() => {
                                self.add(OpRef::new(op).with_span(span));
                            }
                            ParamKind::Offset if allow_params => {
                                let site =
                                    self.add(OpRef::with_offset(op, 0).with_span(span));
                                pending_offset = Some(site);
                            }
                            _ => {
                                return Err(Diagnostic::error(ErrorCode::E103, span)
                                    .label(format!("`{}` cannot be written bare here", word))
                                    .build());
                            }
                        }
                    }
                    None => {
                        return Err(if tokenizer::looks_numeric(word) {
                            Diagnostic::error(ErrorCode::E001, span)
                                .label(format!("`{}` is not a number", word))
                                .build()
                        } else {
                            Diagnostic::error(ErrorCode::E100, span)
                                .label(format!("nothing named `{}`", word))
                                .build()
                        });
                    }
                },
            }
        }
        if let Some(entry) = self.control.top() {
            return Err(unclosed(entry));
        }
        Ok(())
    }

    fn add_placeholder(&mut self, opcode: Opcode, span: Span) -> InstrPos {
        self.add(OpRef::with_offset(Arc::new(Op::primitive(opcode)), 0).with_span(span))
    }

    fn pop_control(
        &mut self,
        expected: &[ControlTag],
        word: &str,
        span: Span,
    ) -> Result<ControlEntry, Diagnostic> {
        match self.control.pop() {
            Some(entry) if expected.contains(&entry.tag) => Ok(entry),
            Some(entry) => Err(Diagnostic::error(ErrorCode::E102, span)
                .label(format!("{} cannot close {}", word, entry.tag.word()))
                .build()),
            None => Err(Diagnostic::error(ErrorCode::E102, span)
                .label(format!("{} with nothing to close", word))
                .build()),
        }
    }

    /// Append the trailing RETURN, verify the definition, freeze the
    /// instruction vector, and install the descriptor. Consumes the
    /// compiler.
    pub fn finish(mut self, vocab: &mut Vocabulary) -> Result<Arc<Op>, Diagnostic> {
        if let Some(entry) = self.control.top() {
            return Err(unclosed(entry));
        }
        self.add(OpRef::primitive(Opcode::Return));
        let effect = verify::verify(&self.slots, self.max_inputs)?;
        if let Some(declared) = self.declared {
            self.check_declared(declared, effect)?;
        }
        let code = emit(&self.slots);
        Ok(vocab.define(Op::composed(self.name, effect, code)))
    }

    fn check_declared(
        &self,
        declared: StackEffect,
        computed: StackEffect,
    ) -> Result<(), Diagnostic> {
        let peak_ok =
            declared.has_minimal_peak() || computed.peak() <= declared.peak();
        if computed.inputs() == declared.inputs()
            && computed.net() == declared.net()
            && peak_ok
        {
            return Ok(());
        }
        Err(Diagnostic::error(ErrorCode::E201, Span::DUMMY)
            .note(format!("declared {}", declared))
            .note(format!("computed {}", computed))
            .build())
    }

    /// Compile an anonymous definition from a list of references in one
    /// step. Mostly for tests.
    pub fn compile(
        vocab: &mut Vocabulary,
        refs: impl IntoIterator<Item = OpRef>,
    ) -> Result<Arc<Op>, Diagnostic> {
        let mut compiler = Compiler::new();
        for opref in refs {
            compiler.add(opref);
        }
        compiler.finish(vocab)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

fn unclosed(entry: &ControlEntry) -> Diagnostic {
    Diagnostic::error(ErrorCode::E101, entry.span)
        .label(format!("{} has no matching closer", entry.tag.word()))
        .build()
}

/// Lay the appended references out as instruction cells.
fn emit(slots: &[Slot]) -> Code {
    let mut cells = Vec::new();
    for slot in slots {
        match slot.opref.param() {
            Param::None => match slot.opref.op().opcode() {
                Some(opcode) => cells.push(Instruction::Op(opcode)),
                None => unreachable!("parameterless composed reference"),
            },
            Param::Literal(value) => {
                cells.push(Instruction::Op(Opcode::Literal));
                cells.push(Instruction::Literal(value.clone()));
            }
            Param::Offset(offset) => match slot.opref.op().opcode() {
                Some(opcode) => {
                    cells.push(Instruction::Op(opcode));
                    cells.push(Instruction::Offset(*offset));
                }
                None => unreachable!("offset parameter on a composed op"),
            },
            Param::Callee(code) => {
                cells.push(Instruction::Op(Opcode::Call));
                cells.push(Instruction::Callee(code.clone()));
            }
        }
    }
    Arc::from(cells)
}
