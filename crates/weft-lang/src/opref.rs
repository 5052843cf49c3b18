use std::fmt;
use std::sync::Arc;

use weft_core::Span;
use weft_vm::{Code, Op, Opcode, ParamKind, Value};

/// Parameter slot of an [`OpRef`], validated against the operation's
/// declared parameter kind at construction.
#[derive(Clone, Debug)]
pub enum Param {
    None,
    Literal(Value),
    Offset(i32),
    Callee(Code),
}

impl Param {
    pub fn kind(&self) -> ParamKind {
        match self {
            Param::None => ParamKind::None,
            Param::Literal(_) => ParamKind::Literal,
            Param::Offset(_) => ParamKind::Offset,
            Param::Callee(_) => ParamKind::Callee,
        }
    }
}

impl PartialEq for Param {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Param::None, Param::None) => true,
            (Param::Literal(a), Param::Literal(b)) => a == b,
            (Param::Offset(a), Param::Offset(b)) => a == b,
            (Param::Callee(a), Param::Callee(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A reference to an operation plus its parameter: what the compiler
/// appends and the disassembler recovers.
///
/// May carry a span into the source text it came from, for diagnostics.
/// Equality ignores the span.
#[derive(Clone, Debug)]
pub struct OpRef {
    op: Arc<Op>,
    param: Param,
    span: Option<Span>,
}

impl OpRef {
    /// Reference a parameterless primitive, or a composed op (which
    /// implicitly carries its own body as the callee).
    ///
    /// Panics if the op requires an explicit parameter.
    pub fn new(op: Arc<Op>) -> Self {
        let param = match op.param_kind() {
            ParamKind::None => Param::None,
            ParamKind::Callee => match op.code() {
                Some(code) => Param::Callee(code.clone()),
                None => panic!("`{}` requires an explicit callee", op),
            },
            _ => panic!("`{}` requires a parameter", op),
        };
        Self {
            op,
            param,
            span: None,
        }
    }

    /// Reference an op that takes a value parameter.
    ///
    /// Panics if the op's parameter kind is not `Literal`.
    pub fn with_literal(op: Arc<Op>, value: Value) -> Self {
        assert_eq!(
            op.param_kind(),
            ParamKind::Literal,
            "`{}` does not take a value parameter",
            op
        );
        Self {
            op,
            param: Param::Literal(value),
            span: None,
        }
    }

    /// Reference an op that takes a branch offset.
    ///
    /// Panics if the op's parameter kind is not `Offset`.
    pub fn with_offset(op: Arc<Op>, offset: i32) -> Self {
        assert_eq!(
            op.param_kind(),
            ParamKind::Offset,
            "`{}` does not take an offset parameter",
            op
        );
        Self {
            op,
            param: Param::Offset(offset),
            span: None,
        }
    }

    /// Shorthand: reference a parameterless primitive by opcode.
    pub fn primitive(opcode: Opcode) -> Self {
        Self::new(Arc::new(Op::primitive(opcode)))
    }

    /// Shorthand: push a value (a LITERAL reference).
    pub fn literal(value: Value) -> Self {
        Self::with_literal(Arc::new(Op::primitive(Opcode::Literal)), value)
    }

    /// Attach a source span for diagnostics.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn op(&self) -> &Arc<Op> {
        &self.op
    }

    pub fn param(&self) -> &Param {
        &self.param
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    /// Cells this reference occupies when emitted.
    pub fn width(&self) -> usize {
        self.op.width()
    }

    /// Replace an offset parameter once the branch target is known.
    pub(crate) fn set_offset(&mut self, offset: i32) {
        debug_assert_eq!(self.param.kind(), ParamKind::Offset);
        self.param = Param::Offset(offset);
    }
}

impl PartialEq for OpRef {
    fn eq(&self, other: &Self) -> bool {
        self.op == other.op && self.param == other.param
    }
}

impl fmt::Display for OpRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.param {
            Param::None | Param::Callee(_) => write!(f, "{}", self.op),
            Param::Literal(value) => write!(f, "{}:<{}>", self.op, value),
            Param::Offset(offset) => write!(f, "{}+<{}>", self.op, offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{Pos, StackEffect};
    use weft_vm::Instruction;

    fn composed(name: &str) -> Arc<Op> {
        let code: Code = Arc::from(vec![Instruction::Op(Opcode::Return)]);
        Arc::new(Op::composed(
            Some(name.into()),
            StackEffect::new(0, 0),
            code,
        ))
    }

    #[test]
    fn parameterless_reference() {
        let r = OpRef::primitive(Opcode::Dup);
        assert_eq!(r.param(), &Param::None);
        assert_eq!(r.width(), 1);
    }

    #[test]
    fn composed_reference_carries_its_body() {
        let op = composed("NOP");
        let r = OpRef::new(op.clone());
        match r.param() {
            Param::Callee(code) => assert!(Arc::ptr_eq(code, op.code().unwrap())),
            other => panic!("expected callee, got {other:?}"),
        }
        assert_eq!(r.width(), 2);
    }

    #[test]
    fn literal_reference() {
        let r = OpRef::literal(Value::num(3.0));
        assert_eq!(r.param(), &Param::Literal(Value::num(3.0)));
        assert_eq!(r.width(), 2);
        assert_eq!(r.to_string(), "LITERAL:<3>");
    }

    #[test]
    fn offset_reference() {
        let zbranch = Arc::new(Op::primitive(Opcode::ZBranch));
        let r = OpRef::with_offset(zbranch, -11);
        assert_eq!(r.param(), &Param::Offset(-11));
        assert_eq!(r.to_string(), "0BRANCH+<-11>");
    }

    #[test]
    #[should_panic(expected = "requires a parameter")]
    fn literal_without_value_panics() {
        OpRef::new(Arc::new(Op::primitive(Opcode::Literal)));
    }

    #[test]
    #[should_panic(expected = "does not take")]
    fn offset_on_parameterless_op_panics() {
        OpRef::with_offset(Arc::new(Op::primitive(Opcode::Dup)), 1);
    }

    #[test]
    fn equality_ignores_spans() {
        let span = Span::new(Pos::new(0), Pos::new(3));
        let a = OpRef::primitive(Opcode::Swap).with_span(span);
        let b = OpRef::primitive(Opcode::Swap);
        assert_eq!(a, b);
        assert_eq!(a.span(), Some(span));
        assert_eq!(b.span(), None);
    }
}
