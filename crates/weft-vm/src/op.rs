use std::fmt;
use std::sync::Arc;

use weft_core::StackEffect;

use crate::instruction::Code;
use crate::opcode::{Opcode, ParamKind};

/// How an operation is implemented.
#[derive(Clone, Debug)]
pub enum OpKind {
    /// Runs natively in the machine, identified by its opcode.
    Primitive(Opcode),
    /// Threaded code ending in RETURN.
    Composed(Code),
}

/// An operation descriptor: name, stack effect, and implementation.
///
/// Descriptors are immutable once created and shared as `Arc<Op>`; the
/// vocabulary owns the installed ones for the lifetime of the process.
#[derive(Clone, Debug)]
pub struct Op {
    name: Option<String>,
    effect: StackEffect,
    kind: OpKind,
}

impl Op {
    /// Descriptor for a primitive, named and typed from the opcode table.
    pub fn primitive(opcode: Opcode) -> Self {
        Self {
            name: Some(opcode.forth_name().to_string()),
            effect: opcode.effect(),
            kind: OpKind::Primitive(opcode),
        }
    }

    /// Descriptor for a compiled definition. An anonymous op passes `None`.
    pub fn composed(name: Option<String>, effect: StackEffect, code: Code) -> Self {
        Self {
            name,
            effect,
            kind: OpKind::Composed(code),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn effect(&self) -> StackEffect {
        self.effect
    }

    pub fn kind(&self) -> &OpKind {
        &self.kind
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, OpKind::Primitive(_))
    }

    pub fn is_composed(&self) -> bool {
        matches!(self.kind, OpKind::Composed(_))
    }

    /// The opcode, for primitives.
    pub fn opcode(&self) -> Option<Opcode> {
        match &self.kind {
            OpKind::Primitive(opcode) => Some(*opcode),
            OpKind::Composed(_) => None,
        }
    }

    /// The compiled body, for composed ops.
    pub fn code(&self) -> Option<&Code> {
        match &self.kind {
            OpKind::Primitive(_) => None,
            OpKind::Composed(code) => Some(code),
        }
    }

    /// Parameter kind when this op is referenced from a definition. A
    /// composed op is always invoked through CALL with its body as callee.
    pub fn param_kind(&self) -> ParamKind {
        match &self.kind {
            OpKind::Primitive(opcode) => opcode.param_kind(),
            OpKind::Composed(_) => ParamKind::Callee,
        }
    }

    /// Cells this operation occupies when emitted into a definition.
    pub fn width(&self) -> usize {
        if self.param_kind() == ParamKind::None { 1 } else { 2 }
    }
}

/// Identity: the same primitive, or the same compiled body.
impl PartialEq for Op {
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (OpKind::Primitive(a), OpKind::Primitive(b)) => a == b,
            (OpKind::Composed(a), OpKind::Composed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "<anonymous>"),
        }
    }
}
