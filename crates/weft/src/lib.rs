//! Weft - a small stack-oriented concatenative language engine.
//!
//! This crate provides the [`Session`] struct, the main entry point for:
//! - Compiling source text to threaded code
//! - Executing it against a persistent data stack
//! - Defining named words for later lines to call
//!
//! # Quick Start
//!
//! ```
//! use weft::Session;
//!
//! let mut session = Session::new();
//! let stack = session.eval("3 4 +").unwrap();
//! assert_eq!(stack[0], weft::Value::num(7.0));
//! ```

use std::sync::Arc;

use thiserror::Error;

// Re-export commonly used types from the component crates
pub use weft_core::{
    Diagnostic, DiagnosticBuilder, EffectOverflow, ErrorCode, Pos, Severity, Span, StackEffect,
};
pub use weft_lang::{
    Compiler, ControlTag, InstrPos, OpRef, Param, Token, TokenKind, Tokenizer, disassemble_at,
    disassemble_word,
};
pub use weft_vm::{
    Code, Instruction, Machine, MachineConfig, Op, OpKind, Opcode, ParamKind, RuntimeError, Stack,
    StackError, Tracer, Value, Vocabulary,
};

/// Anything that can go wrong between source text and a result.
#[derive(Clone, Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Compile(#[from] Diagnostic),
    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

/// Session configuration options.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionConfig {
    /// Execution limits for the machine.
    pub machine: MachineConfig,
}

/// A vocabulary and a machine with a persistent data stack: compile a
/// line, run it, keep the results for the next line.
pub struct Session {
    vocab: Vocabulary,
    machine: Machine,
}

impl Session {
    /// Create a new session with default configuration.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create a new session with custom configuration.
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            vocab: Vocabulary::new(),
            machine: Machine::with_config(config.machine),
        }
    }

    /// Compile and run one line against the current stack, returning the
    /// stack contents (bottom to top) afterwards.
    ///
    /// The line may read values earlier lines left behind; the compiler is
    /// told the current depth, so reading deeper fails at compile time
    /// rather than underflowing at run time. Raw branch words with integer
    /// offsets are allowed.
    pub fn eval(&mut self, source: &str) -> Result<Vec<Value>, Error> {
        let mut compiler = Compiler::new();
        compiler.set_max_inputs(self.machine.stack().len());
        compiler.parse(&self.vocab, source, true)?;
        let op = compiler.finish(&mut self.vocab)?;
        self.machine.run(&op)?;
        Ok(self.machine.stack().as_slice().to_vec())
    }

    /// Compile `source` as a named word and install it. The body runs
    /// only when the word is later invoked; the current stack is untouched.
    pub fn define(&mut self, name: &str, source: &str) -> Result<Arc<Op>, Error> {
        let mut compiler = Compiler::named(name);
        compiler.parse(&self.vocab, source, false)?;
        Ok(compiler.finish(&mut self.vocab)?)
    }

    /// The current stack, bottom to top.
    pub fn stack(&self) -> &[Value] {
        self.machine.stack().as_slice()
    }

    /// Drop everything off the stack.
    pub fn clear_stack(&mut self) {
        self.machine.clear_stack();
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_keeps_the_stack_between_lines() {
        let mut session = Session::new();
        session.eval("3 4").unwrap();
        let stack = session.eval("+").unwrap();
        assert_eq!(stack, vec![Value::num(7.0)]);
    }

    #[test]
    fn eval_rejects_reads_below_the_stack() {
        let mut session = Session::new();
        let err = session.eval("+").unwrap_err();
        match err {
            Error::Compile(diag) => assert_eq!(diag.code(), ErrorCode::E202),
            other => panic!("expected compile error, got {other}"),
        }
    }

    #[test]
    fn define_then_call() {
        let mut session = Session::new();
        session.define("DOUBLE", "DUP +").unwrap();
        assert!(session.stack().is_empty());
        let stack = session.eval("21 DOUBLE").unwrap();
        assert_eq!(stack, vec![Value::num(42.0)]);
    }

    #[test]
    fn failed_lines_do_not_run() {
        let mut session = Session::new();
        session.eval("1").unwrap();
        session.eval("2 FROB").unwrap_err();
        assert_eq!(session.stack(), &[Value::num(1.0)]);
    }

    #[test]
    fn clear_stack() {
        let mut session = Session::new();
        session.eval("1 2 3").unwrap();
        session.clear_stack();
        assert!(session.stack().is_empty());
    }
}
