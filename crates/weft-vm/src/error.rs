use crate::stack::StackError;

/// Runtime error during execution.
#[derive(Clone, Debug, PartialEq)]
pub enum RuntimeError {
    /// Stack error (underflow, overflow).
    Stack(StackError),
    /// Tried to run an operation with no compiled body.
    NotComposed(String),
    /// Exceeded the call-frame limit.
    CallDepthExceeded(usize),
    /// A body was malformed: a parameter cell where an opcode was expected,
    /// a missing parameter cell, or a jump outside the body.
    InvalidCode(&'static str),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::Stack(e) => write!(f, "{}", e),
            RuntimeError::NotComposed(name) => {
                write!(f, "`{}` has no compiled body to run", name)
            }
            RuntimeError::CallDepthExceeded(limit) => {
                write!(f, "call depth exceeded {} frames", limit)
            }
            RuntimeError::InvalidCode(msg) => write!(f, "invalid code: {}", msg),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<StackError> for RuntimeError {
    fn from(e: StackError) -> Self {
        RuntimeError::Stack(e)
    }
}
