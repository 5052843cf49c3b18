//! Core types for the Weft language engine.
//!
//! This crate provides foundational types used throughout the compiler and
//! runtime:
//! - Source spans and positions
//! - The stack-effect algebra
//! - Diagnostics and error codes

pub mod core;
pub mod error;

// Re-export commonly used types at crate root
pub use crate::core::{EffectOverflow, Pos, Span, StackEffect};
pub use crate::error::{Diagnostic, DiagnosticBuilder, ErrorCode, Severity};
