//! Foundational value types: positions, spans, stack effects.

mod effect;
mod span;

pub use effect::{EffectOverflow, StackEffect};
pub use span::{Pos, Span};
