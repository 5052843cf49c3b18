use std::fmt;

/// Ceiling on the `inputs` component of a stack effect.
pub const INPUT_CEILING: i32 = u8::MAX as i32;

/// Ceiling on the `peak` component of a stack effect.
pub const PEAK_CEILING: i32 = u16::MAX as i32;

/// A composed or merged stack effect no longer fits its encoding.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EffectOverflow;

impl fmt::Display for EffectOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stack effect overflow")
    }
}

impl std::error::Error for EffectOverflow {}

/// Stack effect of an operation.
///
/// `inputs` is how many values it reads from the stack, `net` the signed
/// change in depth it leaves behind, and `peak` the high-water mark of cells
/// in use while it runs, counted from the bottom of its inputs. A legal
/// effect always satisfies `peak >= max(inputs, inputs + net)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct StackEffect {
    inputs: i32,
    net: i32,
    peak: i32,
}

impl StackEffect {
    /// Effect that consumes `inputs` values and leaves `outputs` behind.
    /// The peak is the minimal legal value, `max(inputs, outputs)`.
    pub const fn new(inputs: u16, outputs: u16) -> Self {
        let inputs = inputs as i32;
        let outputs = outputs as i32;
        let peak = if inputs > outputs { inputs } else { outputs };
        Self {
            inputs,
            net: outputs - inputs,
            peak,
        }
    }

    /// Effect with an explicit transient high-water mark.
    pub const fn with_peak(inputs: u16, outputs: u16, peak: u32) -> Self {
        let base = Self::new(inputs, outputs);
        assert!(peak as i32 >= base.peak, "peak below max(inputs, outputs)");
        Self {
            inputs: base.inputs,
            net: base.net,
            peak: peak as i32,
        }
    }

    pub fn inputs(self) -> i32 {
        self.inputs
    }

    pub fn outputs(self) -> i32 {
        self.inputs + self.net
    }

    pub fn net(self) -> i32 {
        self.net
    }

    pub fn peak(self) -> i32 {
        self.peak
    }

    /// True if the peak carries no information beyond what `inputs` and
    /// `outputs` already imply.
    pub fn has_minimal_peak(self) -> bool {
        self.peak == self.inputs.max(self.outputs())
    }

    /// The cumulative effect of first `self`, then `other`.
    ///
    /// `other`'s required inputs are satisfied either by what `self` leaves
    /// behind or by deeper pre-existing stack.
    pub fn compose(self, other: StackEffect) -> Result<StackEffect, EffectOverflow> {
        let inputs = self.inputs.max(other.inputs - self.net);
        let net = self.net + other.net;
        let peak = inputs
            + (self.peak - self.inputs).max(self.net + other.peak - other.inputs);
        Self::checked(inputs, net, peak)
    }

    /// True if `merge` is legal: both paths agree on net depth change.
    pub fn can_merge(self, other: StackEffect) -> bool {
        self.net == other.net
    }

    /// The effect of doing either `self` or `other` (which must have the
    /// same net). Inputs are the larger requirement; each peak is re-based
    /// at that input depth before taking the maximum.
    pub fn merge(self, other: StackEffect) -> Result<StackEffect, EffectOverflow> {
        debug_assert!(self.can_merge(other));
        let inputs = self.inputs.max(other.inputs);
        let peak = (self.peak + inputs - self.inputs).max(other.peak + inputs - other.inputs);
        Self::checked(inputs, self.net, peak)
    }

    fn checked(inputs: i32, net: i32, peak: i32) -> Result<StackEffect, EffectOverflow> {
        if inputs > INPUT_CEILING || peak > PEAK_CEILING {
            return Err(EffectOverflow);
        }
        Ok(StackEffect { inputs, net, peak })
    }
}

impl fmt::Display for StackEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}->{}, peak {})", self.inputs, self.outputs(), self.peak)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_computes_net_and_peak() {
        let e = StackEffect::new(2, 1);
        assert_eq!(e.inputs(), 2);
        assert_eq!(e.outputs(), 1);
        assert_eq!(e.net(), -1);
        assert_eq!(e.peak(), 2);
        assert!(e.has_minimal_peak());
    }

    #[test]
    fn with_peak_keeps_explicit_high_water() {
        let e = StackEffect::with_peak(0, 1, 3);
        assert_eq!(e.peak(), 3);
        assert!(!e.has_minimal_peak());
    }

    #[test]
    fn compose_sequences_two_effects() {
        // (1->1) then (2->2): the second needs one value deeper than the
        // first touches.
        let a = StackEffect::new(1, 1);
        let b = StackEffect::new(2, 2);
        assert_eq!(a.compose(b).unwrap(), StackEffect::new(2, 2));
    }

    #[test]
    fn compose_net_is_additive() {
        let a = StackEffect::new(0, 2);
        let b = StackEffect::new(2, 1);
        let c = a.compose(b).unwrap();
        assert_eq!(c.net(), a.net() + b.net());
        assert!(c.inputs() >= a.inputs());
    }

    #[test]
    fn compose_tracks_transient_peak() {
        // Push two, then collapse to one: peak is 2 even though the final
        // depth is 1.
        let push = StackEffect::new(0, 1);
        let add = StackEffect::new(2, 1);
        let e = push
            .compose(push)
            .unwrap()
            .compose(add)
            .unwrap();
        assert_eq!(e, StackEffect::with_peak(0, 1, 2));
    }

    #[test]
    fn compose_is_associative() {
        let effects = [
            StackEffect::new(0, 1),
            StackEffect::new(2, 1),
            StackEffect::new(1, 2),
            StackEffect::new(3, 3),
            StackEffect::new(1, 0),
        ];
        for a in effects {
            for b in effects {
                for c in effects {
                    let left = a.compose(b).unwrap().compose(c).unwrap();
                    let right = a.compose(b.compose(c).unwrap()).unwrap();
                    assert_eq!(left, right, "({a} . {b}) . {c}");
                }
            }
        }
    }

    #[test]
    fn merge_requires_equal_net() {
        let a = StackEffect::new(0, 1);
        let b = StackEffect::new(1, 2);
        let c = StackEffect::new(0, 2);
        assert!(a.can_merge(b));
        assert!(!a.can_merge(c));
    }

    #[test]
    fn merge_takes_larger_input_and_rebases_peak() {
        let a = StackEffect::with_peak(1, 1, 4);
        let b = StackEffect::new(2, 2);
        let m = a.merge(b).unwrap();
        assert_eq!(m.inputs(), 2);
        assert_eq!(m.net(), 0);
        // a's peak of 4 re-based at input depth 2 is 5.
        assert_eq!(m.peak(), 5);
    }

    #[test]
    fn merge_is_commutative_and_idempotent() {
        let a = StackEffect::with_peak(1, 2, 3);
        let b = StackEffect::new(2, 3);
        assert_eq!(a.merge(b).unwrap(), b.merge(a).unwrap());
        assert_eq!(a.merge(a).unwrap(), a);
        assert_eq!(b.merge(b).unwrap(), b);
    }

    #[test]
    fn compose_overflow_is_reported() {
        let deep = StackEffect::with_peak(0, 0, PEAK_CEILING as u32);
        let push = StackEffect::new(0, 1);
        // One value under the ceiling, then the full-depth effect on top.
        assert_eq!(push.compose(deep), Err(EffectOverflow));
        // The other order stays exactly at the ceiling and is fine.
        assert!(deep.compose(push).is_ok());
    }

    #[test]
    fn display_reads_like_a_signature() {
        assert_eq!(StackEffect::new(2, 1).to_string(), "(2->1, peak 2)");
        assert_eq!(
            StackEffect::with_peak(0, 1, 2).to_string(),
            "(0->1, peak 2)"
        );
    }
}
