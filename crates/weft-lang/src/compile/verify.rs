//! The static verifier: walks a definition along every reachable
//! control-flow path, composing stack effects instruction by instruction
//! and merging them where paths join, to derive the definition's precise
//! effect before it is allowed to run.

use std::collections::VecDeque;

use weft_core::{Diagnostic, ErrorCode, Span, StackEffect};
use weft_vm::Opcode;

use super::compiler::Slot;
use crate::opref::Param;

/// Compute the stack effect of an appended definition.
///
/// `slots` must already end in the trailing RETURN. Every reachable slot
/// receives the effect "from entry up to just before this instruction";
/// the result is the merge of all RETURN-reaching paths.
pub(crate) fn verify(slots: &[Slot], max_inputs: usize) -> Result<StackEffect, Diagnostic> {
    debug_assert!(
        matches!(slots.last().map(|s| s.opref.op().opcode()), Some(Some(Opcode::Return))),
        "definitions are verified after the trailing RETURN is appended"
    );

    let mut eff: Vec<Option<StackEffect>> = vec![None; slots.len()];
    eff[0] = Some(StackEffect::default());
    let mut queue: VecDeque<usize> = VecDeque::from([0]);
    let mut final_effect: Option<StackEffect> = None;

    while let Some(i) = queue.pop_front() {
        let slot = &slots[i];
        let Some(incoming) = eff[i] else { continue };
        let after = incoming
            .compose(slot.opref.op().effect())
            .map_err(|_| overflow(slot))?;

        match slot.opref.op().opcode() {
            Some(Opcode::Return) => {
                final_effect = Some(match final_effect {
                    None => after,
                    Some(existing) => {
                        if !existing.can_merge(after) {
                            return Err(unbalanced(slot, existing, after));
                        }
                        existing.merge(after).map_err(|_| overflow(slot))?
                    }
                });
            }
            Some(Opcode::Branch) => {
                let target = branch_target(slots, i)?;
                propagate(slots, &mut eff, &mut queue, target, after)?;
            }
            Some(Opcode::ZBranch) => {
                // One value popped on both edges.
                let target = branch_target(slots, i)?;
                propagate(slots, &mut eff, &mut queue, target, after)?;
                propagate(slots, &mut eff, &mut queue, i + 1, after)?;
            }
            _ => {
                propagate(slots, &mut eff, &mut queue, i + 1, after)?;
            }
        }
    }

    let Some(effect) = final_effect else {
        return Err(Diagnostic::error(ErrorCode::E201, Span::DUMMY)
            .message("definition has no reachable RETURN")
            .build());
    };
    if effect.inputs() as usize > max_inputs {
        return Err(Diagnostic::error(ErrorCode::E202, Span::DUMMY)
            .message(format!(
                "word reads {} value(s) from the stack but only {} permitted",
                effect.inputs(),
                max_inputs
            ))
            .build());
    }
    Ok(effect)
}

/// Carry `effect` into the slot at `index`, merging with whatever other
/// paths already delivered there. Requeues the slot when its effect grew.
fn propagate(
    slots: &[Slot],
    eff: &mut [Option<StackEffect>],
    queue: &mut VecDeque<usize>,
    index: usize,
    effect: StackEffect,
) -> Result<(), Diagnostic> {
    let Some(slot) = slots.get(index) else {
        // Unreachable through `Compiler::finish`, which appends RETURN
        // last; guards hand-built slot lists.
        let last = &slots[slots.len() - 1];
        return Err(Diagnostic::error(ErrorCode::E203, span_of(last))
            .message("control flow runs off the end of the definition")
            .build());
    };
    match eff[index] {
        None => {
            eff[index] = Some(effect);
            queue.push_back(index);
        }
        Some(existing) => {
            if !existing.can_merge(effect) {
                return Err(unbalanced(slot, existing, effect));
            }
            let merged = existing.merge(effect).map_err(|_| overflow(slot))?;
            if merged != existing {
                eff[index] = Some(merged);
                queue.push_back(index);
            }
        }
    }
    Ok(())
}

/// Resolve the branch at slot `i` to the slot index it jumps to. The
/// offset counts from the cell after the offset cell and must land on an
/// opcode cell inside the definition.
fn branch_target(slots: &[Slot], i: usize) -> Result<usize, Diagnostic> {
    let slot = &slots[i];
    let Param::Offset(offset) = slot.opref.param() else {
        return Err(Diagnostic::error(ErrorCode::E203, span_of(slot))
            .message("branch without an offset parameter")
            .build());
    };
    let target = slot.pos.index() as i64 + 2 + *offset as i64;
    if target >= 0
        && let Ok(index) =
            slots.binary_search_by_key(&(target as usize), |s| s.pos.index())
    {
        return Ok(index);
    }
    Err(Diagnostic::error(ErrorCode::E203, span_of(slot))
        .label(format!("offset {} does not land on an instruction", offset))
        .build())
}

fn span_of(slot: &Slot) -> Span {
    slot.opref.span().unwrap_or(Span::DUMMY)
}

fn overflow(slot: &Slot) -> Diagnostic {
    Diagnostic::error(ErrorCode::E204, span_of(slot)).build()
}

fn unbalanced(slot: &Slot, a: StackEffect, b: StackEffect) -> Diagnostic {
    Diagnostic::error(ErrorCode::E200, span_of(slot))
        .note(format!("one path arrives with {}", a))
        .note(format!("another path arrives with {}", b))
        .build()
}
