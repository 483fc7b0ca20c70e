//! Max stack computation by abstract interpretation over the control-flow graph of a body.

use crate::{
    assembly::{CilInstruction, FlowType, StackEffect},
    metadata::method::CilExceptionHandler,
    Error, Result,
};

/// Index of the instruction starting at `offset`. `instructions` must be in offset order.
pub(crate) fn instruction_at(instructions: &[CilInstruction], offset: u32) -> Option<usize> {
    instructions
        .binary_search_by_key(&offset, |instruction| instruction.offset)
        .ok()
}

/// Walk every path from the body entry and every handler entry, recording the depth each
/// instruction executes at, and return the largest depth seen.
///
/// Instruction offsets must be current.
pub(crate) fn compute_max_stack(
    instructions: &[CilInstruction],
    handlers: &[CilExceptionHandler],
) -> Result<u32> {
    if instructions.is_empty() {
        return Ok(0);
    }

    let mut depths: Vec<Option<u32>> = vec![None; instructions.len()];
    let mut pending: Vec<(usize, u32)> = vec![(0, 0)];

    for handler in handlers {
        let entry_depth = u32::from(handler.pushes_exception());
        pending.push((entry(instructions, handler.handler_offset)?, entry_depth));
        if let Some(filter) = handler.filter_offset() {
            pending.push((entry(instructions, filter)?, 1));
        }
    }

    let mut max_depth = 0u32;
    let mut unknown_calls = 0usize;

    while let Some((index, depth)) = pending.pop() {
        let instruction = &instructions[index];
        match depths[index] {
            Some(recorded) if recorded != depth => {
                return Err(Error::StackImbalance {
                    offset: instruction.offset,
                    expected: recorded,
                    actual: depth,
                });
            }
            Some(_) => continue,
            None => depths[index] = Some(depth),
        }

        let effect = instruction.stack_effect().unwrap_or_else(|| {
            unknown_calls += 1;
            StackEffect::default()
        });
        if effect.pops > depth {
            return Err(Error::StackUnderflow {
                offset: instruction.offset,
            });
        }
        let after = depth - effect.pops + effect.pushes;
        max_depth = max_depth.max(depth).max(after);

        let fall_through = index + 1;
        let targets = instruction.branch_targets();
        match instruction.flow() {
            FlowType::Branch => {
                for target in targets {
                    pending.push((successor(instruction, target, instructions)?, after));
                }
            }
            FlowType::CondBranch | FlowType::Switch => {
                for target in targets {
                    pending.push((successor(instruction, target, instructions)?, after));
                }
                if fall_through < instructions.len() {
                    pending.push((fall_through, after));
                }
            }
            // leave empties the evaluation stack
            FlowType::Leave => {
                for target in targets {
                    pending.push((successor(instruction, target, instructions)?, 0));
                }
            }
            FlowType::Return | FlowType::Throw => {}
            FlowType::Next | FlowType::Call | FlowType::Meta => {
                if fall_through < instructions.len() {
                    pending.push((fall_through, after));
                }
            }
        }
    }

    if unknown_calls > 0 {
        log::warn!(
            "{} call site(s) without a known signature counted as neutral for max stack",
            unknown_calls
        );
    }

    Ok(max_depth)
}

fn entry(instructions: &[CilInstruction], offset: u32) -> Result<usize> {
    instruction_at(instructions, offset)
        .ok_or_else(|| malformed_error!("Handler entry {:#x} is not an instruction start", offset))
}

fn successor(instruction: &CilInstruction, target: u32, instructions: &[CilInstruction]) -> Result<usize> {
    instruction_at(instructions, target).ok_or_else(|| {
        malformed_error!(
            "Branch at {:#x} targets {:#x}, which is not an instruction start",
            instruction.offset,
            target
        )
    })
}
