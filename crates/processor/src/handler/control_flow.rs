// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// Branch offsets are signed 16-bit values relative to the address of
// the branch instruction itself. A conditional branch that is not
// taken falls through its own 3 bytes; since the offset is measured
// from the branch opcode, an offset of +3 behaves like a fall-through
// even when the branch is taken.

use c0vm_context::thread_context::ThreadContext;
use c0vm_isa::Trap;
use c0vm_stack::Value;

use super::{HandleResult, Handler};

const FALL_THROUGH: isize = 3;

pub fn goto(_handler: &Handler, thread_context: &mut ThreadContext) -> Result<HandleResult, Trap> {
    let offset = thread_context.get_param_i16()?;
    Ok(HandleResult::Move(offset as isize))
}

// `if_cmpeq` and `if_cmpne` compare whole values with the shape-aware
// equality rule, so they accept reference pairs as well as integers.

pub fn if_cmpeq(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    do_value_branch(thread_context, |left, right| left == right)
}

pub fn if_cmpne(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    do_value_branch(thread_context, |left, right| left != right)
}

pub fn if_icmplt(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    do_integer_branch(thread_context, |left, right| left < right)
}

pub fn if_icmpge(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    do_integer_branch(thread_context, |left, right| left >= right)
}

pub fn if_icmpgt(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    do_integer_branch(thread_context, |left, right| left > right)
}

pub fn if_icmple(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    do_integer_branch(thread_context, |left, right| left <= right)
}

fn do_value_branch(
    thread_context: &mut ThreadContext,
    condition: fn(Value, Value) -> bool,
) -> Result<HandleResult, Trap> {
    let offset = thread_context.get_param_i16()?;
    let right = thread_context.operand_stack.pop()?;
    let left = thread_context.operand_stack.pop()?;
    Ok(if condition(left, right) {
        HandleResult::Move(offset as isize)
    } else {
        HandleResult::Move(FALL_THROUGH)
    })
}

fn do_integer_branch(
    thread_context: &mut ThreadContext,
    condition: fn(i32, i32) -> bool,
) -> Result<HandleResult, Trap> {
    let offset = thread_context.get_param_i16()?;
    let right = thread_context.operand_stack.pop_int()?;
    let left = thread_context.operand_stack.pop_int()?;
    Ok(if condition(left, right) {
        HandleResult::Move(offset as isize)
    } else {
        HandleResult::Move(FALL_THROUGH)
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use c0vm_image::{
        bytecode_writer::BytecodeWriterHelper,
        utils::helper_build_program_with_single_function,
    };
    use c0vm_isa::opcode::Opcode;

    use crate::process::execute;

    // builds `left <op> right ? 1 : 0` as an entry function
    fn run_branch(opcode: Opcode, left: i32, right: i32) -> i32 {
        // 0x0000  10 ..        bipush left
        // 0x0002  10 ..        bipush right
        // 0x0004  ?? 00 06     branch +6      ; -> 0x000a
        // 0x0007  10 00        bipush 0
        // 0x0009  b0           return
        // 0x000a  10 01        bipush 1
        // 0x000c  b0           return
        let code0 = BytecodeWriterHelper::new()
            .append_opcode_i8(Opcode::bipush, left as i8)
            .append_opcode_i8(Opcode::bipush, right as i8)
            .append_opcode_i16(opcode, 6)
            .append_opcode_i8(Opcode::bipush, 0)
            .append_opcode(Opcode::r#return)
            .append_opcode_i8(Opcode::bipush, 1)
            .append_opcode(Opcode::r#return)
            .to_bytes();

        let program0 = helper_build_program_with_single_function(0, 0, code0);
        execute(&program0).unwrap()
    }

    #[test]
    fn test_handler_control_flow_taken_branch() {
        // 2 == 2, so the branch skips the `bipush 0; return` pair
        assert_eq!(run_branch(Opcode::if_cmpeq, 2, 2), 1);
    }

    #[test]
    fn test_handler_control_flow_value_comparisons() {
        assert_eq!(run_branch(Opcode::if_cmpeq, 2, 3), 0);
        assert_eq!(run_branch(Opcode::if_cmpne, 2, 3), 1);
        assert_eq!(run_branch(Opcode::if_cmpne, 2, 2), 0);
    }

    #[test]
    fn test_handler_control_flow_integer_comparisons() {
        // signed comparison throughout
        assert_eq!(run_branch(Opcode::if_icmplt, -1, 0), 1);
        assert_eq!(run_branch(Opcode::if_icmplt, 0, -1), 0);
        assert_eq!(run_branch(Opcode::if_icmpge, 3, 3), 1);
        assert_eq!(run_branch(Opcode::if_icmpge, 2, 3), 0);
        assert_eq!(run_branch(Opcode::if_icmpgt, 4, 3), 1);
        assert_eq!(run_branch(Opcode::if_icmpgt, 3, 3), 0);
        assert_eq!(run_branch(Opcode::if_icmple, 3, 3), 1);
        assert_eq!(run_branch(Opcode::if_icmple, 4, 3), 0);
    }

    #[test]
    fn test_handler_control_flow_offset_three_falls_through_when_taken() {
        // a taken branch whose offset is +3 lands exactly on the
        // fall-through instruction
        //
        // 0x0000  10 01        bipush 1
        // 0x0002  10 01        bipush 1
        // 0x0004  9f 00 03     if_cmpeq +3    ; -> 0x0007
        // 0x0007  10 2a        bipush 42
        // 0x0009  b0           return
        let code0 = BytecodeWriterHelper::new()
            .append_opcode_i8(Opcode::bipush, 1)
            .append_opcode_i8(Opcode::bipush, 1)
            .append_opcode_i16(Opcode::if_cmpeq, 3)
            .append_opcode_i8(Opcode::bipush, 42)
            .append_opcode(Opcode::r#return)
            .to_bytes();

        let program0 = helper_build_program_with_single_function(0, 0, code0);
        assert_eq!(execute(&program0).unwrap(), 42);
    }

    #[test]
    fn test_handler_control_flow_goto_forward_and_backward() {
        // goto jumps over a backward island and comes back
        //
        // 0x0000  a7 00 08     goto +8        ; -> 0x0008
        // 0x0003  10 09        bipush 9
        // 0x0005  a7 00 07     goto +7        ; -> 0x000c
        // 0x0008  a7 ff fb     goto -5        ; -> 0x0003
        // 0x000b  00           nop
        // 0x000c  b0           return
        let code0 = BytecodeWriterHelper::new()
            .append_opcode_i16(Opcode::goto, 8)
            .append_opcode_i8(Opcode::bipush, 9)
            .append_opcode_i16(Opcode::goto, 7)
            .append_opcode_i16(Opcode::goto, -5)
            .append_opcode(Opcode::nop)
            .append_opcode(Opcode::r#return)
            .to_bytes();

        let program0 = helper_build_program_with_single_function(0, 0, code0);
        assert_eq!(execute(&program0).unwrap(), 9);
    }
}
