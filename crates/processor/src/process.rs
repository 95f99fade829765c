// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use c0vm_context::thread_context::ThreadContext;
use c0vm_image::Program;
use c0vm_isa::Trap;

use crate::handler::{HandleResult, Handler};

/// Runs the entry function (function-pool index 0) of the program with
/// the default native-function table and returns the integer it
/// eventually produces. All machine-owned memory (heap, frames,
/// operand stacks) is released when this function returns, normally
/// or on a trap.
pub fn execute(program: &Program) -> Result<i32, Trap> {
    let handler = Handler::new();
    let mut thread_context = ThreadContext::new(program);
    process_program(&handler, &mut thread_context)
}

/// The fetch–decode–dispatch loop. It leaves only on a return from the
/// entry frame or on a trap.
pub fn process_program(
    handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<i32, Trap> {
    loop {
        match process_instruction(handler, thread_context)? {
            HandleResult::Move(relative_offset_in_bytes) => {
                let next_instruction_address =
                    thread_context.pc.instruction_address as isize + relative_offset_in_bytes;
                if next_instruction_address < 0 {
                    return Err(Trap::memory_error(
                        "branch target before the start of the function",
                    ));
                }
                thread_context.pc.instruction_address = next_instruction_address as usize;
            }
            HandleResult::Jump(next_pc) => {
                thread_context.pc = next_pc;
            }
            HandleResult::End(return_value) => {
                break return_value.expect_int();
            }
        }
    }
}

#[inline]
fn process_instruction(
    handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    let opcode_byte = thread_context.get_opcode_byte()?;
    let function = handler.handlers[opcode_byte as usize];
    function(handler, thread_context)
}
