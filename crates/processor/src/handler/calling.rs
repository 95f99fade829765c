// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use c0vm_context::thread_context::{ProgramCounter, ThreadContext};
use c0vm_isa::Trap;
use c0vm_stack::Value;

use super::{HandleResult, Handler};

// the length of the instructions 'invokestatic' and 'invokenative' is
// 3 bytes, so the caller resumes just past the call site
const INVOKE_INSTRUCTION_LENGTH: usize = 3;

pub fn invokestatic(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    let function_index = thread_context.get_param_u16()? as usize;
    let function_entry = thread_context
        .program
        .function_pool
        .get(function_index)
        .ok_or_else(|| Trap::memory_error("function pool index out of range"))?;

    let num_args = function_entry.num_args as usize;
    let num_vars = function_entry.num_vars as usize;
    if num_vars < num_args {
        return Err(Trap::memory_error(
            "function declares fewer variables than arguments",
        ));
    }

    // the topmost num_args operands become the callee's first locals
    // in their original left-to-right order: the value popped last
    // lands in local 0
    let mut callee_locals = vec![Value::Int(0); num_vars];
    for local_index in (0..num_args).rev() {
        callee_locals[local_index] = thread_context.operand_stack.pop()?;
    }

    let return_address = thread_context.pc.instruction_address + INVOKE_INSTRUCTION_LENGTH;
    thread_context.push_frame(function_index, callee_locals, return_address);

    Ok(HandleResult::Jump(ProgramCounter {
        function_index,
        instruction_address: 0,
    }))
}

pub fn invokenative(
    handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    let native_index = thread_context.get_param_u16()? as usize;
    let native_entry = *thread_context
        .program
        .native_pool
        .get(native_index)
        .ok_or_else(|| Trap::memory_error("native pool index out of range"))?;

    let native_function = *handler
        .native_table
        .get(native_entry.function_table_index as usize)
        .ok_or_else(|| Trap::memory_error("native function table index out of range"))?;

    // arguments travel in a temporary buffer in left-to-right order;
    // no frame is created and the result lands back on the caller's
    // operand stack
    let num_args = native_entry.num_args as usize;
    let mut arguments = vec![Value::Int(0); num_args];
    for argument_index in (0..num_args).rev() {
        arguments[argument_index] = thread_context.operand_stack.pop()?;
    }

    let result = native_function(&mut thread_context.heap, &arguments)?;
    thread_context.operand_stack.push(result);

    Ok(HandleResult::Move(INVOKE_INSTRUCTION_LENGTH as isize))
}

pub fn r#return(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    let return_value = thread_context.operand_stack.pop()?;

    match thread_context.pop_frame() {
        Some(return_pc) => {
            // the running frame's stack and locals were dropped by
            // pop_frame; the caller receives the return value
            thread_context.operand_stack.push(return_value);
            Ok(HandleResult::Jump(return_pc))
        }
        None => Ok(HandleResult::End(return_value)),
    }
}
