// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// Every load and store below traps with a memory error when the
// popped reference is null; the heap performs the check and the
// range validation of the addressed cell.

use c0vm_context::thread_context::ThreadContext;
use c0vm_isa::Trap;

use super::{HandleResult, Handler};

pub fn new(_handler: &Handler, thread_context: &mut ThreadContext) -> Result<HandleResult, Trap> {
    let size = thread_context.get_param_u8()? as usize;
    let reference = thread_context.heap.allocate(size);
    thread_context.operand_stack.push_ref(reference);
    Ok(HandleResult::Move(2))
}

pub fn imload(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    let address = thread_context.operand_stack.pop_ref()?;
    let value = thread_context.heap.read_i32(address)?;
    thread_context.operand_stack.push_int(value);
    Ok(HandleResult::Move(1))
}

pub fn imstore(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    let value = thread_context.operand_stack.pop_int()?;
    let address = thread_context.operand_stack.pop_ref()?;
    thread_context.heap.write_i32(address, value)?;
    Ok(HandleResult::Move(1))
}

pub fn amload(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    let address = thread_context.operand_stack.pop_ref()?;
    let value = thread_context.heap.read_ref(address)?;
    thread_context.operand_stack.push_ref(value);
    Ok(HandleResult::Move(1))
}

pub fn amstore(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    let value = thread_context.operand_stack.pop_ref()?;
    let address = thread_context.operand_stack.pop_ref()?;
    thread_context.heap.write_ref(address, value)?;
    Ok(HandleResult::Move(1))
}

pub fn cmload(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    let address = thread_context.operand_stack.pop_ref()?;
    let value = thread_context.heap.read_i8(address)?;
    thread_context.operand_stack.push_int(value as i32);
    Ok(HandleResult::Move(1))
}

pub fn cmstore(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    let value = thread_context.operand_stack.pop_int()?;
    let address = thread_context.operand_stack.pop_ref()?;
    // character cells hold 7-bit values
    thread_context.heap.write_i8(address, (value & 0x7f) as u8)?;
    Ok(HandleResult::Move(1))
}

pub fn aaddf(_handler: &Handler, thread_context: &mut ThreadContext) -> Result<HandleResult, Trap> {
    let field_offset = thread_context.get_param_u8()?;
    let address = thread_context.operand_stack.pop_ref()?;
    if address.is_null() {
        return Err(Trap::memory_error("null reference"));
    }
    // no dereference and no range check here; the result is validated
    // when it is used
    thread_context
        .operand_stack
        .push_ref(address.add_offset(field_offset as u32));
    Ok(HandleResult::Move(2))
}
