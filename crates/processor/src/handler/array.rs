// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use c0vm_context::thread_context::ThreadContext;
use c0vm_isa::Trap;
use c0vm_stack::Reference;

use super::{HandleResult, Handler};

pub fn newarray(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    let elt_size = thread_context.get_param_u8()? as u32;
    let count = thread_context.operand_stack.pop_int()?;
    if count < 0 {
        return Err(Trap::memory_error("negative array length"));
    }
    if count == 0 {
        // an empty array owns no storage at all
        thread_context.operand_stack.push_ref(Reference::NULL);
        return Ok(HandleResult::Move(2));
    }
    if elt_size == 0 {
        return Err(Trap::memory_error("zero array element size"));
    }
    let reference = thread_context.heap.allocate_array(count as u32, elt_size);
    thread_context.operand_stack.push_ref(reference);
    Ok(HandleResult::Move(2))
}

pub fn arraylength(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    let array = thread_context.operand_stack.pop_ref()?;
    let header = thread_context.heap.array_header(array)?;
    thread_context.operand_stack.push_int(header.count as i32);
    Ok(HandleResult::Move(1))
}

pub fn aadds(_handler: &Handler, thread_context: &mut ThreadContext) -> Result<HandleResult, Trap> {
    let index = thread_context.operand_stack.pop_int()?;
    let array = thread_context.operand_stack.pop_ref()?;
    let header = thread_context.heap.array_header(array)?;
    if index < 0 || index as u32 >= header.count {
        return Err(Trap::memory_error("array index out of bounds"));
    }
    thread_context
        .operand_stack
        .push_ref(Reference::new(array.block, index as u32 * header.elt_size));
    Ok(HandleResult::Move(1))
}
