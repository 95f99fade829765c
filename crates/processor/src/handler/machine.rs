// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use c0vm_context::thread_context::ThreadContext;
use c0vm_isa::Trap;

use super::{HandleResult, Handler};

pub fn athrow(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    let message_reference = thread_context.operand_stack.pop_ref()?;
    let message = thread_context.heap.read_string(message_reference)?;
    Err(Trap::user_error(message))
}

pub fn assert(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    let message_reference = thread_context.operand_stack.pop_ref()?;
    let condition = thread_context.operand_stack.pop_int()?;
    if condition == 0 {
        let message = thread_context.heap.read_string(message_reference)?;
        Err(Trap::assertion_failure(message))
    } else {
        Ok(HandleResult::Move(1))
    }
}
