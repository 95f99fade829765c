// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use c0vm_context::thread_context::ThreadContext;
use c0vm_isa::Trap;

use super::{HandleResult, Handler};

pub fn vload(_handler: &Handler, thread_context: &mut ThreadContext) -> Result<HandleResult, Trap> {
    let index = thread_context.get_param_u8()? as usize;
    let value = *thread_context
        .locals
        .get(index)
        .ok_or_else(|| Trap::memory_error("local variable index out of range"))?;
    thread_context.operand_stack.push(value);
    Ok(HandleResult::Move(2))
}

pub fn vstore(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    let index = thread_context.get_param_u8()? as usize;
    let value = thread_context.operand_stack.pop()?;
    let slot = thread_context
        .locals
        .get_mut(index)
        .ok_or_else(|| Trap::memory_error("local variable index out of range"))?;
    *slot = value;
    Ok(HandleResult::Move(2))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use c0vm_image::{
        bytecode_writer::BytecodeWriterHelper,
        utils::helper_build_program_with_single_function,
    };
    use c0vm_isa::{opcode::Opcode, TrapKind};

    use crate::process::execute;

    #[test]
    fn test_handler_local_store_load_round_trip() {
        // bytecodes
        //
        // 0x0000  10 17     bipush 23
        // 0x0002  36 01     vstore 1
        // 0x0004  15 01     vload 1
        // 0x0006  b0        return
        let code0 = BytecodeWriterHelper::new()
            .append_opcode_i8(Opcode::bipush, 23)
            .append_opcode_u8(Opcode::vstore, 1)
            .append_opcode_u8(Opcode::vload, 1)
            .append_opcode(Opcode::r#return)
            .to_bytes();

        let program0 = helper_build_program_with_single_function(0, 2, code0);
        assert_eq!(execute(&program0).unwrap(), 23);
    }

    #[test]
    fn test_handler_local_never_stored_slot_reads_zero() {
        let code0 = BytecodeWriterHelper::new()
            .append_opcode_u8(Opcode::vload, 0)
            .append_opcode(Opcode::r#return)
            .to_bytes();

        let program0 = helper_build_program_with_single_function(0, 1, code0);
        assert_eq!(execute(&program0).unwrap(), 0);
    }

    #[test]
    fn test_handler_local_index_out_of_range() {
        let code0 = BytecodeWriterHelper::new()
            .append_opcode_u8(Opcode::vload, 3)
            .append_opcode(Opcode::r#return)
            .to_bytes();

        let program0 = helper_build_program_with_single_function(0, 1, code0);
        assert_eq!(execute(&program0).unwrap_err().kind, TrapKind::MemoryError);
    }
}
