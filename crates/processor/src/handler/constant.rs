// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use c0vm_context::{heap::STRING_POOL_BLOCK, thread_context::ThreadContext};
use c0vm_isa::Trap;
use c0vm_stack::Reference;

use super::{HandleResult, Handler};

pub fn bipush(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    // the immediate byte is sign-extended to 32 bits
    let value = thread_context.get_param_i8()? as i32;
    thread_context.operand_stack.push_int(value);
    Ok(HandleResult::Move(2))
}

pub fn ildc(_handler: &Handler, thread_context: &mut ThreadContext) -> Result<HandleResult, Trap> {
    let index = thread_context.get_param_u16()? as usize;
    let value = *thread_context
        .program
        .int_pool
        .get(index)
        .ok_or_else(|| Trap::memory_error("int pool index out of range"))?;
    thread_context.operand_stack.push_int(value);
    Ok(HandleResult::Move(3))
}

pub fn aldc(_handler: &Handler, thread_context: &mut ThreadContext) -> Result<HandleResult, Trap> {
    let offset = thread_context.get_param_u16()?;
    if offset as usize >= thread_context.program.string_pool.len() {
        return Err(Trap::memory_error("string pool offset out of range"));
    }
    thread_context
        .operand_stack
        .push_ref(Reference::new(STRING_POOL_BLOCK, offset as u32));
    Ok(HandleResult::Move(3))
}

pub fn aconst_null(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    thread_context.operand_stack.push_ref(Reference::NULL);
    Ok(HandleResult::Move(1))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use c0vm_image::{
        bytecode_writer::BytecodeWriterHelper,
        utils::{
            helper_build_program, helper_build_program_with_single_function,
            helper_build_string_pool,
        },
        FunctionEntry,
    };
    use c0vm_isa::{opcode::Opcode, TrapKind};

    use crate::process::execute;

    #[test]
    fn test_handler_constant_bipush_sign_extension() {
        // bytecodes
        //
        // 0x0000  10 80     bipush -128
        // 0x0002  b0        return
        let code0 = BytecodeWriterHelper::new()
            .append_opcode_i8(Opcode::bipush, -128)
            .append_opcode(Opcode::r#return)
            .to_bytes();

        let program0 = helper_build_program_with_single_function(0, 0, code0);
        assert_eq!(execute(&program0).unwrap(), -128);
    }

    #[test]
    fn test_handler_constant_ildc() {
        // the int pool carries values `bipush` cannot encode
        let code0 = BytecodeWriterHelper::new()
            .append_opcode_u16(Opcode::ildc, 1)
            .append_opcode(Opcode::r#return)
            .to_bytes();

        let program0 = helper_build_program(
            vec![7, 1_000_000, -3],
            vec![],
            vec![FunctionEntry {
                num_args: 0,
                num_vars: 0,
                code: code0,
            }],
            vec![],
        );
        assert_eq!(execute(&program0).unwrap(), 1_000_000);
    }

    #[test]
    fn test_handler_constant_ildc_index_out_of_range() {
        let code0 = BytecodeWriterHelper::new()
            .append_opcode_u16(Opcode::ildc, 0)
            .append_opcode(Opcode::r#return)
            .to_bytes();

        let program0 = helper_build_program_with_single_function(0, 0, code0);
        assert_eq!(execute(&program0).unwrap_err().kind, TrapKind::MemoryError);
    }

    #[test]
    fn test_handler_constant_aldc() {
        // the reference points at the first byte of the selected
        // string, so `cmload` reads back 's' of "south"
        let (string_pool, offsets) = helper_build_string_pool(&["north", "south"]);

        let code0 = BytecodeWriterHelper::new()
            .append_opcode_u16(Opcode::aldc, offsets[1])
            .append_opcode(Opcode::cmload)
            .append_opcode(Opcode::r#return)
            .to_bytes();

        let program0 = helper_build_program(
            vec![],
            string_pool,
            vec![FunctionEntry {
                num_args: 0,
                num_vars: 0,
                code: code0,
            }],
            vec![],
        );
        assert_eq!(execute(&program0).unwrap(), 's' as i32);
    }

    #[test]
    fn test_handler_constant_aconst_null_equality() {
        // two null references compare equal
        //
        // 0x0000  01           aconst_null
        // 0x0001  01           aconst_null
        // 0x0002  9f 00 06     if_cmpeq +6    ; -> 0x0008
        // 0x0005  10 00        bipush 0
        // 0x0007  b0           return
        // 0x0008  10 01        bipush 1
        // 0x000a  b0           return
        let code0 = BytecodeWriterHelper::new()
            .append_opcode(Opcode::aconst_null)
            .append_opcode(Opcode::aconst_null)
            .append_opcode_i16(Opcode::if_cmpeq, 6)
            .append_opcode_i8(Opcode::bipush, 0)
            .append_opcode(Opcode::r#return)
            .append_opcode_i8(Opcode::bipush, 1)
            .append_opcode(Opcode::r#return)
            .to_bytes();

        let program0 = helper_build_program_with_single_function(0, 0, code0);
        assert_eq!(execute(&program0).unwrap(), 1);
    }
}
