// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use c0vm_context::thread_context::{ProgramCounter, ThreadContext};
use c0vm_image::bytecode_reader::format_bytecode_as_text;
use c0vm_isa::{opcode::Opcode, Trap};
use c0vm_stack::Value;

use crate::native::{default_native_table, NativeFunction};

pub type HandleFunc = fn(&Handler, &mut ThreadContext) -> Result<HandleResult, Trap>;

mod arithmetic;
mod array;
mod calling;
mod constant;
mod control_flow;
mod fundamental;
mod local;
mod machine;
mod memory;

pub enum HandleResult {
    // move to another address within the current function.
    // param (relative_offset_in_bytes: isize)
    //
    // the offset is relative to the address of the current instruction,
    // so for an instruction without immediates the next instruction is
    // `Move(1)`, and a taken branch is `Move(branch offset)`.
    Move(isize),

    // jump to another function (call), or return from a function
    // call (return).
    // param (next_pc: ProgramCounter)
    Jump(ProgramCounter),

    // the entry function returned and the program is finished.
    // param (return_value: Value)
    End(Value),
}

fn invalid_opcode_handler(
    _handler: &Handler,
    thread_context: &mut ThreadContext,
) -> Result<HandleResult, Trap> {
    let pc = &thread_context.pc;
    let code_text = format_bytecode_as_text(thread_context.current_code());

    Err(Trap::invalid_opcode(format!(
        "\
opcode 0x{:02x} is not an instruction
function index: {}
instruction address: 0x{:04x}
bytecode:
{}",
        thread_context.get_opcode_byte()?,
        pc.function_index,
        pc.instruction_address,
        code_text
    )))
}

pub struct Handler {
    pub handlers: [HandleFunc; c0vm_isa::opcode::MAX_OPCODE_NUMBER],
    pub native_table: Vec<NativeFunction>,
}

impl Handler {
    /// A handler wired to the default native-function table.
    pub fn new() -> Self {
        Self::with_native_table(default_native_table())
    }

    pub fn with_native_table(native_table: Vec<NativeFunction>) -> Self {
        let mut handlers: [HandleFunc; c0vm_isa::opcode::MAX_OPCODE_NUMBER] =
            [invalid_opcode_handler; c0vm_isa::opcode::MAX_OPCODE_NUMBER];

        // operand stack
        handlers[Opcode::nop as usize] = fundamental::nop;
        handlers[Opcode::pop as usize] = fundamental::pop;
        handlers[Opcode::dup as usize] = fundamental::dup;
        handlers[Opcode::swap as usize] = fundamental::swap;

        // constants
        handlers[Opcode::bipush as usize] = constant::bipush;
        handlers[Opcode::ildc as usize] = constant::ildc;
        handlers[Opcode::aldc as usize] = constant::aldc;
        handlers[Opcode::aconst_null as usize] = constant::aconst_null;

        // arithmetic
        handlers[Opcode::iadd as usize] = arithmetic::iadd;
        handlers[Opcode::isub as usize] = arithmetic::isub;
        handlers[Opcode::imul as usize] = arithmetic::imul;
        handlers[Opcode::idiv as usize] = arithmetic::idiv;
        handlers[Opcode::irem as usize] = arithmetic::irem;
        handlers[Opcode::iand as usize] = arithmetic::iand;
        handlers[Opcode::ior as usize] = arithmetic::ior;
        handlers[Opcode::ixor as usize] = arithmetic::ixor;
        handlers[Opcode::ishl as usize] = arithmetic::ishl;
        handlers[Opcode::ishr as usize] = arithmetic::ishr;

        // local variables
        handlers[Opcode::vload as usize] = local::vload;
        handlers[Opcode::vstore as usize] = local::vstore;

        // control flow
        handlers[Opcode::goto as usize] = control_flow::goto;
        handlers[Opcode::if_cmpeq as usize] = control_flow::if_cmpeq;
        handlers[Opcode::if_cmpne as usize] = control_flow::if_cmpne;
        handlers[Opcode::if_icmplt as usize] = control_flow::if_icmplt;
        handlers[Opcode::if_icmpge as usize] = control_flow::if_icmpge;
        handlers[Opcode::if_icmpgt as usize] = control_flow::if_icmpgt;
        handlers[Opcode::if_icmple as usize] = control_flow::if_icmple;

        // assertions and errors
        handlers[Opcode::athrow as usize] = machine::athrow;
        handlers[Opcode::assert as usize] = machine::assert;

        // memory
        handlers[Opcode::new as usize] = memory::new;
        handlers[Opcode::imload as usize] = memory::imload;
        handlers[Opcode::imstore as usize] = memory::imstore;
        handlers[Opcode::amload as usize] = memory::amload;
        handlers[Opcode::amstore as usize] = memory::amstore;
        handlers[Opcode::cmload as usize] = memory::cmload;
        handlers[Opcode::cmstore as usize] = memory::cmstore;
        handlers[Opcode::aaddf as usize] = memory::aaddf;

        // arrays
        handlers[Opcode::newarray as usize] = array::newarray;
        handlers[Opcode::arraylength as usize] = array::arraylength;
        handlers[Opcode::aadds as usize] = array::aadds;

        // calling
        handlers[Opcode::invokestatic as usize] = calling::invokestatic;
        handlers[Opcode::invokenative as usize] = calling::invokenative;
        handlers[Opcode::r#return as usize] = calling::r#return;

        Self {
            handlers,
            native_table,
        }
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}
