// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// The machine keeps the state of the running function as four mutable
// registers (operand stack, program counter, locals, current function)
// for dispatch speed. On a static call the registers are bundled into
// a `Frame` and pushed onto the call stack; on return the topmost
// suspended frame is restored. The call stack therefore holds only
// suspended frames, never the running one.

use c0vm_image::Program;
use c0vm_isa::Trap;
use c0vm_stack::{OperandStack, Value};

use crate::heap::Heap;

/// The location of the next instruction: which function, and the byte
/// address of the instruction inside its code.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ProgramCounter {
    pub function_index: usize,
    pub instruction_address: usize,
}

/// A suspended activation record.
#[derive(Debug)]
pub struct Frame {
    pub operand_stack: OperandStack,
    pub locals: Vec<Value>,
    pub function_index: usize,

    /// Where execution resumes inside the suspended function.
    pub return_address: usize,
}

pub struct ThreadContext<'a> {
    pub operand_stack: OperandStack,
    pub pc: ProgramCounter,
    pub locals: Vec<Value>,
    pub call_stack: Vec<Frame>,
    pub heap: Heap,
    pub program: &'a Program,
}

impl<'a> ThreadContext<'a> {
    /// A context positioned at the first instruction of the entry
    /// function, with an empty operand stack and zeroed locals.
    pub fn new(program: &'a Program) -> Self {
        let entry = program.entry_function();
        Self {
            operand_stack: OperandStack::new(),
            pc: ProgramCounter {
                function_index: 0,
                instruction_address: 0,
            },
            locals: vec![Value::Int(0); entry.num_vars as usize],
            call_stack: Vec::new(),
            heap: Heap::new(&program.string_pool),
            program,
        }
    }

    pub fn current_code(&self) -> &[u8] {
        &self.program.function_pool[self.pc.function_index].code
    }

    fn code_byte(&self, address: usize) -> Result<u8, Trap> {
        self.current_code()
            .get(address)
            .copied()
            .ok_or_else(|| Trap::memory_error("program counter outside the function code"))
    }

    /// The opcode byte at the program counter.
    pub fn get_opcode_byte(&self) -> Result<u8, Trap> {
        self.code_byte(self.pc.instruction_address)
    }

    /// The unsigned byte immediate following the opcode.
    pub fn get_param_u8(&self) -> Result<u8, Trap> {
        self.code_byte(self.pc.instruction_address + 1)
    }

    /// The signed byte immediate following the opcode.
    pub fn get_param_i8(&self) -> Result<i8, Trap> {
        Ok(self.get_param_u8()? as i8)
    }

    /// The big-endian 16-bit immediate following the opcode, read
    /// unsigned (pool indices).
    pub fn get_param_u16(&self) -> Result<u16, Trap> {
        let high = self.code_byte(self.pc.instruction_address + 1)?;
        let low = self.code_byte(self.pc.instruction_address + 2)?;
        Ok(u16::from_be_bytes([high, low]))
    }

    /// The big-endian 16-bit immediate following the opcode, read
    /// signed (branch offsets).
    pub fn get_param_i16(&self) -> Result<i16, Trap> {
        Ok(self.get_param_u16()? as i16)
    }

    /// Suspends the running frame onto the call stack and installs
    /// fresh registers for the callee. The caller resumes at
    /// `return_address` of its own code.
    pub fn push_frame(
        &mut self,
        callee_function_index: usize,
        callee_locals: Vec<Value>,
        return_address: usize,
    ) {
        let suspended = Frame {
            operand_stack: std::mem::take(&mut self.operand_stack),
            locals: std::mem::replace(&mut self.locals, callee_locals),
            function_index: self.pc.function_index,
            return_address,
        };
        self.call_stack.push(suspended);
    }

    /// Restores the topmost suspended frame, or `None` when the entry
    /// frame itself is returning. The running frame's operand stack
    /// and locals are dropped here.
    pub fn pop_frame(&mut self) -> Option<ProgramCounter> {
        let frame = self.call_stack.pop()?;
        self.operand_stack = frame.operand_stack;
        self.locals = frame.locals;
        Some(ProgramCounter {
            function_index: frame.function_index,
            instruction_address: frame.return_address,
        })
    }
}
