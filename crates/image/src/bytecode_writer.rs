// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::io::Write;

use c0vm_isa::opcode::Opcode;

/// Encodes a sequence of instructions. 16-bit immediates are written
/// big-endian, matching the wire format the machine decodes.
pub struct BytecodeWriter {
    buffer: Vec<u8>, // trait std::io::Write
}

impl BytecodeWriter {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            buffer: Vec::<u8>::new(),
        }
    }

    fn get_addr(&self) -> usize {
        self.buffer.len()
    }

    fn put_u8(&mut self, value: u8) {
        self.buffer.write_all(&[value]).unwrap();
    }

    fn put_u16(&mut self, value: u16) {
        let data = value.to_be_bytes();
        self.buffer.write_all(&data).unwrap();
    }

    fn put_opcode(&mut self, opcode: Opcode) -> usize {
        let addr = self.get_addr();
        self.put_u8(opcode as u8);
        addr
    }

    /// 8-bit instruction, no immediate.
    ///
    /// return the address of the instruction
    pub fn write_opcode(&mut self, opcode: Opcode) -> usize {
        self.put_opcode(opcode)
    }

    /// 16-bit instruction
    /// opcode 8 + signed param 8
    pub fn write_opcode_i8(&mut self, opcode: Opcode, value: i8) -> usize {
        let addr = self.put_opcode(opcode);
        self.put_u8(value as u8);
        addr
    }

    /// 16-bit instruction
    /// opcode 8 + unsigned param 8
    pub fn write_opcode_u8(&mut self, opcode: Opcode, value: u8) -> usize {
        let addr = self.put_opcode(opcode);
        self.put_u8(value);
        addr
    }

    /// 24-bit instruction
    /// opcode 8 + unsigned param 16 (big-endian), for pool indices
    pub fn write_opcode_u16(&mut self, opcode: Opcode, value: u16) -> usize {
        let addr = self.put_opcode(opcode);
        self.put_u16(value);
        addr
    }

    /// 24-bit instruction
    /// opcode 8 + signed param 16 (big-endian), for branch offsets
    /// relative to the instruction's own address
    pub fn write_opcode_i16(&mut self, opcode: Opcode, value: i16) -> usize {
        let addr = self.put_opcode(opcode);
        self.put_u16(value as u16);
        addr
    }

    pub fn to_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// A chaining wrapper around `BytecodeWriter` for building test
/// functions in a single expression.
pub struct BytecodeWriterHelper {
    writer: BytecodeWriter,
}

impl BytecodeWriterHelper {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            writer: BytecodeWriter::new(),
        }
    }

    pub fn append_opcode(mut self, opcode: Opcode) -> Self {
        self.writer.write_opcode(opcode);
        self
    }

    pub fn append_opcode_i8(mut self, opcode: Opcode, value: i8) -> Self {
        self.writer.write_opcode_i8(opcode, value);
        self
    }

    pub fn append_opcode_u8(mut self, opcode: Opcode, value: u8) -> Self {
        self.writer.write_opcode_u8(opcode, value);
        self
    }

    pub fn append_opcode_u16(mut self, opcode: Opcode, value: u16) -> Self {
        self.writer.write_opcode_u16(opcode, value);
        self
    }

    pub fn append_opcode_i16(mut self, opcode: Opcode, value: i16) -> Self {
        self.writer.write_opcode_i16(opcode, value);
        self
    }

    pub fn to_bytes(self) -> Vec<u8> {
        self.writer.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use c0vm_isa::opcode::Opcode;

    use crate::bytecode_writer::{BytecodeWriter, BytecodeWriterHelper};

    #[test]
    fn test_write_instructions() {
        let mut writer = BytecodeWriter::new();
        let addr0 = writer.write_opcode_i8(Opcode::bipush, -3);
        let addr1 = writer.write_opcode(Opcode::iadd);
        let addr2 = writer.write_opcode_u16(Opcode::ildc, 0x0102);

        assert_eq!(addr0, 0);
        assert_eq!(addr1, 2);
        assert_eq!(addr2, 3);
        assert_eq!(
            writer.to_bytes(),
            vec![0x10, 0xfd, 0x60, 0x13, 0x01, 0x02]
        );
    }

    #[test]
    fn test_helper_chaining() {
        // 0x0000  10 05     bipush 5
        // 0x0002  10 03     bipush 3
        // 0x0004  60        iadd
        // 0x0005  b0        return
        let code = BytecodeWriterHelper::new()
            .append_opcode_i8(Opcode::bipush, 5)
            .append_opcode_i8(Opcode::bipush, 3)
            .append_opcode(Opcode::iadd)
            .append_opcode(Opcode::r#return)
            .to_bytes();

        assert_eq!(code, vec![0x10, 0x05, 0x10, 0x03, 0x60, 0xb0]);
    }

    #[test]
    fn test_signed_branch_offset_encoding() {
        // a backward branch: the offset bytes are the big-endian
        // two's complement of -4
        let code = BytecodeWriterHelper::new()
            .append_opcode(Opcode::nop)
            .append_opcode(Opcode::nop)
            .append_opcode(Opcode::nop)
            .append_opcode(Opcode::nop)
            .append_opcode_i16(Opcode::goto, -4)
            .to_bytes();

        assert_eq!(code[4..], [0xa7, 0xff, 0xfc]);
    }
}
