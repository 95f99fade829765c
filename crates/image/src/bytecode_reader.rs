// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use c0vm_isa::opcode::Opcode;

/// Formats a code sequence as an address/bytes/mnemonic listing, e.g.
///
/// ```text
/// 0x0000  10 05        bipush 5
/// 0x0002  10 03        bipush 3
/// 0x0004  60           iadd
/// 0x0005  b0           return
/// ```
///
/// The listing is used by diagnostics (the invalid-opcode abort) and
/// by the driver's disassembly flag. Bytes that do not decode are
/// printed as `.byte`, so a listing can always be produced.
pub fn format_bytecode_as_text(code: &[u8]) -> String {
    let mut lines = Vec::new();
    let mut offset = 0;

    while offset < code.len() {
        let byte = code[offset];
        let (length, text) = match Opcode::from_u8(byte) {
            Some(opcode) => {
                let length = opcode.instruction_length();
                if offset + length > code.len() {
                    // the code ends inside the immediate
                    (code.len() - offset, format!("{} <truncated>", opcode))
                } else {
                    (length, format_instruction(opcode, &code[offset..offset + length]))
                }
            }
            None => (1, format!(".byte 0x{:02x}", byte)),
        };

        let bytes_text = code[offset..offset + length]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ");

        lines.push(format!("0x{:04x}  {:<11}  {}", offset, bytes_text, text));
        offset += length;
    }

    lines.join("\n")
}

fn format_instruction(opcode: Opcode, instruction: &[u8]) -> String {
    match opcode {
        // signed 8-bit immediate
        Opcode::bipush => format!("{} {}", opcode, instruction[1] as i8),

        // unsigned 8-bit immediate
        Opcode::vload
        | Opcode::vstore
        | Opcode::new
        | Opcode::newarray
        | Opcode::aaddf => format!("{} {}", opcode, instruction[1]),

        // unsigned 16-bit pool index
        Opcode::ildc | Opcode::aldc | Opcode::invokestatic | Opcode::invokenative => {
            let index = u16::from_be_bytes([instruction[1], instruction[2]]);
            format!("{} {}", opcode, index)
        }

        // signed 16-bit branch offset
        Opcode::if_cmpeq
        | Opcode::if_cmpne
        | Opcode::if_icmplt
        | Opcode::if_icmpge
        | Opcode::if_icmpgt
        | Opcode::if_icmple
        | Opcode::goto => {
            let offset = i16::from_be_bytes([instruction[1], instruction[2]]);
            format!("{} {:+}", opcode, offset)
        }

        _ => opcode.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use c0vm_isa::opcode::Opcode;

    use crate::{bytecode_reader::format_bytecode_as_text, bytecode_writer::BytecodeWriterHelper};

    #[test]
    fn test_format_bytecode_as_text() {
        let code = BytecodeWriterHelper::new()
            .append_opcode_i8(Opcode::bipush, -2)
            .append_opcode_u16(Opcode::ildc, 7)
            .append_opcode_i16(Opcode::goto, -3)
            .append_opcode(Opcode::r#return)
            .to_bytes();

        assert_eq!(
            format_bytecode_as_text(&code),
            "\
0x0000  10 fe        bipush -2
0x0002  13 00 07     ildc 7
0x0005  a7 ff fd     goto -3
0x0008  b0           return"
        );
    }

    #[test]
    fn test_format_unknown_and_truncated_bytes() {
        assert_eq!(
            format_bytecode_as_text(&[0x02, 0x10]),
            "\
0x0000  02           .byte 0x02
0x0001  10           bipush <truncated>"
        );
    }
}
