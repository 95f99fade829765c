// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// The native-function table
// -------------------------
//
// Host functions are reached through two levels of indirection: an
// `invokenative` instruction names an entry of the image's native
// pool, and the entry's `function_table_index` selects a slot of this
// table. The slot numbering below is therefore part of the contract
// between the compiler and the host and must not be reordered.
//
// A native function receives the popped argument buffer in
// left-to-right order. Because references are opaque handles, the
// heap travels along so string arguments can be followed and string
// results can be allocated. No frame is created for a native call,
// and a native function never re-enters the interpreter.
//
// Strings are NUL-terminated byte sequences; the result of a
// string-producing native is a fresh heap allocation.

use std::io::{BufRead, Write};

use c0vm_context::heap::Heap;
use c0vm_isa::Trap;
use c0vm_stack::Value;

pub type NativeFunction = fn(&mut Heap, &[Value]) -> Result<Value, Trap>;

pub const NATIVE_PRINT: u16 = 0;
pub const NATIVE_PRINTLN: u16 = 1;
pub const NATIVE_PRINTINT: u16 = 2;
pub const NATIVE_PRINTBOOL: u16 = 3;
pub const NATIVE_PRINTCHAR: u16 = 4;
pub const NATIVE_READLINE: u16 = 5;
pub const NATIVE_STRING_LENGTH: u16 = 6;
pub const NATIVE_STRING_CHARAT: u16 = 7;
pub const NATIVE_STRING_JOIN: u16 = 8;
pub const NATIVE_STRING_SUB: u16 = 9;
pub const NATIVE_STRING_COMPARE: u16 = 10;
pub const NATIVE_STRING_EQUAL: u16 = 11;
pub const NATIVE_STRING_FROMINT: u16 = 12;
pub const NATIVE_STRING_FROMBOOL: u16 = 13;
pub const NATIVE_STRING_FROMCHAR: u16 = 14;
pub const NATIVE_CHAR_ORD: u16 = 15;
pub const NATIVE_CHAR_CHR: u16 = 16;

pub fn default_native_table() -> Vec<NativeFunction> {
    vec![
        native_print,
        native_println,
        native_printint,
        native_printbool,
        native_printchar,
        native_readline,
        native_string_length,
        native_string_charat,
        native_string_join,
        native_string_sub,
        native_string_compare,
        native_string_equal,
        native_string_fromint,
        native_string_frombool,
        native_string_fromchar,
        native_char_ord,
        native_char_chr,
    ]
}

fn argument(arguments: &[Value], index: usize) -> Result<Value, Trap> {
    arguments
        .get(index)
        .copied()
        .ok_or_else(|| Trap::memory_error("missing native argument"))
}

fn string_argument(heap: &Heap, arguments: &[Value], index: usize) -> Result<Vec<u8>, Trap> {
    let reference = argument(arguments, index)?.expect_ref()?;
    Ok(heap.read_string_bytes(reference)?.to_vec())
}

// void natives return the integer 0

fn native_print(heap: &mut Heap, arguments: &[Value]) -> Result<Value, Trap> {
    let bytes = string_argument(heap, arguments, 0)?;
    print!("{}", String::from_utf8_lossy(&bytes));
    let _ = std::io::stdout().flush();
    Ok(Value::Int(0))
}

fn native_println(heap: &mut Heap, arguments: &[Value]) -> Result<Value, Trap> {
    let bytes = string_argument(heap, arguments, 0)?;
    println!("{}", String::from_utf8_lossy(&bytes));
    Ok(Value::Int(0))
}

fn native_printint(_heap: &mut Heap, arguments: &[Value]) -> Result<Value, Trap> {
    let value = argument(arguments, 0)?.expect_int()?;
    print!("{}", value);
    let _ = std::io::stdout().flush();
    Ok(Value::Int(0))
}

fn native_printbool(_heap: &mut Heap, arguments: &[Value]) -> Result<Value, Trap> {
    let value = argument(arguments, 0)?.expect_int()?;
    print!("{}", if value == 0 { "false" } else { "true" });
    let _ = std::io::stdout().flush();
    Ok(Value::Int(0))
}

fn native_printchar(_heap: &mut Heap, arguments: &[Value]) -> Result<Value, Trap> {
    let value = argument(arguments, 0)?.expect_int()?;
    print!("{}", char_from_code(value)?);
    let _ = std::io::stdout().flush();
    Ok(Value::Int(0))
}

fn native_readline(heap: &mut Heap, _arguments: &[Value]) -> Result<Value, Trap> {
    let mut line = String::new();
    let count = std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|error| Trap::user_error(format!("readline: {}", error)))?;
    if count == 0 {
        return Err(Trap::user_error("readline: end of input"));
    }
    let trimmed = line.trim_end_matches('\n');
    Ok(Value::Ref(heap.allocate_string(trimmed.as_bytes())))
}

fn native_string_length(heap: &mut Heap, arguments: &[Value]) -> Result<Value, Trap> {
    let bytes = string_argument(heap, arguments, 0)?;
    Ok(Value::Int(bytes.len() as i32))
}

fn native_string_charat(heap: &mut Heap, arguments: &[Value]) -> Result<Value, Trap> {
    let bytes = string_argument(heap, arguments, 0)?;
    let index = argument(arguments, 1)?.expect_int()?;
    if index < 0 || index as usize >= bytes.len() {
        return Err(Trap::memory_error("string index out of bounds"));
    }
    Ok(Value::Int(bytes[index as usize] as i32))
}

fn native_string_join(heap: &mut Heap, arguments: &[Value]) -> Result<Value, Trap> {
    let mut bytes = string_argument(heap, arguments, 0)?;
    bytes.extend_from_slice(&string_argument(heap, arguments, 1)?);
    Ok(Value::Ref(heap.allocate_string(&bytes)))
}

// the substring [start, end), with 0 <= start <= end <= length
fn native_string_sub(heap: &mut Heap, arguments: &[Value]) -> Result<Value, Trap> {
    let bytes = string_argument(heap, arguments, 0)?;
    let start = argument(arguments, 1)?.expect_int()?;
    let end = argument(arguments, 2)?.expect_int()?;
    if start < 0 || end < start || end as usize > bytes.len() {
        return Err(Trap::memory_error("substring range out of bounds"));
    }
    Ok(Value::Ref(
        heap.allocate_string(&bytes[start as usize..end as usize]),
    ))
}

fn native_string_compare(heap: &mut Heap, arguments: &[Value]) -> Result<Value, Trap> {
    let left = string_argument(heap, arguments, 0)?;
    let right = string_argument(heap, arguments, 1)?;
    let ordering = match left.cmp(&right) {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    };
    Ok(Value::Int(ordering))
}

fn native_string_equal(heap: &mut Heap, arguments: &[Value]) -> Result<Value, Trap> {
    let left = string_argument(heap, arguments, 0)?;
    let right = string_argument(heap, arguments, 1)?;
    Ok(Value::Int((left == right) as i32))
}

fn native_string_fromint(heap: &mut Heap, arguments: &[Value]) -> Result<Value, Trap> {
    let value = argument(arguments, 0)?.expect_int()?;
    Ok(Value::Ref(heap.allocate_string(value.to_string().as_bytes())))
}

fn native_string_frombool(heap: &mut Heap, arguments: &[Value]) -> Result<Value, Trap> {
    let value = argument(arguments, 0)?.expect_int()?;
    let text: &[u8] = if value == 0 { b"false" } else { b"true" };
    Ok(Value::Ref(heap.allocate_string(text)))
}

fn native_string_fromchar(heap: &mut Heap, arguments: &[Value]) -> Result<Value, Trap> {
    let value = argument(arguments, 0)?.expect_int()?;
    let byte = char_from_code(value)? as u8;
    Ok(Value::Ref(heap.allocate_string(&[byte])))
}

fn native_char_ord(_heap: &mut Heap, arguments: &[Value]) -> Result<Value, Trap> {
    let value = argument(arguments, 0)?.expect_int()?;
    char_from_code(value)?;
    Ok(Value::Int(value))
}

fn native_char_chr(_heap: &mut Heap, arguments: &[Value]) -> Result<Value, Trap> {
    let value = argument(arguments, 0)?.expect_int()?;
    char_from_code(value)?;
    Ok(Value::Int(value))
}

// characters are 7-bit ASCII
fn char_from_code(value: i32) -> Result<char, Trap> {
    if (0..128).contains(&value) {
        Ok(value as u8 as char)
    } else {
        Err(Trap::value_error("character code out of range"))
    }
}
