// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// The bc0 container
// -----------------
//
// A bc0 file is a text file: `#` starts a comment that runs to the end
// of the line, and every remaining whitespace-separated token is one
// byte written as two hex digits. The decoded byte stream is, with all
// multi-byte fields big-endian:
//
// ```text
// magic           4 bytes   c0 c0 ff ee
// version         2 bytes
// int count       2 bytes
// int pool        4 bytes each, two's complement
// string size     2 bytes
// string pool     byte buffer of NUL-terminated strings
// function count  2 bytes
// per function:
//   num_args      2 bytes
//   num_vars      2 bytes
//   code length   2 bytes
//   code          bytes
// native count    2 bytes
// per native:
//   num_args      2 bytes
//   table index   2 bytes
// ```

use std::fmt::Display;

use crate::program::{FunctionEntry, NativeEntry, Program};

pub const BC0_MAGIC: [u8; 4] = [0xc0, 0xc0, 0xff, 0xee];

#[derive(Debug, PartialEq, Eq)]
pub enum LoadError {
    // a token that is not exactly two hex digits
    InvalidToken(String),

    // the byte stream ended inside the named field
    UnexpectedEof(&'static str),

    BadMagic([u8; 4]),

    // the function pool is empty, so there is no entry function
    NoEntryFunction,

    // bytes left over after the native pool
    TrailingBytes(usize),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::InvalidToken(token) => {
                write!(f, "Load error: \"{}\" is not a hex byte.", token)
            }
            LoadError::UnexpectedEof(field) => {
                write!(f, "Load error: the file ends inside the {}.", field)
            }
            LoadError::BadMagic(bytes) => write!(
                f,
                "Load error: bad magic number {:02x} {:02x} {:02x} {:02x}.",
                bytes[0], bytes[1], bytes[2], bytes[3]
            ),
            LoadError::NoEntryFunction => {
                f.write_str("Load error: the function pool is empty.")
            }
            LoadError::TrailingBytes(count) => {
                write!(f, "Load error: {} bytes left over after the native pool.", count)
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Loads a program from the textual bc0 form.
pub fn load_program_text(text: &str) -> Result<Program, LoadError> {
    let bytes = parse_hex_stream(text)?;
    load_program_bytes(&bytes)
}

/// Loads a program from an already-decoded bc0 byte stream.
pub fn load_program_bytes(bytes: &[u8]) -> Result<Program, LoadError> {
    let mut reader = ByteReader::new(bytes);

    let magic = reader.read_bytes(4, "magic number")?;
    if magic != BC0_MAGIC {
        let mut found = [0u8; 4];
        found.copy_from_slice(magic);
        return Err(LoadError::BadMagic(found));
    }

    let version = reader.read_u16("version word")?;

    let int_count = reader.read_u16("int pool count")? as usize;
    let mut int_pool = Vec::with_capacity(int_count);
    for _ in 0..int_count {
        int_pool.push(reader.read_i32("int pool")?);
    }

    let string_size = reader.read_u16("string pool size")? as usize;
    let string_pool = reader.read_bytes(string_size, "string pool")?.to_vec();

    let function_count = reader.read_u16("function pool count")? as usize;
    let mut function_pool = Vec::with_capacity(function_count);
    for _ in 0..function_count {
        let num_args = reader.read_u16("function argument count")?;
        let num_vars = reader.read_u16("function variable count")?;
        let code_length = reader.read_u16("function code length")? as usize;
        let code = reader.read_bytes(code_length, "function code")?.to_vec();
        function_pool.push(FunctionEntry {
            num_args,
            num_vars,
            code,
        });
    }

    if function_pool.is_empty() {
        return Err(LoadError::NoEntryFunction);
    }

    let native_count = reader.read_u16("native pool count")? as usize;
    let mut native_pool = Vec::with_capacity(native_count);
    for _ in 0..native_count {
        let num_args = reader.read_u16("native argument count")?;
        let function_table_index = reader.read_u16("native table index")?;
        native_pool.push(NativeEntry {
            num_args,
            function_table_index,
        });
    }

    let remaining = reader.remaining();
    if remaining != 0 {
        return Err(LoadError::TrailingBytes(remaining));
    }

    Ok(Program {
        version,
        int_pool,
        string_pool,
        function_pool,
        native_pool,
    })
}

fn parse_hex_stream(text: &str) -> Result<Vec<u8>, LoadError> {
    let mut bytes = Vec::new();
    for line in text.lines() {
        let code_part = match line.find('#') {
            Some(position) => &line[..position],
            None => line,
        };
        for token in code_part.split_whitespace() {
            if token.len() != 2 {
                return Err(LoadError::InvalidToken(token.to_owned()));
            }
            let byte = u8::from_str_radix(token, 16)
                .map_err(|_| LoadError::InvalidToken(token.to_owned()))?;
            bytes.push(byte);
        }
    }
    Ok(bytes)
}

struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn read_bytes(&mut self, count: usize, field: &'static str) -> Result<&'a [u8], LoadError> {
        if self.offset + count > self.data.len() {
            return Err(LoadError::UnexpectedEof(field));
        }
        let bytes = &self.data[self.offset..self.offset + count];
        self.offset += count;
        Ok(bytes)
    }

    fn read_u16(&mut self, field: &'static str) -> Result<u16, LoadError> {
        let bytes = self.read_bytes(2, field)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_i32(&mut self, field: &'static str) -> Result<i32, LoadError> {
        let bytes = self.read_bytes(4, field)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }
}
