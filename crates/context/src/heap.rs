// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// The heap
// --------
//
// Allocations are numbered blocks of zero-initialized bytes; a
// reference handle is a (block, offset) pair, so blocks can never be
// reached through stray integers. Block 0 is the null reference and
// owns no storage. The string pool is copied into the first real
// block when the heap is created, which makes a string-pool reference
// an ordinary reference.
//
// An array block additionally carries its (count, element size)
// header out of band, so the data region of every block is exactly
// the payload and the address of element i is plain `i * elt_size`.
//
// Nothing is ever freed during execution; the whole heap is dropped
// when the machine hands control back to the host.

use c0vm_isa::Trap;
use c0vm_memory::{memory_access::MemoryAccess, MemoryError};
use c0vm_stack::Reference;

/// The block holding the string pool.
pub const STRING_POOL_BLOCK: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayHeader {
    pub count: u32,
    pub elt_size: u32,
}

struct Block {
    data: Vec<u8>,
    array: Option<ArrayHeader>,
}

impl MemoryAccess for Block {
    fn data(&self) -> &[u8] {
        &self.data
    }

    fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

pub struct Heap {
    blocks: Vec<Block>,
}

impl Heap {
    pub fn new(string_pool: &[u8]) -> Self {
        let mut heap = Self { blocks: Vec::new() };
        heap.add_block(string_pool.to_vec(), None);
        heap
    }

    fn add_block(&mut self, data: Vec<u8>, array: Option<ArrayHeader>) -> Reference {
        self.blocks.push(Block { data, array });
        Reference::new(self.blocks.len() as u32, 0)
    }

    /// Allocates a zero-initialized cell of `size` bytes.
    pub fn allocate(&mut self, size: usize) -> Reference {
        self.add_block(vec![0u8; size], None)
    }

    /// Allocates a zero-initialized array payload with its header.
    pub fn allocate_array(&mut self, count: u32, elt_size: u32) -> Reference {
        let size = count as usize * elt_size as usize;
        self.add_block(vec![0u8; size], Some(ArrayHeader { count, elt_size }))
    }

    fn block(&self, reference: Reference) -> Result<&Block, Trap> {
        if reference.is_null() {
            return Err(Trap::memory_error("null reference"));
        }
        self.blocks
            .get(reference.block as usize - 1)
            .ok_or_else(|| Trap::memory_error("dangling reference"))
    }

    fn block_mut(&mut self, reference: Reference) -> Result<&mut Block, Trap> {
        if reference.is_null() {
            return Err(Trap::memory_error("null reference"));
        }
        self.blocks
            .get_mut(reference.block as usize - 1)
            .ok_or_else(|| Trap::memory_error("dangling reference"))
    }

    /// The array header of a block allocated by `allocate_array`. The
    /// reference must address the start of the array.
    pub fn array_header(&self, reference: Reference) -> Result<ArrayHeader, Trap> {
        let block = self.block(reference)?;
        match block.array {
            Some(header) if reference.offset == 0 => Ok(header),
            _ => Err(Trap::memory_error("not an array reference")),
        }
    }

    pub fn read_i32(&self, reference: Reference) -> Result<i32, Trap> {
        let block = self.block(reference)?;
        block
            .read_i32(reference.offset as usize)
            .map_err(memory_trap)
    }

    pub fn write_i32(&mut self, reference: Reference, value: i32) -> Result<(), Trap> {
        let block = self.block_mut(reference)?;
        block
            .write_i32(reference.offset as usize, value)
            .map_err(memory_trap)
    }

    pub fn read_i8(&self, reference: Reference) -> Result<i8, Trap> {
        let block = self.block(reference)?;
        block
            .read_i8(reference.offset as usize)
            .map_err(memory_trap)
    }

    pub fn write_i8(&mut self, reference: Reference, value: u8) -> Result<(), Trap> {
        let block = self.block_mut(reference)?;
        block
            .write_i8(reference.offset as usize, value)
            .map_err(memory_trap)
    }

    pub fn read_ref(&self, reference: Reference) -> Result<Reference, Trap> {
        let block = self.block(reference)?;
        let bits = block
            .read_reference_bits(reference.offset as usize)
            .map_err(memory_trap)?;
        Ok(Reference::from_bits(bits))
    }

    pub fn write_ref(&mut self, reference: Reference, value: Reference) -> Result<(), Trap> {
        let block = self.block_mut(reference)?;
        block
            .write_reference_bits(reference.offset as usize, value.to_bits())
            .map_err(memory_trap)
    }

    /// The bytes of the NUL-terminated string the reference points at,
    /// terminator excluded.
    pub fn read_string_bytes(&self, reference: Reference) -> Result<&[u8], Trap> {
        let block = self.block(reference)?;
        let data = block.data();
        let start = reference.offset as usize;
        if start > data.len() {
            return Err(memory_trap(MemoryError::OutOfRange {
                offset: start,
                length_in_bytes: 1,
                buffer_size_in_bytes: data.len(),
            }));
        }
        let tail = &data[start..];
        match tail.iter().position(|&byte| byte == 0) {
            Some(end) => Ok(&tail[..end]),
            None => Err(Trap::memory_error("unterminated string")),
        }
    }

    pub fn read_string(&self, reference: Reference) -> Result<String, Trap> {
        let bytes = self.read_string_bytes(reference)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Allocates a fresh NUL-terminated string and returns a reference
    /// to its first byte.
    pub fn allocate_string(&mut self, bytes: &[u8]) -> Reference {
        let mut data = Vec::with_capacity(bytes.len() + 1);
        data.extend_from_slice(bytes);
        data.push(0);
        self.add_block(data, None)
    }
}

fn memory_trap(error: MemoryError) -> Trap {
    Trap::memory_error(error.to_string())
}
