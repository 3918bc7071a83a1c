// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! the heap arena (spec.md §4.3/§4.4, design note §9): an address space
//! shared by the read-only string pool and a bump-allocated mutable arena,
//! plus the tagged-pointer box table (§4.6).
//!
//! address `0` is reserved for the null pointer. addresses `1 ..=
//! string_pool.len()` name bytes of the program's string pool; every
//! address above that names a byte in the mutable arena. nothing is ever
//! freed during execution (spec.md §5, §9): the arena only grows, and is
//! dropped in its entirety when the `Heap` is.

use corevm_types::{HeapAddress, PointerValue, TaggedHandle, VmError};

/// width in bytes of a stored pointer-sized cell (what `AMLOAD`/`AMSTORE`
/// read and write). one discriminant byte plus an 8-byte payload; this is
/// this crate's own on-heap serialisation of `PointerValue` and has nothing
/// to do with the reference's bit-stealing encoding (spec.md §9) — the
/// `PointerValue` enum above this layer stays a first-class sum type, this
/// is purely how a cell's bytes are laid out once it is written to memory
/// that must also be byte-addressable by `AADDF`.
pub const POINTER_WORD_SIZE: usize = 9;

const TAG_NULL: u8 = 0;
const TAG_HEAP: u8 = 1;
const TAG_TAGGED: u8 = 2;
const TAG_FUNC_STATIC: u8 = 3;
const TAG_FUNC_NATIVE: u8 = 4;

/// a pointer wrapped with a 16-bit type tag by `ADDTAG` (spec.md §3, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedBox {
    pub real_pointer: PointerValue,
    pub tag: u16,
}

pub struct Heap {
    string_pool_len: usize,
    arena: Vec<u8>,
    tagged: Vec<TaggedBox>,
}

impl Heap {
    pub fn new(string_pool_len: usize, initial_arena_bytes: usize) -> Self {
        Self {
            string_pool_len,
            arena: Vec::with_capacity(initial_arena_bytes),
            tagged: Vec::new(),
        }
    }

    /// allocates `size` zero-filled bytes at the end of the arena and
    /// returns the address of the first byte (spec.md §4.3 NEW, §4.4
    /// NEWARRAY's element block and descriptor).
    pub fn allocate(&mut self, size: usize) -> HeapAddress {
        let base = self.string_pool_len + 1 + self.arena.len();
        self.arena.resize(self.arena.len() + size, 0);
        base as HeapAddress
    }

    fn resolve(&self, address: HeapAddress, len: usize) -> Result<ResolvedRange, VmError> {
        if address == 0 {
            return Err(VmError::memory("null pointer dereference"));
        }
        let address = address as usize;
        if address <= self.string_pool_len {
            let start = address - 1;
            let end = start
                .checked_add(len)
                .ok_or_else(|| VmError::memory("address arithmetic overflow"))?;
            if end > self.string_pool_len {
                return Err(VmError::memory("access crosses the string pool boundary"));
            }
            return Ok(ResolvedRange::StringPool { start, end });
        }
        let start = address - self.string_pool_len - 1;
        let end = start
            .checked_add(len)
            .ok_or_else(|| VmError::memory("address arithmetic overflow"))?;
        if end > self.arena.len() {
            return Err(VmError::memory("out-of-bounds heap access"));
        }
        Ok(ResolvedRange::Arena { start, end })
    }

    fn read_bytes<'a>(
        &'a self,
        string_pool: &'a [u8],
        address: HeapAddress,
        len: usize,
    ) -> Result<&'a [u8], VmError> {
        match self.resolve(address, len)? {
            ResolvedRange::StringPool { start, end } => Ok(&string_pool[start..end]),
            ResolvedRange::Arena { start, end } => Ok(&self.arena[start..end]),
        }
    }

    fn write_bytes(&mut self, address: HeapAddress, bytes: &[u8]) -> Result<(), VmError> {
        match self.resolve(address, bytes.len())? {
            ResolvedRange::StringPool { .. } => {
                Err(VmError::memory("cannot store into the read-only string pool"))
            }
            ResolvedRange::Arena { start, end } => {
                self.arena[start..end].copy_from_slice(bytes);
                Ok(())
            }
        }
    }

    pub fn read_i32(&self, string_pool: &[u8], address: HeapAddress) -> Result<i32, VmError> {
        let bytes = self.read_bytes(string_pool, address, 4)?;
        Ok(i32::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub fn write_i32(&mut self, address: HeapAddress, value: i32) -> Result<(), VmError> {
        self.write_bytes(address, &value.to_be_bytes())
    }

    pub fn read_byte(&self, string_pool: &[u8], address: HeapAddress) -> Result<u8, VmError> {
        let bytes = self.read_bytes(string_pool, address, 1)?;
        Ok(bytes[0])
    }

    pub fn write_byte(&mut self, address: HeapAddress, value: u8) -> Result<(), VmError> {
        self.write_bytes(address, &[value])
    }

    /// reads a NUL-terminated byte string starting at `address`, spanning
    /// either the string pool or the arena (natives read heap-allocated
    /// strings the same way as string-pool ones).
    pub fn read_cstring(
        &self,
        string_pool: &[u8],
        address: HeapAddress,
    ) -> Result<Vec<u8>, VmError> {
        if address == 0 {
            return Err(VmError::memory("null pointer dereference"));
        }
        let mut out = Vec::new();
        let mut cursor = address;
        loop {
            let byte = self.read_byte(string_pool, cursor)?;
            if byte == 0 {
                return Ok(out);
            }
            out.push(byte);
            cursor += 1;
        }
    }

    pub fn read_pointer(
        &self,
        string_pool: &[u8],
        address: HeapAddress,
    ) -> Result<PointerValue, VmError> {
        let bytes = self.read_bytes(string_pool, address, POINTER_WORD_SIZE)?;
        decode_pointer(bytes)
    }

    pub fn write_pointer(
        &mut self,
        address: HeapAddress,
        value: PointerValue,
    ) -> Result<(), VmError> {
        self.write_bytes(address, &encode_pointer(value))
    }

    /// wraps `pointer` with `tag`, returning the handle that `ADDTAG`
    /// pushes as `PointerValue::Tagged`. tagging the null pointer yields
    /// null itself rather than a new box (spec.md SPEC_FULL.md §F.3).
    pub fn add_tag(&mut self, pointer: PointerValue, tag: u16) -> PointerValue {
        if pointer.is_null() {
            return PointerValue::Null;
        }
        let handle = self.tagged.len() as TaggedHandle;
        self.tagged.push(TaggedBox {
            real_pointer: pointer,
            tag,
        });
        PointerValue::Tagged(handle)
    }

    pub fn tagged_box(&self, handle: TaggedHandle) -> Result<&TaggedBox, VmError> {
        self.tagged
            .get(handle as usize)
            .ok_or_else(|| VmError::fatal(format!("no such tagged pointer box: {}", handle)))
    }
}

enum ResolvedRange {
    StringPool { start: usize, end: usize },
    Arena { start: usize, end: usize },
}

fn encode_pointer(value: PointerValue) -> [u8; POINTER_WORD_SIZE] {
    let mut bytes = [0u8; POINTER_WORD_SIZE];
    match value {
        PointerValue::Null => bytes[0] = TAG_NULL,
        PointerValue::Heap(addr) => {
            bytes[0] = TAG_HEAP;
            bytes[1..9].copy_from_slice(&addr.to_be_bytes());
        }
        PointerValue::Tagged(handle) => {
            bytes[0] = TAG_TAGGED;
            bytes[5..9].copy_from_slice(&handle.to_be_bytes());
        }
        PointerValue::Func { is_native, index } => {
            bytes[0] = if is_native { TAG_FUNC_NATIVE } else { TAG_FUNC_STATIC };
            bytes[7..9].copy_from_slice(&index.to_be_bytes());
        }
    }
    bytes
}

fn decode_pointer(bytes: &[u8]) -> Result<PointerValue, VmError> {
    match bytes[0] {
        TAG_NULL => Ok(PointerValue::Null),
        TAG_HEAP => Ok(PointerValue::Heap(u64::from_be_bytes(
            bytes[1..9].try_into().unwrap(),
        ))),
        TAG_TAGGED => Ok(PointerValue::Tagged(u32::from_be_bytes(
            bytes[5..9].try_into().unwrap(),
        ))),
        TAG_FUNC_STATIC => Ok(PointerValue::Func {
            is_native: false,
            index: u16::from_be_bytes(bytes[7..9].try_into().unwrap()),
        }),
        TAG_FUNC_NATIVE => Ok(PointerValue::Func {
            is_native: true,
            index: u16::from_be_bytes(bytes[7..9].try_into().unwrap()),
        }),
        other => Err(VmError::fatal(format!(
            "corrupt pointer cell (discriminant {})",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn allocate_returns_addresses_past_the_string_pool() {
        let mut heap = Heap::new(4, 0);
        let a = heap.allocate(8);
        let b = heap.allocate(8);
        assert!(a as usize > 4);
        assert_eq!(b, a + 8);
    }

    #[test]
    fn i32_round_trips_through_the_arena() {
        let mut heap = Heap::new(0, 0);
        let addr = heap.allocate(4);
        heap.write_i32(addr, -123).unwrap();
        assert_eq!(heap.read_i32(&[], addr).unwrap(), -123);
    }

    #[test]
    fn pointer_round_trips_through_the_arena() {
        let mut heap = Heap::new(0, 0);
        let addr = heap.allocate(POINTER_WORD_SIZE);
        heap.write_pointer(addr, PointerValue::Heap(77)).unwrap();
        assert_eq!(heap.read_pointer(&[], addr).unwrap(), PointerValue::Heap(77));

        heap.write_pointer(
            addr,
            PointerValue::Func {
                is_native: true,
                index: 9,
            },
        )
        .unwrap();
        assert_eq!(
            heap.read_pointer(&[], addr).unwrap(),
            PointerValue::Func {
                is_native: true,
                index: 9
            }
        );
    }

    #[test]
    fn null_dereference_is_a_memory_error() {
        let heap = Heap::new(0, 0);
        let err = heap.read_i32(&[], 0).unwrap_err();
        assert_eq!(err.kind, corevm_types::AbortKind::Memory);
    }

    #[test]
    fn writing_into_the_string_pool_is_rejected() {
        let mut heap = Heap::new(4, 0);
        let err = heap.write_byte(1, b'x').unwrap_err();
        assert_eq!(err.kind, corevm_types::AbortKind::Memory);
    }

    #[test]
    fn reading_a_string_pool_cstring_stops_at_nul() {
        let heap = Heap::new(6, 0);
        let pool = b"hi\0bye";
        assert_eq!(heap.read_cstring(pool, 1).unwrap(), b"hi");
    }

    #[test]
    fn tagging_null_yields_null_not_a_box() {
        let mut heap = Heap::new(0, 0);
        let tagged = heap.add_tag(PointerValue::Null, 7);
        assert_eq!(tagged, PointerValue::Null);
    }

    #[test]
    fn add_tag_creates_a_retrievable_box() {
        let mut heap = Heap::new(0, 0);
        let tagged = heap.add_tag(PointerValue::Heap(5), 42);
        match tagged {
            PointerValue::Tagged(handle) => {
                let b = heap.tagged_box(handle).unwrap();
                assert_eq!(b.real_pointer, PointerValue::Heap(5));
                assert_eq!(b.tag, 42);
            }
            _ => panic!("expected a tagged pointer"),
        }
    }
}
