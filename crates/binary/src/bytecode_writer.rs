// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! a small chained builder for assembling function bodies one opcode at a
//! time. this is the mechanical inverse of what a bytecode loader's decoder
//! would do; the loader itself is out of scope (spec.md §1), but tests and
//! the embedded demo programs in `crates/vm` both need a way to produce
//! `code: Vec<u8>` without hand-counting byte offsets.

use corevm_types::Opcode;

pub struct BytecodeWriter {
    buffer: Vec<u8>,
}

impl Default for BytecodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BytecodeWriter {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// the address the *next* byte written will land at — i.e. the address
    /// of the opcode about to be appended.
    pub fn current_address(&self) -> usize {
        self.buffer.len()
    }

    /// a zero-operand opcode: `nop`, `pop`, `dup`, `swap`, the arithmetic and
    /// bitwise ops, the memory/array load-store ops, `return`, and so on.
    pub fn write_opcode(mut self, opcode: Opcode) -> Self {
        self.buffer.push(opcode as u8);
        self
    }

    /// an opcode followed by a single unsigned operand byte: `vload`,
    /// `vstore`, `aaddf`, `new`, `newarray`.
    pub fn write_opcode_u8(mut self, opcode: Opcode, value: u8) -> Self {
        self.buffer.push(opcode as u8);
        self.buffer.push(value);
        self
    }

    /// `bipush`: an opcode followed by a sign-extended 8-bit literal.
    pub fn write_opcode_i8(mut self, opcode: Opcode, value: i8) -> Self {
        self.buffer.push(opcode as u8);
        self.buffer.push(value as u8);
        self
    }

    /// an opcode followed by a 16-bit big-endian pool index, laid out as
    /// `c1 c2` where the index is `(c1<<8)|c2` — `ildc`, `aldc`,
    /// `invokestatic`, `invokenative`, `addrof_static`, `addrof_native`.
    pub fn write_opcode_u16(mut self, opcode: Opcode, value: u16) -> Self {
        self.buffer.push(opcode as u8);
        self.buffer.push((value >> 8) as u8);
        self.buffer.push((value & 0xFF) as u8);
        self
    }

    /// a branch opcode whose target address is already known (a backward
    /// branch, or a forward branch to an address computed ahead of time).
    /// the offset is relative to the address of the opcode itself.
    pub fn write_branch(mut self, opcode: Opcode, target_address: usize) -> Self {
        debug_assert!(opcode.is_branch());
        let opcode_address = self.buffer.len();
        let offset = branch_offset(opcode_address, target_address);
        self.buffer.push(opcode as u8);
        self.buffer.push((offset >> 8) as u8);
        self.buffer.push((offset & 0xFF) as u8);
        self
    }

    /// a branch opcode whose target is not known yet (a forward branch to
    /// code that hasn't been emitted). returns the writer plus the address
    /// of the opcode byte, to be passed to `patch_branch` once the target
    /// address is known.
    pub fn write_branch_placeholder(mut self, opcode: Opcode) -> (Self, usize) {
        debug_assert!(opcode.is_branch());
        let opcode_address = self.buffer.len();
        self.buffer.push(opcode as u8);
        self.buffer.push(0);
        self.buffer.push(0);
        (self, opcode_address)
    }

    /// fill in a branch opcode previously emitted with `write_branch_placeholder`.
    pub fn patch_branch(&mut self, opcode_address: usize, target_address: usize) {
        let offset = branch_offset(opcode_address, target_address);
        self.buffer[opcode_address + 1] = (offset >> 8) as u8;
        self.buffer[opcode_address + 2] = (offset & 0xFF) as u8;
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

fn branch_offset(opcode_address: usize, target_address: usize) -> u16 {
    let offset = target_address as i64 - opcode_address as i64;
    assert!(
        (i16::MIN as i64..=i16::MAX as i64).contains(&offset),
        "branch offset {} out of i16 range",
        offset
    );
    offset as i16 as u16
}
