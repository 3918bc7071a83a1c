// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! the thread of control the dispatch loop drives: the currently-executing
//! activation, the suspended call-frame stack, and the heap, all borrowing
//! the immutable program object and native table for the run's duration
//! (spec.md §3 "Program object... shared by all frames").

use std::io::{BufRead, Write};

use corevm_natives::{NativeContext, NativeFunctionTable};
use corevm_program::Program;
use corevm_types::{Value, VmError};

use crate::frame::{ActivationRecord, CallStack};
use crate::heap::Heap;

pub struct Thread<'a> {
    pub program: &'a Program,
    pub natives: &'a NativeFunctionTable,
    pub heap: Heap,
    pub current: ActivationRecord,
    pub call_stack: CallStack,
    stdout: &'a mut dyn Write,
    stdin: &'a mut dyn BufRead,
}

impl<'a> Thread<'a> {
    pub fn new(
        program: &'a Program,
        natives: &'a NativeFunctionTable,
        initial_heap_bytes: usize,
        stdout: &'a mut dyn Write,
        stdin: &'a mut dyn BufRead,
    ) -> Result<Self, VmError> {
        let entry = program.entry_function()?;
        let current = ActivationRecord::new(0, entry.num_vars, Vec::new());
        let heap = Heap::new(program.string_pool.len(), initial_heap_bytes);
        Ok(Self {
            program,
            natives,
            heap,
            current,
            call_stack: CallStack::new(),
            stdout,
            stdin,
        })
    }

    /// the bytes of the activation currently executing.
    pub fn code(&self) -> Result<&'a [u8], VmError> {
        Ok(&self.program.function(self.current.function_index)?.code)
    }

    pub fn fetch_byte(&self) -> Result<u8, VmError> {
        self.code()?
            .get(self.current.pc)
            .copied()
            .ok_or_else(|| VmError::fatal("program counter ran past the end of the code array"))
    }

    fn operand_byte(&self, offset: usize) -> Result<u8, VmError> {
        self.code()?
            .get(self.current.pc + offset)
            .copied()
            .ok_or_else(|| VmError::fatal("opcode operand runs past the end of the code array"))
    }

    pub fn operand_u8(&self) -> Result<u8, VmError> {
        self.operand_byte(1)
    }

    pub fn operand_i8(&self) -> Result<i8, VmError> {
        Ok(self.operand_byte(1)? as i8)
    }

    pub fn operand_u16(&self) -> Result<u16, VmError> {
        let hi = self.operand_byte(1)? as u16;
        let lo = self.operand_byte(2)? as u16;
        Ok((hi << 8) | lo)
    }

    /// the two operand bytes of a branch opcode, combined and sign-extended
    /// (SPEC_FULL.md §F.1): `i16 = (i16(hi) << 8) | i16(lo)`.
    pub fn operand_i16(&self) -> Result<i16, VmError> {
        let hi = self.operand_byte(1)? as i16;
        let lo = self.operand_byte(2)? as u8 as i16;
        Ok((hi << 8) | lo)
    }

    /// advances the PC past an opcode with `operand_width` inline bytes.
    pub fn advance(&mut self, operand_width: usize) {
        self.current.pc += 1 + operand_width;
    }

    /// the absolute target of a branch, computed from the address of the
    /// opcode itself rather than the post-operand PC (spec.md §4.1,
    /// SPEC_FULL.md §F.1).
    pub fn branch_target(&self, offset: i16) -> Result<usize, VmError> {
        let target = self.current.pc as i64 + offset as i64;
        if target < 0 {
            return Err(VmError::fatal("branch target is negative"));
        }
        Ok(target as usize)
    }

    /// resolves a `Value::Pointer` to the string it addresses, per
    /// `corevm_natives::NativeContext::read_cstring`'s contract.
    pub fn resolve_cstring(&self, value: Value) -> Result<Vec<u8>, VmError> {
        match value {
            Value::Pointer(corevm_types::PointerValue::Heap(addr)) => {
                self.heap.read_cstring(&self.program.string_pool, addr)
            }
            Value::Pointer(corevm_types::PointerValue::Null) => {
                Err(VmError::memory("null pointer dereference"))
            }
            _ => Err(VmError::value("expected a pointer to a string")),
        }
    }
}

impl<'a> NativeContext for Thread<'a> {
    fn read_cstring(&self, value: Value) -> Result<Vec<u8>, VmError> {
        self.resolve_cstring(value)
    }

    fn write_stdout(&mut self, bytes: &[u8]) {
        // a native's write failing would only ever indicate a closed pipe
        // on the host side; the running program has no way to observe it,
        // so there is nothing useful to propagate as a VM abort.
        let _ = self.stdout.write_all(bytes);
    }

    fn read_i32_line(&mut self) -> Result<i32, VmError> {
        let mut line = String::new();
        self.stdin
            .read_line(&mut line)
            .map_err(|e| VmError::value(format!("failed to read input: {}", e)))?;
        line.trim()
            .parse::<i32>()
            .map_err(|_| VmError::value(format!("input is not a valid 32-bit integer: {:?}", line)))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use corevm_program::ProgramBuilder;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn new_thread_starts_at_function_zero_with_an_empty_stack() {
        let mut builder = ProgramBuilder::new();
        builder.add_function(0, 2, vec![0xB0]);
        let program = builder.build();
        let natives = NativeFunctionTable::standard();
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let thread = Thread::new(&program, &natives, 0, &mut out, &mut input).unwrap();
        assert_eq!(thread.current.function_index, 0);
        assert_eq!(thread.current.locals.len(), 2);
        assert!(thread.current.operand_stack.is_empty());
    }

    #[test]
    fn write_stdout_is_visible_through_a_native_call() {
        let mut builder = ProgramBuilder::new();
        builder.add_function(0, 0, vec![0xB0]);
        let program = builder.build();
        let natives = NativeFunctionTable::standard();
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let mut thread = Thread::new(&program, &natives, 0, &mut out, &mut input).unwrap();
        thread.write_stdout(b"hi");
        drop(thread);
        assert_eq!(out, b"hi");
    }
}
