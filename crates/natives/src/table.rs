// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

use corevm_types::{Value, VmError};

/// what a native implementation needs from the running thread besides its
/// argument array: reading a pointer's bytes back out of VM memory, and the
/// process's standard streams. implemented by the runtime crate's `Thread`.
pub trait NativeContext {
    /// resolves a `Value::Pointer` to the bytes of the NUL-terminated string
    /// it addresses (spec.md's string pool, or a heap-allocated buffer with
    /// the same convention). a null pointer or a non-pointer value is a
    /// *memory error* / *value error* respectively.
    fn read_cstring(&self, value: Value) -> Result<Vec<u8>, VmError>;

    fn write_stdout(&mut self, bytes: &[u8]);

    /// reads a line of input (without the trailing newline) and parses it as
    /// a signed 32-bit integer. a *value error* if it doesn't parse.
    fn read_i32_line(&mut self) -> Result<i32, VmError>;
}

/// a native function: it receives its arguments already in call order
/// (`args[0]` is the first declared parameter) and either returns the single
/// value the bytecode's `INVOKENATIVE` will push, or aborts the VM.
pub type NativeFn = fn(&[Value], &mut dyn NativeContext) -> Result<Value, VmError>;

/// indices into [`NativeFunctionTable::standard`], stable across runs the
/// way spec.md §6.2 requires ("fixed identities across runs keyed by
/// `function_table_index`").
pub mod index {
    pub const PRINT_I32: u16 = 0;
    pub const PRINT_STRING: u16 = 1;
    pub const PRINT_NEWLINE: u16 = 2;
    pub const READ_I32: u16 = 3;
    pub const STRING_LENGTH: u16 = 4;
    pub const I32_ABS: u16 = 5;
    pub const I32_MIN: u16 = 6;
    pub const I32_MAX: u16 = 7;
}

/// the native function table: a fixed directory of built-ins addressed by
/// small integer index, the VM-build-time artefact spec.md §6.2 describes.
pub struct NativeFunctionTable {
    functions: Vec<Option<NativeFn>>,
}

impl NativeFunctionTable {
    pub fn empty() -> Self {
        Self {
            functions: Vec::new(),
        }
    }

    pub fn register(&mut self, index: u16, function: NativeFn) {
        let index = index as usize;
        if index >= self.functions.len() {
            self.functions.resize(index + 1, None);
        }
        self.functions[index] = Some(function);
    }

    pub fn get(&self, index: u16) -> Result<NativeFn, VmError> {
        self.functions
            .get(index as usize)
            .copied()
            .flatten()
            .ok_or_else(|| VmError::fatal(format!("no native registered at index {}", index)))
    }

    /// the built-in I/O, string, and math natives this crate ships (spec.md
    /// §6.2's examples: "I/O, string manipulation, math").
    pub fn standard() -> Self {
        use crate::builtins::*;
        use index::*;

        let mut table = Self::empty();
        table.register(PRINT_I32, print_i32);
        table.register(PRINT_STRING, print_string);
        table.register(PRINT_NEWLINE, print_newline);
        table.register(READ_I32, read_i32);
        table.register(STRING_LENGTH, string_length);
        table.register(I32_ABS, i32_abs);
        table.register(I32_MIN, i32_min);
        table.register(I32_MAX, i32_max);
        table
    }
}

impl Default for NativeFunctionTable {
    fn default() -> Self {
        Self::standard()
    }
}
