// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! the façade a front end drives: construct a `Vm` over a program and a
//! native table, run it, and get back an exit value or an abort (spec.md
//! §6.3 "Termination").

use std::io::{BufRead, Write};

use corevm_natives::NativeFunctionTable;
use corevm_program::Program;
use corevm_types::VmError;

use crate::config::VmConfig;
use crate::interpreter;
use crate::thread::Thread;

pub struct Vm<'a> {
    program: &'a Program,
    natives: &'a NativeFunctionTable,
    config: VmConfig,
}

impl<'a> Vm<'a> {
    pub fn new(program: &'a Program, natives: &'a NativeFunctionTable, config: VmConfig) -> Self {
        Self {
            program,
            natives,
            config,
        }
    }

    /// runs the program to completion against the given I/O streams,
    /// starting at `function_pool[0]` (spec.md §6.1). `stdin`/`stdout` are
    /// driven through the same `NativeContext` the native function table
    /// uses, so a test can supply an in-memory buffer in place of the real
    /// process streams.
    pub fn run(&self, stdout: &mut dyn Write, stdin: &mut dyn BufRead) -> Result<i32, VmError> {
        let mut thread = Thread::new(
            self.program,
            self.natives,
            self.config.initial_heap_bytes,
            stdout,
            stdin,
        )?;
        interpreter::run(&mut thread)
    }
}
