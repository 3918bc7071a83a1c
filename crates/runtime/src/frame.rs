// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! the call-frame stack (spec.md §3 "Call frame", §4.2): `{operand_stack,
//! code_bytes, pc, locals}` per suspended activation. `code_bytes` is kept
//! as a function-pool index rather than a copy of the bytes, since the
//! program object already owns them and outlives every frame.

use corevm_types::Value;

/// one function activation: the callee's own operand stack, locals, and
/// where it is in its own code. spec.md §3 bounds the frame stack's depth
/// only by host memory, never by the VM itself.
#[derive(Debug)]
pub struct ActivationRecord {
    pub function_index: u16,
    pub pc: usize,
    pub locals: Vec<Value>,
    pub operand_stack: Vec<Value>,
}

impl ActivationRecord {
    pub fn new(function_index: u16, num_vars: u8, arguments: Vec<Value>) -> Self {
        let mut locals = arguments;
        locals.resize(num_vars as usize, Value::Integer(0));
        Self {
            function_index,
            pc: 0,
            locals,
            operand_stack: Vec::new(),
        }
    }

    /// pops the top of this frame's operand stack, or a fatal invariant
    /// violation — spec.md §3 treats underflow as a bug in the bytecode
    /// producer, not a program-visible abort.
    pub fn pop(&mut self) -> Result<Value, corevm_types::VmError> {
        self.operand_stack
            .pop()
            .ok_or_else(|| corevm_types::VmError::fatal("operand stack underflow"))
    }

    pub fn push(&mut self, value: Value) {
        self.operand_stack.push(value);
    }
}

/// the stack of suspended caller frames (spec.md §3 "grows without a fixed
/// depth bound"). the currently-executing activation is held separately by
/// `crate::thread::Thread`, matching the teacher's `Thread`/`Stack` split.
#[derive(Debug, Default)]
pub struct CallStack {
    frames: Vec<ActivationRecord>,
}

impl CallStack {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push(&mut self, frame: ActivationRecord) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<ActivationRecord> {
        self.frames.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
