// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! VLOAD / VSTORE (spec.md §4.1 "Local variables").

use corevm_types::{Opcode, VmError};

use crate::thread::Thread;

use super::StepOutcome;

fn local_index(thread: &Thread, raw: u8) -> Result<usize, VmError> {
    let index = raw as usize;
    if index >= thread.current.locals.len() {
        return Err(VmError::fatal(format!(
            "local variable index out of range: {}",
            index
        )));
    }
    Ok(index)
}

pub fn vload(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let raw = thread.operand_u8()?;
    let index = local_index(thread, raw)?;
    let value = thread.current.locals[index];
    thread.current.push(value);
    thread.advance(Opcode::vload.operand_width());
    Ok(StepOutcome::Continue)
}

pub fn vstore(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let raw = thread.operand_u8()?;
    let index = local_index(thread, raw)?;
    let value = thread.current.pop()?;
    thread.current.locals[index] = value;
    thread.advance(Opcode::vstore.operand_width());
    Ok(StepOutcome::Continue)
}
