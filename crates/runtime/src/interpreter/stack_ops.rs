// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! POP / DUP / SWAP (spec.md §4.1 "Stack ops"). none of these inspect the
//! value's kind, so they work on integers and pointers alike.

use corevm_types::{Opcode, VmError};

use crate::thread::Thread;

use super::StepOutcome;

pub fn pop(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    thread.current.pop()?;
    thread.advance(Opcode::pop.operand_width());
    Ok(StepOutcome::Continue)
}

pub fn dup(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let top = thread.current.pop()?;
    thread.current.push(top);
    thread.current.push(top);
    thread.advance(Opcode::dup.operand_width());
    Ok(StepOutcome::Continue)
}

pub fn swap(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let top = thread.current.pop()?;
    let below = thread.current.pop()?;
    thread.current.push(top);
    thread.current.push(below);
    thread.advance(Opcode::swap.operand_width());
    Ok(StepOutcome::Continue)
}
