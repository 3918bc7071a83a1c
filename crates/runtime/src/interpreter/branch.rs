// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! IF_CMPEQ / IF_CMPNE / IF_ICMP{LT,GE,GT,LE} / GOTO (spec.md §4.1
//! "Branching"). the offset is always relative to the address of the
//! opcode itself, never the post-operand PC (SPEC_FULL.md §F.1).

use corevm_types::{Opcode, Value, VmError};

use crate::equal::val_equal;
use crate::thread::Thread;

use super::StepOutcome;

fn fall_through(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    thread.advance(Opcode::goto.operand_width());
    Ok(StepOutcome::Continue)
}

fn take_branch(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let offset = thread.operand_i16()?;
    thread.current.pc = thread.branch_target(offset)?;
    Ok(StepOutcome::Continue)
}

pub fn goto(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    take_branch(thread)
}

/// `v1` is popped first (the value that was pushed last), `v2` second — the
/// reference's order, preserved here even though `val_equal` is symmetric
/// (SPEC_FULL.md §F.2: it still affects which operand's kind is reported
/// first when the comparison itself aborts).
fn pop_comparison_pair(thread: &mut Thread) -> Result<(Value, Value), VmError> {
    let v1 = thread.current.pop()?;
    let v2 = thread.current.pop()?;
    Ok((v1, v2))
}

pub fn if_cmpeq(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let (v1, v2) = pop_comparison_pair(thread)?;
    if val_equal(&thread.heap, v1, v2)? {
        take_branch(thread)
    } else {
        fall_through(thread)
    }
}

pub fn if_cmpne(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let (v1, v2) = pop_comparison_pair(thread)?;
    if !val_equal(&thread.heap, v1, v2)? {
        take_branch(thread)
    } else {
        fall_through(thread)
    }
}

fn pop_integer_pair(thread: &mut Thread) -> Result<(i32, i32), VmError> {
    let y = match thread.current.pop()? {
        Value::Integer(v) => v,
        Value::Pointer(_) => return Err(VmError::value("expected an integer, found a pointer")),
    };
    let x = match thread.current.pop()? {
        Value::Integer(v) => v,
        Value::Pointer(_) => return Err(VmError::value("expected an integer, found a pointer")),
    };
    Ok((x, y))
}

fn conditional<F: Fn(i32, i32) -> bool>(
    thread: &mut Thread,
    predicate: F,
) -> Result<StepOutcome, VmError> {
    let (x, y) = pop_integer_pair(thread)?;
    if predicate(x, y) {
        take_branch(thread)
    } else {
        fall_through(thread)
    }
}

pub fn if_icmplt(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    conditional(thread, |x, y| x < y)
}

pub fn if_icmpge(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    conditional(thread, |x, y| x >= y)
}

pub fn if_icmpgt(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    conditional(thread, |x, y| x > y)
}

pub fn if_icmple(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    conditional(thread, |x, y| x <= y)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use corevm_natives::NativeFunctionTable;
    use corevm_program::ProgramBuilder;
    use pretty_assertions::assert_eq;

    use super::*;

    fn harness(code: Vec<u8>) -> (corevm_program::Program, NativeFunctionTable) {
        let mut builder = ProgramBuilder::new();
        builder.add_function(0, 0, code);
        (builder.build(), NativeFunctionTable::standard())
    }

    #[test]
    fn goto_targets_the_opcode_address_plus_offset() {
        let (program, natives) = harness(vec![0xA7, 0x00, 0x05, 0, 0, 0xB0]);
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let mut thread = Thread::new(&program, &natives, 0, &mut out, &mut input).unwrap();
        goto(&mut thread).unwrap();
        assert_eq!(thread.current.pc, 5);
    }

    #[test]
    fn goto_with_a_negative_offset_branches_backward() {
        let (program, natives) = harness(vec![0, 0, 0xA7, 0xFF, 0xFE, 0xB0]);
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let mut thread = Thread::new(&program, &natives, 0, &mut out, &mut input).unwrap();
        thread.current.pc = 2;
        goto(&mut thread).unwrap();
        assert_eq!(thread.current.pc, 0);
    }

    #[test]
    fn if_icmplt_branches_when_true() {
        let (program, natives) = harness(vec![0xA1, 0x00, 0x05, 0, 0, 0xB0]);
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let mut thread = Thread::new(&program, &natives, 0, &mut out, &mut input).unwrap();
        thread.current.push(Value::Integer(1));
        thread.current.push(Value::Integer(2));
        if_icmplt(&mut thread).unwrap();
        assert_eq!(thread.current.pc, 5);
    }

    #[test]
    fn if_cmpeq_falls_through_when_values_differ() {
        let (program, natives) = harness(vec![0x9F, 0x00, 0x05, 0, 0, 0xB0]);
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let mut thread = Thread::new(&program, &natives, 0, &mut out, &mut input).unwrap();
        thread.current.push(Value::Integer(1));
        thread.current.push(Value::Integer(2));
        if_cmpeq(&mut thread).unwrap();
        assert_eq!(thread.current.pc, 3);
    }
}
