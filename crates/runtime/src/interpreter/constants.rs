// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! BIPUSH / ILDC / ALDC / ACONST_NULL (spec.md §4.1 "Constants").

use corevm_types::{Opcode, PointerValue, Value, VmError};

use crate::thread::Thread;

use super::StepOutcome;

pub fn aconst_null(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    thread.current.push(Value::null());
    thread.advance(Opcode::aconst_null.operand_width());
    Ok(StepOutcome::Continue)
}

/// pushes the sign-extended 8-bit operand as a 32-bit integer.
pub fn bipush(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let b = thread.operand_i8()?;
    thread.current.push(Value::Integer(b as i32));
    thread.advance(Opcode::bipush.operand_width());
    Ok(StepOutcome::Continue)
}

pub fn ildc(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let index = thread.operand_u16()?;
    let value = thread.program.int_constant(index)?;
    thread.current.push(Value::Integer(value));
    thread.advance(Opcode::ildc.operand_width());
    Ok(StepOutcome::Continue)
}

/// pushes a pointer to byte `(c1<<8)|c2` within the string pool. the
/// string pool occupies global heap addresses `1..=string_pool.len()`
/// (address `0` is null), so the pointer is the pool offset plus one.
pub fn aldc(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let offset = thread.operand_u16()?;
    let address = offset as u64 + 1;
    thread
        .current
        .push(Value::Pointer(PointerValue::Heap(address)));
    thread.advance(Opcode::aldc.operand_width());
    Ok(StepOutcome::Continue)
}
