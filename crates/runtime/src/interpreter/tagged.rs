// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! the C1 subset (spec.md §4.6): ADDROF_STATIC / ADDROF_NATIVE push a
//! function pointer; ADDTAG / CHECKTAG / HASTAG operate on tagged-pointer
//! boxes. the reference itself never implements these (SPEC_FULL.md §F.5);
//! this crate gives them the full semantics spec.md assigns.

use corevm_types::{Opcode, PointerValue, Value, VmError};

use crate::thread::Thread;

use super::StepOutcome;

pub fn addrof_static(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let index = thread.operand_u16()?;
    thread.program.function(index)?;
    thread.current.push(Value::Pointer(PointerValue::Func {
        is_native: false,
        index,
    }));
    thread.advance(Opcode::addrof_static.operand_width());
    Ok(StepOutcome::Continue)
}

pub fn addrof_native(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let index = thread.operand_u16()?;
    thread.program.native(index)?;
    thread.current.push(Value::Pointer(PointerValue::Func {
        is_native: true,
        index,
    }));
    thread.advance(Opcode::addrof_native.operand_width());
    Ok(StepOutcome::Continue)
}

fn pop_pointer(thread: &mut Thread) -> Result<PointerValue, VmError> {
    match thread.current.pop()? {
        Value::Pointer(p) => Ok(p),
        Value::Integer(_) => Err(VmError::value("expected a pointer")),
    }
}

/// wraps the popped pointer with a 16-bit tag. tagging null yields null
/// (SPEC_FULL.md §F.3).
pub fn addtag(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let tag = thread.operand_u16()?;
    let pointer = pop_pointer(thread)?;
    let tagged = thread.heap.add_tag(pointer, tag);
    thread.current.push(Value::Pointer(tagged));
    thread.advance(Opcode::addtag.operand_width());
    Ok(StepOutcome::Continue)
}

/// aborts unless the popped pointer's tag matches; null passes any tag.
pub fn checktag(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let tag = thread.operand_u16()?;
    let pointer = pop_pointer(thread)?;
    match pointer {
        PointerValue::Null => {}
        PointerValue::Tagged(handle) => {
            let actual = thread.heap.tagged_box(handle)?.tag;
            if actual != tag {
                return Err(VmError::value(format!(
                    "tag mismatch: expected {}, found {}",
                    tag, actual
                )));
            }
        }
        _ => return Err(VmError::value("checktag requires a tagged pointer or null")),
    }
    thread.current.push(Value::Pointer(pointer));
    thread.advance(Opcode::checktag.operand_width());
    Ok(StepOutcome::Continue)
}

/// pops the pointer, pushes `1` or `0` for whether it carries `tag`. unlike
/// `checktag`, this consumes the pointer rather than leaving it on the
/// stack — it's a query, not a guard.
pub fn hastag(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let tag = thread.operand_u16()?;
    let pointer = pop_pointer(thread)?;
    let has = match pointer {
        PointerValue::Null => true,
        PointerValue::Tagged(handle) => thread.heap.tagged_box(handle)?.tag == tag,
        _ => false,
    };
    thread.current.push(Value::Integer(has as i32));
    thread.advance(Opcode::hastag.operand_width());
    Ok(StepOutcome::Continue)
}
