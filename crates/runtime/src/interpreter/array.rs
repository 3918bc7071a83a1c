// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! NEWARRAY / ARRAYLENGTH / AADDS (spec.md §4.4 "Memory: Arrays"). array
//! descriptors are laid out in the heap as `{count: i32 @ 0, elt_size: i32
//! @ 4, elems: pointer @ 8}`.

use corevm_types::{HeapAddress, Opcode, PointerValue, Value, VmError};

use crate::heap::POINTER_WORD_SIZE;
use crate::thread::Thread;

use super::StepOutcome;

const COUNT_OFFSET: u64 = 0;
const ELT_SIZE_OFFSET: u64 = 4;
const ELEMS_OFFSET: u64 = 8;
const DESCRIPTOR_SIZE: usize = 8 + POINTER_WORD_SIZE;

struct Descriptor {
    count: i32,
    elt_size: i32,
    elems: HeapAddress,
}

fn read_descriptor(thread: &Thread, addr: HeapAddress) -> Result<Descriptor, VmError> {
    let count = thread.heap.read_i32(&thread.program.string_pool, addr + COUNT_OFFSET)?;
    let elt_size = thread
        .heap
        .read_i32(&thread.program.string_pool, addr + ELT_SIZE_OFFSET)?;
    let elems = match thread
        .heap
        .read_pointer(&thread.program.string_pool, addr + ELEMS_OFFSET)?
    {
        PointerValue::Heap(a) => a,
        PointerValue::Null => 0,
        _ => return Err(VmError::fatal("corrupt array descriptor")),
    };
    Ok(Descriptor {
        count,
        elt_size,
        elems,
    })
}

/// pops the element count `n`, allocates `{count, elt_size, elems}` plus
/// the `n * elt_size`-byte element block, and pushes a pointer to the
/// descriptor. a zero-length array is represented by null, not a
/// zero-count descriptor (spec.md §3).
pub fn newarray(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let elt_size = thread.operand_u8()? as i32;
    let count = match thread.current.pop()? {
        Value::Integer(v) => v,
        Value::Pointer(_) => return Err(VmError::value("array length must be an integer")),
    };

    if count < 0 {
        return Err(VmError::memory("negative array length"));
    }

    if count == 0 {
        thread.current.push(Value::null());
        thread.advance(Opcode::newarray.operand_width());
        return Ok(StepOutcome::Continue);
    }

    let elems = thread.heap.allocate(count as usize * elt_size as usize);
    let descriptor_addr = thread.heap.allocate(DESCRIPTOR_SIZE);
    thread.heap.write_i32(descriptor_addr + COUNT_OFFSET, count)?;
    thread
        .heap
        .write_i32(descriptor_addr + ELT_SIZE_OFFSET, elt_size)?;
    thread
        .heap
        .write_pointer(descriptor_addr + ELEMS_OFFSET, PointerValue::Heap(elems))?;

    thread
        .current
        .push(Value::Pointer(PointerValue::Heap(descriptor_addr)));
    thread.advance(Opcode::newarray.operand_width());
    Ok(StepOutcome::Continue)
}

/// pushes `0` for a null array, else the descriptor's `count`.
pub fn arraylength(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let pointer = match thread.current.pop()? {
        Value::Pointer(p) => p,
        Value::Integer(_) => return Err(VmError::value("expected an array pointer")),
    };

    let length = match pointer {
        PointerValue::Null => 0,
        PointerValue::Heap(addr) => read_descriptor(thread, addr)?.count,
        _ => return Err(VmError::memory("not an array pointer")),
    };

    thread.current.push(Value::Integer(length));
    thread.advance(Opcode::arraylength.operand_width());
    Ok(StepOutcome::Continue)
}

/// pops index `i`, then the array-descriptor pointer `A`; pushes
/// `A.elems + i * A.elt_size` after bounds-checking (spec.md §4.4). a null
/// array is "length 0", so any index traps.
pub fn aadds(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let index = match thread.current.pop()? {
        Value::Integer(v) => v,
        Value::Pointer(_) => return Err(VmError::value("array index must be an integer")),
    };
    let array_pointer = match thread.current.pop()? {
        Value::Pointer(p) => p,
        Value::Integer(_) => return Err(VmError::value("expected an array pointer")),
    };

    let descriptor_addr = match array_pointer {
        PointerValue::Null => return Err(VmError::memory("array of length 0")),
        PointerValue::Heap(addr) => addr,
        _ => return Err(VmError::memory("not an array pointer")),
    };

    let descriptor = read_descriptor(thread, descriptor_addr)?;
    if index < 0 || index >= descriptor.count {
        return Err(VmError::memory(format!(
            "array index out of bounds: {} (length {})",
            index, descriptor.count
        )));
    }

    let element_addr = descriptor.elems + (index as u64 * descriptor.elt_size as u64);
    thread
        .current
        .push(Value::Pointer(PointerValue::Heap(element_addr)));
    thread.advance(Opcode::aadds.operand_width());
    Ok(StepOutcome::Continue)
}
