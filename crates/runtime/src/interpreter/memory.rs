// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! NEW / AADDF and the I/A/C-MLOAD/MSTORE family (spec.md §4.3 "Memory:
//! Structs and Raw Blocks").

use corevm_types::{HeapAddress, Opcode, PointerValue, Value, VmError};

use crate::thread::Thread;

use super::StepOutcome;

fn pop_pointer(thread: &mut Thread) -> Result<PointerValue, VmError> {
    match thread.current.pop()? {
        Value::Pointer(p) => Ok(p),
        Value::Integer(_) => Err(VmError::value("expected a pointer, found an integer")),
    }
}

fn pop_address(thread: &mut Thread) -> Result<HeapAddress, VmError> {
    match pop_pointer(thread)? {
        PointerValue::Null => Err(VmError::memory("null pointer dereference")),
        PointerValue::Heap(addr) => Ok(addr),
        PointerValue::Tagged(_) | PointerValue::Func { .. } => {
            Err(VmError::memory("not a dereferenceable memory address"))
        }
    }
}

/// allocates `s` zero-filled bytes and pushes a pointer to the block.
pub fn new(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let size = thread.operand_u8()? as usize;
    let addr = thread.heap.allocate(size);
    thread
        .current
        .push(Value::Pointer(PointerValue::Heap(addr)));
    thread.advance(Opcode::new.operand_width());
    Ok(StepOutcome::Continue)
}

/// pops pointer `A`, pushes `A + f`. no null check: a null base traps on
/// the subsequent load/store through the resulting address (spec.md §4.3).
pub fn aaddf(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let field_offset = thread.operand_u8()? as u64;
    let base = pop_pointer(thread)?;
    let result = match base {
        PointerValue::Null => PointerValue::Null,
        PointerValue::Heap(addr) => PointerValue::Heap(addr + field_offset),
        PointerValue::Tagged(_) | PointerValue::Func { .. } => {
            return Err(VmError::memory("not a dereferenceable memory address"))
        }
    };
    thread.current.push(Value::Pointer(result));
    thread.advance(Opcode::aaddf.operand_width());
    Ok(StepOutcome::Continue)
}

pub fn imload(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let addr = pop_address(thread)?;
    let value = thread.heap.read_i32(&thread.program.string_pool, addr)?;
    thread.current.push(Value::Integer(value));
    thread.advance(Opcode::imload.operand_width());
    Ok(StepOutcome::Continue)
}

pub fn imstore(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let value = match thread.current.pop()? {
        Value::Integer(v) => v,
        Value::Pointer(_) => return Err(VmError::value("expected an integer to store")),
    };
    let addr = pop_address(thread)?;
    thread.heap.write_i32(addr, value)?;
    thread.advance(Opcode::imstore.operand_width());
    Ok(StepOutcome::Continue)
}

pub fn amload(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let addr = pop_address(thread)?;
    let value = thread.heap.read_pointer(&thread.program.string_pool, addr)?;
    thread.current.push(Value::Pointer(value));
    thread.advance(Opcode::amload.operand_width());
    Ok(StepOutcome::Continue)
}

/// accepts any pointer value — null, heap, tagged, or function — per
/// spec.md §4.3.
pub fn amstore(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let value = pop_pointer(thread)?;
    let addr = pop_address(thread)?;
    thread.heap.write_pointer(addr, value)?;
    thread.advance(Opcode::amstore.operand_width());
    Ok(StepOutcome::Continue)
}

pub fn cmload(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let addr = pop_address(thread)?;
    let value = thread.heap.read_byte(&thread.program.string_pool, addr)?;
    thread.current.push(Value::Integer(value as i32));
    thread.advance(Opcode::cmload.operand_width());
    Ok(StepOutcome::Continue)
}

/// masks the stored value with `0x7F`: the source language only ever
/// stores 7-bit ASCII through this opcode (spec.md §4.3).
pub fn cmstore(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let value = match thread.current.pop()? {
        Value::Integer(v) => v,
        Value::Pointer(_) => return Err(VmError::value("expected an integer to store")),
    };
    let addr = pop_address(thread)?;
    thread.heap.write_byte(addr, (value as u8) & 0x7F)?;
    thread.advance(Opcode::cmstore.operand_width());
    Ok(StepOutcome::Continue)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use corevm_natives::NativeFunctionTable;
    use corevm_program::ProgramBuilder;
    use pretty_assertions::assert_eq;

    use super::*;

    fn thread_with_empty_main<'a>(
        program: &'a corevm_program::Program,
        natives: &'a NativeFunctionTable,
        out: &'a mut Vec<u8>,
        input: &'a mut Cursor<Vec<u8>>,
    ) -> Thread<'a> {
        Thread::new(program, natives, 64, out, input).unwrap()
    }

    fn empty_program() -> (corevm_program::Program, NativeFunctionTable) {
        let mut builder = ProgramBuilder::new();
        builder.add_function(0, 0, vec![0xB0]);
        (builder.build(), NativeFunctionTable::standard())
    }

    #[test]
    fn new_allocates_a_zero_filled_block_and_pushes_a_pointer() {
        let mut builder = ProgramBuilder::new();
        builder.add_function(0, 0, vec![0xBB, 0x04, 0xB0]);
        let program = builder.build();
        let natives = NativeFunctionTable::standard();
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let mut thread = thread_with_empty_main(&program, &natives, &mut out, &mut input);

        new(&mut thread).unwrap();
        let Value::Pointer(PointerValue::Heap(addr)) = thread.current.operand_stack[0] else {
            panic!("expected a heap pointer");
        };
        assert_eq!(thread.heap.read_i32(&program.string_pool, addr).unwrap(), 0);
    }

    #[test]
    fn struct_field_write_then_read() {
        let (program, natives) = empty_program();
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let mut thread = thread_with_empty_main(&program, &natives, &mut out, &mut input);

        let addr = thread.heap.allocate(4);
        thread
            .current
            .push(Value::Pointer(PointerValue::Heap(addr)));
        thread.current.push(Value::Integer(1234));
        imstore(&mut thread).unwrap();

        thread
            .current
            .push(Value::Pointer(PointerValue::Heap(addr)));
        imload(&mut thread).unwrap();
        assert_eq!(thread.current.operand_stack, vec![Value::Integer(1234)]);
    }

    #[test]
    fn null_dereference_through_imload_is_a_memory_error() {
        let (program, natives) = empty_program();
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let mut thread = thread_with_empty_main(&program, &natives, &mut out, &mut input);
        thread.current.push(Value::null());
        let err = imload(&mut thread).unwrap_err();
        assert_eq!(err.kind, corevm_types::AbortKind::Memory);
    }

    #[test]
    fn cmstore_masks_to_seven_bits() {
        let (program, natives) = empty_program();
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let mut thread = thread_with_empty_main(&program, &natives, &mut out, &mut input);
        let addr = thread.heap.allocate(1);
        thread.current.operand_stack = vec![
            Value::Pointer(PointerValue::Heap(addr)),
            Value::Integer(0xFF),
        ];
        cmstore(&mut thread).unwrap();
        thread
            .current
            .push(Value::Pointer(PointerValue::Heap(addr)));
        cmload(&mut thread).unwrap();
        assert_eq!(thread.current.operand_stack, vec![Value::Integer(0x7F)]);
    }
}
