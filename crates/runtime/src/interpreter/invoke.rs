// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! INVOKESTATIC / INVOKENATIVE / RETURN (spec.md §4.2), plus INVOKEDYNAMIC
//! from the C1 subset (spec.md §4.6), which dispatches through the same
//! two paths once it has resolved a function pointer to an index.

use corevm_types::{Opcode, PointerValue, Value, VmError};

use crate::frame::ActivationRecord;
use crate::thread::Thread;

use super::StepOutcome;

/// pops `num_args` values and returns them in call order (spec.md §4.2:
/// "the topmost popped value becomes the last argument").
fn pop_arguments(thread: &mut Thread, num_args: usize) -> Result<Vec<Value>, VmError> {
    let mut args = Vec::with_capacity(num_args);
    for _ in 0..num_args {
        args.push(thread.current.pop()?);
    }
    args.reverse();
    Ok(args)
}

fn invoke_static(thread: &mut Thread, index: u16, pc_after: usize) -> Result<StepOutcome, VmError> {
    let f = thread.program.function(index)?;
    let num_args = f.num_args as usize;
    let num_vars = f.num_vars;
    let args = pop_arguments(thread, num_args)?;

    thread.current.pc = pc_after;
    let caller = std::mem::replace(&mut thread.current, ActivationRecord::new(index, num_vars, args));
    thread.call_stack.push(caller);
    Ok(StepOutcome::Continue)
}

fn invoke_native(thread: &mut Thread, index: u16) -> Result<(), VmError> {
    let n = *thread.program.native(index)?;
    let args = pop_arguments(thread, n.num_args as usize)?;
    let function = thread.natives.get(n.function_table_index)?;
    let result = function(&args, thread)?;
    thread.current.push(result);
    Ok(())
}

pub fn invokestatic(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let index = thread.operand_u16()?;
    let pc_after = thread.current.pc + 1 + Opcode::invokestatic.operand_width();
    invoke_static(thread, index, pc_after)
}

pub fn invokenative(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let index = thread.operand_u16()?;
    invoke_native(thread, index)?;
    thread.advance(Opcode::invokenative.operand_width());
    Ok(StepOutcome::Continue)
}

/// pops a function pointer and dispatches to the static or native function
/// it names (spec.md §4.6). not itself followed by inline operand bytes.
pub fn invokedynamic(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let pointer = thread.current.pop()?;
    let (is_native, index) = match pointer {
        Value::Pointer(PointerValue::Func { is_native, index }) => (is_native, index),
        Value::Pointer(PointerValue::Null) => {
            return Err(VmError::memory("invokedynamic on a null function pointer"))
        }
        _ => return Err(VmError::value("invokedynamic requires a function pointer")),
    };

    if is_native {
        invoke_native(thread, index)?;
        thread.advance(Opcode::invokedynamic.operand_width());
        Ok(StepOutcome::Continue)
    } else {
        let pc_after = thread.current.pc + 1 + Opcode::invokedynamic.operand_width();
        invoke_static(thread, index, pc_after)
    }
}

/// pops the return value; either terminates the VM (bottom frame) or
/// restores the caller and pushes the value onto its operand stack.
pub fn return_(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let value = thread.current.pop()?;

    if thread.call_stack.is_empty() {
        return match value {
            Value::Integer(v) => Ok(StepOutcome::Terminate(v)),
            Value::Pointer(_) => Err(VmError::value(
                "top-level return value must be an integer",
            )),
        };
    }

    let caller = thread
        .call_stack
        .pop()
        .expect("checked non-empty above");
    thread.current = caller;
    thread.current.push(value);
    Ok(StepOutcome::Continue)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use corevm_natives::NativeFunctionTable;
    use corevm_program::ProgramBuilder;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn invokestatic_places_arguments_in_call_order_and_installs_a_fresh_frame() {
        let mut builder = ProgramBuilder::new();
        // function 1: two args, returns arg0 - arg1
        let callee = builder.add_function(2, 2, vec![0xB0]);
        assert_eq!(callee, 1);
        builder.add_function(
            0,
            0,
            vec![
                0x10, 10, // bipush 10
                0x10, 3, // bipush 3
                0xB8, 0x00, 0x01, // invokestatic #1
                0xB0,
            ],
        );
        let program = builder.build();
        let natives = NativeFunctionTable::standard();
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let mut thread = Thread::new(&program, &natives, 0, &mut out, &mut input).unwrap();
        thread.current.push(Value::Integer(10));
        thread.current.push(Value::Integer(3));
        thread.current.pc = 4; // pointing at the invokestatic opcode

        invokestatic(&mut thread).unwrap();

        assert_eq!(thread.current.function_index, 1);
        assert_eq!(thread.current.locals[0], Value::Integer(10));
        assert_eq!(thread.current.locals[1], Value::Integer(3));
        assert_eq!(thread.call_stack.depth(), 1);
    }

    #[test]
    fn return_at_the_bottom_frame_terminates_with_the_integer_value() {
        let mut builder = ProgramBuilder::new();
        builder.add_function(0, 0, vec![0xB0]);
        let program = builder.build();
        let natives = NativeFunctionTable::standard();
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let mut thread = Thread::new(&program, &natives, 0, &mut out, &mut input).unwrap();
        thread.current.push(Value::Integer(55));
        match return_(&mut thread).unwrap() {
            StepOutcome::Terminate(v) => assert_eq!(v, 55),
            StepOutcome::Continue => panic!("expected termination"),
        }
    }

    #[test]
    fn returning_a_pointer_at_the_top_level_is_a_value_error() {
        let mut builder = ProgramBuilder::new();
        builder.add_function(0, 0, vec![0xB0]);
        let program = builder.build();
        let natives = NativeFunctionTable::standard();
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let mut thread = Thread::new(&program, &natives, 0, &mut out, &mut input).unwrap();
        thread.current.push(Value::null());
        let err = return_(&mut thread).unwrap_err();
        assert_eq!(err.kind, corevm_types::AbortKind::Value);
    }

    #[test]
    fn return_restores_the_caller_and_pushes_the_result() {
        let mut builder = ProgramBuilder::new();
        builder.add_function(0, 0, vec![0xB0]);
        let program = builder.build();
        let natives = NativeFunctionTable::standard();
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let mut thread = Thread::new(&program, &natives, 0, &mut out, &mut input).unwrap();

        let mut caller = ActivationRecord::new(0, 0, Vec::new());
        caller.push(Value::Integer(1));
        thread.call_stack.push(caller);
        thread.current.push(Value::Integer(99));

        return_(&mut thread).unwrap();
        assert_eq!(thread.current.operand_stack, vec![Value::Integer(1), Value::Integer(99)]);
    }
}
