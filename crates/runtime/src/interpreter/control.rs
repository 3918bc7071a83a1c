// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! NOP / ATHROW / ASSERT (spec.md §4.1 "Control errors").

use corevm_types::{Opcode, Value, VmError};

use crate::thread::Thread;

use super::StepOutcome;

pub fn nop(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    thread.advance(Opcode::nop.operand_width());
    Ok(StepOutcome::Continue)
}

/// pops a pointer into the string pool treated as a NUL-terminated message
/// and raises a *user error* carrying it.
pub fn athrow(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let message_ptr = thread.current.pop()?;
    let message = thread.resolve_cstring(message_ptr)?;
    Err(VmError::user(String::from_utf8_lossy(&message).into_owned()))
}

/// pops the message-pointer, then the condition; raises *assertion
/// failure* with the message when the condition is zero.
pub fn assert_(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let message_ptr = thread.current.pop()?;
    let condition = thread.current.pop()?;
    let condition = match condition {
        Value::Integer(v) => v,
        Value::Pointer(_) => return Err(VmError::value("assert condition must be an integer")),
    };
    if condition == 0 {
        let message = thread.resolve_cstring(message_ptr)?;
        return Err(VmError::assertion(String::from_utf8_lossy(&message).into_owned()));
    }
    thread.advance(Opcode::assert_.operand_width());
    Ok(StepOutcome::Continue)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use corevm_natives::NativeFunctionTable;
    use corevm_program::ProgramBuilder;
    use pretty_assertions::assert_eq;

    use super::*;

    fn harness_with_message(condition: Value) -> Result<StepOutcome, VmError> {
        let mut builder = ProgramBuilder::new();
        let msg = builder.add_string("msg");
        builder.add_function(
            0,
            0,
            vec![0xCF, (msg >> 8) as u8, msg as u8, 0xB0],
        );
        let program = builder.build();
        let natives = NativeFunctionTable::standard();
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let mut thread = Thread::new(&program, &natives, 0, &mut out, &mut input).unwrap();
        thread.current.push(condition);
        thread
            .current
            .push(Value::Pointer(corevm_types::PointerValue::Heap(msg as u64 + 1)));
        assert_(&mut thread)
    }

    #[test]
    fn assert_true_continues() {
        assert!(harness_with_message(Value::Integer(1)).is_ok());
    }

    #[test]
    fn assert_false_raises_an_assertion_failure_with_the_message() {
        let err = harness_with_message(Value::Integer(0)).unwrap_err();
        assert_eq!(err.kind, corevm_types::AbortKind::Assertion);
        assert_eq!(err.message, "msg");
    }
}
