// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! integer arithmetic and bitwise opcodes (spec.md §4.1 "Arithmetic &
//! logic"). every binary op pops `y` then `x` and pushes `x OP y`.

use corevm_types::{Opcode, Value, VmError};

use crate::thread::Thread;

use super::StepOutcome;

fn pop_integers(thread: &mut Thread) -> Result<(i32, i32), VmError> {
    let y = pop_integer(thread)?;
    let x = pop_integer(thread)?;
    Ok((x, y))
}

fn pop_integer(thread: &mut Thread) -> Result<i32, VmError> {
    match thread.current.pop()? {
        Value::Integer(v) => Ok(v),
        Value::Pointer(_) => Err(VmError::value("expected an integer, found a pointer")),
    }
}

fn finish(thread: &mut Thread, result: i32) -> Result<StepOutcome, VmError> {
    thread.current.push(Value::Integer(result));
    thread.advance(Opcode::iadd.operand_width());
    Ok(StepOutcome::Continue)
}

pub fn iadd(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let (x, y) = pop_integers(thread)?;
    finish(thread, x.wrapping_add(y))
}

pub fn isub(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let (x, y) = pop_integers(thread)?;
    finish(thread, x.wrapping_sub(y))
}

pub fn imul(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let (x, y) = pop_integers(thread)?;
    finish(thread, x.wrapping_mul(y))
}

pub fn idiv(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let (x, y) = pop_integers(thread)?;
    if y == 0 {
        return Err(VmError::arith("division by zero"));
    }
    if x == i32::MIN && y == -1 {
        return Err(VmError::arith("division overflow: INT_MIN / -1"));
    }
    finish(thread, x.wrapping_div(y))
}

pub fn irem(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let (x, y) = pop_integers(thread)?;
    if y == 0 {
        return Err(VmError::arith("modulus by zero"));
    }
    if x == i32::MIN && y == -1 {
        return Err(VmError::arith("modulus overflow: INT_MIN / -1"));
    }
    finish(thread, x.wrapping_rem(y))
}

pub fn iand(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let (x, y) = pop_integers(thread)?;
    finish(thread, x & y)
}

pub fn ior(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let (x, y) = pop_integers(thread)?;
    finish(thread, x | y)
}

pub fn ixor(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let (x, y) = pop_integers(thread)?;
    finish(thread, x ^ y)
}

fn shift_amount(y: i32) -> Result<u32, VmError> {
    if !(0..=31).contains(&y) {
        return Err(VmError::arith(format!(
            "shift amount out of range [0, 31]: {}",
            y
        )));
    }
    Ok(y as u32)
}

pub fn ishl(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let (x, y) = pop_integers(thread)?;
    let amount = shift_amount(y)?;
    finish(thread, x.wrapping_shl(amount))
}

/// arithmetic (sign-extending) right shift, per spec.md §4.1.
pub fn ishr(thread: &mut Thread) -> Result<StepOutcome, VmError> {
    let (x, y) = pop_integers(thread)?;
    let amount = shift_amount(y)?;
    finish(thread, x.wrapping_shr(amount))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use corevm_natives::NativeFunctionTable;
    use corevm_program::ProgramBuilder;
    use pretty_assertions::assert_eq;

    use super::*;

    fn new_thread_with<'a>(
        program: &'a corevm_program::Program,
        natives: &'a NativeFunctionTable,
        out: &'a mut Vec<u8>,
        input: &'a mut Cursor<Vec<u8>>,
    ) -> Thread<'a> {
        Thread::new(program, natives, 0, out, input).unwrap()
    }

    fn harness<F: FnOnce(&mut Thread) -> Result<StepOutcome, VmError>>(
        initial: &[Value],
        f: F,
    ) -> Result<Vec<Value>, VmError> {
        let mut builder = ProgramBuilder::new();
        builder.add_function(0, 0, vec![0xB0]);
        let program = builder.build();
        let natives = NativeFunctionTable::standard();
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let mut thread = new_thread_with(&program, &natives, &mut out, &mut input);
        for v in initial {
            thread.current.push(*v);
        }
        f(&mut thread)?;
        Ok(thread.current.operand_stack.clone())
    }

    #[test]
    fn iadd_wraps_on_overflow() {
        let result = harness(&[Value::Integer(i32::MAX), Value::Integer(1)], iadd).unwrap();
        assert_eq!(result, vec![Value::Integer(i32::MIN)]);
    }

    #[test]
    fn isub_pops_y_then_x_and_computes_x_minus_y() {
        let result = harness(&[Value::Integer(10), Value::Integer(3)], isub).unwrap();
        assert_eq!(result, vec![Value::Integer(7)]);
    }

    #[test]
    fn idiv_traps_on_division_by_zero() {
        let err = harness(&[Value::Integer(1), Value::Integer(0)], idiv).unwrap_err();
        assert_eq!(err.kind, corevm_types::AbortKind::Arith);
    }

    #[test]
    fn idiv_traps_on_int_min_over_minus_one() {
        let err = harness(&[Value::Integer(i32::MIN), Value::Integer(-1)], idiv).unwrap_err();
        assert_eq!(err.kind, corevm_types::AbortKind::Arith);
    }

    #[test]
    fn irem_sign_follows_the_dividend() {
        let result = harness(&[Value::Integer(-7), Value::Integer(2)], irem).unwrap();
        assert_eq!(result, vec![Value::Integer(-1)]);
    }

    #[test]
    fn ishl_by_31_is_defined_by_32_traps() {
        assert!(harness(&[Value::Integer(1), Value::Integer(31)], ishl).is_ok());
        let err = harness(&[Value::Integer(1), Value::Integer(32)], ishl).unwrap_err();
        assert_eq!(err.kind, corevm_types::AbortKind::Arith);
    }

    #[test]
    fn ishr_sign_extends() {
        let result = harness(&[Value::Integer(-8), Value::Integer(1)], ishr).unwrap();
        assert_eq!(result, vec![Value::Integer(-4)]);
    }

    #[test]
    fn arithmetic_on_a_pointer_is_a_value_error() {
        let err = harness(&[Value::null(), Value::Integer(1)], iadd).unwrap_err();
        assert_eq!(err.kind, corevm_types::AbortKind::Value);
    }
}
