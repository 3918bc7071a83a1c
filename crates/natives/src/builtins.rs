// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! the concrete implementations registered into [`crate::table::NativeFunctionTable::standard`].

use corevm_types::{Value, VmError};

use crate::table::NativeContext;

fn expect_integer(args: &[Value], index: usize) -> Result<i32, VmError> {
    match args.get(index) {
        Some(Value::Integer(v)) => Ok(*v),
        Some(Value::Pointer(_)) => Err(VmError::value(format!(
            "native argument {} expected an integer, got a pointer",
            index
        ))),
        None => Err(VmError::fatal(format!("missing native argument {}", index))),
    }
}

fn expect_pointer(args: &[Value], index: usize) -> Result<Value, VmError> {
    match args.get(index) {
        Some(v @ Value::Pointer(_)) => Ok(*v),
        Some(Value::Integer(_)) => Err(VmError::value(format!(
            "native argument {} expected a pointer, got an integer",
            index
        ))),
        None => Err(VmError::fatal(format!("missing native argument {}", index))),
    }
}

pub fn print_i32(args: &[Value], ctx: &mut dyn NativeContext) -> Result<Value, VmError> {
    let value = expect_integer(args, 0)?;
    ctx.write_stdout(value.to_string().as_bytes());
    Ok(Value::Integer(0))
}

pub fn print_string(args: &[Value], ctx: &mut dyn NativeContext) -> Result<Value, VmError> {
    let pointer = expect_pointer(args, 0)?;
    let bytes = ctx.read_cstring(pointer)?;
    ctx.write_stdout(&bytes);
    Ok(Value::Integer(0))
}

pub fn print_newline(_args: &[Value], ctx: &mut dyn NativeContext) -> Result<Value, VmError> {
    ctx.write_stdout(b"\n");
    Ok(Value::Integer(0))
}

pub fn read_i32(_args: &[Value], ctx: &mut dyn NativeContext) -> Result<Value, VmError> {
    let value = ctx.read_i32_line()?;
    Ok(Value::Integer(value))
}

pub fn string_length(args: &[Value], ctx: &mut dyn NativeContext) -> Result<Value, VmError> {
    let pointer = expect_pointer(args, 0)?;
    let bytes = ctx.read_cstring(pointer)?;
    Ok(Value::Integer(bytes.len() as i32))
}

pub fn i32_abs(args: &[Value], _ctx: &mut dyn NativeContext) -> Result<Value, VmError> {
    let value = expect_integer(args, 0)?;
    Ok(Value::Integer(value.wrapping_abs()))
}

pub fn i32_min(args: &[Value], _ctx: &mut dyn NativeContext) -> Result<Value, VmError> {
    let a = expect_integer(args, 0)?;
    let b = expect_integer(args, 1)?;
    Ok(Value::Integer(a.min(b)))
}

pub fn i32_max(args: &[Value], _ctx: &mut dyn NativeContext) -> Result<Value, VmError> {
    let a = expect_integer(args, 0)?;
    let b = expect_integer(args, 1)?;
    Ok(Value::Integer(a.max(b)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    struct RecordingContext {
        out: Vec<u8>,
    }

    impl NativeContext for RecordingContext {
        fn read_cstring(&self, _value: Value) -> Result<Vec<u8>, VmError> {
            Ok(b"hi".to_vec())
        }
        fn write_stdout(&mut self, bytes: &[u8]) {
            self.out.extend_from_slice(bytes);
        }
        fn read_i32_line(&mut self) -> Result<i32, VmError> {
            Ok(42)
        }
    }

    #[test]
    fn print_i32_writes_decimal_text() {
        let mut ctx = RecordingContext { out: Vec::new() };
        print_i32(&[Value::Integer(-5)], &mut ctx).unwrap();
        assert_eq!(ctx.out, b"-5");
    }

    #[test]
    fn string_length_counts_bytes_before_nul() {
        let mut ctx = RecordingContext { out: Vec::new() };
        let result =
            string_length(&[Value::null()], &mut ctx).unwrap();
        assert_eq!(result, Value::Integer(2));
    }

    #[test]
    fn wrong_argument_kind_is_a_value_error() {
        let mut ctx = RecordingContext { out: Vec::new() };
        let err = print_i32(&[Value::null()], &mut ctx).unwrap_err();
        assert_eq!(err.kind, corevm_types::AbortKind::Value);
    }

    #[test]
    fn i32_abs_of_int_min_wraps_rather_than_overflows() {
        let mut ctx = RecordingContext { out: Vec::new() };
        let result = i32_abs(&[Value::Integer(i32::MIN)], &mut ctx).unwrap();
        assert_eq!(result, Value::Integer(i32::MIN));
    }
}
