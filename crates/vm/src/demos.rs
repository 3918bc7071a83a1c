// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! a small set of embedded demonstration programs, hand-assembled with
//! `ProgramBuilder`/`BytecodeWriter` in place of the out-of-scope loader
//! (spec.md §1). each exercises one corner of the execution core the way
//! spec.md §8's concrete scenarios describe.

use corevm_binary::BytecodeWriter;
use corevm_program::{Program, ProgramBuilder};
use corevm_types::Opcode;

pub struct Demo {
    pub name: &'static str,
    pub description: &'static str,
    pub program: fn() -> Program,
}

pub const DEMOS: &[Demo] = &[
    Demo {
        name: "fibonacci",
        description: "recursive fib(10), expected exit value 55",
        program: fibonacci,
    },
    Demo {
        name: "div-by-zero",
        description: "IDIV by zero, expected an arith abort",
        program: division_by_zero,
    },
    Demo {
        name: "int-min-overflow",
        description: "INT_MIN / -1, expected an arith abort",
        program: int_min_div_neg_one,
    },
    Demo {
        name: "array-bounds",
        description: "read past the end of a 3-element array, expected a memory abort",
        program: array_out_of_bounds,
    },
    Demo {
        name: "null-store",
        description: "IMSTORE through a null pointer, expected a memory abort",
        program: null_store,
    },
    Demo {
        name: "assert-fail",
        description: "ASSERT on a false condition, expected an assertion abort",
        program: assert_fail,
    },
];

/// `fib(n) = n < 2 ? n : fib(n-1) + fib(n-2)`, called from `main` with
/// `BIPUSH 10`.
fn fibonacci() -> Program {
    let mut builder = ProgramBuilder::new();

    let main = BytecodeWriter::new()
        .write_opcode_i8(Opcode::bipush, 10)
        .write_opcode_u16(Opcode::invokestatic, 1)
        .write_opcode(Opcode::return_);
    builder.add_function(0, 0, main.into_bytes());

    let fib = BytecodeWriter::new()
        .write_opcode_u8(Opcode::vload, 0)
        .write_opcode_i8(Opcode::bipush, 2);
    let (fib, lt_patch) = fib.write_branch_placeholder(Opcode::if_icmplt);
    let fib = fib
        .write_opcode_u8(Opcode::vload, 0)
        .write_opcode_i8(Opcode::bipush, 1)
        .write_opcode(Opcode::isub)
        .write_opcode_u16(Opcode::invokestatic, 1)
        .write_opcode_u8(Opcode::vload, 0)
        .write_opcode_i8(Opcode::bipush, 2)
        .write_opcode(Opcode::isub)
        .write_opcode_u16(Opcode::invokestatic, 1)
        .write_opcode(Opcode::iadd);
    let (mut fib, end_patch) = fib.write_branch_placeholder(Opcode::goto);
    let base_case_addr = fib.current_address();
    fib.patch_branch(lt_patch, base_case_addr);
    let mut fib = fib.write_opcode_u8(Opcode::vload, 0);
    let return_addr = fib.current_address();
    fib.patch_branch(end_patch, return_addr);
    let fib = fib.write_opcode(Opcode::return_);

    builder.add_function(1, 1, fib.into_bytes());
    builder.build()
}

fn division_by_zero() -> Program {
    let mut builder = ProgramBuilder::new();
    let main = BytecodeWriter::new()
        .write_opcode_i8(Opcode::bipush, 10)
        .write_opcode_i8(Opcode::bipush, 0)
        .write_opcode(Opcode::idiv)
        .write_opcode(Opcode::return_);
    builder.add_function(0, 0, main.into_bytes());
    builder.build()
}

fn int_min_div_neg_one() -> Program {
    let mut builder = ProgramBuilder::new();
    let int_min = builder.add_int_constant(i32::MIN);
    let main = BytecodeWriter::new()
        .write_opcode_u16(Opcode::ildc, int_min)
        .write_opcode_i8(Opcode::bipush, -1)
        .write_opcode(Opcode::idiv)
        .write_opcode(Opcode::return_);
    builder.add_function(0, 0, main.into_bytes());
    builder.build()
}

fn array_out_of_bounds() -> Program {
    let mut builder = ProgramBuilder::new();
    let main = BytecodeWriter::new()
        .write_opcode_i8(Opcode::bipush, 3)
        .write_opcode_u8(Opcode::newarray, 4) // new int[3]
        .write_opcode_i8(Opcode::bipush, 3) // out of bounds: valid indices are 0..3
        .write_opcode(Opcode::aadds)
        .write_opcode(Opcode::imload)
        .write_opcode(Opcode::return_);
    builder.add_function(0, 0, main.into_bytes());
    builder.build()
}

fn null_store() -> Program {
    let mut builder = ProgramBuilder::new();
    let main = BytecodeWriter::new()
        .write_opcode(Opcode::aconst_null)
        .write_opcode_i8(Opcode::bipush, 1)
        .write_opcode(Opcode::imstore)
        .write_opcode(Opcode::return_);
    builder.add_function(0, 0, main.into_bytes());
    builder.build()
}

fn assert_fail() -> Program {
    let mut builder = ProgramBuilder::new();
    let message = builder.add_string("values must match");
    let main = BytecodeWriter::new()
        .write_opcode_i8(Opcode::bipush, 0) // condition: false
        .write_opcode_u16(Opcode::aldc, message as u16)
        .write_opcode(Opcode::assert_)
        .write_opcode_i8(Opcode::bipush, 0)
        .write_opcode(Opcode::return_);
    builder.add_function(0, 0, main.into_bytes());
    builder.build()
}
