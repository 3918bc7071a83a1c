// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

use std::fmt::{Display, Formatter};

/// the five abort categories (spec.md §7). every one of them is terminal:
/// the dispatch loop never resumes after raising one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortKind {
    /// raised by `ATHROW`.
    User,
    /// raised by `ASSERT` when the condition is false.
    Assertion,
    /// null dereference, out-of-bounds array access, negative array length.
    Memory,
    /// division/modulus by zero, `INT_MIN / -1`, an out-of-range shift amount.
    Arith,
    /// a mis-typed value operation: integer vs. pointer, or mismatched
    /// pointer sub-kinds in an equality comparison.
    Value,
    /// an implementation-detected invariant violation that is not one of the
    /// five program-visible abort categories above (operand-stack
    /// underflow, an unrecognised opcode byte). spec.md calls stack
    /// underflow "a fatal invariant violation" rather than a program abort;
    /// this variant is how that distinction is represented without a panic.
    Fatal,
}

impl AbortKind {
    /// one non-zero process exit code per category (spec.md §7: "a
    /// reasonable scheme is one non-zero exit code per category").
    pub fn exit_code(&self) -> i32 {
        match self {
            AbortKind::User => 1,
            AbortKind::Assertion => 2,
            AbortKind::Memory => 3,
            AbortKind::Arith => 4,
            AbortKind::Value => 5,
            AbortKind::Fatal => 6,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AbortKind::User => "user error",
            AbortKind::Assertion => "assertion failure",
            AbortKind::Memory => "memory error",
            AbortKind::Arith => "arith error",
            AbortKind::Value => "value error",
            AbortKind::Fatal => "fatal error",
        }
    }
}

/// an abnormal VM termination: an abort category plus a diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmError {
    pub kind: AbortKind,
    pub message: String,
}

impl VmError {
    pub fn new(kind: AbortKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::new(AbortKind::User, message)
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(AbortKind::Assertion, message)
    }

    pub fn memory(message: impl Into<String>) -> Self {
        Self::new(AbortKind::Memory, message)
    }

    pub fn arith(message: impl Into<String>) -> Self {
        Self::new(AbortKind::Arith, message)
    }

    pub fn value(message: impl Into<String>) -> Self {
        Self::new(AbortKind::Value, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(AbortKind::Fatal, message)
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}

impl Display for VmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

impl std::error::Error for VmError {}
