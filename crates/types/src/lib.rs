// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

pub mod error;
pub mod opcode;
pub mod value;

pub use error::{AbortKind, VmError};
pub use opcode::Opcode;
pub use value::{HeapAddress, PointerValue, TaggedHandle, Value};

/// the version of the compiled program image this interpreter understands.
///
/// the loader (out of scope for this crate) is expected to reject any
/// image whose header does not carry this value.
pub const PROGRAM_IMAGE_VERSION: u16 = 11;
