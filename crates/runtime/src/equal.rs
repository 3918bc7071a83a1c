// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! the value equality contract (spec.md §4.5), used by `IF_CMPEQ`/`IF_CMPNE`.
//! needs heap access to unwrap tagged-pointer boxes, so it lives here rather
//! than in `corevm-types`.

use corevm_types::{PointerValue, Value, VmError};

use crate::heap::Heap;

/// `val_equal(v1, v2)` exactly as spec.md §4.5 enumerates it.
pub fn val_equal(heap: &Heap, v1: Value, v2: Value) -> Result<bool, VmError> {
    match (v1, v2) {
        (Value::Integer(a), Value::Integer(b)) => Ok(a == b),
        (Value::Pointer(p1), Value::Pointer(p2)) => pointer_equal(heap, p1, p2),
        _ => Err(VmError::value(
            "cannot compare an integer and a pointer for equality",
        )),
    }
}

fn pointer_equal(heap: &Heap, p1: PointerValue, p2: PointerValue) -> Result<bool, VmError> {
    if p1.is_null() && p2.is_null() {
        return Ok(true);
    }
    if p1.is_null() || p2.is_null() {
        return Ok(false);
    }

    let real1 = unwrap_tagged(heap, p1)?;
    let real2 = unwrap_tagged(heap, p2)?;
    let was_tagged = matches!(p1, PointerValue::Tagged(_)) || matches!(p2, PointerValue::Tagged(_));
    let both_tagged =
        matches!(p1, PointerValue::Tagged(_)) && matches!(p2, PointerValue::Tagged(_));

    if was_tagged && !both_tagged {
        return Err(VmError::value(
            "cannot compare a tagged pointer against an untagged one",
        ));
    }

    match (real1, real2) {
        (PointerValue::Heap(a), PointerValue::Heap(b)) => Ok(a == b),
        (
            PointerValue::Func {
                is_native: n1,
                index: i1,
            },
            PointerValue::Func {
                is_native: n2,
                index: i2,
            },
        ) => Ok(n1 == n2 && i1 == i2),
        (PointerValue::Null, PointerValue::Null) => Ok(true),
        (PointerValue::Null, _) | (_, PointerValue::Null) => Ok(false),
        _ => Err(VmError::value(
            "cannot compare pointers of mismatched sub-kinds",
        )),
    }
}

fn unwrap_tagged(heap: &Heap, pointer: PointerValue) -> Result<PointerValue, VmError> {
    match pointer {
        PointerValue::Tagged(handle) => Ok(heap.tagged_box(handle)?.real_pointer),
        other => Ok(other),
    }
}
