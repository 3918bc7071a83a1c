// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE and CONTRIBUTING.

//! a thin command-line front end over `corevm-runtime`. the bytecode loader
//! spec.md §1 puts out of scope means there is no on-disk image format to
//! read here, so the front end runs a small set of embedded demonstration
//! programs instead, selected by name, and reports the result the way the
//! teacher's `ancsr` hands a resolved application to the runtime crate.

mod demos;

use std::io;
use std::process::ExitCode;

use corevm_natives::NativeFunctionTable;
use corevm_runtime::{Vm, VmConfig};

fn usage() {
    eprintln!("usage: corevm <demo-name|--list>");
    eprintln!();
    eprintln!("available demos:");
    for demo in demos::DEMOS {
        eprintln!("  {:<18} {}", demo.name, demo.description);
    }
}

fn run_demo(demo: &demos::Demo) -> ExitCode {
    let program = (demo.program)();
    let natives = NativeFunctionTable::standard();
    let vm = Vm::new(&program, &natives, VmConfig::default());

    let stdout = io::stdout();
    let stdin = io::stdin();
    let mut stdout_lock = stdout.lock();
    let mut stdin_lock = stdin.lock();

    match vm.run(&mut stdout_lock, &mut stdin_lock) {
        Ok(exit_value) => {
            println!("{}: exited normally with value {}", demo.name, exit_value);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}: {}", demo.name, err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        usage();
        return ExitCode::FAILURE;
    };

    if arg == "--list" || arg == "-l" {
        usage();
        return ExitCode::SUCCESS;
    }

    match demos::DEMOS.iter().find(|d| d.name == arg) {
        Some(demo) => run_demo(demo),
        None => {
            eprintln!("corevm: no such demo: {}", arg);
            usage();
            ExitCode::FAILURE
        }
    }
}
