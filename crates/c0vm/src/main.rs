// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// the driver
// ----------
//
// `c0vm [-d] <file.bc0>`
//
// loads the bytecode container, runs the entry function and prints
// its result. with `-d` the disassembly of every function is printed
// before execution. a trap is printed to stderr, and its
// classification selects the process exit code so scripts can tell
// the failure modes apart.

use std::{fs::File, process::ExitCode};

use memmap2::Mmap;

use c0vm_image::{
    bc0_reader::load_program_text, bytecode_reader::format_bytecode_as_text, Program,
};
use c0vm_isa::{GenericError, TrapKind};
use c0vm_processor::process::execute;

const EXIT_CODE_USAGE: u8 = 64;
const EXIT_CODE_LOAD_FAILURE: u8 = 65;

fn main() -> ExitCode {
    let mut disassemble = false;
    let mut path: Option<String> = None;

    for argument in std::env::args().skip(1) {
        match argument.as_str() {
            "-d" => disassemble = true,
            _ if path.is_none() => path = Some(argument),
            _ => {
                eprintln!("usage: c0vm [-d] <file.bc0>");
                return ExitCode::from(EXIT_CODE_USAGE);
            }
        }
    }

    let Some(path) = path else {
        eprintln!("usage: c0vm [-d] <file.bc0>");
        return ExitCode::from(EXIT_CODE_USAGE);
    };

    let program = match load_program_file(&path) {
        Ok(program) => program,
        Err(error) => {
            eprintln!("c0vm: {}: {}", path, error);
            return ExitCode::from(EXIT_CODE_LOAD_FAILURE);
        }
    };

    if disassemble {
        print_disassembly(&program);
    }

    match execute(&program) {
        Ok(result) => {
            println!("{}", result);
            ExitCode::SUCCESS
        }
        Err(trap) => {
            eprintln!("c0vm: {}", trap);
            ExitCode::from(trap_exit_code(trap.kind))
        }
    }
}

fn load_program_file(path: &str) -> Result<Program, GenericError> {
    let file = File::open(path)?;
    let mapping = unsafe { Mmap::map(&file)? };
    let text = std::str::from_utf8(&mapping)?;
    let program = load_program_text(text)?;
    Ok(program)
}

fn print_disassembly(program: &Program) {
    for (function_index, function_entry) in program.function_pool.iter().enumerate() {
        println!(
            "function {} (args: {}, vars: {})",
            function_index, function_entry.num_args, function_entry.num_vars
        );
        println!("{}", format_bytecode_as_text(&function_entry.code));
        println!();
    }
}

fn trap_exit_code(kind: TrapKind) -> u8 {
    match kind {
        TrapKind::UserError => 1,
        TrapKind::AssertionFailure => 2,
        TrapKind::MemoryError => 3,
        TrapKind::ValueError => 4,
        TrapKind::ArithError => 5,
        TrapKind::InvalidOpcode => 6,
    }
}
