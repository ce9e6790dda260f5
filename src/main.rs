//! Runs one of the built-in register machine programs.
//!
//! # Usage
//! ```text
//! asm_unit <program> [OPTIONS]
//! ```
//!
//! # Programs
//! - `counter`: `mov cx, 5` then count `ax` up while counting `cx` down
//! - `countdown`: decrement `cx` until it reaches zero
//! - `sum-to`: `ax = 1 + 2 + ... + cx`
//! - `multiply`: `ax = bx * cx` by repeated addition
//! - `spin`: loops forever (pair with `--steps`)
//!
//! # Options
//! - `--set <reg>=<value>`: preset a register (repeatable)
//! - `--steps <n>`: step budget (defaults to `ASM_UNIT_STEP_LIMIT`, then 10,000,000)
//! - `--trace`: print the machine state after every step
//! - `--list`: print the program listing before running
//! - `--quiet`: omit timestamps from log lines
//!
//! # Examples
//! ```text
//! asm_unit counter
//! asm_unit sum-to --set cx=100
//! asm_unit multiply --set bx=6 --set cx=7 --list
//! asm_unit spin --steps 1000
//! ```

use asm_unit::utils::log;
use asm_unit::virtual_machine::assembler::{Assembler, assemble};
use asm_unit::virtual_machine::errors::VMError;
use asm_unit::virtual_machine::isa::Condition;
use asm_unit::virtual_machine::program::Program;
use asm_unit::virtual_machine::vm::{DEFAULT_STEP_LIMIT, Status, VM};
use asm_unit::{error, info};
use std::env;
use std::process;

/// Environment variable consulted when `--steps` is absent.
const STEP_LIMIT_ENV: &str = "ASM_UNIT_STEP_LIMIT";

const PROGRAMS: [&str; 5] = ["counter", "countdown", "sum-to", "multiply", "spin"];

struct Options {
    program: String,
    initial: Vec<(String, i64)>,
    step_limit: u64,
    trace: bool,
    list: bool,
    quiet: bool,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let options = parse_options(&args).unwrap_or_else(|msg| {
        error!("{msg}");
        process::exit(1);
    });
    if options.quiet {
        log::configure(false, true);
    }

    let program = match build_program(&options.program) {
        Ok(Some(program)) => program,
        Ok(None) => {
            error!(
                "unknown program '{}', expected one of: {}",
                options.program,
                PROGRAMS.join(", ")
            );
            process::exit(1);
        }
        Err(err) => {
            error!("failed to build '{}': {err}", options.program);
            process::exit(1);
        }
    };

    if options.list {
        print!("{program}");
    }

    let initial: Vec<(&str, i64)> = options
        .initial
        .iter()
        .map(|(name, value)| (name.as_str(), *value))
        .collect();
    let mut vm = VM::with_registers(&program, &initial).unwrap_or_else(|err| {
        error!("{err}");
        process::exit(1);
    });

    info!(
        "running '{}' ({} instructions, step limit {})",
        options.program,
        program.len(),
        options.step_limit
    );

    let result = if options.trace {
        run_traced(&mut vm, options.step_limit)
    } else {
        vm.run_with_limit(options.step_limit)
    };

    let stats = vm.stats();
    match result {
        Ok(()) => {
            info!(
                "halted after {} steps ({} jumps taken, {} compares)",
                stats.steps, stats.jumps_taken, stats.compares
            );
            println!("{}", vm.registers());
        }
        Err(err) => {
            error!("{err} at ip {}", vm.ip());
            println!("{}", vm.registers());
            process::exit(2);
        }
    }
}

fn print_usage(bin: &str) {
    println!("Usage: {bin} <program> [OPTIONS]");
    println!();
    println!("Programs: {}", PROGRAMS.join(", "));
    println!();
    println!("Options:");
    println!("  --set <reg>=<value>  Preset a register (repeatable)");
    println!("  --steps <n>          Step budget (env {STEP_LIMIT_ENV}, default {DEFAULT_STEP_LIMIT})");
    println!("  --trace              Print the machine state after every step");
    println!("  --list               Print the program listing before running");
    println!("  --quiet              Omit timestamps from log lines");
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        program: args[1].clone(),
        initial: Vec::new(),
        step_limit: step_limit_from_env()?,
        trace: false,
        list: false,
        quiet: false,
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--set" => {
                i += 1;
                let assignment = args.get(i).ok_or("--set requires <reg>=<value>")?;
                options.initial.push(parse_assignment(assignment)?);
            }
            "--steps" => {
                i += 1;
                let raw = args.get(i).ok_or("--steps requires a number")?;
                options.step_limit = parse_step_limit(raw)?;
            }
            "--trace" => options.trace = true,
            "--list" => options.list = true,
            "--quiet" => options.quiet = true,
            other => return Err(format!("unknown option '{other}'")),
        }
        i += 1;
    }

    Ok(options)
}

fn step_limit_from_env() -> Result<u64, String> {
    match env::var(STEP_LIMIT_ENV) {
        Ok(raw) => parse_step_limit(&raw).map_err(|msg| format!("{STEP_LIMIT_ENV}: {msg}")),
        Err(_) => Ok(DEFAULT_STEP_LIMIT),
    }
}

fn parse_step_limit(raw: &str) -> Result<u64, String> {
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(format!("invalid step limit '{raw}', expected a positive integer")),
        Ok(n) => Ok(n),
    }
}

fn parse_assignment(raw: &str) -> Result<(String, i64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <reg>=<value>, got '{raw}'"))?;
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("invalid value for {name}: '{value}'"))?;
    Ok((name.trim().to_string(), value))
}

/// Steps one instruction at a time, printing the state after each.
fn run_traced(vm: &mut VM<'_>, limit: u64) -> Result<(), VMError> {
    while vm.status() == Status::Running {
        if vm.stats().steps >= limit {
            return Err(VMError::StepLimitExceeded { limit });
        }
        let ip = vm.ip();
        let mnemonic = vm.program().instructions()[ip].mnemonic();
        vm.step()?;
        println!(
            "{:>6}  ip {:>4}  {:<4} flag {:<7} {}",
            vm.stats().steps,
            ip,
            mnemonic,
            vm.flag(),
            vm.registers()
        );
    }
    Ok(())
}

fn build_program(name: &str) -> Result<Option<Program>, VMError> {
    let program = match name {
        "counter" => assemble(|asm| {
            asm.mov("cx", 5)?
                .label("loop")?
                .inc("ax")?
                .dec("cx")?
                .cmp("cx", 0)?
                .jg("loop")?;
            Ok(())
        })?,
        "countdown" => assemble(|asm| {
            asm.label("start")?.dec("cx")?.cmp("cx", 0)?.jg("start")?;
            Ok(())
        })?,
        "sum-to" => assemble(|asm| {
            asm.cmp("cx", 0)?.jle("done")?;
            asm.label("loop")?
                .inc_by("ax", "cx")?
                .dec("cx")?
                .cmp("cx", 0)?
                .jg("loop")?;
            asm.label("done")?;
            Ok(())
        })?,
        "multiply" => multiply()?,
        "spin" => assemble(|asm| {
            asm.label("spin")?.inc("ax")?.jmp("spin")?;
            Ok(())
        })?,
        _ => return Ok(None),
    };
    Ok(Some(program))
}

/// `ax = bx * cx`, written against the emit-style calls.
fn multiply() -> Result<Program, VMError> {
    let mut asm = Assembler::standard();
    asm.emit_mov("ax", 0)?;
    asm.emit_cmp("cx", 0)?;
    asm.emit_conditional_jump(Condition::LessOrEqual, "done")?;
    asm.declare_label("loop")?;
    asm.emit_inc("ax", Some("bx".into()))?;
    asm.emit_dec("cx", None)?;
    asm.emit_cmp("cx", 0)?;
    asm.emit_conditional_jump(Condition::NotEqual, "loop")?;
    asm.declare_label("done")?;
    asm.finalize()
}
