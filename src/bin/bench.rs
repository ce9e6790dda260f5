//! Execution benchmark binary.
//!
//! Measures how fast the engine runs representative loops. Programs are
//! assembled once up front; only execution is timed.
//! Run with: `cargo run --release --bin bench`

use asm_unit::info;
use asm_unit::virtual_machine::assembler::assemble;
use asm_unit::virtual_machine::errors::VMError;
use asm_unit::virtual_machine::program::Program;
use asm_unit::virtual_machine::vm::VM;
use std::process;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Benchmark harness
// ---------------------------------------------------------------------------

struct BenchResult {
    name: &'static str,
    iterations: u64,
    total: Duration,
    /// Instructions executed by one run.
    steps: u64,
}

impl BenchResult {
    fn avg(&self) -> Duration {
        self.total / self.iterations.max(1) as u32
    }

    fn print(&self) {
        let ns_per_run = self.avg().as_nanos();
        let ns_per_step = if self.steps > 0 {
            format!("{:>8.2}", ns_per_run as f64 / self.steps as f64)
        } else {
            "       -".to_string()
        };
        println!(
            "  {:<26} {:>8} iters {:>10.3} us/run {:>10} steps  {} ns/step",
            self.name,
            self.iterations,
            ns_per_run as f64 / 1000.0,
            self.steps,
            ns_per_step,
        );
    }
}

/// Runs `f` for at least `min_duration`, returning aggregated results.
fn bench<F>(name: &'static str, min_duration: Duration, mut f: F) -> BenchResult
where
    F: FnMut() -> u64,
{
    // Warmup
    for _ in 0..5 {
        f();
    }

    let mut iterations = 0u64;
    let mut steps = 0u64;
    let start = Instant::now();
    while start.elapsed() < min_duration {
        steps = f();
        iterations += 1;
    }

    BenchResult {
        name,
        iterations,
        total: start.elapsed(),
        steps,
    }
}

/// Runs `program` once from `initial` and returns the number of steps taken.
fn steps_for(program: &Program, initial: &[(&str, i64)]) -> u64 {
    let mut vm = match VM::with_registers(program, initial) {
        Ok(vm) => vm,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    };
    if let Err(err) = vm.run() {
        eprintln!("error: {err}");
        process::exit(1);
    }
    vm.stats().steps
}

// ---------------------------------------------------------------------------
// Benchmark programs
// ---------------------------------------------------------------------------

/// cx iterations of inc/dec/cmp/jg.
fn tight_loop() -> Result<Program, VMError> {
    assemble(|asm| {
        asm.label("loop")?
            .inc("ax")?
            .dec("cx")?
            .cmp("cx", 0)?
            .jg("loop")?;
        Ok(())
    })
}

/// ax = 1 + 2 + ... + cx.
fn sum_to() -> Result<Program, VMError> {
    assemble(|asm| {
        asm.label("loop")?
            .inc_by("ax", "cx")?
            .dec("cx")?
            .cmp("cx", 0)?
            .jg("loop")?;
        Ok(())
    })
}

/// ax = bx * cx with a nested counter, exercising forward and backward jumps.
fn nested_multiply() -> Result<Program, VMError> {
    assemble(|asm| {
        asm.jmp("outer")?;
        asm.label("inner")?
            .inc("ax")?
            .dec("dx")?
            .cmp("dx", 0)?
            .jg("inner")?
            .dec("cx")?;
        asm.label("outer")?
            .cmp("cx", 0)?
            .jle("done")?
            .mov("dx", "bx")?
            .jmp("inner")?;
        asm.label("done")?;
        Ok(())
    })
}

fn programs() -> Result<(Program, Program, Program), VMError> {
    Ok((tight_loop()?, sum_to()?, nested_multiply()?))
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let min = Duration::from_secs(1);

    let (tight, sum, multiply) = match programs() {
        Ok(programs) => programs,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    };

    info!("engine benchmarks, each runs for >= {}s", min.as_secs());
    println!(
        "  {:<26} {:>8}       {:>14} {:>16}  {:>10}",
        "benchmark", "iters", "avg time", "steps/run", "ns/step"
    );
    println!("  {}", "-".repeat(84));

    for &n in &[1_000i64, 100_000] {
        let name: &'static str = match n {
            1_000 => "tight_loop(1K)",
            _ => "tight_loop(100K)",
        };
        bench(name, min, || steps_for(&tight, &[("cx", n)])).print();
    }

    bench("sum_to(10K)", min, || steps_for(&sum, &[("cx", 10_000)])).print();

    bench("nested_multiply(300x300)", min, || {
        steps_for(&multiply, &[("bx", 300), ("cx", 300)])
    })
    .print();

    println!();
}
