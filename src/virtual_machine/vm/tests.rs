use super::*;
use crate::virtual_machine::assembler::{Assembler, assemble};

fn build<F>(body: F) -> Program
where
    F: FnOnce(&mut Assembler) -> Result<(), VMError>,
{
    assemble(body).expect("assembly failed")
}

fn run_program(program: &Program, initial: &[(&str, i64)]) -> Registers {
    run(program, initial).expect("vm run failed")
}

fn run_and_get(program: &Program, initial: &[(&str, i64)], reg: &str) -> i64 {
    run_program(program, initial).value(reg).unwrap()
}

/// Jumps to `taken` if `cond` holds after `cmp ax, bx`.
fn branch_taken(cond: Condition, ax: i64, bx: i64) -> bool {
    let program = build(|asm| {
        asm.cmp("ax", "bx")?;
        asm.emit_conditional_jump(cond, "taken")?;
        asm.mov("dx", 0)?.jmp("end")?;
        asm.label("taken")?.mov("dx", 1)?;
        asm.label("end")?;
        Ok(())
    });
    run_and_get(&program, &[("ax", ax), ("bx", bx)], "dx") == 1
}

// =========================
// Data movement
// =========================

#[test]
fn mov_immediate() {
    let program = build(|asm| {
        asm.mov("ax", 42)?;
        Ok(())
    });
    assert_eq!(run_program(&program, &[]).values(), [42, 0, 0, 0]);
}

#[test]
fn mov_register() {
    let program = build(|asm| {
        asm.mov("bx", "ax")?;
        Ok(())
    });
    assert_eq!(run_and_get(&program, &[("ax", -9)], "bx"), -9);
}

#[test]
fn register_operands_are_read_when_executed() {
    let program = build(|asm| {
        asm.mov("bx", "ax")?.mov("ax", 7)?.mov("cx", "ax")?;
        Ok(())
    });
    let regs = run_program(&program, &[("ax", 1)]);
    assert_eq!(regs.value("bx"), Some(1));
    assert_eq!(regs.value("cx"), Some(7));
}

// =========================
// Arithmetic
// =========================

#[test]
fn inc_default_step_is_one() {
    let implicit = build(|asm| {
        asm.inc("ax")?;
        Ok(())
    });
    let explicit = build(|asm| {
        asm.inc_by("ax", 1)?;
        Ok(())
    });
    assert_eq!(run_program(&implicit, &[("ax", 4)]), run_program(&explicit, &[("ax", 4)]));
    assert_eq!(run_and_get(&implicit, &[("ax", 4)], "ax"), 5);
}

#[test]
fn dec_default_step_is_one() {
    let implicit = build(|asm| {
        asm.dec("cx")?;
        Ok(())
    });
    let explicit = build(|asm| {
        asm.dec_by("cx", 1)?;
        Ok(())
    });
    assert_eq!(run_program(&implicit, &[]), run_program(&explicit, &[]));
    assert_eq!(run_and_get(&implicit, &[], "cx"), -1);
}

#[test]
fn inc_and_dec_by_register() {
    let program = build(|asm| {
        asm.inc_by("ax", "bx")?.dec_by("cx", "bx")?;
        Ok(())
    });
    let regs = run_program(&program, &[("ax", 10), ("bx", 3), ("cx", 10)]);
    assert_eq!(regs.values(), [13, 3, 7, 0]);
}

#[test]
fn inc_by_itself_reads_old_value() {
    let program = build(|asm| {
        asm.inc_by("ax", "ax")?;
        Ok(())
    });
    assert_eq!(run_and_get(&program, &[("ax", 21)], "ax"), 42);
}

#[test]
fn dec_by_itself_reaches_zero() {
    let program = build(|asm| {
        asm.dec_by("ax", "ax")?;
        Ok(())
    });
    assert_eq!(run_and_get(&program, &[("ax", 21)], "ax"), 0);
}

#[test]
fn arithmetic_wraps() {
    let program = build(|asm| {
        asm.inc("ax")?.dec("bx")?;
        Ok(())
    });
    let regs = run_program(&program, &[("ax", i64::MAX), ("bx", i64::MIN)]);
    assert_eq!(regs.value("ax"), Some(i64::MIN));
    assert_eq!(regs.value("bx"), Some(i64::MAX));
}

#[test]
fn straight_line_program_applies_each_instruction_once() {
    let program = build(|asm| {
        asm.mov("ax", 3)?
            .inc_by("bx", "ax")?
            .inc("bx")?
            .dec_by("cx", 10)?
            .mov("dx", "cx")?
            .cmp("dx", "ax")?
            .inc_by("ax", -5)?;
        Ok(())
    });

    let mut vm = VM::new(&program);
    vm.run().unwrap();
    assert_eq!(vm.registers().values(), [-2, 4, -10, -10]);
    assert_eq!(vm.stats().steps, program.len() as u64);
    assert_eq!(vm.stats().jumps_taken, 0);
    assert_eq!(vm.flag(), CmpFlag::Less);
}

// =========================
// Comparison
// =========================

#[test]
fn compare_sets_flag() {
    for (ax, expected) in [(1, CmpFlag::Less), (5, CmpFlag::Equal), (9, CmpFlag::Greater)] {
        let program = build(|asm| {
            asm.cmp("ax", 5)?;
            Ok(())
        });
        let mut vm = VM::with_registers(&program, &[("ax", ax)]).unwrap();
        vm.run().unwrap();
        assert_eq!(vm.flag(), expected, "ax = {ax}");
    }
}

#[test]
fn compare_is_idempotent() {
    let once = build(|asm| {
        asm.cmp("ax", "bx")?;
        Ok(())
    });
    let twice = build(|asm| {
        asm.cmp("ax", "bx")?.cmp("ax", "bx")?;
        Ok(())
    });
    for (ax, bx) in [(3, 5), (5, 5), (7, 5)] {
        let mut a = VM::with_registers(&once, &[("ax", ax), ("bx", bx)]).unwrap();
        let mut b = VM::with_registers(&twice, &[("ax", ax), ("bx", bx)]).unwrap();
        a.run().unwrap();
        b.run().unwrap();
        assert_eq!(a.flag(), b.flag());
        assert_eq!(a.registers(), b.registers());
    }
}

#[test]
fn compare_extremes_does_not_overflow() {
    let program = build(|asm| {
        asm.cmp("ax", "bx")?;
        Ok(())
    });
    let mut vm = VM::with_registers(&program, &[("ax", i64::MIN), ("bx", i64::MAX)]).unwrap();
    vm.run().unwrap();
    assert_eq!(vm.flag(), CmpFlag::Less);
}

#[test]
fn flag_starts_equal() {
    let program = build(|asm| {
        asm.je("end")?.mov("ax", 1)?.label("end")?;
        Ok(())
    });
    assert_eq!(run_and_get(&program, &[], "ax"), 0);

    let program = build(|asm| {
        asm.jne("end")?.mov("ax", 1)?.label("end")?;
        Ok(())
    });
    assert_eq!(run_and_get(&program, &[], "ax"), 1);
}

#[test]
fn flag_survives_unrelated_instructions() {
    let program = build(|asm| {
        asm.cmp("ax", 10)?
            .mov("ax", 99)?
            .inc("bx")?
            .jl("less")?
            .mov("cx", 1)?
            .jmp("end")?
            .label("less")?
            .mov("cx", 2)?
            .label("end")?;
        Ok(())
    });
    assert_eq!(run_and_get(&program, &[("ax", 1)], "cx"), 2);
}

// =========================
// Control flow
// =========================

#[test]
fn conditional_jump_after_less() {
    assert!(branch_taken(Condition::Less, 3, 5));
    assert!(!branch_taken(Condition::Greater, 3, 5));
}

#[test]
fn conditional_jump_table() {
    let cases = [
        (Condition::Equal, [false, true, false]),
        (Condition::NotEqual, [true, false, true]),
        (Condition::Less, [true, false, false]),
        (Condition::LessOrEqual, [true, true, false]),
        (Condition::Greater, [false, false, true]),
        (Condition::GreaterOrEqual, [false, true, true]),
    ];
    for (cond, expected) in cases {
        let actual = [
            branch_taken(cond, 3, 5),
            branch_taken(cond, 5, 5),
            branch_taken(cond, 7, 5),
        ];
        assert_eq!(actual, expected, "{cond}");
    }
}

#[test]
fn unconditional_jump_skips() {
    let program = build(|asm| {
        asm.jmp("skip")?.mov("ax", 1)?.label("skip")?.mov("bx", 2)?;
        Ok(())
    });
    assert_eq!(run_program(&program, &[]).values(), [0, 2, 0, 0]);
}

#[test]
fn forward_and_backward_references_agree() {
    let forward = build(|asm| {
        asm.jmp("body")?;
        asm.label("exit")?.jmp(usize::MAX)?;
        asm.label("body")?.inc("ax")?.cmp("ax", 3)?.jl("body")?.jmp("exit")?;
        Ok(())
    });

    let mut asm = Assembler::standard();
    asm.jmp(2usize).unwrap();
    asm.label("exit").unwrap().jmp(usize::MAX).unwrap();
    asm.label("body").unwrap();
    asm.inc("ax").unwrap().cmp("ax", 3).unwrap().jl("body").unwrap();
    asm.jmp(1usize).unwrap();
    let positional = asm.finalize().unwrap();

    assert_eq!(run_program(&forward, &[]), run_program(&positional, &[]));
    assert_eq!(run_and_get(&forward, &[], "ax"), 3);
}

#[test]
fn jump_emitted_before_label_resolves_like_jump_after() {
    let before = build(|asm| {
        asm.mov("cx", 2)?;
        asm.jmp("target")?;
        asm.inc("bx")?;
        asm.label("target")?.inc("ax")?;
        Ok(())
    });
    let after = build(|asm| {
        asm.mov("cx", 2)?;
        asm.jmp(3usize)?;
        asm.inc("bx")?;
        asm.label("target")?.inc("ax")?;
        Ok(())
    });
    assert_eq!(before.label("target"), Some(3));
    assert_eq!(run_program(&before, &[]), run_program(&after, &[]));
}

#[test]
fn jump_past_end_halts() {
    let program = build(|asm| {
        asm.jmp(100usize)?.mov("ax", 1)?;
        Ok(())
    });
    let mut vm = VM::new(&program);
    assert_eq!(vm.step().unwrap(), Status::Halted);
    assert_eq!(vm.ip(), 100);
    assert_eq!(vm.registers().value("ax"), Some(0));
}

#[test]
fn jump_to_trailing_label_halts() {
    let program = build(|asm| {
        asm.jmp("end")?.mov("ax", 1)?.label("end")?;
        Ok(())
    });
    assert_eq!(program.label("end"), Some(program.len()));
    assert_eq!(run_and_get(&program, &[], "ax"), 0);
}

#[test]
fn countdown_loop_runs_exactly_three_times() {
    let program = build(|asm| {
        asm.label("start")?.dec("cx")?.cmp("cx", 0)?.jg("start")?;
        Ok(())
    });
    let mut vm = VM::with_registers(&program, &[("cx", 3)]).unwrap();
    vm.run().unwrap();
    assert_eq!(vm.registers().value("cx"), Some(0));
    assert_eq!(vm.stats().steps, 9);
    assert_eq!(vm.stats().compares, 3);
    assert_eq!(vm.stats().jumps_taken, 2);
}

#[test]
fn end_to_end_counting_loop() {
    let program = build(|asm| {
        asm.mov("cx", 5)?
            .label("loop")?
            .inc("ax")?
            .dec("cx")?
            .cmp("cx", 0)?
            .jg("loop")?;
        Ok(())
    });
    let regs = run_program(&program, &[]);
    assert_eq!(regs.values(), [5, 0, 0, 0]);
    assert_eq!(regs.to_string(), "{ax: 5, bx: 0, cx: 0, dx: 0}");
}

#[test]
fn multiply_by_repeated_addition() {
    let program = build(|asm| {
        asm.mov("ax", 0)?
            .cmp("cx", 0)?
            .jle("done")?
            .label("loop")?
            .inc_by("ax", "bx")?
            .dec("cx")?
            .cmp("cx", 0)?
            .jne("loop")?
            .label("done")?;
        Ok(())
    });
    assert_eq!(run_and_get(&program, &[("bx", 6), ("cx", 7)], "ax"), 42);
    assert_eq!(run_and_get(&program, &[("bx", 6), ("cx", 0)], "ax"), 0);
}

#[test]
fn runs_are_deterministic_and_repeatable() {
    let program = build(|asm| {
        asm.label("l")?.inc_by("ax", "cx")?.dec("cx")?.cmp("cx", 0)?.jg("l")?;
        Ok(())
    });
    let first = run_program(&program, &[("cx", 10)]);
    let second = run_program(&program, &[("cx", 10)]);
    assert_eq!(first, second);
    assert_eq!(first.value("ax"), Some(55));
}

// =========================
// Engine state machine
// =========================

#[test]
fn empty_program_halts_immediately() {
    let program = build(|_| Ok(()));
    let mut vm = VM::new(&program);
    assert_eq!(vm.status(), Status::Halted);
    assert_eq!(vm.step().unwrap(), Status::Halted);
    vm.run().unwrap();
    assert_eq!(vm.stats().steps, 0);
}

#[test]
fn stepping_reports_status() {
    let program = build(|asm| {
        asm.inc("ax")?.inc("ax")?;
        Ok(())
    });
    let mut vm = VM::new(&program);
    assert_eq!(vm.status(), Status::Running);
    assert_eq!(vm.step().unwrap(), Status::Running);
    assert_eq!(vm.ip(), 1);
    assert_eq!(vm.step().unwrap(), Status::Halted);
    assert_eq!(vm.step().unwrap(), Status::Halted);
    assert_eq!(vm.registers().value("ax"), Some(2));
    assert_eq!(vm.stats().steps, 2);
}

#[test]
fn unknown_initial_register_is_rejected() {
    let program = build(|asm| {
        asm.inc("ax")?;
        Ok(())
    });
    assert_eq!(
        run(&program, &[("ex", 1)]).unwrap_err(),
        VMError::UnknownRegister {
            name: "ex".to_string()
        }
    );
}

#[test]
fn custom_register_set() {
    let mut asm = Assembler::new(&["acc", "n"]).unwrap();
    asm.label("l").unwrap();
    asm.inc_by("acc", 2).unwrap().dec("n").unwrap();
    asm.cmp("n", 0).unwrap().jg("l").unwrap();
    let program = asm.finalize().unwrap();
    let regs = run(&program, &[("n", 4)]).unwrap();
    assert_eq!(regs.names(), ["acc", "n"]);
    assert_eq!(regs.values(), [8, 0]);
}

// =========================
// Step budget
// =========================

#[test]
fn step_limit_stops_infinite_loop() {
    let program = build(|asm| {
        asm.label("spin")?.inc("ax")?.jmp("spin")?;
        Ok(())
    });
    let mut vm = VM::new(&program);
    assert_eq!(
        vm.run_with_limit(100).unwrap_err(),
        VMError::StepLimitExceeded { limit: 100 }
    );
    assert_eq!(vm.stats().steps, 100);
    assert_eq!(vm.registers().value("ax"), Some(50));
    assert_eq!(vm.status(), Status::Running);
}

#[test]
fn self_jump_is_not_detected() {
    let program = build(|asm| {
        asm.label("here")?.jmp("here")?;
        Ok(())
    });
    let mut vm = VM::new(&program);
    assert!(vm.run_with_limit(1_000).is_err());
    assert_eq!(vm.ip(), 0);
    assert_eq!(vm.stats().jumps_taken, 1_000);
}

#[test]
fn step_limit_allows_exact_budget() {
    let program = build(|asm| {
        asm.inc("ax")?.inc("ax")?.inc("ax")?;
        Ok(())
    });
    let mut vm = VM::new(&program);
    vm.run_with_limit(3).unwrap();
    assert_eq!(vm.status(), Status::Halted);

    let mut vm = VM::new(&program);
    assert!(vm.run_with_limit(2).is_err());
    vm.run_with_limit(1).unwrap();
    assert_eq!(vm.registers().value("ax"), Some(3));
}
