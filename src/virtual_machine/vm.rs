//! Execution engine.
//!
//! A [`VM`] drives an instruction pointer through a finished [`Program`]. Each
//! step fetches the instruction at the pointer and applies it. A jump sets the
//! pointer to its target; every other instruction advances it by one. The run
//! halts the first time the pointer leaves `0..len`.
//!
//! [`VM::run`] has no step limit, so a program that loops forever never
//! returns. Use [`VM::run_with_limit`] to bound it.

use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::isa::{CmpFlag, Condition, Instruction, Reg};
use crate::virtual_machine::operand::{Operand, Target, resolve};
use crate::virtual_machine::program::Program;
use crate::warn;

mod budget;
mod registers;
#[cfg(test)]
mod tests;

pub use budget::{DEFAULT_STEP_LIMIT, ExecStats};
pub use registers::Registers;

/// Engine state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    /// The instruction pointer is inside the program.
    Running,
    /// The instruction pointer has left the program. Terminal.
    Halted,
}

/// Runs one program over its own register file.
pub struct VM<'p> {
    /// Program being executed.
    program: &'p Program,
    /// Index of the next instruction.
    ip: usize,
    /// Register file.
    registers: Registers,
    /// Outcome of the last `cmp`.
    flag: CmpFlag,
    /// Counters for the current run.
    stats: ExecStats,
}

impl<'p> VM<'p> {
    /// Creates an engine with every register at zero.
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            ip: 0,
            registers: Registers::new(program.register_names()),
            flag: CmpFlag::default(),
            stats: ExecStats::new(),
        }
    }

    /// Creates an engine with some registers preset.
    ///
    /// Registers not listed start at zero. Returns [`VMError::UnknownRegister`]
    /// if a name is not declared by the program.
    pub fn with_registers(program: &'p Program, initial: &[(&str, i64)]) -> Result<Self, VMError> {
        let mut vm = Self::new(program);
        for &(name, value) in initial {
            let reg = vm
                .registers
                .index_of(name)
                .ok_or_else(|| VMError::UnknownRegister {
                    name: name.to_string(),
                })?;
            vm.registers.set(reg, value);
        }
        Ok(vm)
    }

    /// Returns the program being executed.
    pub fn program(&self) -> &'p Program {
        self.program
    }

    /// Returns the index of the next instruction.
    pub fn ip(&self) -> usize {
        self.ip
    }

    /// Returns the current comparison flag.
    pub fn flag(&self) -> CmpFlag {
        self.flag
    }

    /// Returns the register file.
    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Consumes the engine and returns its register file.
    pub fn into_registers(self) -> Registers {
        self.registers
    }

    /// Returns the counters accumulated so far.
    pub fn stats(&self) -> ExecStats {
        self.stats
    }

    /// Returns whether another step would execute an instruction.
    pub fn status(&self) -> Status {
        if self.ip < self.program.len() {
            Status::Running
        } else {
            Status::Halted
        }
    }

    /// Executes the instruction at the pointer.
    ///
    /// Returns the status after the step. Stepping a halted engine does nothing.
    pub fn step(&mut self) -> Result<Status, VMError> {
        let program = self.program;
        let Some(instruction) = program.get(self.ip) else {
            return Ok(Status::Halted);
        };
        let jump = self.exec(instruction)?;
        self.stats.record(instruction, jump.is_some());
        self.ip = match jump {
            Some(target) => target,
            None => self.ip + 1,
        };
        Ok(self.status())
    }

    /// Runs until the pointer leaves the program.
    pub fn run(&mut self) -> Result<(), VMError> {
        while self.step()? == Status::Running {}
        Ok(())
    }

    /// Runs until the pointer leaves the program or `limit` more instructions
    /// have executed, whichever comes first.
    ///
    /// Returns [`VMError::StepLimitExceeded`] if the program is still running
    /// once the budget is spent. The engine keeps its state, so the caller may
    /// inspect it or continue.
    pub fn run_with_limit(&mut self, limit: u64) -> Result<(), VMError> {
        let start = self.stats.steps;
        while self.status() == Status::Running {
            if self.stats.steps - start >= limit {
                warn!(
                    "step limit of {} reached at ip {} (registers {})",
                    limit, self.ip, self.registers
                );
                return Err(VMError::StepLimitExceeded { limit });
            }
            self.step()?;
        }
        Ok(())
    }

    /// Applies one instruction. Returns the jump destination if the pointer
    /// must move somewhere other than the next instruction.
    fn exec(&mut self, instruction: &Instruction) -> Result<Option<usize>, VMError> {
        Ok(match instruction {
            Instruction::Mov { dst, src } => {
                self.op_mov(*dst, src);
                None
            }
            Instruction::Inc { dst, step } => {
                self.op_inc(*dst, step.as_ref());
                None
            }
            Instruction::Dec { dst, step } => {
                self.op_dec(*dst, step.as_ref());
                None
            }
            Instruction::Cmp { reg, rhs } => {
                self.op_cmp(*reg, rhs);
                None
            }
            Instruction::Jmp { target } => Some(self.op_jmp(target)?),
            Instruction::Jcc { cond, target } => self.op_jcc(*cond, target)?,
        })
    }

    /// Resolves an optional step operand, one when absent.
    fn step_value(&self, step: Option<&Operand>) -> i64 {
        step.map_or(1, |operand| resolve(operand, &self.registers))
    }

    fn op_mov(&mut self, dst: Reg, src: &Operand) {
        let value = resolve(src, &self.registers);
        self.registers.set(dst, value);
    }

    fn op_inc(&mut self, dst: Reg, step: Option<&Operand>) {
        let step = self.step_value(step);
        let value = self.registers.get(dst).wrapping_add(step);
        self.registers.set(dst, value);
    }

    fn op_dec(&mut self, dst: Reg, step: Option<&Operand>) {
        let step = self.step_value(step);
        let value = self.registers.get(dst).wrapping_sub(step);
        self.registers.set(dst, value);
    }

    fn op_cmp(&mut self, reg: Reg, rhs: &Operand) {
        let lhs = self.registers.get(reg);
        let rhs = resolve(rhs, &self.registers);
        self.flag = lhs.cmp(&rhs).into();
    }

    fn op_jmp(&self, target: &Target) -> Result<usize, VMError> {
        self.program.resolve_target(target)
    }

    fn op_jcc(&self, cond: Condition, target: &Target) -> Result<Option<usize>, VMError> {
        if cond.holds(self.flag) {
            self.op_jmp(target).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Runs `program` to completion and returns the final register file.
///
/// `initial` presets registers by name; all others start at zero. The result
/// depends only on the program and the initial values.
pub fn run(program: &Program, initial: &[(&str, i64)]) -> Result<Registers, VMError> {
    let mut vm = VM::with_registers(program, initial)?;
    vm.run()?;
    Ok(vm.into_registers())
}
