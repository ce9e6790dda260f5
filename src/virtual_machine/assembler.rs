//! Program builder.
//!
//! An [`Assembler`] collects instructions and labels as the caller issues
//! them. Nothing runs while building. [`Assembler::finalize`] checks that every
//! jump names a declared label and freezes the result into a [`Program`],
//! which is the only thing the engine accepts.
//!
//! # Example
//!
//! ```
//! use asm_unit::virtual_machine::{self, assembler::Assembler};
//!
//! let mut asm = Assembler::standard();
//! asm.mov("cx", 5)?
//!     .label("loop")?
//!     .inc("ax")?
//!     .dec("cx")?
//!     .cmp("cx", 0)?
//!     .jg("loop")?;
//! let program = asm.finalize()?;
//!
//! let registers = virtual_machine::run(&program, &[])?;
//! assert_eq!(registers.values(), [5, 0, 0, 0]);
//! # Ok::<(), asm_unit::virtual_machine::errors::VMError>(())
//! ```
//!
//! Every call validates its operands before appending, so a rejected call
//! leaves the assembler exactly as it was.

use crate::for_each_condition;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::isa::{Condition, Instruction, Reg};
use crate::virtual_machine::operand::{Arg, Operand, Target};
use crate::virtual_machine::program::Program;
use std::collections::{HashMap, HashSet};

/// Register names of the conventional four-register unit.
pub const DEFAULT_REGISTERS: [&str; 4] = ["ax", "bx", "cx", "dx"];

/// Largest register file an instruction can address.
pub const MAX_REGISTERS: usize = u8::MAX as usize + 1;

/// Accumulates instructions and labels for one program.
#[derive(Debug, Clone)]
pub struct Assembler {
    /// Declared register names, in declaration order.
    registers: Vec<String>,
    /// Instructions emitted so far.
    instructions: Vec<Instruction>,
    /// Label name to the index of the next instruction at declaration time.
    labels: HashMap<String, usize>,
}

impl Assembler {
    /// Creates an assembler for a unit with the given register names.
    pub fn new<S: AsRef<str>>(registers: &[S]) -> Result<Self, VMError> {
        if registers.is_empty() {
            return Err(VMError::NoRegisters);
        }
        if registers.len() > MAX_REGISTERS {
            return Err(VMError::TooManyRegisters {
                count: registers.len(),
                max: MAX_REGISTERS,
            });
        }

        let mut seen = HashSet::with_capacity(registers.len());
        for name in registers {
            let name = name.as_ref();
            if !seen.insert(name) {
                return Err(VMError::DuplicateRegister {
                    name: name.to_string(),
                });
            }
        }

        Ok(Self {
            registers: registers.iter().map(|n| n.as_ref().to_string()).collect(),
            instructions: Vec::new(),
            labels: HashMap::new(),
        })
    }

    /// Creates an assembler for the `ax`, `bx`, `cx`, `dx` unit.
    pub fn standard() -> Self {
        Self {
            registers: DEFAULT_REGISTERS.iter().map(|n| n.to_string()).collect(),
            instructions: Vec::new(),
            labels: HashMap::new(),
        }
    }

    /// Number of instructions emitted so far.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if no instruction has been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Declared register names.
    pub fn registers(&self) -> &[String] {
        &self.registers
    }

    fn reg(&self, name: &str) -> Result<Reg, VMError> {
        self.registers
            .iter()
            .position(|n| n == name)
            .map(|i| Reg(i as u8))
            .ok_or_else(|| VMError::UnknownRegister {
                name: name.to_string(),
            })
    }

    fn operand(&self, arg: Arg<'_>) -> Result<Operand, VMError> {
        Ok(match arg {
            Arg::Imm(value) => Operand::Imm(value),
            Arg::Reg(name) => Operand::Reg(self.reg(name)?),
        })
    }

    /// Appends an already-built instruction and returns the new program length.
    ///
    /// Fails with [`VMError::UnknownRegister`] if the instruction refers to a
    /// register index this unit does not have.
    pub fn emit(&mut self, instruction: Instruction) -> Result<usize, VMError> {
        if let Some(reg) = instruction
            .registers()
            .find(|reg| reg.index() >= self.registers.len())
        {
            return Err(VMError::UnknownRegister {
                name: format!("#{}", reg.index()),
            });
        }
        self.instructions.push(instruction);
        Ok(self.instructions.len())
    }

    /// Emits `mov dst, src`.
    pub fn emit_mov<'a>(&mut self, dst: &str, src: impl Into<Arg<'a>>) -> Result<usize, VMError> {
        let dst = self.reg(dst)?;
        let src = self.operand(src.into())?;
        self.emit(Instruction::Mov { dst, src })
    }

    /// Emits `inc dst` or `inc dst, step`.
    pub fn emit_inc(&mut self, dst: &str, step: Option<Arg<'_>>) -> Result<usize, VMError> {
        let dst = self.reg(dst)?;
        let step = step.map(|arg| self.operand(arg)).transpose()?;
        self.emit(Instruction::Inc { dst, step })
    }

    /// Emits `dec dst` or `dec dst, step`.
    pub fn emit_dec(&mut self, dst: &str, step: Option<Arg<'_>>) -> Result<usize, VMError> {
        let dst = self.reg(dst)?;
        let step = step.map(|arg| self.operand(arg)).transpose()?;
        self.emit(Instruction::Dec { dst, step })
    }

    /// Emits `cmp reg, rhs`.
    pub fn emit_cmp<'a>(&mut self, reg: &str, rhs: impl Into<Arg<'a>>) -> Result<usize, VMError> {
        let reg = self.reg(reg)?;
        let rhs = self.operand(rhs.into())?;
        self.emit(Instruction::Cmp { reg, rhs })
    }

    /// Emits `jmp target`. Label targets may be declared later.
    pub fn emit_jmp(&mut self, target: impl Into<Target>) -> Result<usize, VMError> {
        self.emit(Instruction::Jmp {
            target: target.into(),
        })
    }

    /// Emits a jump taken only when `cond` holds for the comparison flag.
    pub fn emit_conditional_jump(
        &mut self,
        cond: Condition,
        target: impl Into<Target>,
    ) -> Result<usize, VMError> {
        self.emit(Instruction::Jcc {
            cond,
            target: target.into(),
        })
    }

    /// Binds `name` to the position of the next emitted instruction.
    pub fn declare_label(&mut self, name: &str) -> Result<(), VMError> {
        if self.labels.contains_key(name) {
            return Err(VMError::DuplicateLabel {
                label: name.to_string(),
            });
        }
        self.labels.insert(name.to_string(), self.instructions.len());
        Ok(())
    }

    /// Chaining form of [`Assembler::emit_mov`].
    pub fn mov<'a>(&mut self, dst: &str, src: impl Into<Arg<'a>>) -> Result<&mut Self, VMError> {
        self.emit_mov(dst, src)?;
        Ok(self)
    }

    /// Chaining form of [`Assembler::emit_inc`] with the default step.
    pub fn inc(&mut self, dst: &str) -> Result<&mut Self, VMError> {
        self.emit_inc(dst, None)?;
        Ok(self)
    }

    /// Chaining form of [`Assembler::emit_inc`] with an explicit step.
    pub fn inc_by<'a>(&mut self, dst: &str, step: impl Into<Arg<'a>>) -> Result<&mut Self, VMError> {
        self.emit_inc(dst, Some(step.into()))?;
        Ok(self)
    }

    /// Chaining form of [`Assembler::emit_dec`] with the default step.
    pub fn dec(&mut self, dst: &str) -> Result<&mut Self, VMError> {
        self.emit_dec(dst, None)?;
        Ok(self)
    }

    /// Chaining form of [`Assembler::emit_dec`] with an explicit step.
    pub fn dec_by<'a>(&mut self, dst: &str, step: impl Into<Arg<'a>>) -> Result<&mut Self, VMError> {
        self.emit_dec(dst, Some(step.into()))?;
        Ok(self)
    }

    /// Chaining form of [`Assembler::emit_cmp`].
    pub fn cmp<'a>(&mut self, reg: &str, rhs: impl Into<Arg<'a>>) -> Result<&mut Self, VMError> {
        self.emit_cmp(reg, rhs)?;
        Ok(self)
    }

    /// Chaining form of [`Assembler::emit_jmp`].
    pub fn jmp(&mut self, target: impl Into<Target>) -> Result<&mut Self, VMError> {
        self.emit_jmp(target)?;
        Ok(self)
    }

    /// Chaining form of [`Assembler::declare_label`].
    pub fn label(&mut self, name: &str) -> Result<&mut Self, VMError> {
        self.declare_label(name)?;
        Ok(self)
    }

    /// Ends the build phase.
    ///
    /// Fails with [`VMError::UndefinedLabel`] for the first jump, in program
    /// order, whose label was never declared.
    pub fn finalize(self) -> Result<Program, VMError> {
        for instruction in &self.instructions {
            match instruction.target() {
                Some(Target::Label(label)) if !self.labels.contains_key(label) => {
                    return Err(VMError::UndefinedLabel {
                        label: label.clone(),
                    });
                }
                _ => {}
            }
        }
        Ok(Program::new(self.registers, self.instructions, self.labels))
    }
}

macro_rules! define_jump_shorthands {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $method:ident, $mnemonic:literal => [ $( $flag:ident )|+ ]
        ),* $(,)?
    ) => {
        impl Assembler {
            $(
                #[doc = concat!("Chaining form of `", $mnemonic, " target`.")]
                pub fn $method(&mut self, target: impl Into<Target>) -> Result<&mut Self, VMError> {
                    self.emit_conditional_jump(Condition::$name, target)?;
                    Ok(self)
                }
            )*
        }
    };
}

for_each_condition!(define_jump_shorthands);

/// Builds a program for the standard `ax`..`dx` unit inside a closure.
pub fn assemble<F>(build: F) -> Result<Program, VMError>
where
    F: FnOnce(&mut Assembler) -> Result<(), VMError>,
{
    let mut asm = Assembler::standard();
    build(&mut asm)?;
    asm.finalize()
}
