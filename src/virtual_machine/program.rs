//! Finished programs.
//!
//! A [`Program`] is what [`Assembler::finalize`](super::assembler::Assembler::finalize)
//! produces: the instruction list, the complete label table and the register
//! names the instructions were checked against. It cannot be modified.

use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::isa::{Instruction, Reg};
use crate::virtual_machine::operand::{Operand, Target};
use std::collections::HashMap;
use std::fmt;

/// Frozen instruction sequence with its label table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Register names, in declaration order.
    registers: Vec<String>,
    /// Instructions indexed `0..len`.
    instructions: Vec<Instruction>,
    /// Label name to instruction index.
    labels: HashMap<String, usize>,
}

impl Program {
    pub(super) fn new(
        registers: Vec<String>,
        instructions: Vec<Instruction>,
        labels: HashMap<String, usize>,
    ) -> Self {
        Self {
            registers,
            instructions,
            labels,
        }
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// All instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the instruction at `ip`, or `None` once `ip` leaves the program.
    #[inline(always)]
    pub fn get(&self, ip: usize) -> Option<&Instruction> {
        self.instructions.get(ip)
    }

    /// Register names the program was built for.
    pub fn register_names(&self) -> &[String] {
        &self.registers
    }

    /// Returns the instruction index bound to `name`.
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Labels sorted by position, then name.
    pub fn labels(&self) -> Vec<(&str, usize)> {
        let mut labels: Vec<_> = self
            .labels
            .iter()
            .map(|(name, &ip)| (name.as_str(), ip))
            .collect();
        labels.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(b.0)));
        labels
    }

    /// Resolves a jump target to an instruction index.
    ///
    /// Labels are checked by `finalize`, so [`VMError::UndefinedLabel`] only
    /// surfaces for targets that did not come from this program.
    #[inline]
    pub fn resolve_target(&self, target: &Target) -> Result<usize, VMError> {
        match target {
            Target::Position(ip) => Ok(*ip),
            Target::Label(label) => self.label(label).ok_or_else(|| VMError::UndefinedLabel {
                label: label.clone(),
            }),
        }
    }

    fn reg_name(&self, reg: Reg) -> &str {
        self.registers
            .get(reg.index())
            .map(String::as_str)
            .unwrap_or("?")
    }

    fn write_operand(&self, f: &mut fmt::Formatter<'_>, operand: &Operand) -> fmt::Result {
        match operand {
            Operand::Imm(value) => write!(f, "{value}"),
            Operand::Reg(reg) => f.write_str(self.reg_name(*reg)),
        }
    }

    fn write_instruction(&self, f: &mut fmt::Formatter<'_>, instr: &Instruction) -> fmt::Result {
        write!(f, "{}", instr.mnemonic())?;
        match instr {
            Instruction::Mov { dst, src: rhs } | Instruction::Cmp { reg: dst, rhs } => {
                write!(f, " {}, ", self.reg_name(*dst))?;
                self.write_operand(f, rhs)
            }
            Instruction::Inc { dst, step } | Instruction::Dec { dst, step } => {
                write!(f, " {}", self.reg_name(*dst))?;
                match step {
                    Some(step) => {
                        f.write_str(", ")?;
                        self.write_operand(f, step)
                    }
                    None => Ok(()),
                }
            }
            Instruction::Jmp { target } | Instruction::Jcc { target, .. } => {
                write!(f, " {target}")
            }
        }
    }
}

/// Numbered listing with labels on their own lines.
///
/// ```text
///    0  mov cx, 5
/// loop:
///    1  inc ax
/// ```
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels = self.labels();
        let mut pending = labels.iter().peekable();

        // A label declared after the last instruction sits at `len`.
        for ip in 0..=self.instructions.len() {
            while let Some((name, _)) = pending.next_if(|(_, at)| *at == ip) {
                writeln!(f, "{name}:")?;
            }
            if let Some(instr) = self.instructions.get(ip) {
                write!(f, "{ip:>4}  ")?;
                self.write_instruction(f, instr)?;
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
