//! Instruction operands and their resolution.
//!
//! Callers hand the assembler an [`Arg`]: a register name or an integer.
//! The assembler checks the name and stores an [`Operand`], which holds a
//! register index instead of the name. Values are read from the register file
//! only when the instruction runs, never when it is built.

use crate::virtual_machine::isa::Reg;
use crate::virtual_machine::vm::Registers;
use std::fmt;

/// Source value of an instruction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Operand {
    /// Immediate integer.
    Imm(i64),
    /// Current contents of a register.
    Reg(Reg),
}

impl Operand {
    /// Returns the register this operand reads, if any.
    pub const fn register(&self) -> Option<Reg> {
        match self {
            Operand::Reg(reg) => Some(*reg),
            Operand::Imm(_) => None,
        }
    }

    /// Returns a human-readable kind name for listings and diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Operand::Imm(_) => "Integer",
            Operand::Reg(_) => "Register",
        }
    }
}

/// Resolves `operand` against the register file as it is right now.
///
/// Literals resolve to themselves. Registers resolve to their stored value at
/// the time of the call, so an instruction that reads the register it is about
/// to write sees the old value.
#[inline(always)]
pub fn resolve(operand: &Operand, registers: &Registers) -> i64 {
    match operand {
        Operand::Imm(value) => *value,
        Operand::Reg(reg) => registers.get(*reg),
    }
}

/// Operand as written by the caller of the assembler.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Arg<'a> {
    Imm(i64),
    Reg(&'a str),
}

impl From<i64> for Arg<'_> {
    fn from(value: i64) -> Self {
        Arg::Imm(value)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(name: &'a str) -> Self {
        Arg::Reg(name)
    }
}

impl<'a> From<&'a String> for Arg<'a> {
    fn from(name: &'a String) -> Self {
        Arg::Reg(name.as_str())
    }
}

/// Destination of a jump.
///
/// Label names stay unresolved inside the instruction. The engine looks them
/// up in the finished program's label table when the jump executes, which is
/// what lets a jump name a label declared further down.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Target {
    Label(String),
    /// Absolute instruction index. Positions past the end halt the program.
    Position(usize),
}

impl From<&str> for Target {
    fn from(label: &str) -> Self {
        Target::Label(label.to_string())
    }
}

impl From<String> for Target {
    fn from(label: String) -> Self {
        Target::Label(label)
    }
}

impl From<usize> for Target {
    fn from(position: usize) -> Self {
        Target::Position(position)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Label(label) => f.write_str(label),
            Target::Position(position) => write!(f, "{position}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registers() -> Registers {
        let mut regs = Registers::new(&["ax".to_string(), "bx".to_string()]);
        regs.set(Reg(1), 42);
        regs
    }

    #[test]
    fn literal_resolves_to_itself() {
        let regs = registers();
        assert_eq!(resolve(&Operand::Imm(-7), &regs), -7);
        assert_eq!(resolve(&Operand::Imm(i64::MAX), &regs), i64::MAX);
    }

    #[test]
    fn register_resolves_to_current_value() {
        let mut regs = registers();
        let operand = Operand::Reg(Reg(1));
        assert_eq!(resolve(&operand, &regs), 42);
        regs.set(Reg(1), 43);
        assert_eq!(resolve(&operand, &regs), 43);
        assert_eq!(resolve(&Operand::Reg(Reg(0)), &regs), 0);
    }

    #[test]
    fn operand_register() {
        assert_eq!(Operand::Reg(Reg(3)).register(), Some(Reg(3)));
        assert_eq!(Operand::Imm(3).register(), None);
        assert_eq!(Operand::Imm(3).kind(), "Integer");
        assert_eq!(Operand::Reg(Reg(3)).kind(), "Register");
    }

    #[test]
    fn arg_conversions() {
        assert_eq!(Arg::from(5), Arg::Imm(5));
        assert_eq!(Arg::from(-5i64), Arg::Imm(-5));
        assert_eq!(Arg::from("cx"), Arg::Reg("cx"));
        let name = String::from("dx");
        assert_eq!(Arg::from(&name), Arg::Reg("dx"));
    }

    #[test]
    fn target_conversions() {
        assert_eq!(Target::from("loop"), Target::Label("loop".to_string()));
        assert_eq!(Target::from(3usize), Target::Position(3));
        assert_eq!(Target::from(3usize).to_string(), "3");
        assert_eq!(Target::from("loop").to_string(), "loop");
    }
}
