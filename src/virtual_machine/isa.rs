//! Instruction set definitions.
//!
//! The instruction set is closed: [`Instruction`] has exactly one variant per
//! operation kind. The six conditional jumps are listed once in
//! [`for_each_condition!`](crate::for_each_condition), which hands the list to
//! a callback macro. This module generates [`Condition`] from it; the
//! [`assembler`](super::assembler) generates its `je`..`jge` shorthands from
//! the same list.
//!
//! # Operations
//!
//! | mnemonic | effect |
//! |----------|--------|
//! | `mov d, s` | `d = s` |
//! | `inc d [, s]` | `d = d + s` (`s` defaults to 1) |
//! | `dec d [, s]` | `d = d - s` (`s` defaults to 1) |
//! | `cmp r, s` | flag = ordering of `r` against `s` |
//! | `jmp t` | continue at `t` |
//! | `je`/`jne`/`jl`/`jle`/`jg`/`jge t` | continue at `t` if the flag satisfies the condition |

use crate::virtual_machine::operand::{Operand, Target};
use std::cmp::Ordering;
use std::fmt;

/// Invokes a callback macro with the complete conditional jump list.
///
/// Each entry is `Name = method, "mnemonic" => [Flag | Flag ...]`, where the
/// bracketed flags are the comparison outcomes for which the jump is taken.
#[macro_export]
macro_rules! for_each_condition {
    ($callback:ident) => {
        $callback! {
            /// je target ; jump if the last comparison found both sides equal
            Equal = je, "je" => [Equal],
            /// jne target ; jump if the last comparison found the sides different
            NotEqual = jne, "jne" => [Less | Greater],
            /// jl target ; jump if the register was less than the operand
            Less = jl, "jl" => [Less],
            /// jle target ; jump if the register was less than or equal to the operand
            LessOrEqual = jle, "jle" => [Less | Equal],
            /// jg target ; jump if the register was greater than the operand
            Greater = jg, "jg" => [Greater],
            /// jge target ; jump if the register was greater than or equal to the operand
            GreaterOrEqual = jge, "jge" => [Greater | Equal],
        }
    };
}

macro_rules! define_conditions {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $method:ident, $mnemonic:literal => [ $( $flag:ident )|+ ]
        ),* $(,)?
    ) => {
        /// Comparator consulted by a conditional jump.
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Condition {
            $(
                $(#[$doc])*
                $name,
            )*
        }

        impl Condition {
            /// Every condition in catalogue order.
            pub const ALL: &'static [Condition] = &[ $( Condition::$name, )* ];

            /// Returns the assembly mnemonic for this condition.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Condition::$name => $mnemonic, )*
                }
            }

            /// Looks a condition up by its mnemonic.
            pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
                match mnemonic {
                    $( $mnemonic => Some(Condition::$name), )*
                    _ => None,
                }
            }

            /// Returns true if a jump guarded by this condition is taken under `flag`.
            pub const fn holds(&self, flag: CmpFlag) -> bool {
                match self {
                    $( Condition::$name => matches!(flag, $( CmpFlag::$flag )|+), )*
                }
            }
        }
    };
}

for_each_condition!(define_conditions);

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.mnemonic())
    }
}

/// Outcome of the most recent `cmp`.
///
/// Starts as [`CmpFlag::Equal`] so a conditional jump executed before any
/// comparison sees a neutral result.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum CmpFlag {
    Less,
    #[default]
    Equal,
    Greater,
}

impl From<Ordering> for CmpFlag {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => CmpFlag::Less,
            Ordering::Equal => CmpFlag::Equal,
            Ordering::Greater => CmpFlag::Greater,
        }
    }
}

impl fmt::Display for CmpFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            CmpFlag::Less => "less",
            CmpFlag::Equal => "equal",
            CmpFlag::Greater => "greater",
        })
    }
}

/// Index of a register in the unit's register file.
///
/// Only the [`Assembler`](super::assembler::Assembler) hands these out, after
/// checking the name against the declared registers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Reg(pub(crate) u8);

impl Reg {
    /// Position of the register in declaration order.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single machine instruction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Instruction {
    /// `dst = src`
    Mov { dst: Reg, src: Operand },
    /// `dst += step`, one when no step is given.
    Inc { dst: Reg, step: Option<Operand> },
    /// `dst -= step`, one when no step is given.
    Dec { dst: Reg, step: Option<Operand> },
    /// Sets the comparison flag from `reg` against `rhs`.
    Cmp { reg: Reg, rhs: Operand },
    /// Unconditional jump.
    Jmp { target: Target },
    /// Jump taken only when `cond` holds for the current flag.
    Jcc { cond: Condition, target: Target },
}

impl Instruction {
    /// Returns the assembly mnemonic for this instruction.
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Mov { .. } => "mov",
            Instruction::Inc { .. } => "inc",
            Instruction::Dec { .. } => "dec",
            Instruction::Cmp { .. } => "cmp",
            Instruction::Jmp { .. } => "jmp",
            Instruction::Jcc { cond, .. } => cond.mnemonic(),
        }
    }

    /// Returns the jump target, if this is a jump.
    pub fn target(&self) -> Option<&Target> {
        match self {
            Instruction::Jmp { target } | Instruction::Jcc { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Every register this instruction reads or writes.
    pub fn registers(&self) -> impl Iterator<Item = Reg> + '_ {
        let (first, operand) = match self {
            Instruction::Mov { dst, src } => (Some(*dst), Some(src)),
            Instruction::Inc { dst, step } | Instruction::Dec { dst, step } => {
                (Some(*dst), step.as_ref())
            }
            Instruction::Cmp { reg, rhs } => (Some(*reg), Some(rhs)),
            Instruction::Jmp { .. } | Instruction::Jcc { .. } => (None, None),
        };
        first
            .into_iter()
            .chain(operand.and_then(Operand::register))
    }
}
