//! Register machine with a two-phase build-then-run model.
//!
//! # Architecture
//!
//! - **Registers**: a small named set (by default `ax`, `bx`, `cx`, `dx`) of
//!   signed 64-bit integers, all starting at zero
//! - **Instructions**: `mov`, `inc`, `dec`, `cmp`, `jmp` and six conditional
//!   jumps; operands are registers or immediates
//! - **Labels**: symbolic jump targets, usable before they are declared
//! - **Comparison flag**: less/equal/greater, set by `cmp`, read by conditional
//!   jumps, starts at equal
//! - **Execution model**: the instruction pointer starts at 0 and the run ends
//!   the first time it leaves the program
//!
//! # Modules
//!
//! - [`assembler`]: Program builder and label bookkeeping
//! - [`errors`]: Build and execution error types
//! - [`isa`]: Instruction set definition and condition catalogue
//! - [`operand`]: Operands, jump targets and operand resolution
//! - [`program`]: Frozen programs and their listing format
//! - [`vm`]: Execution engine, register file and step accounting

pub mod assembler;
pub mod errors;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod operand;
pub mod program;
pub mod vm;

pub use vm::run;
