//! A small register machine.
//!
//! Programs are built through a fluent [`Assembler`](virtual_machine::assembler::Assembler),
//! frozen into a [`Program`](virtual_machine::program::Program) and run by the
//! [`VM`](virtual_machine::vm::VM) over a named register file.

pub mod utils;
pub mod virtual_machine;
