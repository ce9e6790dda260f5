use asm_derive::Error;

/// Errors raised while building or running a program.
///
/// Every variant except [`VMError::StepLimitExceeded`] is a build-time
/// contract violation: the assembler reports it before any instruction runs.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum VMError {
    /// Operand, destination or initial value names a register the unit does not declare.
    #[error("unknown register {name}")]
    UnknownRegister { name: String },
    /// The same register name was declared twice.
    #[error("register {name} declared more than once")]
    DuplicateRegister { name: String },
    /// More registers declared than an instruction can address.
    #[error("{count} registers declared, at most {max} are addressable")]
    TooManyRegisters { count: usize, max: usize },
    /// A unit needs at least one register.
    #[error("a unit must declare at least one register")]
    NoRegisters,
    /// Label defined more than once.
    #[error("duplicate label: {label}")]
    DuplicateLabel { label: String },
    /// Jump to a label that was never declared.
    #[error("undefined label: {label}")]
    UndefinedLabel { label: String },
    /// The step budget ran out before the instruction pointer left the program.
    #[error("step limit of {limit} exceeded")]
    StepLimitExceeded { limit: u64 },
}
