use crate::virtual_machine::isa::Instruction;

/// Step budget the `asm_unit` runner applies when none is configured.
pub const DEFAULT_STEP_LIMIT: u64 = 10_000_000;

/// Counters accumulated while a program runs.
///
/// Useful for profiling loops and for sizing a step budget.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ExecStats {
    /// Instructions executed.
    pub steps: u64,
    /// Jumps taken, conditional or not.
    pub jumps_taken: u64,
    /// `cmp` instructions executed.
    pub compares: u64,
}

impl ExecStats {
    /// Creates empty counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accounts for one executed instruction.
    #[inline(always)]
    pub(crate) fn record(&mut self, instruction: &Instruction, jumped: bool) {
        self.steps = self.steps.saturating_add(1);
        if jumped {
            self.jumps_taken = self.jumps_taken.saturating_add(1);
        }
        if matches!(instruction, Instruction::Cmp { .. }) {
            self.compares = self.compares.saturating_add(1);
        }
    }
}
