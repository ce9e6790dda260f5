use crate::virtual_machine::isa::Reg;
use std::fmt;

/// Register file of a unit.
///
/// Holds one signed integer per declared register name, in declaration order.
/// Every register starts at zero.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Registers {
    names: Vec<String>,
    values: Vec<i64>,
}

impl Registers {
    /// Creates a zeroed register file for `names`.
    pub(crate) fn new(names: &[String]) -> Self {
        Self {
            names: names.to_vec(),
            values: vec![0; names.len()],
        }
    }

    /// Looks a register up by name.
    pub fn index_of(&self, name: &str) -> Option<Reg> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| Reg(i as u8))
    }

    /// Returns the value held in `reg`.
    ///
    /// `reg` comes from the same program this file was built for, so it is
    /// always in range.
    #[inline(always)]
    pub fn get(&self, reg: Reg) -> i64 {
        self.values[reg.index()]
    }

    /// Stores `value` into `reg`.
    #[inline(always)]
    pub fn set(&mut self, reg: Reg, value: i64) {
        self.values[reg.index()] = value;
    }

    /// Returns the value of the register called `name`.
    pub fn value(&self, name: &str) -> Option<i64> {
        self.index_of(name).map(|reg| self.get(reg))
    }

    /// Returns the name of `reg`.
    pub fn name(&self, reg: Reg) -> &str {
        &self.names[reg.index()]
    }

    /// All values in declaration order.
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// All register names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterates `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}
