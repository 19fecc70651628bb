//! CPU registers.
//!
//! The machine has three 16-bit registers:
//! - PC: program counter, address of the next instruction
//! - IR: instruction register, the word most recently fetched
//! - AC: accumulator, source and destination of every operation

use serde::{Deserialize, Serialize};

/// A single 16-bit storage cell. Any value is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Register {
    value: u16,
}

impl Register {
    /// Create a register holding zero.
    pub const fn new() -> Self {
        Self { value: 0 }
    }

    #[inline]
    pub fn read(&self) -> u16 {
        self.value
    }

    #[inline]
    pub fn write(&mut self, value: u16) {
        self.value = value;
    }
}

/// The register file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// Program counter
    pub pc: Register,
    /// Instruction register
    pub ir: Register,
    /// Accumulator
    pub ac: Register,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Copy out the current values.
    pub fn snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot {
            pc: self.pc.read(),
            ir: self.ir.read(),
            ac: self.ac.read(),
        }
    }
}

/// Plain values of all three registers at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegisterSnapshot {
    pub pc: u16,
    pub ir: u16,
    pub ac: u16,
}

impl std::fmt::Display for RegisterSnapshot {
    /// The debug block printed after each cycle.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "==================== DEBUG ====================")?;
        writeln!(f, "PC: {:04X}", self.pc)?;
        writeln!(f, "IR: {:04X}", self.ir)?;
        writeln!(f, "AC: {:04X}", self.ac)?;
        write!(f, "===============================================")
    }
}
