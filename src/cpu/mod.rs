//! CPU emulation for the 16-bit accumulator machine.
//!
//! This module implements the complete architecture:
//! - 4096 bytes of memory holding big-endian 16-bit words
//! - 3 registers: PC (program counter), IR (instruction), AC (accumulator)
//! - 7 instructions in a 4-bit opcode space with a 12-bit operand

pub mod alu;
pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

pub use alu::{Alu, AluError};
pub use memory::{DumpFormat, Memory, MemoryError, MEMORY_SIZE};
pub use registers::{Register, RegisterSnapshot, Registers};
pub use decode::{DecodeError, Instruction, Opcode};
pub use execute::{
    Control, Cpu, CpuError, CpuState, NoObserver, RunOutcome, StepInfo, StepObserver, StopReason,
};
