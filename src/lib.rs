//! # acc16
//!
//! A fetch-decode-execute simulator for a toy 16-bit accumulator machine.
//!
//! The machine has one accumulator, a program counter, an instruction
//! register and 4 KiB of byte-addressable memory. Seven opcodes load,
//! store and do integer arithmetic on the accumulator. There is no halt
//! instruction: a program runs until it faults or the caller stops it.

pub mod cpu;
pub mod asm;
pub mod config;
pub mod console;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{
    Alu, Control, Cpu, CpuError, CpuState, DumpFormat, Instruction, Memory, MemoryError, Opcode,
    RegisterSnapshot, Registers, RunOutcome, StepInfo, StepObserver, StopReason,
};
pub use asm::{assemble, disassemble, load_program, AssemblerError};
pub use config::{ConfigError, RunConfig};
pub use console::ConsolePrompt;

#[cfg(feature = "tui")]
pub use tui::run_debugger;
