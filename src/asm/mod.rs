//! Program loader and disassembler.
//!
//! This module provides:
//! - A line-oriented assembler (text → instruction words → memory)
//! - A disassembler (words → readable text)

pub mod assembler;
pub mod disasm;

pub use assembler::{assemble, load_program, AssemblerError};
pub use disasm::{disassemble, disassemble_word};
