//! TUI debugger for the acc16 emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Live PC/IR/AC view
//! - Hex memory view
//! - Step/run/breakpoint controls
//! - Disassembly view

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
