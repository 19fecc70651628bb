//! WebAssembly bindings for the acc16 emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.
//! `Cpu` borrows its memory, so the wrapper owns memory and the register
//! file and builds a CPU around them for each call.

use wasm_bindgen::prelude::*;
use crate::asm::assembler::assemble;
use crate::asm::disasm::disassemble_word;
use crate::cpu::{Cpu, CpuState, DumpFormat, Memory, NoObserver, Registers, RunOutcome};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly CPU wrapper.
#[wasm_bindgen]
pub struct WasmCpu {
    mem: Memory,
    regs: Registers,
    state: CpuState,
    cycles: u64,
    last_error: Option<String>,
    program: Vec<u16>,
}

impl WasmCpu {
    fn with_cpu<T>(&mut self, f: impl FnOnce(&mut Cpu<'_>) -> T) -> T {
        let mut cpu = Cpu::with_registers(&mut self.mem, self.regs.clone());
        let result = f(&mut cpu);
        self.regs = cpu.registers().clone();
        self.cycles += cpu.cycles();
        if cpu.is_faulted() {
            self.state = CpuState::Faulted;
        }
        result
    }
}

#[wasm_bindgen]
impl WasmCpu {
    /// Create a new CPU instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            mem: Memory::new(),
            regs: Registers::new(),
            state: CpuState::Running,
            cycles: 0,
            last_error: None,
            program: Vec::new(),
        }
    }

    /// Load a program from source code. Returns the instruction count.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let words = assemble(source)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        self.program = words;
        self.reset();
        if let Some(e) = &self.last_error {
            return Err(JsError::new(e));
        }
        Ok(self.program.len())
    }

    /// Step one instruction. Returns the disassembled instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        if self.state != CpuState::Running {
            return Err(JsError::new("CPU has faulted; reset to run again"));
        }

        let result = self.with_cpu(|cpu| cpu.step());
        match result {
            Ok(instr) => Ok(instr.to_string()),
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(JsError::new(&e.to_string()))
            }
        }
    }

    /// Run until a fault or `max_cycles`. Returns the total cycle count.
    #[wasm_bindgen]
    pub fn run(&mut self, max_cycles: u32) -> u64 {
        if self.state != CpuState::Running {
            return self.cycles;
        }

        let outcome = self.with_cpu(|cpu| cpu.run_limited(max_cycles as u64, &mut NoObserver));
        if let RunOutcome::Faulted { error, .. } = outcome {
            self.last_error = Some(error.to_string());
        }
        self.cycles
    }

    /// Reset CPU to initial state with loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.mem.clear();
        self.regs.reset();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_error = self.mem.load_words(0, &self.program).err().map(|e| e.to_string());
    }

    /// Check if CPU is running.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }

    /// Get the message of the fault that stopped the CPU, if any.
    #[wasm_bindgen]
    pub fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> u16 {
        self.regs.pc.read()
    }

    /// Get instruction register.
    #[wasm_bindgen]
    pub fn ir(&self) -> u16 {
        self.regs.ir.read()
    }

    /// Get accumulator value.
    #[wasm_bindgen]
    pub fn accumulator(&self) -> u16 {
        self.regs.ac.read()
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.state)
    }

    /// Get the word at a byte address, or 0 when out of range.
    #[wasm_bindgen]
    pub fn word_at(&self, addr: usize) -> u16 {
        self.mem.read_word(addr).unwrap_or(0)
    }

    /// Get all memory bytes.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Vec<u8> {
        self.mem.bytes().to_vec()
    }

    /// Render a memory range; `binary` selects 8-bit groups instead of hex.
    #[wasm_bindgen]
    pub fn dump(&self, start: i32, end: i32, binary: bool) -> Result<String, JsError> {
        let format = if binary { DumpFormat::Binary } else { DumpFormat::Hex };
        self.mem
            .dump(start as i64, end as i64, format)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Get registers as JSON string.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> String {
        serde_json::to_string(&self.regs.snapshot()).unwrap_or_default()
    }
}

impl Default for WasmCpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return instruction count.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<usize, JsError> {
    let words = assemble(source)
        .map_err(|e| JsError::new(&format!("{}", e)))?;
    Ok(words.len())
}

/// Disassemble a single instruction word.
#[wasm_bindgen]
pub fn wasm_disassemble(word: u16) -> String {
    disassemble_word(word)
}
