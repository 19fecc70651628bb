//! CPU execution engine.
//!
//! Implements the fetch-decode-execute cycle. The CPU borrows memory
//! for its whole lifetime; it never owns it.
//!
//! There is no halt instruction. A run ends at the first fatal error,
//! when an observer asks it to stop, or when a cycle limit is reached.
//! After a fatal error the CPU refuses to step again.

use crate::cpu::alu::{Alu, AluError};
use crate::cpu::decode::{self, DecodeError, Instruction, Opcode};
use crate::cpu::memory::{Memory, MemoryError};
use crate::cpu::registers::{RegisterSnapshot, Registers};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU hit a fatal error and cannot continue.
    Faulted,
}

/// What an observer wants the run loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Stop,
}

/// Why a run ended without a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The observer returned [`Control::Stop`].
    Observer,
    /// The cycle limit was reached.
    CycleLimit,
}

/// Result of [`Cpu::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run ended on request. The CPU may be stepped again.
    Stopped { reason: StopReason, cycles: u64 },
    /// The run ended on a fatal error. The CPU is now [`CpuState::Faulted`].
    Faulted { error: CpuError, cycles: u64 },
}

impl RunOutcome {
    /// Instructions executed during the run.
    pub fn cycles(&self) -> u64 {
        match self {
            RunOutcome::Stopped { cycles, .. } | RunOutcome::Faulted { cycles, .. } => *cycles,
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, RunOutcome::Faulted { .. })
    }
}

/// Information handed to a [`StepObserver`] after every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInfo {
    /// Total instructions executed so far, including this one.
    pub cycle: u64,
    /// Address the instruction was fetched from.
    pub addr: u16,
    pub instruction: Instruction,
    pub registers: RegisterSnapshot,
}

/// Hook invoked after each completed fetch/execute cycle.
///
/// This is where a front end prints debug output or offers a memory
/// dump. The observer only gets shared access to memory.
pub trait StepObserver {
    fn after_step(&mut self, step: &StepInfo, memory: &Memory) -> Control;
}

impl<F> StepObserver for F
where
    F: FnMut(&StepInfo, &Memory) -> Control,
{
    fn after_step(&mut self, step: &StepInfo, memory: &Memory) -> Control {
        self(step, memory)
    }
}

/// Observer that never interrupts the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObserver;

impl StepObserver for NoObserver {
    fn after_step(&mut self, _step: &StepInfo, _memory: &Memory) -> Control {
        Control::Continue
    }
}

/// The accumulator CPU.
pub struct Cpu<'m> {
    regs: Registers,
    alu: Alu,
    mem: &'m mut Memory,
    state: CpuState,
    cycles: u64,
    last_instr: Option<Instruction>,
}

impl<'m> Cpu<'m> {
    /// Create a CPU with zeroed registers wrapping `mem`.
    pub fn new(mem: &'m mut Memory) -> Self {
        Self::with_registers(mem, Registers::new())
    }

    /// Create a CPU that starts from an existing register file.
    pub fn with_registers(mem: &'m mut Memory, regs: Registers) -> Self {
        Self {
            regs,
            alu: Alu::new(),
            mem,
            state: CpuState::Running,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Reset registers, state and counters. Memory is left alone.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_instr = None;
    }

    /// Fetch the word at PC into IR and advance PC by 2.
    pub fn fetch(&mut self) -> Result<(), CpuError> {
        self.guarded(Self::fetch_inner)
    }

    /// Decode IR and perform its effect.
    pub fn execute(&mut self) -> Result<Instruction, CpuError> {
        self.guarded(Self::execute_inner)
    }

    /// Run one full fetch/execute cycle.
    ///
    /// Returns the instruction that was executed, or the fatal error.
    pub fn step(&mut self) -> Result<Instruction, CpuError> {
        self.guarded(|cpu| {
            cpu.fetch_inner()?;
            cpu.execute_inner()
        })
    }

    /// Run until a fault or until the observer stops the loop.
    pub fn run<O: StepObserver + ?Sized>(&mut self, observer: &mut O) -> RunOutcome {
        self.run_until(None, observer)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited<O: StepObserver + ?Sized>(
        &mut self,
        max_cycles: u64,
        observer: &mut O,
    ) -> RunOutcome {
        self.run_until(Some(max_cycles), observer)
    }

    fn run_until<O: StepObserver + ?Sized>(
        &mut self,
        max_cycles: Option<u64>,
        observer: &mut O,
    ) -> RunOutcome {
        let start_cycles = self.cycles;

        loop {
            let executed = self.cycles - start_cycles;
            if max_cycles.is_some_and(|max| executed >= max) {
                return RunOutcome::Stopped {
                    reason: StopReason::CycleLimit,
                    cycles: executed,
                };
            }

            let addr = self.regs.pc.read();
            let instruction = match self.step() {
                Ok(instr) => instr,
                Err(error) => {
                    return RunOutcome::Faulted {
                        error,
                        cycles: self.cycles - start_cycles,
                    }
                }
            };

            let info = StepInfo {
                cycle: self.cycles,
                addr,
                instruction,
                registers: self.snapshot(),
            };

            if observer.after_step(&info, &*self.mem) == Control::Stop {
                return RunOutcome::Stopped {
                    reason: StopReason::Observer,
                    cycles: self.cycles - start_cycles,
                };
            }
        }
    }

    /// Apply `f` only while running; any error it returns is fatal.
    fn guarded<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, CpuError>,
    ) -> Result<T, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        f(&mut *self).map_err(|e| {
            warn!(
                pc = self.regs.pc.read(),
                ir = self.regs.ir.read(),
                ac = self.regs.ac.read(),
                error = %e,
                "cpu faulted"
            );
            self.state = CpuState::Faulted;
            e
        })
    }

    fn fetch_inner(&mut self) -> Result<(), CpuError> {
        let addr = self.regs.pc.read();
        let word = self.mem.read_word(addr as usize)?;
        self.regs.ir.write(word);
        self.regs.pc.write(addr.wrapping_add(2));
        trace!(pc = addr, ir = word, "fetch");
        Ok(())
    }

    fn execute_inner(&mut self) -> Result<Instruction, CpuError> {
        let instr = decode::decode(self.regs.ir.read())?;
        let operand = instr.operand;
        let ac = self.regs.ac.read();

        trace!(opcode = %instr.opcode, operand, ac, "execute");

        match instr.opcode {
            Opcode::Lda => {
                let value = self.mem.read_word(operand as usize)?;
                self.regs.ac.write(value);
            }
            Opcode::Sta => {
                debug!(addr = operand, value = ac, "store accumulator");
                self.mem.write_word(operand as usize, ac)?;
            }
            Opcode::Add => self.regs.ac.write(self.alu.add(ac, operand)),
            Opcode::Mul => self.regs.ac.write(self.alu.mul(ac, operand)),
            Opcode::Div => self.regs.ac.write(self.alu.div(ac, operand)?),
            Opcode::Mod => self.regs.ac.write(self.alu.modulo(ac, operand)?),
            Opcode::Sea => self.regs.ac.write(operand),
        }

        self.cycles += 1;
        self.last_instr = Some(instr);
        Ok(instr)
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn snapshot(&self) -> RegisterSnapshot {
        self.regs.snapshot()
    }

    pub fn memory(&self) -> &Memory {
        &*self.mem
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut *self.mem
    }

    pub fn state(&self) -> CpuState {
        self.state
    }

    /// Instructions executed since creation or the last reset.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }

    pub fn is_faulted(&self) -> bool {
        self.state == CpuState::Faulted
    }
}

impl std::fmt::Debug for Cpu<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs.snapshot())
            .finish()
    }
}

/// Fatal errors raised by the fetch/execute cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("division by zero")]
    DivisionByZero,

    #[error("unknown opcode: {0:#X}")]
    UnknownOpcode(u8),
}

impl From<AluError> for CpuError {
    fn from(e: AluError) -> Self {
        match e {
            AluError::DivisionByZero => CpuError::DivisionByZero,
        }
    }
}

impl From<DecodeError> for CpuError {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::UnknownOpcode(nibble) => CpuError::UnknownOpcode(nibble),
        }
    }
}
