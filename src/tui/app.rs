//! Debugger application state and logic.

use crate::asm::disasm::disassemble_word;
use crate::cpu::memory::{LAST_WORD_ADDR, MEMORY_SIZE};
use crate::{Cpu, Memory};
use std::collections::HashSet;

/// Bytes shown on one row of the memory view.
pub const MEM_ROW_BYTES: usize = 16;

/// Debugger application state.
pub struct DebuggerApp<'m> {
    /// The CPU being debugged.
    pub cpu: Cpu<'m>,
    /// Original program for reset.
    pub program: Vec<u16>,
    /// Breakpoints (by word address).
    pub breakpoints: HashSet<u16>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// First memory row shown.
    pub mem_scroll: usize,
}

impl<'m> DebuggerApp<'m> {
    /// Create a debugger over memory that already holds `program`.
    pub fn new(mem: &'m mut Memory, program: Vec<u16>) -> Self {
        Self {
            cpu: Cpu::new(mem),
            program,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            mem_scroll: 0,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.cpu.is_running() {
            self.status = format!("CPU stopped: {:?}. Press 'x' to reset.", self.cpu.state());
            self.running = false;
            return;
        }

        let pc = self.cpu.registers().pc.read();
        match self.cpu.step() {
            Ok(instr) => {
                self.status = format!("PC={:03X}: {}", pc, instr);
            }
            Err(e) => {
                self.status = format!("Fault at PC={:03X}: {}", pc, e);
                self.running = false;
            }
        }
    }

    /// Run until breakpoint or fault.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if !self.cpu.is_running() {
            self.running = false;
            self.status = format!("Faulted after {} cycles", self.cpu.cycles());
            return;
        }

        self.step();

        // Check for breakpoint on the next instruction
        let pc = self.cpu.registers().pc.read();
        if self.running && self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={:03X}", pc);
        }
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.registers().pc.read();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={:03X}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={:03X}", pc);
        }
    }

    /// Reload the program and clear the CPU.
    pub fn reset(&mut self) {
        let mem = self.cpu.memory_mut();
        mem.clear();
        if let Err(e) = mem.load_words(0, &self.program) {
            self.status = format!("Reset failed: {}", e);
            return;
        }
        self.cpu.reset();
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    pub fn scroll_up(&mut self) {
        self.mem_scroll = self.mem_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        if self.mem_scroll + 1 < MEMORY_SIZE / MEM_ROW_BYTES {
            self.mem_scroll += 1;
        }
    }

    /// One-word run mode shown in the footer title.
    pub fn mode(&self) -> &'static str {
        if self.cpu.is_faulted() {
            "FAULTED"
        } else if self.running {
            "RUNNING"
        } else {
            "PAUSED"
        }
    }

    /// Get disassembly around current PC.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u16, String, bool)> {
        let pc = self.cpu.registers().pc.read() as usize;
        let start = pc.saturating_sub((lines / 2) * 2) & !1;

        (0..lines)
            .map(|i| start + i * 2)
            .filter(|&addr| addr <= LAST_WORD_ADDR)
            .filter_map(|addr| {
                let word = self.cpu.memory().read_word(addr).ok()?;
                Some((addr as u16, disassemble_word(word), addr == pc))
            })
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<u16>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    let mut mem = Memory::new();
    mem.load_words(0, &program)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(&mut mem, program);

    // Main loop
    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => app.scroll_up(),
                        KeyCode::Down => app.scroll_down(),
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
