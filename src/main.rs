//! acc16 Emulator - CLI Entry Point
//!
//! Commands:
//! - `acc16-emu run <program>` - Load a program and run it until it faults
//! - `acc16-emu debug <program>` - Interactive TUI debugger
//! - `acc16-emu asm <source>` - Assemble and print a listing

use acc16::cpu::{Control, CpuState, Memory, RegisterSnapshot, StepInfo, StepObserver};
use acc16::{ConsolePrompt, Cpu, DumpFormat, RunConfig, RunOutcome};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "acc16-emu")]
#[command(version)]
#[command(about = "A fetch-decode-execute simulator for a toy 16-bit accumulator machine")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it faults or is stopped
    Run {
        /// Path to the program source
        program: String,
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<String>,
        /// Maximum number of cycles to run
        #[arg(short, long)]
        max_cycles: Option<u64>,
        /// Print each instruction and the registers after it
        #[arg(short, long)]
        trace: bool,
        /// Offer a memory dump after each instruction
        #[arg(short, long)]
        interactive: bool,
        /// Default dump format (16/hex or 2/bin)
        #[arg(short = 'f', long)]
        dump_format: Option<DumpFormat>,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive debugger
    Debug {
        /// Path to the program source
        program: String,
    },
    /// Assemble a program and print the listing
    Asm {
        /// Path to the source file
        source: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Run {
            program,
            config,
            max_cycles,
            trace,
            interactive,
            dump_format,
            json,
        }) => {
            let mut cfg = match config {
                Some(path) => RunConfig::load(&path).unwrap_or_else(|e| fail(&e.to_string())),
                None => RunConfig::default(),
            };
            cfg.max_cycles = max_cycles.or(cfg.max_cycles);
            cfg.trace |= trace;
            cfg.interactive |= interactive;
            if let Some(format) = dump_format {
                cfg.dump_format = format;
            }
            run_program(&program, &cfg, json);
        }
        Some(Commands::Debug { program }) => {
            debug_program(&program);
        }
        Some(Commands::Asm { source }) => {
            assemble_file(&source);
        }
        None => {
            println!("acc16 Emulator v{}", env!("CARGO_PKG_VERSION"));
            println!("A 16-bit accumulator machine simulator");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(message: &str) -> ! {
    eprintln!("error: {}", message);
    std::process::exit(2);
}

fn read_source(path: &str) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| fail(&format!("failed to read {}: {}", path, e)))
}

fn load(path: &str) -> Memory {
    let source = read_source(path);
    let mut mem = Memory::new();
    match acc16::load_program(&mut mem, &source) {
        Ok(words) if words.is_empty() => fail("no instructions to execute"),
        Ok(words) => tracing::info!(path, words = words.len(), "loaded program"),
        Err(e) => fail(&format!("assembly error: {}", e)),
    }
    mem
}

/// Final state printed by `run --json`.
#[derive(Serialize)]
struct RunSummary {
    cycles: u64,
    state: CpuState,
    outcome: String,
    registers: RegisterSnapshot,
}

fn run_program(path: &str, cfg: &RunConfig, json: bool) {
    let mut mem = load(path);
    let mut cpu = Cpu::new(&mut mem);

    // With --json, stdout carries only the summary.
    let mut console =
        ConsolePrompt::stdio(cfg.dump_format, cfg.interactive, json).with_trace(cfg.trace);
    let show_console = cfg.trace || cfg.interactive;

    let mut observer = |step: &StepInfo, mem: &Memory| {
        if show_console {
            console.after_step(step, mem)
        } else {
            Control::Continue
        }
    };

    let outcome = match cfg.max_cycles {
        Some(max) => cpu.run_limited(max, &mut observer),
        None => cpu.run(&mut observer),
    };

    let description = match &outcome {
        RunOutcome::Stopped { reason, .. } => format!("stopped: {:?}", reason),
        RunOutcome::Faulted { error, .. } => format!("fault: {}", error),
    };

    if json {
        let summary = RunSummary {
            cycles: outcome.cycles(),
            state: cpu.state(),
            outcome: description,
            registers: cpu.snapshot(),
        };
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => fail(&e.to_string()),
        }
    } else {
        println!();
        println!("━━━ Result ━━━");
        println!("Cycles: {}", outcome.cycles());
        println!("State:  {:?} ({})", cpu.state(), description);
        println!("{}", cpu.snapshot());
    }

    if outcome.is_fault() {
        std::process::exit(1);
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str) {
    let source = read_source(path);
    let words = acc16::assemble(&source).unwrap_or_else(|e| fail(&format!("assembly error: {}", e)));
    if words.is_empty() {
        fail("no instructions to execute");
    }

    if let Err(e) = acc16::run_debugger(words) {
        fail(&format!("debugger error: {}", e));
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str) {
    fail("this build has no debugger; rebuild with the `tui` feature");
}

fn assemble_file(path: &str) {
    let source = read_source(path);
    match acc16::assemble(&source) {
        Ok(words) => print!("{}", acc16::disassemble(&words)),
        Err(e) => fail(&format!("assembly error: {}", e)),
    }
}
