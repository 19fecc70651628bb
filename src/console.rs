//! Interactive console front end.
//!
//! After every cycle the register block is printed and the user is
//! asked whether to dump memory. A bad dump request is reported and the
//! run carries on; only `q` or end of input stops it.

use crate::cpu::{Control, DumpFormat, Memory, StepInfo, StepObserver};
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::warn;

/// A parsed `start end [format]` dump request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpRequest {
    pub start: i64,
    pub end: i64,
    pub format: DumpFormat,
}

impl DumpRequest {
    /// Parse a request line. Addresses are decimal or `0x`-prefixed hex.
    pub fn parse(line: &str, default_format: DumpFormat) -> Result<Self, RequestError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let (start, end, format) = match parts.as_slice() {
            [start, end] => (*start, *end, None),
            [start, end, format] => (*start, *end, Some(*format)),
            _ => return Err(RequestError::Usage),
        };

        let format = match format {
            Some(f) => f.parse().map_err(RequestError::Format)?,
            None => default_format,
        };

        Ok(Self {
            start: parse_address(start)?,
            end: parse_address(end)?,
            format,
        })
    }
}

fn parse_address(text: &str) -> Result<i64, RequestError> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => text.parse::<i64>(),
    };
    parsed.map_err(|_| RequestError::Address(text.to_string()))
}

/// Errors in a dump request typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("expected: <start> <end> [format]")]
    Usage,

    #[error("invalid address '{0}'")]
    Address(String),

    #[error("{0}")]
    Format(String),
}

/// Step observer that talks to a human over a reader/writer pair.
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
    default_format: DumpFormat,
    interactive: bool,
    trace: bool,
}

impl ConsolePrompt<io::StdinLock<'static>, Box<dyn Write>> {
    /// Prompt on stdin, writing to stdout or, with `to_stderr`, to stderr.
    pub fn stdio(default_format: DumpFormat, interactive: bool, to_stderr: bool) -> Self {
        let output: Box<dyn Write> = if to_stderr {
            Box::new(io::stderr())
        } else {
            Box::new(io::stdout())
        };
        Self::new(io::stdin().lock(), output, default_format, interactive)
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    /// With `interactive` unset only the register block is printed.
    pub fn new(input: R, output: W, default_format: DumpFormat, interactive: bool) -> Self {
        Self {
            input,
            output,
            default_format,
            interactive,
            trace: false,
        }
    }

    /// Also print `addr: instruction` before each register block.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Give back the writer, e.g. to inspect what was printed.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Bytes that are not UTF-8 are kept as replacement characters so the
    /// request parser can reject them like any other typo.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&buf).trim().to_string()))
    }

    fn interact(&mut self, step: &StepInfo, memory: &Memory) -> io::Result<Control> {
        if self.trace {
            writeln!(self.output, "{:03X}: {}", step.addr, step.instruction)?;
        }
        writeln!(self.output, "{}", step.registers)?;

        if !self.interactive {
            return Ok(Control::Continue);
        }

        write!(self.output, "dump? (y/n/q): ")?;
        self.output.flush()?;

        let Some(answer) = self.read_line()? else {
            return Ok(Control::Stop);
        };

        match answer.to_ascii_lowercase().as_str() {
            "y" | "yes" => {}
            "q" | "quit" => return Ok(Control::Stop),
            _ => return Ok(Control::Continue),
        }

        write!(
            self.output,
            "start end format (2: binary, 16: hex) [default {}]: ",
            self.default_format.label()
        )?;
        self.output.flush()?;

        let Some(line) = self.read_line()? else {
            return Ok(Control::Stop);
        };

        let result = DumpRequest::parse(&line, self.default_format)
            .map_err(|e| e.to_string())
            .and_then(|req| {
                memory
                    .dump(req.start, req.end, req.format)
                    .map(|text| (req, text))
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok((req, text)) => {
                writeln!(self.output, "memory dump ({}):", req.format.label())?;
                write!(self.output, "{}", text)?;
            }
            Err(message) => writeln!(self.output, "error: {}", message)?,
        }

        Ok(Control::Continue)
    }
}

impl<R: BufRead, W: Write> StepObserver for ConsolePrompt<R, W> {
    fn after_step(&mut self, step: &StepInfo, memory: &Memory) -> Control {
        match self.interact(step, memory) {
            Ok(control) => control,
            Err(e) => {
                warn!(cycle = step.cycle, error = %e, "console I/O failed, stopping run");
                eprintln!("error: console I/O failed: {}", e);
                Control::Stop
            }
        }
    }
}
