//! Program loader.
//!
//! Syntax, one instruction per line:
//! ```text
//! ; Comment
//! SEA 0005        ; AC := 5
//! ADD 3           ; AC := AC + 3
//! STA 010         ; mem[0x010] := AC
//! LDA 010         ; AC := mem[0x010]
//! ```
//!
//! Operands are hexadecimal without a prefix and must fit in 12 bits.
//! Instructions are placed at consecutive word addresses starting at 0.

use crate::cpu::decode::{Instruction, Opcode, OPERAND_MAX};
use crate::cpu::memory::{Memory, MemoryError};
use thiserror::Error;
use tracing::debug;

/// Assemble source code to a list of instruction words.
pub fn assemble(source: &str) -> Result<Vec<u16>, AssemblerError> {
    let mut output = Vec::new();

    for (line_num, line) in source.lines().enumerate() {
        if let Some(instr) = parse_line(line, line_num + 1)? {
            output.push(instr.encode());
        }
    }

    Ok(output)
}

/// Assemble `source` and write it into memory from address 0.
///
/// Returns the words that were written.
pub fn load_program(mem: &mut Memory, source: &str) -> Result<Vec<u16>, AssemblerError> {
    let words = assemble(source)?;
    mem.load_words(0, &words)?;
    debug!(words = words.len(), "program loaded");
    Ok(words)
}

fn parse_line(line: &str, line_num: usize) -> Result<Option<Instruction>, AssemblerError> {
    // Remove comments
    let line = match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    };

    let mut parts = line.split_whitespace();
    let Some(mnemonic) = parts.next() else {
        return Ok(None);
    };

    let opcode: Opcode = mnemonic.parse().map_err(|_| AssemblerError::UnknownMnemonic {
        line: line_num,
        mnemonic: mnemonic.to_string(),
    })?;

    let operand = parts.next().ok_or_else(|| AssemblerError::SyntaxError {
        line: line_num,
        message: format!("{} requires an operand", opcode),
    })?;

    if let Some(extra) = parts.next() {
        return Err(AssemblerError::SyntaxError {
            line: line_num,
            message: format!("unexpected token '{}'", extra),
        });
    }

    let value = parse_hex(operand, line_num)?;
    Ok(Some(Instruction::new(opcode, value)))
}

fn parse_hex(operand: &str, line_num: usize) -> Result<u16, AssemblerError> {
    let value = u32::from_str_radix(operand, 16).map_err(|_| AssemblerError::SyntaxError {
        line: line_num,
        message: format!("invalid hex operand '{}'", operand),
    })?;

    if value > OPERAND_MAX as u32 {
        return Err(AssemblerError::ValueOutOfRange {
            line: line_num,
            value,
        });
    }

    Ok(value as u16)
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("operand out of range on line {line}: {value:#X} (max 0xFFF)")]
    ValueOutOfRange { line: usize, value: u32 },

    #[error("program does not fit in memory: {0}")]
    Memory(#[from] MemoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_simple() {
        let source = "SEA 0005\nADD 0003\nSTA 0010\nLDA 0010\n";

        let result = assemble(source).unwrap();
        assert_eq!(result, vec![0xF005, 0x2003, 0x1010, 0x0010]);
    }

    #[test]
    fn test_assemble_all_mnemonics() {
        let source = r#"
            lda 1
            sta 2
            add 3
            mul 4
            div 5
            mod 6
            sea FFF
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(
            result,
            vec![0x0001, 0x1002, 0x2003, 0x3004, 0x4005, 0x5006, 0xFFFF]
        );
    }

    #[test]
    fn test_blank_lines_and_comments() {
        let source = "\n; header\nSEA 1 ; set\n\n   \nADD a\n";

        let result = assemble(source).unwrap();
        assert_eq!(result, vec![0xF001, 0x200A]);
    }

    #[test]
    fn test_unknown_mnemonic() {
        let err = assemble("SEA 1\nHLT 0\n").unwrap_err();
        assert_eq!(
            err,
            AssemblerError::UnknownMnemonic { line: 2, mnemonic: "HLT".into() }
        );
    }

    #[test]
    fn test_operand_errors() {
        assert!(matches!(
            assemble("ADD").unwrap_err(),
            AssemblerError::SyntaxError { line: 1, .. }
        ));
        assert!(matches!(
            assemble("ADD 0x10").unwrap_err(),
            AssemblerError::SyntaxError { line: 1, .. }
        ));
        assert!(matches!(
            assemble("ADD 1 2").unwrap_err(),
            AssemblerError::SyntaxError { line: 1, .. }
        ));
        assert_eq!(
            assemble("ADD 1000").unwrap_err(),
            AssemblerError::ValueOutOfRange { line: 1, value: 0x1000 }
        );
    }

    #[test]
    fn test_load_program_places_words_sequentially() {
        let mut mem = Memory::new();
        let words = load_program(&mut mem, "SEA 5\n\nADD 3\n").unwrap();

        assert_eq!(words.len(), 2);
        assert_eq!(mem.read_word(0).unwrap(), 0xF005);
        assert_eq!(mem.read_word(2).unwrap(), 0x2003);
        assert_eq!(mem.read_word(4).unwrap(), 0);
    }

    #[test]
    fn test_load_program_too_large() {
        let mut mem = Memory::new();
        let source = "SEA 1\n".repeat(2049);

        let err = load_program(&mut mem, &source).unwrap_err();
        assert!(matches!(
            err,
            AssemblerError::Memory(MemoryError::ProgramTooLarge { .. })
        ));
    }
}
