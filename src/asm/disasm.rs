//! Disassembler.
//!
//! Converts instruction words back to loader syntax.

use crate::cpu::decode::{decode, fields};

/// Disassemble a single word to text.
pub fn disassemble_word(word: u16) -> String {
    match decode(word) {
        Ok(instr) => instr.to_string(),
        Err(_) => {
            let (nibble, operand) = fields(word);
            format!("??? {:X}{:03X}", nibble, operand)
        }
    }
}

/// Disassemble consecutive words that start at address 0.
pub fn disassemble(words: &[u16]) -> String {
    let mut output = String::new();
    output.push_str("; Disassembly\n");
    output.push_str("; -----------\n\n");

    for (i, word) in words.iter().enumerate() {
        let line = disassemble_word(*word);
        output.push_str(&format!("{:03X}: {:04X}  {}\n", i * 2, word, line));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_word() {
        assert_eq!(disassemble_word(0xF005), "SEA 005");
        assert_eq!(disassemble_word(0x1010), "STA 010");
        assert_eq!(disassemble_word(0x0FFF), "LDA FFF");
    }

    #[test]
    fn test_disassemble_unknown() {
        assert_eq!(disassemble_word(0x6123), "??? 6123");
    }

    #[test]
    fn test_disassemble_listing() {
        let listing = disassemble(&[0xF005, 0x2003]);
        assert!(listing.contains("000: F005  SEA 005"));
        assert!(listing.contains("002: 2003  ADD 003"));
    }

    #[test]
    fn test_roundtrip_through_assembler() {
        let words = crate::asm::assemble("SEA 5\nMUL 2A\nSTA 100\n").unwrap();
        let text: Vec<String> = words.iter().map(|w| disassemble_word(*w)).collect();
        assert_eq!(crate::asm::assemble(&text.join("\n")).unwrap(), words);
    }
}
