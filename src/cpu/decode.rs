//! Instruction decoder.
//!
//! Every instruction is one 16-bit word:
//!
//! ```text
//!  15    12 11                     0
//! +--------+------------------------+
//! | opcode |        operand         |
//! +--------+------------------------+
//! ```
//!
//! The operand is always the low 12 bits. Whether it names an address
//! or an immediate value depends only on the opcode.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mask selecting the 12-bit operand.
pub const OPERAND_MASK: u16 = 0x0FFF;

/// Largest value an operand can hold.
pub const OPERAND_MAX: u16 = OPERAND_MASK;

/// The assigned opcodes. The other nine nibble values are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    /// Load accumulator: AC := mem[operand]
    Lda = 0x0,
    /// Store accumulator: mem[operand] := AC
    Sta = 0x1,
    /// AC := AC + operand
    Add = 0x2,
    /// AC := AC * operand
    Mul = 0x3,
    /// AC := AC / operand
    Div = 0x4,
    /// AC := AC % operand
    Mod = 0x5,
    /// Set accumulator: AC := operand
    Sea = 0xF,
}

impl Opcode {
    pub const ALL: [Opcode; 7] = [
        Opcode::Lda,
        Opcode::Sta,
        Opcode::Add,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Mod,
        Opcode::Sea,
    ];

    /// Look up the opcode for a nibble.
    pub fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0x0 => Some(Opcode::Lda),
            0x1 => Some(Opcode::Sta),
            0x2 => Some(Opcode::Add),
            0x3 => Some(Opcode::Mul),
            0x4 => Some(Opcode::Div),
            0x5 => Some(Opcode::Mod),
            0xF => Some(Opcode::Sea),
            _ => None,
        }
    }

    #[inline]
    pub fn nibble(self) -> u8 {
        self as u8
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Lda => "LDA",
            Opcode::Sta => "STA",
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Sea => "SEA",
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl std::str::FromStr for Opcode {
    type Err = UnknownMnemonic;

    /// Parse a mnemonic, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Opcode::ALL
            .into_iter()
            .find(|op| op.mnemonic() == upper)
            .ok_or_else(|| UnknownMnemonic(s.trim().to_string()))
    }
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    /// 12-bit payload, always `<= OPERAND_MAX`.
    pub operand: u16,
}

impl Instruction {
    /// Build an instruction, truncating `operand` to 12 bits.
    pub fn new(opcode: Opcode, operand: u16) -> Self {
        Self {
            opcode,
            operand: operand & OPERAND_MASK,
        }
    }

    pub fn encode(&self) -> u16 {
        encode_raw(self.opcode.nibble(), self.operand)
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:03X}", self.opcode, self.operand)
    }
}

/// Split a word into its opcode nibble and operand.
#[inline]
pub fn fields(word: u16) -> (u8, u16) {
    (((word >> 12) & 0xF) as u8, word & OPERAND_MASK)
}

/// Pack an opcode nibble and an operand into a word.
#[inline]
pub fn encode_raw(opcode: u8, operand: u16) -> u16 {
    (((opcode & 0xF) as u16) << 12) | (operand & OPERAND_MASK)
}

/// Decode an instruction word.
pub fn decode(word: u16) -> Result<Instruction, DecodeError> {
    let (nibble, operand) = fields(word);
    let opcode = Opcode::from_nibble(nibble).ok_or(DecodeError::UnknownOpcode(nibble))?;
    Ok(Instruction { opcode, operand })
}

/// Encode an instruction back to a word.
pub fn encode(instr: &Instruction) -> u16 {
    instr.encode()
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode: {0:#X}")]
    UnknownOpcode(u8),
}

/// A mnemonic that names no opcode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mnemonic: {0}")]
pub struct UnknownMnemonic(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_table() {
        let cases = [
            (0x0010, Opcode::Lda, 0x010),
            (0x1010, Opcode::Sta, 0x010),
            (0x2003, Opcode::Add, 0x003),
            (0x3FFF, Opcode::Mul, 0xFFF),
            (0x4002, Opcode::Div, 0x002),
            (0x5007, Opcode::Mod, 0x007),
            (0xF005, Opcode::Sea, 0x005),
        ];

        for (word, opcode, operand) in cases {
            assert_eq!(decode(word).unwrap(), Instruction { opcode, operand });
        }
    }

    #[test]
    fn test_unassigned_opcodes() {
        for nibble in 0x6..=0xE {
            let word = encode_raw(nibble, 0x123);
            assert_eq!(decode(word), Err(DecodeError::UnknownOpcode(nibble)));
        }
    }

    #[test]
    fn test_mnemonic_parse() {
        assert_eq!("sea".parse::<Opcode>().unwrap(), Opcode::Sea);
        assert_eq!(" LDA ".parse::<Opcode>().unwrap(), Opcode::Lda);
        assert_eq!(
            "HLT".parse::<Opcode>(),
            Err(UnknownMnemonic("HLT".into()))
        );
    }

    #[test]
    fn test_opcode_nibble_roundtrip() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_nibble(op.nibble()), Some(op));
        }
    }

    #[test]
    fn test_instruction_display() {
        assert_eq!(Instruction::new(Opcode::Sta, 0x10).to_string(), "STA 010");
    }

    proptest! {
        #[test]
        fn encode_decode_fields_roundtrip(opcode in 0u8..16, operand in 0u16..=OPERAND_MAX) {
            let word = encode_raw(opcode, operand);
            prop_assert_eq!(fields(word), (opcode, operand));
        }

        #[test]
        fn instruction_roundtrip(idx in 0usize..Opcode::ALL.len(), operand in 0u16..=OPERAND_MAX) {
            let instr = Instruction::new(Opcode::ALL[idx], operand);
            prop_assert_eq!(decode(encode(&instr)).unwrap(), instr);
        }
    }
}
