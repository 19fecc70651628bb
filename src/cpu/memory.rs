//! Main memory.
//!
//! A flat array of 4096 bytes. Words are 16 bits wide and stored
//! big-endian: the high byte lives at the lower address.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use thiserror::Error;

/// The number of byte cells in memory.
pub const MEMORY_SIZE: usize = 4096;

/// The last address at which a word may start.
pub const LAST_WORD_ADDR: usize = MEMORY_SIZE - 2;

/// Rendering used by [`Memory::dump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpFormat {
    /// Two uppercase hex digits per byte, 16 bytes per line.
    #[default]
    Hex,
    /// Eight binary digits per byte, 8 bytes per line.
    Binary,
}

impl DumpFormat {
    /// Bytes rendered on each output line.
    pub fn bytes_per_line(self) -> usize {
        match self {
            DumpFormat::Hex => 16,
            DumpFormat::Binary => 8,
        }
    }

    /// Human-readable name used in the dump header.
    pub fn label(self) -> &'static str {
        match self {
            DumpFormat::Hex => "hexadecimal",
            DumpFormat::Binary => "binary",
        }
    }
}

impl std::str::FromStr for DumpFormat {
    type Err = String;

    /// Accepts the radix (`16`, `2`) or a name (`hex`, `bin`, `binary`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "16" | "hex" | "h" => Ok(DumpFormat::Hex),
            "2" | "bin" | "binary" | "b" => Ok(DumpFormat::Binary),
            other => Err(format!("unknown dump format '{}' (expected 16 or 2)", other)),
        }
    }
}

/// Byte-addressable memory with bounds-checked word access.
///
/// Always exactly [`MEMORY_SIZE`] cells; deserializing any other length
/// fails.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "RawMemory")]
pub struct Memory {
    cells: Vec<u8>,
}

#[derive(Deserialize)]
struct RawMemory {
    cells: Vec<u8>,
}

impl TryFrom<RawMemory> for Memory {
    type Error = MemoryError;

    fn try_from(raw: RawMemory) -> Result<Self, Self::Error> {
        if raw.cells.len() != MEMORY_SIZE {
            return Err(MemoryError::WrongSize(raw.cells.len()));
        }
        Ok(Self { cells: raw.cells })
    }
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Read the big-endian word starting at `addr`.
    pub fn read_word(&self, addr: usize) -> Result<u16, MemoryError> {
        let addr = Self::check_word(addr)?;
        Ok(u16::from_be_bytes([self.cells[addr], self.cells[addr + 1]]))
    }

    /// Write `value` big-endian at `addr`. Only the two target cells change.
    pub fn write_word(&mut self, addr: usize, value: u16) -> Result<(), MemoryError> {
        let addr = Self::check_word(addr)?;
        let [hi, lo] = value.to_be_bytes();
        self.cells[addr] = hi;
        self.cells[addr + 1] = lo;
        Ok(())
    }

    fn check_word(addr: usize) -> Result<usize, MemoryError> {
        if addr > LAST_WORD_ADDR {
            return Err(MemoryError::AddressOutOfRange(addr));
        }
        Ok(addr)
    }

    /// Store consecutive words starting at `start`, two bytes apart.
    ///
    /// Nothing is written unless the whole block fits.
    pub fn load_words(&mut self, start: usize, words: &[u16]) -> Result<(), MemoryError> {
        let needed = words.len() * 2;
        if start.checked_add(needed).map_or(true, |end| end > MEMORY_SIZE) {
            return Err(MemoryError::ProgramTooLarge {
                size: needed,
                available: MEMORY_SIZE.saturating_sub(start),
            });
        }

        for (i, &word) in words.iter().enumerate() {
            self.write_word(start + i * 2, word)?;
        }

        Ok(())
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Raw view of every cell.
    pub fn bytes(&self) -> &[u8] {
        &self.cells
    }

    /// Render bytes `start..=end` for inspection.
    ///
    /// The range is signed because it usually comes straight from user
    /// input; anything outside `0..size` or with `start > end` is rejected.
    pub fn dump(&self, start: i64, end: i64, format: DumpFormat) -> Result<String, MemoryError> {
        if start < 0 || end >= MEMORY_SIZE as i64 || start > end {
            return Err(MemoryError::RangeOutOfBounds { start, end });
        }

        let (start, end) = (start as usize, end as usize);
        let per_line = format.bytes_per_line();
        let mut out = String::new();

        for (offset, byte) in self.cells[start..=end].iter().enumerate() {
            match format {
                DumpFormat::Hex => {
                    let _ = write!(out, "{:02X}", byte);
                }
                DumpFormat::Binary => {
                    let _ = write!(out, "{:08b}", byte);
                }
            }
            let last = start + offset == end;
            if (offset + 1) % per_line == 0 || last {
                out.push('\n');
            } else {
                out.push(' ');
            }
        }

        Ok(out)
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&b| b != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// A word access would touch a byte outside memory.
    #[error("word address {0:#05X} out of range (0x000-{max:#05X})", max = LAST_WORD_ADDR)]
    AddressOutOfRange(usize),

    /// A dump range lies outside memory or is reversed.
    #[error("dump range {start}..={end} out of range (0-{max})", max = MEMORY_SIZE - 1)]
    RangeOutOfBounds { start: i64, end: i64 },

    /// A block of words does not fit.
    #[error("program size {size} bytes exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },

    /// A memory image with the wrong number of cells.
    #[error("memory image has {0} cells, expected {max}", max = MEMORY_SIZE)]
    WrongSize(usize),
}

impl MemoryError {
    /// True for errors caused by an address or range outside memory.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            MemoryError::AddressOutOfRange(_) | MemoryError::RangeOutOfBounds { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_memory_starts_zeroed() {
        let mem = Memory::new();
        assert_eq!(mem.size(), MEMORY_SIZE);
        assert!(mem.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_word_is_big_endian() {
        let mut mem = Memory::new();
        mem.write_word(0x10, 0xABCD).unwrap();

        assert_eq!(mem.bytes()[0x10], 0xAB);
        assert_eq!(mem.bytes()[0x11], 0xCD);
        assert_eq!(mem.bytes()[0x0F], 0);
        assert_eq!(mem.bytes()[0x12], 0);
    }

    #[test]
    fn test_memory_bounds() {
        let mut mem = Memory::new();

        assert!(mem.read_word(0).is_ok());
        assert!(mem.read_word(LAST_WORD_ADDR).is_ok());
        assert!(mem.write_word(LAST_WORD_ADDR, 0xFFFF).is_ok());

        assert_eq!(
            mem.read_word(MEMORY_SIZE - 1),
            Err(MemoryError::AddressOutOfRange(MEMORY_SIZE - 1))
        );
        assert!(mem.write_word(MEMORY_SIZE, 1).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_load_words() {
        let mut mem = Memory::new();
        mem.load_words(0, &[0xF005, 0x2003]).unwrap();

        assert_eq!(mem.read_word(0).unwrap(), 0xF005);
        assert_eq!(mem.read_word(2).unwrap(), 0x2003);
    }

    #[test]
    fn test_load_words_too_large_leaves_memory_untouched() {
        let mut mem = Memory::new();
        let words = vec![0x1234; MEMORY_SIZE / 2 + 1];

        let err = mem.load_words(0, &words).unwrap_err();
        assert!(matches!(err, MemoryError::ProgramTooLarge { .. }));
        assert_eq!(mem.read_word(0).unwrap(), 0);
    }

    #[test]
    fn test_load_words_near_usize_max() {
        let mut mem = Memory::new();

        let err = mem.load_words(usize::MAX, &[0x1234]).unwrap_err();
        assert_eq!(err, MemoryError::ProgramTooLarge { size: 2, available: 0 });
        assert_eq!(
            mem.load_words(LAST_WORD_ADDR, &[0x1234, 0x5678]),
            Err(MemoryError::ProgramTooLarge { size: 4, available: 2 })
        );
        assert!(mem.load_words(LAST_WORD_ADDR, &[0xBEEF]).is_ok());
    }

    #[test]
    fn test_deserialize_checks_size() {
        let err = serde_json::from_str::<Memory>(r#"{"cells":[]}"#).unwrap_err();
        assert!(err.to_string().contains("memory image has 0 cells"));

        let mut mem = Memory::new();
        mem.write_word(0x20, 0xABCD).unwrap();
        let json = serde_json::to_string(&mem).unwrap();
        let restored: Memory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.size(), MEMORY_SIZE);
        assert_eq!(restored.read_word(0x20).unwrap(), 0xABCD);
    }

    #[test]
    fn test_dump_hex_fresh_memory() {
        let mem = Memory::new();
        let out = mem.dump(0, 15, DumpFormat::Hex).unwrap();

        assert_eq!(out.lines().count(), 1);
        let tokens: Vec<&str> = out.split_whitespace().collect();
        assert_eq!(tokens.len(), 16);
        assert!(tokens.iter().all(|t| *t == "00"));
    }

    #[test]
    fn test_dump_hex_wraps_every_16_bytes() {
        let mut mem = Memory::new();
        mem.write_word(16, 0xBEEF).unwrap();
        let out = mem.dump(0, 19, DumpFormat::Hex).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "BE EF 00 00");
    }

    #[test]
    fn test_dump_binary() {
        let mut mem = Memory::new();
        mem.write_word(0, 0x8001).unwrap();
        let out = mem.dump(0, 8, DumpFormat::Binary).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("10000000 00000001 "));
        assert_eq!(lines[0].split(' ').count(), 8);
        assert_eq!(lines[1], "00000000");
    }

    #[test]
    fn test_dump_rejects_bad_ranges() {
        let mut mem = Memory::new();
        mem.write_word(0, 0x1234).unwrap();
        let before = mem.clone();

        for (start, end) in [(-1, 10), (0, MEMORY_SIZE as i64), (10, 9)] {
            let err = mem.dump(start, end, DumpFormat::Hex).unwrap_err();
            assert_eq!(err, MemoryError::RangeOutOfBounds { start, end });
            assert!(err.is_out_of_range());
        }
        assert_eq!(mem.bytes(), before.bytes());

        assert!(mem.dump(MEMORY_SIZE as i64 - 1, MEMORY_SIZE as i64 - 1, DumpFormat::Binary).is_ok());
    }

    #[test]
    fn test_dump_format_parse() {
        assert_eq!("16".parse::<DumpFormat>().unwrap(), DumpFormat::Hex);
        assert_eq!("2".parse::<DumpFormat>().unwrap(), DumpFormat::Binary);
        assert_eq!("BIN".parse::<DumpFormat>().unwrap(), DumpFormat::Binary);
        assert!("8".parse::<DumpFormat>().is_err());
    }

    proptest! {
        #[test]
        fn word_roundtrip(addr in 0usize..=LAST_WORD_ADDR, value in any::<u16>()) {
            let mut mem = Memory::new();
            mem.write_word(addr, value).unwrap();
            prop_assert_eq!(mem.read_word(addr).unwrap(), value);
        }

        #[test]
        fn word_access_out_of_range(addr in (LAST_WORD_ADDR + 1)..usize::MAX, value in any::<u16>()) {
            let mut mem = Memory::new();
            prop_assert_eq!(mem.read_word(addr), Err(MemoryError::AddressOutOfRange(addr)));
            prop_assert_eq!(mem.write_word(addr, value), Err(MemoryError::AddressOutOfRange(addr)));
        }
    }
}
