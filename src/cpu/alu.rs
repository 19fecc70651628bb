//! Arithmetic unit.
//!
//! All operations act on unsigned 16-bit operands and wrap on overflow
//! the same way native `u16` arithmetic does. There is no carry or
//! overflow flag.

use thiserror::Error;

/// Stateless integer arithmetic unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Alu;

impl Alu {
    /// Create a new arithmetic unit.
    pub const fn new() -> Self {
        Self
    }

    /// `a + b` modulo 2^16.
    #[inline]
    pub fn add(&self, a: u16, b: u16) -> u16 {
        a.wrapping_add(b)
    }

    /// `a * b` modulo 2^16.
    #[inline]
    pub fn mul(&self, a: u16, b: u16) -> u16 {
        a.wrapping_mul(b)
    }

    /// Truncating division.
    #[inline]
    pub fn div(&self, a: u16, b: u16) -> Result<u16, AluError> {
        a.checked_div(b).ok_or(AluError::DivisionByZero)
    }

    /// Remainder of `a / b`.
    #[inline]
    pub fn modulo(&self, a: u16, b: u16) -> Result<u16, AluError> {
        a.checked_rem(b).ok_or(AluError::DivisionByZero)
    }
}

/// Errors raised by the arithmetic unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AluError {
    #[error("division by zero")]
    DivisionByZero,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_add_wraps() {
        let alu = Alu::new();
        assert_eq!(alu.add(5, 3), 8);
        assert_eq!(alu.add(0xFFFF, 1), 0x0000);
    }

    #[test]
    fn test_mul_wraps() {
        let alu = Alu::new();
        assert_eq!(alu.mul(12, 12), 144);
        assert_eq!(alu.mul(0x100, 0x100), 0);
        assert_eq!(alu.mul(0xFFFF, 2), 0xFFFE);
    }

    #[test]
    fn test_div_and_mod() {
        let alu = Alu::new();
        assert_eq!(alu.div(17, 5), Ok(3));
        assert_eq!(alu.modulo(17, 5), Ok(2));
        assert_eq!(alu.div(0, 7), Ok(0));
    }

    #[test]
    fn test_division_by_zero() {
        let alu = Alu::new();
        assert_eq!(alu.div(0, 0), Err(AluError::DivisionByZero));
        assert_eq!(alu.modulo(42, 0), Err(AluError::DivisionByZero));
    }

    proptest! {
        #[test]
        fn div_mod_match_native(a in any::<u16>(), b in 1u16..=u16::MAX) {
            let alu = Alu::new();
            prop_assert_eq!(alu.div(a, b), Ok(a / b));
            prop_assert_eq!(alu.modulo(a, b), Ok(a % b));
        }

        #[test]
        fn zero_divisor_always_fails(a in any::<u16>()) {
            let alu = Alu::new();
            prop_assert_eq!(alu.div(a, 0), Err(AluError::DivisionByZero));
            prop_assert_eq!(alu.modulo(a, 0), Err(AluError::DivisionByZero));
        }

        #[test]
        fn add_mul_wrap(a in any::<u16>(), b in any::<u16>()) {
            let alu = Alu::new();
            prop_assert_eq!(alu.add(a, b) as u32, (a as u32 + b as u32) % 0x1_0000);
            prop_assert_eq!(alu.mul(a, b) as u32, (a as u32 * b as u32) % 0x1_0000);
        }
    }
}
