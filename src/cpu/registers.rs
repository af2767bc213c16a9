//! Register file.
//!
//! Four general purpose byte registers (R0-R3) and a flags byte. Only one
//! flag exists: bit 0 is the zero flag, set when the last ADD or SUB produced
//! zero.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 4;

/// Mask of the zero flag in the flags byte.
pub const ZERO_FLAG: u8 = 0b0000_0001;

/// The register file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// R0-R3
    regs: [u8; REGISTER_COUNT],

    /// Status flags. Always 0 or [`ZERO_FLAG`].
    flags: u8,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all registers and flags to zero.
    pub fn reset(&mut self) {
        self.regs = [0; REGISTER_COUNT];
        self.flags = 0;
    }

    /// Read a register.
    pub fn get(&self, reg: u8) -> Result<u8, RegisterError> {
        self.regs
            .get(reg as usize)
            .copied()
            .ok_or(RegisterError::InvalidRegister(reg))
    }

    /// All registers, R0 first.
    pub fn values(&self) -> &[u8; REGISTER_COUNT] {
        &self.regs
    }

    /// The raw flags byte.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Whether the zero flag is set.
    pub fn zero(&self) -> bool {
        self.flags & ZERO_FLAG != 0
    }

    /// LOAD: `reg := value`.
    pub fn load(&mut self, reg: u8, value: u8) -> Result<(), RegisterError> {
        let index = Self::check(reg)?;
        self.regs[index] = value;
        Ok(())
    }

    /// ADD: `reg1 := reg1 + reg2` (mod 256), then `reg2 := 0`.
    ///
    /// The second operand is always cleared, so the instruction behaves like
    /// a move-and-accumulate. Returns the result.
    pub fn add(&mut self, reg1: u8, reg2: u8) -> Result<u8, RegisterError> {
        self.combine(reg1, reg2, u8::wrapping_add)
    }

    /// SUB: `reg1 := reg1 - reg2` (mod 256), then `reg2 := 0`.
    pub fn subtract(&mut self, reg1: u8, reg2: u8) -> Result<u8, RegisterError> {
        self.combine(reg1, reg2, u8::wrapping_sub)
    }

    fn combine(&mut self, reg1: u8, reg2: u8, op: fn(u8, u8) -> u8) -> Result<u8, RegisterError> {
        let a = Self::check(reg1)?;
        let b = Self::check(reg2)?;

        let result = op(self.regs[a], self.regs[b]);
        self.set_zero_flag(result);
        self.regs[a] = result;
        // Zeroed last: with reg1 == reg2 the register ends up 0.
        self.regs[b] = 0;
        Ok(result)
    }

    /// Replace the flags byte from an arithmetic result.
    fn set_zero_flag(&mut self, result: u8) {
        self.flags = if result == 0 { ZERO_FLAG } else { 0 };
    }

    fn check(reg: u8) -> Result<usize, RegisterError> {
        let index = reg as usize;
        if index < REGISTER_COUNT {
            Ok(index)
        } else {
            Err(RegisterError::InvalidRegister(reg))
        }
    }
}

/// Errors raised by register operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RegisterError {
    #[error("invalid register R{0} (expected 0-3)")]
    InvalidRegister(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load() {
        let mut regs = Registers::new();

        regs.load(2, 200).unwrap();
        assert_eq!(regs.get(2), Ok(200));
        assert_eq!(regs.values(), &[0, 0, 200, 0]);
    }

    #[test]
    fn test_load_invalid_register() {
        let mut regs = Registers::new();
        regs.load(0, 1).unwrap();

        assert_eq!(regs.load(5, 10), Err(RegisterError::InvalidRegister(5)));
        assert_eq!(regs.values(), &[1, 0, 0, 0]);
    }

    #[test]
    fn test_add_clears_second_operand() {
        let mut regs = Registers::new();
        regs.load(0, 5).unwrap();
        regs.load(1, 7).unwrap();

        assert_eq!(regs.add(0, 1), Ok(12));
        assert_eq!(regs.values(), &[12, 0, 0, 0]);
        assert!(!regs.zero());
    }

    #[test]
    fn test_add_wraps_and_sets_zero() {
        let mut regs = Registers::new();
        regs.load(0, 200).unwrap();
        regs.load(3, 56).unwrap();

        assert_eq!(regs.add(0, 3), Ok(0));
        assert!(regs.zero());
        assert_eq!(regs.flags(), ZERO_FLAG);
    }

    #[test]
    fn test_subtract_wraps() {
        let mut regs = Registers::new();
        regs.load(1, 3).unwrap();
        regs.load(2, 5).unwrap();

        assert_eq!(regs.subtract(1, 2), Ok(254));
        assert_eq!(regs.values(), &[0, 254, 0, 0]);
        assert_eq!(regs.flags(), 0);
    }

    #[test]
    fn test_same_register_ends_zero() {
        let mut regs = Registers::new();
        regs.load(1, 4).unwrap();

        // 4 + 4 = 8 sets no flag, but the register is cleared afterwards.
        assert_eq!(regs.add(1, 1), Ok(8));
        assert_eq!(regs.get(1), Ok(0));
        assert!(!regs.zero());
    }

    #[test]
    fn test_arith_invalid_register_is_noop() {
        let mut regs = Registers::new();
        regs.load(0, 9).unwrap();
        regs.load(1, 9).unwrap();
        regs.subtract(0, 1).unwrap();

        assert_eq!(regs.add(0, 4), Err(RegisterError::InvalidRegister(4)));
        assert_eq!(regs.subtract(7, 0), Err(RegisterError::InvalidRegister(7)));
        assert_eq!(regs.values(), &[0, 0, 0, 0]);
        assert!(regs.zero());
    }

    #[test]
    fn test_reset() {
        let mut regs = Registers::new();
        regs.load(3, 1).unwrap();
        regs.subtract(3, 3).unwrap();

        regs.reset();
        assert_eq!(regs, Registers::new());
    }
}
