//! Memory editor input.
//!
//! A line holds `addr value` pairs separated by whitespace, e.g.
//! `0 1 1 0 2 5`. Each pair is checked on its own; a bad pair is reported
//! and the rest of the line is still applied.

use crate::cpu::MEMORY_SIZE;
use thiserror::Error;

/// A validated write of `value` to memory cell `address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryEdit {
    pub address: usize,
    pub value: u8,
}

/// Why a pair on the editor line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("Invalid address format '{0}'")]
    InvalidAddressFormat(String),

    #[error("Missing value for address {0}")]
    MissingValue(i64),

    #[error("Invalid value '{token}' for address {address}")]
    InvalidValue { token: String, address: i64 },

    #[error("Invalid address ({address}) or value ({value})")]
    OutOfRange { address: i64, value: i64 },
}

/// Parse a decimal or `0x`-prefixed hexadecimal integer.
pub fn parse_number(token: &str) -> Option<i64> {
    let token = token.trim();
    if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        // from_str_radix would take "0x-5" as -5.
        if hex.starts_with(['+', '-']) {
            return None;
        }
        i64::from_str_radix(hex, 16).ok()
    } else {
        token.parse::<i64>().ok()
    }
}

/// Parse one editor line into an outcome per pair, in input order.
///
/// A trailing address without a value ends the line.
pub fn parse_edits(line: &str) -> Vec<Result<MemoryEdit, EditError>> {
    let mut outcomes = Vec::new();
    let mut tokens = line.split_whitespace();

    while let Some(token) = tokens.next() {
        let Some(address) = parse_number(token) else {
            outcomes.push(Err(EditError::InvalidAddressFormat(token.to_string())));
            continue;
        };

        let Some(value_token) = tokens.next() else {
            outcomes.push(Err(EditError::MissingValue(address)));
            break;
        };

        let Some(value) = parse_number(value_token) else {
            outcomes.push(Err(EditError::InvalidValue {
                token: value_token.to_string(),
                address,
            }));
            continue;
        };

        match (usize::try_from(address), u8::try_from(value)) {
            (Ok(addr), Ok(byte)) if addr < MEMORY_SIZE => {
                outcomes.push(Ok(MemoryEdit { address: addr, value: byte }));
            }
            _ => outcomes.push(Err(EditError::OutOfRange { address, value })),
        }
    }

    outcomes
}

/// Whether a continuation answer means "stop editing".
pub fn is_no(answer: &str) -> bool {
    matches!(answer.trim(), "n" | "N")
}
