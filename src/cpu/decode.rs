//! Instruction decoder.
//!
//! Instructions are a one-byte opcode followed by zero, one or two operand
//! bytes:
//!
//! | Opcode | Mnemonic | Operands      | Length |
//! |--------|----------|---------------|--------|
//! | `0x00` | NOOP     |               | 1      |
//! | `0x01` | LOAD     | reg, value    | 3      |
//! | `0x02` | ADD      | reg1, reg2    | 3      |
//! | `0x03` | SUB      | reg1, reg2    | 3      |
//! | `0x04` | JUMP     | address       | 2      |

use crate::cpu::memory::{Memory, MemoryError};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// A decoded instruction with its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Do nothing.
    Noop,

    /// Load an immediate: `reg := value`
    Load { reg: u8, value: u8 },

    /// `reg1 := reg1 + reg2`, `reg2 := 0`
    Add { reg1: u8, reg2: u8 },

    /// `reg1 := reg1 - reg2`, `reg2 := 0`
    Sub { reg1: u8, reg2: u8 },

    /// `PC := address`
    Jump { address: u8 },
}

/// Opcode values.
pub struct Opcode;

impl Opcode {
    pub const NOOP: u8 = 0x00;
    pub const LOAD: u8 = 0x01;
    pub const ADD: u8 = 0x02;
    pub const SUB: u8 = 0x03;
    pub const JUMP: u8 = 0x04;

    /// Encoded length in bytes of the instruction starting with `opcode`.
    ///
    /// Unknown opcodes occupy a single byte so execution can skip over data.
    pub fn length(opcode: u8) -> usize {
        match opcode {
            Self::LOAD | Self::ADD | Self::SUB => 3,
            Self::JUMP => 2,
            _ => 1,
        }
    }

    /// Mnemonic for an opcode, if it is defined.
    pub fn mnemonic(opcode: u8) -> Option<&'static str> {
        match opcode {
            Self::NOOP => Some("NOOP"),
            Self::LOAD => Some("LOAD"),
            Self::ADD => Some("ADD"),
            Self::SUB => Some("SUB"),
            Self::JUMP => Some("JUMP"),
            _ => None,
        }
    }
}

impl Instruction {
    /// The opcode byte.
    pub fn opcode(&self) -> u8 {
        match self {
            Instruction::Noop => Opcode::NOOP,
            Instruction::Load { .. } => Opcode::LOAD,
            Instruction::Add { .. } => Opcode::ADD,
            Instruction::Sub { .. } => Opcode::SUB,
            Instruction::Jump { .. } => Opcode::JUMP,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        Opcode::mnemonic(self.opcode()).unwrap_or("???")
    }

    /// Encoded length in bytes.
    pub fn encoded_len(&self) -> usize {
        Opcode::length(self.opcode())
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Noop => write!(f, "NOOP"),
            Instruction::Load { reg, value } => write!(f, "LOAD R{}, {}", reg, value),
            Instruction::Add { reg1, reg2 } => write!(f, "ADD R{}, R{}", reg1, reg2),
            Instruction::Sub { reg1, reg2 } => write!(f, "SUB R{}, R{}", reg1, reg2),
            Instruction::Jump { address } => write!(f, "JUMP {}", address),
        }
    }
}

/// Decode the instruction whose opcode byte sits at `pc`.
///
/// The opcode is passed in (it normally comes from the instruction register);
/// operand bytes are read from `mem` at `pc + 1` and `pc + 2`.
pub fn decode(mem: &Memory, pc: usize, opcode: u8) -> Result<Instruction, DecodeError> {
    let operand = |offset: usize| -> Result<u8, DecodeError> {
        mem.read(pc + offset).map_err(|source| DecodeError::Operand { opcode, source })
    };

    let instruction = match opcode {
        Opcode::NOOP => Instruction::Noop,
        Opcode::LOAD => Instruction::Load { reg: operand(1)?, value: operand(2)? },
        Opcode::ADD => Instruction::Add { reg1: operand(1)?, reg2: operand(2)? },
        Opcode::SUB => Instruction::Sub { reg1: operand(1)?, reg2: operand(2)? },
        Opcode::JUMP => Instruction::Jump { address: operand(1)? },
        _ => return Err(DecodeError::UnknownOpcode(opcode)),
    };

    Ok(instruction)
}

/// Encode an instruction to its byte form.
pub fn encode(instr: &Instruction) -> Vec<u8> {
    match *instr {
        Instruction::Noop => vec![Opcode::NOOP],
        Instruction::Load { reg, value } => vec![Opcode::LOAD, reg, value],
        Instruction::Add { reg1, reg2 } => vec![Opcode::ADD, reg1, reg2],
        Instruction::Sub { reg1, reg2 } => vec![Opcode::SUB, reg1, reg2],
        Instruction::Jump { address } => vec![Opcode::JUMP, address],
    }
}

/// Encode a sequence of instructions back to back.
pub fn encode_program(instructions: &[Instruction]) -> Vec<u8> {
    instructions.iter().flat_map(encode).collect()
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown instruction 0x{0:02X}")]
    UnknownOpcode(u8),

    #[error("operand of opcode 0x{opcode:02X} unreadable: {source}")]
    Operand {
        opcode: u8,
        #[source]
        source: MemoryError,
    },
}
