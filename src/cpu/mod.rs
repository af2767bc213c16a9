//! CPU emulation.
//!
//! The machine is deliberately tiny:
//! - 16 one-byte memory cells
//! - 4 byte-wide registers (R0-R3) and a zero flag
//! - program counter and instruction register
//! - 5 opcodes: NOOP, LOAD, ADD, SUB, JUMP

pub mod memory;
pub mod registers;
pub mod decode;
pub mod diagnostic;
pub mod execute;

pub use memory::{Memory, MemoryError, MEMORY_SIZE};
pub use registers::{Registers, RegisterError, REGISTER_COUNT};
pub use decode::{Instruction, Opcode, DecodeError};
pub use diagnostic::{Diagnostic, DiagnosticSink, NullSink};
pub use execute::{Cpu, CpuError, RunOutcome};
