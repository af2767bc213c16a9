//! # Nibble CPU
//!
//! An educational simulator of a deliberately tiny CPU: four byte-wide
//! registers, a zero flag, sixteen bytes of memory, a program counter and
//! an instruction register, driven by a five-opcode fetch-decode-execute
//! loop.
//!
//! ```
//! use nibble::{Cpu, NullSink};
//!
//! let mut cpu = Cpu::new();
//! cpu.load_program(&[0x01, 0x00, 0x05, 0x01, 0x01, 0x07, 0x02, 0x00, 0x01]).unwrap();
//! cpu.run(&mut NullSink);
//! assert_eq!(cpu.read_register(0), Ok(12));
//! ```

pub mod cpu;
pub mod config;
pub mod shell;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuError, Diagnostic, DiagnosticSink, Instruction, Memory, NullSink, Registers, RunOutcome};
pub use config::SimConfig;
pub use shell::Shell;

#[cfg(feature = "tui")]
pub use tui::run_debugger;
