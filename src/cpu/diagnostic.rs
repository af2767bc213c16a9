//! Run-time diagnostics.
//!
//! [`Cpu::run`](crate::cpu::Cpu::run) never prints. It hands every executed
//! instruction and every non-fatal fault to a [`DiagnosticSink`] supplied by
//! the caller, which decides how (or whether) to present them.

use crate::cpu::decode::Instruction;
use crate::cpu::execute::CpuError;

/// Something worth telling the user about during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An instruction was decoded at `pc` and executed.
    Executing { pc: usize, instruction: Instruction },
    /// The instruction at `pc` raised a recoverable fault.
    Fault { pc: usize, error: CpuError },
}

impl Diagnostic {
    pub fn pc(&self) -> usize {
        match self {
            Diagnostic::Executing { pc, .. } | Diagnostic::Fault { pc, .. } => *pc,
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Diagnostic::Fault { .. })
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::Executing { instruction, .. } => {
                write!(f, "Executing {}", instruction.mnemonic())
            }
            Diagnostic::Fault { error, .. } => write!(f, "{}", error),
        }
    }
}

/// Receiver of run diagnostics.
///
/// Implemented for any `FnMut(Diagnostic)`, so collecting into a vector is
/// `|d| seen.push(d)`.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl<F: FnMut(Diagnostic)> DiagnosticSink for F {
    fn report(&mut self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}
