//! TUI debugger.
//!
//! An interactive terminal view over the CPU with:
//! - Memory view with the PC and breakpoints marked
//! - Register, flag and cycle display
//! - Step/run/pause/breakpoint/reset controls

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
