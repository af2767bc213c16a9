//! Shell command parsing.

use std::str::FromStr;
use thiserror::Error;

/// A shell command. Each one is typed on its own line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ListMemory,
    ChangeMemory,
    Run,
    Reset,
    ListRegisters,
    Help,
    Exit,
}

impl Command {
    /// Every command, in the order the help text lists them.
    pub const ALL: [Command; 7] = [
        Command::ListMemory,
        Command::ChangeMemory,
        Command::Run,
        Command::Reset,
        Command::ListRegisters,
        Command::Help,
        Command::Exit,
    ];

    /// The text the user types.
    pub fn keyword(&self) -> &'static str {
        match self {
            Command::ListMemory => "list memory",
            Command::ChangeMemory => "change memory",
            Command::Run => "run",
            Command::Reset => "reset",
            Command::ListRegisters => "list registers",
            Command::Help => "help",
            Command::Exit => "exit",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::ListMemory => "Display the contents of the CPU memory (16 bytes).",
            Command::ChangeMemory => "Modify the contents of the CPU memory (multiple addresses/values).",
            Command::Run => "Execute the loaded program (fetch, decode, execute instructions).",
            Command::Reset => "Reset CPU registers and memory to their initial state.",
            Command::ListRegisters => "Display the contents of the CPU registers (4 registers).",
            Command::Help => "Display this help message.",
            Command::Exit => "Exit the program.",
        }
    }
}

impl FromStr for Command {
    type Err = UnknownCommand;

    /// Match a whole input line. Surrounding whitespace is ignored; the
    /// command itself must match exactly.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        Command::ALL
            .into_iter()
            .find(|cmd| cmd.keyword() == line)
            .ok_or_else(|| UnknownCommand(line.to_string()))
    }
}

/// The input line is not a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid command.")]
pub struct UnknownCommand(pub String);
