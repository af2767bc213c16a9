//! Interactive command shell.
//!
//! A line-oriented front end over a caller-owned [`Cpu`]. The shell reads
//! commands from any [`BufRead`] and writes to any [`Write`], so it runs the
//! same on a terminal and in tests.

pub mod command;
pub mod editor;

pub use command::{Command, UnknownCommand};
pub use editor::{parse_edits, parse_number, EditError, MemoryEdit};

use crate::config::SimConfig;
use crate::cpu::{Cpu, Diagnostic, Instruction, Opcode, MEMORY_SIZE, REGISTER_COUNT};
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Prompt printed before each command.
pub const PROMPT: &str = "CPU/";

/// Shell state: the CPU it drives plus its I/O.
pub struct Shell<'a, R, W> {
    cpu: &'a mut Cpu,
    config: &'a SimConfig,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(cpu: &'a mut Cpu, config: &'a SimConfig, input: R, output: W) -> Self {
        Self { cpu, config, input, output }
    }

    /// Read and execute commands until `exit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            write!(self.output, "{}", PROMPT)?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                writeln!(self.output)?;
                return Ok(());
            };

            match line.parse::<Command>() {
                Ok(Command::Exit) => return Ok(()),
                Ok(cmd) => {
                    debug!(command = cmd.keyword(), "shell command");
                    self.execute(cmd)?;
                }
                Err(e) => writeln!(self.output, "{}", e)?,
            }
        }
    }

    /// Execute one command. `Exit` is a no-op here; the loop handles it.
    pub fn execute(&mut self, cmd: Command) -> io::Result<()> {
        match cmd {
            Command::ListMemory => self.list_memory(),
            Command::ChangeMemory => self.change_memory(),
            Command::Run => self.run_program(),
            Command::Reset => {
                self.cpu.reset();
                writeln!(self.output, "CPU registers and memory have been reset.")
            }
            Command::ListRegisters => self.list_registers(),
            Command::Help => write!(self.output, "{}", help_text()),
            Command::Exit => Ok(()),
        }
    }

    fn list_memory(&mut self) -> io::Result<()> {
        for (addr, value) in self.cpu.mem.cells().iter().enumerate() {
            writeln!(self.output, "Memory[{}]: {}", addr, value)?;
        }
        Ok(())
    }

    fn list_registers(&mut self) -> io::Result<()> {
        for (reg, value) in self.cpu.regs.values().iter().enumerate() {
            writeln!(self.output, "Register[{}]: {}", reg, value)?;
        }
        writeln!(self.output, "PC: {}", self.cpu.pc())?;
        writeln!(self.output, "IR: 0x{:02X}", self.cpu.ir())?;
        writeln!(self.output, "Flags: {} (zero={})", self.cpu.flags(), self.cpu.zero_flag())
    }

    fn change_memory(&mut self) -> io::Result<()> {
        loop {
            self.list_memory()?;
            write!(
                self.output,
                "\nEnter memory addresses and values to modify (e.g., '0 100 2 255'): "
            )?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                return writeln!(self.output);
            };

            for outcome in parse_edits(&line) {
                match outcome {
                    Ok(MemoryEdit { address, value }) => match self.cpu.write_memory(address, value) {
                        Ok(()) => writeln!(self.output, "Memory[{}] set to {}", address, value)?,
                        Err(e) => writeln!(self.output, "Error: {}", e)?,
                    },
                    Err(e) => writeln!(self.output, "Error: {}", e)?,
                }
            }

            write!(self.output, "\nWould you like to modify more memory locations? (y/n): ")?;
            self.output.flush()?;

            match self.read_line()? {
                Some(answer) if !editor::is_no(&answer) => continue,
                _ => return Ok(()),
            }
        }
    }

    fn run_program(&mut self) -> io::Result<()> {
        let trace = self.config.trace;
        let cpu = &mut *self.cpu;
        let output = &mut self.output;

        let mut write_result = Ok(());
        let mut sink = |d: Diagnostic| {
            // NOOPs run silently.
            let shown = match d {
                Diagnostic::Executing { instruction: Instruction::Noop, .. } => false,
                Diagnostic::Executing { .. } => trace,
                Diagnostic::Fault { .. } => true,
            };
            if write_result.is_ok() && shown {
                write_result = writeln!(output, "{}", d);
            }
        };

        let exhausted = match self.config.step_limit {
            Some(limit) => {
                let outcome = cpu.run_limited(limit, &mut sink);
                (!outcome.completed).then_some(outcome.steps)
            }
            None => {
                cpu.run(&mut sink);
                None
            }
        };
        write_result?;

        if let Some(steps) = exhausted {
            writeln!(
                self.output,
                "Stopped after {} steps at PC={} (step limit reached).",
                steps,
                self.cpu.pc()
            )?;
        }
        writeln!(self.output, "CPU Run Cycle Finished.")
    }

    /// Next input line without its line terminator, or `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

/// Help text: what the tool is, the commands, and the opcodes.
pub fn help_text() -> String {
    let mut text = String::new();
    text.push_str("\nWelcome to the CPU Learning Tool!\n");
    text.push_str("This is an educational tool designed to help you understand how a simple CPU works.\n");
    text.push_str(&format!(
        "The CPU has {} registers, {} bytes of memory, a program counter (PC) and an instruction register (IR).\n",
        REGISTER_COUNT, MEMORY_SIZE
    ));
    text.push_str("Write a program into memory, run it, and inspect the registers to see what each instruction did.\n");

    text.push_str("\nAvailable Commands:\n");
    for (i, cmd) in Command::ALL.iter().enumerate() {
        text.push_str(&format!("{}. {:<18}- {}\n", i + 1, cmd.keyword(), cmd.description()));
    }

    text.push_str("\nOpCodes Descriptions:\n");
    for (opcode, description) in OPCODE_HELP {
        let mnemonic = Opcode::mnemonic(opcode).unwrap_or("????");
        text.push_str(&format!("0x{:02X} - {}: {}\n", opcode, mnemonic, description));
    }
    text
}

const OPCODE_HELP: [(u8, &str); 5] = [
    (Opcode::LOAD, "LOAD reg value. Put the value byte into the register."),
    (Opcode::ADD, "ADD reg1 reg2. Add reg2 into reg1, then clear reg2. Sets the zero flag."),
    (Opcode::SUB, "SUB reg1 reg2. Subtract reg2 from reg1, then clear reg2. Sets the zero flag."),
    (Opcode::JUMP, "JUMP address. Set the Program Counter (PC) to the address."),
    (Opcode::NOOP, "NOOP. No operation. Simply moves to the next instruction."),
];

/// Run an interactive shell on stdin/stdout.
pub fn run_stdio(cpu: &mut Cpu, config: &SimConfig) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    Shell::new(cpu, config, stdin.lock(), stdout.lock()).run()
}
