//! Debugger application state and logic.

use crate::cpu::{Cpu, MEMORY_SIZE};
use std::collections::HashSet;

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged.
    pub cpu: Cpu,
    /// Original program, reloaded on reset.
    pub program: Vec<u8>,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<usize>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
    /// Step budget for one continuous run.
    pub step_limit: Option<u64>,
    /// Steps taken since the current continuous run started.
    run_steps: u64,
    /// Breakpoint address to step over when a run starts on it.
    resume_from: Option<usize>,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<u8>, step_limit: Option<u64>) -> Self {
        let mut cpu = Cpu::new();
        let status = match cpu.load_program(&program) {
            Ok(()) => "Ready. Press 's' to step, 'r' to run, 'q' to quit.".to_string(),
            Err(e) => format!("Program not loaded: {}", e),
        };

        Self {
            cpu,
            program,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status,
            mem_scroll: 0,
            step_limit,
            run_steps: 0,
            resume_from: None,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if self.cpu.is_finished() {
            self.status = format!("Program finished after {} cycles. Press 'x' to reset.", self.cpu.cycles);
            self.running = false;
            return;
        }

        let pc = self.cpu.pc();
        match self.cpu.step() {
            Ok(instr) => {
                self.status = format!("PC={:02}: {}", pc, instr);
            }
            Err(e) => {
                // Faults are not fatal; the CPU has already moved on.
                self.status = format!("PC={:02}: {}", pc, e);
            }
        }
    }

    /// Start continuous execution.
    pub fn run(&mut self) {
        self.running = true;
        self.run_steps = 0;
        self.resume_from = Some(self.cpu.pc());
        self.status = "Running...".into();
    }

    /// Pause continuous execution.
    pub fn pause(&mut self) {
        self.running = false;
        self.status = "Paused.".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if self.cpu.is_finished() {
            self.running = false;
            self.status = format!("Finished after {} cycles", self.cpu.cycles);
            return;
        }

        let pc = self.cpu.pc();
        if self.breakpoints.contains(&pc) && self.resume_from.take() != Some(pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={}", pc);
            return;
        }
        self.resume_from = None;

        if let Some(limit) = self.step_limit {
            if self.run_steps >= limit {
                self.running = false;
                self.status = format!("Step limit ({}) reached at PC={}", limit, pc);
                return;
            }
        }

        self.run_steps += 1;
        self.step();
    }

    /// Toggle breakpoint at the current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.pc();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={}", pc);
        }
    }

    /// Reset the CPU and reload the program.
    pub fn reset(&mut self) {
        self.cpu.reset();
        let _ = self.cpu.load_program(&self.program);
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    pub fn scroll_up(&mut self) {
        self.mem_scroll = self.mem_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        if self.mem_scroll + 1 < MEMORY_SIZE {
            self.mem_scroll += 1;
        }
    }

    /// Visible memory rows: `(address, value, is_pc)`.
    pub fn memory_rows(&self, lines: usize) -> Vec<(usize, u8, bool)> {
        let pc = self.cpu.pc();
        self.cpu.mem.cells()
            .iter()
            .enumerate()
            .skip(self.mem_scroll)
            .take(lines)
            .map(|(addr, &value)| (addr, value, addr == pc))
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<u8>, step_limit: Option<u64>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program, step_limit);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => app.pause(),
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => app.scroll_up(),
                        KeyCode::Down => app.scroll_down(),
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
