//! Nibble CPU - CLI Entry Point
//!
//! Commands:
//! - `nibble-cpu` / `nibble-cpu shell` - Interactive command shell
//! - `nibble-cpu run <bytes>...` - Load bytes at address 0 and run them
//! - `nibble-cpu debug <bytes>...` - Interactive TUI debugger
//! - `nibble-cpu test` - Built-in self-test

use clap::{Args, Parser, Subcommand};
use nibble::SimConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nibble-cpu")]
#[command(version)]
#[command(about = "An educational simulator of a tiny four-register, sixteen-byte CPU")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive command shell (the default)
    Shell {
        #[command(flatten)]
        options: SimOptions,
    },
    /// Load a program at address 0 and run it
    Run {
        /// Program bytes, decimal or 0x-prefixed hex (at most 16)
        #[arg(required = true)]
        bytes: Vec<String>,
        #[command(flatten)]
        options: SimOptions,
        /// Print the final CPU state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Step through a program in the TUI debugger
    Debug {
        /// Program bytes, decimal or 0x-prefixed hex (at most 16)
        bytes: Vec<String>,
        #[command(flatten)]
        options: SimOptions,
    },
    /// Run the built-in self-test
    Test,
}

/// Settings shared by every command that runs the CPU.
#[derive(Args)]
struct SimOptions {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Maximum number of instructions per run
    #[arg(short = 'n', long, conflicts_with = "unbounded")]
    step_limit: Option<u64>,
    /// Run without a step limit (a self-jumping program never stops)
    #[arg(long)]
    unbounded: bool,
    /// Do not print an "Executing ..." line per instruction
    #[arg(short, long)]
    quiet: bool,
}

impl SimOptions {
    /// Load the config file (if any) and apply command-line overrides.
    fn resolve(&self) -> SimConfig {
        let mut config = match &self.config {
            Some(path) => match SimConfig::load(path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("❌ {}", e);
                    std::process::exit(1);
                }
            },
            None => SimConfig::default(),
        };

        if let Some(limit) = self.step_limit {
            config.step_limit = Some(limit);
        }
        if self.unbounded {
            config.step_limit = None;
        }
        if self.quiet {
            config.trace = false;
        }
        config
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Shell { options }) => {
            let config = options.resolve();
            init_logging(&config.log_filter);
            run_shell(&config);
        }
        Some(Commands::Run { bytes, options, json }) => {
            let config = options.resolve();
            init_logging(&config.log_filter);
            run_program(&bytes, &config, json);
        }
        Some(Commands::Debug { bytes, options }) => {
            // Log lines on stderr would tear the TUI, so only RUST_LOG enables them.
            let config = options.resolve();
            init_logging("off");
            debug_program(&bytes, &config);
        }
        Some(Commands::Test) => {
            init_logging(&SimConfig::default().log_filter);
            run_self_test();
        }
        None => {
            let config = SimConfig::default();
            init_logging(&config.log_filter);
            run_shell(&config);
        }
    }
}

/// Install a stderr `tracing` subscriber. `RUST_LOG` wins over `default_filter`.
fn init_logging(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Parse program bytes from the command line, exiting on the first bad one.
fn parse_program(tokens: &[String]) -> Vec<u8> {
    use nibble::shell::parse_number;
    use nibble::cpu::MEMORY_SIZE;

    if tokens.len() > MEMORY_SIZE {
        eprintln!("❌ Program has {} bytes; memory holds {}", tokens.len(), MEMORY_SIZE);
        std::process::exit(1);
    }

    tokens
        .iter()
        .map(|token| match parse_number(token).map(u8::try_from) {
            Some(Ok(byte)) => byte,
            _ => {
                eprintln!("❌ Invalid byte '{}' (expected 0-255)", token);
                std::process::exit(1);
            }
        })
        .collect()
}

fn run_shell(config: &SimConfig) {
    use nibble::{Cpu, shell};

    println!("Nibble CPU - type 'help' for commands.");

    let mut cpu = Cpu::new();
    if let Err(e) = shell::run_stdio(&mut cpu, config) {
        eprintln!("❌ I/O error: {}", e);
        std::process::exit(1);
    }
}

fn run_program(tokens: &[String], config: &SimConfig, json: bool) {
    use nibble::{Cpu, Diagnostic};

    let program = parse_program(tokens);
    let mut cpu = Cpu::new();
    if let Err(e) = cpu.load_program(&program) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }

    let trace = config.trace && !json;
    let mut sink = |d: Diagnostic| {
        if trace {
            println!("{:02}: {}", d.pc(), d);
        } else if d.is_fault() {
            eprintln!("⚠️  PC={:02}: {}", d.pc(), d);
        }
    };

    let (steps, completed) = match config.step_limit {
        Some(limit) => {
            let outcome = cpu.run_limited(limit, &mut sink);
            (outcome.steps, outcome.completed)
        }
        None => (cpu.run(&mut sink), true),
    };

    if json {
        match serde_json::to_string_pretty(&cpu) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Failed to serialize state: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Steps: {}", steps);
    for (i, value) in cpu.regs.values().iter().enumerate() {
        println!("R{}: {:>3}  (0x{:02X})", i, value, value);
    }
    println!("Flags: {} (zero={})", cpu.flags(), cpu.zero_flag());
    println!("PC: {}   IR: 0x{:02X}", cpu.pc(), cpu.ir());

    if !completed {
        println!();
        println!("⚠️  Reached step limit ({}). Use --step-limit to increase.", steps);
    }
}

#[cfg(feature = "tui")]
fn debug_program(tokens: &[String], config: &SimConfig) {
    let program = parse_program(tokens);

    if let Err(e) = nibble::run_debugger(program, config.step_limit) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_tokens: &[String], _config: &SimConfig) {
    eprintln!("❌ Built without the `tui` feature");
    std::process::exit(1);
}

fn run_self_test() {
    use nibble::{Cpu, CpuError, Diagnostic, NullSink};

    println!("━━━ Nibble CPU Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;
    let mut check = |name: &str, ok: bool| {
        if ok {
            println!("{}... ✓", name);
            passed += 1;
        } else {
            println!("{}... ✗", name);
            failed += 1;
        }
    };

    // LOAD 5, LOAD 7, ADD
    let mut cpu = Cpu::new();
    let _ = cpu.load_program(&[0x01, 0x00, 0x05, 0x01, 0x01, 0x07, 0x02, 0x00, 0x01]);
    cpu.run(&mut NullSink);
    check(
        "LOAD/LOAD/ADD program",
        cpu.read_register(0) == Ok(12) && cpu.read_register(1) == Ok(0) && cpu.flags() == 0 && cpu.pc() == 16,
    );

    // Wrapping subtraction to zero
    let mut cpu = Cpu::new();
    let _ = cpu.load(2, 200);
    let _ = cpu.load(3, 200);
    check("SUB sets zero flag", cpu.subtract(2, 3) == Ok(0) && cpu.zero_flag());

    // Wrapping addition
    let mut cpu = Cpu::new();
    let _ = cpu.load(0, 250);
    let _ = cpu.load(1, 10);
    check("ADD wraps modulo 256", cpu.add(0, 1) == Ok(4) && !cpu.zero_flag());

    // Invalid register
    let mut cpu = Cpu::new();
    check(
        "LOAD to R5 rejected",
        cpu.load(5, 10) == Err(CpuError::InvalidRegister(5)) && cpu.regs.values() == &[0; 4],
    );

    // Jump bounds
    let mut cpu = Cpu::new();
    let in_range = cpu.jump(9).is_ok() && cpu.pc() == 9;
    let out_of_range = cpu.jump(16) == Err(CpuError::InvalidAddress(16)) && cpu.pc() == 9;
    check("JUMP bounds", in_range && out_of_range);

    // Self-jump under a budget
    let mut cpu = Cpu::new();
    let _ = cpu.load_program(&[0x04, 0x00]);
    let outcome = cpu.run_limited(50, &mut NullSink);
    check("JUMP 0 livelock bounded", !outcome.completed && outcome.steps == 50 && cpu.pc() == 0);

    // Operand past end of memory
    let mut cpu = Cpu::new();
    let _ = cpu.write_memory(15, 0x01);
    let _ = cpu.jump(15);
    let mut faults = 0;
    cpu.run(&mut |d: Diagnostic| if d.is_fault() { faults += 1 });
    check("Operand fetch past end faults", faults == 1 && cpu.is_finished());

    // Reset
    let mut cpu = Cpu::new();
    let _ = cpu.load_program(&[0x01, 0x03, 0xFF]);
    cpu.run(&mut NullSink);
    cpu.reset();
    check("Reset zeroes state", cpu == Cpu::new());

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
