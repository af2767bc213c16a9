//! CPU execution engine.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::cpu::{Memory, Registers};
use crate::cpu::decode::{self, DecodeError, Instruction, Opcode};
use crate::cpu::diagnostic::{Diagnostic, DiagnosticSink, NullSink};
use crate::cpu::memory::{MemoryError, MEMORY_SIZE};
use crate::cpu::registers::RegisterError;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Result of a bounded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Instructions executed (including faulting ones).
    pub steps: u64,
    /// True when PC ran off the end of memory; false when the budget ran out.
    pub completed: bool,
}

/// The CPU: memory, registers, program counter and instruction register.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Program counter. Not clamped: it may run past the end of memory,
    /// which is how a program finishes.
    pc: usize,
    /// Instruction register: the last fetched opcode.
    ir: u8,
    /// Instruction count since creation or reset.
    pub cycles: u64,
    /// Last decoded instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a new CPU with zeroed state.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            pc: 0,
            ir: 0,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Reset memory, registers, flags, PC and IR to zero.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.pc = 0;
        self.ir = 0;
        self.cycles = 0;
        self.last_instr = None;
        debug!("cpu reset");
    }

    /// Load a program into memory at address 0.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), MemoryError> {
        self.mem.load_program(0, program)
    }

    /// Read a memory cell.
    pub fn read_memory(&self, addr: usize) -> Result<u8, CpuError> {
        self.mem.read(addr).map_err(|_| CpuError::InvalidAddress(addr))
    }

    /// Write a memory cell. Addresses outside 0-15 are rejected untouched.
    pub fn write_memory(&mut self, addr: usize, value: u8) -> Result<(), CpuError> {
        self.mem.write(addr, value).map_err(|_| CpuError::InvalidAddress(addr))
    }

    /// Read a general purpose register.
    pub fn read_register(&self, reg: u8) -> Result<u8, CpuError> {
        Ok(self.regs.get(reg)?)
    }

    /// LOAD `value` into `reg`.
    pub fn load(&mut self, reg: u8, value: u8) -> Result<(), CpuError> {
        Ok(self.regs.load(reg, value)?)
    }

    /// ADD `reg2` into `reg1`, clearing `reg2`.
    pub fn add(&mut self, reg1: u8, reg2: u8) -> Result<u8, CpuError> {
        Ok(self.regs.add(reg1, reg2)?)
    }

    /// SUB `reg2` from `reg1`, clearing `reg2`.
    pub fn subtract(&mut self, reg1: u8, reg2: u8) -> Result<u8, CpuError> {
        Ok(self.regs.subtract(reg1, reg2)?)
    }

    /// Set the program counter. Out of range targets leave PC unchanged.
    pub fn jump(&mut self, address: usize) -> Result<(), CpuError> {
        if address >= MEMORY_SIZE {
            return Err(CpuError::InvalidAddress(address));
        }
        self.pc = address;
        Ok(())
    }

    /// Fetch the opcode at PC into the instruction register.
    pub fn fetch(&mut self) -> Result<u8, CpuError> {
        self.ir = self.mem.read(self.pc)?;
        Ok(self.ir)
    }

    /// Decode the opcode held in IR and execute it.
    ///
    /// Faults are never fatal: PC has already been moved past the
    /// instruction (except for a rejected JUMP) when an error is returned.
    pub fn decode_and_execute(&mut self) -> Result<Instruction, CpuError> {
        self.dispatch(&mut NullSink)
    }

    /// Fetch and execute a single instruction.
    ///
    /// Returns the instruction that was executed, or the fault it raised.
    pub fn step(&mut self) -> Result<Instruction, CpuError> {
        self.fetch()?;
        self.decode_and_execute()
    }

    /// Run until PC reaches the end of memory.
    ///
    /// There is no halt instruction, so a program that jumps backwards
    /// forever never returns; see [`Cpu::run_limited`].
    /// Returns the number of instructions executed.
    pub fn run<S: DiagnosticSink + ?Sized>(&mut self, sink: &mut S) -> u64 {
        let start_cycles = self.cycles;

        while !self.is_finished() {
            self.cycle(sink);
        }

        let steps = self.cycles - start_cycles;
        info!(steps, "run finished");
        steps
    }

    /// Run for at most `max_steps` instructions.
    pub fn run_limited<S: DiagnosticSink + ?Sized>(&mut self, max_steps: u64, sink: &mut S) -> RunOutcome {
        let start_cycles = self.cycles;
        let limit = self.cycles.saturating_add(max_steps);

        while !self.is_finished() && self.cycles < limit {
            self.cycle(sink);
        }

        let outcome = RunOutcome {
            steps: self.cycles - start_cycles,
            completed: self.is_finished(),
        };
        if outcome.completed {
            info!(steps = outcome.steps, "run finished");
        } else {
            warn!(steps = outcome.steps, pc = self.pc, "step budget exhausted");
        }
        outcome
    }

    /// One fetch plus decode/execute, reporting to `sink`.
    fn cycle<S: DiagnosticSink + ?Sized>(&mut self, sink: &mut S) {
        let pc = self.pc;
        if let Err(error) = self.fetch() {
            sink.report(Diagnostic::Fault { pc, error });
            return;
        }
        // Faults are already reported by dispatch.
        let _ = self.dispatch(sink);
    }

    fn dispatch<S: DiagnosticSink + ?Sized>(&mut self, sink: &mut S) -> Result<Instruction, CpuError> {
        let pc = self.pc;
        let opcode = self.ir;
        self.cycles += 1;

        let instruction = match decode::decode(&self.mem, pc, opcode) {
            Ok(instruction) => instruction,
            Err(e) => {
                // Skip the whole encoding so the run keeps moving forward.
                self.pc = pc + Opcode::length(opcode);
                let error = CpuError::from(e);
                warn!(pc, %error, "decode fault");
                sink.report(Diagnostic::Fault { pc, error });
                return Err(error);
            }
        };

        debug!(pc, %instruction, "execute");
        sink.report(Diagnostic::Executing { pc, instruction });
        self.last_instr = Some(instruction);

        if let Err(error) = self.execute(instruction) {
            warn!(pc, %error, "execute fault");
            sink.report(Diagnostic::Fault { pc, error });
            return Err(error);
        }

        Ok(instruction)
    }

    /// Execute a decoded instruction whose opcode sits at PC.
    fn execute(&mut self, instr: Instruction) -> Result<(), CpuError> {
        if let Instruction::Jump { address } = instr {
            // No auto-advance: the target becomes the new PC.
            return self.jump(address as usize);
        }

        self.pc += instr.encoded_len();
        match instr {
            Instruction::Noop | Instruction::Jump { .. } => {}
            Instruction::Load { reg, value } => self.regs.load(reg, value)?,
            Instruction::Add { reg1, reg2 } => {
                self.regs.add(reg1, reg2)?;
            }
            Instruction::Sub { reg1, reg2 } => {
                self.regs.subtract(reg1, reg2)?;
            }
        }

        Ok(())
    }

    /// Program counter.
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Instruction register.
    pub fn ir(&self) -> u8 {
        self.ir
    }

    /// The flags byte (0 or 1).
    pub fn flags(&self) -> u8 {
        self.regs.flags()
    }

    pub fn zero_flag(&self) -> bool {
        self.regs.zero()
    }

    /// Get the last decoded instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// True once PC has run off the end of memory.
    pub fn is_finished(&self) -> bool {
        self.pc >= MEMORY_SIZE
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("pc", &self.pc)
            .field("ir", &format_args!("0x{:02X}", self.ir))
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("mem", &self.mem)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
///
/// None of these is fatal; the CPU stays usable after any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CpuError {
    #[error("Invalid Register: R{0}")]
    InvalidRegister(u8),

    #[error("Invalid Address: {0}")]
    InvalidAddress(usize),

    #[error("Unknown instruction 0x{0:02X}")]
    UnknownInstruction(u8),

    #[error("Memory fault: {0}")]
    Memory(#[from] MemoryError),
}

impl From<RegisterError> for CpuError {
    fn from(e: RegisterError) -> Self {
        match e {
            RegisterError::InvalidRegister(reg) => CpuError::InvalidRegister(reg),
        }
    }
}

impl From<DecodeError> for CpuError {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::UnknownOpcode(op) => CpuError::UnknownInstruction(op),
            DecodeError::Operand { source, .. } => CpuError::Memory(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::encode_program;

    fn cpu_with(program: &[u8]) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.load_program(program).unwrap();
        cpu
    }

    fn run_collecting(cpu: &mut Cpu) -> Vec<Diagnostic> {
        let mut seen = Vec::new();
        cpu.run(&mut |d: Diagnostic| seen.push(d));
        seen
    }

    #[test]
    fn test_empty_memory_runs_off_the_end() {
        let mut cpu = Cpu::new();

        let executed = cpu.run(&mut NullSink);

        assert_eq!(executed, 16);
        assert_eq!(cpu.pc(), 16);
        assert!(cpu.is_finished());
    }

    #[test]
    fn test_load_add_program() {
        let mut cpu = cpu_with(&[0x01, 0x00, 0x05, 0x01, 0x01, 0x07, 0x02, 0x00, 0x01]);

        let seen = run_collecting(&mut cpu);

        assert_eq!(cpu.read_register(0), Ok(12));
        assert_eq!(cpu.read_register(1), Ok(0));
        assert_eq!(cpu.flags(), 0);
        assert_eq!(cpu.pc(), 16);
        // Three 3-byte instructions, then NOOPs from byte 9 to 15.
        assert_eq!(seen.len(), 3 + 7);
        assert_eq!(seen[0].to_string(), "Executing LOAD");
        assert_eq!(seen[2].to_string(), "Executing ADD");
        assert!(seen.iter().all(|d| !d.is_fault()));
    }

    #[test]
    fn test_subtract_to_zero_sets_flag() {
        let program = encode_program(&[
            Instruction::Load { reg: 2, value: 9 },
            Instruction::Load { reg: 3, value: 9 },
            Instruction::Sub { reg1: 2, reg2: 3 },
        ]);
        let mut cpu = cpu_with(&program);

        cpu.run(&mut NullSink);

        assert!(cpu.zero_flag());
        assert_eq!(cpu.regs.values(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_step_advances_pc() {
        let mut cpu = cpu_with(&[0x00, 0x01, 0x03, 0x04, 0x04, 0x0A]);

        assert_eq!(cpu.step(), Ok(Instruction::Noop));
        assert_eq!(cpu.pc(), 1);
        assert_eq!(cpu.ir(), 0x00);

        assert_eq!(cpu.step(), Ok(Instruction::Load { reg: 3, value: 4 }));
        assert_eq!(cpu.pc(), 4);
        assert_eq!(cpu.ir(), 0x01);
        assert_eq!(cpu.read_register(3), Ok(4));

        assert_eq!(cpu.step(), Ok(Instruction::Jump { address: 10 }));
        assert_eq!(cpu.pc(), 10);
        assert_eq!(cpu.last_instruction(), Some(Instruction::Jump { address: 10 }));
    }

    #[test]
    fn test_jump() {
        let mut cpu = Cpu::new();

        cpu.jump(15).unwrap();
        assert_eq!(cpu.pc(), 15);

        assert_eq!(cpu.jump(16), Err(CpuError::InvalidAddress(16)));
        assert_eq!(cpu.pc(), 15);
    }

    #[test]
    fn test_self_jump_livelocks_under_budget() {
        let mut cpu = cpu_with(&[0x04, 0x00]);

        let outcome = cpu.run_limited(100, &mut NullSink);

        assert_eq!(outcome, RunOutcome { steps: 100, completed: false });
        assert_eq!(cpu.pc(), 0);
    }

    #[test]
    fn test_invalid_jump_target_keeps_pc() {
        let mut cpu = cpu_with(&[0x04, 0x20]);
        let mut seen = Vec::new();

        cpu.run_limited(3, &mut |d: Diagnostic| seen.push(d));

        assert_eq!(cpu.pc(), 0);
        assert!(seen.contains(&Diagnostic::Fault { pc: 0, error: CpuError::InvalidAddress(0x20) }));
    }

    #[test]
    fn test_invalid_register_is_reported_and_skipped() {
        let mut cpu = cpu_with(&[0x01, 0x05, 0x0A, 0x01, 0x00, 0x02]);

        let seen = run_collecting(&mut cpu);

        assert_eq!(seen[0], Diagnostic::Executing { pc: 0, instruction: Instruction::Load { reg: 5, value: 10 } });
        assert_eq!(seen[1], Diagnostic::Fault { pc: 0, error: CpuError::InvalidRegister(5) });
        assert_eq!(seen[1].to_string(), "Invalid Register: R5");
        assert_eq!(cpu.regs.values(), &[2, 0, 0, 0]);
        assert_eq!(cpu.pc(), 16);
    }

    #[test]
    fn test_unknown_instruction_advances_by_one() {
        let mut cpu = cpu_with(&[0x07, 0xFF]);

        assert_eq!(cpu.step(), Err(CpuError::UnknownInstruction(0x07)));
        assert_eq!(cpu.pc(), 1);
        assert_eq!(cpu.step(), Err(CpuError::UnknownInstruction(0xFF)));
        assert_eq!(cpu.pc(), 2);
        assert_eq!(cpu.cycles, 2);
    }

    #[test]
    fn test_operand_past_end_is_a_fault() {
        let mut cpu = Cpu::new();
        cpu.write_memory(14, 0x02).unwrap();
        cpu.write_memory(15, 0x00).unwrap();
        cpu.jump(14).unwrap();

        let seen = run_collecting(&mut cpu);

        assert_eq!(
            seen,
            vec![Diagnostic::Fault { pc: 14, error: CpuError::Memory(MemoryError::AddressOutOfRange(16)) }]
        );
        assert_eq!(cpu.pc(), 17);
        assert_eq!(cpu.regs.values(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_jump_operand_past_end_terminates() {
        let mut cpu = Cpu::new();
        cpu.write_memory(15, 0x04).unwrap();
        cpu.jump(15).unwrap();

        let outcome = cpu.run_limited(10, &mut NullSink);

        assert!(outcome.completed);
        assert_eq!(outcome.steps, 1);
        assert_eq!(cpu.pc(), 17);
    }

    #[test]
    fn test_fetch_past_end() {
        let mut cpu = Cpu::new();
        cpu.run(&mut NullSink);

        assert_eq!(cpu.fetch(), Err(CpuError::Memory(MemoryError::AddressOutOfRange(16))));
        assert_eq!(cpu.step(), Err(CpuError::Memory(MemoryError::AddressOutOfRange(16))));
    }

    #[test]
    fn test_write_memory_bounds() {
        let mut cpu = Cpu::new();

        assert_eq!(cpu.write_memory(3, 255), Ok(()));
        assert_eq!(cpu.read_memory(3), Ok(255));
        assert_eq!(cpu.write_memory(16, 1), Err(CpuError::InvalidAddress(16)));
        assert_eq!(cpu.read_memory(99), Err(CpuError::InvalidAddress(99)));
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let mut cpu = cpu_with(&[0x01, 0x00, 0x05, 0x01, 0x01, 0x05, 0x03, 0x00, 0x01]);
        cpu.run(&mut NullSink);
        assert!(cpu.zero_flag());

        cpu.reset();

        assert_eq!(cpu, Cpu::new());
        assert_eq!(cpu.pc(), 0);
        assert_eq!(cpu.ir(), 0);
        assert_eq!(cpu.flags(), 0);
        assert!(cpu.mem.cells().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_run_resumes_only_after_reset_or_jump() {
        let mut cpu = cpu_with(&[0x01, 0x00, 0x01]);
        cpu.run(&mut NullSink);

        // PC sits at the end of memory; running again does nothing.
        assert_eq!(cpu.run(&mut NullSink), 0);

        cpu.jump(0).unwrap();
        assert_eq!(cpu.run(&mut NullSink), 14);
    }

    #[test]
    fn test_error_messages_name_the_operand() {
        assert_eq!(CpuError::InvalidRegister(9).to_string(), "Invalid Register: R9");
        assert_eq!(CpuError::InvalidAddress(20).to_string(), "Invalid Address: 20");
        assert_eq!(CpuError::UnknownInstruction(0x0B).to_string(), "Unknown instruction 0x0B");
    }
}
