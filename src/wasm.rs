//! WebAssembly bindings.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.

use wasm_bindgen::prelude::*;
use crate::cpu::{Cpu, Diagnostic, MEMORY_SIZE};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly CPU wrapper.
#[wasm_bindgen]
pub struct WasmCpu {
    cpu: Cpu,
    program: Vec<u8>,
}

#[wasm_bindgen]
impl WasmCpu {
    /// Create a new CPU instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            program: Vec::new(),
        }
    }

    /// Load program bytes at address 0 and reset everything else.
    #[wasm_bindgen]
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), JsError> {
        self.cpu.reset();
        self.cpu.load_program(bytes)
            .map_err(|e| JsError::new(&e.to_string()))?;
        self.program = bytes.to_vec();
        Ok(())
    }

    #[wasm_bindgen]
    pub fn write_memory(&mut self, addr: usize, value: u8) -> Result<(), JsError> {
        self.cpu.write_memory(addr, value)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    #[wasm_bindgen]
    pub fn read_memory(&self, addr: usize) -> Result<u8, JsError> {
        self.cpu.read_memory(addr)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    #[wasm_bindgen]
    pub fn register(&self, reg: u8) -> Result<u8, JsError> {
        self.cpu.read_register(reg)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Step one instruction. Returns the executed instruction as text.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        if self.cpu.is_finished() {
            return Err(JsError::new("program finished"));
        }

        let instr = self.cpu.step()
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(instr.to_string())
    }

    /// Run for at most `max_steps` instructions. Returns the console lines
    /// the run produced.
    #[wasm_bindgen]
    pub fn run(&mut self, max_steps: u32) -> Vec<String> {
        let mut lines = Vec::new();
        let _ = self.cpu.run_limited(max_steps as u64, &mut |d: Diagnostic| lines.push(d.to_string()));
        lines
    }

    /// Reset CPU to initial state with loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.cpu.reset();
        let _ = self.cpu.load_program(&self.program);
    }

    #[wasm_bindgen]
    pub fn is_finished(&self) -> bool {
        self.cpu.is_finished()
    }

    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles
    }

    #[wasm_bindgen]
    pub fn pc(&self) -> usize {
        self.cpu.pc()
    }

    #[wasm_bindgen]
    pub fn ir(&self) -> u8 {
        self.cpu.ir()
    }

    #[wasm_bindgen]
    pub fn flags(&self) -> u8 {
        self.cpu.flags()
    }

    /// All memory cells.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Vec<u8> {
        self.cpu.mem.cells().to_vec()
    }

    /// Full CPU state as a JSON string.
    #[wasm_bindgen]
    pub fn state_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu)
            .map_err(|e| JsError::new(&e.to_string()))
    }
}

impl Default for WasmCpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of memory cells, for sizing views in JS.
#[wasm_bindgen]
pub fn memory_size() -> usize {
    MEMORY_SIZE
}
