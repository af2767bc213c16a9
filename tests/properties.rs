//! Algebraic properties of the CPU core.

use nibble::cpu::{Cpu, CpuError, Diagnostic, NullSink, MEMORY_SIZE, REGISTER_COUNT};
use proptest::prelude::*;

fn reg() -> impl Strategy<Value = u8> {
    0..REGISTER_COUNT as u8
}

/// Two distinct register indices.
fn reg_pair() -> impl Strategy<Value = (u8, u8)> {
    (reg(), reg()).prop_filter("distinct registers", |(a, b)| a != b)
}

proptest! {
    #[test]
    fn add_wraps_and_clears_second((r1, r2) in reg_pair(), a: u8, b: u8) {
        let mut cpu = Cpu::new();
        cpu.load(r1, a).unwrap();
        cpu.load(r2, b).unwrap();

        cpu.add(r1, r2).unwrap();

        let expected = a.wrapping_add(b);
        prop_assert_eq!(cpu.read_register(r1), Ok(expected));
        prop_assert_eq!(cpu.read_register(r2), Ok(0));
        prop_assert_eq!(cpu.zero_flag(), expected == 0);
        prop_assert_eq!(cpu.flags(), u8::from(expected == 0));
    }

    #[test]
    fn subtract_wraps_and_clears_second((r1, r2) in reg_pair(), a: u8, b: u8) {
        let mut cpu = Cpu::new();
        cpu.load(r1, a).unwrap();
        cpu.load(r2, b).unwrap();

        cpu.subtract(r1, r2).unwrap();

        let expected = a.wrapping_sub(b);
        prop_assert_eq!(cpu.read_register(r1), Ok(expected));
        prop_assert_eq!(cpu.read_register(r2), Ok(0));
        prop_assert_eq!(cpu.zero_flag(), expected == 0);
    }

    #[test]
    fn arithmetic_leaves_other_registers_alone((r1, r2) in reg_pair(), values: [u8; 4]) {
        let mut cpu = Cpu::new();
        for (i, v) in values.iter().enumerate() {
            cpu.load(i as u8, *v).unwrap();
        }

        cpu.add(r1, r2).unwrap();

        for i in 0..REGISTER_COUNT as u8 {
            if i != r1 && i != r2 {
                prop_assert_eq!(cpu.read_register(i), Ok(values[i as usize]));
            }
        }
    }

    #[test]
    fn memory_write_read_round_trip(addr in 0..MEMORY_SIZE, value: u8) {
        let mut cpu = Cpu::new();
        cpu.write_memory(addr, value).unwrap();
        prop_assert_eq!(cpu.read_memory(addr), Ok(value));
    }

    #[test]
    fn memory_write_out_of_range_rejected(addr in MEMORY_SIZE..1024usize, value: u8) {
        let mut cpu = Cpu::new();
        prop_assert_eq!(cpu.write_memory(addr, value), Err(CpuError::InvalidAddress(addr)));
        prop_assert_eq!(cpu, Cpu::new());
    }

    #[test]
    fn jump_in_range_sets_pc(addr in 0..MEMORY_SIZE) {
        let mut cpu = Cpu::new();
        cpu.jump(addr).unwrap();
        prop_assert_eq!(cpu.pc(), addr);
    }

    #[test]
    fn jump_out_of_range_keeps_pc(start in 0..MEMORY_SIZE, addr in MEMORY_SIZE..=255usize) {
        let mut cpu = Cpu::new();
        cpu.jump(start).unwrap();
        prop_assert_eq!(cpu.jump(addr), Err(CpuError::InvalidAddress(addr)));
        prop_assert_eq!(cpu.pc(), start);
    }

    #[test]
    fn load_invalid_register_is_noop(reg in 4u8..=255, value: u8, initial: [u8; 4]) {
        let mut cpu = Cpu::new();
        for (i, v) in initial.iter().enumerate() {
            cpu.load(i as u8, *v).unwrap();
        }

        prop_assert_eq!(cpu.load(reg, value), Err(CpuError::InvalidRegister(reg)));
        prop_assert_eq!(cpu.regs.values(), &initial);
    }

    #[test]
    fn reset_zeroes_any_state(program: [u8; 16], budget in 0u64..64) {
        let mut cpu = Cpu::new();
        cpu.load_program(&program).unwrap();
        cpu.run_limited(budget, &mut NullSink);

        cpu.reset();

        prop_assert_eq!(cpu.pc(), 0);
        prop_assert_eq!(cpu.ir(), 0);
        prop_assert_eq!(cpu.flags(), 0);
        prop_assert_eq!(cpu.regs.values(), &[0; 4]);
        prop_assert_eq!(cpu.mem.cells(), &[0; MEMORY_SIZE]);
        prop_assert_eq!(cpu, Cpu::new());
    }

    /// Any program either runs off the end or keeps executing within its
    /// budget; faults never stop the machine.
    #[test]
    fn bounded_run_always_returns(program: [u8; 16]) {
        let mut cpu = Cpu::new();
        cpu.load_program(&program).unwrap();

        let mut reported = 0u64;
        let outcome = cpu.run_limited(500, &mut |d: Diagnostic| {
            if !d.is_fault() {
                reported += 1;
            }
        });

        prop_assert!(outcome.steps <= 500);
        prop_assert!(reported <= outcome.steps);
        prop_assert_eq!(outcome.completed, cpu.is_finished());
        if !outcome.completed {
            prop_assert_eq!(outcome.steps, 500);
        }
    }
}

#[test]
fn scenario_load_load_add() {
    let mut cpu = Cpu::new();
    cpu.load_program(&[0x01, 0x00, 0x05, 0x01, 0x01, 0x07, 0x02, 0x00, 0x01, 0x00]).unwrap();

    cpu.run(&mut NullSink);

    assert_eq!(cpu.read_register(0), Ok(12));
    assert_eq!(cpu.read_register(1), Ok(0));
    assert_eq!(cpu.flags(), 0);
    assert_eq!(cpu.pc(), 16);
}

#[test]
fn scenario_jump_to_self_never_finishes() {
    let mut cpu = Cpu::new();
    cpu.write_memory(0, 0x04).unwrap();
    cpu.write_memory(1, 0x00).unwrap();

    cpu.step().unwrap();
    assert_eq!(cpu.pc(), 0);

    let outcome = cpu.run_limited(1_000, &mut NullSink);
    assert!(!outcome.completed);
    assert_eq!(outcome.steps, 1_000);
    assert_eq!(cpu.pc(), 0);
}

#[test]
fn scenario_load_invalid_register() {
    let mut cpu = Cpu::new();
    cpu.load(0, 1).unwrap();
    cpu.load(3, 2).unwrap();

    assert_eq!(cpu.load(5, 10), Err(CpuError::InvalidRegister(5)));
    assert_eq!(cpu.regs.values(), &[1, 0, 0, 2]);
}
