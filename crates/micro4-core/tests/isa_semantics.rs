//! Instruction-set semantics: reference programs, halting, bounds and reset.

use micro4_core::{Cpu, CpuConfig, FaultCode, RunState, MEMORY_CELLS};
use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

/// `LDI 5; STA 0x20; LDA 0x20; HLT`
const STORE_AND_RELOAD: [u8; 12] = [0x7, 0x5, 0x2, 0x0, 0x2, 0x0, 0x1, 0x0, 0x2, 0x0, 0x0, 0x0];

fn loaded(program: &[u8]) -> Cpu {
    let mut cpu = Cpu::default();
    cpu.init();
    cpu.load_program(program, 0);
    cpu
}

#[test]
fn store_and_reload_program_halts_after_four_instructions() {
    let mut cpu = loaded(&STORE_AND_RELOAD);
    for _ in 0..4 {
        assert!(cpu.step() > 0);
    }

    assert_eq!(cpu.accumulator(), 5);
    assert_eq!(cpu.read_memory(0x20), Some(5));
    assert!(cpu.is_halted());
    assert!(!cpu.is_errored());
    assert_eq!(cpu.instruction_count(), 4);
    assert_eq!(cpu.cycle_count(), 3 + 5 + 5 + 3);
    assert_eq!(cpu.step(), 0);
    assert_eq!(cpu.instruction_count(), 4);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(5)]
#[case(17)]
fn halt_is_reached_after_exactly_the_preceding_instructions(#[case] preceding: usize) {
    let mut program = Vec::new();
    for i in 0..preceding {
        program.extend_from_slice(&[0x7, u8::try_from(i % 16).expect("nibble")]);
    }
    program.extend_from_slice(&[0x0, 0x0]);
    let mut cpu = loaded(&program);

    for _ in 0..preceding {
        cpu.step();
        assert!(!cpu.is_halted());
    }
    cpu.step();
    assert!(cpu.is_halted());
    assert_eq!(
        cpu.instruction_count(),
        u64::try_from(preceding).expect("count") + 1
    );
}

#[test]
fn load_program_masks_words_and_leaves_pc_alone() {
    let mut cpu = loaded(&[0x7, 0x1]);
    cpu.step();
    let pc = cpu.pc();

    let written = cpu.load_program(&[0xF7, 0x13], 0xFF);
    assert_eq!(written, 1);
    assert_eq!(cpu.read_memory(0xFF), Some(0x7));
    assert_eq!(cpu.pc(), pc);
}

#[test]
fn jump_past_configured_memory_errors_without_corruption() {
    let mut cpu = Cpu::new(CpuConfig { memory_cells: 128 });
    // LDI 6; JMP 0x90
    cpu.load_program(&[0x7, 0x6, 0x5, 0x0, 0x9, 0x0], 0);
    cpu.step();
    let memory_before = cpu.memory();
    let registers_before = cpu.registers();

    assert_eq!(cpu.step(), 0);
    assert!(cpu.is_errored());
    assert!(cpu.is_halted());
    assert_eq!(cpu.memory(), memory_before);
    assert_eq!(cpu.registers(), registers_before);
    assert_eq!(
        cpu.fault(),
        Some(FaultCode::AddressOutOfBounds {
            address: 0x90,
            pc: 0x02
        })
    );
}

#[test]
fn store_past_configured_memory_errors_without_write() {
    let mut cpu = Cpu::new(CpuConfig { memory_cells: 64 });
    cpu.load_program(&[0x7, 0x3, 0x2, 0x0, 0x4, 0x0], 0);
    cpu.step();
    cpu.step();
    assert!(cpu.is_errored());
    assert_eq!(cpu.memory().len(), 64);
    assert!(cpu.memory()[6..].iter().all(|cell| *cell == 0));
}

#[test]
fn running_off_the_end_of_memory_is_a_fetch_fault() {
    let mut cpu = Cpu::default();
    // JMP 0xFE, where a lone LDA opcode cannot fit its address.
    cpu.load_program(&[0x5, 0x0, 0xF, 0xE], 0);
    cpu.load_program(&[0x1, 0x0], 0xFE);
    cpu.step();
    assert_eq!(cpu.pc(), 0xFE);
    cpu.step();
    assert_eq!(
        cpu.run_state(),
        RunState::Errored(FaultCode::PcOutOfBounds { pc: 0xFE })
    );
    assert_eq!(
        cpu.error_message().as_deref(),
        Some("PC out of bounds: 0xFE")
    );
}

#[test]
fn reset_clears_memory_as_well_as_registers() {
    let mut cpu = loaded(&STORE_AND_RELOAD);
    cpu.run(0);
    assert!(cpu.is_halted());

    cpu.reset();
    assert_eq!(cpu.run_state(), RunState::Ready);
    assert_eq!(cpu.pc(), 0);
    assert_eq!(cpu.accumulator(), 0);
    assert!(!cpu.zero_flag());
    assert_eq!(cpu.memory(), vec![0; MEMORY_CELLS]);
    assert_eq!(cpu.snapshot().error_message, None);
}

#[test]
fn halted_core_resumes_only_after_reset_and_reload() {
    let mut cpu = loaded(&STORE_AND_RELOAD);
    cpu.run(0);
    assert_eq!(cpu.run(0), 0);

    cpu.reset();
    cpu.load_program(&STORE_AND_RELOAD, 0);
    assert_eq!(cpu.run(0), 16);
}

proptest! {
    #[test]
    fn identical_programs_produce_identical_state_sequences(
        program in proptest::collection::vec(0u8..16, 0..64),
        steps in 1usize..64,
    ) {
        let mut first = loaded(&program);
        let mut second = loaded(&program);
        for _ in 0..steps {
            prop_assert_eq!(first.step(), second.step());
            prop_assert_eq!(first.snapshot(), second.snapshot());
        }
    }

    #[test]
    fn arbitrary_memory_never_panics_and_respects_state_machine(
        image in proptest::collection::vec(any::<u8>(), MEMORY_CELLS),
        steps in 1usize..200,
    ) {
        let mut cpu = loaded(&image);
        for _ in 0..steps {
            let before = cpu.instruction_count();
            let cycles = cpu.step();
            if cycles == 0 {
                prop_assert!(cpu.is_halted());
                prop_assert_eq!(cpu.instruction_count(), before);
            } else {
                prop_assert_eq!(cpu.instruction_count(), before + 1);
            }
            prop_assert!(cpu.accumulator() <= 0xF);
            prop_assert!(!cpu.is_errored() || cpu.is_halted());
        }
    }
}
