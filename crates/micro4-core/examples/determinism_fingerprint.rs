//! Deterministic execution fingerprint used for cross-host comparison.
//!
//! Runs a fixed program through the controller and hashes every emitted
//! state. Two hosts agree when they print the same fingerprint.

use micro4_core::{Command, Controller, ControllerConfig, Event};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

/// Counts cell 0x40 down from 9 to 0, then halts.
const COUNTDOWN: [u8; 34] = [
    0x7, 0x9, // 0x00 LDI 9
    0x2, 0x0, 0x4, 0x0, // 0x02 STA 0x40
    0x7, 0x1, // 0x06 LDI 1
    0x2, 0x0, 0x4, 0x1, // 0x08 STA 0x41
    0x1, 0x0, 0x4, 0x0, // 0x0C LDA 0x40
    0x4, 0x0, 0x4, 0x1, // 0x10 SUB 0x41
    0x2, 0x0, 0x4, 0x0, // 0x14 STA 0x40
    0x6, 0x0, 0x2, 0x0, // 0x18 JZ 0x20
    0x5, 0x0, 0x0, 0xC, // 0x1C JMP 0x0C
    0x0, 0x0, // 0x20 HLT
];

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn fingerprint() -> String {
    let mut controller = Controller::new(ControllerConfig::default());
    let mut events = controller.boot();
    events.extend(controller.handle(Command::LoadProgram {
        words: COUNTDOWN.to_vec(),
        start: 0,
    }));
    events.extend(controller.handle(Command::AddBreakpoint { address: 0x10 }));

    while !controller.cpu().is_halted() {
        events.extend(controller.handle(Command::Run { speed: 3 }));
        while controller.is_running() {
            events.extend(controller.tick());
        }
    }
    let hits = events
        .iter()
        .filter(|event| matches!(event, Event::BreakpointHit { .. }))
        .count();

    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    for event in &events {
        if let Some(state) = event.state() {
            hash_bytes(&mut hash, &[state.pc, state.accumulator, state.ir]);
            hash_bytes(&mut hash, &state.instruction_count.to_le_bytes());
            hash_bytes(&mut hash, &state.memory);
        }
    }
    format!("{hash:016x} events={} breakpoint_hits={hits}", events.len())
}

fn main() {
    println!("{}", fingerprint());
}
