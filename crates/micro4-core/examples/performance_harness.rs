//! Throughput harness for the Micro4 core.
//!
//! ```sh
//! cargo run -p micro4-core --release --example performance_harness
//! ```
//!
//! Reports instructions and cycles per second for an endless counting loop,
//! stepped directly and through controller ticks.

#![allow(clippy::pedantic)]

use micro4_core::{Command, Controller, ControllerConfig, Cpu};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

use std::time::{Duration, Instant};

/// `LDI 1; ADD 0x40; STA 0x40; JMP 0x02`
const LOOP: [u8; 14] = [
    0x7, 0x1, 0x3, 0x0, 0x4, 0x0, 0x2, 0x0, 0x4, 0x0, 0x5, 0x0, 0x0, 0x2,
];
const MEASURE_FOR: Duration = Duration::from_secs(2);

fn measure_direct() -> (u64, u64, Duration) {
    let mut cpu = Cpu::default();
    cpu.load_program(&LOOP, 0);
    let start = Instant::now();
    while start.elapsed() < MEASURE_FOR {
        for _ in 0..10_000 {
            cpu.step();
        }
    }
    (cpu.instruction_count(), cpu.cycle_count(), start.elapsed())
}

fn measure_controller() -> (u64, Duration) {
    let mut controller = Controller::new(ControllerConfig::default());
    controller.boot();
    controller.handle(Command::LoadProgram {
        words: LOOP.to_vec(),
        start: 0,
    });
    controller.handle(Command::Run { speed: 0 });
    let start = Instant::now();
    while start.elapsed() < MEASURE_FOR {
        controller.tick();
    }
    (controller.cpu().instruction_count(), start.elapsed())
}

fn main() {
    let (instructions, cycles, elapsed) = measure_direct();
    let secs = elapsed.as_secs_f64();
    println!(
        "direct:     {:>12.0} instr/s {:>12.0} cycles/s",
        instructions as f64 / secs,
        cycles as f64 / secs
    );

    let (instructions, elapsed) = measure_controller();
    println!(
        "controller: {:>12.0} instr/s (snapshot per tick included)",
        instructions as f64 / elapsed.as_secs_f64()
    );
}
