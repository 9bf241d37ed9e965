//! Settling, clocking and convergence behavior of the evaluation engine.

use circuit_sim::{compile, Bit, CircuitEngine, EngineConfig, EngineError};
use clap as _;
use micro4_core as _;
use proptest::prelude::*;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use tempfile as _;
use thiserror as _;
use tracing as _;
use tracing_subscriber as _;

const COUNTER: &str = "\
# 2-bit binary counter
wire q[1:0]; wire d[1:0]
not t0 (input: q[0]; output: d[0])
xor t1 (input: q[1], q[0]; output: d[1])
dff r (input: d; output: q)
";

fn engine_for(source: &str) -> CircuitEngine {
    let mut engine = CircuitEngine::default();
    engine
        .load_circuit(compile(source).expect("compiles"))
        .expect("valid");
    engine
}

fn q(engine: &CircuitEngine) -> Option<u64> {
    engine.wire_by_name("q").and_then(|wire| wire.value())
}

#[test]
fn counter_advances_once_per_cycle() {
    let mut engine = engine_for(COUNTER);
    engine.settle().expect("settles");
    assert_eq!(q(&engine), Some(0));

    for expected in [1, 2, 3, 0, 1] {
        let circuit = engine.step_cycle().expect("settles");
        assert!(circuit.stable);
        assert_eq!(q(&engine), Some(expected));
    }
    assert_eq!(engine.circuit().cycle, 5);
}

#[test]
fn settling_never_touches_flip_flops() {
    let mut engine = engine_for(COUNTER);
    for _ in 0..5 {
        engine.settle().expect("settles");
    }
    assert_eq!(q(&engine), Some(0));
    assert_eq!(engine.circuit().cycle, 0);
}

#[test]
fn clock_edge_marks_unstable_until_settled() {
    let mut engine = engine_for(COUNTER);
    engine.settle().expect("settles");
    engine.clock_edge();
    assert!(!engine.circuit().stable);
    // Stored values land on q only when settled.
    assert_eq!(q(&engine), Some(0));
    engine.settle().expect("settles");
    assert_eq!(q(&engine), Some(1));
}

#[test]
fn run_cycles_matches_repeated_steps() {
    let mut stepped = engine_for(COUNTER);
    for _ in 0..7 {
        stepped.step_cycle().expect("settles");
    }
    let mut batched = engine_for(COUNTER);
    batched.run_cycles(7).expect("settles");
    assert_eq!(stepped.snapshot(), batched.snapshot());
}

#[test]
fn ring_oscillator_reports_non_convergence() {
    let mut engine = CircuitEngine::new(EngineConfig { max_passes: 10 });
    engine
        .load_circuit(compile("wire a\nnot n (input: a; output: a)").expect("compiles"))
        .expect("valid");
    assert_eq!(
        engine.settle().map(|_| ()),
        Err(EngineError::NonConvergence { passes: 10 })
    );
    assert!(!engine.circuit().stable);
}

#[test]
fn gate_driven_wires_cannot_be_forced() {
    let mut engine = engine_for("wire a; wire y\nnot n (input: a; output: y)");
    assert!(matches!(
        engine.set_input_wire(3, 1),
        Err(EngineError::NotAnInput { wire: 3, .. })
    ));
    assert_eq!(engine.set_input_wire(9, 1), Err(EngineError::UnknownWire(9)));
    assert_eq!(
        engine.set_input_wire(0, 1),
        Err(EngineError::ConstantWire("gnd".to_string()))
    );
}

#[test]
fn undefined_inputs_propagate_until_dominated() {
    let mut engine = engine_for("wire a; wire b; wire y; wire z\nand g (input: a, b; output: y)\nor h (input: a, b; output: z)");
    engine.set_input_bit(2, 0, Bit::Undefined).expect("a");
    engine.settle().expect("settles");
    assert_eq!(engine.wire_by_name("y").and_then(|w| w.bit(0)), Some(Bit::Zero));
    assert_eq!(engine.wire_by_name("z").and_then(|w| w.bit(0)), Some(Bit::Undefined));

    engine.set_input_bit(3, 0, Bit::One).expect("b");
    engine.settle().expect("settles");
    assert_eq!(engine.wire_by_name("y").and_then(|w| w.bit(0)), Some(Bit::Undefined));
    assert_eq!(engine.wire_by_name("z").and_then(|w| w.bit(0)), Some(Bit::One));
}

proptest! {
    #[test]
    fn settle_is_idempotent(a in 0u64..16, b in 0u64..16, sel in 0u64..2) {
        let mut engine = engine_for(
            "wire a[3:0]; wire b[3:0]; wire sel; wire y[3:0]; wire n[3:0]\n\
             mux2 m (input: a, b, sel; output: y)\n\
             nand k (input: y, a; output: n)",
        );
        for (name, value) in [("a", a), ("b", b), ("sel", sel)] {
            let id = engine.wire_by_name(name).map(|w| w.id).expect("declared");
            engine.set_input_wire(id, value).expect("input");
        }
        let once = engine.settle().expect("settles").clone();
        let twice = engine.settle().expect("settles").clone();
        prop_assert_eq!(once, twice);
    }
}
