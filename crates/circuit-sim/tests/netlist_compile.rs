//! Source-to-circuit compilation: ids, decomposition and functional results.

use circuit_sim::{compile, Bit, CircuitEngine, CompileError, GateKind, HdlErrorKind};
use clap as _;
use micro4_core as _;
use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use tempfile as _;
use thiserror as _;
use tracing as _;
use tracing_subscriber as _;

const RIPPLE_ADDER: &str = "\
# 4-bit ripple-carry adder
wire a[3:0]; wire b[3:0]
wire s[3:0]; wire c[4:0]
wire h[3:0]; wire g[3:0]; wire p[3:0]

xor hx (input: a, b; output: h)
xor sx (input: h, c[3:0]; output: s)
and ga (input: a, b; output: g)
and pa (input: h, c[3:0]; output: p)
or co (input: g, p; output: c[4:1])
";

fn settled(source: &str, inputs: &[(&str, u64)]) -> CircuitEngine {
    let mut engine = CircuitEngine::default();
    engine
        .load_circuit(compile(source).expect("compiles"))
        .expect("valid");
    for (name, value) in inputs {
        let id = engine.wire_by_name(name).expect("declared").id;
        engine.set_input_wire(id, *value).expect("input wire");
    }
    engine.settle().expect("settles");
    engine
}

fn value_of(engine: &CircuitEngine, name: &str) -> Option<u64> {
    engine.wire_by_name(name).and_then(|wire| wire.value())
}

#[test]
fn single_and_gate_netlist() {
    let circuit =
        compile("wire a; wire b; wire c; and g1(input: a,b; output: c)").expect("compiles");
    assert_eq!(circuit.wires.len(), 5);
    assert_eq!(circuit.gates.len(), 1);
    assert_eq!(circuit.gates[0].kind, GateKind::And);

    let mut engine = CircuitEngine::default();
    engine.load_circuit(circuit).expect("valid");
    engine.set_input_wire(2, 1).expect("a");
    engine.set_input_wire(3, 1).expect("b");
    engine.settle().expect("settles");
    assert_eq!(value_of(&engine, "c"), Some(1));

    engine.set_input_wire(2, 0).expect("a");
    engine.settle().expect("settles");
    assert_eq!(value_of(&engine, "c"), Some(0));
}

#[test]
fn identical_source_yields_identical_ids() {
    let first = compile(RIPPLE_ADDER).expect("compiles");
    let second = compile(RIPPLE_ADDER).expect("compiles");
    assert_eq!(first, second);
    assert_eq!(first.gates.len(), 20);
    assert_eq!(first.gates[0].name, "hx[0]");
    assert_eq!(first.gates[19].name, "co[3]");
}

#[rstest]
#[case("nand", 0, 0, 1)]
#[case("nand", 1, 1, 0)]
#[case("nor", 0, 0, 1)]
#[case("nor", 1, 0, 0)]
#[case("xnor", 1, 1, 1)]
#[case("xnor", 0, 1, 0)]
fn inverted_types_decompose_to_a_core_and_an_inverter(
    #[case] ty: &str,
    #[case] a: u64,
    #[case] b: u64,
    #[case] expected: u64,
) {
    let source = format!("wire a; wire b; wire y\n{ty} g (input: a, b; output: y)");
    let engine = settled(&source, &[("a", a), ("b", b)]);
    let circuit = engine.circuit();
    assert_eq!(circuit.gates.len(), 2);
    assert_eq!(circuit.gates[1].kind, GateKind::Not);
    assert!(circuit.wire_by_name("g.n").is_some());
    assert_eq!(value_of(&engine, "y"), Some(expected));
}

#[rstest]
#[case(0, 0b0101)]
#[case(1, 0b1010)]
fn mux2_selects_first_input_when_select_is_low(#[case] sel: u64, #[case] expected: u64) {
    let engine = settled(
        "wire x[3:0]; wire y[3:0]; wire sel; wire out[3:0]\n\
         mux2 m (input: x, y, sel; output: out)",
        &[("x", 0b0101), ("y", 0b1010), ("sel", sel)],
    );
    assert_eq!(engine.circuit().gates.len(), 16);
    assert_eq!(value_of(&engine, "out"), Some(expected));
}

#[rstest]
#[case("wire a\nfoo g (input: a; output: a)", 2)]
#[case("wire a; wire y\nnot n (input: b; output: y)", 2)]
#[case("wire a\nwire a", 2)]
#[case("wire a; wire y\n\nand g (input: a; output: y)", 3)]
fn errors_carry_their_line(#[case] source: &str, #[case] line: usize) {
    let err = compile(source).expect_err("rejected");
    assert_eq!(err.line(), Some(line));
}

#[test]
fn multiple_drivers_are_rejected() {
    let err = compile("wire a; wire y\nbuf b1 (input: a; output: y)\nnot n1 (input: a; output: y)")
        .expect_err("two drivers");
    match err {
        CompileError::Hdl(err) => {
            assert_eq!(err.line, 3);
            assert!(matches!(err.kind, HdlErrorKind::MultipleDrivers { .. }));
        }
        CompileError::Generate(other) => panic!("unexpected {other}"),
    }
}

#[test]
fn fresh_circuit_starts_at_zero() {
    let circuit = compile(RIPPLE_ADDER).expect("compiles");
    assert_eq!(circuit.cycle, 0);
    assert!(circuit
        .wires
        .iter()
        .filter(|wire| !wire.is_constant)
        .flat_map(|wire| wire.state.iter())
        .all(|bit| *bit == Bit::Zero));
}

#[test]
fn half_adder_with_carry_in_tied_low() {
    let source = "\
wire a; wire b; wire s; wire co
wire h; wire g; wire p
xor hx (input: a, b; output: h)
xor sx (input: h, gnd; output: s)
and ga (input: a, b; output: g)
and pa (input: h, gnd; output: p)
or cx (input: g, p; output: co)
";
    for (a, b) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
        let engine = settled(source, &[("a", a), ("b", b)]);
        assert_eq!(value_of(&engine, "s"), Some((a + b) & 1), "{a}+{b}");
        assert_eq!(value_of(&engine, "co"), Some((a + b) >> 1), "{a}+{b}");
    }
}

#[rstest]
#[case("wire a\nbuf b (input: a; output: gnd)", "gnd")]
#[case("wire a\nnot n (input: a; output: vdd)", "vdd")]
fn constants_cannot_be_driven(#[case] source: &str, #[case] constant: &str) {
    let err = compile(source).expect_err("constant output");
    assert_eq!(err.line(), Some(2));
    assert!(matches!(
        err,
        CompileError::Hdl(ref hdl) if hdl.kind == HdlErrorKind::ConstantDriven(constant.to_string())
    ));
}

proptest! {
    #[test]
    fn ripple_adder_adds(a in 0u64..16, b in 0u64..16) {
        let engine = settled(RIPPLE_ADDER, &[("a", a), ("b", b)]);
        prop_assert_eq!(value_of(&engine, "s"), Some((a + b) & 0xF));
        let carry = engine.wire_by_name("c").and_then(|wire| wire.bit(4));
        prop_assert_eq!(carry, Some(Bit::from_bool(a + b > 0xF)));
    }
}
