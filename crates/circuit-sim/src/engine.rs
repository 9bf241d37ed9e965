//! Gate evaluation engine.
//!
//! Combinational gates are evaluated in a topological schedule computed once
//! per loaded circuit. [`CircuitEngine::settle`] repeats passes over that
//! schedule until one pass changes nothing, up to
//! [`EngineConfig::max_passes`]. Flip-flops only capture their inputs in
//! [`CircuitEngine::clock_edge`]; settling drives their stored value onto
//! their output and never changes it.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::circuit::{Circuit, Wire};
use crate::logic::Bit;

const LOG_TARGET: &str = "circuit_sim::engine";

/// Default cap on settle passes.
pub const DEFAULT_MAX_PASSES: usize = 100;

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Passes allowed before a settle is declared non-convergent.
    pub max_passes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// Evaluation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Outputs were still changing after the last allowed pass.
    #[error("circuit did not settle within {passes} passes")]
    NonConvergence {
        /// Passes executed.
        passes: usize,
    },
    /// No wire with this id.
    #[error("no wire with id {0}")]
    UnknownWire(usize),
    /// The wire is `gnd` or `vdd`.
    #[error("wire '{0}' is a constant and cannot be set")]
    ConstantWire(String),
    /// A circuit handed to [`CircuitEngine::load_circuit`] is inconsistent.
    #[error("malformed circuit: {0}")]
    MalformedCircuit(String),
    /// The wire is driven by a gate.
    #[error("wire '{name}' is driven by a gate and cannot be set")]
    NotAnInput {
        /// Wire id.
        wire: usize,
        /// Wire name.
        name: String,
    },
    /// Bit offset past the wire width.
    #[error("bit {bit} out of range for wire '{name}'")]
    BitOutOfRange {
        /// Wire name.
        name: String,
        /// Offending offset.
        bit: usize,
    },
}

/// Owns one circuit and evaluates it.
#[derive(Debug, Clone, Default)]
pub struct CircuitEngine {
    config: EngineConfig,
    circuit: Circuit,
    schedule: Vec<usize>,
    scratch: Vec<Bit>,
}

impl CircuitEngine {
    /// An engine holding an empty circuit.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Engine tuning.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces the circuit wholesale and recomputes the schedule.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MalformedCircuit`] when ids do not match
    /// positions, a port is out of range or a gate drives a constant. The
    /// previous circuit stays loaded.
    pub fn load_circuit(&mut self, circuit: Circuit) -> Result<(), EngineError> {
        circuit.validate().map_err(EngineError::MalformedCircuit)?;
        self.schedule = evaluation_order(&circuit);
        self.circuit = circuit;
        tracing::debug!(
            target: LOG_TARGET,
            wires = self.circuit.wires.len(),
            gates = self.circuit.gates.len(),
            "circuit loaded"
        );
        Ok(())
    }

    /// Returns every wire and flip-flop to `Zero` and the cycle counter to 0.
    /// Constants keep their level and the schedule is kept.
    pub fn reset(&mut self) {
        self.circuit.reset();
        tracing::debug!(target: LOG_TARGET, "circuit reset");
    }

    /// Read-only view of the current circuit.
    #[must_use]
    pub const fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Independent copy of the current circuit.
    #[must_use]
    pub fn snapshot(&self) -> Circuit {
        self.circuit.clone()
    }

    /// Gate ids in evaluation order.
    #[must_use]
    pub fn schedule(&self) -> &[usize] {
        &self.schedule
    }

    /// Wire by id.
    #[must_use]
    pub fn get_wire(&self, id: usize) -> Option<&Wire> {
        self.circuit.wire(id)
    }

    /// Wire by name.
    #[must_use]
    pub fn wire_by_name(&self, name: &str) -> Option<&Wire> {
        self.circuit.wire_by_name(name)
    }

    /// Drives an input wire from `value`, least significant bit first.
    ///
    /// # Errors
    ///
    /// Fails for unknown wires and for wires driven by a gate.
    pub fn set_input_wire(&mut self, id: usize, value: u64) -> Result<(), EngineError> {
        let wire = self.input_wire_mut(id)?;
        if wire.set_value(value) {
            self.circuit.stable = false;
        }
        Ok(())
    }

    /// Drives one bit of an input wire.
    ///
    /// # Errors
    ///
    /// Fails for unknown wires, wires driven by a gate and offsets past the
    /// wire width.
    pub fn set_input_bit(&mut self, id: usize, bit: usize, level: Bit) -> Result<(), EngineError> {
        let wire = self.input_wire_mut(id)?;
        let name = wire.name.clone();
        let slot = wire
            .state
            .get_mut(bit)
            .ok_or(EngineError::BitOutOfRange { name, bit })?;
        if *slot != level {
            *slot = level;
            self.circuit.stable = false;
        }
        Ok(())
    }

    fn input_wire_mut(&mut self, id: usize) -> Result<&mut Wire, EngineError> {
        let wire = self
            .circuit
            .wires
            .get_mut(id)
            .ok_or(EngineError::UnknownWire(id))?;
        if wire.is_constant {
            Err(EngineError::ConstantWire(wire.name.clone()))
        } else if wire.is_input {
            Ok(wire)
        } else {
            Err(EngineError::NotAnInput {
                wire: id,
                name: wire.name.clone(),
            })
        }
    }

    /// Propagates combinational logic to a fixpoint.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NonConvergence`] when the last allowed pass
    /// still changed an output; the circuit is left marked unstable.
    pub fn settle(&mut self) -> Result<&Circuit, EngineError> {
        let max_passes = self.config.max_passes;
        for _ in 0..max_passes {
            if !self.evaluate_pass() {
                self.circuit.stable = true;
                return Ok(&self.circuit);
            }
        }

        self.circuit.stable = false;
        tracing::warn!(
            target: LOG_TARGET,
            passes = max_passes,
            "circuit did not converge"
        );
        Err(EngineError::NonConvergence { passes: max_passes })
    }

    /// One pass over the schedule. Returns true if any output changed.
    fn evaluate_pass(&mut self) -> bool {
        let Self {
            circuit,
            schedule,
            scratch,
            ..
        } = self;
        let mut changed = false;

        for gate in schedule.iter().filter_map(|&id| circuit.gates.get(id)) {
            scratch.clear();
            scratch.extend(gate.inputs.iter().map(|port| circuit.read(*port)));
            let next = gate.kind.evaluate(&scratch[..], gate.stored);
            let output = gate.output;

            if let Some(slot) = circuit
                .wires
                .get_mut(output.wire)
                .and_then(|wire| wire.state.get_mut(output.bit))
            {
                if *slot != next {
                    *slot = next;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Captures every flip-flop input simultaneously, then advances the
    /// cycle counter. Outputs follow on the next settle.
    pub fn clock_edge(&mut self) {
        let sampled: Vec<(usize, Bit)> = self
            .circuit
            .gates
            .iter()
            .enumerate()
            .filter(|(_, gate)| gate.kind.is_sequential())
            .map(|(index, gate)| {
                let d = gate
                    .inputs
                    .first()
                    .map_or(Bit::Undefined, |port| self.circuit.read(*port));
                (index, d)
            })
            .collect();

        for (index, d) in sampled {
            if let Some(gate) = self.circuit.gates.get_mut(index) {
                gate.stored = d;
            }
        }
        self.circuit.cycle += 1;
        self.circuit.stable = false;
    }

    /// One full clock cycle: settle, clock edge, settle.
    ///
    /// # Errors
    ///
    /// Propagates non-convergence from either settle.
    pub fn step_cycle(&mut self) -> Result<&Circuit, EngineError> {
        self.settle()?;
        self.clock_edge();
        self.settle()
    }

    /// Runs `cycles` full clock cycles, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Propagates non-convergence.
    pub fn run_cycles(&mut self, cycles: u64) -> Result<&Circuit, EngineError> {
        for _ in 0..cycles {
            self.step_cycle()?;
        }
        Ok(&self.circuit)
    }
}

/// Flip-flops first, then combinational gates in dependency order with ties
/// broken by id. Gates left on a combinational cycle are appended in id
/// order.
fn evaluation_order(circuit: &Circuit) -> Vec<usize> {
    let gates = &circuit.gates;
    let mut order: Vec<usize> = gates
        .iter()
        .filter(|gate| gate.kind.is_sequential())
        .map(|gate| gate.id)
        .collect();

    let drivers: HashMap<(usize, usize), usize> = gates
        .iter()
        .filter(|gate| !gate.kind.is_sequential())
        .map(|gate| ((gate.output.wire, gate.output.bit), gate.id))
        .collect();

    let mut indegree = vec![0usize; gates.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); gates.len()];
    for gate in gates.iter().filter(|gate| !gate.kind.is_sequential()) {
        for port in &gate.inputs {
            if let Some(&driver) = drivers.get(&(port.wire, port.bit)) {
                indegree[gate.id] += 1;
                dependents[driver].push(gate.id);
            }
        }
    }

    let mut ready: BTreeSet<usize> = gates
        .iter()
        .filter(|gate| !gate.kind.is_sequential() && indegree[gate.id] == 0)
        .map(|gate| gate.id)
        .collect();
    let mut placed = vec![false; gates.len()];
    while let Some(id) = ready.pop_first() {
        placed[id] = true;
        order.push(id);
        for &next in &dependents[id] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    order.extend(
        gates
            .iter()
            .filter(|gate| !gate.kind.is_sequential() && !placed[gate.id])
            .map(|gate| gate.id),
    );
    order
}

#[cfg(test)]
mod tests {
    use super::{CircuitEngine, EngineConfig, EngineError};
    use crate::generator::compile;
    use crate::logic::Bit;

    fn engine_for(source: &str) -> CircuitEngine {
        let mut engine = CircuitEngine::default();
        engine
            .load_circuit(compile(source).expect("compiles"))
            .expect("valid");
        engine
    }

    fn value(engine: &CircuitEngine, name: &str) -> Option<u64> {
        engine.wire_by_name(name).and_then(crate::circuit::Wire::value)
    }

    fn id(engine: &CircuitEngine, name: &str) -> usize {
        engine.wire_by_name(name).expect("wire exists").id
    }

    #[test]
    fn schedule_respects_dependencies_regardless_of_declaration_order() {
        let engine = engine_for(
            "wire a; wire b; wire c\nnot second (input: b; output: c)\nnot first (input: a; output: b)",
        );
        assert_eq!(engine.schedule(), &[1, 0]);
    }

    #[test]
    fn settles_chain_in_one_productive_pass() {
        let mut engine = engine_for(
            "wire a; wire b; wire c; wire d\nnot n1 (input: a; output: b)\nnot n2 (input: b; output: c)\nnot n3 (input: c; output: d)",
        );
        engine.settle().expect("settles");
        assert_eq!(value(&engine, "d"), Some(1));
        assert!(engine.circuit().stable);
    }

    #[test]
    fn inputs_mark_circuit_unstable_until_settled() {
        let mut engine = engine_for("wire a; wire y\nbuf b (input: a; output: y)");
        engine.settle().expect("settles");
        engine.set_input_wire(id(&engine, "a"), 1).expect("input");
        assert!(!engine.circuit().stable);
        engine.settle().expect("settles");
        assert_eq!(value(&engine, "y"), Some(1));
    }

    #[test]
    fn driven_wires_reject_external_values() {
        let mut engine = engine_for("wire a; wire y\nbuf b (input: a; output: y)");
        let y = id(&engine, "y");
        assert!(matches!(
            engine.set_input_wire(y, 1),
            Err(EngineError::NotAnInput { .. })
        ));
        assert_eq!(engine.set_input_wire(99, 1), Err(EngineError::UnknownWire(99)));
        assert!(matches!(
            engine.set_input_bit(id(&engine, "a"), 3, Bit::One),
            Err(EngineError::BitOutOfRange { bit: 3, .. })
        ));
    }

    #[test]
    fn oscillator_reports_non_convergence() {
        let mut engine = CircuitEngine::new(EngineConfig { max_passes: 8 });
        engine
            .load_circuit(compile("wire a\nnot n (input: a; output: a)").expect("compiles"))
            .expect("valid");
        assert_eq!(engine.settle(), Err(EngineError::NonConvergence { passes: 8 }));
        assert!(!engine.circuit().stable);
    }

    #[test]
    fn flip_flop_captures_only_on_clock_edge() {
        let mut engine = engine_for("wire d; wire q\ndff r (input: d; output: q)");
        engine.set_input_wire(id(&engine, "d"), 1).expect("input");
        engine.settle().expect("settles");
        assert_eq!(value(&engine, "q"), Some(0));
        assert_eq!(engine.circuit().gates[0].stored, Bit::Zero);

        engine.clock_edge();
        assert_eq!(engine.circuit().cycle, 1);
        assert_eq!(engine.circuit().gates[0].stored, Bit::One);
        engine.settle().expect("settles");
        assert_eq!(value(&engine, "q"), Some(1));
    }

    #[test]
    fn clock_edge_samples_all_flip_flops_before_committing() {
        // Two-stage shift register: q2 takes the old q1, not the new one.
        let mut engine = engine_for(
            "wire d; wire q1; wire q2\ndff r1 (input: d; output: q1)\ndff r2 (input: q1; output: q2)",
        );
        engine.set_input_wire(id(&engine, "d"), 1).expect("input");
        engine.step_cycle().expect("cycle");
        assert_eq!((value(&engine, "q1"), value(&engine, "q2")), (Some(1), Some(0)));
        engine.step_cycle().expect("cycle");
        assert_eq!((value(&engine, "q1"), value(&engine, "q2")), (Some(1), Some(1)));
    }

    #[test]
    fn toggle_flip_flop_counts_cycles() {
        let mut engine = engine_for("wire q; wire nq\nnot inv (input: q; output: nq)\ndff t (input: nq; output: q)");
        engine.run_cycles(3).expect("runs");
        assert_eq!(engine.circuit().cycle, 3);
        assert_eq!(value(&engine, "q"), Some(1));
    }

    #[test]
    fn undefined_inputs_propagate_through_non_controlling_paths() {
        let mut engine = engine_for("wire a; wire b; wire y; wire z\nand g (input: a, b; output: y)\nor h (input: a, b; output: z)");
        let a = id(&engine, "a");
        let b = id(&engine, "b");
        engine.set_input_bit(a, 0, Bit::Undefined).expect("input");
        engine.settle().expect("settles");
        assert_eq!(engine.wire_by_name("y").and_then(|w| w.bit(0)), Some(Bit::Zero));
        assert_eq!(engine.wire_by_name("z").and_then(|w| w.bit(0)), Some(Bit::Undefined));
        engine.set_input_bit(b, 0, Bit::One).expect("input");
        engine.settle().expect("settles");
        assert_eq!(engine.wire_by_name("y").and_then(|w| w.bit(0)), Some(Bit::Undefined));
        assert_eq!(engine.wire_by_name("z").and_then(|w| w.bit(0)), Some(Bit::One));
    }

    #[test]
    fn reload_replaces_everything() {
        let mut engine = engine_for("wire a; wire y\nnot n (input: a; output: y)");
        engine.settle().expect("settles");
        engine
            .load_circuit(compile("wire p").expect("compiles"))
            .expect("valid");
        assert_eq!(engine.circuit().wires.len(), 3);
        assert!(engine.schedule().is_empty());
    }

    #[test]
    fn malformed_snapshots_are_refused() {
        let mut engine = engine_for("wire a; wire y\nnot n (input: a; output: y)");
        let mut broken = engine.snapshot();
        broken.gates[0].id = 3;
        assert!(matches!(
            engine.load_circuit(broken),
            Err(EngineError::MalformedCircuit(_))
        ));
        assert_eq!(engine.circuit().gates[0].id, 0);
        engine.settle().expect("previous circuit still runs");
        assert_eq!(value(&engine, "y"), Some(1));
    }

    #[test]
    fn constants_hold_their_level() {
        let mut engine = engine_for(
            "wire q; wire one; wire zero\nbuf hi (input: vdd; output: one)\nbuf lo (input: gnd; output: zero)\ndff r (input: vdd; output: q)",
        );
        assert_eq!(
            engine.set_input_wire(1, 0),
            Err(EngineError::ConstantWire("vdd".to_string()))
        );
        assert_eq!(
            engine.set_input_bit(0, 0, Bit::One),
            Err(EngineError::ConstantWire("gnd".to_string()))
        );
        engine.run_cycles(2).expect("runs");
        assert_eq!(
            (value(&engine, "one"), value(&engine, "zero"), value(&engine, "q")),
            (Some(1), Some(0), Some(1))
        );
        assert_eq!((value(&engine, "gnd"), value(&engine, "vdd")), (Some(0), Some(1)));
    }

    #[test]
    fn reset_restores_power_on_contents_and_keeps_schedule() {
        let mut engine = engine_for("wire q; wire nq\nnot inv (input: q; output: nq)\ndff t (input: nq; output: q)");
        let schedule = engine.schedule().to_vec();
        engine.run_cycles(3).expect("runs");
        assert_eq!(engine.circuit().gates[1].stored, Bit::One);

        engine.reset();
        assert_eq!(engine.circuit().cycle, 0);
        assert!(!engine.circuit().stable);
        assert_eq!(engine.circuit().gates[1].stored, Bit::Zero);
        assert_eq!(value(&engine, "q"), Some(0));
        assert_eq!(value(&engine, "vdd"), Some(1));
        assert_eq!(engine.schedule(), schedule.as_slice());

        engine.run_cycles(3).expect("runs again");
        assert_eq!(value(&engine, "q"), Some(1));
    }
}
