//! Target-independent session behind the JavaScript bindings.
//!
//! A [`HostSession`] owns one controller and, optionally, one circuit. Every
//! state the controller reports is mirrored onto the circuit inputs through a
//! [`CpuBridge`], so the circuit always reflects the latest CPU snapshot.
//! When the circuit cannot follow, the failure is returned next to the
//! controller's events in a [`HostReply`].

use circuit_sim::{
    analyze, compile, reference_circuit, Circuit, CircuitEngine, CompileError, CpuBridge,
    EngineError, TimingReport,
};
use micro4_core::{
    disassemble_window, Command, Controller, ControllerConfig, CpuSnapshot, DisassemblyRow, Event,
};
use thiserror::Error;

const LOG_TARGET: &str = "micro4_wasm::host";

/// Controller events plus the outcome of mirroring them onto the circuit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostReply {
    /// Events from the controller, in order.
    pub events: Vec<Event>,
    /// Set when the circuit could not follow the reported state. The events
    /// still stand and the circuit is left unstable.
    pub circuit_error: Option<EngineError>,
}

/// Circuit operations that can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The HDL source was rejected; the previous circuit is kept.
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// The engine refused an operation.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// No circuit has been loaded.
    #[error("no circuit loaded")]
    NoCircuit,
    /// No wire with that name.
    #[error("no wire named '{0}'")]
    UnknownWire(String),
}

/// Controller plus optional bridged circuit.
#[derive(Debug, Default)]
pub struct HostSession {
    controller: Controller,
    engine: CircuitEngine,
    bridge: Option<CpuBridge>,
}

impl HostSession {
    #[must_use]
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            controller: Controller::new(config),
            ..Self::default()
        }
    }

    pub fn boot(&mut self) -> HostReply {
        let events = self.controller.boot();
        let circuit_error = self.mirror_current().err();
        HostReply {
            events,
            circuit_error,
        }
    }

    /// Forwards `command` and mirrors the last reported state.
    pub fn send(&mut self, command: Command) -> HostReply {
        let events = self.controller.handle(command);
        self.reply(events)
    }

    pub fn tick(&mut self) -> HostReply {
        let events = self.controller.tick();
        self.reply(events)
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    #[must_use]
    pub fn cpu_state(&self) -> CpuSnapshot {
        self.controller.cpu().snapshot()
    }

    /// Rows around the current program counter.
    #[must_use]
    pub fn disassemble(&self, before: usize, after: usize) -> Vec<DisassemblyRow> {
        let cpu = self.controller.cpu();
        disassemble_window(cpu.pc(), before, after, &cpu.memory())
    }

    /// Compiles `source`, replaces the circuit and mirrors the CPU onto it.
    ///
    /// # Errors
    ///
    /// A compile error keeps the previous circuit. Non-convergence while
    /// mirroring is returned with the new circuit loaded and unstable.
    pub fn load_circuit(&mut self, source: &str) -> Result<&Circuit, HostError> {
        let circuit = compile(source)?;
        self.install(circuit)
    }

    /// Loads the bundled Micro4 datapath.
    ///
    /// # Errors
    ///
    /// Only fails if the bundled source is broken.
    pub fn load_reference_circuit(&mut self) -> Result<&Circuit, HostError> {
        let circuit = reference_circuit()?;
        self.install(circuit)
    }

    fn install(&mut self, circuit: Circuit) -> Result<&Circuit, HostError> {
        let bridge = CpuBridge::attach(&circuit);
        self.engine.load_circuit(circuit)?;
        self.bridge = Some(bridge);
        self.mirror_current()?;
        Ok(self.engine.circuit())
    }

    /// Returns the circuit to power-on contents, then mirrors the current CPU
    /// state onto it.
    ///
    /// # Errors
    ///
    /// Fails without a circuit and on non-convergence.
    pub fn reset_circuit(&mut self) -> Result<&Circuit, HostError> {
        if self.bridge.is_none() {
            return Err(HostError::NoCircuit);
        }
        self.engine.reset();
        self.mirror_current()?;
        Ok(self.engine.circuit())
    }

    #[must_use]
    pub fn circuit(&self) -> Option<&Circuit> {
        self.bridge.as_ref().map(|_| self.engine.circuit())
    }

    #[must_use]
    pub fn timing(&self) -> Option<TimingReport> {
        self.circuit().map(analyze)
    }

    /// Drives a named input wire and settles.
    ///
    /// # Errors
    ///
    /// Fails without a circuit, for unknown names, for gate-driven wires and
    /// on non-convergence.
    pub fn set_circuit_input(&mut self, name: &str, value: u64) -> Result<&Circuit, HostError> {
        if self.bridge.is_none() {
            return Err(HostError::NoCircuit);
        }
        let id = self
            .engine
            .wire_by_name(name)
            .map(|wire| wire.id)
            .ok_or_else(|| HostError::UnknownWire(name.to_string()))?;
        self.engine.set_input_wire(id, value)?;
        Ok(self.engine.settle()?)
    }

    /// Runs full clock cycles on the circuit.
    ///
    /// # Errors
    ///
    /// Fails without a circuit and on non-convergence.
    pub fn clock_circuit(&mut self, cycles: u64) -> Result<&Circuit, HostError> {
        if self.bridge.is_none() {
            return Err(HostError::NoCircuit);
        }
        Ok(self.engine.run_cycles(cycles)?)
    }

    fn reply(&mut self, events: Vec<Event>) -> HostReply {
        let circuit_error = events
            .iter()
            .rev()
            .find_map(Event::state)
            .and_then(|state| self.sync(state).err());
        HostReply {
            events,
            circuit_error,
        }
    }

    fn mirror_current(&mut self) -> Result<(), EngineError> {
        let state = self.controller.cpu().snapshot();
        self.sync(&state)
    }

    fn sync(&mut self, state: &CpuSnapshot) -> Result<(), EngineError> {
        let Some(bridge) = &self.bridge else {
            return Ok(());
        };
        bridge
            .sync(state, &mut self.engine)
            .map(|_| ())
            .inspect_err(|err| tracing::warn!(target: LOG_TARGET, %err, "circuit sync failed"))
    }
}

#[cfg(test)]
mod tests {
    use super::{HostError, HostSession};
    use circuit_sim::EngineError;
    use micro4_core::{Command, Event};

    const RING: &str = "wire acc[3:0]; wire a\nnot n (input: a; output: a)";

    fn value(session: &HostSession, name: &str) -> Option<u64> {
        session
            .circuit()
            .and_then(|circuit| circuit.wire_by_name(name))
            .and_then(|wire| wire.value())
    }

    #[test]
    fn circuit_follows_controller_state() {
        let mut session = HostSession::default();
        assert_eq!(session.boot().events, vec![Event::Ready]);
        session.load_reference_circuit().expect("reference compiles");

        session.send(Command::LoadProgram {
            words: vec![0x7, 0x9, 0x0, 0x0],
            start: 0,
        });
        let reply = session.send(Command::Step);
        assert!(matches!(reply.events.last(), Some(Event::StateUpdate { .. })));
        assert_eq!(reply.circuit_error, None);
        assert_eq!(value(&session, "acc"), Some(9));
        assert_eq!(value(&session, "opcode"), Some(0x7));
    }

    #[test]
    fn bad_source_keeps_previous_circuit() {
        let mut session = HostSession::default();
        session
            .load_circuit("wire a; wire y\nnot n (input: a; output: y)")
            .expect("compiles");
        let err = session.load_circuit("wire a\nbogus").expect_err("rejected");
        assert!(matches!(err, HostError::Compile(_)));
        assert_eq!(session.circuit().map(|c| c.gates.len()), Some(1));
    }

    #[test]
    fn circuit_operations_need_a_circuit() {
        let mut session = HostSession::default();
        assert_eq!(session.clock_circuit(1).map(|_| ()), Err(HostError::NoCircuit));
        assert!(session.timing().is_none());
    }

    #[test]
    fn inputs_can_be_driven_by_name() {
        let mut session = HostSession::default();
        session
            .load_circuit("wire a[3:0]; wire y[3:0]\nnot n (input: a; output: y)")
            .expect("compiles");
        let circuit = session.set_circuit_input("a", 0b0011).expect("settles");
        assert_eq!(circuit.wire_by_name("y").and_then(|w| w.value()), Some(0b1100));
        assert_eq!(
            session.set_circuit_input("ghost", 1).map(|_| ()),
            Err(HostError::UnknownWire("ghost".to_string()))
        );
    }

    #[test]
    fn oscillating_circuit_is_reported_to_the_caller() {
        let mut session = HostSession::default();
        session.boot();
        let err = session.load_circuit(RING).map(|_| ()).expect_err("oscillates");
        assert!(matches!(
            err,
            HostError::Engine(EngineError::NonConvergence { .. })
        ));
        assert_eq!(session.circuit().map(|c| c.stable), Some(false));

        session.send(Command::LoadProgram {
            words: vec![0x7, 0x1, 0x0, 0x0],
            start: 0,
        });
        let reply = session.send(Command::Step);
        assert!(matches!(reply.events.last(), Some(Event::StateUpdate { .. })));
        assert!(matches!(
            reply.circuit_error,
            Some(EngineError::NonConvergence { .. })
        ));
    }

    #[test]
    fn reset_circuit_restores_flip_flops_and_cycle_count() {
        let mut session = HostSession::default();
        assert_eq!(session.reset_circuit().map(|_| ()), Err(HostError::NoCircuit));
        session
            .load_circuit("wire q; wire nq\nnot inv (input: q; output: nq)\ndff t (input: nq; output: q)")
            .expect("compiles");
        let clocked = session.clock_circuit(3).expect("runs");
        assert_eq!(clocked.cycle, 3);
        assert_eq!(value(&session, "q"), Some(1));

        let circuit = session.reset_circuit().expect("settles");
        assert_eq!(circuit.cycle, 0);
        assert!(circuit.gates.iter().all(|g| g.stored == circuit_sim::Bit::Zero));
        assert_eq!(value(&session, "q"), Some(0));
        assert_eq!(value(&session, "nq"), Some(1));
    }
}
