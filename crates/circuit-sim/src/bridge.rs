//! One-way mapping from CPU state onto circuit input wires.
//!
//! The bridge reads a [`CpuSnapshot`] and writes input wires through the
//! engine's public setters. It never touches gates or the CPU.

use micro4_core::{split_instruction_byte, CpuSnapshot};

use crate::circuit::Circuit;
use crate::engine::{CircuitEngine, EngineError};

const LOG_TARGET: &str = "circuit_sim::bridge";

/// CPU state fields that can drive a circuit input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuSignal {
    /// High nibble of the instruction register.
    Opcode,
    /// Low nibble of the instruction register.
    Operand,
    /// Accumulator.
    Accumulator,
    /// Memory data register.
    MemoryData,
    /// Zero flag.
    ZeroFlag,
}

impl CpuSignal {
    /// Every signal, in binding order.
    pub const ALL: [Self; 5] = [
        Self::Opcode,
        Self::Operand,
        Self::Accumulator,
        Self::MemoryData,
        Self::ZeroFlag,
    ];

    /// Input wire name this signal binds to.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Opcode => "opcode",
            Self::Operand => "operand",
            Self::Accumulator => "acc",
            Self::MemoryData => "mdr",
            Self::ZeroFlag => "zflag",
        }
    }

    /// Current value of this signal in `state`.
    #[must_use]
    pub fn read(self, state: &CpuSnapshot) -> u64 {
        let (opcode, operand) = split_instruction_byte(state.ir);
        match self {
            Self::Opcode => u64::from(opcode),
            Self::Operand => u64::from(operand),
            Self::Accumulator => u64::from(state.accumulator),
            Self::MemoryData => u64::from(state.mdr),
            Self::ZeroFlag => u64::from(state.zero_flag),
        }
    }
}

/// Signal-to-wire bindings resolved against one circuit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuBridge {
    bindings: Vec<(CpuSignal, usize)>,
}

impl CpuBridge {
    /// Binds every signal whose wire exists in `circuit` as an input.
    /// Signals without a matching input wire are left unbound.
    #[must_use]
    pub fn attach(circuit: &Circuit) -> Self {
        let bindings: Vec<(CpuSignal, usize)> = CpuSignal::ALL
            .into_iter()
            .filter_map(|signal| {
                circuit
                    .wire_by_name(signal.wire_name())
                    .filter(|wire| wire.is_input)
                    .map(|wire| (signal, wire.id))
            })
            .collect();
        tracing::debug!(target: LOG_TARGET, bound = bindings.len(), "bridge attached");
        Self { bindings }
    }

    /// Bound signals and their wire ids.
    #[must_use]
    pub fn bindings(&self) -> &[(CpuSignal, usize)] {
        &self.bindings
    }

    /// True if `signal` drives a wire.
    #[must_use]
    pub fn is_bound(&self, signal: CpuSignal) -> bool {
        self.bindings.iter().any(|(bound, _)| *bound == signal)
    }

    /// Writes every bound signal from `state` onto its wire.
    ///
    /// # Errors
    ///
    /// Fails if `engine` no longer holds the circuit this bridge was
    /// attached to.
    pub fn apply(&self, state: &CpuSnapshot, engine: &mut CircuitEngine) -> Result<(), EngineError> {
        for (signal, wire) in &self.bindings {
            engine.set_input_wire(*wire, signal.read(state))?;
        }
        Ok(())
    }

    /// Applies `state` and settles the circuit.
    ///
    /// # Errors
    ///
    /// Propagates wire and non-convergence errors from the engine.
    pub fn sync<'e>(
        &self,
        state: &CpuSnapshot,
        engine: &'e mut CircuitEngine,
    ) -> Result<&'e Circuit, EngineError> {
        self.apply(state, engine)?;
        engine.settle()
    }
}
