//! Gate-level HDL compiler, circuit generator and evaluation engine for the
//! Micro4 datapath.

/// Three-valued signal levels.
pub mod logic;
pub use logic::Bit;

/// Circuit graph: wires, primitive gates and their state.
pub mod circuit;
pub use circuit::{Circuit, Gate, GateKind, PortRef, Wire, CONSTANT_WIRES, GND, VDD};

/// HDL lexer, parser and gate decomposition.
pub mod hdl;
pub use hdl::{parse_netlist, HdlError, HdlErrorKind, NetlistAst};

/// Netlist-to-circuit generation.
pub mod generator;
pub use generator::{compile, generate, CompileError, GenerateError};

/// Combinational settling and clocked flip-flop updates.
pub mod engine;
pub use engine::{CircuitEngine, EngineConfig, EngineError, DEFAULT_MAX_PASSES};

/// Static size and critical-path estimates.
pub mod analysis;
pub use analysis::{analyze, TimingReport};

/// CPU-state to input-wire mapping.
pub mod bridge;
pub use bridge::{CpuBridge, CpuSignal};

/// Bundled reference datapath netlist.
pub mod reference;
pub use reference::{reference_circuit, REFERENCE_DATAPATH};

use clap as _;
use tracing_subscriber as _;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use tempfile as _;
