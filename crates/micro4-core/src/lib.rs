//! Micro4 instruction-set core, execution controller and gate correlation.

/// Nibble memory model.
pub mod memory;
pub use memory::{Memory, CELL_MASK, MEMORY_CELLS};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{CpuConfig, CpuSnapshot, StepOutcome};

/// Architectural CPU state model primitives.
pub mod state;
pub use state::{Registers, RunState, NIBBLE_MASK};

/// Opcode and instruction-layout tables.
pub mod encoding;
pub use encoding::{pack_nibbles, split_instruction_byte, Opcode, OperandKind, OPCODE_TABLE};

/// Instruction fetch/decode with bounds validation.
pub mod decoder;
pub use decoder::{DecodedInstruction, DecodedOrFault, Decoder};

/// Runtime fault taxonomy.
pub mod fault;
pub use fault::{FaultClass, FaultCode};

/// Instruction cycle-cost table and lookup helpers.
pub mod timing;
pub use timing::{cycle_cost, instruction_cycles, CycleCostKind, CYCLE_COST_TABLE};

/// Instruction execution pipeline and the CPU session object.
pub mod execute;
pub use execute::{commit_execution, execute_instruction, AluOp, Cpu, ExecuteState};

/// Human-readable disassembly.
pub mod disasm;
pub use disasm::{disassemble_one, disassemble_window, DisassemblyRow};

/// Instruction-to-gate correlation for the reference datapath.
pub mod correlator;
pub use correlator::{
    gates_for_instruction, instructions_for_gate, Correlator, GateSpan, CORRELATION_TABLE,
    REFERENCE_GATE_COUNT,
};

/// Command/event execution controller.
pub mod controller;
pub use controller::{Command, Controller, ControllerConfig, ControllerError, ControllerHandle, Event};

#[cfg(test)]
use proptest as _;
