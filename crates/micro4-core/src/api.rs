//! Public host-facing API contracts for embedding the ISA core.

use crate::memory::MEMORY_CELLS;
use crate::FaultCode;

/// Top-level immutable configuration for a core instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CpuConfig {
    /// Number of 4-bit memory cells, `1..=256`.
    pub memory_cells: usize,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            memory_cells: MEMORY_CELLS,
        }
    }
}

/// Output status from one instruction retirement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Instruction retired and consumed a fixed cycle cost.
    Retired {
        /// Cycle cost of the retired instruction.
        cycles: u32,
    },
    /// `HLT` retired; the core is now halted.
    Halted {
        /// Cycle cost of the `HLT` instruction.
        cycles: u32,
    },
    /// The instruction faulted; nothing was committed.
    Fault {
        /// Raised fault.
        cause: FaultCode,
    },
    /// The core was already halted or errored; nothing happened.
    Idle,
}

impl StepOutcome {
    /// Cycles consumed by this step (0 for faults and idle steps).
    #[must_use]
    pub const fn cycles(self) -> u32 {
        match self {
            Self::Retired { cycles } | Self::Halted { cycles } => cycles,
            Self::Fault { .. } | Self::Idle => 0,
        }
    }

    /// True when no further instruction can execute without a reset.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Retired { .. })
    }
}

/// Fully independent copy of the host-visible CPU state, memory included.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CpuSnapshot {
    /// Program counter.
    pub pc: u8,
    /// Accumulator.
    pub accumulator: u8,
    /// Zero flag.
    pub zero_flag: bool,
    /// Instruction register.
    pub ir: u8,
    /// Memory address register.
    pub mar: u8,
    /// Memory data register.
    pub mdr: u8,
    /// Set by `HLT` and by every fault.
    pub halted: bool,
    /// Set by faults only.
    pub errored: bool,
    /// Human-readable fault description.
    pub error_message: Option<String>,
    /// Total cycles consumed since the last reset.
    pub cycle_count: u64,
    /// Instructions retired since the last reset, `HLT` included.
    pub instruction_count: u64,
    /// Memory image copy.
    pub memory: Vec<u8>,
}
