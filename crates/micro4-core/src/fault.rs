use thiserror::Error;

/// Fault classes used for grouping runtime errors in host reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Instruction fetch ran past the end of memory.
    Fetch,
    /// Opcode nibble is not assigned.
    Decode,
    /// Data access or jump target outside memory.
    Memory,
}

/// Runtime faults raised by instruction execution.
///
/// A fault latches the core into the errored state; it is terminal until an
/// explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultCode {
    /// The instruction at `pc` does not fit inside memory.
    #[error("PC out of bounds: 0x{pc:02X}")]
    PcOutOfBounds {
        /// Program counter of the failed fetch.
        pc: u8,
    },
    /// The opcode nibble has no assigned instruction.
    #[error("Unknown opcode: 0x{opcode:X} at PC=0x{pc:02X}")]
    InvalidOpcode {
        /// Offending opcode nibble.
        opcode: u8,
        /// Program counter of the faulting instruction.
        pc: u8,
    },
    /// A memory operand or jump target is outside memory.
    #[error("Address out of bounds: 0x{address:02X} at PC=0x{pc:02X}")]
    AddressOutOfBounds {
        /// Offending address operand.
        address: u8,
        /// Program counter of the faulting instruction.
        pc: u8,
    },
}

impl FaultCode {
    /// Returns the fault class for this fault.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::PcOutOfBounds { .. } => FaultClass::Fetch,
            Self::InvalidOpcode { .. } => FaultClass::Decode,
            Self::AddressOutOfBounds { .. } => FaultClass::Memory,
        }
    }

    /// Address of the instruction that faulted.
    #[must_use]
    pub const fn faulting_pc(self) -> u8 {
        match self {
            Self::PcOutOfBounds { pc }
            | Self::InvalidOpcode { pc, .. }
            | Self::AddressOutOfBounds { pc, .. } => pc,
        }
    }
}
