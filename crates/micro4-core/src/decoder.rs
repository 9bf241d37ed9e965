//! Instruction fetch and decode for the Micro4 ISA.
//!
//! Decoding reads nibbles straight out of [`Memory`]; an instruction whose
//! cells do not all fit inside memory is a fetch fault rather than a wrap.

use crate::encoding::{pack_nibbles, Opcode, OperandKind};
use crate::fault::FaultCode;
use crate::memory::{Memory, CELL_MASK};

/// Decoded instruction with all extracted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// Assigned opcode.
    pub opcode: Opcode,
    /// Operand nibble (immediate for `LDI`, ignored otherwise).
    pub operand: u8,
    /// 8-bit address for address-form instructions.
    pub address: Option<u8>,
}

impl DecodedInstruction {
    /// Instruction length in memory cells.
    #[must_use]
    pub const fn len(self) -> u8 {
        self.opcode.operand_kind().instruction_cells()
    }

    /// Always false; every instruction spans at least two cells.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        false
    }

    /// The instruction-register value (`opcode << 4 | operand`).
    #[must_use]
    pub const fn instruction_byte(self) -> u8 {
        pack_nibbles(self.opcode.nibble(), self.operand)
    }

    /// Re-encodes the instruction into its memory nibbles.
    #[must_use]
    pub fn to_nibbles(self) -> Vec<u8> {
        let mut nibbles = vec![self.opcode.nibble(), self.operand & 0x0F];
        if let Some(address) = self.address {
            nibbles.push(address >> 4);
            nibbles.push(address & 0x0F);
        }
        nibbles
    }
}

/// Either a decoded instruction or the fault that stopped decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedOrFault {
    /// Successfully decoded instruction.
    Instruction(DecodedInstruction),
    /// Fetch or decode failed.
    Fault(FaultCode),
}

impl DecodedOrFault {
    /// Returns the decoded instruction if present.
    #[must_use]
    pub const fn instruction(self) -> Option<DecodedInstruction> {
        match self {
            Self::Instruction(i) => Some(i),
            Self::Fault(_) => None,
        }
    }

    /// Returns the fault if decoding failed.
    #[must_use]
    pub const fn fault(self) -> Option<FaultCode> {
        match self {
            Self::Instruction(_) => None,
            Self::Fault(f) => Some(f),
        }
    }
}

impl From<DecodedOrFault> for Result<DecodedInstruction, FaultCode> {
    fn from(value: DecodedOrFault) -> Self {
        match value {
            DecodedOrFault::Instruction(i) => Ok(i),
            DecodedOrFault::Fault(f) => Err(f),
        }
    }
}

/// Stateless Micro4 decoder.
pub struct Decoder;

impl Decoder {
    /// Fetches and decodes the instruction starting at `pc`.
    #[must_use]
    pub fn decode(memory: &Memory, pc: u8) -> DecodedOrFault {
        Self::decode_cells(memory.as_slice(), pc)
    }

    /// Decodes from a raw cell image such as a snapshot's memory copy.
    ///
    /// Check order: the opcode/operand cells must be inside `cells`, the
    /// opcode must be assigned, then any address cells must be inside `cells`.
    #[must_use]
    pub fn decode_cells(cells: &[u8], pc: u8) -> DecodedOrFault {
        let base = usize::from(pc);
        let read = |offset: usize| cells.get(base + offset).map(|cell| cell & CELL_MASK);
        let (Some(op), Some(operand)) = (read(0), read(1)) else {
            return DecodedOrFault::Fault(FaultCode::PcOutOfBounds { pc });
        };

        let Some(opcode) = Opcode::from_nibble(op) else {
            return DecodedOrFault::Fault(FaultCode::InvalidOpcode { opcode: op, pc });
        };

        let address = match opcode.operand_kind() {
            OperandKind::None | OperandKind::Immediate => None,
            OperandKind::Address => {
                let (Some(high), Some(low)) = (read(2), read(3)) else {
                    return DecodedOrFault::Fault(FaultCode::PcOutOfBounds { pc });
                };
                Some(pack_nibbles(high, low))
            }
        };

        DecodedOrFault::Instruction(DecodedInstruction {
            opcode,
            operand,
            address,
        })
    }
}
