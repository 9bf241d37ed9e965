//! Instruction disassembly for the Micro4 ISA.
//!
//! Converts memory nibbles into human-readable rows for debugger views.

use crate::decoder::{DecodedOrFault, Decoder};
use crate::encoding::OperandKind;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// The starting address of this instruction.
    pub addr_start: u8,
    /// Length in cells (2, or 4 for address-form instructions).
    pub len_cells: u8,
    /// Raw nibbles of the instruction.
    pub nibbles: Vec<u8>,
    /// The instruction mnemonic (e.g. "LDA", "HLT").
    pub mnemonic: String,
    /// The formatted operand (e.g. "0x20", "5"), empty when there is none.
    pub operands: String,
    /// Whether the opcode nibble is unassigned.
    pub is_illegal: bool,
}

impl DisassemblyRow {
    /// Mnemonic and operand as one line of assembly.
    #[must_use]
    pub fn text(&self) -> String {
        if self.operands.is_empty() {
            self.mnemonic.clone()
        } else {
            format!("{} {}", self.mnemonic, self.operands)
        }
    }
}

/// Disassembles the instruction starting at `pc`.
///
/// Returns `None` when the instruction's cells do not fit inside `memory`.
/// Unassigned opcodes produce a `.nib` row flagged as illegal.
#[must_use]
pub fn disassemble_one(pc: u8, memory: &[u8]) -> Option<DisassemblyRow> {
    match Decoder::decode_cells(memory, pc) {
        DecodedOrFault::Instruction(instr) => {
            let operands = match (instr.opcode.operand_kind(), instr.address) {
                (OperandKind::Immediate, _) => instr.operand.to_string(),
                (OperandKind::Address, Some(address)) => format!("0x{address:02X}"),
                (OperandKind::None | OperandKind::Address, _) => String::new(),
            };
            Some(DisassemblyRow {
                addr_start: pc,
                len_cells: instr.len(),
                nibbles: instr.to_nibbles(),
                mnemonic: instr.opcode.mnemonic().to_string(),
                operands,
                is_illegal: false,
            })
        }
        DecodedOrFault::Fault(_) => {
            let start = usize::from(pc);
            let nibbles = memory.get(start..start + 2)?.to_vec();
            Some(DisassemblyRow {
                addr_start: pc,
                len_cells: 2,
                operands: format!("0x{:X}{:X} ; ILLEGAL", nibbles[0], nibbles[1]),
                nibbles,
                mnemonic: ".nib".to_string(),
                is_illegal: true,
            })
        }
    }
}

/// Disassembles a window of instructions around `center_pc`.
///
/// Produces up to `before` rows ending exactly at `center_pc`, the center
/// row, and up to `after` rows following it. Rows that would leave memory
/// are omitted. Both counts are clamped to the memory size.
///
/// Preceding rows come from decoding forward from address 0 when that chain
/// lands on `center_pc`. Otherwise a backward scan tries 4-cell then 2-cell
/// instructions ending at the scan position and skips a cell when neither
/// fits.
#[must_use]
pub fn disassemble_window(
    center_pc: u8,
    before: usize,
    after: usize,
    memory: &[u8],
) -> Vec<DisassemblyRow> {
    let before = before.min(memory.len());
    let after = after.min(memory.len());
    let mut rows = Vec::with_capacity(before.saturating_add(after).saturating_add(1));

    if before > 0 {
        let mut found_before = preceding_from_origin(center_pc, memory)
            .unwrap_or_else(|| preceding_by_scan(center_pc, before, memory));
        let skip = found_before.len().saturating_sub(before);
        rows.extend(found_before.drain(skip..));
    }

    let mut pc = usize::from(center_pc);
    for _ in 0..=after {
        let Some(row) = u8::try_from(pc)
            .ok()
            .and_then(|pc| disassemble_one(pc, memory))
        else {
            break;
        };
        pc += usize::from(row.len_cells);
        rows.push(row);
    }

    rows
}

fn preceding_from_origin(center_pc: u8, memory: &[u8]) -> Option<Vec<DisassemblyRow>> {
    let target = usize::from(center_pc);
    let mut rows = Vec::new();
    let mut pc = 0usize;
    while pc < target {
        let row = disassemble_one(u8::try_from(pc).ok()?, memory)?;
        pc += usize::from(row.len_cells);
        rows.push(row);
    }
    (pc == target).then_some(rows)
}

fn preceding_by_scan(center_pc: u8, before: usize, memory: &[u8]) -> Vec<DisassemblyRow> {
    let mut found: Vec<DisassemblyRow> = Vec::new();
    let mut scan = usize::from(center_pc);

    while scan > 0 && found.len() < before {
        let candidate = [4usize, 2].into_iter().find_map(|len| {
            let start = scan.checked_sub(len)?;
            let row = disassemble_one(u8::try_from(start).ok()?, memory)?;
            (usize::from(row.len_cells) == len).then_some(row)
        });
        match candidate {
            Some(row) => {
                scan = usize::from(row.addr_start);
                found.push(row);
            }
            None => scan -= 1,
        }
    }

    found.reverse();
    found
}
