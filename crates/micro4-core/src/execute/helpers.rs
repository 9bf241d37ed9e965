use crate::fault::FaultCode;
use crate::state::NIBBLE_MASK;

/// 4-bit ALU operations used by `ADD`/`SUB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOp {
    /// Modular addition.
    Add,
    /// Modular subtraction.
    Sub,
}

/// Applies a 4-bit ALU operation; results wrap modulo 16.
#[must_use]
pub const fn alu(op: AluOp, acc: u8, operand: u8) -> u8 {
    match op {
        AluOp::Add => acc.wrapping_add(operand) & NIBBLE_MASK,
        AluOp::Sub => acc.wrapping_sub(operand) & NIBBLE_MASK,
    }
}

/// Validates a data address or jump target against the memory size.
///
/// # Errors
///
/// Returns [`FaultCode::AddressOutOfBounds`] when `address` names no cell.
pub fn checked_address(address: u8, memory_cells: usize, pc: u8) -> Result<u8, FaultCode> {
    if usize::from(address) < memory_cells {
        Ok(address)
    } else {
        Err(FaultCode::AddressOutOfBounds { address, pc })
    }
}

/// Fall-through program counter after an instruction of `len` cells.
///
/// Wraps at the memory size, which is the 8-bit wrap for a full memory.
#[must_use]
pub fn fall_through_pc(pc: u8, len: u8, memory_cells: usize) -> u8 {
    let next = (usize::from(pc) + usize::from(len)) % memory_cells.max(1);
    u8::try_from(next).unwrap_or(0)
}
