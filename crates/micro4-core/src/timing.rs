use crate::encoding::Opcode;

/// Micro-operation phases that make up an instruction's cycle cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleCostKind {
    /// Opcode/operand byte fetch (two nibble reads).
    InstructionFetch,
    /// Address byte fetch (two nibble reads).
    AddressFetch,
    /// Register/memory execute phase.
    Execute,
}

/// Single source-of-truth cycle-cost table for instruction phases.
pub const CYCLE_COST_TABLE: &[(CycleCostKind, u32)] = &[
    (CycleCostKind::InstructionFetch, 2),
    (CycleCostKind::AddressFetch, 2),
    (CycleCostKind::Execute, 1),
];

/// Looks up the cycle cost for a phase.
#[must_use]
pub fn cycle_cost(kind: CycleCostKind) -> Option<u32> {
    CYCLE_COST_TABLE
        .iter()
        .find_map(|(entry_kind, cycles)| (*entry_kind == kind).then_some(*cycles))
}

/// Phases executed by an opcode, in order.
#[must_use]
pub const fn phases(opcode: Opcode) -> &'static [CycleCostKind] {
    use CycleCostKind::{AddressFetch, Execute, InstructionFetch};
    match opcode {
        Opcode::Hlt | Opcode::Ldi => &[InstructionFetch, Execute],
        Opcode::Jmp => &[InstructionFetch, AddressFetch],
        Opcode::Lda | Opcode::Sta | Opcode::Add | Opcode::Sub | Opcode::Jz => {
            &[InstructionFetch, AddressFetch, Execute]
        }
    }
}

/// Total cycles consumed by one retirement of `opcode`.
#[must_use]
pub fn instruction_cycles(opcode: Opcode) -> u32 {
    phases(opcode)
        .iter()
        .filter_map(|phase| cycle_cost(*phase))
        .sum()
}
