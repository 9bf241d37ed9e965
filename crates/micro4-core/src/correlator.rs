//! Static instruction-to-gate correlation for the reference Micro4 datapath.
//!
//! The forward table is authored as inclusive gate-id spans per opcode. The
//! reverse gate-to-opcode index is always derived from it, built on first
//! use and memoized.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::encoding::Opcode;

/// Inclusive range of gate ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GateSpan {
    /// First gate id.
    pub first: u32,
    /// Last gate id, inclusive.
    pub last: u32,
}

impl GateSpan {
    /// Span covering `first..=last`.
    #[must_use]
    pub const fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    /// Span covering a single gate.
    #[must_use]
    pub const fn single(gate: u32) -> Self {
        Self::new(gate, gate)
    }

    /// Gate ids in this span, ascending.
    pub fn ids(self) -> impl Iterator<Item = u32> {
        self.first..=self.last
    }
}

/// Number of gates in the reference datapath netlist.
pub const REFERENCE_GATE_COUNT: u32 = 95;

const DECODE: GateSpan = GateSpan::new(0, 3);
const ALU: GateSpan = GateSpan::new(12, 36);
const BRANCH_TAKE_JZ: GateSpan = GateSpan::single(37);
const BRANCH_LOAD: GateSpan = GateSpan::single(38);
const ACC_OP: GateSpan = GateSpan::single(39);
const ACC_WRITE_ENABLE: GateSpan = GateSpan::single(40);
const ACC_LOAD_PATH: GateSpan = GateSpan::new(41, 92);
const ACC_RESULT_PATH: GateSpan = GateSpan::new(57, 92);
const CTL_MEM_WRITE: GateSpan = GateSpan::single(93);
const CTL_HALT: GateSpan = GateSpan::single(94);

/// Forward table: gates exercised by each opcode in the reference datapath.
///
/// Decoder AND gates occupy ids `4..=11` in opcode order.
pub const CORRELATION_TABLE: &[(Opcode, &[GateSpan])] = &[
    (Opcode::Hlt, &[DECODE, GateSpan::single(4), CTL_HALT]),
    (
        Opcode::Lda,
        &[DECODE, GateSpan::single(5), ACC_WRITE_ENABLE, ACC_LOAD_PATH],
    ),
    (Opcode::Sta, &[DECODE, GateSpan::single(6), CTL_MEM_WRITE]),
    (
        Opcode::Add,
        &[DECODE, GateSpan::single(7), ALU, ACC_OP, ACC_WRITE_ENABLE, ACC_RESULT_PATH],
    ),
    (
        Opcode::Sub,
        &[DECODE, GateSpan::single(8), ALU, ACC_OP, ACC_WRITE_ENABLE, ACC_RESULT_PATH],
    ),
    (Opcode::Jmp, &[DECODE, GateSpan::single(9), BRANCH_LOAD]),
    (
        Opcode::Jz,
        &[DECODE, GateSpan::single(10), BRANCH_TAKE_JZ, BRANCH_LOAD],
    ),
    (
        Opcode::Ldi,
        &[DECODE, GateSpan::single(11), ACC_WRITE_ENABLE, ACC_LOAD_PATH],
    ),
];

/// Bidirectional opcode/gate lookup over an immutable forward table.
#[derive(Debug)]
pub struct Correlator {
    table: &'static [(Opcode, &'static [GateSpan])],
    reverse: OnceLock<BTreeMap<u32, Vec<u8>>>,
}

impl Correlator {
    /// Correlator over a caller-supplied forward table.
    #[must_use]
    pub const fn new(table: &'static [(Opcode, &'static [GateSpan])]) -> Self {
        Self {
            table,
            reverse: OnceLock::new(),
        }
    }

    /// Shared correlator for the reference datapath.
    #[must_use]
    pub fn reference() -> &'static Self {
        static REFERENCE: Correlator = Correlator::new(CORRELATION_TABLE);
        &REFERENCE
    }

    /// Gate ids used by `opcode`, ascending and deduplicated.
    ///
    /// Unassigned opcode nibbles yield an empty list.
    #[must_use]
    pub fn gates_for_instruction(&self, opcode: u8) -> Vec<u32> {
        let Some(opcode) = Opcode::from_nibble(opcode) else {
            return Vec::new();
        };
        let mut gates: Vec<u32> = self
            .table
            .iter()
            .filter(|(entry, _)| *entry == opcode)
            .flat_map(|(_, spans)| spans.iter().flat_map(|span| span.ids()))
            .collect();
        gates.sort_unstable();
        gates.dedup();
        gates
    }

    /// Opcode nibbles that use `gate`, ascending. Unknown gates yield an
    /// empty list.
    #[must_use]
    pub fn instructions_for_gate(&self, gate: u32) -> Vec<u8> {
        self.reverse_index().get(&gate).cloned().unwrap_or_default()
    }

    fn reverse_index(&self) -> &BTreeMap<u32, Vec<u8>> {
        self.reverse.get_or_init(|| {
            let mut index: BTreeMap<u32, Vec<u8>> = BTreeMap::new();
            for opcode in Opcode::ALL {
                for gate in self.gates_for_instruction(opcode.nibble()) {
                    index.entry(gate).or_default().push(opcode.nibble());
                }
            }
            index
        })
    }
}

/// Gate ids used by `opcode` in the reference datapath.
#[must_use]
pub fn gates_for_instruction(opcode: u8) -> Vec<u32> {
    Correlator::reference().gates_for_instruction(opcode)
}

/// Opcodes that use `gate` in the reference datapath.
#[must_use]
pub fn instructions_for_gate(gate: u32) -> Vec<u8> {
    Correlator::reference().instructions_for_gate(gate)
}
