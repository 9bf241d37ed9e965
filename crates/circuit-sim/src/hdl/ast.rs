//! Syntax trees: parsed statements and the lowered, primitive-only netlist.

use std::fmt;

use crate::circuit::GateKind;

/// Gate types accepted in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateType {
    /// `and`
    And,
    /// `or`
    Or,
    /// `xor`
    Xor,
    /// `not`
    Not,
    /// `buf`
    Buf,
    /// `dff`
    Dff,
    /// `nand`, lowered to AND + NOT.
    Nand,
    /// `nor`, lowered to OR + NOT.
    Nor,
    /// `xnor`, lowered to XOR + NOT.
    Xnor,
    /// `mux2 (a, b, sel)`, lowered to NOT + AND + AND + OR.
    Mux2,
}

impl GateType {
    /// Resolves a keyword, ignoring ASCII case.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        let ty = match word.to_ascii_lowercase().as_str() {
            "and" => Self::And,
            "or" => Self::Or,
            "xor" => Self::Xor,
            "not" => Self::Not,
            "buf" => Self::Buf,
            "dff" => Self::Dff,
            "nand" => Self::Nand,
            "nor" => Self::Nor,
            "xnor" => Self::Xnor,
            "mux2" => Self::Mux2,
            _ => return None,
        };
        Some(ty)
    }

    /// Lower-case keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Not => "not",
            Self::Buf => "buf",
            Self::Dff => "dff",
            Self::Nand => "nand",
            Self::Nor => "nor",
            Self::Xnor => "xnor",
            Self::Mux2 => "mux2",
        }
    }

    /// The engine primitive this type maps to directly, if any.
    #[must_use]
    pub const fn primitive(self) -> Option<GateKind> {
        match self {
            Self::And => Some(GateKind::And),
            Self::Or => Some(GateKind::Or),
            Self::Xor => Some(GateKind::Xor),
            Self::Not => Some(GateKind::Not),
            Self::Buf => Some(GateKind::Buf),
            Self::Dff => Some(GateKind::Dff),
            Self::Nand | Self::Nor | Self::Xnor | Self::Mux2 => None,
        }
    }

    /// Accepted number of input refs.
    #[must_use]
    pub const fn input_arity(self) -> Arity {
        match self {
            Self::Not | Self::Buf | Self::Dff => Arity::Exactly(1),
            Self::Xor | Self::Xnor => Arity::Exactly(2),
            Self::And | Self::Or | Self::Nand | Self::Nor => Arity::AtLeast(2),
            Self::Mux2 => Arity::Exactly(3),
        }
    }
}

/// A count constraint on gate ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n`.
    Exactly(usize),
    /// `n` or more.
    AtLeast(usize),
}

impl Arity {
    /// True if `count` satisfies the constraint.
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Which bits of a wire a reference selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Every bit.
    Whole,
    /// `[bit]`
    Bit(usize),
    /// `[hi:lo]`
    Range {
        /// High index.
        hi: usize,
        /// Low index.
        lo: usize,
    },
}

/// A symbolic wire reference as written in a port list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalRef {
    /// Wire name.
    pub wire: String,
    /// Selected bits.
    pub selection: Selection,
}

/// One parsed source statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `wire NAME` or `wire NAME[HI:LO]`.
    Wire {
        /// Wire name.
        name: String,
        /// Declared `(hi, lo)`; `None` for a single bit.
        range: Option<(usize, usize)>,
    },
    /// `TYPE NAME (input: ...; output: ...)`.
    Gate {
        /// Gate type.
        ty: GateType,
        /// Instance name.
        name: String,
        /// Input refs in order.
        inputs: Vec<SignalRef>,
        /// Output refs in order.
        outputs: Vec<SignalRef>,
    },
}

/// A wire declaration in the lowered netlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireDecl {
    /// Wire name; compiler-generated wires contain a `.`.
    pub name: String,
    /// Number of bits.
    pub width: usize,
    /// Declared index of the least significant bit.
    pub lsb: usize,
    /// Source line that introduced the wire.
    pub line: usize,
}

/// A symbolic single-bit reference in the lowered netlist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitRef {
    /// Wire name.
    pub wire: String,
    /// Declared bit index.
    pub bit: usize,
}

impl BitRef {
    /// Reference to `wire[bit]`.
    #[must_use]
    pub fn new(wire: impl Into<String>, bit: usize) -> Self {
        Self {
            wire: wire.into(),
            bit,
        }
    }
}

/// A single-bit primitive gate in the lowered netlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateInst {
    /// Instance name after slicing and decomposition.
    pub name: String,
    /// Primitive kind.
    pub kind: GateKind,
    /// Input bits in order.
    pub inputs: Vec<BitRef>,
    /// Output bit.
    pub output: BitRef,
    /// Source line that introduced the gate.
    pub line: usize,
}

/// Compiler output: declarations and primitive gates in id order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetlistAst {
    /// Wires in declaration order.
    pub wires: Vec<WireDecl>,
    /// Gates in instantiation order.
    pub gates: Vec<GateInst>,
}
