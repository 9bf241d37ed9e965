use thiserror::Error;

/// A compile error tied to the 1-indexed source line that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct HdlError {
    /// 1-indexed source line.
    pub line: usize,
    /// What went wrong.
    pub kind: HdlErrorKind,
}

impl HdlError {
    /// Error `kind` at `line`.
    #[must_use]
    pub const fn new(line: usize, kind: HdlErrorKind) -> Self {
        Self { line, kind }
    }

    /// Syntax error at `line`.
    #[must_use]
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::new(line, HdlErrorKind::Syntax(message.into()))
    }
}

/// Classification of compile errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HdlErrorKind {
    /// The statement does not match the grammar.
    #[error("syntax error: {0}")]
    Syntax(String),
    /// Instantiation of a gate type that does not exist.
    #[error("unknown gate type '{0}'")]
    UnknownGateType(String),
    /// Reference to a wire that was never declared.
    #[error("undeclared wire '{0}'")]
    UndeclaredWire(String),
    /// A wire name declared twice.
    #[error("duplicate wire '{0}'")]
    DuplicateWire(String),
    /// A gate instance name used twice.
    #[error("duplicate gate instance '{0}'")]
    DuplicateGate(String),
    /// A bit index outside the wire's declared range.
    #[error("bit {bit} out of range for wire '{wire}' [{msb}:{lsb}]")]
    BitOutOfRange {
        /// Wire name.
        wire: String,
        /// Offending bit index.
        bit: usize,
        /// Declared high index.
        msb: usize,
        /// Declared low index.
        lsb: usize,
    },
    /// A `[hi:lo]` range with `hi < lo`.
    #[error("invalid range [{hi}:{lo}]")]
    InvalidRange {
        /// High index as written.
        hi: usize,
        /// Low index as written.
        lo: usize,
    },
    /// An input whose width is neither the output width nor 1.
    #[error("width mismatch in '{gate}': expected {expected} or 1 bits, found {found}")]
    WidthMismatch {
        /// Gate instance name.
        gate: String,
        /// Output width.
        expected: usize,
        /// Width of the offending input.
        found: usize,
    },
    /// Wrong number of input or output references.
    #[error("'{gate}' takes {expected} {port} refs, found {found}")]
    ArityMismatch {
        /// Gate instance name.
        gate: String,
        /// `input` or `output`.
        port: &'static str,
        /// Accepted count, e.g. `exactly 2`.
        expected: String,
        /// Count as written.
        found: usize,
    },
    /// A wire bit driven by more than one gate.
    #[error("wire '{wire}' bit {bit} has multiple drivers")]
    MultipleDrivers {
        /// Wire name.
        wire: String,
        /// Declared bit index.
        bit: usize,
    },
    /// A gate output connected to `gnd` or `vdd`.
    #[error("constant wire '{0}' cannot be driven")]
    ConstantDriven(String),
}
