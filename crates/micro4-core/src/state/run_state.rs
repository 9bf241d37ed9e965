use crate::FaultCode;

/// Execution-state machine for the ISA core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to execute the next instruction.
    #[default]
    Ready,
    /// `HLT` retired; terminal until reset.
    Halted,
    /// A fault is latched; terminal until reset.
    Errored(FaultCode),
}

impl RunState {
    /// Returns the latched fault, if any.
    #[must_use]
    pub const fn latched_fault(self) -> Option<FaultCode> {
        match self {
            Self::Errored(cause) => Some(cause),
            Self::Ready | Self::Halted => None,
        }
    }

    /// True for both terminal states; an errored core is also halted.
    #[must_use]
    pub const fn is_halted(self) -> bool {
        !matches!(self, Self::Ready)
    }

    /// True only when a fault is latched.
    #[must_use]
    pub const fn is_errored(self) -> bool {
        matches!(self, Self::Errored(_))
    }
}
