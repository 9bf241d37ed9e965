//! Command/event messages crossing the controller boundary.
//!
//! Every payload is an owned value; states are full snapshots, memory
//! included, never views into the running core.

use crate::CpuSnapshot;

/// Host-to-controller commands.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum Command {
    /// Stop, reset the core, then copy `words` into memory from `start`.
    LoadProgram {
        /// Program nibbles.
        words: Vec<u8>,
        /// First memory cell to write.
        #[cfg_attr(feature = "serde", serde(default))]
        start: u8,
    },
    /// Execute exactly one instruction, ignoring breakpoints.
    Step,
    /// Begin continuous execution at `speed` instructions per tick.
    Run {
        /// Instructions per tick; 0 runs the largest batch.
        #[cfg_attr(feature = "serde", serde(default))]
        speed: u32,
    },
    /// Cancel a run.
    Stop,
    /// Stop and reinitialize the core.
    Reset,
    /// Report the current state.
    GetState,
    /// Change the throughput of an active run.
    SetSpeed {
        /// New instructions per tick; 0 runs the largest batch.
        speed: u32,
    },
    /// Add a breakpoint address.
    AddBreakpoint {
        /// Instruction address.
        address: u8,
    },
    /// Remove a breakpoint address.
    RemoveBreakpoint {
        /// Instruction address.
        address: u8,
    },
    /// Remove every breakpoint.
    ClearBreakpoints,
    /// Report the breakpoint set.
    ListBreakpoints,
}

/// Controller-to-host events, emitted in causal order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum Event {
    /// The controller is up and accepting commands.
    Ready,
    /// Current core state.
    StateUpdate {
        /// State snapshot.
        state: CpuSnapshot,
    },
    /// The core executed `HLT`.
    Halted {
        /// State snapshot.
        state: CpuSnapshot,
    },
    /// The core latched a fault.
    Error {
        /// Fault description.
        message: String,
        /// Address of the faulting instruction.
        address: u8,
        /// State snapshot.
        state: CpuSnapshot,
    },
    /// A run stopped at a breakpoint before executing `address`.
    BreakpointHit {
        /// Breakpoint address (the current PC).
        address: u8,
        /// State snapshot.
        state: CpuSnapshot,
    },
    /// Current breakpoint set, ascending.
    Breakpoints {
        /// Breakpoint addresses.
        addresses: Vec<u8>,
    },
    /// A command was refused without changing any state.
    Rejected {
        /// Reason for the refusal.
        message: String,
    },
}

impl Event {
    /// The state snapshot carried by this event, if any.
    #[must_use]
    pub const fn state(&self) -> Option<&CpuSnapshot> {
        match self {
            Self::StateUpdate { state }
            | Self::Halted { state }
            | Self::Error { state, .. }
            | Self::BreakpointHit { state, .. } => Some(state),
            Self::Ready | Self::Breakpoints { .. } | Self::Rejected { .. } => None,
        }
    }

    /// True for events that end a run.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Halted { .. } | Self::Error { .. } | Self::BreakpointHit { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Event;
    use crate::CpuSnapshot;

    #[test]
    fn state_accessor_covers_every_state_bearing_event() {
        let state = CpuSnapshot {
            pc: 4,
            ..CpuSnapshot::default()
        };
        let events = [
            Event::StateUpdate {
                state: state.clone(),
            },
            Event::Halted {
                state: state.clone(),
            },
            Event::Error {
                message: "boom".to_string(),
                address: 4,
                state: state.clone(),
            },
            Event::BreakpointHit {
                address: 4,
                state: state.clone(),
            },
        ];
        for event in &events {
            assert_eq!(event.state().map(|s| s.pc), Some(4));
        }
        assert!(Event::Ready.state().is_none());
        assert!(Event::Breakpoints { addresses: vec![] }.state().is_none());
    }

    #[test]
    fn only_halt_error_and_breakpoint_end_a_run() {
        let state = CpuSnapshot::default();
        assert!(Event::Halted {
            state: state.clone()
        }
        .is_terminal());
        assert!(!Event::StateUpdate { state }.is_terminal());
        assert!(!Event::Ready.is_terminal());
    }
}
