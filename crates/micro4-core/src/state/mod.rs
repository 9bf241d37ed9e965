//! Architectural CPU state model primitives.

/// Register file storage.
pub mod registers;
/// Halt/error state machine.
pub mod run_state;

pub use registers::{Registers, NIBBLE_MASK};
pub use run_state::RunState;
