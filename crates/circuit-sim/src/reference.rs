//! The bundled Micro4 datapath netlist.
//!
//! Gate ids produced from this source are the ids named by
//! [`micro4_core::CORRELATION_TABLE`].

use crate::circuit::Circuit;
use crate::generator::{compile, CompileError};

/// HDL source of the reference datapath.
pub const REFERENCE_DATAPATH: &str = include_str!("../circuits/micro4_datapath.m4hdl");

/// Compiles [`REFERENCE_DATAPATH`].
///
/// # Errors
///
/// Only fails if the bundled source is broken.
pub fn reference_circuit() -> Result<Circuit, CompileError> {
    compile(REFERENCE_DATAPATH)
}
