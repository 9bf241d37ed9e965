//! HDL compiler: source text to a primitive [`NetlistAst`].
//!
//! The source is line oriented. Each line holds zero or more statements
//! separated by top-level `;`, and `#` or `//` starts a comment:
//!
//! ```text
//! wire a; wire b; wire sum[3:0]
//! and g1 (input: a, b; output: c)       # c = a & b
//! mux2 m (input: x, y, sel; output: sum) // sliced per output bit
//! ```
//!
//! Wires must be declared before use, apart from the constants `gnd` and
//! `vdd`, which are always in scope and read-only. Compilation stops at the
//! first error.

/// Parsed statements and the lowered netlist.
pub mod ast;
/// Gate slicing and compound-type decomposition.
pub mod decompose;
/// Line-numbered compile errors.
pub mod errors;
/// Line tokenizer.
pub mod lexer;
/// Statement parser.
pub mod parser;

pub use ast::{BitRef, GateInst, GateType, NetlistAst, WireDecl};
pub use errors::{HdlError, HdlErrorKind};

use decompose::Lowering;

const LOG_TARGET: &str = "circuit_sim::hdl";

/// Compiles HDL source text into a primitive netlist.
///
/// # Errors
///
/// Returns the first [`HdlError`] in source order.
pub fn parse_netlist(source: &str) -> Result<NetlistAst, HdlError> {
    let mut lowering = Lowering::default();

    for (index, text) in source.lines().enumerate() {
        let line = index + 1;
        let tokens = lexer::tokenize(line, text)?;
        for statement in lexer::split_statements(line, &tokens)? {
            lowering.apply(line, parser::parse_statement(line, statement)?)?;
        }
    }

    let ast = lowering.finish();
    tracing::debug!(
        target: LOG_TARGET,
        wires = ast.wires.len(),
        gates = ast.gates.len(),
        "netlist parsed"
    );
    Ok(ast)
}
