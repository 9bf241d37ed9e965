//! Netlist-to-circuit generation.
//!
//! Ids are assigned in declaration order after the constant wires `gnd`
//! (id 0) and `vdd` (id 1), so identical source text always yields identical
//! ids. Every symbolic reference must resolve; a reference
//! the compiler let through but the generator cannot place is reported, never
//! defaulted.

use std::collections::HashMap;

use thiserror::Error;

use crate::circuit::{Circuit, Gate, PortRef, Wire, CONSTANT_WIRES};
use crate::hdl::{self, BitRef, HdlError, NetlistAst};
use crate::logic::Bit;

const LOG_TARGET: &str = "circuit_sim::generator";

/// A netlist that cannot be lowered into a circuit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// A gate port names a wire with no generated id.
    #[error("gate '{gate}' references unresolved wire '{wire}'")]
    UnresolvedWire {
        /// Gate instance name.
        gate: String,
        /// Wire name as referenced.
        wire: String,
    },
    /// A gate port names a bit outside its wire.
    #[error("gate '{gate}' references bit {bit} outside wire '{wire}'")]
    BitOutOfRange {
        /// Gate instance name.
        gate: String,
        /// Wire name.
        wire: String,
        /// Declared bit index as referenced.
        bit: usize,
    },
    /// Two wire declarations share a name.
    #[error("wire '{0}' declared more than once")]
    DuplicateWire(String),
    /// A gate output lands on `gnd` or `vdd`.
    #[error("gate '{gate}' drives constant wire '{wire}'")]
    DrivesConstant {
        /// Gate instance name.
        gate: String,
        /// Constant wire name.
        wire: String,
    },
}

/// Failure anywhere between source text and circuit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Source text rejected by the HDL compiler.
    #[error(transparent)]
    Hdl(#[from] HdlError),
    /// Netlist rejected by the generator.
    #[error("generation failed: {0}")]
    Generate(#[from] GenerateError),
}

impl CompileError {
    /// Source line of an HDL error.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::Hdl(err) => Some(err.line),
            Self::Generate(_) => None,
        }
    }
}

/// Builds a fresh circuit from `ast`.
///
/// All wire bits apart from `vdd` start at `Zero`, flip-flops store `Zero`,
/// the cycle counter is 0 and the circuit is marked stable.
///
/// # Errors
///
/// Returns a [`GenerateError`] for any unresolved reference, duplicate wire
/// name or driven constant.
pub fn generate(ast: &NetlistAst) -> Result<Circuit, GenerateError> {
    let capacity = CONSTANT_WIRES.len() + ast.wires.len();
    let mut wires = Vec::with_capacity(capacity);
    let mut ids: HashMap<&str, usize> = HashMap::with_capacity(capacity);
    for (id, (name, level)) in CONSTANT_WIRES.iter().enumerate() {
        ids.insert(*name, id);
        wires.push(Wire::constant(id, *name, *level));
    }
    for decl in &ast.wires {
        let id = wires.len();
        if ids.insert(decl.name.as_str(), id).is_some() {
            return Err(GenerateError::DuplicateWire(decl.name.clone()));
        }
        wires.push(Wire::new(id, decl.name.clone(), decl.width, decl.lsb));
    }

    let resolve = |gate: &str, reference: &BitRef| -> Result<PortRef, GenerateError> {
        let wire = *ids
            .get(reference.wire.as_str())
            .ok_or_else(|| GenerateError::UnresolvedWire {
                gate: gate.to_string(),
                wire: reference.wire.clone(),
            })?;
        let bit = wires[wire]
            .offset_of(reference.bit)
            .ok_or_else(|| GenerateError::BitOutOfRange {
                gate: gate.to_string(),
                wire: reference.wire.clone(),
                bit: reference.bit,
            })?;
        Ok(PortRef::new(wire, bit))
    };

    let mut gates = Vec::with_capacity(ast.gates.len());
    for (id, inst) in ast.gates.iter().enumerate() {
        let inputs = inst
            .inputs
            .iter()
            .map(|reference| resolve(&inst.name, reference))
            .collect::<Result<Vec<_>, _>>()?;
        let output = resolve(&inst.name, &inst.output)?;
        if wires[output.wire].is_constant {
            return Err(GenerateError::DrivesConstant {
                gate: inst.name.clone(),
                wire: inst.output.wire.clone(),
            });
        }
        gates.push(Gate {
            id,
            name: inst.name.clone(),
            kind: inst.kind,
            inputs,
            output,
            stored: Bit::Zero,
        });
    }

    let mut driven = vec![false; wires.len()];
    let mut read = vec![false; wires.len()];
    for gate in &gates {
        driven[gate.output.wire] = true;
        for port in &gate.inputs {
            read[port.wire] = true;
        }
    }
    for wire in &mut wires {
        wire.is_input = !driven[wire.id] && !wire.is_constant;
        wire.is_output = driven[wire.id] && !read[wire.id];
    }

    tracing::debug!(
        target: LOG_TARGET,
        wires = wires.len(),
        gates = gates.len(),
        "circuit generated"
    );
    Ok(Circuit {
        cycle: 0,
        stable: true,
        wires,
        gates,
    })
}

/// Compiles HDL source text straight to a circuit.
///
/// # Errors
///
/// Returns [`CompileError::Hdl`] for source errors and
/// [`CompileError::Generate`] for generation failures.
pub fn compile(source: &str) -> Result<Circuit, CompileError> {
    let ast = hdl::parse_netlist(source)?;
    Ok(generate(&ast)?)
}
