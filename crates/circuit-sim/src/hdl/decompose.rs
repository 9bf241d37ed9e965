//! Lowering of parsed statements into a primitive, single-bit netlist.
//!
//! Every gate wider than one bit is sliced into one gate per output bit,
//! named `NAME[i]` and emitted least significant bit first. Each slice of a
//! compound type is then decomposed into primitives in a fixed order, which
//! determines the generated gate ids:
//!
//! | Source | Gates (in id order) | Added wires |
//! |---|---|---|
//! | `nand` | `AND NAME.core`, `NOT NAME` | `NAME.n` |
//! | `nor` | `OR NAME.core`, `NOT NAME` | `NAME.n` |
//! | `xnor` | `XOR NAME.core`, `NOT NAME` | `NAME.n` |
//! | `mux2(a, b, sel)` | `NOT NAME.sel_n`, `AND NAME.a`, `AND NAME.b`, `OR NAME` | `NAME.sel_n`, `NAME.pa`, `NAME.pb` |
//!
//! `mux2` drives `a` when `sel` is 0 and `b` when `sel` is 1.
//!
//! The constant wires `gnd` and `vdd` are always in scope. They never appear
//! in [`NetlistAst::wires`] and may only be read.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::ast::{
    BitRef, GateInst, GateType, NetlistAst, Selection, SignalRef, Statement, WireDecl,
};
use super::errors::{HdlError, HdlErrorKind};
use crate::circuit::{GateKind, CONSTANT_WIRES};

#[derive(Debug, Clone, Copy)]
struct DeclaredWire {
    width: usize,
    lsb: usize,
}

impl DeclaredWire {
    const fn msb(self) -> usize {
        self.lsb + self.width - 1
    }

    const fn contains(self, bit: usize) -> bool {
        bit >= self.lsb && bit <= self.msb()
    }
}

/// Declared bits of one resolved reference, least significant first.
#[derive(Debug, Clone)]
struct ResolvedRef {
    wire: String,
    bits: Vec<usize>,
}

impl ResolvedRef {
    fn width(&self) -> usize {
        self.bits.len()
    }

    /// The bit feeding slice `slice`; width-1 refs broadcast.
    fn slice(&self, slice: usize) -> BitRef {
        let bit = if self.bits.len() == 1 {
            self.bits[0]
        } else {
            self.bits[slice]
        };
        BitRef::new(self.wire.clone(), bit)
    }
}

/// Incremental statement-to-netlist lowering.
#[derive(Debug)]
pub struct Lowering {
    ast: NetlistAst,
    wires: HashMap<String, DeclaredWire>,
    instances: HashSet<String>,
    driven: BTreeSet<BitRef>,
}

impl Default for Lowering {
    fn default() -> Self {
        let wires = CONSTANT_WIRES
            .iter()
            .map(|(name, _)| ((*name).to_string(), DeclaredWire { width: 1, lsb: 0 }))
            .collect();
        Self {
            ast: NetlistAst::default(),
            wires,
            instances: HashSet::new(),
            driven: BTreeSet::new(),
        }
    }
}

impl Lowering {
    /// Applies one statement from `line`.
    ///
    /// # Errors
    ///
    /// Returns the first declaration, reference, width, arity or driver
    /// error found in the statement. A failed statement leaves the lowering
    /// unchanged.
    pub fn apply(&mut self, line: usize, statement: Statement) -> Result<(), HdlError> {
        match statement {
            Statement::Wire { name, range } => self.declare_wire(line, name, range),
            Statement::Gate {
                ty,
                name,
                inputs,
                outputs,
            } => self.instantiate(line, ty, &name, &inputs, &outputs),
        }
    }

    /// The finished netlist.
    #[must_use]
    pub fn finish(self) -> NetlistAst {
        self.ast
    }

    fn declare_wire(
        &mut self,
        line: usize,
        name: String,
        range: Option<(usize, usize)>,
    ) -> Result<(), HdlError> {
        let (hi, lo) = range.unwrap_or((0, 0));
        if hi < lo {
            return Err(HdlError::new(line, HdlErrorKind::InvalidRange { hi, lo }));
        }
        if self.wires.contains_key(&name) {
            return Err(HdlError::new(line, HdlErrorKind::DuplicateWire(name)));
        }
        self.add_wire(line, name, hi - lo + 1, lo);
        Ok(())
    }

    fn add_wire(&mut self, line: usize, name: String, width: usize, lsb: usize) {
        self.wires.insert(name.clone(), DeclaredWire { width, lsb });
        self.ast.wires.push(WireDecl {
            name,
            width,
            lsb,
            line,
        });
    }

    fn instantiate(
        &mut self,
        line: usize,
        ty: GateType,
        name: &str,
        inputs: &[SignalRef],
        outputs: &[SignalRef],
    ) -> Result<(), HdlError> {
        if self.instances.contains(name) {
            return Err(HdlError::new(line, HdlErrorKind::DuplicateGate(name.to_string())));
        }

        let arity = ty.input_arity();
        if !arity.accepts(inputs.len()) {
            return Err(HdlError::new(
                line,
                HdlErrorKind::ArityMismatch {
                    gate: name.to_string(),
                    port: "input",
                    expected: arity.to_string(),
                    found: inputs.len(),
                },
            ));
        }
        let [output] = outputs else {
            return Err(HdlError::new(
                line,
                HdlErrorKind::ArityMismatch {
                    gate: name.to_string(),
                    port: "output",
                    expected: "exactly 1".to_string(),
                    found: outputs.len(),
                },
            ));
        };

        let inputs = inputs
            .iter()
            .map(|signal| self.resolve(line, signal))
            .collect::<Result<Vec<_>, _>>()?;
        let output = self.resolve(line, output)?;

        if CONSTANT_WIRES.iter().any(|(constant, _)| *constant == output.wire) {
            return Err(HdlError::new(line, HdlErrorKind::ConstantDriven(output.wire)));
        }

        let width = output.width();
        if let Some(bad) = inputs.iter().find(|input| input.width() != width && input.width() != 1) {
            return Err(HdlError::new(
                line,
                HdlErrorKind::WidthMismatch {
                    gate: name.to_string(),
                    expected: width,
                    found: bad.width(),
                },
            ));
        }

        for bit in &output.bits {
            let driven = BitRef::new(output.wire.clone(), *bit);
            if self.driven.contains(&driven) {
                return Err(HdlError::new(
                    line,
                    HdlErrorKind::MultipleDrivers {
                        wire: output.wire.clone(),
                        bit: *bit,
                    },
                ));
            }
        }
        self.driven
            .extend(output.bits.iter().map(|bit| BitRef::new(output.wire.clone(), *bit)));
        self.instances.insert(name.to_string());

        for slice in 0..width {
            let slice_name = if width == 1 {
                name.to_string()
            } else {
                format!("{name}[{slice}]")
            };
            let slice_inputs: Vec<BitRef> = inputs.iter().map(|input| input.slice(slice)).collect();
            self.emit(line, ty, slice_name, slice_inputs, output.slice(slice));
        }
        Ok(())
    }

    fn resolve(&self, line: usize, signal: &SignalRef) -> Result<ResolvedRef, HdlError> {
        let wire = *self
            .wires
            .get(&signal.wire)
            .ok_or_else(|| HdlError::new(line, HdlErrorKind::UndeclaredWire(signal.wire.clone())))?;
        let out_of_range = |bit: usize| {
            HdlError::new(
                line,
                HdlErrorKind::BitOutOfRange {
                    wire: signal.wire.clone(),
                    bit,
                    msb: wire.msb(),
                    lsb: wire.lsb,
                },
            )
        };

        let bits: Vec<usize> = match signal.selection {
            Selection::Whole => (wire.lsb..=wire.msb()).collect(),
            Selection::Bit(bit) => {
                if !wire.contains(bit) {
                    return Err(out_of_range(bit));
                }
                vec![bit]
            }
            Selection::Range { hi, lo } => {
                if hi < lo {
                    return Err(HdlError::new(line, HdlErrorKind::InvalidRange { hi, lo }));
                }
                if let Some(bad) = [hi, lo].into_iter().find(|bit| !wire.contains(*bit)) {
                    return Err(out_of_range(bad));
                }
                (lo..=hi).collect()
            }
        };
        Ok(ResolvedRef {
            wire: signal.wire.clone(),
            bits,
        })
    }

    /// Emits one single-bit slice, decomposing compound types.
    fn emit(
        &mut self,
        line: usize,
        ty: GateType,
        name: String,
        inputs: Vec<BitRef>,
        output: BitRef,
    ) {
        if let Some(kind) = ty.primitive() {
            self.push_gate(line, name, kind, inputs, output);
            return;
        }

        match ty {
            GateType::Nand | GateType::Nor | GateType::Xnor => {
                let core_kind = match ty {
                    GateType::Nand => GateKind::And,
                    GateType::Nor => GateKind::Or,
                    _ => GateKind::Xor,
                };
                let inner = self.internal_wire(line, &name, "n");
                self.push_gate(line, format!("{name}.core"), core_kind, inputs, inner.clone());
                self.push_gate(line, name, GateKind::Not, vec![inner], output);
            }
            GateType::Mux2 => {
                let Ok([a, b, sel]) = <[BitRef; 3]>::try_from(inputs) else {
                    return;
                };
                let sel_n = self.internal_wire(line, &name, "sel_n");
                let pa = self.internal_wire(line, &name, "pa");
                let pb = self.internal_wire(line, &name, "pb");
                self.push_gate(
                    line,
                    format!("{name}.sel_n"),
                    GateKind::Not,
                    vec![sel.clone()],
                    sel_n.clone(),
                );
                self.push_gate(
                    line,
                    format!("{name}.a"),
                    GateKind::And,
                    vec![a, sel_n],
                    pa.clone(),
                );
                self.push_gate(
                    line,
                    format!("{name}.b"),
                    GateKind::And,
                    vec![b, sel],
                    pb.clone(),
                );
                self.push_gate(line, name, GateKind::Or, vec![pa, pb], output);
            }
            GateType::And
            | GateType::Or
            | GateType::Xor
            | GateType::Not
            | GateType::Buf
            | GateType::Dff => {}
        }
    }

    fn internal_wire(&mut self, line: usize, gate: &str, suffix: &str) -> BitRef {
        let name = format!("{gate}.{suffix}");
        self.add_wire(line, name.clone(), 1, 0);
        BitRef::new(name, 0)
    }

    fn push_gate(
        &mut self,
        line: usize,
        name: String,
        kind: GateKind,
        inputs: Vec<BitRef>,
        output: BitRef,
    ) {
        self.ast.gates.push(GateInst {
            name,
            kind,
            inputs,
            output,
            line,
        });
    }
}
