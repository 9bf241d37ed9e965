//! Simulatable circuit snapshot: wires, primitive gates and their ports.

use std::fmt::{self, Write as _};

use crate::logic::{and_all, or_all, xor_all, Bit};

/// Primitive gate kinds understood by the evaluation engine.
///
/// Compound HDL types (`nand`, `nor`, `xnor`, `mux2`) never reach a
/// [`Circuit`]; the compiler lowers them to these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GateKind {
    /// N-input AND.
    And,
    /// N-input OR.
    Or,
    /// Two-input XOR.
    Xor,
    /// Inverter.
    Not,
    /// Non-inverting buffer.
    Buf,
    /// Rising-edge D flip-flop.
    Dff,
}

impl GateKind {
    /// Every primitive kind.
    pub const ALL: [Self; 6] = [
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Not,
        Self::Buf,
        Self::Dff,
    ];

    /// Upper-case display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Not => "NOT",
            Self::Buf => "BUF",
            Self::Dff => "DFF",
        }
    }

    /// True for clocked storage elements.
    #[must_use]
    pub const fn is_sequential(self) -> bool {
        matches!(self, Self::Dff)
    }

    /// Output level for the given input levels.
    ///
    /// A flip-flop drives its `stored` value; its input only matters at a
    /// clock edge.
    #[must_use]
    pub fn evaluate(self, inputs: &[Bit], stored: Bit) -> Bit {
        match self {
            Self::And => and_all(inputs.iter().copied()),
            Self::Or => or_all(inputs.iter().copied()),
            Self::Xor => xor_all(inputs.iter().copied()),
            Self::Not => inputs.first().map_or(Bit::Undefined, |bit| !*bit),
            Self::Buf => inputs.first().copied().unwrap_or(Bit::Undefined),
            Self::Dff => stored,
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of the constant-0 wire present in every circuit, at id 0.
pub const GND: &str = "gnd";
/// Name of the constant-1 wire present in every circuit, at id 1.
pub const VDD: &str = "vdd";

/// Constant wires in id order with their fixed levels.
pub const CONSTANT_WIRES: [(&str, Bit); 2] = [(GND, Bit::Zero), (VDD, Bit::One)];

/// A resolved connection to one bit of one wire.
///
/// `bit` is the offset into [`Wire::state`], not the declared bit index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortRef {
    /// Wire id.
    pub wire: usize,
    /// Bit offset within the wire.
    pub bit: usize,
}

impl PortRef {
    /// Port on `wire` at offset `bit`.
    #[must_use]
    pub const fn new(wire: usize, bit: usize) -> Self {
        Self { wire, bit }
    }
}

/// A named bus of one or more bits.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Wire {
    /// Stable id, equal to the index in [`Circuit::wires`].
    pub id: usize,
    /// Declared name.
    pub name: String,
    /// Number of bits.
    pub width: usize,
    /// Declared index of the least significant bit.
    pub lsb: usize,
    /// No gate drives any bit of this wire.
    pub is_input: bool,
    /// Driven by a gate and read by none.
    pub is_output: bool,
    /// Tied to a fixed level; never driven, set or reset.
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_constant: bool,
    /// Current levels, least significant bit first.
    pub state: Vec<Bit>,
}

impl Wire {
    /// A wire with every bit at `Zero`.
    #[must_use]
    pub fn new(id: usize, name: impl Into<String>, width: usize, lsb: usize) -> Self {
        Self {
            id,
            name: name.into(),
            width,
            lsb,
            is_input: false,
            is_output: false,
            is_constant: false,
            state: vec![Bit::Zero; width],
        }
    }

    /// A single-bit wire tied to `level`.
    #[must_use]
    pub fn constant(id: usize, name: impl Into<String>, level: Bit) -> Self {
        Self {
            is_constant: true,
            state: vec![level],
            ..Self::new(id, name, 1, 0)
        }
    }

    /// Declared index of the most significant bit.
    #[must_use]
    pub const fn msb(&self) -> usize {
        self.lsb + self.width - 1
    }

    /// Converts a declared bit index to a state offset.
    #[must_use]
    pub const fn offset_of(&self, bit: usize) -> Option<usize> {
        if bit >= self.lsb && bit - self.lsb < self.width {
            Some(bit - self.lsb)
        } else {
            None
        }
    }

    /// Level at state offset `offset`.
    #[must_use]
    pub fn bit(&self, offset: usize) -> Option<Bit> {
        self.state.get(offset).copied()
    }

    /// Numeric value, or `None` if any bit is undefined or the wire is
    /// wider than 64 bits.
    #[must_use]
    pub fn value(&self) -> Option<u64> {
        if self.width > 64 {
            return None;
        }
        self.state
            .iter()
            .enumerate()
            .try_fold(0u64, |acc, (offset, bit)| {
                bit.to_bool()
                    .map(|level| acc | (u64::from(level) << offset))
            })
    }

    /// Drives every bit from `value`, least significant bit first. Returns
    /// true if any bit changed.
    pub fn set_value(&mut self, value: u64) -> bool {
        let mut changed = false;
        for (offset, slot) in self.state.iter_mut().enumerate() {
            let level = offset < 64 && (value >> offset) & 1 == 1;
            let next = Bit::from_bool(level);
            if *slot != next {
                *slot = next;
                changed = true;
            }
        }
        changed
    }

    /// Returns every bit to `Zero`. Constant wires keep their level.
    pub fn reset(&mut self) {
        if !self.is_constant {
            self.state.fill(Bit::Zero);
        }
    }

    /// Levels rendered most significant bit first, e.g. `01X1`.
    #[must_use]
    pub fn render(&self) -> String {
        self.state.iter().rev().map(|bit| bit.symbol()).collect()
    }
}

/// A primitive gate with one output port.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gate {
    /// Stable id, equal to the index in [`Circuit::gates`].
    pub id: usize,
    /// Instance name after slicing and decomposition.
    pub name: String,
    /// Primitive kind.
    pub kind: GateKind,
    /// Ordered input ports.
    pub inputs: Vec<PortRef>,
    /// Output port.
    pub output: PortRef,
    /// Flip-flop contents; unused by combinational gates.
    pub stored: Bit,
}

/// A complete circuit snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Circuit {
    /// Clock edges applied so far.
    pub cycle: u64,
    /// True once a settle pass changed nothing.
    pub stable: bool,
    /// Wires in id order.
    pub wires: Vec<Wire>,
    /// Gates in id order.
    pub gates: Vec<Gate>,
}

impl Circuit {
    /// Wire by id.
    #[must_use]
    pub fn wire(&self, id: usize) -> Option<&Wire> {
        self.wires.get(id)
    }

    /// Gate by id.
    #[must_use]
    pub fn gate(&self, id: usize) -> Option<&Gate> {
        self.gates.get(id)
    }

    /// First wire named `name`.
    #[must_use]
    pub fn wire_by_name(&self, name: &str) -> Option<&Wire> {
        self.wires.iter().find(|wire| wire.name == name)
    }

    /// First gate named `name`.
    #[must_use]
    pub fn gate_by_name(&self, name: &str) -> Option<&Gate> {
        self.gates.iter().find(|gate| gate.name == name)
    }

    /// Level at `port`; `Undefined` for a dangling port.
    #[must_use]
    pub fn read(&self, port: PortRef) -> Bit {
        self.wire(port.wire)
            .and_then(|wire| wire.bit(port.bit))
            .unwrap_or(Bit::Undefined)
    }

    /// Returns the circuit to its power-on contents: every wire and flip-flop
    /// at `Zero` apart from the constants, cycle 0, not yet settled.
    pub fn reset(&mut self) {
        for wire in &mut self.wires {
            wire.reset();
        }
        for gate in &mut self.gates {
            gate.stored = Bit::Zero;
        }
        self.cycle = 0;
        self.stable = false;
    }

    /// Checks that ids match positions, that every port lands on an existing
    /// bit and that no gate drives a constant wire.
    ///
    /// # Errors
    ///
    /// Describes the first inconsistency found.
    pub fn validate(&self) -> Result<(), String> {
        for (index, wire) in self.wires.iter().enumerate() {
            if wire.id != index {
                return Err(format!("wire '{}' has id {} at position {index}", wire.name, wire.id));
            }
            if wire.width == 0 || wire.state.len() != wire.width {
                return Err(format!(
                    "wire '{}' has width {} but {} bits of state",
                    wire.name,
                    wire.width,
                    wire.state.len()
                ));
            }
        }
        for (index, gate) in self.gates.iter().enumerate() {
            if gate.id != index {
                return Err(format!("gate '{}' has id {} at position {index}", gate.name, gate.id));
            }
            for port in gate.inputs.iter().chain(std::iter::once(&gate.output)) {
                if self.wire(port.wire).and_then(|wire| wire.bit(port.bit)).is_none() {
                    return Err(format!(
                        "gate '{}' references missing bit {} of wire {}",
                        gate.name, port.bit, port.wire
                    ));
                }
            }
            if let Some(target) = self.wire(gate.output.wire).filter(|wire| wire.is_constant) {
                return Err(format!(
                    "gate '{}' drives constant wire '{}'",
                    gate.name, target.name
                ));
            }
        }
        Ok(())
    }

    /// Flip-flop count.
    #[must_use]
    pub fn flip_flop_count(&self) -> usize {
        self.gates
            .iter()
            .filter(|gate| gate.kind.is_sequential())
            .count()
    }

    /// Human-readable wire table.
    #[must_use]
    pub fn dump_wires(&self) -> String {
        let mut out = format!("=== Wires ({}) ===\n", self.wires.len());
        for wire in &self.wires {
            let _ = write!(
                out,
                "  [{:3}] {:<20} [{} bits]: {}",
                wire.id,
                wire.name,
                wire.width,
                wire.render()
            );
            if wire.is_input {
                out.push_str(" (input)");
            }
            if wire.is_output {
                out.push_str(" (output)");
            }
            if wire.is_constant {
                out.push_str(" (constant)");
            }
            out.push('\n');
        }
        out
    }

    /// Human-readable gate table.
    #[must_use]
    pub fn dump_gates(&self) -> String {
        let mut out = format!("=== Gates ({}) ===\n", self.gates.len());
        for gate in &self.gates {
            let _ = write!(out, "  [{:3}] {:<20} {:<4}  in:", gate.id, gate.name, gate.kind);
            for port in &gate.inputs {
                let _ = write!(out, " {}", self.port_label(*port));
            }
            let _ = write!(out, "  -> out: {}", self.port_label(gate.output));
            if gate.kind.is_sequential() {
                let _ = write!(out, " (stored={})", gate.stored);
            }
            out.push('\n');
        }
        out
    }

    fn port_label(&self, port: PortRef) -> String {
        self.wire(port.wire).map_or_else(
            || format!("?{}[{}]", port.wire, port.bit),
            |wire| format!("{}[{}]", wire.name, wire.lsb + port.bit),
        )
    }
}
