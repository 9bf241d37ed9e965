//! Static timing and size estimates for a generated circuit.

use std::fmt;

use crate::circuit::{Circuit, GateKind};

/// Clock cycles assumed per instruction for throughput estimates.
pub const CYCLES_PER_INSTRUCTION: f64 = 5.0;

/// Process generations and their typical gate delay in nanoseconds.
pub const TECHNOLOGIES: &[(&str, f64)] = &[
    ("Relay (1940s)", 10_000_000.0),
    ("Vacuum Tube (1950s)", 100_000.0),
    ("RTL (1960s)", 50.0),
    ("DTL (1965)", 30.0),
    ("TTL (1970s)", 10.0),
    ("NMOS (1980s)", 5.0),
    ("CMOS 1um (1985)", 2.0),
    ("CMOS 350nm (1995)", 0.5),
    ("CMOS 65nm (2005)", 0.1),
    ("CMOS 7nm (2020)", 0.01),
];

/// Estimated CMOS transistors for one primitive gate.
#[must_use]
pub const fn transistor_count(kind: GateKind) -> u32 {
    match kind {
        GateKind::Not => 2,
        GateKind::Buf => 4,
        GateKind::And | GateKind::Or => 6,
        GateKind::Xor => 12,
        GateKind::Dff => 40,
    }
}

/// Size and depth summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TimingReport {
    /// Longest combinational path, in gate delays.
    pub critical_path_depth: u32,
    /// Primitive gate count.
    pub total_gates: usize,
    /// Estimated transistor count.
    pub total_transistors: u32,
    /// Flip-flop count.
    pub flip_flops: usize,
}

/// Measures `circuit`.
///
/// Each gate output sits one level above its deepest input. Flip-flop
/// outputs and undriven wires are level 0. Levels on a combinational cycle
/// stop growing after one pass per gate.
#[must_use]
pub fn analyze(circuit: &Circuit) -> TimingReport {
    let total_transistors = circuit
        .gates
        .iter()
        .map(|gate| transistor_count(gate.kind))
        .sum::<u32>();

    let mut levels: Vec<Vec<u32>> = circuit
        .wires
        .iter()
        .map(|wire| vec![0; wire.width])
        .collect();
    let level_of = |levels: &[Vec<u32>], wire: usize, bit: usize| {
        levels
            .get(wire)
            .and_then(|bits| bits.get(bit))
            .copied()
            .unwrap_or_default()
    };

    for _ in 0..=circuit.gates.len() {
        let mut changed = false;
        for gate in circuit.gates.iter().filter(|gate| !gate.kind.is_sequential()) {
            let deepest = gate
                .inputs
                .iter()
                .map(|port| level_of(&levels, port.wire, port.bit))
                .max()
                .unwrap_or_default();
            if let Some(slot) = levels
                .get_mut(gate.output.wire)
                .and_then(|bits| bits.get_mut(gate.output.bit))
            {
                if deepest + 1 > *slot {
                    *slot = deepest + 1;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }

    TimingReport {
        critical_path_depth: levels.iter().flatten().copied().max().unwrap_or_default(),
        total_gates: circuit.gates.len(),
        total_transistors,
        flip_flops: circuit.flip_flop_count(),
    }
}

/// Maximum clock and throughput for one technology.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockEstimate {
    /// Technology label.
    pub technology: &'static str,
    /// Delay of one gate, in nanoseconds.
    pub gate_delay_ns: f64,
    /// Highest clock the critical path allows, in hertz.
    pub max_clock_hz: f64,
    /// Millions of instructions per second at that clock.
    pub mips: f64,
}

/// Clock estimates for every entry in [`TECHNOLOGIES`]; empty when the
/// circuit has no combinational path.
#[must_use]
pub fn clock_estimates(report: &TimingReport) -> Vec<ClockEstimate> {
    if report.critical_path_depth == 0 {
        return Vec::new();
    }
    let depth = f64::from(report.critical_path_depth);
    TECHNOLOGIES
        .iter()
        .map(|&(technology, gate_delay_ns)| {
            let max_clock_hz = 1.0e9 / (depth * gate_delay_ns);
            ClockEstimate {
                technology,
                gate_delay_ns,
                max_clock_hz,
                mips: max_clock_hz / CYCLES_PER_INSTRUCTION / 1.0e6,
            }
        })
        .collect()
}

/// Frequency with a readable unit, e.g. `12.50 MHz`.
#[must_use]
pub fn format_frequency(hz: f64) -> String {
    if hz >= 1e9 {
        format!("{:.2} GHz", hz / 1e9)
    } else if hz >= 1e6 {
        format!("{:.2} MHz", hz / 1e6)
    } else if hz >= 1e3 {
        format!("{:.2} kHz", hz / 1e3)
    } else {
        format!("{hz:.2} Hz")
    }
}

/// Delay with a readable unit, e.g. `10 ns`.
#[must_use]
pub fn format_delay(ns: f64) -> String {
    if ns >= 1e6 {
        format!("{:.0} ms", ns / 1e6)
    } else if ns >= 1e3 {
        format!("{:.0} us", ns / 1e3)
    } else if ns >= 1.0 {
        format!("{ns:.0} ns")
    } else {
        format!("{:.0} ps", ns * 1000.0)
    }
}

fn format_mips(mips: f64) -> String {
    if mips >= 1000.0 {
        format!("{mips:.0}")
    } else if mips >= 1.0 {
        format!("{mips:.1}")
    } else if mips >= 0.001 {
        format!("{mips:.4}")
    } else {
        format!("{mips:.2e}")
    }
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Circuit Timing Analysis ===")?;
        writeln!(f, "Total gates:        {}", self.total_gates)?;
        writeln!(f, "Total transistors:  ~{}", self.total_transistors)?;
        writeln!(f, "Flip-flops:         {}", self.flip_flops)?;
        writeln!(f, "Critical path:      {} gate delays", self.critical_path_depth)?;

        let estimates = clock_estimates(self);
        if estimates.is_empty() {
            return writeln!(f, "\n(No combinational logic path found)");
        }

        writeln!(f, "\n=== Estimated Clock Speeds ===")?;
        writeln!(
            f,
            "{:<20} | {:<12} | {:<12} | {:<12}",
            "Technology", "Gate Delay", "Max Clock", "MIPS (est)"
        )?;
        for estimate in estimates {
            writeln!(
                f,
                "{:<20} | {:<12} | {:<12} | {:<12}",
                estimate.technology,
                format_delay(estimate.gate_delay_ns),
                format_frequency(estimate.max_clock_hz),
                format_mips(estimate.mips)
            )?;
        }
        Ok(())
    }
}
