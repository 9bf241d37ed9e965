//! CLI entry point for the Micro4 circuit simulator binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use circuit_sim::{
    analyze, compile, reference_circuit, Circuit, CircuitEngine, CompileError, EngineConfig,
    EngineError, DEFAULT_MAX_PASSES, REFERENCE_DATAPATH,
};
use micro4_core as _;
use thiserror as _;
use tracing as _;

#[cfg(feature = "serde")]
use serde as _;
#[cfg(test)]
use proptest as _;
#[cfg(test)]
use tempfile as _;

#[derive(Parser, Debug)]
#[command(
    name = "m4sim",
    version,
    about = "Gate-level circuit simulator for the Micro4 datapath",
    long_about = "Compile HDL netlists, drive their inputs and clock them.\n\nExamples:\n  m4sim check adder.m4hdl\n  m4sim sim adder.m4hdl --set a=3 --set b=5\n  m4sim sim counter.m4hdl --cycles 4 --dump gates\n  m4sim stats adder.m4hdl\n  m4sim reference"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Compile a netlist and report its size.
    Check {
        /// HDL source file.
        file: PathBuf,
    },

    /// Compile, drive inputs, settle and optionally clock a netlist.
    Sim {
        /// HDL source file.
        file: PathBuf,

        /// Input assignment `name=value`; value may be decimal, 0x or 0b.
        #[arg(long = "set", value_parser = parse_assignment)]
        sets: Vec<(String, u64)>,

        /// Clock cycles to run after the initial settle.
        #[arg(long, default_value_t = 0)]
        cycles: u64,

        /// Settle pass limit.
        #[arg(long, default_value_t = DEFAULT_MAX_PASSES)]
        max_passes: usize,

        /// What to print once the run ends.
        #[arg(long, value_enum, default_value_t = DumpKind::Wires)]
        dump: DumpKind,
    },

    /// Print gate, transistor and critical-path estimates.
    Stats {
        /// HDL source file.
        file: PathBuf,
    },

    /// Print the bundled Micro4 datapath estimates, or its source.
    Reference {
        /// Print the HDL source instead of the estimates.
        #[arg(long)]
        source: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DumpKind {
    Wires,
    Gates,
    All,
}

fn parse_number(text: &str) -> Result<u64, String> {
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        u64::from_str_radix(bin, 2)
    } else {
        text.parse()
    };
    parsed.map_err(|_| format!("invalid number '{text}'"))
}

fn parse_assignment(text: &str) -> Result<(String, u64), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{text}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing wire name in '{text}'"));
    }
    Ok((name.to_string(), parse_number(value.trim())?))
}

fn load(path: &Path) -> Result<Circuit, i32> {
    let source = fs::read_to_string(path).map_err(|e| {
        eprintln!("error: failed to read {}: {e}", path.display());
        1
    })?;
    compile(&source).map_err(|e| {
        report_compile_error(path, &e);
        1
    })
}

fn report_compile_error(path: &Path, e: &CompileError) {
    match e {
        CompileError::Hdl(err) => eprintln!("{}:{}: error: {}", path.display(), err.line, err.kind),
        CompileError::Generate(err) => eprintln!("{}: error: {err}", path.display()),
    }
}

fn run_check(path: &Path) -> Result<(), i32> {
    let circuit = load(path)?;
    let inputs = circuit.wires.iter().filter(|w| w.is_input).count();
    let outputs = circuit.wires.iter().filter(|w| w.is_output).count();
    println!(
        "{}: {} wires ({inputs} inputs, {outputs} outputs), {} gates ({} flip-flops)",
        path.display(),
        circuit.wires.len(),
        circuit.gates.len(),
        circuit.flip_flop_count()
    );
    Ok(())
}

fn run_sim(
    path: &Path,
    sets: &[(String, u64)],
    cycles: u64,
    max_passes: usize,
    dump: DumpKind,
) -> Result<(), i32> {
    let circuit = load(path)?;
    let mut engine = CircuitEngine::new(EngineConfig { max_passes });
    engine.load_circuit(circuit).map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;

    for (name, value) in sets {
        let id = engine.wire_by_name(name).map(|wire| wire.id).ok_or_else(|| {
            eprintln!("error: no wire named '{name}'");
            1
        })?;
        engine.set_input_wire(id, *value).map_err(|e| {
            eprintln!("error: {e}");
            1
        })?;
    }

    let outcome = engine
        .settle()
        .map(|_| ())
        .and_then(|()| engine.run_cycles(cycles).map(|_| ()));
    print_dump(engine.circuit(), dump);

    match outcome {
        Ok(()) => Ok(()),
        Err(e @ EngineError::NonConvergence { .. }) => {
            eprintln!("warning: {e}");
            Err(2)
        }
        Err(e) => {
            eprintln!("error: {e}");
            Err(1)
        }
    }
}

fn print_dump(circuit: &Circuit, dump: DumpKind) {
    println!(
        "cycle {} ({})",
        circuit.cycle,
        if circuit.stable { "stable" } else { "unstable" }
    );
    if matches!(dump, DumpKind::Wires | DumpKind::All) {
        print!("{}", circuit.dump_wires());
    }
    if matches!(dump, DumpKind::Gates | DumpKind::All) {
        print!("{}", circuit.dump_gates());
    }
}

fn run_stats(path: &Path) -> Result<(), i32> {
    let circuit = load(path)?;
    print!("{}", analyze(&circuit));
    Ok(())
}

fn run_reference(source: bool) -> Result<(), i32> {
    if source {
        print!("{REFERENCE_DATAPATH}");
        return Ok(());
    }
    let circuit = reference_circuit().map_err(|e| {
        eprintln!("error: bundled datapath failed to compile: {e}");
        1
    })?;
    print!("{}", analyze(&circuit));
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Check { file } => run_check(&file),
        Commands::Sim {
            file,
            sets,
            cycles,
            max_passes,
            dump,
        } => run_sim(&file, &sets, cycles, max_passes, dump),
        Commands::Stats { file } => run_stats(&file),
        Commands::Reference { source } => run_reference(source),
    };

    process::exit(match result {
        Ok(()) => 0,
        Err(code) => code,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("12", 12)]
    #[case("0x1F", 31)]
    #[case("0b101", 5)]
    fn parses_numbers(#[case] text: &str, #[case] expected: u64) {
        assert_eq!(parse_number(text), Ok(expected));
    }

    #[test]
    fn rejects_malformed_assignments() {
        assert!(parse_assignment("a").is_err());
        assert!(parse_assignment("=3").is_err());
        assert!(parse_assignment("a=0xZZ").is_err());
        assert_eq!(parse_assignment(" a = 7"), Ok(("a".to_string(), 7)));
    }

    #[test]
    fn parses_sim_command() {
        let cli = Cli::try_parse_from([
            "m4sim", "sim", "adder.m4hdl", "--set", "a=3", "--set", "b=0b11", "--cycles", "2",
            "--dump", "gates",
        ])
        .expect("valid sim args should parse");

        assert_eq!(
            cli.command,
            Commands::Sim {
                file: PathBuf::from("adder.m4hdl"),
                sets: vec![("a".to_string(), 3), ("b".to_string(), 3)],
                cycles: 2,
                max_passes: DEFAULT_MAX_PASSES,
                dump: DumpKind::Gates,
            }
        );
    }

    #[test]
    fn parses_reference_flag() {
        let cli = Cli::try_parse_from(["m4sim", "reference", "--source"]).expect("parses");
        assert_eq!(cli.command, Commands::Reference { source: true });
    }

    #[test]
    fn rejects_unknown_command() {
        assert!(Cli::try_parse_from(["m4sim", "unknown"]).is_err());
    }

    #[test]
    fn rejects_bad_assignment_at_parse_time() {
        assert!(Cli::try_parse_from(["m4sim", "sim", "x.m4hdl", "--set", "a"]).is_err());
    }
}
