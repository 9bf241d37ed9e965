//! Integration tests for the m4sim CLI.

use circuit_sim as _;
use clap as _;
use micro4_core as _;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use thiserror as _;
use tracing as _;
use tracing_subscriber as _;

fn binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.join("m4sim")
}

fn create_temp_file(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

const HALF_ADDER: &str = "\
wire a; wire b; wire s; wire c
xor sx (input: a, b; output: s)
and cx (input: a, b; output: c)
";

#[test]
fn check_reports_sizes() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "half.m4hdl", HALF_ADDER);

    let output = Command::new(binary_path())
        .args(["check", source.to_str().unwrap()])
        .output()
        .expect("failed to run m4sim");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("6 wires (2 inputs, 2 outputs), 2 gates (0 flip-flops)"));
}

#[test]
fn check_reports_error_line() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(
        temp_dir.path(),
        "bad.m4hdl",
        "wire a; wire y\n\nnot n (input: missing; output: y)\n",
    );

    let output = Command::new(binary_path())
        .args(["check", source.to_str().unwrap()])
        .output()
        .expect("failed to run m4sim");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bad.m4hdl:3: error:"));
    assert!(stderr.contains("missing"));
}

#[test]
fn sim_applies_inputs_and_dumps_wires() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "half.m4hdl", HALF_ADDER);

    let output = Command::new(binary_path())
        .args([
            "sim",
            source.to_str().unwrap(),
            "--set",
            "a=1",
            "--set",
            "b=0b1",
        ])
        .output()
        .expect("failed to run m4sim");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cycle 0 (stable)"));
    let line_for = |name: &str| {
        stdout
            .lines()
            .find(|line| line.split_whitespace().nth(2) == Some(name))
            .map(str::to_string)
            .unwrap()
    };
    assert!(line_for("s").contains("[1 bits]: 0"));
    assert!(line_for("c").contains("[1 bits]: 1"));
}

#[test]
fn sim_rejects_unknown_wire() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "half.m4hdl", HALF_ADDER);

    let output = Command::new(binary_path())
        .args(["sim", source.to_str().unwrap(), "--set", "ghost=1"])
        .output()
        .expect("failed to run m4sim");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no wire named 'ghost'"));
}

#[test]
fn sim_flags_oscillation_with_exit_code_two() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(
        temp_dir.path(),
        "ring.m4hdl",
        "wire a\nnot n (input: a; output: a)\n",
    );

    let output = Command::new(binary_path())
        .args(["sim", source.to_str().unwrap(), "--max-passes", "5"])
        .output()
        .expect("failed to run m4sim");

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stdout).contains("(unstable)"));
}

#[test]
fn sim_clocks_flip_flops() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(
        temp_dir.path(),
        "toggle.m4hdl",
        "wire q; wire d\nnot n (input: q; output: d)\ndff r (input: d; output: q)\n",
    );

    let output = Command::new(binary_path())
        .args([
            "sim",
            source.to_str().unwrap(),
            "--cycles",
            "3",
            "--dump",
            "gates",
        ])
        .output()
        .expect("failed to run m4sim");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cycle 3 (stable)"));
    assert!(stdout.contains("(stored=1)"));
}

#[test]
fn stats_and_reference_print_timing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "half.m4hdl", HALF_ADDER);

    let stats = Command::new(binary_path())
        .args(["stats", source.to_str().unwrap()])
        .output()
        .expect("failed to run m4sim");
    assert!(stats.status.success());
    let stdout = String::from_utf8_lossy(&stats.stdout);
    assert!(stdout.contains("Total gates:        2"));
    assert!(stdout.contains("Critical path:      1 gate delays"));

    let reference = Command::new(binary_path())
        .arg("reference")
        .output()
        .expect("failed to run m4sim");
    assert!(reference.status.success());
    assert!(String::from_utf8_lossy(&reference.stdout).contains("Total gates:        95"));
}

#[test]
fn missing_file_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let missing = temp_dir.path().join("nope.m4hdl");

    let status = Command::new(binary_path())
        .args(["check", missing.to_str().unwrap()])
        .status()
        .expect("failed to run m4sim");

    assert!(!status.success());
}
