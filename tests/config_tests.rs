//! Integration tests for configuration loading and trace target validation.

use pipetrace::common::ConfigError;
use pipetrace::config::{Config, SimulationConfig, TraceTarget};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;

/// Tests the defaults used when no file is given.
#[test]
fn test_default_options() {
    let config = SimulationConfig::default();
    assert!(config.pipelining);
    assert!(config.forwarding);
    assert!(config.print_pipeline);
    assert!(!config.print_registers);
    assert!(!config.print_bp);
    assert!(!config.save_snapshots);
    assert!(!config.step);
    assert_eq!(config.trace, TraceTarget::None);
}

/// Tests that an empty file yields the defaults.
#[test]
fn test_empty_toml_uses_defaults() {
    let config = Config::from_toml_str("").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.simulator.executable, PathBuf::from("./riscv_sim"));
    assert_eq!(config.simulator.output_log_lines, 10_000);
}

/// Tests a complete configuration file.
#[test]
fn test_full_toml() {
    let text = r#"
        [simulator]
        executable = "/opt/sim/riscv_sim"
        input = "programs/fib.mc"
        snapshot_log = "out/cycle_snapshots.log"
        output_log_lines = 50

        [options]
        pipelining = true
        forwarding = false
        print_registers = true
        print_pipeline = false
        print_bp = true
        save_snapshots = true
        step = false

        [trace]
        pc = "0x1000"
    "#;
    let config = Config::from_toml_str(text).unwrap();
    assert_eq!(config.simulator.executable, PathBuf::from("/opt/sim/riscv_sim"));
    assert_eq!(config.simulator.input, Some(PathBuf::from("programs/fib.mc")));
    assert_eq!(
        config.simulator.snapshot_log,
        Some(PathBuf::from("out/cycle_snapshots.log"))
    );
    assert_eq!(config.simulator.output_log_lines, 50);
    assert!(!config.simulation.forwarding);
    assert!(config.simulation.print_registers);
    assert!(!config.simulation.print_pipeline);
    assert!(config.simulation.save_snapshots);
    assert_eq!(config.simulation.trace, TraceTarget::ByProgramCounter(0x1000));
}

/// Tests that an integer instruction number is accepted.
#[test]
fn test_trace_instruction_integer() {
    let config = Config::from_toml_str("[trace]\ninstruction = 12\n").unwrap();
    assert_eq!(config.simulation.trace, TraceTarget::ByInstructionNumber(12));
}

/// Tests that both trace keys are rejected together.
#[test]
fn test_conflicting_trace_keys() {
    let err = Config::from_toml_str("[trace]\ninstruction = 3\npc = \"0x40\"\n").unwrap_err();
    assert_eq!(err, ConfigError::ConflictingTrace);
}

/// Tests that a negative instruction number is rejected.
#[test]
fn test_negative_instruction_number_in_file() {
    let err = Config::from_toml_str("[trace]\ninstruction = -4\n").unwrap_err();
    assert_eq!(err, ConfigError::NegativeInstructionNumber(-4));
}

/// Tests that a type mismatch is reported as a TOML error.
#[test]
fn test_bad_option_type() {
    let err = Config::from_toml_str("[options]\npipelining = \"yes\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml { .. }));
}

/// Tests instruction-number parsing.
#[rstest]
#[case("0", Ok(TraceTarget::ByInstructionNumber(0)))]
#[case(" 17 ", Ok(TraceTarget::ByInstructionNumber(17)))]
#[case("18446744073709551615", Ok(TraceTarget::ByInstructionNumber(u64::MAX)))]
#[case("-1", Err(ConfigError::NegativeInstructionNumber(-1)))]
#[case("ten", Err(ConfigError::InvalidInstructionNumber("ten".to_string())))]
#[case("0x10", Err(ConfigError::InvalidInstructionNumber("0x10".to_string())))]
fn test_parse_instruction_number(
    #[case] text: &str,
    #[case] expected: Result<TraceTarget, ConfigError>,
) {
    assert_eq!(TraceTarget::parse_instruction_number(text), expected);
}

/// Tests program-counter parsing in both notations.
#[rstest]
#[case("0x1000", Ok(TraceTarget::ByProgramCounter(0x1000)))]
#[case("0XfF", Ok(TraceTarget::ByProgramCounter(0xff)))]
#[case("4096", Ok(TraceTarget::ByProgramCounter(4096)))]
#[case("0x", Err(ConfigError::InvalidProgramCounter("0x".to_string())))]
#[case("pc", Err(ConfigError::InvalidProgramCounter("pc".to_string())))]
fn test_parse_program_counter(
    #[case] text: &str,
    #[case] expected: Result<TraceTarget, ConfigError>,
) {
    assert_eq!(TraceTarget::parse_program_counter(text), expected);
}

/// Tests combining independent trace requests.
#[test]
fn test_from_requests() {
    assert_eq!(TraceTarget::from_requests(None, None), Ok(TraceTarget::None));
    assert_eq!(
        TraceTarget::from_requests(Some("5"), None),
        Ok(TraceTarget::ByInstructionNumber(5))
    );
    assert_eq!(
        TraceTarget::from_requests(Some("5"), Some("0x8")),
        Err(ConfigError::ConflictingTrace)
    );
    assert!(!TraceTarget::None.is_enabled());
    assert!(TraceTarget::ByProgramCounter(0).is_enabled());
}

/// Tests loading from disk, and the error for a missing file.
#[test]
fn test_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.toml");
    fs::write(&path, "[options]\nstep = true\n").unwrap();

    let config = Config::from_file(&path).unwrap();
    assert!(config.simulation.step);

    let missing = dir.path().join("missing.toml");
    let err = Config::from_file(&missing).unwrap_err();
    assert!(matches!(err, ConfigError::Io { path, .. } if path == missing));
}
