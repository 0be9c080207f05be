//! Integration tests for stage identifiers and error rendering.

use pipetrace::common::*;
use std::path::PathBuf;

/// Tests that stage indices follow pipeline order.
#[test]
fn test_stage_indices_in_pipeline_order() {
    let indices: Vec<usize> = Stage::ALL.iter().map(|s| s.index()).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(Stage::ALL.len(), STAGE_COUNT);
}

/// Tests index lookup, including out-of-range indices.
#[test]
fn test_stage_from_index() {
    assert_eq!(Stage::from_index(2), Some(Stage::ExMem));
    assert_eq!(Stage::from_index(4), Some(Stage::Wb));
    assert_eq!(Stage::from_index(5), None);
    assert_eq!(Stage::from_index(7), None);
}

/// Tests latch and short names.
#[test]
fn test_stage_names() {
    assert_eq!(Stage::IfId.latch_name(), "IF/ID");
    assert_eq!(Stage::MemWb.latch_name(), "MEM/WB");
    assert_eq!(Stage::MemWb.short_name(), "MEM");
    assert_eq!(Stage::Wb.short_name(), "WB");
    assert_eq!(Stage::ExMem.to_string(), "EX/MEM");
}

/// Tests that both name forms resolve, ignoring case and padding.
#[test]
fn test_stage_from_name() {
    assert_eq!(Stage::from_name("EX/MEM"), Some(Stage::ExMem));
    assert_eq!(Stage::from_name(" id/ex "), Some(Stage::IdEx));
    assert_eq!(Stage::from_name("IF"), Some(Stage::IfId));
    assert_eq!(Stage::from_name("wb"), Some(Stage::Wb));
    assert_eq!(Stage::from_name("EX/WB"), None);
    assert_eq!(Stage::from_name(""), None);
}

/// Tests that a wrapped config error renders like the inner error.
#[test]
fn test_launch_error_wraps_config_error() {
    let config = ConfigError::ProgramCounterOutOfRange(0x1_0000_0000);
    let launch: LaunchError = config.clone().into();
    assert_eq!(launch.to_string(), config.to_string());
    assert_eq!(launch, LaunchError::Config(config));
}

/// Tests error messages mention the offending path.
#[test]
fn test_error_messages_include_paths() {
    let err = LaunchError::ExecutableNotFound(PathBuf::from("/opt/sim/riscv_sim"));
    assert!(err.to_string().contains("/opt/sim/riscv_sim"));

    let err = ConfigError::Io {
        path: PathBuf::from("run.toml"),
        message: "denied".to_string(),
    };
    assert!(err.to_string().contains("run.toml"));
    assert!(err.to_string().contains("denied"));
}

/// Tests store error rendering.
#[test]
fn test_store_error_display() {
    let err = StoreError::Range { index: 9, len: 3 };
    assert_eq!(err.to_string(), "snapshot index 9 out of range (store holds 3)");
    assert_eq!(StoreError::Empty.to_string(), "snapshot store is empty");
}
