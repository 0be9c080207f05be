//! Integration tests for the pipeline view projection.

use pipetrace::common::Stage;
use pipetrace::core::pipeline::{CycleSnapshot, ForwardingPath, PipelineStageState, StagePayload};
use pipetrace::viz::{stage_label, truncate_label, PipelineView};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Creates a valid latch with the given PC and payload.
fn latch(stage: Stage, pc: u32, payload: StagePayload) -> PipelineStageState {
    let mut state = PipelineStageState::bubble(stage);
    state.valid = true;
    state.pc = Some(pc);
    state.payload = payload;
    state
}

/// A snapshot with every stage occupied.
fn full_snapshot() -> CycleSnapshot {
    CycleSnapshot::new(42)
        .with_stage(latch(
            Stage::IfId,
            0x10,
            StagePayload::IfId {
                instruction: Some(0x13),
            },
        ))
        .with_stage(latch(
            Stage::IdEx,
            0x0c,
            StagePayload::IdEx {
                inst_type: Some("R".to_string()),
                subtype: Some("add".to_string()),
            },
        ))
        .with_stage(latch(
            Stage::ExMem,
            0x08,
            StagePayload::ExMem {
                alu_result: Some(-12),
            },
        ))
        .with_stage(latch(
            Stage::MemWb,
            0x04,
            StagePayload::MemWb {
                mem_data: Some("I".to_string()),
            },
        ))
        .with_stage(latch(
            Stage::Wb,
            0x00,
            StagePayload::Wb {
                write_value: Some(7),
            },
        ))
}

/// Tests the per-stage labels.
#[test]
fn test_stage_labels() {
    let view = PipelineView::project(&full_snapshot());
    assert_eq!(view.cycle, 42);
    let labels: Vec<&str> = view.stages.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["0x00000013", "R-add", "-12", "I", "7"]);
    let names: Vec<&str> = view.stages.iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["IF/ID", "ID/EX", "EX/MEM", "MEM/WB", "WB"]);
    assert_eq!(view.stage(Stage::ExMem).and_then(|s| s.pc), Some(8));
}

/// Tests that invalid stages have empty labels and no PC.
#[test]
fn test_invalid_stage_empty_label() {
    let mut state = PipelineStageState::bubble(Stage::ExMem);
    state.pc = Some(0x40);
    state.payload = StagePayload::ExMem {
        alu_result: Some(3),
    };
    let view = PipelineView::project(&CycleSnapshot::new(1).with_stage(state));
    let ex = view.stage(Stage::ExMem).unwrap();
    assert!(!ex.valid);
    assert_eq!(ex.pc, None);
    assert_eq!(ex.label, "");
    assert_eq!(view.stages.len(), 5);
}

/// Tests label truncation.
#[rstest]
#[case("ABCDEFGHIJKLMNOP", "ABCDEFGHIJKL...")]
#[case("ABCDEFGHIJKLMNO", "ABCDEFGHIJKLMNO")]
#[case("", "")]
#[case("ééééééééééééééééé", "éééééééééééé...")]
fn test_truncate_label(#[case] text: &str, #[case] expected: &str) {
    assert_eq!(truncate_label(text), expected);
}

/// Tests that long memory text is truncated in the view but not in the raw label.
#[test]
fn test_long_label_truncated_in_view() {
    let state = latch(
        Stage::MemWb,
        0,
        StagePayload::MemWb {
            mem_data: Some("0123456789abcdefXYZ".to_string()),
        },
    );
    assert_eq!(stage_label(&state), "0123456789abcdefXYZ");
    let view = PipelineView::project(&CycleSnapshot::new(1).with_stage(state));
    assert_eq!(view.stages[3].label, "0123456789ab...");
}

/// Tests that forwarding paths with out-of-range stages are dropped.
#[test]
fn test_forwarding_out_of_range_dropped() {
    let snapshot = CycleSnapshot::new(3)
        .with_forwarding(ForwardingPath {
            from_stage: 7,
            to_stage: 1,
            value: 1,
        })
        .with_forwarding(ForwardingPath::between(Stage::MemWb, Stage::IdEx, 9))
        .with_forwarding(ForwardingPath {
            from_stage: 2,
            to_stage: 5,
            value: 2,
        });
    let view = PipelineView::project(&snapshot);
    assert_eq!(view.forwarding.len(), 1);
    assert_eq!(view.forwarding[0].from_stage_index, 3);
    assert_eq!(view.forwarding[0].to_stage_index, 1);
    assert_eq!(view.forwarding[0].value, 9);
}

/// Tests that the projection is deterministic.
#[test]
fn test_projection_deterministic() {
    let snapshot = full_snapshot();
    assert_eq!(PipelineView::project(&snapshot), PipelineView::project(&snapshot));
}

/// Tests the JSON shape of a view.
#[test]
fn test_view_json() {
    let view = PipelineView::project(&CycleSnapshot::new(5));
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["cycle"], 5);
    assert_eq!(json["stages"][0]["name"], "IF/ID");
    assert_eq!(json["stages"][0]["valid"], false);
    assert!(json["stages"][0]["pc"].is_null());
    assert_eq!(json["forwarding"].as_array().map(Vec::len), Some(0));
}
