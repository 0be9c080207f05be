//! Toolkit-agnostic pipeline view.
//!
//! Projects a `CycleSnapshot` into plain data a renderer can draw directly:
//! 1. **Stages:** Five descriptors in pipeline order, each with a short label.
//! 2. **Forwarding:** Bypass arrows between stage indices; out-of-range ones are dropped.
//!
//! The projection is pure and deterministic. It never fails.

use serde::Serialize;

use crate::common::{Stage, STAGE_COUNT};
use crate::core::pipeline::{CycleSnapshot, PipelineStageState};

/// Labels longer than this are shortened.
pub const MAX_LABEL_CHARS: usize = 15;

/// Characters kept from a shortened label, before the ellipsis.
pub const TRUNCATED_LABEL_CHARS: usize = 12;

const ELLIPSIS: &str = "...";

/// Render description of one pipeline stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StageView {
    /// Latch name (`"IF/ID"`, ...).
    pub name: &'static str,
    /// Whether the latch held an instruction.
    pub valid: bool,
    /// Program counter, when valid and known.
    pub pc: Option<u32>,
    /// Short label; empty for an invalid stage.
    pub label: String,
}

/// Render description of one forwarding arrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ForwardingView {
    /// Index of the source stage, `0..STAGE_COUNT`.
    pub from_stage_index: usize,
    /// Index of the destination stage, `0..STAGE_COUNT`.
    pub to_stage_index: usize,
    /// Forwarded value.
    pub value: i64,
}

/// Render description of a whole cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PipelineView {
    /// Cycle number.
    pub cycle: u64,
    /// Stage descriptors in pipeline order.
    pub stages: Vec<StageView>,
    /// Forwarding arrows whose endpoints are both real stages.
    pub forwarding: Vec<ForwardingView>,
}

impl PipelineView {
    /// Builds the view for `snapshot`.
    pub fn project(snapshot: &CycleSnapshot) -> Self {
        let stages = snapshot
            .stages()
            .iter()
            .map(|state| StageView {
                name: state.stage().latch_name(),
                valid: state.valid,
                pc: state.program_counter(),
                label: truncate_label(&stage_label(state)),
            })
            .collect();

        let forwarding = snapshot
            .forwarding()
            .iter()
            .filter(|path| path.from_stage < STAGE_COUNT && path.to_stage < STAGE_COUNT)
            .map(|path| ForwardingView {
                from_stage_index: path.from_stage,
                to_stage_index: path.to_stage,
                value: path.value,
            })
            .collect();

        Self {
            cycle: snapshot.cycle(),
            stages,
            forwarding,
        }
    }

    /// Descriptor for `stage`.
    pub fn stage(&self, stage: Stage) -> Option<&StageView> {
        self.stages.get(stage.index())
    }
}

/// Full, untruncated label for a latch.
///
/// IF shows the instruction word, ID the `type-subtype` pair, EX the ALU
/// result, MEM the memory data and WB the written value.
pub fn stage_label(state: &PipelineStageState) -> String {
    if !state.valid {
        return String::new();
    }
    match state.stage() {
        Stage::IfId => state
            .instruction()
            .map(|word| format!("0x{word:08x}"))
            .unwrap_or_default(),
        Stage::IdEx => match (state.inst_type(), state.subtype()) {
            (Some(kind), Some(subtype)) => format!("{kind}-{subtype}"),
            (Some(text), None) | (None, Some(text)) => text.to_string(),
            (None, None) => String::new(),
        },
        Stage::ExMem => state
            .alu_result()
            .map(|value| value.to_string())
            .unwrap_or_default(),
        Stage::MemWb => state.mem_data().unwrap_or_default().to_string(),
        Stage::Wb => state
            .write_value()
            .map(|value| value.to_string())
            .unwrap_or_default(),
    }
}

/// Shortens `text` to its first 12 characters plus `...` when it is longer
/// than 15 characters. Lengths count Unicode scalar values, not bytes.
pub fn truncate_label(text: &str) -> String {
    if text.chars().count() <= MAX_LABEL_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(TRUNCATED_LABEL_CHARS).collect();
    short.push_str(ELLIPSIS);
    short
}
