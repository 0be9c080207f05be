//! Per-cycle pipeline snapshots.
//!
//! A `CycleSnapshot` records the five latches and the forwarding paths that
//! were active during one simulated clock cycle. Snapshots are assembled by
//! the trace parser and never change once handed out.

use serde::Serialize;

use crate::common::{Stage, STAGE_COUNT};
use crate::core::pipeline::latches::PipelineStageState;

/// A data bypass between two stages.
///
/// Stage endpoints are positional indices (see [`Stage::index`]). They are
/// kept as raw indices rather than `Stage` so that paths built from untrusted
/// input can still be represented; the visualization drops out-of-range ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ForwardingPath {
    /// Index of the stage the value is forwarded from.
    pub from_stage: usize,
    /// Index of the stage the value is forwarded to.
    pub to_stage: usize,
    /// Forwarded value.
    pub value: i64,
}

impl ForwardingPath {
    /// Creates a path between two known stages.
    pub fn between(from: Stage, to: Stage, value: i64) -> Self {
        Self {
            from_stage: from.index(),
            to_stage: to.index(),
            value,
        }
    }
}

/// Full pipeline state at one cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CycleSnapshot {
    cycle: u64,
    stages: [PipelineStageState; STAGE_COUNT],
    forwarding: Vec<ForwardingPath>,
}

impl CycleSnapshot {
    /// Creates a snapshot for `cycle` with every stage invalid and no forwarding.
    pub fn new(cycle: u64) -> Self {
        Self {
            cycle,
            stages: Stage::ALL.map(PipelineStageState::bubble),
            forwarding: Vec::new(),
        }
    }

    /// Replaces the latch for `state.stage()`.
    pub fn with_stage(mut self, state: PipelineStageState) -> Self {
        let index = state.stage().index();
        self.stages[index] = state;
        self
    }

    /// Appends a forwarding path.
    pub fn with_forwarding(mut self, path: ForwardingPath) -> Self {
        self.forwarding.push(path);
        self
    }

    /// Cycle number reported by the simulator.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Latch state of `stage`.
    pub fn stage(&self, stage: Stage) -> &PipelineStageState {
        &self.stages[stage.index()]
    }

    /// All latches in pipeline order.
    pub fn stages(&self) -> &[PipelineStageState; STAGE_COUNT] {
        &self.stages
    }

    /// IF/ID latch.
    pub fn if_id(&self) -> &PipelineStageState {
        self.stage(Stage::IfId)
    }

    /// ID/EX latch.
    pub fn id_ex(&self) -> &PipelineStageState {
        self.stage(Stage::IdEx)
    }

    /// EX/MEM latch.
    pub fn ex_mem(&self) -> &PipelineStageState {
        self.stage(Stage::ExMem)
    }

    /// MEM/WB latch.
    pub fn mem_wb(&self) -> &PipelineStageState {
        self.stage(Stage::MemWb)
    }

    /// Write-back stage.
    pub fn wb(&self) -> &PipelineStageState {
        self.stage(Stage::Wb)
    }

    /// Forwarding paths in the order they were reported.
    pub fn forwarding(&self) -> &[ForwardingPath] {
        &self.forwarding
    }

    /// Number of valid latches.
    pub fn occupancy(&self) -> usize {
        self.stages.iter().filter(|s| s.valid).count()
    }

    pub(crate) fn stage_mut(&mut self, stage: Stage) -> &mut PipelineStageState {
        &mut self.stages[stage.index()]
    }

    pub(crate) fn push_forwarding(&mut self, path: ForwardingPath) {
        self.forwarding.push(path);
    }
}
