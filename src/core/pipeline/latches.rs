//! Pipeline latch state as reported by the simulator.
//!
//! Each of the five stages is described by a `PipelineStageState`: whether
//! the latch held an instruction that cycle, the instruction's program
//! counter, and a stage-specific payload. Payload fields are only meaningful
//! while the latch is valid, so the accessors return `None` for a bubble.

use serde::Serialize;

use crate::common::Stage;

/// Stage-specific contents of a pipeline latch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StagePayload {
    /// IF/ID: the fetched instruction word.
    IfId {
        /// Raw 32-bit instruction encoding.
        instruction: Option<u32>,
    },
    /// ID/EX: the decoded instruction class.
    IdEx {
        /// Instruction format (`R`, `I`, `S`, ...).
        inst_type: Option<String>,
        /// Instruction mnemonic or subtype.
        subtype: Option<String>,
    },
    /// EX/MEM: the ALU output.
    ExMem {
        /// ALU result as printed (signed decimal).
        alu_result: Option<i64>,
    },
    /// MEM/WB: data produced by the memory stage.
    MemWb {
        /// Memory data text.
        mem_data: Option<String>,
    },
    /// WB: the value written to the register file.
    ///
    /// The destination register is not recorded; the trace does not carry it
    /// reliably.
    Wb {
        /// Value written back.
        write_value: Option<i64>,
    },
}

impl StagePayload {
    /// Empty payload of the right shape for `stage`.
    pub fn empty(stage: Stage) -> Self {
        match stage {
            Stage::IfId => StagePayload::IfId { instruction: None },
            Stage::IdEx => StagePayload::IdEx {
                inst_type: None,
                subtype: None,
            },
            Stage::ExMem => StagePayload::ExMem { alu_result: None },
            Stage::MemWb => StagePayload::MemWb { mem_data: None },
            Stage::Wb => StagePayload::Wb { write_value: None },
        }
    }
}

/// State of one pipeline latch at one cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PipelineStageState {
    stage: Stage,
    /// Whether the latch held an instruction this cycle.
    pub valid: bool,
    /// Program counter of the instruction in the latch.
    pub pc: Option<u32>,
    /// Stage-specific payload.
    pub payload: StagePayload,
}

impl PipelineStageState {
    /// Creates an invalid (bubble) latch for `stage`.
    pub fn bubble(stage: Stage) -> Self {
        Self {
            stage,
            valid: false,
            pc: None,
            payload: StagePayload::empty(stage),
        }
    }

    /// Stage this latch belongs to.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Program counter, if the latch is valid and the PC was reported.
    pub fn program_counter(&self) -> Option<u32> {
        self.pc.filter(|_| self.valid)
    }

    /// IF/ID instruction word.
    pub fn instruction(&self) -> Option<u32> {
        match &self.payload {
            StagePayload::IfId { instruction } if self.valid => *instruction,
            _ => None,
        }
    }

    /// ID/EX instruction type.
    pub fn inst_type(&self) -> Option<&str> {
        match &self.payload {
            StagePayload::IdEx { inst_type, .. } if self.valid => inst_type.as_deref(),
            _ => None,
        }
    }

    /// ID/EX instruction subtype.
    pub fn subtype(&self) -> Option<&str> {
        match &self.payload {
            StagePayload::IdEx { subtype, .. } if self.valid => subtype.as_deref(),
            _ => None,
        }
    }

    /// EX/MEM ALU result.
    pub fn alu_result(&self) -> Option<i64> {
        match &self.payload {
            StagePayload::ExMem { alu_result } if self.valid => *alu_result,
            _ => None,
        }
    }

    /// MEM/WB memory data.
    pub fn mem_data(&self) -> Option<&str> {
        match &self.payload {
            StagePayload::MemWb { mem_data } if self.valid => mem_data.as_deref(),
            _ => None,
        }
    }

    /// WB write-back value.
    pub fn write_value(&self) -> Option<i64> {
        match &self.payload {
            StagePayload::Wb { write_value } if self.valid => *write_value,
            _ => None,
        }
    }
}
