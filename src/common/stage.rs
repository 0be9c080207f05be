//! Pipeline Stage Identifiers.
//!
//! This module defines the five stages of the simulated in-order pipeline as a
//! closed enumeration. Every other component refers to stages through this
//! type, so the latch name used by the trace grammar, the short name used for
//! display, and the positional index used by forwarding paths always agree.

use serde::Serialize;
use std::fmt;

/// Number of pipeline stages tracked per cycle.
pub const STAGE_COUNT: usize = 5;

/// One of the five pipeline stages, in pipeline order.
///
/// The discriminant is the stage index used by forwarding paths and by the
/// visualization projection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Stage {
    /// Instruction fetch, observed through the IF/ID latch.
    IfId = 0,
    /// Instruction decode, observed through the ID/EX latch.
    IdEx = 1,
    /// Execute, observed through the EX/MEM latch.
    ExMem = 2,
    /// Memory access, observed through the MEM/WB latch.
    MemWb = 3,
    /// Register write-back.
    Wb = 4,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; STAGE_COUNT] = [
        Stage::IfId,
        Stage::IdEx,
        Stage::ExMem,
        Stage::MemWb,
        Stage::Wb,
    ];

    /// Positional index of the stage, `0..STAGE_COUNT`.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Looks up a stage by positional index.
    ///
    /// # Returns
    ///
    /// `None` when `index` is outside `0..STAGE_COUNT`.
    pub fn from_index(index: usize) -> Option<Stage> {
        Self::ALL.get(index).copied()
    }

    /// Name of the latch that holds this stage's state (`"IF/ID"`, `"WB"`, ...).
    pub fn latch_name(self) -> &'static str {
        match self {
            Stage::IfId => "IF/ID",
            Stage::IdEx => "ID/EX",
            Stage::ExMem => "EX/MEM",
            Stage::MemWb => "MEM/WB",
            Stage::Wb => "WB",
        }
    }

    /// Short stage name as printed at the start of a trace stage line.
    pub fn short_name(self) -> &'static str {
        match self {
            Stage::IfId => "IF",
            Stage::IdEx => "ID",
            Stage::ExMem => "EX",
            Stage::MemWb => "MEM",
            Stage::Wb => "WB",
        }
    }

    /// Resolves either a latch name or a short name, ignoring ASCII case.
    ///
    /// Forwarding lines name their endpoints by latch (`EX/MEM`) while stage
    /// lines use the short form (`EX`); both resolve to the same stage.
    pub fn from_name(name: &str) -> Option<Stage> {
        let name = name.trim();
        Self::ALL.into_iter().find(|stage| {
            stage.latch_name().eq_ignore_ascii_case(name)
                || stage.short_name().eq_ignore_ascii_case(name)
        })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.latch_name())
    }
}
