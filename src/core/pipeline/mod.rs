//! Pipeline state model.
//!
//! This module contains the per-stage latch state reconstructed from the
//! simulator's trace and the per-cycle snapshot that groups the five latches
//! with the forwarding paths active that cycle.

/// Per-stage latch state and payloads (IF/ID, ID/EX, EX/MEM, MEM/WB, WB).
pub mod latches;

/// Cycle snapshots and forwarding paths.
pub mod snapshot;

pub use latches::{PipelineStageState, StagePayload};
pub use snapshot::{CycleSnapshot, ForwardingPath};
