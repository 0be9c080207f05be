//! Reconstructed pipeline state.
//!
//! `pipeline` holds the data model of one cycle; `store` keeps the ordered
//! history of a run and the cursor used to browse it.

/// Latch state, cycle snapshots and forwarding paths.
pub mod pipeline;

/// Ordered snapshot history with navigation.
pub mod store;

pub use pipeline::{CycleSnapshot, ForwardingPath, PipelineStageState, StagePayload};
pub use store::SnapshotStore;
