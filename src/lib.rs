//! Pipeline Trace Capture and Replay Library.
//!
//! This crate drives an external five-stage pipeline simulator and turns its
//! textual per-cycle trace into a structured, randomly navigable history of
//! pipeline snapshots ready for visualization or offline inspection.
//!
//! # Architecture
//!
//! * **Harness**: Builds the simulator command line, launches it, and streams stdout
//!   on a background thread without blocking the consumer.
//! * **Trace**: A two-state streaming parser that tolerates partial and malformed
//!   lines, reporting them as diagnostics instead of failing.
//! * **History**: An ordered snapshot store with a cursor, plus a pure projection of
//!   any snapshot into a toolkit-agnostic view.
//!
//! # Modules
//!
//! * `common`: Stage identifiers and error types.
//! * `config`: Configuration loading and parsing.
//! * `core`: Snapshot data model and history store.
//! * `sim`: Command construction, process runner and session.
//! * `stats`: Per-run statistics collection.
//! * `trace`: Trace text parsing.
//! * `viz`: View projection for renderers.

/// Shared stage identifiers and error types.
///
/// Provides the closed set of pipeline stages used by every other module and
/// the typed errors for configuration, launch and store misuse.
pub mod common;

/// Configuration system for simulator paths and run options.
///
/// Loads and parses TOML configuration files and validates trace requests
/// before any process is started.
pub mod config;

/// Pipeline snapshot model and snapshot history.
///
/// Defines per-stage latch state, per-cycle snapshots with forwarding paths,
/// and the cursor-addressable store that holds a run's history.
pub mod core;

/// Simulation harness: command construction, process runner and session.
///
/// Launches the external simulator, streams its output, and coordinates
/// parsing into the snapshot store.
pub mod sim;

/// Run statistics collection and reporting.
pub mod stats;

/// Trace text parsing.
///
/// Turns streamed or saved trace text into cycle snapshots plus diagnostics.
pub mod trace;

/// View projection for renderers.
pub mod viz;

pub use crate::common::{ConfigError, LaunchError, Stage, StoreError};
pub use crate::config::{Config, SimulationConfig, TraceTarget};
pub use crate::core::{CycleSnapshot, ForwardingPath, PipelineStageState, SnapshotStore};
pub use crate::sim::{CommandBuilder, ProcessRunner, RunEvent, RunHandle, RunResult, Session};
pub use crate::trace::{ParseDiagnostic, TraceParser};
pub use crate::viz::PipelineView;
