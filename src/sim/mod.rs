//! Simulator process harness.
//!
//! Everything that touches the external simulator lives here:
//! 1. **Command:** Translating options into the simulator's argument vector.
//! 2. **Runner:** Launching the process and streaming its output as events.
//! 3. **Session:** Feeding a run's output through the parser into a snapshot store.

/// Argument vector construction.
pub mod command;

/// Process launch and output streaming.
pub mod runner;

/// Run coordination: runner, parser, store and counters.
pub mod session;

pub use command::CommandBuilder;
pub use runner::{ProcessRunner, RunEvent, RunHandle, RunResult};
pub use session::Session;
