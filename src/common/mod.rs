//! Common types used throughout the trace tool.
//!
//! This module provides the building blocks shared by the runner, the parser,
//! the store and the visualization projection:
//! 1. **Stages:** The closed set of pipeline stages and their names.
//! 2. **Error Handling:** Configuration, launch and store error types.

/// Error types for configuration, launch and store misuse.
pub mod error;

/// Pipeline stage identifiers.
pub mod stage;

pub use error::{ConfigError, LaunchError, StoreError};
pub use stage::{Stage, STAGE_COUNT};
