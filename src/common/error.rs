//! Error definitions.
//!
//! This module defines the error types surfaced to callers. It provides:
//! 1. **Configuration Errors:** Invalid options or unreadable config files, raised before any process starts.
//! 2. **Launch Errors:** Failures to start the simulator process, carried inside a failed `RunResult`.
//! 3. **Store Errors:** Misuse of the snapshot store (bad index, no data yet).
//!
//! Trace parsing never produces an error; malformed input is reported through
//! `trace::ParseDiagnostic` instead.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid simulation configuration.
///
/// I/O failures are stored as rendered messages so the error stays `Clone`
/// and can travel inside a `RunResult`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An instruction number to trace was negative.
    #[error("trace instruction number must not be negative (got {0})")]
    NegativeInstructionNumber(i64),

    /// An instruction number to trace was not a decimal integer.
    #[error("invalid trace instruction number '{0}'")]
    InvalidInstructionNumber(String),

    /// A program counter to trace was neither `0x` hex nor decimal.
    #[error("invalid trace program counter '{0}'")]
    InvalidProgramCounter(String),

    /// A program counter to trace does not fit the simulator's 32-bit PC.
    #[error("trace program counter {0:#x} exceeds the 32-bit address space")]
    ProgramCounterOutOfRange(u64),

    /// Tracing by instruction number and by program counter were both requested.
    #[error("trace by instruction number and by program counter are mutually exclusive")]
    ConflictingTrace,

    /// The configuration file could not be read.
    #[error("could not read config file '{}': {message}", path.display())]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Rendered I/O error.
        message: String,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("could not parse config file '{}': {message}", path.display())]
    Toml {
        /// Path of the configuration file.
        path: PathBuf,
        /// Rendered deserialization error.
        message: String,
    },
}

/// Failure to start a simulator run.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LaunchError {
    /// The simulator executable does not exist (and is not on `PATH`).
    #[error("simulator executable not found: {}", .0.display())]
    ExecutableNotFound(PathBuf),

    /// The simulator path exists but cannot be executed.
    #[error("simulator is not an executable file: {}", .0.display())]
    NotExecutable(PathBuf),

    /// The input program file is missing or unreadable.
    #[error("input file '{}' is not readable: {message}", path.display())]
    InputUnreadable {
        /// Path of the input program.
        path: PathBuf,
        /// Rendered I/O error.
        message: String,
    },

    /// The run configuration was rejected before launch.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The operating system refused to start the process.
    #[error("failed to spawn '{}': {message}", program.display())]
    Spawn {
        /// Program that was being started.
        program: PathBuf,
        /// Rendered I/O error.
        message: String,
    },

    /// A run is already active on this runner.
    #[error("a simulation run is already active on this runner")]
    AlreadyRunning,
}

/// Misuse of the snapshot store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The requested index is outside `0..len`.
    #[error("snapshot index {index} out of range (store holds {len})")]
    Range {
        /// Requested index.
        index: usize,
        /// Number of snapshots held.
        len: usize,
    },

    /// The store holds no snapshots yet.
    #[error("snapshot store is empty")]
    Empty,
}
