//! Configuration for simulator runs.
//!
//! This module defines the options passed to the external simulator and the
//! TOML file the command-line front end reads them from. It provides:
//! 1. **Defaults:** The option values the simulator front end starts with.
//! 2. **Structures:** `SimulationConfig` (simulator flags) and `Config` (paths plus flags).
//! 3. **Trace Targets:** Validation of user-supplied trace requests into a `TraceTarget`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::ConfigError;

/// Default configuration constants.
mod defaults {
    /// Simulator executable looked up when the config names none.
    pub const EXECUTABLE: &str = "./riscv_sim";

    /// Number of streamed output lines a session keeps for display.
    pub const OUTPUT_LOG_LINES: usize = 10_000;
}

/// Which instruction the simulator should trace, if any.
///
/// Values reaching this type are already validated; use the `parse_*` and
/// `from_requests` constructors to turn user text into a target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum TraceTarget {
    /// No instruction tracing.
    #[default]
    None,
    /// Trace the N-th executed instruction.
    ByInstructionNumber(u64),
    /// Trace every instruction fetched from this program counter.
    ByProgramCounter(u64),
}

impl TraceTarget {
    /// Parses a decimal instruction number.
    ///
    /// # Errors
    ///
    /// `NegativeInstructionNumber` for values below zero, and
    /// `InvalidInstructionNumber` for anything that is not a decimal integer.
    pub fn parse_instruction_number(text: &str) -> Result<Self, ConfigError> {
        let text = text.trim();
        match text.parse::<i64>() {
            Ok(n) if n < 0 => Err(ConfigError::NegativeInstructionNumber(n)),
            Ok(n) => Ok(TraceTarget::ByInstructionNumber(n as u64)),
            Err(_) => text
                .parse::<u64>()
                .map(TraceTarget::ByInstructionNumber)
                .map_err(|_| ConfigError::InvalidInstructionNumber(text.to_string())),
        }
    }

    /// Parses a program counter given as `0x`-prefixed hex or as decimal.
    ///
    /// # Errors
    ///
    /// `InvalidProgramCounter` when the text is neither form.
    pub fn parse_program_counter(text: &str) -> Result<Self, ConfigError> {
        let text = text.trim();
        let parsed = match text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => text.parse::<u64>(),
        };
        parsed
            .map(TraceTarget::ByProgramCounter)
            .map_err(|_| ConfigError::InvalidProgramCounter(text.to_string()))
    }

    /// Builds a target from the two independent trace requests a user can make.
    ///
    /// # Arguments
    ///
    /// * `instruction` - Requested instruction number, as typed.
    /// * `pc` - Requested program counter, as typed.
    ///
    /// # Errors
    ///
    /// `ConflictingTrace` when both are present, otherwise whatever the
    /// individual parser reports.
    pub fn from_requests(instruction: Option<&str>, pc: Option<&str>) -> Result<Self, ConfigError> {
        match (instruction, pc) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingTrace),
            (Some(n), None) => Self::parse_instruction_number(n),
            (None, Some(pc)) => Self::parse_program_counter(pc),
            (None, None) => Ok(TraceTarget::None),
        }
    }

    /// Returns `true` when some instruction is traced.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, TraceTarget::None)
    }
}

/// Options forwarded to the simulator as command-line flags.
///
/// Deserialized from the `[options]` table; `trace` comes from the separate
/// `[trace]` table and is validated on load.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Run the pipelined model (otherwise single-cycle).
    pub pipelining: bool,
    /// Enable data forwarding between stages.
    pub forwarding: bool,
    /// Dump the register file after every cycle.
    #[serde(alias = "print_registers_each_cycle")]
    pub print_registers: bool,
    /// Print the pipeline registers every cycle.
    #[serde(alias = "print_pipeline_registers")]
    pub print_pipeline: bool,
    /// Print branch predictor state.
    #[serde(alias = "print_branch_predictor")]
    pub print_bp: bool,
    /// Write `cycle_snapshots.log` at the end of the run.
    pub save_snapshots: bool,
    /// Instruction tracing target.
    #[serde(skip)]
    pub trace: TraceTarget,
    /// Run the simulator in step mode.
    #[serde(alias = "step_mode")]
    pub step: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            pipelining: true,
            forwarding: true,
            print_registers: false,
            print_pipeline: true,
            print_bp: false,
            save_snapshots: false,
            trace: TraceTarget::None,
            step: false,
        }
    }
}

/// Paths and limits for the simulator process.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SimulatorConfig {
    /// Simulator executable; a bare name is looked up on `PATH`.
    #[serde(default = "default_executable")]
    pub executable: PathBuf,

    /// Program to simulate; may instead be given on the command line.
    #[serde(default)]
    pub input: Option<PathBuf>,

    /// Snapshot log written by the simulator when `save_snapshots` is set.
    #[serde(default)]
    pub snapshot_log: Option<PathBuf>,

    /// Maximum number of streamed output lines kept for display.
    #[serde(default = "default_output_log_lines")]
    pub output_log_lines: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            input: None,
            snapshot_log: None,
            output_log_lines: default_output_log_lines(),
        }
    }
}

fn default_executable() -> PathBuf {
    PathBuf::from(defaults::EXECUTABLE)
}

fn default_output_log_lines() -> usize {
    defaults::OUTPUT_LOG_LINES
}

/// A trace request value; TOML allows either `instruction = 12` or `instruction = "12"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TraceValue {
    Int(i64),
    Text(String),
}

impl TraceValue {
    fn into_text(self) -> String {
        match self {
            TraceValue::Int(n) => n.to_string(),
            TraceValue::Text(s) => s,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TraceSection {
    #[serde(default, alias = "instruction_number")]
    instruction: Option<TraceValue>,
    #[serde(default, alias = "program_counter")]
    pc: Option<TraceValue>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    simulator: SimulatorConfig,
    #[serde(default)]
    options: SimulationConfig,
    #[serde(default)]
    trace: TraceSection,
}

/// Root configuration: where the simulator lives and how to run it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Process paths and limits.
    pub simulator: SimulatorConfig,
    /// Flags forwarded to the simulator.
    pub simulation: SimulationConfig,
}

impl Config {
    /// Loads and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// `ConfigError::Io` if the file cannot be read, `ConfigError::Toml` if it
    /// does not match the schema, and the trace errors of `TraceTarget`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&text, path)
    }

    /// Parses configuration text that did not come from a file.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_file`], minus the I/O case.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, Path::new("<inline>"))
    }

    fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text).map_err(|e| ConfigError::Toml {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;

        let instruction = raw.trace.instruction.map(TraceValue::into_text);
        let pc = raw.trace.pc.map(TraceValue::into_text);

        let mut simulation = raw.options;
        simulation.trace = TraceTarget::from_requests(instruction.as_deref(), pc.as_deref())?;

        Ok(Self {
            simulator: raw.simulator,
            simulation,
        })
    }
}
