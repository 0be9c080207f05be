//! Simulator command-line construction.
//!
//! The simulator recognizes its options by presence alone, so an absent flag
//! means "keep the built-in default". The only option that is always spelled
//! out either way is pipeline-register printing.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use crate::common::ConfigError;
use crate::config::{SimulationConfig, TraceTarget};

/// Flag names understood by the simulator.
pub mod flags {
    /// Input program path (takes a value).
    pub const INPUT: &str = "--input";
    /// Disable pipelining.
    pub const NO_PIPELINE: &str = "--no-pipeline";
    /// Disable data forwarding.
    pub const NO_FORWARDING: &str = "--no-forwarding";
    /// Print the register file every cycle.
    pub const PRINT_REGISTERS: &str = "--print-registers";
    /// Print pipeline registers every cycle.
    pub const PRINT_PIPELINE: &str = "--print-pipeline";
    /// Do not print pipeline registers.
    pub const NO_PRINT_PIPELINE: &str = "--no-print-pipeline";
    /// Print branch predictor state.
    pub const PRINT_BP: &str = "--print-bp";
    /// Write `cycle_snapshots.log`.
    pub const SAVE_SNAPSHOTS: &str = "--save-snapshots";
    /// Trace one instruction (takes a value).
    pub const TRACE: &str = "--trace";
    /// Step mode.
    pub const STEP: &str = "--step";
}

/// Maps a [`SimulationConfig`] to the simulator's argument vector.
#[derive(Clone, Copy, Debug)]
pub struct CommandBuilder<'a> {
    config: &'a SimulationConfig,
}

impl<'a> CommandBuilder<'a> {
    /// Creates a builder over `config`.
    pub fn new(config: &'a SimulationConfig) -> Self {
        Self { config }
    }

    /// Builds the argument vector (without the program name).
    ///
    /// Flags appear in a fixed order, so equal configs produce equal vectors.
    ///
    /// # Arguments
    ///
    /// * `input` - Program file passed with `--input`.
    ///
    /// # Errors
    ///
    /// `ConfigError::ProgramCounterOutOfRange` when the trace PC does not fit
    /// the simulator's 32-bit program counter.
    pub fn args(&self, input: &Path) -> Result<Vec<OsString>, ConfigError> {
        let config = self.config;
        let mut args: Vec<OsString> = vec![flags::INPUT.into(), input.as_os_str().to_owned()];

        let mut flag = |enabled: bool, name: &str| {
            if enabled {
                args.push(name.into());
            }
        };
        flag(!config.pipelining, flags::NO_PIPELINE);
        flag(!config.forwarding, flags::NO_FORWARDING);
        flag(config.print_registers, flags::PRINT_REGISTERS);
        flag(config.print_pipeline, flags::PRINT_PIPELINE);
        flag(!config.print_pipeline, flags::NO_PRINT_PIPELINE);
        flag(config.print_bp, flags::PRINT_BP);
        flag(config.save_snapshots, flags::SAVE_SNAPSHOTS);

        if let Some(value) = trace_value(config.trace)? {
            args.push(flags::TRACE.into());
            args.push(value.into());
        }

        if config.step {
            args.push(flags::STEP.into());
        }

        Ok(args)
    }

    /// Builds a ready-to-spawn [`Command`] for `executable`.
    ///
    /// # Errors
    ///
    /// Same as [`CommandBuilder::args`].
    pub fn command(&self, executable: &Path, input: &Path) -> Result<Command, ConfigError> {
        let mut command = Command::new(executable);
        command.args(self.args(input)?);
        Ok(command)
    }
}

/// Renders a command line for logs, quoting arguments that contain spaces.
pub fn display_command_line(executable: &Path, args: &[OsString]) -> String {
    std::iter::once(executable.as_os_str())
        .chain(args.iter().map(OsString::as_os_str))
        .map(|arg| {
            let arg = arg.to_string_lossy();
            if arg.contains(char::is_whitespace) {
                format!("'{arg}'")
            } else {
                arg.into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn trace_value(target: TraceTarget) -> Result<Option<String>, ConfigError> {
    match target {
        TraceTarget::None => Ok(None),
        TraceTarget::ByInstructionNumber(n) => Ok(Some(n.to_string())),
        TraceTarget::ByProgramCounter(pc) if pc > u64::from(u32::MAX) => {
            Err(ConfigError::ProgramCounterOutOfRange(pc))
        }
        TraceTarget::ByProgramCounter(pc) => Ok(Some(format!("{pc:#x}"))),
    }
}
