//! Pipeline Trace CLI.
//!
//! The main executable for the trace tool. It handles command-line argument
//! parsing, configuration loading, and reporting.
//!
//! # Usage
//!
//! The tool runs in two modes:
//! 1. **Run Mode**: Launches the simulator on a program, echoes its output, and
//!    reports the captured pipeline history.
//! 2. **Replay Mode**: Parses a saved `cycle_snapshots.log` and prints one or all cycles.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use pipetrace::config::{Config, SimulatorConfig, TraceTarget};
use pipetrace::core::SnapshotStore;
use pipetrace::sim::Session;
use pipetrace::trace::ParseDiagnostic;
use pipetrace::viz::PipelineView;
use tracing_subscriber::EnvFilter;

/// Diagnostics listed before the remainder is summarized.
const MAX_LISTED_DIAGNOSTICS: usize = 20;

/// Command-line arguments for the trace tool.
#[derive(Parser, Debug)]
#[command(author, version, about = "Pipeline simulator trace capture and replay")]
struct Args {
    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Launch the simulator and capture its pipeline trace.
    Run(RunArgs),

    /// Parse a saved cycle snapshot log.
    Replay {
        log: PathBuf,

        /// Show only this cycle.
        #[arg(long)]
        cycle: Option<u64>,

        #[arg(long)]
        json: bool,
    },
}

/// Main entry point for the trace tool.
///
/// # Behavior
///
/// 1. **Logging**: Installs a `tracing` subscriber filtered by `RUST_LOG` (default `warn`).
/// 2. **Run**: Loads the configuration, applies command-line overrides, launches the
///    simulator, and prints the result with run statistics.
/// 3. **Replay**: Loads a saved trace and prints the requested cycles.
///
/// Exits with code 1 on any error or unsuccessful run.
fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let code = match args.command {
        Mode::Run(run_args) => run(run_args),
        Mode::Replay { log, cycle, json } => replay(log, cycle, json),
    };
    process::exit(code);
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulator executable (overrides the config file).
    #[arg(long)]
    exe: Option<PathBuf>,

    /// Program to simulate (overrides the config file).
    #[arg(long)]
    input: Option<PathBuf>,

    /// Trace the N-th executed instruction.
    #[arg(long, value_name = "N")]
    trace_instruction: Option<String>,

    /// Trace the instruction at this program counter (hex or decimal).
    #[arg(long, value_name = "PC")]
    trace_pc: Option<String>,

    /// Print the captured history as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Do not echo simulator output.
    #[arg(short, long)]
    quiet: bool,
}

fn run(args: RunArgs) -> i32 {
    let mut config = match args.config {
        Some(path) => match Config::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {e}");
                return 1;
            }
        },
        None => Config::default(),
    };

    if let Some(exe) = args.exe {
        config.simulator.executable = exe;
    }
    if let Some(input) = args.input {
        config.simulator.input = Some(input);
    }
    if args.trace_instruction.is_some() || args.trace_pc.is_some() {
        match TraceTarget::from_requests(args.trace_instruction.as_deref(), args.trace_pc.as_deref()) {
            Ok(target) => config.simulation.trace = target,
            Err(e) => {
                eprintln!("Error: {e}");
                return 1;
            }
        }
    }

    let Some(input) = config.simulator.input.clone() else {
        eprintln!("Error: No input program specified.");
        eprintln!("Usage:");
        eprintln!("  pipetrace run --input <program> [--exe <simulator>]");
        eprintln!("  pipetrace run --config <config.toml>");
        return 1;
    };

    let echo = !args.json && !args.quiet;
    if echo {
        print_config(&config, &input);
    }

    let mut session = Session::from_config(&config.simulator);
    if let Err(e) = session.start(&input, &config.simulation) {
        eprintln!("Error: {e}");
        return 1;
    }

    let succeeded = match session.wait_with(|line| {
        if echo {
            println!("{line}");
        }
    }) {
        Some(result) => {
            if !args.json {
                println!("\n[*] {}", result.message());
            }
            result.succeeded
        }
        None => false,
    };

    report_diagnostics(session.diagnostics());

    if args.json {
        if let Err(e) = print_json(session.store()) {
            eprintln!("Error: {e}");
            return 1;
        }
    } else if !args.quiet {
        session.stats().print();
    }

    if succeeded {
        0
    } else {
        1
    }
}

fn replay(log: PathBuf, cycle: Option<u64>, json: bool) -> i32 {
    let mut session = Session::from_config(&SimulatorConfig::default());
    if let Err(e) = session.load_trace_file(&log) {
        eprintln!("Error: could not read '{}': {e}", log.display());
        return 1;
    }
    report_diagnostics(session.diagnostics());

    if let Some(cycle) = cycle {
        let store = session.store_mut();
        let Some(index) = store.position_of_cycle(cycle) else {
            eprintln!("Error: cycle {cycle} not found in '{}'", log.display());
            return 1;
        };
        if let Err(e) = store.jump_to(index) {
            eprintln!("Error: {e}");
            return 1;
        }
        let view = match session.view() {
            Ok(view) => view,
            Err(e) => {
                eprintln!("Error: {e}");
                return 1;
            }
        };
        if json {
            return match serde_json::to_string_pretty(&view) {
                Ok(text) => {
                    println!("{text}");
                    0
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    1
                }
            };
        }
        print_view(&view);
        return 0;
    }

    if json {
        if let Err(e) = print_json(session.store()) {
            eprintln!("Error: {e}");
            return 1;
        }
        return 0;
    }

    for snapshot in session.store() {
        print_view(&PipelineView::project(snapshot));
    }
    println!("\n[*] {}", session.stats().summary());
    0
}

fn print_config(config: &Config, input: &std::path::Path) {
    let on_off = |enabled: bool| if enabled { "Enabled" } else { "Disabled" };
    let sim = &config.simulation;

    println!("Run Configuration");
    println!("-----------------");
    println!("Simulator:");
    println!("  Executable:         {}", config.simulator.executable.display());
    println!("  Input:              {}", input.display());
    println!("Options:");
    println!("  Pipelining:         {}", on_off(sim.pipelining));
    println!("  Forwarding:         {}", on_off(sim.forwarding));
    println!("  Print Registers:    {}", on_off(sim.print_registers));
    println!("  Print Pipeline:     {}", on_off(sim.print_pipeline));
    println!("  Print BP:           {}", on_off(sim.print_bp));
    println!("  Save Snapshots:     {}", on_off(sim.save_snapshots));
    println!("  Step Mode:          {}", on_off(sim.step));
    match sim.trace {
        TraceTarget::None => println!("  Trace:              Disabled"),
        TraceTarget::ByInstructionNumber(n) => println!("  Trace:              instruction #{n}"),
        TraceTarget::ByProgramCounter(pc) => println!("  Trace:              pc {pc:#x}"),
    }
    println!("-----------------");
}

fn print_view(view: &PipelineView) {
    println!("Cycle {}", view.cycle);
    for stage in &view.stages {
        let pc = stage
            .pc
            .map_or_else(|| "-".to_string(), |pc| format!("{pc:#010x}"));
        let label = if stage.valid { stage.label.as_str() } else { "(bubble)" };
        println!("  {:<7} {:<11} {}", stage.name, pc, label);
    }
    for path in &view.forwarding {
        let name = |index: usize| {
            pipetrace::Stage::from_index(index).map_or("?", |stage| stage.latch_name())
        };
        println!(
            "  forward {} -> {} = {}",
            name(path.from_stage_index),
            name(path.to_stage_index),
            path.value
        );
    }
}

fn print_json(store: &SnapshotStore) -> serde_json::Result<()> {
    let views: Vec<PipelineView> = store.iter().map(PipelineView::project).collect();
    println!("{}", serde_json::to_string_pretty(&views)?);
    Ok(())
}

fn report_diagnostics(diagnostics: &[ParseDiagnostic]) {
    for diagnostic in diagnostics.iter().take(MAX_LISTED_DIAGNOSTICS) {
        eprintln!("[!] {diagnostic}");
    }
    if diagnostics.len() > MAX_LISTED_DIAGNOSTICS {
        eprintln!(
            "[!] ... and {} more diagnostics",
            diagnostics.len() - MAX_LISTED_DIAGNOSTICS
        );
    }
}
