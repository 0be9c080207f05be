//! Run coordinator.
//!
//! A `Session` ties one simulator run to the data it produces. It performs:
//! 1. **Start:** Resets the parser, the store and the counters, removes a stale snapshot
//!    log when snapshots will be saved, then launches a run.
//! 2. **Ingestion:** Feeds every streamed line to the parser and appends each completed
//!    snapshot to the store; lines are also kept in a bounded output log.
//! 3. **Completion:** Flushes the last snapshot and, when the simulator saved a snapshot
//!    log, replaces the streamed history with the saved one.
//!
//! The session is the only consumer of runner events; display code reads the
//! store and the view between calls to [`Session::pump`].

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::common::{LaunchError, StoreError};
use crate::config::{SimulationConfig, SimulatorConfig};
use crate::core::store::SnapshotStore;
use crate::core::pipeline::CycleSnapshot;
use crate::sim::runner::{ProcessRunner, RunEvent, RunHandle, RunResult};
use crate::stats::RunStats;
use crate::trace::{parse_file, ParseDiagnostic, ParsedTrace, TraceParser};
use crate::viz::PipelineView;

/// File name the simulator writes snapshots to with `--save-snapshots`.
pub const DEFAULT_SNAPSHOT_LOG: &str = "cycle_snapshots.log";

/// Output lines kept when no limit is configured.
const DEFAULT_OUTPUT_LIMIT: usize = 10_000;

/// One simulator run and the history it produced.
#[derive(Debug)]
pub struct Session {
    executable: PathBuf,
    snapshot_log: PathBuf,
    runner: ProcessRunner,
    handle: Option<RunHandle>,
    parser: TraceParser,
    store: SnapshotStore,
    diagnostics: Vec<ParseDiagnostic>,
    stats: RunStats,
    output: VecDeque<String>,
    output_limit: usize,
    reload_snapshots: bool,
    result: Option<RunResult>,
}

impl Session {
    /// Creates an idle session for `executable`.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            snapshot_log: PathBuf::from(DEFAULT_SNAPSHOT_LOG),
            runner: ProcessRunner::new(),
            handle: None,
            parser: TraceParser::new(),
            store: SnapshotStore::new(),
            diagnostics: Vec::new(),
            stats: RunStats::default(),
            output: VecDeque::new(),
            output_limit: DEFAULT_OUTPUT_LIMIT,
            reload_snapshots: false,
            result: None,
        }
    }

    /// Creates a session from the `[simulator]` configuration table.
    pub fn from_config(config: &SimulatorConfig) -> Self {
        let session = Self::new(&config.executable).with_output_limit(config.output_log_lines);
        match &config.snapshot_log {
            Some(path) => session.with_snapshot_log(path),
            None => session,
        }
    }

    /// Sets how many streamed lines the output log keeps; `0` keeps none.
    pub fn with_output_limit(mut self, lines: usize) -> Self {
        self.output_limit = lines;
        self
    }

    /// Sets where the simulator's saved snapshot log is read from.
    pub fn with_snapshot_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_log = path.into();
        self
    }

    /// Simulator executable this session launches.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Starts a run on `input`.
    ///
    /// All state from the previous run is discarded first. With
    /// `save_snapshots`, an existing snapshot log is deleted so that a run
    /// which never writes one cannot reload an older run's history.
    ///
    /// A run that fails to launch still counts as started: its failed result
    /// arrives through [`Session::pump`] or [`Session::wait`] like any other.
    ///
    /// # Errors
    ///
    /// `LaunchError::AlreadyRunning` if this session's previous run has not
    /// finished; nothing is reset in that case.
    pub fn start(&mut self, input: &Path, config: &SimulationConfig) -> Result<(), LaunchError> {
        if self.is_running() {
            return Err(LaunchError::AlreadyRunning);
        }
        self.parser.reset();
        self.store.reset();
        self.diagnostics.clear();
        self.stats = RunStats::default();
        self.output.clear();
        self.result = None;
        self.reload_snapshots = config.save_snapshots;
        if self.reload_snapshots {
            self.remove_snapshot_log();
        }

        self.handle = Some(self.runner.start(&self.executable, input, config));
        Ok(())
    }

    /// Processes every event that is already available, without blocking.
    ///
    /// # Returns
    ///
    /// `true` while the run has not delivered its result.
    pub fn pump(&mut self) -> bool {
        let Some(mut handle) = self.handle.take() else {
            return false;
        };
        while let Some(event) = handle.try_next() {
            self.handle_event(event);
        }
        if handle.is_finished() {
            return false;
        }
        self.handle = Some(handle);
        true
    }

    /// Processes events until the run ends.
    ///
    /// # Returns
    ///
    /// The result of the last run, or `None` if no run was ever started.
    pub fn wait(&mut self) -> Option<&RunResult> {
        self.wait_with(|_| {})
    }

    /// Like [`Session::wait`], calling `on_line` with each streamed line
    /// before it is ingested.
    pub fn wait_with<F>(&mut self, mut on_line: F) -> Option<&RunResult>
    where
        F: FnMut(&str),
    {
        if let Some(mut handle) = self.handle.take() {
            for event in handle.by_ref() {
                if let RunEvent::Line(line) = &event {
                    on_line(line);
                }
                self.handle_event(event);
            }
        }
        self.result.as_ref()
    }

    /// Kills the running simulator, if any. Already ingested data is kept.
    pub fn cancel(&self) {
        if let Some(handle) = &self.handle {
            handle.cancel();
        }
    }

    /// Returns `true` while a run is in progress.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Snapshot history of the current run.
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Snapshot history, for navigation.
    pub fn store_mut(&mut self) -> &mut SnapshotStore {
        &mut self.store
    }

    /// View of the snapshot under the store cursor.
    ///
    /// # Errors
    ///
    /// `StoreError::Empty` before the first snapshot arrives.
    pub fn view(&self) -> Result<PipelineView, StoreError> {
        self.store.current().map(PipelineView::project)
    }

    /// Diagnostics recorded for the current history, in line order.
    pub fn diagnostics(&self) -> &[ParseDiagnostic] {
        &self.diagnostics
    }

    /// Result of the last finished run.
    pub fn result(&self) -> Option<&RunResult> {
        self.result.as_ref()
    }

    /// Counters for the current run.
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Most recent simulator output lines, oldest first.
    pub fn output(&self) -> impl Iterator<Item = &str> {
        self.output.iter().map(String::as_str)
    }

    /// Replaces the history with the snapshots of a saved trace file.
    ///
    /// # Returns
    ///
    /// The number of snapshots loaded.
    ///
    /// # Errors
    ///
    /// Any I/O error from reading `path`; the current history is kept then.
    pub fn load_trace_file(&mut self, path: impl AsRef<Path>) -> io::Result<usize> {
        let parsed = parse_file(path.as_ref())?;
        Ok(self.replace_history(parsed))
    }

    fn handle_event(&mut self, event: RunEvent) {
        match event {
            RunEvent::Line(line) => self.ingest_line(line),
            RunEvent::Finished(result) => self.finish(result),
        }
    }

    fn ingest_line(&mut self, line: String) {
        self.stats.lines += 1;
        if let Some(snapshot) = self.parser.feed_line(&line) {
            self.append(snapshot);
        }
        self.collect_diagnostics();

        if self.output_limit > 0 {
            if self.output.len() == self.output_limit {
                self.output.pop_front();
            }
            self.output.push_back(line);
        }
    }

    fn remove_snapshot_log(&self) {
        match fs::remove_file(&self.snapshot_log) {
            Ok(()) => info!(path = %self.snapshot_log.display(), "removed old snapshot log"),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => {
                warn!(path = %self.snapshot_log.display(), %error, "could not remove old snapshot log")
            }
        }
    }

    fn finish(&mut self, result: RunResult) {
        if let Some(snapshot) = self.parser.finish() {
            self.append(snapshot);
        }
        self.collect_diagnostics();

        if result.succeeded && self.reload_snapshots {
            match parse_file(&self.snapshot_log) {
                Ok(parsed) => {
                    let loaded = self.replace_history(parsed);
                    info!(path = %self.snapshot_log.display(), snapshots = loaded, "reloaded saved snapshots");
                }
                Err(error) => {
                    warn!(path = %self.snapshot_log.display(), %error, "could not reload saved snapshots");
                }
            }
        }

        info!(status = %result.message(), summary = %self.stats.summary(), "run finished");
        self.result = Some(result);
    }

    fn append(&mut self, snapshot: CycleSnapshot) {
        self.stats
            .record_snapshot(snapshot.cycle(), snapshot.occupancy(), snapshot.forwarding().len());
        self.store.append(snapshot);
    }

    fn collect_diagnostics(&mut self) {
        let fresh = self.parser.take_diagnostics();
        self.stats.diagnostics += fresh.len() as u64;
        self.diagnostics.extend(fresh);
    }

    fn replace_history(&mut self, parsed: ParsedTrace) -> usize {
        self.store.reset();
        self.stats.clear_history();
        for snapshot in parsed.snapshots {
            self.append(snapshot);
        }
        self.stats.diagnostics = parsed.diagnostics.len() as u64;
        self.diagnostics = parsed.diagnostics;
        self.store.len()
    }
}
