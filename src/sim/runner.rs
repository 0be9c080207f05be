//! Simulator process runner.
//!
//! Launches the external simulator and streams its output as events. It
//! performs:
//! 1. **Validation:** The executable must exist and be executable, the input must be readable.
//! 2. **Streaming:** A background thread reads stdout line by line and forwards each line
//!    in write order; a helper thread drains stderr so neither pipe can fill up.
//! 3. **Completion:** Exactly one `RunEvent::Finished` follows the last line, once both
//!    streams are drained and the process has been reaped.
//!
//! On Unix the simulator leads its own process group, and cancelling kills the
//! whole group so that helpers it forked cannot keep stdout open. The child is
//! only reaped by polling under a briefly held lock, which leaves
//! [`RunHandle::cancel`] free to run at any point of the run.
//!
//! Every failure, including launch failures, is reported through the terminal
//! `RunResult`; starting a run never panics and never returns an error directly.

use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tracing::{debug, info, warn};

use crate::common::LaunchError;
use crate::config::SimulationConfig;
use crate::sim::command::{display_command_line, CommandBuilder};

/// Event produced by a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunEvent {
    /// One line of simulator stdout, without its terminator.
    Line(String),
    /// Terminal result; always the last event of a run.
    Finished(RunResult),
}

/// Outcome of one simulator run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunResult {
    /// Process exit code; `None` if the process never started or died from a signal.
    pub exit_code: Option<i32>,
    /// `true` only for a clean, uncancelled exit with status zero.
    pub succeeded: bool,
    /// Everything the simulator wrote to stderr.
    pub stderr_text: String,
    /// The run was cancelled and the process killed.
    pub terminated: bool,
    /// Why the process could not be started, if it was not.
    pub launch_error: Option<LaunchError>,
}

impl RunResult {
    /// Result for a run that never started.
    pub fn launch_failure(error: LaunchError) -> Self {
        Self {
            stderr_text: error.to_string(),
            launch_error: Some(error),
            ..Self::default()
        }
    }

    /// Human-readable status line.
    pub fn message(&self) -> String {
        if let Some(error) = &self.launch_error {
            return format!("Error running simulation: {error}");
        }
        if self.terminated {
            return "Simulation terminated.".to_string();
        }
        if self.succeeded {
            return "Simulation completed successfully.".to_string();
        }
        let code = self
            .exit_code
            .map_or_else(|| "none".to_string(), |code| code.to_string());
        format!(
            "Simulation failed with error code {code}. Error: {}",
            self.stderr_text.trim_end()
        )
    }
}

/// How often the output thread checks for exit once stdout has closed.
const REAP_POLL_INTERVAL: Duration = Duration::from_millis(10);

struct ChildControl {
    child: Mutex<Child>,
    cancelled: AtomicBool,
}

impl ChildControl {
    fn lock(&self) -> MutexGuard<'_, Child> {
        self.child.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Kills the simulator unless it has already exited.
    ///
    /// The lock is held across the exit check and the signal, so the pid
    /// cannot be reaped and reused in between.
    fn kill(&self) {
        let mut child = self.lock();
        if !matches!(child.try_wait(), Ok(None)) {
            return;
        }
        self.cancelled.store(true, Ordering::Release);
        let pid = child.id();
        match kill_process_group(pid).or_else(|_| child.kill()) {
            Ok(()) => info!(pid, "simulator cancelled"),
            Err(error) => warn!(pid, %error, "failed to kill simulator"),
        }
    }

    /// Reaps the child without holding the lock while it is still running.
    fn wait(&self) -> io::Result<ExitStatus> {
        loop {
            if let Some(status) = self.lock().try_wait()? {
                return Ok(status);
            }
            thread::sleep(REAP_POLL_INTERVAL);
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) -> io::Result<()> {
    let pgid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
    // SAFETY: `kill` has no memory-safety preconditions. The group leader is
    // unreaped while the caller holds the child lock, so `pgid` is ours.
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) -> io::Result<()> {
    Err(io::Error::from(io::ErrorKind::Unsupported))
}

/// Handle to one run: a lazy, non-restartable stream of [`RunEvent`]s.
///
/// Iterating blocks until the next event; [`RunHandle::try_next`] never
/// blocks. Dropping an unfinished handle cancels the run.
pub struct RunHandle {
    events: Receiver<RunEvent>,
    control: Option<Arc<ChildControl>>,
    finished: bool,
}

impl std::fmt::Debug for RunHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunHandle")
            .field("pending_events", &self.events.len())
            .field("finished", &self.finished)
            .finish()
    }
}

impl RunHandle {
    fn failed(error: LaunchError) -> Self {
        warn!(%error, "simulator launch failed");
        let (tx, rx) = crossbeam_channel::bounded(1);
        // The receiver is alive and the channel has room.
        let _ = tx.send(RunEvent::Finished(RunResult::launch_failure(error)));
        Self {
            events: rx,
            control: None,
            finished: false,
        }
    }

    /// Requests termination of the simulator process.
    ///
    /// Lines already delivered stay valid; the final result reports
    /// `terminated`. Returns without blocking on the run and has no effect
    /// once the process has exited.
    pub fn cancel(&self) {
        if let Some(control) = &self.control {
            control.kill();
        }
    }

    /// Returns the next event if one is ready, without blocking.
    pub fn try_next(&mut self) -> Option<RunEvent> {
        if self.finished {
            return None;
        }
        match self.events.try_recv() {
            Ok(event) => Some(self.observe(event)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                None
            }
        }
    }

    /// Returns `true` once the terminal event has been consumed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Discards remaining lines and blocks until the run ends.
    pub fn wait(mut self) -> RunResult {
        for event in self.by_ref() {
            if let RunEvent::Finished(result) = event {
                return result;
            }
        }
        RunResult {
            stderr_text: "simulator output ended without a result".to_string(),
            ..RunResult::default()
        }
    }

    fn observe(&mut self, event: RunEvent) -> RunEvent {
        if matches!(event, RunEvent::Finished(_)) {
            self.finished = true;
        }
        event
    }
}

impl Iterator for RunHandle {
    type Item = RunEvent;

    fn next(&mut self) -> Option<RunEvent> {
        if self.finished {
            return None;
        }
        match self.events.recv() {
            Ok(event) => Some(self.observe(event)),
            Err(_) => {
                self.finished = true;
                None
            }
        }
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        if !self.finished {
            self.cancel();
        }
    }
}

/// Starts simulator runs, at most one at a time.
#[derive(Debug, Default)]
pub struct ProcessRunner {
    active: Arc<AtomicBool>,
}

impl ProcessRunner {
    /// Creates an idle runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while a started run has not delivered its result.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Starts the simulator on `input` with the flags derived from `config`.
    ///
    /// # Arguments
    ///
    /// * `executable` - Simulator binary; a bare name is looked up on `PATH`.
    /// * `input` - Program file to simulate.
    /// * `config` - Options translated into command-line flags.
    ///
    /// # Returns
    ///
    /// A handle whose events end with exactly one `RunEvent::Finished`. When
    /// the run cannot start, that is the only event.
    pub fn start(&self, executable: &Path, input: &Path, config: &SimulationConfig) -> RunHandle {
        if self.active.swap(true, Ordering::AcqRel) {
            // Someone else owns the flag; do not clear it.
            return RunHandle::failed(LaunchError::AlreadyRunning);
        }
        match self.launch(executable, input, config) {
            Ok(handle) => handle,
            Err(error) => {
                self.active.store(false, Ordering::Release);
                RunHandle::failed(error)
            }
        }
    }

    fn launch(
        &self,
        executable: &Path,
        input: &Path,
        config: &SimulationConfig,
    ) -> Result<RunHandle, LaunchError> {
        let program = resolve_executable(executable)?;
        check_input(input)?;

        let builder = CommandBuilder::new(config);
        let args = builder.args(input)?;
        let mut command = builder.command(&program, input)?;
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        info!(command = %display_command_line(&program, &args), "launching simulator");
        let mut child = command.spawn().map_err(|e| LaunchError::Spawn {
            program: program.clone(),
            message: e.to_string(),
        })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(LaunchError::Spawn {
                program,
                message: "output pipes were not captured".to_string(),
            });
        };

        let control = Arc::new(ChildControl {
            child: Mutex::new(child),
            cancelled: AtomicBool::new(false),
        });
        let (tx, rx) = crossbeam_channel::unbounded();

        let worker = {
            let control = Arc::clone(&control);
            let active = Arc::clone(&self.active);
            thread::Builder::new()
                .name("sim-output".to_string())
                .spawn(move || stream_output(stdout, stderr, &control, &active, &tx))
        };
        if let Err(e) = worker {
            let mut child = control.lock();
            let _ = child.kill();
            let _ = child.wait();
            return Err(LaunchError::Spawn {
                program,
                message: format!("could not start output thread: {e}"),
            });
        }

        Ok(RunHandle {
            events: rx,
            control: Some(control),
            finished: false,
        })
    }
}

/// Body of the background thread: forward stdout lines, then the result.
fn stream_output(
    stdout: ChildStdout,
    stderr: ChildStderr,
    control: &ChildControl,
    active: &AtomicBool,
    tx: &Sender<RunEvent>,
) {
    let stderr_drain = thread::Builder::new()
        .name("sim-stderr".to_string())
        .spawn(move || drain(stderr));

    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    let mut lines = 0usize;
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                lines += 1;
                // A dropped receiver is not an error; keep draining so the child never blocks.
                let _ = tx.send(RunEvent::Line(decode_line(&buf)));
            }
            Err(error) => {
                warn!(%error, "error reading simulator stdout");
                break;
            }
        }
    }

    let mut stderr_text = match stderr_drain {
        Ok(handle) => handle.join().unwrap_or_default(),
        Err(error) => format!("could not read simulator stderr: {error}"),
    };

    let status = control.wait();
    let terminated = control.cancelled.load(Ordering::Acquire);
    let result = match status {
        Ok(status) => RunResult {
            exit_code: status.code(),
            succeeded: status.success() && !terminated,
            stderr_text,
            terminated,
            launch_error: None,
        },
        Err(error) => {
            stderr_text.push_str(&format!("\nfailed to wait for simulator: {error}"));
            RunResult {
                stderr_text,
                terminated,
                ..RunResult::default()
            }
        }
    };

    info!(
        exit_code = ?result.exit_code,
        succeeded = result.succeeded,
        terminated = result.terminated,
        lines,
        "simulator exited"
    );

    active.store(false, Ordering::Release);
    let _ = tx.send(RunEvent::Finished(result));
}

fn drain(mut stderr: ChildStderr) -> String {
    let mut bytes = Vec::new();
    if let Err(error) = stderr.read_to_end(&mut bytes) {
        debug!(%error, "stderr read ended early");
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn decode_line(bytes: &[u8]) -> String {
    let line = String::from_utf8_lossy(bytes);
    line.trim_end_matches(['\n', '\r']).to_string()
}

fn resolve_executable(path: &Path) -> Result<PathBuf, LaunchError> {
    if path.exists() {
        let is_file = fs::metadata(path).map(|m| m.is_file()).unwrap_or(false);
        if !is_file || !is_executable(path) {
            return Err(LaunchError::NotExecutable(path.to_path_buf()));
        }
        return Ok(path.to_path_buf());
    }

    let bare_name = path.parent().map_or(true, |p| p.as_os_str().is_empty());
    if bare_name {
        if let Ok(found) = which::which(path) {
            debug!(resolved = %found.display(), "simulator found on PATH");
            return Ok(found);
        }
    }
    Err(LaunchError::ExecutableNotFound(path.to_path_buf()))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: `c_path` is a valid NUL-terminated string that outlives the call.
    unsafe { libc::access(c_path.as_ptr(), libc::X_OK) == 0 }
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

fn check_input(input: &Path) -> Result<(), LaunchError> {
    let unreadable = |message: String| LaunchError::InputUnreadable {
        path: input.to_path_buf(),
        message,
    };
    let metadata = fs::metadata(input).map_err(|e| unreadable(e.to_string()))?;
    if !metadata.is_file() {
        return Err(unreadable("not a regular file".to_string()));
    }
    fs::File::open(input).map_err(|e| unreadable(e.to_string()))?;
    Ok(())
}
