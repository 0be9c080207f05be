//! Streaming trace parser.
//!
//! The parser is a two-state machine: either no snapshot is open (before the
//! first cycle boundary, or after a rejected one) or exactly one snapshot is
//! being filled. Each line class has one transition:
//!
//! | line class     | no snapshot              | open snapshot                        |
//! |----------------|--------------------------|--------------------------------------|
//! | blank / `---`  | stay                     | stay                                 |
//! | boundary `N`   | open `N` with pending    | emit current, open `N` with pending  |
//! | bad boundary   | diagnostic, drop pending | emit current, diagnostic, close      |
//! | stage line     | diagnostic               | update stage                         |
//! | forwarding     | pending                  | add path, or pending after stages    |
//! | other          | stay                     | stay                                 |
//!
//! The simulator prints `FORWARDING:` lines while it executes cycle `N`, before
//! the `Cycle N Pipeline Details:` block that describes it. A forwarding line
//! therefore belongs to the next boundary unless it directly follows a
//! boundary, ahead of that snapshot's stage lines. A rejected boundary drops
//! the pending paths; paths still pending at [`TraceParser::finish`] go to
//! the snapshot being closed.
//!
//! A snapshot is only handed out once it is complete, when the next boundary
//! arrives or on [`TraceParser::finish`]. Block parsing is line-by-line
//! streaming over the whole text, so both modes produce identical output.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::core::pipeline::{CycleSnapshot, ForwardingPath};
use crate::trace::diagnostic::{DiagnosticKind, ParseDiagnostic};
use crate::trace::fields::{self, LineClass};

#[derive(Debug, Default)]
enum ParserState {
    #[default]
    NoCurrentSnapshot,
    HasCurrentSnapshot {
        snapshot: CycleSnapshot,
        /// Set by the first stage line of the snapshot.
        staged: bool,
    },
}

/// Incremental parser from trace lines to cycle snapshots.
#[derive(Debug, Default)]
pub struct TraceParser {
    state: ParserState,
    last_cycle: Option<u64>,
    line_number: usize,
    pending_forwarding: Vec<ForwardingPath>,
    diagnostics: Vec<ParseDiagnostic>,
}

impl TraceParser {
    /// Creates a parser with no open snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line (with or without its terminator).
    ///
    /// # Returns
    ///
    /// The previously open snapshot when this line closes it.
    pub fn feed_line(&mut self, line: &str) -> Option<CycleSnapshot> {
        self.line_number += 1;
        let line = line.trim();

        match fields::classify(line) {
            LineClass::Ignored | LineClass::Other => None,
            LineClass::CycleBoundary(Some(cycle)) => {
                let completed = self.close();
                let last_cycle = self.last_cycle;
                match last_cycle {
                    Some(previous) if cycle < previous => {
                        self.pending_forwarding.clear();
                        self.report(line, DiagnosticKind::CycleOutOfOrder { previous, found: cycle });
                    }
                    _ => {
                        self.last_cycle = Some(cycle);
                        let mut snapshot = CycleSnapshot::new(cycle);
                        for path in self.pending_forwarding.drain(..) {
                            snapshot.push_forwarding(path);
                        }
                        self.state = ParserState::HasCurrentSnapshot {
                            snapshot,
                            staged: false,
                        };
                    }
                }
                completed
            }
            LineClass::CycleBoundary(None) => {
                let completed = self.close();
                self.pending_forwarding.clear();
                self.report(line, DiagnosticKind::MalformedCycleHeader);
                completed
            }
            LineClass::Stage(stage, body) => {
                let ParserState::HasCurrentSnapshot { snapshot, staged } = &mut self.state else {
                    self.report(line, DiagnosticKind::StageBeforeCycle { stage });
                    return None;
                };
                *staged = true;
                let errors = fields::apply_stage_line(snapshot.stage_mut(stage), body);
                for error in errors {
                    self.report(
                        line,
                        DiagnosticKind::MalformedField {
                            stage,
                            field: error.field,
                            value: error.value,
                        },
                    );
                }
                None
            }
            LineClass::Forwarding(body) => {
                match fields::parse_forwarding(body) {
                    Ok(path) => match &mut self.state {
                        ParserState::HasCurrentSnapshot {
                            snapshot,
                            staged: false,
                        } => snapshot.push_forwarding(path),
                        _ => self.pending_forwarding.push(path),
                    },
                    Err(kind) => self.report(line, kind),
                }
                None
            }
        }
    }

    /// Ends the input, returning the snapshot still being filled, if any.
    ///
    /// Pending forwarding paths are attached to that snapshot, or dropped when
    /// none is open. The parser can keep accepting lines afterwards; cycle
    /// ordering is still checked against the last boundary seen.
    pub fn finish(&mut self) -> Option<CycleSnapshot> {
        let pending = std::mem::take(&mut self.pending_forwarding);
        let mut snapshot = self.close()?;
        for path in pending {
            snapshot.push_forwarding(path);
        }
        Some(snapshot)
    }

    /// Returns to the initial state, discarding the open snapshot, pending
    /// forwarding paths and all diagnostics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Diagnostics recorded so far, in line order.
    pub fn diagnostics(&self) -> &[ParseDiagnostic] {
        &self.diagnostics
    }

    /// Moves the recorded diagnostics out of the parser.
    pub fn take_diagnostics(&mut self) -> Vec<ParseDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Number of lines fed since creation or the last reset.
    pub fn lines_seen(&self) -> usize {
        self.line_number
    }

    /// Returns `true` while a snapshot is being filled.
    pub fn has_open_snapshot(&self) -> bool {
        matches!(self.state, ParserState::HasCurrentSnapshot { .. })
    }

    /// Number of forwarding paths waiting for the next cycle boundary.
    pub fn pending_forwarding(&self) -> usize {
        self.pending_forwarding.len()
    }

    fn close(&mut self) -> Option<CycleSnapshot> {
        match std::mem::take(&mut self.state) {
            ParserState::HasCurrentSnapshot { snapshot, .. } => Some(snapshot),
            ParserState::NoCurrentSnapshot => None,
        }
    }

    fn report(&mut self, line: &str, kind: DiagnosticKind) {
        let diagnostic = ParseDiagnostic {
            line_number: self.line_number,
            line: line.to_string(),
            kind,
        };
        debug!(%diagnostic, "trace diagnostic");
        self.diagnostics.push(diagnostic);
    }
}

/// Result of parsing a complete trace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedTrace {
    /// Snapshots in cycle order.
    pub snapshots: Vec<CycleSnapshot>,
    /// Diagnostics in line order.
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Parses a whole trace held in memory.
pub fn parse_str(text: &str) -> ParsedTrace {
    let mut parser = TraceParser::new();
    let mut snapshots: Vec<CycleSnapshot> = text.lines().filter_map(|line| parser.feed_line(line)).collect();
    snapshots.extend(parser.finish());
    ParsedTrace {
        snapshots,
        diagnostics: parser.take_diagnostics(),
    }
}

/// Reads and parses a trace file such as `cycle_snapshots.log`.
///
/// Invalid UTF-8 is replaced rather than rejected, matching how streamed
/// process output is decoded.
///
/// # Errors
///
/// Any I/O error from reading the file.
pub fn parse_file(path: impl AsRef<Path>) -> io::Result<ParsedTrace> {
    let bytes = fs::read(path)?;
    Ok(parse_str(&String::from_utf8_lossy(&bytes)))
}
