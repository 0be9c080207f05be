//! Trace ingestion.
//!
//! Turns the simulator's line-oriented trace (streamed stdout or a saved
//! `cycle_snapshots.log`) into cycle snapshots. Parsing never fails: malformed
//! lines and fields are skipped and reported as diagnostics.

/// Diagnostics for malformed trace input.
pub mod diagnostic;

/// Line classification and field extraction.
pub(crate) mod fields;

/// The streaming two-state parser and block helpers.
pub mod parser;

pub use diagnostic::{DiagnosticKind, ParseDiagnostic};
pub use parser::{parse_file, parse_str, ParsedTrace, TraceParser};
