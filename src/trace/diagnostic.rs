//! Non-fatal parse diagnostics.

use thiserror::Error;

use crate::common::Stage;

/// What was wrong with a trace line.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    /// A stage line appeared before any cycle boundary.
    #[error("{stage} line before the first cycle boundary")]
    StageBeforeCycle {
        /// Stage named by the line.
        stage: Stage,
    },

    /// One field of a stage line could not be parsed; the field was dropped.
    #[error("{stage}: unparsable {field} value '{value}'")]
    MalformedField {
        /// Stage named by the line.
        stage: Stage,
        /// Field key as written in the trace.
        field: String,
        /// Offending value text.
        value: String,
    },

    /// A cycle boundary without a readable cycle number.
    #[error("cycle boundary without a cycle number")]
    MalformedCycleHeader,

    /// A cycle boundary whose number is lower than the previous one.
    #[error("cycle {found} follows cycle {previous}")]
    CycleOutOfOrder {
        /// Last accepted cycle number.
        previous: u64,
        /// Cycle number found on this line.
        found: u64,
    },

    /// A forwarding line that does not follow `FROM→ TO, xN = V`.
    #[error("malformed forwarding line")]
    MalformedForwarding,

    /// A forwarding line naming a stage that does not exist.
    #[error("unknown forwarding stage '{name}'")]
    UnknownForwardingStage {
        /// Stage name as written.
        name: String,
    },
}

/// A diagnostic tied to the trace line that caused it.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("line {line_number}: {kind}")]
pub struct ParseDiagnostic {
    /// 1-based line number within the parsed input.
    pub line_number: usize,
    /// The offending line, trimmed.
    pub line: String,
    /// What went wrong.
    pub kind: DiagnosticKind,
}
