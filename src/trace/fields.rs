//! Line classification and field extraction for the trace grammar.
//!
//! The simulator prints one line per latch per cycle, e.g.
//!
//! ```text
//! ----------------------------------------------------
//! Cycle 7 Pipeline State:
//! IF: PC = 0x1c, Instruction = 0x00a28293
//! ID: PC = 0x18, Type = I, Subtype = addi, rs1 = x5, rs2 = x0, rd = x5
//! EX: PC = 0x14, Type = R, Subtype = add, ALU Result = 12
//! MEM: Bubble
//! WB: PC = 0x0c, Type = I, Subtype = addi, Writing to x6 = 3
//! FORWARDING: EX/MEM→ ID/EX, x5 = 12
//! ```
//!
//! Classification is purely lexical; the parser decides what each class means
//! given its current state.

use crate::common::Stage;
use crate::core::pipeline::{ForwardingPath, PipelineStageState, StagePayload};
use crate::trace::diagnostic::DiagnosticKind;

const SEPARATOR_PREFIX: &str = "---";
const BOUNDARY_MARKERS: [&str; 2] = ["Pipeline State", "Pipeline Details"];
const FORWARDING_PREFIX: &str = "FORWARDING:";
const BUBBLE_MARKER: &str = "Bubble";
const WRITE_BACK_KEY: &str = "Writing to";

/// Lexical class of one trimmed trace line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LineClass<'a> {
    /// Blank or separator line.
    Ignored,
    /// Cycle boundary; `None` when the cycle number is unreadable.
    CycleBoundary(Option<u64>),
    /// Stage line with the text after `XX:`.
    Stage(Stage, &'a str),
    /// Forwarding line with the text after `FORWARDING:`.
    Forwarding(&'a str),
    /// Anything else the simulator prints.
    Other,
}

/// An individual field that failed to parse.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct FieldError {
    pub field: String,
    pub value: String,
}

pub(crate) fn classify(line: &str) -> LineClass<'_> {
    if line.is_empty() || line.starts_with(SEPARATOR_PREFIX) {
        return LineClass::Ignored;
    }
    if let Some(cycle) = boundary(line) {
        return LineClass::CycleBoundary(cycle);
    }
    if let Some(body) = line.strip_prefix(FORWARDING_PREFIX) {
        return LineClass::Forwarding(body.trim());
    }
    match stage_prefix(line) {
        Some((stage, body)) => LineClass::Stage(stage, body),
        None => LineClass::Other,
    }
}

/// `<label> <N> ... Pipeline State|Details`, with a trailing `:` allowed on `N`.
///
/// Returns `None` for lines that are not boundaries, including headings such
/// as `Pipeline State After Cycle 4:` where the marker leads the line.
fn boundary(line: &str) -> Option<Option<u64>> {
    let marker_at = BOUNDARY_MARKERS
        .iter()
        .filter_map(|marker| line.find(marker))
        .min()?;
    let mut tokens = line[..marker_at].split_whitespace();
    tokens.next()?;
    Some(
        tokens
            .next()
            .map(|token| token.trim_end_matches(':'))
            .and_then(|token| token.parse().ok()),
    )
}

fn stage_prefix(line: &str) -> Option<(Stage, &str)> {
    Stage::ALL.into_iter().find_map(|stage| {
        line.strip_prefix(stage.short_name())
            .and_then(|rest| rest.strip_prefix(':'))
            .map(|body| (stage, body.trim()))
    })
}

/// Splits `key = value, key = value` into trimmed pairs. Segments without `=`
/// are skipped.
fn fields(body: &str) -> impl Iterator<Item = (&str, &str)> {
    body.split(',').filter_map(|segment| {
        let (key, value) = segment.split_once('=')?;
        Some((key.trim(), value.trim()))
    })
}

fn parse_hex_u32(text: &str) -> Option<u32> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16).ok()
}

fn parse_decimal(text: &str) -> Option<i64> {
    text.parse().ok()
}

/// Applies the body of a stage line to `state`.
///
/// A `Bubble` body leaves the latch untouched. Otherwise the latch becomes
/// valid and every recognized field is stored; fields that fail to parse are
/// returned and leave the previous value in place.
pub(crate) fn apply_stage_line(state: &mut PipelineStageState, body: &str) -> Vec<FieldError> {
    if body.starts_with(BUBBLE_MARKER) {
        return Vec::new();
    }
    state.valid = true;

    let stage = state.stage();
    let mut errors = Vec::new();
    let mut type_text = None;
    let mut read_data = None;

    let mut reject = |field: &str, value: &str| {
        errors.push(FieldError {
            field: field.to_string(),
            value: value.to_string(),
        });
    };

    for (key, value) in fields(body) {
        match (stage, key) {
            (_, "PC") => match parse_hex_u32(value) {
                Some(pc) => state.pc = Some(pc),
                None => reject(key, value),
            },
            (Stage::IfId, "Instruction") => match parse_hex_u32(value) {
                Some(word) => {
                    if let StagePayload::IfId { instruction } = &mut state.payload {
                        *instruction = Some(word);
                    }
                }
                None => reject(key, value),
            },
            (Stage::IdEx | Stage::MemWb, "Type" | "Instruction Type") => type_text = Some(value),
            (Stage::IdEx, "Subtype") => {
                if let StagePayload::IdEx { subtype, .. } = &mut state.payload {
                    *subtype = Some(value.to_string());
                }
            }
            (Stage::ExMem, "ALU Result") => match parse_decimal(value) {
                Some(result) => {
                    if let StagePayload::ExMem { alu_result } = &mut state.payload {
                        *alu_result = Some(result);
                    }
                }
                None => reject(key, value),
            },
            (Stage::MemWb, "Read Data") => read_data = Some(value),
            (Stage::Wb, key) if key.starts_with(WRITE_BACK_KEY) => match parse_decimal(value) {
                Some(written) => {
                    if let StagePayload::Wb { write_value } = &mut state.payload {
                        *write_value = Some(written);
                    }
                }
                None => reject(WRITE_BACK_KEY, value),
            },
            _ => {}
        }
    }

    match &mut state.payload {
        StagePayload::IdEx { inst_type, .. } => {
            if let Some(text) = type_text {
                *inst_type = Some(text.to_string());
            }
        }
        StagePayload::MemWb { mem_data } => {
            if let Some(text) = read_data.or(type_text) {
                *mem_data = Some(text.to_string());
            }
        }
        _ => {}
    }

    errors
}

/// Parses the body of `FORWARDING: FROM→ TO, xN = V` (`->` also accepted).
pub(crate) fn parse_forwarding(body: &str) -> Result<ForwardingPath, DiagnosticKind> {
    let (from, rest) = body
        .split_once('→')
        .or_else(|| body.split_once("->"))
        .ok_or(DiagnosticKind::MalformedForwarding)?;
    let (to, assignment) = rest
        .split_once(',')
        .ok_or(DiagnosticKind::MalformedForwarding)?;
    let (_, value) = assignment
        .split_once('=')
        .ok_or(DiagnosticKind::MalformedForwarding)?;

    let resolve = |name: &str| {
        Stage::from_name(name).ok_or_else(|| DiagnosticKind::UnknownForwardingStage {
            name: name.trim().to_string(),
        })
    };
    let from = resolve(from)?;
    let to = resolve(to)?;
    let value = parse_decimal(value.trim()).ok_or(DiagnosticKind::MalformedForwarding)?;

    Ok(ForwardingPath::between(from, to, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_boundaries_with_and_without_colon() {
        assert_eq!(
            classify("Cycle 12 Pipeline State:"),
            LineClass::CycleBoundary(Some(12))
        );
        assert_eq!(
            classify("Cycle 3: Pipeline Details"),
            LineClass::CycleBoundary(Some(3))
        );
        assert_eq!(
            classify("Cycle x Pipeline State"),
            LineClass::CycleBoundary(None)
        );
    }

    #[test]
    fn state_headings_are_not_boundaries() {
        assert_eq!(classify("Pipeline State After Cycle 4:"), LineClass::Other);
        assert_eq!(classify("Pipeline State Before Cycle 5:"), LineClass::Other);
        assert_eq!(classify("Cycle Pipeline State"), LineClass::CycleBoundary(None));
    }

    #[test]
    fn register_summary_lines_are_other() {
        assert_eq!(classify("--- Pipeline Register Summary ---"), LineClass::Ignored);
        assert_eq!(
            classify("IF/ID:  Valid=T, PC=0x0, Inst=0x00500293, PredPC=0x4"),
            LineClass::Other
        );
        assert_eq!(classify("MEM/WB: Valid=F"), LineClass::Other);
    }

    #[test]
    fn stage_prefix_requires_colon() {
        assert_eq!(classify("IF: Bubble"), LineClass::Stage(Stage::IfId, "Bubble"));
        assert_eq!(classify("IFFY line"), LineClass::Other);
        assert_eq!(classify("MEM:PC = 0x4"), LineClass::Stage(Stage::MemWb, "PC = 0x4"));
    }

    #[test]
    fn separators_and_blanks_are_ignored() {
        assert_eq!(classify(""), LineClass::Ignored);
        assert_eq!(classify("-------------"), LineClass::Ignored);
    }

    #[test]
    fn mem_prefers_read_data_over_type() {
        let mut state = PipelineStageState::bubble(Stage::MemWb);
        let errors = apply_stage_line(&mut state, "PC = 0x8, Type = I, Subtype = lw, Read Data = 42");
        assert!(errors.is_empty());
        assert_eq!(state.mem_data(), Some("42"));

        let mut state = PipelineStageState::bubble(Stage::MemWb);
        apply_stage_line(&mut state, "PC = 0x8, Type = R, Subtype = add");
        assert_eq!(state.mem_data(), Some("R"));
    }

    #[test]
    fn forwarding_accepts_ascii_arrow() {
        let path = parse_forwarding("MEM/WB -> ID/EX, x7 = -3").unwrap();
        assert_eq!(path, ForwardingPath::between(Stage::MemWb, Stage::IdEx, -3));
    }
}
