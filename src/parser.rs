// 🏗️ Import Line Parser
//
// One lot per line, exactly nine comma-separated fields:
//   id,origin,farm,roast,YYYY-MM-DD,quantity,cost,notes,caffeine
//
// There is no quoting or escaping: a comma inside a value shifts every
// following field and the line is rejected for its field count.

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

use crate::entities::BeanLot;
use crate::validation::{FieldError, RawLot};

/// Number of fields on every import line
pub const FIELD_COUNT: usize = 9;

// ============================================================================
// LINE ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("expected 9 comma-separated fields, found {0}")]
    FieldCount(usize),

    #[error("{}", join_errors(.0))]
    InvalidFields(Vec<FieldError>),

    #[error("unexpected line break inside a single lot line")]
    LineBreak,

    #[error("unreadable line: {0}")]
    Unreadable(String),
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// PARSED LINE
// ============================================================================

/// Outcome of parsing one non-blank line of an import source
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    /// 1-based line number in the source; `\n` and `\r\n` both end a line
    pub line_number: u64,
    /// The line with surrounding whitespace removed, for diagnostics
    pub raw_line: String,
    pub result: Result<BeanLot, LineError>,
}

/// Parse every non-blank line of `source`, in order.
///
/// Never fails as a whole: each line carries its own result.
pub fn parse_lines(source: &str) -> Vec<ParsedLine> {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| ParsedLine {
            line_number: index as u64 + 1,
            raw_line: line.trim().to_string(),
            result: parse_lot_line(line),
        })
        .collect()
}

/// Parse a single import line; input spanning several lines is rejected
pub fn parse_lot_line(line: &str) -> Result<BeanLot, LineError> {
    let record = split_fields(line)?;
    parse_record(&record)
}

fn split_fields(line: &str) -> Result<StringRecord, LineError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(line.as_bytes());
    let mut records = reader.records();

    let record = match records.next() {
        Some(result) => result.map_err(|e| LineError::Unreadable(e.to_string()))?,
        None => return Err(LineError::FieldCount(0)),
    };
    if records.next().is_some() {
        return Err(LineError::LineBreak);
    }
    Ok(record)
}

fn parse_record(record: &StringRecord) -> Result<BeanLot, LineError> {
    if record.len() != FIELD_COUNT {
        return Err(LineError::FieldCount(record.len()));
    }

    let field = |i: usize| record.get(i).unwrap_or("").to_string();

    let raw = RawLot {
        bean_id: field(0),
        origin_country: field(1),
        farm_name: field(2),
        roast_level: field(3),
        roast_date: field(4),
        quantity_kg: field(5),
        cost_per_kg: field(6),
        flavor_notes: field(7),
        caffeine_mg_per_g: field(8),
    };

    raw.validate().map_err(LineError::InvalidFields)
}
