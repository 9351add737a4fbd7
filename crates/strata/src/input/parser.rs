//! CSV/TSV parser with delimiter detection, producing typed record views.

use std::io::BufRead;

use crate::error::{Result, StrataError};

use super::record::{CellValue, RecordView};

/// Candidate delimiters for auto-detection.
const DELIMITERS: [u8; 4] = [b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Drop rows whose cells are all empty.
    pub skip_empty_lines: bool,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            skip_empty_lines: true,
            quote: b'"',
        }
    }
}

/// Outcome of a parse: the typed view plus row-level error accounting.
#[derive(Debug)]
pub struct ParseOutcome {
    pub view: RecordView,
    /// Rows dropped because the CSV reader rejected them.
    pub parse_errors: usize,
    /// The delimiter actually used.
    pub delimiter: u8,
}

/// Parses delimited text into a [`RecordView`].
pub struct CsvParser {
    config: ParserConfig,
}

impl CsvParser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a document held in memory.
    ///
    /// Header row is required. Rows that fail at the CSV layer are counted
    /// and skipped; a header-level failure is fatal.
    pub fn parse_str(&self, text: &str) -> Result<ParseOutcome> {
        let bytes = text.as_bytes();

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(bytes)?,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| StrataError::InvalidDelimiter(e.to_string()))?
            .iter()
            .map(|s| s.trim().to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(StrataError::EmptyData("no columns found".to_string()));
        }

        let expected_cols = headers.len();
        let mut rows = Vec::new();
        let mut parse_errors = 0usize;

        for result in reader.records() {
            let record = match result {
                Ok(r) => r,
                Err(_) => {
                    parse_errors += 1;
                    continue;
                }
            };

            if self.config.skip_empty_lines && record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }

            let mut row: Vec<CellValue> =
                record.iter().take(expected_cols).map(parse_cell).collect();
            while row.len() < expected_cols {
                row.push(CellValue::Null);
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(StrataError::EmptyData("no data rows found".to_string()));
        }

        let view = RecordView::new(headers, rows)?;

        Ok(ParseOutcome {
            view,
            parse_errors,
            delimiter,
        })
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert one raw field to a typed cell.
///
/// Finite numbers become `Number`; the null-token vocabulary becomes `Null`;
/// everything else is text, untrimmed.
fn parse_cell(raw: &str) -> CellValue {
    if is_null_token(raw) {
        return CellValue::Null;
    }
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(raw.to_string()),
    }
}

/// Check if a raw field represents a missing value.
pub fn is_null_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("nil")
        || trimmed == "."
        || trimmed == "-"
}

/// Detect the delimiter from a sample of the document.
///
/// Tallies every candidate at once across the first ten non-empty lines,
/// then ranks candidates lexicographically: a delimiter that splits every
/// sampled line into the same field count outranks one that only splits a
/// majority of lines consistently, which outranks a ragged one; equal
/// ranks are broken by occurrence count, then in favor of tab (it almost
/// never appears inside values).
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let mut per_line: Vec<[usize; DELIMITERS.len()]> = Vec::new();
    for line in bytes.lines().take(10).map_while(|l| l.ok()) {
        if line.trim().is_empty() {
            continue;
        }
        per_line.push(tally_candidates(&line));
    }

    if per_line.is_empty() {
        return Err(StrataError::EmptyData("no lines to analyze".to_string()));
    }

    let mut winner: Option<((bool, bool, usize, bool), u8)> = None;
    for (slot, &candidate) in DELIMITERS.iter().enumerate() {
        let head = per_line[0][slot];
        if head == 0 {
            continue;
        }
        let agreeing = per_line.iter().filter(|tally| tally[slot] == head).count();
        let rank = (
            agreeing == per_line.len(),
            agreeing * 2 >= per_line.len(),
            head,
            candidate == b'\t',
        );
        if winner.as_ref().is_none_or(|(best, _)| rank > *best) {
            winner = Some((rank, candidate));
        }
    }

    Ok(winner.map(|(_, candidate)| candidate).unwrap_or(b','))
}

/// Occurrences of every candidate delimiter in one line. Quoted sections
/// contribute nothing; an unclosed quote swallows the rest of the line.
fn tally_candidates(line: &str) -> [usize; DELIMITERS.len()] {
    let mut tally = [0usize; DELIMITERS.len()];
    let mut in_quotes = false;

    for byte in line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            if let Some(slot) = DELIMITERS.iter().position(|&d| d == byte) {
                tally[slot] += 1;
            }
        }
    }

    tally
}
