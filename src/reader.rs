//! Line-oriented record reader shared by the text file formats.
//!
//! The map, instruction-stream, and keypoint-graph files are all plain
//! ASCII: whitespace-separated decimal integers, one record per line, with
//! `#` starting a comment line. This module holds the one reader they
//! share and the parse error they all surface.

use std::iter::Enumerate;
use std::str::Lines;

/// Error produced while parsing any of the text formats.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("unexpected end of file (expected {0})")]
    UnexpectedEnd(&'static str),

    #[error("line {line}: missing field (expected {expected})")]
    MissingField { line: usize, expected: &'static str },

    #[error("line {line}: invalid integer {token:?}")]
    InvalidInteger { line: usize, token: String },

    #[error("line {line}: invalid count {value}")]
    InvalidCount { line: usize, value: i64 },
}

/// Streams non-empty, non-comment lines, tracking 1-based line numbers for
/// error reporting.
pub(crate) struct RecordReader<'a> {
    lines: Enumerate<Lines<'a>>,
}

impl<'a> RecordReader<'a> {
    pub fn new(contents: &'a str) -> Self {
        Self {
            lines: contents.lines().enumerate(),
        }
    }

    /// Next meaningful line, with its 1-based line number.
    pub fn next_line(&mut self, expected: &'static str) -> Result<(usize, &'a str), ParseError> {
        for (index, line) in self.lines.by_ref() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Ok((index + 1, line));
        }
        Err(ParseError::UnexpectedEnd(expected))
    }

    /// Next line parsed as exactly `N` signed 64-bit integers. Extra fields
    /// on the line are ignored, matching the original loader's tolerance.
    pub fn next_record<const N: usize>(
        &mut self,
        expected: &'static str,
    ) -> Result<(usize, [i64; N]), ParseError> {
        let (line_number, line) = self.next_line(expected)?;
        let values = parse_fields(line, line_number, expected)?;
        Ok((line_number, values))
    }

    /// Next line parsed as a single non-negative count.
    pub fn next_count(&mut self, expected: &'static str) -> Result<usize, ParseError> {
        let (line_number, [value]) = self.next_record::<1>(expected)?;
        if value < 0 {
            return Err(ParseError::InvalidCount {
                line: line_number,
                value,
            });
        }
        Ok(value as usize)
    }
}

/// Parse the first `N` whitespace-separated fields of `line` as integers.
pub(crate) fn parse_fields<const N: usize>(
    line: &str,
    line_number: usize,
    expected: &'static str,
) -> Result<[i64; N], ParseError> {
    let mut values = [0i64; N];
    let mut fields = line.split_whitespace();

    for value in &mut values {
        let token = fields.next().ok_or(ParseError::MissingField {
            line: line_number,
            expected,
        })?;
        *value = token.parse().map_err(|_| ParseError::InvalidInteger {
            line: line_number,
            token: token.to_string(),
        })?;
    }

    Ok(values)
}
