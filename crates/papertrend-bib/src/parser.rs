//! Tagged-text bibliography parser
//!
//! Single pass over a reference-manager text export:
//!
//! ```text
//! Reference Type:  Journal Article
//! Record Number: 12
//! Author: Smith, J.
//! Year: 2021
//! Title: Methylation risk scores in ...
//! ```
//!
//! `Record Number` lines move the current record; every other line is
//! assigned to the current record by the [`crate::extract`] rules.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

use crate::extract::{LineKind, Prefix, classify_line, default_prefixes};
use crate::record::{Field, RecordBuffer};

/// Lines starting with this are skipped.
pub const HEADER_MARKER: &str = "Reference Type";

/// Lines starting with this open a new record.
pub const RECORD_MARKER: &str = "Record Number";

/// Line counts from one parse, for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseSummary {
    pub lines: usize,
    pub headers: usize,
    pub markers: usize,
    pub labelled: usize,
    pub bare_dates: usize,
    pub ignored: usize,
    /// Marker lines whose number could not be used.
    pub bad_markers: usize,
}

/// Ordinal from a `Record Number` line: all its digits, read as one number.
///
/// `None` when the line has no digits, the number is 0 or it overflows.
pub fn record_ordinal(line: &str) -> Option<usize> {
    let digits: String = line.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<usize>().ok().filter(|n| *n > 0)
}

/// Fold state: the current 1-based record number and the rows built so far.
#[derive(Debug)]
pub struct ParseState<'p> {
    prefixes: &'p [Prefix],
    current: usize,
    buffer: RecordBuffer,
    summary: ParseSummary,
}

impl<'p> ParseState<'p> {
    pub fn new(prefixes: &'p [Prefix]) -> Self {
        Self {
            prefixes,
            current: 1,
            buffer: RecordBuffer::new(),
            summary: ParseSummary::default(),
        }
    }

    /// Current 1-based record number.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Consume one line.
    pub fn step(mut self, line: &str) -> Self {
        let line = line.strip_prefix('\u{feff}').unwrap_or(line);
        self.summary.lines += 1;

        if line.starts_with(HEADER_MARKER) {
            self.summary.headers += 1;
            return self;
        }

        if line.starts_with(RECORD_MARKER) {
            self.summary.markers += 1;
            match record_ordinal(line).and_then(|n| i64::try_from(n).ok().map(|id| (n, id))) {
                Some((n, id)) => {
                    self.current = n;
                    self.buffer.set_identifier(n - 1, id);
                }
                None => {
                    self.summary.bad_markers += 1;
                    log::warn!(
                        "Unusable record marker {:?}; staying on record {}",
                        line.trim_end(),
                        self.current
                    );
                }
            }
            return self;
        }

        let index = self.current - 1;
        match classify_line(self.prefixes, line) {
            LineKind::BareDate(value) => {
                self.summary.bare_dates += 1;
                log::trace!("record {}: unlabelled date {value:?}", self.current);
                self.buffer.set_field(index, Field::Date, value);
            }
            LineKind::Labelled(field, value) => {
                self.summary.labelled += 1;
                self.buffer.set_field(index, field, value);
            }
            LineKind::Ignored => {
                self.summary.ignored += 1;
            }
        }
        self
    }

    pub fn finish(self) -> (RecordBuffer, ParseSummary) {
        (self.buffer, self.summary)
    }
}

/// Parse lines with an explicit prefix table.
pub fn parse_lines_with<I, S>(prefixes: &[Prefix], lines: I) -> (RecordBuffer, ParseSummary)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .fold(ParseState::new(prefixes), |state, line| {
            state.step(line.as_ref())
        })
        .finish()
}

/// Parse lines with the default prefix table.
pub fn parse_bibliography<I, S>(lines: I) -> RecordBuffer
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parse_lines_with(&default_prefixes(), lines).0
}

/// Stream-parse from a reader. Invalid UTF-8 is replaced, not rejected.
pub fn parse_reader<R: BufRead>(
    reader: R,
    prefixes: &[Prefix],
) -> Result<(RecordBuffer, ParseSummary)> {
    let state = reader
        .split(b'\n')
        .try_fold(ParseState::new(prefixes), |state, chunk| {
            let bytes = chunk.context("Failed to read bibliography line")?;
            anyhow::Ok(state.step(&String::from_utf8_lossy(&bytes)))
        })?;
    Ok(state.finish())
}

/// Parse a bibliography export file.
pub fn parse_file(path: &Path, prefixes: &[Prefix]) -> Result<(RecordBuffer, ParseSummary)> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open bibliography: {}", path.display()))?;
    parse_reader(BufReader::new(file), prefixes)
        .with_context(|| format!("Failed to parse bibliography: {}", path.display()))
}
