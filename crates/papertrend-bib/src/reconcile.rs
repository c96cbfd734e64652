//! `Date` + `Year` → `Date2`
//!
//! Exports carry a free-text `Date` ("Mar", "Jul 15", "2019 Mar 15") and a
//! separate `Year`. Both are combined into one candidate string and parsed.
//! The result is approximate: a year-only record lands on January 1st, a
//! month-only one on the configured day, and when the two sources disagree
//! the parsed year may not match `Year`.

use chrono::NaiveDate;

use crate::date::{DateDefaults, parse_date};
use crate::record::{BibRecord, RecordBuffer};

/// Text an absent field stringifies to.
pub const NULL_MARKER: &str = "nan";

/// Output format of `Date2`.
pub const DATE2_FORMAT: &str = "%Y-%m-%d";

/// Which rule produced a record's `Date2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Parsed from the composite string.
    Composite,
    /// Parsed from the `01 01 <yy>` fallback.
    Fallback,
    /// Nothing parseable; `Date2` is null.
    Unparsed,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub composite: usize,
    pub fallback: usize,
    pub unparsed: usize,
}

impl ReconcileSummary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Composite => self.composite += 1,
            Outcome::Fallback => self.fallback += 1,
            Outcome::Unparsed => self.unparsed += 1,
        }
    }

    pub fn dated(&self) -> usize {
        self.composite + self.fallback
    }
}

/// Candidate string from raw `Date` and `Year`.
///
/// Absent fields read as `"nan"`. An absent `Date` gives `Year` alone; a
/// `Date` already containing the year is used as is; otherwise
/// `"<Date> <Year>"`.
pub fn composite_date(date: Option<&str>, year: Option<&str>) -> String {
    let date = date.unwrap_or(NULL_MARKER);
    let year = year.unwrap_or(NULL_MARKER);

    if date == NULL_MARKER {
        year.to_string()
    } else if date.contains(year) {
        date.to_string()
    } else {
        format!("{date} {year}")
    }
}

/// `"01 01 "` followed by the last two characters of `composite`.
pub fn fallback_candidate(composite: &str) -> String {
    let tail: String = {
        let mut chars: Vec<char> = composite.chars().rev().take(2).collect();
        chars.reverse();
        chars.into_iter().collect()
    };
    format!("01 01 {tail}")
}

/// Reconcile one pair of raw fields.
pub fn reconcile_date(
    date: Option<&str>,
    year: Option<&str>,
    defaults: &DateDefaults,
) -> (Option<NaiveDate>, Outcome) {
    let composite = composite_date(date, year);

    let (candidate, outcome) = if composite.contains(NULL_MARKER) {
        (fallback_candidate(&composite), Outcome::Fallback)
    } else {
        (composite, Outcome::Composite)
    };

    match parse_date(&candidate, false, defaults) {
        Ok(parsed) => (Some(parsed), outcome),
        Err(e) => {
            log::debug!("No Date2 for {date:?} / {year:?} ({candidate:?}): {e}");
            (None, Outcome::Unparsed)
        }
    }
}

/// Fill `date2` on one record.
pub fn reconcile_record(record: &mut BibRecord, defaults: &DateDefaults) -> Outcome {
    let (parsed, outcome) = reconcile_date(record.date.as_deref(), record.year.as_deref(), defaults);
    record.date2 = parsed.map(|d| d.format(DATE2_FORMAT).to_string());
    outcome
}

/// Fill `date2` on every record of the buffer.
pub fn reconcile(buffer: &mut RecordBuffer, defaults: &DateDefaults) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();
    for record in buffer.records_mut() {
        summary.record(reconcile_record(record, defaults));
    }
    summary
}
