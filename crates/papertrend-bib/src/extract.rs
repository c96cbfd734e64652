//! Line → field assignment

use crate::date::is_date;
use crate::record::{Field, RecordBuffer};

/// Separator closing every field label.
pub const SEPARATOR: &str = ": ";

/// One entry of the prefix dispatch table: line start → field.
///
/// Tables are ordered and scanned front to back; the first match wins.
/// Additional labelled fields are added by extending the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    text: String,
    field: Field,
}

impl Prefix {
    /// Prefix `"<label>: "` for `field`.
    pub fn new(label: &str, field: Field) -> Self {
        Self {
            text: format!("{label}{SEPARATOR}"),
            field,
        }
    }

    pub fn for_field(field: Field) -> Self {
        Self::new(field.label(), field)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// Label without the separator.
    pub fn label(&self) -> &str {
        &self.text[..self.text.len() - SEPARATOR.len()]
    }
}

/// `Author: `, `Year: `, `Title: `, `Journal: `, `Abstract: `, `Date: `,
/// `Short Title: `, `DOI: `, `URL: `.
pub fn default_prefixes() -> Vec<Prefix> {
    Field::ALL.into_iter().map(Prefix::for_field).collect()
}

/// How a single line was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// The whole line is a date with no label.
    BareDate(&'a str),
    /// A registered prefix matched; value is the remainder of the line.
    Labelled(Field, &'a str),
    Ignored,
}

/// Drop one trailing `\n` (and the `\r` of a CRLF ending).
pub fn chomp(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Decide which field, if any, `line` belongs to.
///
/// A bare date is checked before any label, so a date line is routed to
/// `Date` even when it happens to start with a registered prefix.
pub fn classify_line<'a>(prefixes: &[Prefix], line: &'a str) -> LineKind<'a> {
    if is_date(line, false) {
        return LineKind::BareDate(chomp(line));
    }

    prefixes
        .iter()
        .find_map(|prefix| {
            line.strip_prefix(prefix.text())
                .map(|rest| LineKind::Labelled(prefix.field(), chomp(rest)))
        })
        .unwrap_or(LineKind::Ignored)
}

/// Write `line` into the record at `index`. Returns whether anything was written.
pub fn extract_info(
    prefixes: &[Prefix],
    line: &str,
    index: usize,
    buffer: &mut RecordBuffer,
) -> bool {
    match classify_line(prefixes, line) {
        LineKind::BareDate(value) => {
            buffer.set_field(index, Field::Date, value);
            true
        }
        LineKind::Labelled(field, value) => {
            buffer.set_field(index, field, value);
            true
        }
        LineKind::Ignored => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_order() {
        let labels: Vec<String> = default_prefixes()
            .iter()
            .map(|p| p.text().to_string())
            .collect();
        assert_eq!(
            labels,
            vec![
                "Author: ",
                "Year: ",
                "Title: ",
                "Journal: ",
                "Abstract: ",
                "Date: ",
                "Short Title: ",
                "DOI: ",
                "URL: ",
            ]
        );
    }

    #[test]
    fn label_strips_separator() {
        let prefix = Prefix::for_field(Field::ShortTitle);
        assert_eq!(prefix.label(), "Short Title");
        assert_eq!(prefix.text(), "Short Title: ");
    }

    #[test]
    fn labelled_value_loses_prefix_and_newline() {
        let mut buffer = RecordBuffer::new();
        assert!(extract_info(
            &default_prefixes(),
            "Title: Polygenic scores\n",
            0,
            &mut buffer
        ));
        assert_eq!(
            buffer.get(0).unwrap().title.as_deref(),
            Some("Polygenic scores")
        );
    }

    #[test]
    fn crlf_is_stripped() {
        let mut buffer = RecordBuffer::new();
        extract_info(&default_prefixes(), "DOI: 10.1/abc\r\n", 3, &mut buffer);
        assert_eq!(buffer.get(3).unwrap().doi.as_deref(), Some("10.1/abc"));
    }

    #[test]
    fn bare_date_goes_to_date_field() {
        let mut buffer = RecordBuffer::new();
        assert!(extract_info(&default_prefixes(), "Mar 2019\n", 1, &mut buffer));
        assert_eq!(buffer.get(1).unwrap().date.as_deref(), Some("Mar 2019"));
    }

    #[test]
    fn bare_date_wins_over_matching_prefix() {
        let prefixes = vec![Prefix::new("March", Field::Title)];
        // "March 3 1999" starts with "March " yet is a date
        let mut buffer = RecordBuffer::new();
        assert!(extract_info(&prefixes, "March 3 1999\n", 0, &mut buffer));
        let record = buffer.get(0).unwrap();
        assert_eq!(record.date.as_deref(), Some("March 3 1999"));
        assert!(record.title.is_none());
    }

    #[test]
    fn first_matching_prefix_wins() {
        // raw text so the earlier entry is a true prefix of "DOI: "
        let prefixes = vec![
            Prefix {
                text: "DO".to_string(),
                field: Field::Journal,
            },
            Prefix::for_field(Field::Doi),
        ];
        let mut buffer = RecordBuffer::new();
        assert!(extract_info(&prefixes, "DOI: 10.1/x\n", 0, &mut buffer));
        let record = buffer.get(0).unwrap();
        assert_eq!(record.journal.as_deref(), Some("I: 10.1/x"));
        assert!(record.doi.is_none());
    }

    #[test]
    fn title_does_not_shadow_short_title() {
        let mut buffer = RecordBuffer::new();
        extract_info(&default_prefixes(), "Short Title: PGS\n", 0, &mut buffer);
        let record = buffer.get(0).unwrap();
        assert_eq!(record.short_title.as_deref(), Some("PGS"));
        assert!(record.title.is_none());
    }

    #[test]
    fn unknown_and_blank_lines_are_ignored() {
        let mut buffer = RecordBuffer::new();
        let prefixes = default_prefixes();
        assert!(!extract_info(&prefixes, "Volume: 12\n", 0, &mut buffer));
        assert!(!extract_info(&prefixes, "\n", 0, &mut buffer));
        assert!(!extract_info(&prefixes, "Keywords: methylation\n", 0, &mut buffer));
        assert!(buffer.is_empty());
    }

    #[test]
    fn empty_value_is_still_written() {
        let mut buffer = RecordBuffer::new();
        assert!(extract_info(&default_prefixes(), "URL: \n", 0, &mut buffer));
        assert_eq!(buffer.get(0).unwrap().url.as_deref(), Some(""));
    }
}
