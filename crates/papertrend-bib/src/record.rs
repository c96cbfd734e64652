//! Bibliography records and the index-keyed buffer they are parsed into

use std::collections::BTreeMap;

/// Labelled fields recognised in the text export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Author,
    Year,
    Title,
    Journal,
    Abstract,
    Date,
    ShortTitle,
    Doi,
    Url,
}

impl Field {
    /// Default dispatch order for prefix matching.
    pub const ALL: [Field; 9] = [
        Field::Author,
        Field::Year,
        Field::Title,
        Field::Journal,
        Field::Abstract,
        Field::Date,
        Field::ShortTitle,
        Field::Doi,
        Field::Url,
    ];

    /// Label as written in the export, without the `": "` separator.
    pub fn label(self) -> &'static str {
        match self {
            Field::Author => "Author",
            Field::Year => "Year",
            Field::Title => "Title",
            Field::Journal => "Journal",
            Field::Abstract => "Abstract",
            Field::Date => "Date",
            Field::ShortTitle => "Short Title",
            Field::Doi => "DOI",
            Field::Url => "URL",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One bibliography entry. Every field is optional; `date2` is derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibRecord {
    pub identifier: Option<i64>,
    pub author: Option<String>,
    pub year: Option<String>,
    pub title: Option<String>,
    pub journal: Option<String>,
    pub abstract_text: Option<String>,
    pub date: Option<String>,
    pub short_title: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
    /// Reconciled `YYYY-MM-DD`, filled by [`crate::reconcile`].
    pub date2: Option<String>,
}

impl BibRecord {
    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Author => &mut self.author,
            Field::Year => &mut self.year,
            Field::Title => &mut self.title,
            Field::Journal => &mut self.journal,
            Field::Abstract => &mut self.abstract_text,
            Field::Date => &mut self.date,
            Field::ShortTitle => &mut self.short_title,
            Field::Doi => &mut self.doi,
            Field::Url => &mut self.url,
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        let slot = match field {
            Field::Author => &self.author,
            Field::Year => &self.year,
            Field::Title => &self.title,
            Field::Journal => &self.journal,
            Field::Abstract => &self.abstract_text,
            Field::Date => &self.date,
            Field::ShortTitle => &self.short_title,
            Field::Doi => &self.doi,
            Field::Url => &self.url,
        };
        slot.as_deref()
    }

    /// Overwrite `field`. Earlier values are discarded, never appended to.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }
}

/// Records keyed by 0-based index, created on first write.
///
/// The export does not announce how many records it holds and numbering may
/// skip, so rows only exist for indices that received a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordBuffer {
    rows: BTreeMap<usize, BibRecord>,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_field(&mut self, index: usize, field: Field, value: impl Into<String>) {
        self.rows.entry(index).or_default().set(field, value);
    }

    pub fn set_identifier(&mut self, index: usize, identifier: i64) {
        self.rows.entry(index).or_default().identifier = Some(identifier);
    }

    pub fn get(&self, index: usize) -> Option<&BibRecord> {
        self.rows.get(&index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &BibRecord)> {
        self.rows.iter().map(|(i, r)| (*i, r))
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut BibRecord> {
        self.rows.values_mut()
    }
}
