//! Curated study sheet loading
//!
//! The sheet is read with a header row; every cell is reduced to text the
//! way a spreadsheet displays it (`12.0` → `12`), and only rows marked
//! `Include = Yes` are kept.

use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, open_workbook_auto};

/// Value of `Include` that keeps a row.
pub const INCLUDE_YES: &str = "Yes";

/// Header names the loader looks up.
pub mod columns {
    pub const IDENTIFIER: &str = "Identifier";
    pub const INCLUDE: &str = "Include";
    pub const TITLE: &str = "Title";
    pub const PHENOTYPE: &str = "Phenotype";
    pub const CATEGORY: &str = "Category";
    pub const SAMPLE_SIZE: &str = "Sample size";
    pub const ARRAY: &str = "Array";
    pub const MULTIPLE_ARRAY: &str = "Multiple_array";

    pub const REQUIRED: [&str; 7] = [
        IDENTIFIER,
        INCLUDE,
        PHENOTYPE,
        CATEGORY,
        SAMPLE_SIZE,
        ARRAY,
        MULTIPLE_ARRAY,
    ];
}

/// One included row of the study sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudyRecord {
    /// 1-based data row in the sheet (header excluded)
    pub sheet_row: i64,
    pub identifier: Option<i64>,
    pub include: Option<String>,
    pub title: Option<String>,
    pub phenotype: Option<String>,
    pub category: Option<String>,
    /// Raw text; coerced to a number during the merge
    pub sample_size: Option<String>,
    pub array: Option<String>,
    pub multiple_array: Option<String>,
}

/// Header plus stringified cells, independent of the source format.
#[derive(Debug, Default)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl SheetTable {
    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

/// Spreadsheet-style text for a number: integral values lose the `.0`.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => non_empty(s.clone()),
        Data::Float(f) => Some(format_number(*f)),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        Data::Error(e) => {
            log::debug!("Cell error {e:?} read as empty");
            None
        }
        other => non_empty(other.to_string()),
    }
}

/// `12`, `12.0` and ` 12 ` all read as 12.
pub fn parse_identifier(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15)
            .map(|f| f as i64)
    })
}

fn read_workbook(path: &Path, sheet: &str) -> Result<SheetTable> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open study sheet: {}", path.display()))?;

    let names = workbook.sheet_names();
    if !names.iter().any(|n| n == sheet) {
        bail!(
            "Sheet {sheet:?} not found in {} (available: {})",
            path.display(),
            names.join(", ")
        );
    }

    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("Failed to read sheet {sheet:?}"))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|header| {
            header
                .iter()
                .map(|c| cell_text(c).unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();
    let rows = rows.map(|r| r.iter().map(cell_text).collect()).collect();

    Ok(SheetTable { headers, rows })
}

fn read_csv(path: &Path) -> Result<SheetTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open study sheet: {}", path.display()))?;

    let headers = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(String::from)
        .collect();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {}", i + 1))?;
        rows.push(record.iter().map(|c| non_empty(c.to_string())).collect());
    }

    Ok(SheetTable { headers, rows })
}

/// Read a study sheet: CSV by extension, anything else through calamine.
pub fn read_table(path: &Path, sheet: &str) -> Result<SheetTable> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        read_csv(path)
    } else {
        read_workbook(path, sheet)
    }
}

/// Included rows of `table`, in sheet order.
pub fn included_studies(table: &SheetTable) -> Result<Vec<StudyRecord>> {
    let missing: Vec<&str> = columns::REQUIRED
        .into_iter()
        .filter(|name| table.column(name).is_none())
        .collect();
    if !missing.is_empty() {
        bail!("Study sheet is missing columns: {}", missing.join(", "));
    }

    let title = table.column(columns::TITLE);
    if title.is_none() {
        log::warn!("Study sheet has no {:?} column", columns::TITLE);
    }
    // required columns are known to exist past this point
    let idx = |name: &str| table.column(name).unwrap_or_default();
    let (identifier, include, phenotype, category, sample_size, array, multiple_array) = (
        idx(columns::IDENTIFIER),
        idx(columns::INCLUDE),
        idx(columns::PHENOTYPE),
        idx(columns::CATEGORY),
        idx(columns::SAMPLE_SIZE),
        idx(columns::ARRAY),
        idx(columns::MULTIPLE_ARRAY),
    );

    let mut studies = Vec::new();
    for (i, row) in table.rows.iter().enumerate() {
        let cell = |col: usize| row.get(col).cloned().flatten();

        if cell(include).as_deref() != Some(INCLUDE_YES) {
            continue;
        }

        let raw_id = cell(identifier);
        let parsed_id = raw_id.as_deref().and_then(parse_identifier);
        if raw_id.is_some() && parsed_id.is_none() {
            log::warn!("Row {}: unusable identifier {:?}", i + 1, raw_id);
        }

        studies.push(StudyRecord {
            sheet_row: i as i64 + 1,
            identifier: parsed_id,
            include: cell(include),
            title: title.and_then(cell),
            phenotype: cell(phenotype),
            category: cell(category),
            sample_size: cell(sample_size),
            array: cell(array),
            multiple_array: cell(multiple_array),
        });
    }

    log::info!(
        "Study sheet: {} rows, {} included",
        table.rows.len(),
        studies.len()
    );
    Ok(studies)
}

/// Load the included studies from `path`.
pub fn load_studies(path: &Path, sheet: &str) -> Result<Vec<StudyRecord>> {
    let table = read_table(path, sheet)?;
    included_studies(&table)
        .with_context(|| format!("Invalid study sheet: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> SheetTable {
        SheetTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| non_empty(c.to_string())).collect())
                .collect(),
        }
    }

    const HEADERS: [&str; 8] = [
        "Identifier",
        "Include",
        "Title",
        "Phenotype",
        "Category",
        "Sample size",
        "Array",
        "Multiple_array",
    ];

    #[test]
    fn integral_floats_lose_fraction() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn identifiers_accept_float_text() {
        assert_eq!(parse_identifier("12"), Some(12));
        assert_eq!(parse_identifier(" 12.0 "), Some(12));
        assert_eq!(parse_identifier("12.5"), None);
        assert_eq!(parse_identifier("n/a"), None);
    }

    #[test]
    fn only_yes_rows_are_kept() {
        let t = table(
            &HEADERS,
            &[
                &["1", "Yes", "A", "BMI", "Metabolic", "100", "450K", ""],
                &["2", "No", "B", "BMI", "Metabolic", "200", "EPIC", ""],
                &["3", "yes", "C", "BMI", "Metabolic", "300", "EPIC", ""],
                &["4", "Yes", "D", "Asthma", "Respiratory", "n=40", "Multiple", "450K, EPIC"],
            ],
        );
        let studies = included_studies(&t).unwrap();
        let ids: Vec<Option<i64>> = studies.iter().map(|s| s.identifier).collect();
        assert_eq!(ids, vec![Some(1), Some(4)]);
        assert_eq!(studies[1].sheet_row, 4);
        assert_eq!(studies[1].sample_size.as_deref(), Some("n=40"));
        assert_eq!(studies[1].multiple_array.as_deref(), Some("450K, EPIC"));
        assert_eq!(studies[0].multiple_array, None);
    }

    #[test]
    fn missing_columns_are_reported() {
        let t = table(&["Identifier", "Include", "Title"], &[]);
        let err = included_studies(&t).unwrap_err().to_string();
        assert!(err.contains("Phenotype"));
        assert!(err.contains("Multiple_array"));
        assert!(!err.contains("Title"));
    }

    #[test]
    fn title_column_is_optional() {
        let headers: Vec<&str> = HEADERS.into_iter().filter(|h| *h != "Title").collect();
        let t = table(&headers, &[&["7", "Yes", "BMI", "Metabolic", "10", "EPIC", ""]]);
        let studies = included_studies(&t).unwrap();
        assert_eq!(studies[0].identifier, Some(7));
        assert_eq!(studies[0].title, None);
        assert_eq!(studies[0].phenotype.as_deref(), Some("BMI"));
    }

    #[test]
    fn short_rows_read_as_empty() {
        let t = table(&HEADERS, &[&["9", "Yes", "Short"]]);
        let studies = included_studies(&t).unwrap();
        assert_eq!(studies[0].title.as_deref(), Some("Short"));
        assert_eq!(studies[0].array, None);
    }

    #[test]
    fn cell_text_stringifies() {
        assert_eq!(cell_text(&Data::Float(2016.0)).as_deref(), Some("2016"));
        assert_eq!(cell_text(&Data::Int(5)).as_deref(), Some("5"));
        assert_eq!(cell_text(&Data::String(String::new())), None);
        assert_eq!(cell_text(&Data::Empty), None);
    }
}
