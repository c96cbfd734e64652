//! SQL generation for the study/bibliography merge.
//!
//! Both inputs are staged as Parquet and exposed as views; the merge is a
//! single left join followed by in-place corrections and one typed
//! projection that becomes `dataset.parquet`.

use std::path::Path;

use crate::config::CategoryRule;

/// Single-quoted SQL string literal.
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn quote_path(path: &Path) -> String {
    quote_literal(&path.to_string_lossy())
}

pub fn configure(memory_limit: &str) -> String {
    format!("SET memory_limit = {};", quote_literal(memory_limit))
}

/// Views over the staged tables.
pub fn create_source_views(bibliography: &Path, studies: &Path) -> Vec<String> {
    vec![
        format!(
            "CREATE OR REPLACE VIEW v_bibliography AS \
             SELECT * FROM read_parquet({})",
            quote_path(bibliography)
        ),
        format!(
            "CREATE OR REPLACE VIEW v_studies AS \
             SELECT * FROM read_parquet({})",
            quote_path(studies)
        ),
    ]
}

/// Every study row, with the bibliography columns where `identifier` matches.
pub fn create_merged() -> &'static str {
    "CREATE OR REPLACE TABLE merged AS
     SELECT s.sheet_row,
            s.identifier,
            s.include,
            s.title,
            s.phenotype,
            s.category,
            s.sample_size,
            s.\"array\",
            s.multiple_array,
            b.identifier AS bib_identifier,
            b.date2,
            b.short_title,
            b.abstract,
            b.url
     FROM v_studies s
     LEFT JOIN v_bibliography b ON s.identifier = b.identifier"
}

/// One UPDATE per rule, in rule order; later rules win on overlap.
pub fn apply_category_rules(rules: &[CategoryRule]) -> Vec<String> {
    rules
        .iter()
        .map(|rule| {
            format!(
                "UPDATE merged SET category = {} WHERE contains(phenotype, {})",
                quote_literal(&rule.category),
                quote_literal(&rule.pattern)
            )
        })
        .collect()
}

/// Typed projection: numeric sample size, parsed date, resolved array.
pub fn create_dataset(multiple_sentinel: &str) -> String {
    format!(
        "CREATE OR REPLACE TABLE dataset AS
         SELECT sheet_row,
                identifier,
                include,
                title,
                phenotype,
                category,
                TRY_CAST(TRIM(sample_size) AS DOUBLE) AS sample_size,
                CASE WHEN \"array\" = {sentinel} THEN multiple_array ELSE \"array\" END AS \"array\",
                multiple_array,
                date2,
                TRY_CAST(date2 AS DATE) AS \"date\",
                short_title,
                abstract,
                url
         FROM merged",
        sentinel = quote_literal(multiple_sentinel)
    )
}

pub fn export_dataset(output_dir: &Path) -> String {
    format!(
        "COPY (SELECT * FROM dataset ORDER BY sheet_row) \
         TO {} (FORMAT PARQUET, COMPRESSION ZSTD)",
        quote_path(&output_dir.join("dataset.parquet"))
    )
}

/// studies, matched, dated, sized
pub fn summary_query() -> &'static str {
    "SELECT (SELECT COUNT(*) FROM dataset),
            (SELECT COUNT(bib_identifier) FROM merged),
            (SELECT COUNT(\"date\") FROM dataset),
            (SELECT COUNT(sample_size) FROM dataset)"
}

/// Dataset rows in sheet order, date as ISO text.
pub fn select_rows() -> &'static str {
    "SELECT sheet_row,
            identifier,
            title,
            phenotype,
            category,
            sample_size,
            \"array\",
            multiple_array,
            date2,
            CAST(\"date\" AS VARCHAR),
            short_title,
            abstract,
            url
     FROM dataset
     ORDER BY sheet_row"
}
