//! papertrend-join: study sheet + bibliography merge
//!
//! Stages the included study rows and the reconciled bibliography as
//! Parquet, left-joins them on `identifier` in DuckDB, applies the
//! post-merge corrections and exports `dataset.parquet`.

mod config;
pub mod schema;
mod sql;
pub mod studies;

pub use config::{CategoryRule, DEFAULT_SHEET, JoinConfig, MULTIPLE_SENTINEL, default_category_rules};
pub use studies::{StudyRecord, load_studies};

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use duckdb::Connection;
use papertrend_bib::RecordBuffer;
use papertrend_core::{ProgressContext, cleanup_tmp_files, fmt_num, is_valid_parquet, write_table};

/// One row of the merged dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedRow {
    pub sheet_row: i64,
    pub identifier: Option<i64>,
    pub title: Option<String>,
    pub phenotype: Option<String>,
    pub category: Option<String>,
    /// Null when the sheet value isn't numeric
    pub sample_size: Option<f64>,
    /// `Multiple_array` already substituted for the sentinel
    pub array: Option<String>,
    pub multiple_array: Option<String>,
    pub date2: Option<String>,
    pub date: Option<NaiveDate>,
    pub short_title: Option<String>,
    pub abstract_text: Option<String>,
    pub url: Option<String>,
}

/// Merged rows in sheet order. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedDataset {
    rows: Vec<MergedRow>,
}

impl MergedDataset {
    pub fn new(rows: Vec<MergedRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MergedRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Summary statistics from the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub studies: usize,
    /// Study rows with a bibliography record
    pub matched: usize,
    pub dated: usize,
    pub sized: usize,
}

#[derive(Debug)]
pub struct MergeOutput {
    pub dataset: MergedDataset,
    pub summary: MergeSummary,
    pub path: PathBuf,
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

/// Merge already-loaded inputs.
pub fn merge(
    studies: &[StudyRecord],
    bibliography: &RecordBuffer,
    config: &JoinConfig,
) -> Result<MergeOutput> {
    let out = &config.output_dir;
    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output dir: {}", out.display()))?;
    cleanup_tmp_files(out)?;

    log::info!("Staging {} studies, {} records", studies.len(), bibliography.len());
    let studies_batch =
        schema::studies_batch(studies).context("Failed to build studies batch")?;
    let studies_path = write_table("studies", out, &studies_batch, config.zstd_level)
        .context("Failed to write studies.parquet")?;
    let bib_batch = papertrend_bib::transform::to_record_batch(bibliography)
        .context("Failed to build bibliography batch")?;
    let bib_path = write_table(
        papertrend_bib::runner::TABLE,
        out,
        &bib_batch,
        config.zstd_level,
    )
    .context("Failed to write bibliography.parquet")?;

    let conn =
        Connection::open_in_memory().context("Failed to open DuckDB in-memory connection")?;
    conn.execute_batch(&sql::configure(&config.memory_limit))
        .context("Failed to configure DuckDB")?;

    for stmt in sql::create_source_views(&bib_path, &studies_path) {
        conn.execute_batch(&stmt)
            .with_context(|| format!("Failed to create view: {stmt}"))?;
    }

    log::info!("Joining studies + bibliography on identifier");
    conn.execute_batch(sql::create_merged())
        .context("Failed: studies+bibliography join")?;

    for (rule, stmt) in config
        .category_rules
        .iter()
        .zip(sql::apply_category_rules(&config.category_rules))
    {
        let changed = conn
            .execute(&stmt, [])
            .with_context(|| format!("Failed to apply category rule {:?}", rule.pattern))?;
        log::debug!("{:?} → {:?}: {changed} rows", rule.pattern, rule.category);
    }

    conn.execute_batch(&sql::create_dataset(&config.multiple_sentinel))
        .context("Failed to build dataset table")?;

    let summary = conn
        .query_row(sql::summary_query(), [], |row| {
            Ok(MergeSummary {
                studies: row.get::<_, i64>(0)? as usize,
                matched: row.get::<_, i64>(1)? as usize,
                dated: row.get::<_, i64>(2)? as usize,
                sized: row.get::<_, i64>(3)? as usize,
            })
        })
        .context("Failed to query merge summary")?;

    log::info!(
        "Merge complete: {} studies, {} matched ({:.1}%), {} dated ({:.1}%), {} with sample size",
        summary.studies,
        summary.matched,
        pct(summary.matched, summary.studies),
        summary.dated,
        pct(summary.dated, summary.studies),
        summary.sized,
    );

    log::info!("Exporting dataset.parquet");
    conn.execute_batch(&sql::export_dataset(out))
        .context("Failed to export dataset.parquet")?;
    let path = out.join("dataset.parquet");
    if !is_valid_parquet(&path) {
        anyhow::bail!("DuckDB export left no readable {}", path.display());
    }

    let mut stmt = conn
        .prepare(sql::select_rows())
        .context("Failed to prepare dataset query")?;
    let rows = stmt
        .query_map([], |row| {
            let date_text: Option<String> = row.get(9)?;
            Ok(MergedRow {
                sheet_row: row.get(0)?,
                identifier: row.get(1)?,
                title: row.get(2)?,
                phenotype: row.get(3)?,
                category: row.get(4)?,
                sample_size: row.get(5)?,
                array: row.get(6)?,
                multiple_array: row.get(7)?,
                date2: row.get(8)?,
                date: date_text.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
                short_title: row.get(10)?,
                abstract_text: row.get(11)?,
                url: row.get(12)?,
            })
        })
        .context("Failed to read dataset rows")?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read dataset rows")?;

    Ok(MergeOutput {
        dataset: MergedDataset::new(rows),
        summary,
        path,
    })
}

/// Load both inputs and merge them.
pub fn run(
    config: &JoinConfig,
    bib_config: &papertrend_bib::Config,
    progress: &ProgressContext,
) -> Result<MergeOutput> {
    let pb = progress.stage_line("studies");
    pb.set_message(config.studies.display().to_string());
    let studies = load_studies(&config.studies, &config.sheet)?;
    pb.finish_with_message(format!("{} included", fmt_num(studies.len())));

    let pb = progress.stage_line("parse");
    pb.set_message(bib_config.input.display().to_string());
    let bib = papertrend_bib::load(bib_config)?;
    pb.finish_with_message(format!("{} records", fmt_num(bib.records.len())));

    let pb = progress.stage_line("merge");
    pb.set_message("joining");
    let output = merge(&studies, &bib.records, config)?;
    pb.finish_with_message(format!("{} rows", fmt_num(output.dataset.len())));

    log::info!("Done. Output: {}", output.path.display());
    Ok(output)
}
