//! Parse → reconcile → bibliography.parquet

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use papertrend_core::{ProgressContext, cleanup_tmp_files, fmt_num, write_table};

use crate::config::Config;
use crate::parser::{ParseSummary, parse_file};
use crate::reconcile::{ReconcileSummary, reconcile};
use crate::record::RecordBuffer;
use crate::transform::to_record_batch;

/// Output table name
pub const TABLE: &str = "bibliography";

/// Parsed and reconciled export, held in memory.
#[derive(Debug)]
pub struct Bibliography {
    pub records: RecordBuffer,
    pub parse: ParseSummary,
    pub dates: ReconcileSummary,
}

/// Read `config.input` and fill `Date2` on every record.
pub fn load(config: &Config) -> Result<Bibliography> {
    log::info!("Parsing {}", config.input.display());
    let (mut records, parse) = parse_file(&config.input, &config.prefixes)?;
    log::debug!(
        "{} lines: {} headers, {} markers, {} labelled, {} bare dates, {} ignored",
        parse.lines,
        parse.headers,
        parse.markers,
        parse.labelled,
        parse.bare_dates,
        parse.ignored
    );
    if parse.bad_markers > 0 {
        log::warn!("{} record markers without a usable number", parse.bad_markers);
    }

    let dates = reconcile(&mut records, &config.dates);
    log::info!(
        "Records: {} ({} dated, {} via fallback, {} undated)",
        fmt_num(records.len()),
        fmt_num(dates.dated()),
        fmt_num(dates.fallback),
        fmt_num(dates.unparsed)
    );

    Ok(Bibliography {
        records,
        parse,
        dates,
    })
}

/// Pipeline execution summary
#[derive(Debug)]
pub struct Summary {
    pub records: usize,
    pub parse: ParseSummary,
    pub dates: ReconcileSummary,
    pub output: std::path::PathBuf,
    pub elapsed: Duration,
}

/// Run the bibliography pipeline and write `bibliography.parquet`.
pub fn run(config: &Config, progress: &ProgressContext) -> Result<Summary> {
    let start = Instant::now();

    std::fs::create_dir_all(&config.output_dir).context("Failed to create output directory")?;
    cleanup_tmp_files(&config.output_dir)?;

    let pb = progress.stage_line("parse");
    pb.set_message(config.input.display().to_string());
    let bib = load(config)?;

    pb.set_message("writing parquet");
    let batch = to_record_batch(&bib.records).context("Failed to build bibliography batch")?;
    let output = write_table(TABLE, &config.output_dir, &batch, config.zstd_level)
        .with_context(|| format!("Failed to write {TABLE}.parquet"))?;
    pb.finish_with_message(format!("{} records", fmt_num(bib.records.len())));

    let summary = Summary {
        records: bib.records.len(),
        parse: bib.parse,
        dates: bib.dates,
        output,
        elapsed: start.elapsed(),
    };

    log::info!("=== Bibliography Summary ===");
    log::info!("Records: {}", fmt_num(summary.records));
    log::info!("Output: {}", summary.output.display());
    log::info!("Time: {:.1}s", summary.elapsed.as_secs_f64());

    Ok(summary)
}
