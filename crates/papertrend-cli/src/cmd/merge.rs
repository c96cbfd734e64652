//! Merge subcommand - study sheet + bibliography → dataset.parquet

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use papertrend_core::ProgressContext;
use papertrend_join::{JoinConfig, MergeOutput};

use crate::cmd::{parse::bib_config, pct, summary_table};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Curated study sheet (.xlsx, .ods, .csv, ...)
    #[arg(long)]
    pub studies: Option<PathBuf>,

    /// Tagged-text bibliography export
    #[arg(long)]
    pub bibliography: Option<PathBuf>,

    /// Worksheet holding the studies
    #[arg(long)]
    pub sheet: Option<String>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// DuckDB memory limit (e.g. "1GB")
    #[arg(long)]
    pub memory_limit: Option<String>,
}

/// Join and bibliography configs, CLI values over config values.
pub fn resolve(
    args: MergeArgs,
    config: &Config,
) -> Result<(JoinConfig, papertrend_bib::Config)> {
    let studies = args
        .studies
        .or_else(|| config.input.studies.clone())
        .context("No study sheet given (--studies or [input] studies)")?;
    let bibliography = args
        .bibliography
        .or_else(|| config.input.bibliography.clone())
        .context("No bibliography given (--bibliography or [input] bibliography)")?;
    let output = args
        .output
        .unwrap_or_else(|| config.output.default_dir.clone());

    let join_config = JoinConfig {
        studies,
        sheet: args.sheet.unwrap_or_else(|| config.input.sheet.clone()),
        output_dir: output.clone(),
        zstd_level: config.output.compression_level,
        memory_limit: args
            .memory_limit
            .unwrap_or_else(|| config.merge.memory_limit.clone()),
        category_rules: config.merge.rules(),
        multiple_sentinel: config.merge.multiple_sentinel.clone(),
    };
    let bib_config = bib_config(bibliography, output, config.output.compression_level, config);

    Ok((join_config, bib_config))
}

/// Run the full pipeline.
pub fn execute(args: MergeArgs, config: &Config, progress: &ProgressContext) -> Result<MergeOutput> {
    let (join_config, bib_config) = resolve(args, config)?;
    papertrend_join::run(&join_config, &bib_config, progress)
}

pub fn run(args: MergeArgs, config: &Config, progress: &ProgressContext) -> Result<()> {
    let output = execute(args, config, progress)?;
    let s = output.summary;

    let table = summary_table(
        "Merge",
        vec![
            ("Studies", s.studies.to_string()),
            ("Bibliography matched", pct(s.matched, s.studies)),
            ("With date", pct(s.dated, s.studies)),
            ("With sample size", pct(s.sized, s.studies)),
            ("Output", output.path.display().to_string()),
        ],
    );
    println!("\n{table}");
    Ok(())
}
