//! Parse subcommand - bibliography export → bibliography.parquet

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use papertrend_core::{ProgressContext, fmt_num};

use crate::cmd::{pct, summary_table};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Tagged-text bibliography export
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Zstd compression level (1-22)
    #[arg(short, long)]
    pub zstd_level: Option<i32>,
}

pub fn bib_config(input: PathBuf, output: PathBuf, zstd_level: i32, config: &Config) -> papertrend_bib::Config {
    papertrend_bib::Config {
        input,
        output_dir: output,
        zstd_level,
        dates: config.dates.defaults(),
        ..Default::default()
    }
}

pub fn run(args: ParseArgs, config: &Config, progress: &ProgressContext) -> Result<()> {
    let bib_config = bib_config(
        args.input,
        args.output.unwrap_or_else(|| config.output.default_dir.clone()),
        args.zstd_level.unwrap_or(config.output.compression_level),
        config,
    );

    let summary = papertrend_bib::run(&bib_config, progress)?;

    let table = summary_table(
        "Bibliography",
        vec![
            ("Records", fmt_num(summary.records)),
            ("Lines", fmt_num(summary.parse.lines)),
            ("Unlabelled dates", fmt_num(summary.parse.bare_dates)),
            ("Ignored lines", fmt_num(summary.parse.ignored)),
            ("Dated", pct(summary.dates.dated(), summary.records)),
            ("  via 01 01 fallback", fmt_num(summary.dates.fallback)),
            ("Undated", fmt_num(summary.dates.unparsed)),
            ("Output", summary.output.display().to_string()),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );
    println!("\n{table}");
    Ok(())
}
