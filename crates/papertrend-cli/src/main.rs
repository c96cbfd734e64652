//! papertrend - study sample sizes over time
//!
//! Parses a reference-manager export, merges it with a curated study
//! sheet and exports the dataset and a trend figure description.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "papertrend")]
#[command(about = "Bibliography + study sheet merge and sample-size trend figures")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./papertrend.toml or ~/.config/papertrend/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a bibliography export into bibliography.parquet
    Parse(cmd::parse::ParseArgs),
    /// Merge the study sheet with the bibliography into dataset.parquet
    Merge(cmd::merge::MergeArgs),
    /// Merge, then write the sample-size-over-time figure as JSON
    Figure(cmd::figure::FigureArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let progress = papertrend_core::ProgressContext::new();

    // TTY: warn only unless --debug, spinners show activity.
    // non-TTY: info, logs are the only progress indicator.
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    papertrend_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Parse(args) => cmd::parse::run(args, &config, &progress),
        Command::Merge(args) => cmd::merge::run(args, &config, &progress),
        Command::Figure(args) => cmd::figure::run(args, &config, &progress),
        Command::Config => {
            let or_unset = |p: &Option<std::path::PathBuf>| {
                p.as_ref()
                    .map_or_else(|| "not set".to_string(), |p| p.display().to_string())
            };
            let rules = config
                .merge
                .category_rules
                .iter()
                .map(|r| format!("{} → {}", r.pattern, r.category))
                .collect::<Vec<_>>()
                .join("\n");
            let maps = if config.plot.color_maps.is_empty() {
                format!("none ({})", papertrend_plot::options::FALLBACK_SCALE)
            } else {
                config
                    .plot
                    .color_maps
                    .iter()
                    .map(|(column, map)| format!("{column}: {} colours", map.len()))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            let reference = config
                .dates
                .reference_date
                .map_or_else(|| "today".to_string(), |d| d.to_string());

            let table = cmd::summary_table(
                "Setting",
                vec![
                    ("Study sheet", or_unset(&config.input.studies)),
                    ("Worksheet", config.input.sheet.clone()),
                    ("Bibliography", or_unset(&config.input.bibliography)),
                    ("Output directory", config.output.default_dir.display().to_string()),
                    ("Compression level", config.output.compression_level.to_string()),
                    ("Month-only day", config.dates.month_only_day.to_string()),
                    ("Reference date", reference),
                    ("DuckDB memory", config.merge.memory_limit.clone()),
                    ("Multiple sentinel", config.merge.multiple_sentinel.clone()),
                    ("Category rules", rules),
                    ("Colour by", config.plot.color_by.to_string()),
                    ("Log sample size", config.plot.log_sample_size.to_string()),
                    (
                        "Trendline",
                        format!("{} ({})", config.plot.model_type, config.plot.scope),
                    ),
                    ("Colour maps", maps),
                    ("Figure output", config.plot.out.display().to_string()),
                ],
            );

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
