//! Figure subcommand - merged dataset → plotly figure JSON

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use papertrend_core::ProgressContext;
use papertrend_plot::{PlotOptions, build_figure};

use crate::cmd::{merge, summary_table};
use crate::config::{Config, PlotConfig};

#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum ColorByArg {
    Category,
    Array,
    Phenotype,
}

impl From<ColorByArg> for papertrend_plot::ColorBy {
    fn from(c: ColorByArg) -> Self {
        match c {
            ColorByArg::Category => papertrend_plot::ColorBy::Category,
            ColorByArg::Array => papertrend_plot::ColorBy::Array,
            ColorByArg::Phenotype => papertrend_plot::ColorBy::Phenotype,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum ModelArg {
    Ols,
    Lowess,
}

impl From<ModelArg> for papertrend_plot::ModelType {
    fn from(m: ModelArg) -> Self {
        match m {
            ModelArg::Ols => papertrend_plot::ModelType::Ols,
            ModelArg::Lowess => papertrend_plot::ModelType::Lowess,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum ScopeArg {
    Overall,
    Trace,
}

impl From<ScopeArg> for papertrend_plot::Scope {
    fn from(s: ScopeArg) -> Self {
        match s {
            ScopeArg::Overall => papertrend_plot::Scope::Overall,
            ScopeArg::Trace => papertrend_plot::Scope::Trace,
        }
    }
}

#[derive(Args, Debug)]
pub struct FigureArgs {
    #[command(flatten)]
    pub merge: merge::MergeArgs,

    /// Column that colours the points
    #[arg(long, value_enum)]
    pub color_by: Option<ColorByArg>,

    /// Linear sample-size axis instead of log
    #[arg(long)]
    pub linear: bool,

    /// Trendline model
    #[arg(long, value_enum)]
    pub model: Option<ModelArg>,

    /// One trendline overall or one per colour group
    #[arg(long, value_enum)]
    pub scope: Option<ScopeArg>,

    /// Figure JSON path
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Plot options from `[plot]`, with flags taking precedence.
pub fn plot_options(args: &FigureArgs, plot: &PlotConfig) -> PlotOptions {
    PlotOptions {
        color_by: args.color_by.map_or(plot.color_by, Into::into),
        log_sample_size: plot.log_sample_size && !args.linear,
        model_type: args.model.map_or(plot.model_type, Into::into),
        scope: args.scope.map_or(plot.scope, Into::into),
        color_maps: plot.color_maps.clone(),
    }
}

pub fn run(args: FigureArgs, config: &Config, progress: &ProgressContext) -> Result<()> {
    let options = plot_options(&args, &config.plot);
    let out = args.out.unwrap_or_else(|| config.plot.out.clone());

    let merged = merge::execute(args.merge, config, progress)?;

    let pb = progress.stage_line("figure");
    pb.set_message(format!("{} / {} / {}", options.color_by, options.model_type, options.scope));
    let figure = build_figure(&merged.dataset, &options);
    figure.write(&out)?;
    pb.finish_with_message(out.display().to_string());

    let points: usize = figure.point_traces().map(|t| t.x.len()).sum();
    let table = summary_table(
        "Figure",
        vec![
            ("Points", format!("{points} of {}", merged.dataset.len())),
            ("Groups", figure.point_traces().count().to_string()),
            ("Trendlines", figure.trendlines().count().to_string()),
            ("Colour by", options.color_by.to_string()),
            ("Model", format!("{} ({})", options.model_type, options.scope)),
            ("Output", out.display().to_string()),
        ],
    );
    println!("\n{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use papertrend_plot::{ColorBy, ModelType, Scope};

    fn args() -> FigureArgs {
        FigureArgs {
            merge: merge::MergeArgs {
                studies: None,
                bibliography: None,
                sheet: None,
                output: None,
                memory_limit: None,
            },
            color_by: None,
            linear: false,
            model: None,
            scope: None,
            out: None,
        }
    }

    fn lowess_config() -> PlotConfig {
        PlotConfig {
            color_by: ColorBy::Phenotype,
            model_type: ModelType::Lowess,
            scope: Scope::Trace,
            ..PlotConfig::default()
        }
    }

    #[test]
    fn unset_flags_fall_back_to_config() {
        let options = plot_options(&args(), &lowess_config());
        assert_eq!(options.color_by, ColorBy::Phenotype);
        assert_eq!(options.model_type, ModelType::Lowess);
        assert_eq!(options.scope, Scope::Trace);
        assert!(options.log_sample_size);
    }

    #[test]
    fn flags_override_config() {
        let flags = FigureArgs {
            color_by: Some(ColorByArg::Array),
            model: Some(ModelArg::Ols),
            scope: Some(ScopeArg::Overall),
            ..args()
        };
        let options = plot_options(&flags, &lowess_config());
        assert_eq!(options.color_by, ColorBy::Array);
        assert_eq!(options.model_type, ModelType::Ols);
        assert_eq!(options.scope, Scope::Overall);
    }

    #[test]
    fn linear_flag_turns_off_log_scale() {
        let linear = FigureArgs {
            linear: true,
            ..args()
        };
        assert!(!plot_options(&linear, &PlotConfig::default()).log_sample_size);

        let config = PlotConfig {
            log_sample_size: false,
            ..PlotConfig::default()
        };
        assert!(!plot_options(&args(), &config).log_sample_size);
    }

    #[test]
    fn config_color_maps_are_passed_through() {
        let mut config = PlotConfig::default();
        config
            .color_maps
            .entry("Category".to_string())
            .or_default()
            .insert("Syndrome".to_string(), "#00cc96".to_string());
        let options = plot_options(&args(), &config);
        assert_eq!(options.color_map().map(|m| m.len()), Some(1));
    }
}
