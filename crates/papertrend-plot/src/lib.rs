//! papertrend-plot: sample size over time
//!
//! Turns a merged dataset into a plotly-compatible figure description with
//! OLS or LOWESS trendlines. Nothing is rendered here; the output is JSON.

pub mod figure;
pub mod options;
pub mod trend;

pub use figure::{Figure, Trace, build_figure, wrap_title};
pub use options::{ColorBy, ColorMap, ModelType, PlotOptions, Scope};
