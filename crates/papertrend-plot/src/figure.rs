//! Scatter figure description
//!
//! Field names follow the plotly.js figure schema so the JSON can be handed
//! to any plotly renderer as is.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use papertrend_join::MergedDataset;
use serde::Serialize;
use textwrap::{Options, WrapAlgorithm};

use crate::options::{FALLBACK_SCALE, ModelType, PlotOptions, Scope};
use crate::trend::{LOWESS_FRAC, LOWESS_ITERATIONS, lowess, ols};

pub const TITLE: &str = "Sample size over time";
pub const WIDTH: u32 = 1300;
pub const HEIGHT: u32 = 400;
pub const BACKGROUND: &str = "whitesmoke";
pub const MARKER_SIZE: u32 = 10;
pub const MARKER_OPACITY: f64 = 0.5;
pub const OVERALL_LINE_COLOR: &str = "grey";
pub const HOVER_WIDTH: usize = 80;
/// Group name for rows whose colour column is empty.
pub const MISSING_GROUP: &str = "NA";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub text: String,
}

impl Text {
    fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub size: u32,
    pub opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// `markers` for data, `lines` for trendlines
    pub mode: &'static str,
    pub name: String,
    pub legendgroup: String,
    pub showlegend: bool,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hovertext: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub customdata: Vec<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
}

impl Trace {
    pub fn is_trendline(&self) -> bool {
        self.mode == "lines"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: Text,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    pub mirror: bool,
    pub ticks: &'static str,
    pub showline: bool,
    pub linecolor: &'static str,
    pub gridcolor: &'static str,
}

impl Axis {
    fn styled(title: String, kind: Option<&'static str>) -> Self {
        Self {
            title: Text::new(title),
            kind,
            mirror: true,
            ticks: "outside",
            showline: true,
            linecolor: "black",
            gridcolor: "lightgrey",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    pub l: u32,
    pub r: u32,
    pub t: u32,
    pub b: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScale {
    pub sequential: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Text,
    pub width: u32,
    pub height: u32,
    pub plot_bgcolor: &'static str,
    pub margin: Margin,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub legend: Legend,
    /// Named scale used when no colour map is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<ColorScale>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: Text,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn point_traces(&self) -> impl Iterator<Item = &Trace> {
        self.data.iter().filter(|t| !t.is_trendline())
    }

    pub fn trendlines(&self) -> impl Iterator<Item = &Trace> {
        self.data.iter().filter(|t| t.is_trendline())
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = self.to_json(true).context("Failed to serialize figure")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write figure: {}", path.display()))
    }
}

/// Greedy word wrap joined with `<br>`.
///
/// Lines may break after a hyphen; words longer than `width` are split.
pub fn wrap_title(text: &str, width: usize) -> String {
    let options = Options::new(width.max(1)).wrap_algorithm(WrapAlgorithm::FirstFit);
    textwrap::wrap(text, options).join("<br>")
}

#[derive(Debug, Clone)]
struct Point {
    date: NaiveDate,
    size: f64,
    hover: String,
    phenotype: Option<String>,
}

impl Point {
    fn x(&self) -> f64 {
        f64::from(self.date.num_days_from_ce())
    }
}

fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Fitted line through `points`, evaluated at their sorted dates.
fn fit_trend(points: &[&Point], options: &PlotOptions) -> Option<(Vec<String>, Vec<f64>)> {
    let mut sorted: Vec<&Point> = points.to_vec();
    sorted.sort_by_key(|p| p.date);

    match options.model_type {
        ModelType::Ols => {
            if options.log_sample_size {
                sorted.retain(|p| p.size > 0.0);
            }
            let xs: Vec<f64> = sorted.iter().map(|p| p.x()).collect();
            let ys: Vec<f64> = sorted
                .iter()
                .map(|p| {
                    if options.log_sample_size {
                        p.size.log10()
                    } else {
                        p.size
                    }
                })
                .collect();
            let fit = ols(&xs, &ys)?;
            let fitted = xs
                .iter()
                .map(|&x| {
                    let y = fit.predict(x);
                    if options.log_sample_size { 10f64.powf(y) } else { y }
                })
                .collect();
            Some((sorted.iter().map(|p| fmt_date(p.date)).collect(), fitted))
        }
        ModelType::Lowess => {
            if sorted.is_empty() {
                return None;
            }
            let xs: Vec<f64> = sorted.iter().map(|p| p.x()).collect();
            let ys: Vec<f64> = sorted.iter().map(|p| p.size).collect();
            let fitted = lowess(&xs, &ys, LOWESS_FRAC, LOWESS_ITERATIONS);
            Some((
                sorted.iter().map(|p| fmt_date(p.date)).collect(),
                fitted.into_iter().map(|(_, y)| y).collect(),
            ))
        }
    }
}

fn trendline(
    name: String,
    group: String,
    color: Option<String>,
    x: Vec<String>,
    y: Vec<f64>,
    showlegend: bool,
) -> Trace {
    Trace {
        kind: "scatter",
        mode: "lines",
        name,
        legendgroup: group,
        showlegend,
        x,
        y,
        hovertext: Vec::new(),
        customdata: Vec::new(),
        hovertemplate: None,
        marker: None,
        line: Some(Line { color }),
    }
}

/// Build the sample-size-over-time scatter with trendlines.
pub fn build_figure(dataset: &MergedDataset, options: &PlotOptions) -> Figure {
    let label = options.color_by.label();

    let mut groups: Vec<(String, Vec<Point>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0usize;

    for row in dataset.iter() {
        let (Some(date), Some(size)) = (row.date, row.sample_size) else {
            skipped += 1;
            continue;
        };
        let key = options
            .color_by
            .value(row)
            .unwrap_or(MISSING_GROUP)
            .to_string();
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(Point {
            date,
            size,
            hover: wrap_title(row.title.as_deref().unwrap_or_default(), HOVER_WIDTH),
            phenotype: row.phenotype.clone(),
        });
    }
    if skipped > 0 {
        log::debug!("{skipped} rows without date or sample size left off the figure");
    }

    let color_map = options.color_map();
    let color_of = |group: &str| color_map.and_then(|m| m.get(group).cloned());
    if let Some(map) = color_map {
        for (group, _) in &groups {
            if !map.contains_key(group) {
                log::warn!("No colour for {label} {group:?}");
            }
        }
    }

    let hovertemplate = format!(
        "<b>%{{hovertext}}</b><br><br>{label}=%{{fullData.name}}<br>Date=%{{x}}<br>\
         Sample size=%{{y}}<br>Phenotype=%{{customdata}}<extra></extra>"
    );

    let mut data: Vec<Trace> = groups
        .iter()
        .map(|(group, points)| Trace {
            kind: "scatter",
            mode: "markers",
            name: group.clone(),
            legendgroup: group.clone(),
            showlegend: true,
            x: points.iter().map(|p| fmt_date(p.date)).collect(),
            y: points.iter().map(|p| p.size).collect(),
            hovertext: points.iter().map(|p| p.hover.clone()).collect(),
            customdata: points.iter().map(|p| p.phenotype.clone()).collect(),
            hovertemplate: Some(hovertemplate.clone()),
            marker: Some(Marker {
                size: MARKER_SIZE,
                opacity: MARKER_OPACITY,
                color: color_of(group.as_str()),
            }),
            line: None,
        })
        .collect();

    match options.scope {
        Scope::Overall => {
            let all: Vec<&Point> = groups.iter().flat_map(|(_, p)| p).collect();
            match fit_trend(&all, options) {
                Some((x, y)) => data.push(trendline(
                    "Overall Trendline".to_string(),
                    "Overall Trendline".to_string(),
                    Some(OVERALL_LINE_COLOR.to_string()),
                    x,
                    y,
                    true,
                )),
                None => log::debug!("Too few points for an overall {} trendline", options.model_type),
            }
        }
        Scope::Trace => {
            for (group, points) in &groups {
                let refs: Vec<&Point> = points.iter().collect();
                match fit_trend(&refs, options) {
                    Some((x, y)) => data.push(trendline(
                        group.clone(),
                        group.clone(),
                        color_of(group.as_str()),
                        x,
                        y,
                        false,
                    )),
                    None => log::debug!("Too few points for a {group:?} trendline"),
                }
            }
        }
    }

    let y_note = if options.log_sample_size { " (log scale)" } else { "" };
    let layout = Layout {
        title: Text::new(TITLE),
        width: WIDTH,
        height: HEIGHT,
        plot_bgcolor: BACKGROUND,
        margin: Margin {
            l: 10,
            r: 10,
            t: 25,
            b: 10,
        },
        xaxis: Axis::styled("Publication date".to_string(), Some("date")),
        yaxis: Axis::styled(
            format!("<b>Sample size</b>{y_note}"),
            options.log_sample_size.then_some("log"),
        ),
        legend: Legend {
            title: Text::new(label),
        },
        colorscale: color_map.is_none().then(|| ColorScale {
            sequential: FALLBACK_SCALE.to_string(),
        }),
    };

    Figure { data, layout }
}
