//! Figure options

use std::collections::BTreeMap;
use std::fmt;

use papertrend_join::MergedRow;
use serde::{Deserialize, Serialize};

/// Column that splits points into coloured traces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorBy {
    #[default]
    Category,
    Array,
    Phenotype,
}

impl ColorBy {
    /// Column label, also the key into the colour-map table.
    pub fn label(self) -> &'static str {
        match self {
            Self::Category => "Category",
            Self::Array => "Array",
            Self::Phenotype => "Phenotype",
        }
    }

    pub fn value(self, row: &MergedRow) -> Option<&str> {
        match self {
            Self::Category => row.category.as_deref(),
            Self::Array => row.array.as_deref(),
            Self::Phenotype => row.phenotype.as_deref(),
        }
    }
}

impl fmt::Display for ColorBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    /// Least squares; on log10(y) when the axis is logged
    #[default]
    Ols,
    /// Locally weighted regression over all points
    Lowess,
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ols => "ols",
            Self::Lowess => "lowess",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// One grey line across every point
    #[default]
    Overall,
    /// One line per coloured group
    Trace,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Overall => "overall",
            Self::Trace => "trace",
        })
    }
}

/// Group value → CSS colour.
pub type ColorMap = BTreeMap<String, String>;

/// Continuous scale named when no colour map is configured.
pub const FALLBACK_SCALE: &str = "Viridis";

#[derive(Debug, Clone, PartialEq)]
pub struct PlotOptions {
    pub color_by: ColorBy,
    pub log_sample_size: bool,
    pub model_type: ModelType,
    pub scope: Scope,
    /// Keyed by [`ColorBy::label`]
    pub color_maps: BTreeMap<String, ColorMap>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            color_by: ColorBy::default(),
            log_sample_size: true,
            model_type: ModelType::default(),
            scope: Scope::default(),
            color_maps: BTreeMap::new(),
        }
    }
}

impl PlotOptions {
    /// Colour map for the active `color_by`, if one is configured.
    pub fn color_map(&self) -> Option<&ColorMap> {
        self.color_maps.get(self.color_by.label())
    }
}
