//! Configuration loading from TOML files

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use papertrend_join::CategoryRule;
use papertrend_plot::{ColorBy, ColorMap, ModelType, Scope};
use serde::Deserialize;

/// Global configuration for papertrend
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub dates: DatesConfig,
    pub merge: MergeConfig,
    pub plot: PlotConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub studies: Option<PathBuf>,
    pub bibliography: Option<PathBuf>,
    pub sheet: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            studies: None,
            bibliography: None,
            sheet: papertrend_join::DEFAULT_SHEET.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub default_dir: PathBuf,
    pub compression_level: i32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_dir: PathBuf::from("./output"),
            compression_level: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatesConfig {
    /// Day of month for month-only dates
    pub month_only_day: u32,
    /// Year source for dates without one; today when unset
    pub reference_date: Option<NaiveDate>,
}

impl Default for DatesConfig {
    fn default() -> Self {
        Self {
            month_only_day: papertrend_bib::date::DEFAULT_MONTH_ONLY_DAY,
            reference_date: None,
        }
    }
}

impl DatesConfig {
    pub fn defaults(&self) -> papertrend_bib::DateDefaults {
        let mut defaults = match self.reference_date {
            Some(date) => papertrend_bib::DateDefaults::with_reference(date),
            None => papertrend_bib::DateDefaults::default(),
        };
        defaults.month_only_day = self.month_only_day;
        defaults
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRuleConfig {
    pub pattern: String,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub memory_limit: String,
    pub multiple_sentinel: String,
    pub category_rules: Vec<CategoryRuleConfig>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            memory_limit: "1GB".to_string(),
            multiple_sentinel: papertrend_join::MULTIPLE_SENTINEL.to_string(),
            category_rules: papertrend_join::default_category_rules()
                .into_iter()
                .map(|r| CategoryRuleConfig {
                    pattern: r.pattern,
                    category: r.category,
                })
                .collect(),
        }
    }
}

impl MergeConfig {
    pub fn rules(&self) -> Vec<CategoryRule> {
        self.category_rules
            .iter()
            .map(|r| CategoryRule::new(r.pattern.clone(), r.category.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub color_by: ColorBy,
    pub log_sample_size: bool,
    pub model_type: ModelType,
    pub scope: Scope,
    pub out: PathBuf,
    /// `[plot.color_maps.Category]` tables: group value → colour
    pub color_maps: BTreeMap<String, ColorMap>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            color_by: ColorBy::default(),
            log_sample_size: true,
            model_type: ModelType::default(),
            scope: Scope::default(),
            out: PathBuf::from("figure.json"),
            color_maps: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./papertrend.toml (current directory)
    /// 2. ~/.config/papertrend/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("papertrend.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "papertrend") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject values that would silently null out results.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (1..=31).contains(&self.dates.month_only_day),
            "[dates] month_only_day must be within 1..=31, got {}",
            self.dates.month_only_day
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.output.default_dir, PathBuf::from("./output"));
        assert_eq!(config.output.compression_level, 3);
        assert_eq!(config.input.sheet, "Read");
        assert_eq!(config.dates.month_only_day, 14);
        assert_eq!(config.merge.category_rules.len(), 2);
        assert!(config.plot.log_sample_size);
    }

    #[test]
    fn parse_config_toml() {
        let toml = r##"
[input]
studies = "papers.xlsx"
sheet = "Included"

[output]
default_dir = "/tmp/data"
compression_level = 5

[dates]
month_only_day = 1
reference_date = "2024-07-13"

[merge]
memory_limit = "512MB"
category_rules = [
    { pattern = "Coffin-Siris", category = "Syndrome" },
]

[plot]
color_by = "array"
model_type = "lowess"
scope = "trace"
log_sample_size = false

[plot.color_maps.Array]
EPIC = "#636efa"
"450K" = "#ef553b"
"##;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.input.studies, Some(PathBuf::from("papers.xlsx")));
        assert_eq!(config.input.sheet, "Included");
        assert_eq!(config.output.compression_level, 5);
        assert_eq!(config.dates.reference_date, NaiveDate::from_ymd_opt(2024, 7, 13));
        assert_eq!(config.merge.memory_limit, "512MB");
        assert_eq!(config.merge.rules(), vec![CategoryRule::new("Coffin-Siris", "Syndrome")]);
        assert_eq!(config.merge.multiple_sentinel, "Multiple");
        assert_eq!(config.plot.color_by, ColorBy::Array);
        assert_eq!(config.plot.model_type, ModelType::Lowess);
        assert_eq!(config.plot.scope, Scope::Trace);
        assert!(!config.plot.log_sample_size);
        assert_eq!(config.plot.color_maps["Array"]["450K"], "#ef553b");
    }

    #[test]
    fn date_defaults_follow_config() {
        let dates = DatesConfig {
            month_only_day: 1,
            reference_date: NaiveDate::from_ymd_opt(2000, 5, 5),
        };
        let defaults = dates.defaults();
        assert_eq!(defaults.month_only_day, 1);
        assert_eq!(defaults.reference, NaiveDate::from_ymd_opt(2000, 5, 5).unwrap());
    }

    #[test]
    fn month_only_day_out_of_range_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("papertrend.toml");
        for day in [0, 32] {
            std::fs::write(&path, format!("[dates]\nmonth_only_day = {day}\n")).unwrap();
            let err = Config::from_file(&path).unwrap_err();
            assert!(format!("{err:#}").contains("month_only_day"));
        }

        std::fs::write(&path, "[dates]\nmonth_only_day = 31\n").unwrap();
        assert_eq!(Config::from_file(&path).unwrap().dates.month_only_day, 31);
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn from_file_reports_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("papertrend.toml");
        std::fs::write(&path, "[output\n").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("papertrend.toml"));
    }
}
