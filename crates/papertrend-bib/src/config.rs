//! Bibliography pipeline configuration

use std::path::PathBuf;

use crate::date::DateDefaults;
use crate::extract::{Prefix, default_prefixes};

/// Runtime configuration for parsing one export
#[derive(Debug, Clone)]
pub struct Config {
    /// Tagged-text export to read
    pub input: PathBuf,
    /// Output directory for parquet files
    pub output_dir: PathBuf,
    /// Zstd compression level for parquet output
    pub zstd_level: i32,
    /// Fill-in values for partial dates
    pub dates: DateDefaults,
    /// Ordered label → field table
    pub prefixes: Vec<Prefix>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("bibliography.txt"),
            output_dir: PathBuf::from("output"),
            zstd_level: 3,
            dates: DateDefaults::default(),
            prefixes: default_prefixes(),
        }
    }
}
