use std::path::PathBuf;

/// Phenotype substring → category overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    /// Matched literally against `phenotype`
    pub pattern: String,
    pub category: String,
}

impl CategoryRule {
    pub fn new(pattern: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            category: category.into(),
        }
    }
}

/// Corrections applied after the join, in order.
pub fn default_category_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new("BAFopathy syndrome: Coffin-Siris", "Syndrome"),
        CategoryRule::new("Intellectual developmental disorder, X-linked", "Psychiatric"),
    ]
}

/// `Array` value that defers to `Multiple_array`.
pub const MULTIPLE_SENTINEL: &str = "Multiple";

/// Default worksheet holding the curated studies.
pub const DEFAULT_SHEET: &str = "Read";

/// Configuration for the merge pipeline.
#[derive(Debug, Clone)]
pub struct JoinConfig {
    /// Curated study sheet (.xlsx, .xlsm, .xls, .ods or .csv)
    pub studies: PathBuf,
    /// Worksheet name; ignored for CSV
    pub sheet: String,
    /// Output directory for staged and merged parquet files
    pub output_dir: PathBuf,
    /// Zstd compression level for the staged tables
    pub zstd_level: i32,
    /// DuckDB memory limit (e.g. "1GB")
    pub memory_limit: String,
    pub category_rules: Vec<CategoryRule>,
    pub multiple_sentinel: String,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            studies: PathBuf::from("studies.xlsx"),
            sheet: DEFAULT_SHEET.to_string(),
            output_dir: PathBuf::from("output"),
            zstd_level: 3,
            memory_limit: "1GB".to_string(),
            category_rules: default_category_rules(),
            multiple_sentinel: MULTIPLE_SENTINEL.to_string(),
        }
    }
}
