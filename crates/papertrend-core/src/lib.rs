//! Papertrend Core - Shared infrastructure for the study dataset pipeline
//!
//! Logging, progress display and the Parquet output sink used by the
//! bibliography, join and CLI crates.

pub mod logging;
pub mod progress;
pub mod sink;

// Re-exports for convenience
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, fmt_num};
pub use sink::{ParquetSink, cleanup_tmp_files, is_valid_parquet, write_table};
