//! Papertrend Bib - reference-manager export parsing
//!
//! Reads the EndNote-style "tagged text" export, one `Label: value` line
//! at a time, into index-keyed records, and reconciles the free-text `Date`
//! and `Year` fields into a single `Date2`.
//!
//! # Example
//!
//! ```ignore
//! use papertrend_bib::{Config, load};
//!
//! let config = Config {
//!     input: "refs.txt".into(),
//!     ..Default::default()
//! };
//!
//! let bib = load(&config)?;
//! println!("{} records", bib.records.len());
//! ```

pub mod config;
pub mod date;
pub mod error;
pub mod extract;
pub mod parser;
pub mod reconcile;
pub mod record;
pub mod runner;
pub mod schema;
pub mod transform;

// Re-exports
pub use config::Config;
pub use date::{DateDefaults, is_date, parse_date};
pub use error::DateParseError;
pub use extract::{Prefix, default_prefixes, extract_info};
pub use parser::{ParseSummary, parse_bibliography, parse_file, parse_reader};
pub use reconcile::{ReconcileSummary, reconcile};
pub use record::{BibRecord, Field, RecordBuffer};
pub use runner::{Bibliography, Summary, load, run};
