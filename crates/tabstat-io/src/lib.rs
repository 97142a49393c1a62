//! Import, export and report boundaries for tabstat
//!
//! - [`import`]: CSV and other delimited text, clipboard text, JSON files
//!   and HTTP endpoints, SQLite tables and spreadsheets; all normalized
//!   into a [`Dataset`]
//! - [`export`]: result tables to CSV or XLSX, figures to SVG or PNG
//! - [`report`]: a paginated HTML report of the latest result and figure
//!
//! With the `polars` feature, [`polars`](crate::polars) converts between
//! data frames and datasets.
//!
//! [`Dataset`]: tabstat_core::Dataset

pub mod error;
pub mod export;
pub mod import;
#[cfg(feature = "polars")]
pub mod polars;
pub mod report;

pub use error::{Error, Result};
pub use export::ResultsExporter;
pub use import::{
    dataset_from_json, fetch_json, read_clipboard_text, read_csv, read_delimited,
    read_delimited_from, read_json, read_sqlite, read_xlsx, DelimitedOptions,
};
pub use report::{ReportGenerator, ReportOptions};
