//! Error types for tabstat-io

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Data error: {0}")]
    Core(#[from] tabstat_core::Error),

    #[error("Graph error: {0}")]
    Viz(#[from] tabstat_viz::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("XLSX write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[cfg(feature = "polars")]
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Unsupported JSON shape: {0}")]
    UnsupportedJson(String),

    /// Export or report requested before anything was produced
    #[error("{0}")]
    NothingToExport(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
