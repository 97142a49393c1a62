//! Error types for tabstat-viz

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Data error: {0}")]
    Core(#[from] tabstat_core::Error),

    #[error("Invalid customization '{field}': {value}")]
    InvalidCustomization { field: &'static str, value: String },

    #[error("Drawing failed: {0}")]
    Draw(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("No figure has been rendered")]
    NoFigure,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
