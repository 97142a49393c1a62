//! Ordered preprocessing of a loaded dataset
//!
//! [`preprocess`] applies the five steps of a [`PreprocessingConfig`] in a
//! fixed order:
//!
//! 1. outlier removal
//! 2. normalization
//! 3. missing value handling
//! 4. categorical encoding
//! 5. value transform
//!
//! Each step reads the previous step's output. Steps set to "none" pass the
//! data through unchanged, so the empty config is the identity.
//!
//! # Example
//!
//! ```rust
//! use tabstat_core::{Column, Dataset};
//! use tabstat_preprocess::{preprocess, Normalization, PreprocessingConfig};
//!
//! let ds = Dataset::from_columns(vec![Column::numeric("value", vec![1.0, 2.0, 3.0])]).unwrap();
//! let config = PreprocessingConfig::new().with_normalization(Normalization::MinMax);
//! let out = preprocess(&ds, &config).unwrap();
//! assert_eq!(out.numeric_values("value").unwrap(), vec![0.0, 0.5, 1.0]);
//! ```

pub mod config;
pub mod encoding;
pub mod impute;
pub mod outliers;
pub mod scaling;

pub use config::{
    Encoding, MethodChoice, MissingValues, Normalization, OutlierMethod, PreprocessingConfig,
    Transform, DEFAULT_OUTLIER_THRESHOLD,
};

use tabstat_core::{Dataset, Result};

/// Run every configured step in order and return the new dataset
pub fn preprocess(data: &Dataset, config: &PreprocessingConfig) -> Result<Dataset> {
    config.validate()?;
    if config.is_noop() {
        return Ok(data.clone());
    }

    let rows_in = data.n_rows();
    let out = outliers::remove_outliers(data, config.outliers, config.effective_threshold())?;
    let out = scaling::normalize(&out, config.normalization)?;
    let out = impute::handle_missing(&out, config.missing)?;
    let out = encoding::encode(&out, config.encoding)?;
    let out = scaling::transform(&out, config.transform)?;

    tracing::info!(
        rows_in,
        rows_out = out.n_rows(),
        columns = out.n_columns(),
        "preprocessing complete"
    );
    Ok(out)
}
