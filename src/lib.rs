//! Exploratory statistics over tabular data
//!
//! This crate re-exports the tabstat workspace:
//!
//! - [`core`]: the [`Dataset`] model and shared error type
//! - [`preprocess`]: outlier removal, normalization, imputation, encoding, transforms
//! - [`hypothesis`]: the test and post-hoc catalogues and their dispatchers
//! - [`viz`]: graph recipes, customization and SVG/PNG drawing
//! - [`io`]: import, export and HTML reports
//! - [`analysis`]: PCA, k-means, linear regression and the group classifiers on a worker pool
//! - [`pipeline`]: the session that ties the stages together
//!
//! # Example
//!
//! ```rust
//! use tabstat::prelude::*;
//!
//! let ds = Dataset::from_columns(vec![
//!     Column::text("group", vec!["A", "A", "A", "B", "B", "B"]),
//!     Column::numeric("value", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
//! ])
//! .unwrap();
//!
//! let result = run_test(&StatTest::IndependentT.into(), &ds).unwrap();
//! assert!(result.significant);
//! ```

pub use tabstat_analysis as analysis;
pub use tabstat_core as core;
pub use tabstat_hypothesis as hypothesis;
pub use tabstat_io as io;
pub use tabstat_pipeline as pipeline;
pub use tabstat_preprocess as preprocess;
pub use tabstat_viz as viz;

pub use tabstat_core::{columns, Column, Dataset, Error, Level, Result};

/// Commonly used types
pub mod prelude {
    pub use tabstat_analysis::{run_analysis, AnalysisMethod, AnalysisPool};
    pub use tabstat_core::{columns, Column, Dataset, Level};
    pub use tabstat_hypothesis::{
        run_post_hoc, run_test, PostHoc, PostHocSelection, StatTest, TestResult, TestSelection,
    };
    pub use tabstat_io::{ReportOptions, ResultsExporter, ReportGenerator};
    pub use tabstat_pipeline::{AnalysisSession, SessionConfig, SettingsStore};
    pub use tabstat_preprocess::{preprocess, PreprocessingConfig};
    pub use tabstat_viz::{GraphCanvas, GraphCustomization, GraphSelection, GraphType};
}
