//! Advanced analysis routines for tabular datasets
//!
//! Each method reads the numeric columns of a [`Dataset`] (the `group`
//! column is treated as a label, never as a feature), drops incomplete rows
//! and returns an [`AnalysisOutput`]: a text summary plus a dataset laid out
//! with the conventional column names so the graph recipes can plot it.
//!
//! | Method | Output columns |
//! |--------|----------------|
//! | PCA | `x` = PC1, `y` = PC2, `group` when present |
//! | k-means | features, `group` = cluster index |
//! | linear regression | `x` = observed, `y` = predicted, `residual` |
//! | logistic regression, SVM, random forest, naive Bayes | features, `group`, `predicted` |
//!
//! [`AnalysisPool`] runs analyses on a fixed number of worker threads and
//! reports each result through a completion callback.
//!
//! # Example
//!
//! ```rust
//! use tabstat_analysis::{run_analysis, AnalysisMethod};
//! use tabstat_core::{Column, Dataset};
//!
//! let ds = Dataset::from_columns(vec![
//!     Column::numeric("x", vec![1.0, 2.0, 3.0, 4.0]),
//!     Column::numeric("y", vec![2.0, 4.1, 5.9, 8.0]),
//! ])
//! .unwrap();
//!
//! let output = run_analysis(AnalysisMethod::LinearRegression, &ds).unwrap();
//! assert_eq!(output.data.n_rows(), 4);
//! ```

pub mod classify;
pub mod features;
pub mod forest;
pub mod kmeans;
pub mod logistic;
pub mod method;
pub mod naive_bayes;
pub mod pca;
pub mod pool;
pub mod regression;
pub mod svm;
pub mod types;

pub use forest::ForestParams;
pub use kmeans::KMeansParams;
pub use logistic::LogisticParams;
pub use svm::SvmParams;
pub use method::{AnalysisMethod, ANALYSIS_NOT_IMPLEMENTED};
pub use pool::{AnalysisPool, DEFAULT_WORKERS};
pub use types::AnalysisOutput;

use tabstat_core::{Dataset, Result};

/// Run one analysis synchronously with default parameters
pub fn run_analysis(method: AnalysisMethod, data: &Dataset) -> Result<AnalysisOutput> {
    let (summary, data) = match method {
        AnalysisMethod::Pca => pca::analyze(data)?,
        AnalysisMethod::KMeans => kmeans::analyze(data, &KMeansParams::default())?,
        AnalysisMethod::LinearRegression => regression::analyze(data)?,
        AnalysisMethod::LogisticRegression => logistic::analyze(data, &LogisticParams::default())?,
        AnalysisMethod::Svm => svm::analyze(data, &SvmParams::default())?,
        AnalysisMethod::RandomForest => forest::analyze(data, &ForestParams::default())?,
        AnalysisMethod::NaiveBayes => naive_bayes::analyze(data)?,
    };
    Ok(AnalysisOutput {
        method,
        summary,
        data,
    })
}
