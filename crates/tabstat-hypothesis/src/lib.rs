//! Statistical tests and post-hoc comparisons over tabstat datasets
//!
//! Tests are chosen from a closed catalogue ([`StatTest`]) and dispatched
//! with [`run_test`], which returns a [`TestResult`]: a textual summary and
//! a significance flag (`p < 0.05`, or the deciding model term for the
//! linear-model ANOVAs). Identifiers outside the catalogue parse to
//! [`TestSelection::Unsupported`] and produce a fixed fallback result.
//!
//! After an omnibus test on three or more groups, [`run_post_hoc`] runs one
//! of the [`PostHoc`] procedures and returns its comparison table.
//!
//! # Column conventions
//!
//! | Test | Columns |
//! |---|---|
//! | two-sample tests | `group`, `value` (first two levels in order of appearance) |
//! | one-way ANOVA, Kruskal-Wallis, Friedman | `group`, `value` (all levels, sorted) |
//! | two-way ANOVA | `factor1`, `factor2`, `value` |
//! | ANCOVA | `group`, `covariate`, `value` |
//! | repeated measures ANOVA | `subject`, `time`, `value` |
//! | Spearman | `x`, `y` |
//!
//! # Example
//!
//! ```rust
//! use tabstat_core::{Column, Dataset};
//! use tabstat_hypothesis::{run_test, StatTest, TestSelection};
//!
//! let ds = Dataset::from_columns(vec![
//!     Column::text("group", vec!["A", "A", "A", "B", "B", "B"]),
//!     Column::numeric("value", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
//! ])
//! .unwrap();
//!
//! let result = run_test(&TestSelection::Known(StatTest::IndependentT), &ds).unwrap();
//! assert!(result.significant);
//! assert!(result.summary.starts_with("t統計量: -3.6742"));
//! ```

pub mod correlation;
pub mod dispatch;
pub mod distribution;
pub mod linear_model;
pub mod multi_sample;
pub mod post_hoc;
pub mod repeated;
pub mod selection;
pub mod table;
pub mod traits;
pub mod two_sample;
pub mod types;

pub use dispatch::{run_post_hoc, run_test};
pub use linear_model::{AnovaRow, AnovaTable};
pub use selection::{PostHoc, PostHocSelection, StatTest, TestFamily, TestSelection};
pub use traits::{MultiSampleTest, TwoSampleTest};
pub use types::{TestResult, TestStatistic, POST_HOC_NOT_IMPLEMENTED, TEST_NOT_IMPLEMENTED};
