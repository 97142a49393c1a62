//! Core types for tabular statistical analysis
//!
//! This crate provides the data model shared by every tabstat crate:
//!
//! - [`Dataset`]: an ordered table of numeric and text columns with missing cells
//! - [`Level`]: a hashable, ordered categorical value read from grouping columns
//! - [`Error`] / [`Result`]: the unified error type
//! - [`describe`]: small descriptive helpers (means, quantiles, ranks, ties)
//!
//! # Example
//!
//! ```rust
//! use tabstat_core::{columns, Column, Dataset};
//!
//! let ds = Dataset::from_columns(vec![
//!     Column::text(columns::GROUP, vec!["A", "A", "B", "B"]),
//!     Column::numeric(columns::VALUE, vec![1.0, 2.0, 3.0, 4.0]),
//! ])
//! .unwrap();
//!
//! let levels = ds.distinct_levels(columns::GROUP).unwrap();
//! assert_eq!(levels.len(), 2);
//! ```

pub mod columns;
pub mod dataset;
pub mod describe;
pub mod error;

pub use dataset::{Cell, Column, ColumnData, Dataset, Level};
pub use error::{Error, Result};

/// Significance threshold used for every test decision
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;
