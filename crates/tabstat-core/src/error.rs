//! Error types for tabular statistical analysis
//!
//! Provides a unified error type for all tabstat crates.

use thiserror::Error;

/// Core error type for dataset and statistical operations
#[derive(Error, Debug)]
pub enum Error {
    /// A column required by the operation is absent
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A column exists but holds the wrong kind of data
    #[error("Type mismatch in column '{column}': expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
    },

    /// The grouping column does not have enough distinct levels
    #[error("Insufficient groups in '{column}': expected at least {expected} levels, got {actual}")]
    InsufficientGroups {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Insufficient data for the requested operation
    #[error("Insufficient data: expected at least {expected} samples, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Distribution construction error from statrs
    #[error("Distribution error: {0}")]
    Distribution(#[from] statrs::StatsError),

    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error for empty input
    pub fn empty_input(_operation: &str) -> Self {
        Self::InsufficientData {
            expected: 1,
            actual: 0,
        }
    }

    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Create an error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::Computation(format!("{context} contains NaN or infinite values"))
    }

    /// Create an error for a numeric column that holds text
    pub fn not_numeric(column: &str) -> Self {
        Self::TypeMismatch {
            column: column.to_string(),
            expected: "numeric",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingColumn("group".to_string());
        assert_eq!(err.to_string(), "Missing column: group");

        let err = Error::not_numeric("value");
        assert_eq!(
            err.to_string(),
            "Type mismatch in column 'value': expected numeric"
        );

        let err = Error::InsufficientGroups {
            column: "group".to_string(),
            expected: 2,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient groups in 'group': expected at least 2 levels, got 1"
        );

        let err = Error::InsufficientData { expected: 3, actual: 1 };
        assert_eq!(
            err.to_string(),
            "Insufficient data: expected at least 3 samples, got 1"
        );
    }

    #[test]
    fn test_error_helper_functions() {
        match Error::empty_input("t-test") {
            Error::InsufficientData { expected, actual } => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 0);
            }
            other => panic!("Wrong error type: {other:?}"),
        }

        let err = Error::size_mismatch(4, 3, "paired samples");
        assert_eq!(
            err.to_string(),
            "Invalid input: Size mismatch in paired samples: expected 4, got 3"
        );

        let err = Error::non_finite("value column");
        assert_eq!(
            err.to_string(),
            "Computation error: value column contains NaN or infinite values"
        );
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_stats_error() {
        let stats_err = statrs::distribution::StudentsT::new(0.0, 1.0, -1.0).unwrap_err();
        let err: Error = stats_err.into();
        assert!(matches!(err, Error::Distribution(_)));
    }
}
