//! Result types shared by the test kernels and dispatchers

use serde::Serialize;
use tabstat_core::SIGNIFICANCE_LEVEL;

/// Summary returned for a test selection without an implementation
pub const TEST_NOT_IMPLEMENTED: &str = "選択された検定はまだ実装されていません。";

/// Summary returned for a post-hoc selection without an implementation
pub const POST_HOC_NOT_IMPLEMENTED: &str = "選択されたPost Hoc検定はまだ実装されていません。";

/// Test statistic with its p-value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestStatistic {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestStatistic {
    pub fn new(statistic: f64, p_value: f64) -> Self {
        Self { statistic, p_value }
    }

    /// `p < 0.05`
    pub fn is_significant(&self) -> bool {
        self.p_value < SIGNIFICANCE_LEVEL
    }
}

/// Outcome of one test dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResult {
    /// Human-readable summary, as shown to the user
    pub summary: String,
    /// Whether the test's deciding p-value is below 0.05
    pub significant: bool,
}

impl TestResult {
    pub fn new(summary: impl Into<String>, significant: bool) -> Self {
        Self {
            summary: summary.into(),
            significant,
        }
    }

    /// Fallback result for unimplemented selections
    pub fn not_implemented() -> Self {
        Self::new(TEST_NOT_IMPLEMENTED, false)
    }
}
