//! Traits implemented by the test kernels

use crate::types::TestStatistic;
use tabstat_core::Result;

/// A test comparing two samples
pub trait TwoSampleTest {
    /// Label used in summaries, e.g. `t統計量`
    fn statistic_label(&self) -> &'static str;

    /// Compute the statistic and two-sided p-value
    fn test(&self, first: &[f64], second: &[f64]) -> Result<TestStatistic>;

    /// Samples are matched observations, compared position by position
    fn is_paired(&self) -> bool {
        false
    }
}

/// An omnibus test over two or more samples
pub trait MultiSampleTest {
    /// Label used in summaries, e.g. `F値`
    fn statistic_label(&self) -> &'static str;

    /// Compute the statistic and p-value, groups in level order
    fn test(&self, groups: &[Vec<f64>]) -> Result<TestStatistic>;

    /// Position `i` of every group belongs to the same block
    fn is_blocked(&self) -> bool {
        false
    }
}
