//! Analysis results

use crate::method::AnalysisMethod;
use tabstat_core::Dataset;

/// Output of one analysis run
///
/// `data` uses the conventional column names so it can be plotted directly.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutput {
    pub method: AnalysisMethod,
    pub summary: String,
    pub data: Dataset,
}
