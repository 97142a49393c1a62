//! Selection to computation dispatch
//!
//! [`run_test`] and [`run_post_hoc`] are total over their selections: known
//! variants run their computation, unsupported identifiers return the fixed
//! fallback summary. Failures of the computation itself (missing columns,
//! too few groups, degenerate data) are returned as errors for the caller's
//! stage boundary to report.

use crate::correlation::spearman;
use crate::linear_model::{ancova, two_way_anova, ANCOVA_GROUP_TERM};
use crate::multi_sample::{Friedman, KruskalWallis, OneWayAnova};
use crate::post_hoc::{corrected_t_tests, games_howell, scheffe, tukey_hsd, Correction};
use crate::repeated::repeated_measures_anova;
use crate::selection::{PostHoc, PostHocSelection, StatTest, TestSelection};
use crate::traits::{MultiSampleTest, TwoSampleTest};
use crate::two_sample::{IndependentT, MannWhitneyU, PairedT, WilcoxonSignedRank};
use crate::types::{TestResult, TestStatistic, POST_HOC_NOT_IMPLEMENTED};
use tabstat_core::{columns, Dataset, Error, Level, Result};

fn summary(label: &str, stat: &TestStatistic) -> String {
    format!("{label}: {:.4}\np値: {:.4}", stat.statistic, stat.p_value)
}

fn require_levels(levels: &[Level]) -> Result<()> {
    if levels.len() < 2 {
        return Err(Error::InsufficientGroups {
            column: columns::GROUP.to_string(),
            expected: 2,
            actual: levels.len(),
        });
    }
    Ok(())
}

/// First two `group` levels in discovery order
///
/// Further levels are ignored.
fn first_two_levels(data: &Dataset) -> Result<Vec<Level>> {
    let mut levels = data.distinct_levels(columns::GROUP)?;
    require_levels(&levels)?;
    if levels.len() > 2 {
        tracing::debug!(levels = levels.len(), "comparing only the first two groups");
        levels.truncate(2);
    }
    Ok(levels)
}

/// Observed values of the first two `group` levels in discovery order
pub fn first_two_groups(data: &Dataset) -> Result<(Vec<f64>, Vec<f64>)> {
    let levels = first_two_levels(data)?;
    let first = data.group_values(columns::GROUP, columns::VALUE, &levels[0])?;
    let second = data.group_values(columns::GROUP, columns::VALUE, &levels[1])?;
    Ok((first, second))
}

/// Values of every `group` level in sorted order
pub fn sorted_groups(data: &Dataset) -> Result<Vec<(Level, Vec<f64>)>> {
    let levels = data.sorted_levels(columns::GROUP)?;
    require_levels(&levels)?;
    data.partition(columns::GROUP, columns::VALUE, &levels)
}

/// `value` cells of `levels`, matched by position within each group
///
/// Every group must have the same number of rows. A position is dropped
/// when any group is missing its cell there, so the remaining values stay
/// aligned.
pub fn aligned_groups(data: &Dataset, levels: &[Level]) -> Result<Vec<Vec<f64>>> {
    let cells = levels
        .iter()
        .map(|level| data.group_cells(columns::GROUP, columns::VALUE, level))
        .collect::<Result<Vec<_>>>()?;
    let len = cells.first().map_or(0, Vec::len);
    if let Some(other) = cells.iter().find(|c| c.len() != len) {
        return Err(Error::size_mismatch(len, other.len(), "matched groups"));
    }
    let complete: Vec<usize> = (0..len)
        .filter(|&i| cells.iter().all(|c| c[i].is_some()))
        .collect();
    if complete.len() < len {
        tracing::debug!(dropped = len - complete.len(), "dropping incomplete matched positions");
    }
    Ok(cells
        .iter()
        .map(|c| complete.iter().filter_map(|&i| c[i]).collect())
        .collect())
}

fn two_sample(test: &impl TwoSampleTest, data: &Dataset) -> Result<TestResult> {
    let (first, second) = if test.is_paired() {
        let mut pairs = aligned_groups(data, &first_two_levels(data)?)?.into_iter();
        let first = pairs.next().unwrap_or_default();
        let second = pairs.next().unwrap_or_default();
        (first, second)
    } else {
        first_two_groups(data)?
    };
    let stat = test.test(&first, &second)?;
    Ok(TestResult::new(
        summary(test.statistic_label(), &stat),
        stat.is_significant(),
    ))
}

fn multi_sample(test: &impl MultiSampleTest, data: &Dataset) -> Result<TestResult> {
    let samples: Vec<Vec<f64>> = if test.is_blocked() {
        let levels = data.sorted_levels(columns::GROUP)?;
        require_levels(&levels)?;
        aligned_groups(data, &levels)?
    } else {
        sorted_groups(data)?.into_iter().map(|(_, v)| v).collect()
    };
    let stat = test.test(&samples)?;
    Ok(TestResult::new(
        summary(test.statistic_label(), &stat),
        stat.is_significant(),
    ))
}

/// Paired `x`/`y` rows where both are observed
fn paired_xy(data: &Dataset) -> Result<(Vec<f64>, Vec<f64>)> {
    let x = data.numeric(columns::X)?;
    let y = data.numeric(columns::Y)?;
    Ok(x.iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip())
}

impl StatTest {
    /// Run this test on `data`
    pub fn run(&self, data: &Dataset) -> Result<TestResult> {
        match self {
            Self::IndependentT => two_sample(&IndependentT, data),
            Self::PairedT => two_sample(&PairedT, data),
            Self::MannWhitneyU => two_sample(&MannWhitneyU, data),
            Self::WilcoxonSignedRank => two_sample(&WilcoxonSignedRank, data),
            Self::OneWayAnova => multi_sample(&OneWayAnova, data),
            Self::KruskalWallis => multi_sample(&KruskalWallis, data),
            Self::Friedman => multi_sample(&Friedman, data),
            Self::TwoWayAnova => {
                let table = two_way_anova(data)?;
                Ok(TestResult::new(table.to_string(), table.any_significant()))
            }
            Self::Ancova => {
                let table = ancova(data)?;
                Ok(TestResult::new(
                    table.to_string(),
                    table.term_significant(ANCOVA_GROUP_TERM),
                ))
            }
            Self::RepeatedMeasuresAnova => {
                let fit = repeated_measures_anova(data)?;
                Ok(TestResult::new(fit.to_string(), fit.is_significant()))
            }
            Self::Spearman => {
                let (x, y) = paired_xy(data)?;
                let stat = spearman(&x, &y)?;
                Ok(TestResult::new(
                    summary("Spearman相関係数", &stat),
                    stat.is_significant(),
                ))
            }
        }
    }
}

/// Run the selected test
pub fn run_test(selection: &TestSelection, data: &Dataset) -> Result<TestResult> {
    match selection {
        TestSelection::Known(test) => {
            tracing::debug!(test = test.label(), rows = data.n_rows(), "running test");
            let result = test.run(data)?;
            tracing::info!(test = test.label(), significant = result.significant, "test complete");
            Ok(result)
        }
        TestSelection::Unsupported(raw) => {
            tracing::warn!(selection = %raw, "unsupported test selection");
            Ok(TestResult::not_implemented())
        }
    }
}

impl PostHoc {
    /// Run this procedure on the `group`/`value` columns of `data`
    pub fn run(&self, data: &Dataset) -> Result<String> {
        let groups = sorted_groups(data)?;
        let table = match self {
            Self::TukeyHsd | Self::Dunnett => tukey_hsd(&groups)?,
            Self::Bonferroni => corrected_t_tests(&groups, Correction::Bonferroni)?,
            Self::Holm => corrected_t_tests(&groups, Correction::Holm)?,
            Self::Scheffe => scheffe(&groups)?,
            Self::GamesHowell => games_howell(&groups)?,
        };
        Ok(table.to_string())
    }
}

/// Run the selected post-hoc procedure
///
/// Group count is not checked against the omnibus gate here; with fewer
/// than two groups the computation's own error is returned.
pub fn run_post_hoc(selection: &PostHocSelection, data: &Dataset) -> Result<String> {
    match selection {
        PostHocSelection::Known(procedure) => {
            tracing::debug!(post_hoc = procedure.label(), "running post-hoc comparisons");
            procedure.run(data)
        }
        PostHocSelection::Unsupported(raw) => {
            tracing::warn!(selection = %raw, "unsupported post-hoc selection");
            Ok(POST_HOC_NOT_IMPLEMENTED.to_string())
        }
    }
}
