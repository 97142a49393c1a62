//! Omnibus tests over two or more groups

use crate::distribution::{chi2_sf, f_sf};
use crate::traits::MultiSampleTest;
use crate::types::TestStatistic;
use tabstat_core::describe::{average_ranks, mean, sum_of_squares, tie_term};
use tabstat_core::{Error, Result};

fn require_groups(groups: &[Vec<f64>], min: usize) -> Result<()> {
    if groups.len() < min {
        return Err(Error::InvalidInput(format!(
            "at least {min} groups are required, got {}",
            groups.len()
        )));
    }
    if let Some(empty) = groups.iter().position(Vec::is_empty) {
        return Err(Error::InvalidInput(format!("group {empty} has no observations")));
    }
    Ok(())
}

/// Between- and within-group sums of squares
pub(crate) fn anova_partition(groups: &[Vec<f64>]) -> (f64, f64) {
    let pooled: Vec<f64> = groups.iter().flatten().copied().collect();
    let grand = mean(&pooled);
    let between = groups
        .iter()
        .map(|g| g.len() as f64 * (mean(g) - grand).powi(2))
        .sum();
    let within = groups.iter().map(|g| sum_of_squares(g)).sum();
    (between, within)
}

/// One-way analysis of variance
#[derive(Debug, Clone, Copy, Default)]
pub struct OneWayAnova;

impl MultiSampleTest for OneWayAnova {
    fn statistic_label(&self) -> &'static str {
        "F値"
    }

    fn test(&self, groups: &[Vec<f64>]) -> Result<TestStatistic> {
        require_groups(groups, 2)?;
        let k = groups.len() as f64;
        let n: usize = groups.iter().map(Vec::len).sum();
        let df_within = n as f64 - k;
        if df_within < 1.0 {
            return Err(Error::InsufficientData {
                expected: groups.len() + 1,
                actual: n,
            });
        }

        let (between, within) = anova_partition(groups);
        if within == 0.0 {
            return Err(Error::Computation(
                "F statistic undefined: within-group variance is zero".into(),
            ));
        }
        let f = (between / (k - 1.0)) / (within / df_within);
        Ok(TestStatistic::new(f, f_sf(f, k - 1.0, df_within)?))
    }
}

/// Kruskal-Wallis H test with tie correction
#[derive(Debug, Clone, Copy, Default)]
pub struct KruskalWallis;

impl MultiSampleTest for KruskalWallis {
    fn statistic_label(&self) -> &'static str {
        "H統計量"
    }

    fn test(&self, groups: &[Vec<f64>]) -> Result<TestStatistic> {
        require_groups(groups, 2)?;
        let pooled: Vec<f64> = groups.iter().flatten().copied().collect();
        let n = pooled.len() as f64;
        let ranks = average_ranks(&pooled);

        let mut offset = 0;
        let mut rank_term = 0.0;
        for g in groups {
            let r: f64 = ranks[offset..offset + g.len()].iter().sum();
            rank_term += r * r / g.len() as f64;
            offset += g.len();
        }
        let h = 12.0 / (n * (n + 1.0)) * rank_term - 3.0 * (n + 1.0);

        let correction = 1.0 - tie_term(&pooled) / (n * n * n - n);
        if correction <= 0.0 {
            return Err(Error::Computation(
                "Kruskal-Wallis H undefined: all values are tied".into(),
            ));
        }
        let h = h / correction;
        Ok(TestStatistic::new(h, chi2_sf(h, groups.len() as f64 - 1.0)?))
    }
}

/// Friedman rank test for repeated measures
///
/// Group `j` holds the measurements of treatment `j`; position `i` in every
/// group belongs to block `i`, so all groups must have the same length.
#[derive(Debug, Clone, Copy, Default)]
pub struct Friedman;

impl MultiSampleTest for Friedman {
    fn is_blocked(&self) -> bool {
        true
    }

    fn statistic_label(&self) -> &'static str {
        "Friedman統計量"
    }

    fn test(&self, groups: &[Vec<f64>]) -> Result<TestStatistic> {
        require_groups(groups, 3)?;
        let blocks = groups[0].len();
        if let Some(g) = groups.iter().find(|g| g.len() != blocks) {
            return Err(Error::size_mismatch(blocks, g.len(), "Friedman groups"));
        }

        let k = groups.len();
        let mut rank_sums = vec![0.0; k];
        let mut ties = 0.0;
        for i in 0..blocks {
            let row: Vec<f64> = groups.iter().map(|g| g[i]).collect();
            for (sum, r) in rank_sums.iter_mut().zip(average_ranks(&row)) {
                *sum += r;
            }
            ties += tie_term(&row);
        }

        let (n, kf) = (blocks as f64, k as f64);
        let ssbn: f64 = rank_sums.iter().map(|r| r * r).sum();
        let correction = 1.0 - ties / (n * kf * (kf * kf - 1.0));
        if correction <= 0.0 {
            return Err(Error::Computation(
                "Friedman statistic undefined: every block is fully tied".into(),
            ));
        }
        let chi2 = (12.0 / (n * kf * (kf + 1.0)) * ssbn - 3.0 * n * (kf + 1.0)) / correction;
        Ok(TestStatistic::new(chi2, chi2_sf(chi2, kf - 1.0)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn three_groups() -> Vec<Vec<f64>> {
        vec![
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ]
    }

    #[test]
    fn test_one_way_anova() {
        // between = 3 * (9 + 0 + 9) = 54, within = 6, F = (54 / 2) / (6 / 6) = 27
        let r = OneWayAnova.test(&three_groups()).unwrap();
        assert_relative_eq!(r.statistic, 27.0, epsilon = 1e-12);
        assert!(r.p_value < 0.001);
    }

    #[test]
    fn test_kruskal_wallis() {
        // rank sums 6, 15, 24 over n = 9: H = 12/90 * (36+225+576)/3 - 30 = 7.2
        let r = KruskalWallis.test(&three_groups()).unwrap();
        assert_relative_eq!(r.statistic, 7.2, epsilon = 1e-12);
        assert_relative_eq!(r.p_value, (-3.6f64).exp(), epsilon = 1e-9);
    }

    #[test]
    fn test_friedman() {
        // the third treatment always ranks highest, the first lowest
        let r = Friedman.test(&three_groups()).unwrap();
        // rank sums 3, 6, 9 over n = 3: 12/36 * 126 - 36 = 6
        assert_relative_eq!(r.statistic, 6.0, epsilon = 1e-12);
        assert!(Friedman.test(&three_groups()[..2]).is_err());
    }

    #[test]
    fn test_friedman_unequal_lengths() {
        let groups = vec![vec![1.0, 2.0], vec![1.0], vec![3.0, 4.0]];
        assert!(Friedman.test(&groups).is_err());
    }

    #[test]
    fn test_empty_group_rejected() {
        assert!(OneWayAnova.test(&[vec![1.0, 2.0], vec![]]).is_err());
    }
}
