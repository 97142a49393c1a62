//! Two-sample tests: Student's t (independent and paired), Mann-Whitney U
//! and the Wilcoxon signed-rank test

use crate::distribution::{normal_two_sided, student_t_two_sided};
use crate::traits::TwoSampleTest;
use crate::types::TestStatistic;
use tabstat_core::describe::{average_ranks, mean, sum_of_squares, tie_term, variance};
use tabstat_core::{Error, Result};

fn require_len(data: &[f64], min: usize) -> Result<()> {
    if data.len() < min {
        return Err(Error::InsufficientData {
            expected: min,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Student's t-test for independent samples with pooled variance
#[derive(Debug, Clone, Copy, Default)]
pub struct IndependentT;

impl TwoSampleTest for IndependentT {
    fn statistic_label(&self) -> &'static str {
        "t統計量"
    }

    fn test(&self, first: &[f64], second: &[f64]) -> Result<TestStatistic> {
        require_len(first, 1)?;
        require_len(second, 1)?;
        let (n1, n2) = (first.len() as f64, second.len() as f64);
        let df = n1 + n2 - 2.0;
        if df < 1.0 {
            return Err(Error::InsufficientData {
                expected: 3,
                actual: first.len() + second.len(),
            });
        }

        let pooled = (sum_of_squares(first) + sum_of_squares(second)) / df;
        let se = (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
        if se == 0.0 {
            return Err(Error::Computation(
                "t statistic undefined: both samples have zero variance".into(),
            ));
        }
        let t = (mean(first) - mean(second)) / se;
        Ok(TestStatistic::new(t, student_t_two_sided(t, df)?))
    }
}

/// Student's t-test on paired differences
#[derive(Debug, Clone, Copy, Default)]
pub struct PairedT;

impl TwoSampleTest for PairedT {
    fn is_paired(&self) -> bool {
        true
    }

    fn statistic_label(&self) -> &'static str {
        "t統計量"
    }

    fn test(&self, first: &[f64], second: &[f64]) -> Result<TestStatistic> {
        if first.len() != second.len() {
            return Err(Error::size_mismatch(first.len(), second.len(), "paired samples"));
        }
        require_len(first, 2)?;

        let diffs: Vec<f64> = first.iter().zip(second).map(|(a, b)| a - b).collect();
        let n = diffs.len() as f64;
        let se = (variance(&diffs, 1) / n).sqrt();
        if se == 0.0 {
            return Err(Error::Computation(
                "t statistic undefined: paired differences have zero variance".into(),
            ));
        }
        let t = mean(&diffs) / se;
        Ok(TestStatistic::new(t, student_t_two_sided(t, n - 1.0)?))
    }
}

/// Largest sample size for which the exact Mann-Whitney distribution is used
const MANN_WHITNEY_EXACT_MAX: usize = 8;

/// Mann-Whitney U test, two-sided
///
/// The statistic is U of the first sample. Without ties and with both
/// samples of at most eight values the p-value is exact; otherwise the
/// normal approximation with tie and continuity correction is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct MannWhitneyU;

impl MannWhitneyU {
    /// Number of orderings of `m` + `n` values giving each U, indexed by U
    fn exact_counts(m: usize, n: usize) -> Vec<Vec<Vec<f64>>> {
        // counts[i][j][u]: orderings of i first-sample and j second-sample values with U = u
        let mut counts = vec![vec![Vec::new(); n + 1]; m + 1];
        for i in 0..=m {
            for j in 0..=n {
                let mut row = vec![0.0; i * j + 1];
                if i == 0 || j == 0 {
                    row[0] = 1.0;
                } else {
                    for (u, slot) in row.iter_mut().enumerate() {
                        // largest value from the first sample: it beats all j others
                        let with_first = if u >= j {
                            counts[i - 1][j].get(u - j).copied().unwrap_or(0.0)
                        } else {
                            0.0
                        };
                        let with_second = counts[i][j - 1].get(u).copied().unwrap_or(0.0);
                        *slot = with_first + with_second;
                    }
                }
                counts[i][j] = row;
            }
        }
        counts
    }

    fn exact_p(u_max: f64, m: usize, n: usize) -> f64 {
        let counts = Self::exact_counts(m, n);
        let dist = &counts[m][n];
        let total: f64 = dist.iter().sum();
        let start = u_max.round() as usize;
        let upper: f64 = dist.iter().skip(start).sum();
        (2.0 * upper / total).min(1.0)
    }
}

impl TwoSampleTest for MannWhitneyU {
    fn statistic_label(&self) -> &'static str {
        "U統計量"
    }

    fn test(&self, first: &[f64], second: &[f64]) -> Result<TestStatistic> {
        require_len(first, 1)?;
        require_len(second, 1)?;
        let (m, n) = (first.len(), second.len());
        let pooled: Vec<f64> = first.iter().chain(second).copied().collect();
        let ranks = average_ranks(&pooled);
        let r1: f64 = ranks[..m].iter().sum();
        let (mf, nf) = (m as f64, n as f64);
        let u1 = r1 - mf * (mf + 1.0) / 2.0;
        let u2 = mf * nf - u1;
        let u_max = u1.max(u2);

        let ties = tie_term(&pooled);
        if ties == 0.0 && m <= MANN_WHITNEY_EXACT_MAX && n <= MANN_WHITNEY_EXACT_MAX {
            return Ok(TestStatistic::new(u1, Self::exact_p(u_max, m, n)));
        }

        let total = mf + nf;
        let mu = mf * nf / 2.0;
        let sigma = (mf * nf / 12.0 * ((total + 1.0) - ties / (total * (total - 1.0)))).sqrt();
        if sigma.is_nan() || sigma <= 0.0 {
            return Err(Error::Computation(
                "Mann-Whitney U undefined: all values are tied".into(),
            ));
        }
        let z = (u_max - mu - 0.5) / sigma;
        Ok(TestStatistic::new(u1, normal_two_sided(z)?))
    }
}

/// Largest number of non-zero differences for the exact Wilcoxon distribution
const WILCOXON_EXACT_MAX: usize = 50;

/// Wilcoxon signed-rank test on paired samples, two-sided
///
/// Zero differences are discarded. The statistic is the smaller of the
/// positive and negative rank sums.
#[derive(Debug, Clone, Copy, Default)]
pub struct WilcoxonSignedRank;

impl WilcoxonSignedRank {
    /// P(W <= w) for the signed-rank sum of `n` untied ranks
    fn exact_cdf(w: f64, n: usize) -> f64 {
        let max_sum = n * (n + 1) / 2;
        let mut counts = vec![0.0f64; max_sum + 1];
        counts[0] = 1.0;
        for k in 1..=n {
            for s in (k..=max_sum).rev() {
                counts[s] += counts[s - k];
            }
        }
        let total = 2f64.powi(n as i32);
        let upto = w.floor() as usize;
        counts.iter().take(upto + 1).sum::<f64>() / total
    }
}

impl TwoSampleTest for WilcoxonSignedRank {
    fn is_paired(&self) -> bool {
        true
    }

    fn statistic_label(&self) -> &'static str {
        "W統計量"
    }

    fn test(&self, first: &[f64], second: &[f64]) -> Result<TestStatistic> {
        if first.len() != second.len() {
            return Err(Error::size_mismatch(first.len(), second.len(), "paired samples"));
        }
        let all: Vec<f64> = first.iter().zip(second).map(|(a, b)| a - b).collect();
        let diffs: Vec<f64> = all.iter().copied().filter(|d| *d != 0.0).collect();
        let had_zeros = diffs.len() != all.len();
        if diffs.is_empty() {
            return Err(Error::Computation(
                "Wilcoxon statistic undefined: every paired difference is zero".into(),
            ));
        }

        let magnitudes: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
        let ranks = average_ranks(&magnitudes);
        let r_plus: f64 = diffs
            .iter()
            .zip(&ranks)
            .filter(|(d, _)| **d > 0.0)
            .map(|(_, r)| r)
            .sum();
        let n = diffs.len();
        let nf = n as f64;
        let r_minus = nf * (nf + 1.0) / 2.0 - r_plus;
        let w = r_plus.min(r_minus);

        let ties = tie_term(&magnitudes);
        if ties == 0.0 && !had_zeros && n <= WILCOXON_EXACT_MAX {
            let p = (2.0 * Self::exact_cdf(w, n)).min(1.0);
            return Ok(TestStatistic::new(w, p));
        }

        let mn = nf * (nf + 1.0) / 4.0;
        let var = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - ties / 48.0;
        if var.is_nan() || var <= 0.0 {
            return Err(Error::Computation("Wilcoxon variance is zero".into()));
        }
        let z = (w - mn) / var.sqrt();
        Ok(TestStatistic::new(w, normal_two_sided(z)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_independent_t_reference() {
        let r = IndependentT.test(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert_relative_eq!(r.statistic, -3.674235, epsilon = 1e-5);
        assert_relative_eq!(r.p_value, 0.021312, epsilon = 1e-4);
        assert!(r.is_significant());
    }

    #[test]
    fn test_independent_t_zero_variance() {
        assert!(IndependentT.test(&[1.0, 1.0], &[1.0, 1.0]).is_err());
    }

    #[test]
    fn test_paired_t() {
        let a = [10.0, 12.0, 9.0, 11.0, 13.0];
        let b = [9.0, 10.0, 9.5, 9.0, 11.0];
        let r = PairedT.test(&a, &b).unwrap();
        // differences 1, 2, -0.5, 2, 2: mean 1.3, sd 1.0954
        assert_relative_eq!(r.statistic, 1.3 / (1.2f64.sqrt() / 5f64.sqrt()), epsilon = 1e-9);
        assert!(PairedT.test(&a, &b[..4]).is_err());
    }

    #[test]
    fn test_mann_whitney_exact() {
        // complete separation of 3 vs 3: p = 2 / C(6, 3) = 0.1
        let r = MannWhitneyU.test(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert_relative_eq!(r.statistic, 0.0);
        assert_relative_eq!(r.p_value, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_mann_whitney_asymptotic_with_ties() {
        let r = MannWhitneyU
            .test(&[1.0, 2.0, 2.0, 3.0], &[2.0, 4.0, 5.0, 6.0])
            .unwrap();
        assert!(r.p_value > 0.0 && r.p_value <= 1.0);
        assert_relative_eq!(r.statistic, 2.0);
    }

    #[test]
    fn test_exact_counts_total() {
        let counts = MannWhitneyU::exact_counts(4, 3);
        assert_relative_eq!(counts[4][3].iter().sum::<f64>(), 35.0);
    }

    #[test]
    fn test_wilcoxon_exact() {
        // all five differences positive: W = 0, p = 2 / 32
        let a = [2.0, 4.0, 6.0, 8.0, 10.0];
        let b = [1.0, 2.0, 3.0, 4.0, 5.0];
        let r = WilcoxonSignedRank.test(&a, &b).unwrap();
        assert_relative_eq!(r.statistic, 0.0);
        assert_relative_eq!(r.p_value, 0.0625, epsilon = 1e-12);
    }

    #[test]
    fn test_wilcoxon_all_zero() {
        assert!(WilcoxonSignedRank.test(&[1.0, 2.0], &[1.0, 2.0]).is_err());
    }
}
