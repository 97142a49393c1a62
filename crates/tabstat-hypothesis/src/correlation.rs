//! Spearman rank correlation

use crate::distribution::student_t_two_sided;
use crate::types::TestStatistic;
use tabstat_core::describe::{average_ranks, pearson};
use tabstat_core::{Error, Result};

/// Spearman's rho of two paired samples with its two-sided p-value
///
/// The p-value uses the t distribution with `n - 2` degrees of freedom.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<TestStatistic> {
    if x.len() != y.len() {
        return Err(Error::size_mismatch(x.len(), y.len(), "correlation"));
    }
    if x.len() < 3 {
        return Err(Error::InsufficientData {
            expected: 3,
            actual: x.len(),
        });
    }

    let rho = pearson(&average_ranks(x), &average_ranks(y))?;
    if rho.is_nan() {
        return Err(Error::Computation(
            "Spearman correlation undefined for a constant sample".into(),
        ));
    }
    let df = x.len() as f64 - 2.0;
    let p = if (1.0 - rho.abs()) < f64::EPSILON {
        0.0
    } else {
        let t = rho * (df / ((1.0 + rho) * (1.0 - rho))).sqrt();
        student_t_two_sided(t, df)?
    };
    Ok(TestStatistic::new(rho, p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_monotonic() {
        let r = spearman(&[1.0, 2.0, 3.0, 4.0], &[1.0, 4.0, 9.0, 16.0]).unwrap();
        assert_relative_eq!(r.statistic, 1.0, epsilon = 1e-12);
        assert_eq!(r.p_value, 0.0);
    }

    #[test]
    fn test_partial() {
        let r = spearman(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 1.0, 4.0, 3.0, 5.0]).unwrap();
        assert_relative_eq!(r.statistic, 0.8, epsilon = 1e-12);
        assert!(r.p_value > 0.05);
    }

    #[test]
    fn test_constant_rejected() {
        assert!(spearman(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
    }
}
