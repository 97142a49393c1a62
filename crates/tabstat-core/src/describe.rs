//! Descriptive statistics shared by the test, preprocessing and plotting crates

use crate::error::{Error, Result};

/// Arithmetic mean, `NaN` for empty input
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Variance with `ddof` delta degrees of freedom, `NaN` when undefined
pub fn variance(data: &[f64], ddof: usize) -> f64 {
    if data.len() <= ddof {
        return f64::NAN;
    }
    let m = mean(data);
    data.iter().map(|&x| (x - m).powi(2)).sum::<f64>() / (data.len() - ddof) as f64
}

/// Standard deviation with `ddof` delta degrees of freedom
pub fn std_dev(data: &[f64], ddof: usize) -> f64 {
    variance(data, ddof).sqrt()
}

/// Sum of squared deviations from the mean
pub fn sum_of_squares(data: &[f64]) -> f64 {
    let m = mean(data);
    data.iter().map(|&x| (x - m).powi(2)).sum()
}

/// Sort a copy of the data, rejecting NaN
pub fn sorted(data: &[f64]) -> Result<Vec<f64>> {
    if data.iter().any(|x| x.is_nan()) {
        return Err(Error::non_finite("input data"));
    }
    let mut out = data.to_vec();
    out.sort_by(f64::total_cmp);
    Ok(out)
}

/// Quantile of already sorted data by linear interpolation between order
/// statistics (position `p * (n - 1)`)
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Quantile of unsorted data
pub fn quantile(data: &[f64], p: f64) -> Result<f64> {
    Ok(quantile_sorted(&sorted(data)?, p))
}

/// Median of unsorted data
pub fn median(data: &[f64]) -> Result<f64> {
    quantile(data, 0.5)
}

/// Ranks starting at 1, tied values sharing the average of their positions
pub fn average_ranks(data: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..data.len()).collect();
    order.sort_by(|&a, &b| data[a].total_cmp(&data[b]));

    let mut ranks = vec![0.0; data.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && data[order[end]] == data[order[start]] {
            end += 1;
        }
        // positions start..end share ranks start+1..=end
        let avg = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg;
        }
        start = end;
    }
    ranks
}

/// Sizes of runs of equal values
pub fn tie_counts(data: &[f64]) -> Vec<usize> {
    let mut values = data.to_vec();
    values.sort_by(f64::total_cmp);
    let mut counts = Vec::new();
    let mut start = 0;
    while start < values.len() {
        let mut end = start + 1;
        while end < values.len() && values[end] == values[start] {
            end += 1;
        }
        counts.push(end - start);
        start = end;
    }
    counts
}

/// Tie correction term `sum(t^3 - t)` over runs of equal values
pub fn tie_term(data: &[f64]) -> f64 {
    tie_counts(data)
        .into_iter()
        .map(|t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum()
}

/// Pearson correlation of two equally long samples
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(Error::size_mismatch(x.len(), y.len(), "correlation"));
    }
    if x.len() < 2 {
        return Err(Error::InsufficientData {
            expected: 2,
            actual: x.len(),
        });
    }
    let mx = mean(x);
    let my = mean(y);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    Ok(sxy / (sxx * syy).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_variance() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(mean(&data), 2.5);
        assert_relative_eq!(variance(&data, 1), 5.0 / 3.0);
        assert_relative_eq!(variance(&data, 0), 1.25);
        assert!(variance(&[1.0], 1).is_nan());
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_quantile_linear() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        assert_relative_eq!(quantile(&data, 0.25).unwrap(), 3.0);
        assert_relative_eq!(quantile(&data, 0.75).unwrap(), 7.0);
        assert_relative_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
        assert!(quantile(&[1.0, f64::NAN], 0.5).is_err());
    }

    #[test]
    fn test_average_ranks_with_ties() {
        let ranks = average_ranks(&[10.0, 20.0, 10.0, 30.0]);
        assert_eq!(ranks, vec![1.5, 3.0, 1.5, 4.0]);
    }

    #[test]
    fn test_tie_term() {
        assert_relative_eq!(tie_term(&[1.0, 2.0, 3.0]), 0.0);
        // one pair (8 - 2 = 6) and one triple (27 - 3 = 24)
        assert_relative_eq!(tie_term(&[1.0, 1.0, 2.0, 2.0, 2.0]), 30.0);
    }

    #[test]
    fn test_pearson() {
        let r = pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert_relative_eq!(r, 1.0, epsilon = 1e-12);
        assert!(pearson(&[1.0], &[1.0]).is_err());
    }
}
