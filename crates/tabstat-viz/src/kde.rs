//! Gaussian kernel density estimation with Scott's bandwidth

use std::f64::consts::PI;
use tabstat_core::describe;

/// Evaluated density curve
#[derive(Debug, Clone, PartialEq)]
pub struct DensityCurve {
    pub grid: Vec<f64>,
    pub density: Vec<f64>,
}

impl DensityCurve {
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.grid.iter().copied().zip(self.density.iter().copied()).collect()
    }
}

/// Scott's rule: sample standard deviation times `n^(-1/5)`
///
/// `None` when there are fewer than two points or no spread.
pub fn scott_bandwidth(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    let sd = describe::std_dev(data, 1);
    if sd.is_nan() || sd <= 0.0 {
        return None;
    }
    Some(sd * (data.len() as f64).powf(-0.2))
}

/// Density on `points` evenly spaced values spanning the data extended by
/// `cut` bandwidths on each side
pub fn gaussian_kde(data: &[f64], points: usize, cut: f64) -> Option<DensityCurve> {
    let bw = scott_bandwidth(data)?;
    let lo = data.iter().copied().fold(f64::INFINITY, f64::min) - cut * bw;
    let hi = data.iter().copied().fold(f64::NEG_INFINITY, f64::max) + cut * bw;
    let steps = points.max(2) - 1;
    let step = (hi - lo) / steps as f64;

    let norm = 1.0 / (data.len() as f64 * bw * (2.0 * PI).sqrt());
    let grid: Vec<f64> = (0..=steps).map(|i| lo + step * i as f64).collect();
    let density = grid
        .iter()
        .map(|&g| {
            data.iter()
                .map(|&x| (-0.5 * ((g - x) / bw).powi(2)).exp())
                .sum::<f64>()
                * norm
        })
        .collect();
    Some(DensityCurve { grid, density })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_density_integrates_to_one() {
        let data = [1.0, 2.0, 2.5, 3.0, 4.5, 5.0];
        let curve = gaussian_kde(&data, 400, 4.0).unwrap();
        let step = curve.grid[1] - curve.grid[0];
        let area: f64 = curve.density.iter().sum::<f64>() * step;
        assert_relative_eq!(area, 1.0, epsilon = 1e-2);
        assert_eq!(curve.grid.len(), 400);
    }

    #[test]
    fn test_degenerate_input() {
        assert!(gaussian_kde(&[1.0], 100, 3.0).is_none());
        assert!(gaussian_kde(&[2.0, 2.0, 2.0], 100, 3.0).is_none());
    }
}
