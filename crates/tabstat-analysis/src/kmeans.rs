//! K-means clustering with k-means++ seeding

use crate::features::Features;
use nalgebra::{DMatrix, RowDVector};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tabstat_core::{columns, Column, Dataset, Error, Result};

/// Parameters for k-means clustering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansParams {
    pub clusters: usize,
    pub max_iterations: usize,
    /// Stop once the total centroid shift falls below this
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            clusters: 3,
            max_iterations: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

impl KMeansParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clusters(mut self, clusters: usize) -> Self {
        self.clusters = clusters;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.clusters == 0 {
            return Err(Error::InvalidParameter("clusters must be positive".to_string()));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidParameter(
                "max_iterations must be positive".to_string(),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Fitted clustering
#[derive(Debug, Clone)]
pub struct KMeansFit {
    pub centroids: DMatrix<f64>,
    pub labels: Vec<usize>,
    pub inertia: f64,
    pub iterations: usize,
}

impl KMeansFit {
    /// Number of samples assigned to each cluster
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.nrows()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

fn squared_distance(x: &DMatrix<f64>, row: usize, centroids: &DMatrix<f64>, c: usize) -> f64 {
    (0..x.ncols())
        .map(|j| (x[(row, j)] - centroids[(c, j)]).powi(2))
        .sum()
}

fn nearest(x: &DMatrix<f64>, row: usize, centroids: &DMatrix<f64>) -> (usize, f64) {
    (0..centroids.nrows())
        .map(|c| (c, squared_distance(x, row, centroids, c)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((0, f64::INFINITY))
}

fn seed_centroids(x: &DMatrix<f64>, k: usize, rng: &mut ChaCha8Rng) -> DMatrix<f64> {
    let n = x.nrows();
    let mut centroids = DMatrix::zeros(k, x.ncols());
    centroids.set_row(0, &x.row(rng.gen_range(0..n)));

    for c in 1..k {
        let chosen = centroids.rows(0, c).into_owned();
        let distances: Vec<f64> = (0..n).map(|i| nearest(x, i, &chosen).1).collect();
        let total: f64 = distances.iter().sum();
        let pick = if total > 0.0 {
            let threshold = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            distances
                .iter()
                .position(|&d| {
                    cumulative += d;
                    cumulative >= threshold
                })
                .unwrap_or(n - 1)
        } else {
            rng.gen_range(0..n)
        };
        centroids.set_row(c, &x.row(pick));
    }
    centroids
}

fn assign(x: &DMatrix<f64>, centroids: &DMatrix<f64>) -> Vec<usize> {
    (0..x.nrows())
        .into_par_iter()
        .map(|i| nearest(x, i, centroids).0)
        .collect()
}

fn update(x: &DMatrix<f64>, labels: &[usize], previous: &DMatrix<f64>) -> DMatrix<f64> {
    let k = previous.nrows();
    let mut sums = DMatrix::zeros(k, x.ncols());
    let mut counts = vec![0usize; k];
    for (i, &label) in labels.iter().enumerate() {
        counts[label] += 1;
        let row: RowDVector<f64> = x.row(i).into_owned();
        let updated = sums.row(label) + row;
        sums.set_row(label, &updated);
    }
    for (c, &count) in counts.iter().enumerate() {
        if count == 0 {
            // Empty clusters keep their previous centroid
            sums.set_row(c, &previous.row(c));
        } else {
            let mean = sums.row(c) / count as f64;
            sums.set_row(c, &mean);
        }
    }
    sums
}

/// Lloyd's algorithm from k-means++ seeds
pub fn fit(x: &DMatrix<f64>, params: &KMeansParams) -> Result<KMeansFit> {
    params.validate()?;
    if x.nrows() < params.clusters {
        return Err(Error::InsufficientData {
            expected: params.clusters,
            actual: x.nrows(),
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let mut centroids = seed_centroids(x, params.clusters, &mut rng);
    let mut labels = assign(x, &centroids);
    let mut iterations = 0;

    for iteration in 1..=params.max_iterations {
        iterations = iteration;
        let next = update(x, &labels, &centroids);
        let shift: f64 = (0..next.nrows())
            .map(|c| (next.row(c) - centroids.row(c)).norm())
            .sum();
        centroids = next;
        labels = assign(x, &centroids);
        if shift < params.tolerance {
            break;
        }
    }

    let inertia = labels
        .iter()
        .enumerate()
        .map(|(i, &c)| squared_distance(x, i, &centroids, c))
        .sum();
    tracing::debug!(iterations, inertia, "k-means converged");

    Ok(KMeansFit {
        centroids,
        labels,
        inertia,
        iterations,
    })
}

/// Cluster the standardized numeric columns
///
/// The output keeps the feature columns of the rows used and labels each
/// row with its cluster index in `group`, so the grouped graphs color by
/// cluster.
pub fn analyze(data: &Dataset, params: &KMeansParams) -> Result<(String, Dataset)> {
    let features = Features::extract(data, &[columns::GROUP])?;
    features.require_samples(params.clusters.max(1))?;
    let fit = fit(&features.standardized(), params)?;

    let mut out = Dataset::new();
    for name in &features.names {
        if let Some(column) = data.column(name) {
            out.push_column(column.take(&features.rows))?;
        }
    }
    out.push_column(Column::numeric(
        columns::GROUP,
        fit.labels.iter().map(|&c| c as f64).collect(),
    ))?;

    let mut summary = format!(
        "K-means クラスタリング\nクラスタ数: {}\n反復回数: {}\n慣性 (inertia): {:.4}\nクラスタサイズ:",
        params.clusters, fit.iterations, fit.inertia
    );
    for (c, size) in fit.sizes().iter().enumerate() {
        summary.push_str(&format!("\n  クラスタ {c}: {size}"));
    }
    Ok((summary, out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> DMatrix<f64> {
        let mut rows = Vec::new();
        for i in 0..10 {
            let jitter = (i as f64) * 0.01;
            rows.extend_from_slice(&[0.0 + jitter, 0.0 - jitter]);
        }
        for i in 0..10 {
            let jitter = (i as f64) * 0.01;
            rows.extend_from_slice(&[10.0 + jitter, 10.0 - jitter]);
        }
        DMatrix::from_row_slice(20, 2, &rows)
    }

    #[test]
    fn test_two_blobs_separate() {
        let x = blobs();
        let fit = fit(&x, &KMeansParams::new().with_clusters(2)).unwrap();
        assert_eq!(fit.sizes(), vec![10, 10]);
        let first = fit.labels[0];
        assert!(fit.labels[..10].iter().all(|&l| l == first));
        assert!(fit.labels[10..].iter().all(|&l| l != first));
        assert!(fit.inertia < 1.0);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let x = blobs();
        let params = KMeansParams::new().with_clusters(3).with_seed(7);
        let a = fit(&x, &params).unwrap();
        let b = fit(&x, &params).unwrap();
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_too_few_samples() {
        let x = DMatrix::from_row_slice(2, 1, &[1.0, 2.0]);
        assert!(fit(&x, &KMeansParams::new()).is_err());
        assert!(fit(&x, &KMeansParams::new().with_clusters(0)).is_err());
    }
}
