//! Linear support vector machine, one-vs-rest over the `group` classes

use crate::classify::{argmax, LabelledSet};
use crate::features::Scaler;
use nalgebra::{DMatrix, DVector};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tabstat_core::{Dataset, Error, Result};

/// Parameters for the Pegasos solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvmParams {
    /// Inverse regularization strength; the solver uses lambda = 1 / (C n)
    pub c: f64,
    /// Passes over the training set
    pub epochs: usize,
    pub seed: u64,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            epochs: 200,
            seed: 42,
        }
    }
}

impl SvmParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.c.is_finite() || self.c <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "C must be a positive number, got {}",
                self.c
            )));
        }
        if self.epochs == 0 {
            return Err(Error::InvalidParameter("epochs must be positive".to_string()));
        }
        Ok(())
    }
}

/// One hyperplane per class over standardized features
#[derive(Debug, Clone)]
pub struct LinearSvm {
    pub scaler: Scaler,
    /// Weights per class; the last entry is the bias
    pub planes: Vec<DVector<f64>>,
}

fn augmented(scaler: &Scaler, x: &DMatrix<f64>) -> DMatrix<f64> {
    let z = scaler.transform(x);
    let p = z.ncols();
    DMatrix::from_fn(z.nrows(), p + 1, |i, j| if j < p { z[(i, j)] } else { 1.0 })
}

/// Pegasos on the hinge loss for labels in {-1, +1}
fn pegasos(z: &DMatrix<f64>, signs: &[f64], lambda: f64, epochs: usize, seed: u64) -> DVector<f64> {
    let (n, q) = z.shape();
    let radius = 1.0 / lambda.sqrt();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut w = DVector::zeros(q);
    for t in 1..=epochs * n {
        let i = rng.gen_range(0..n);
        let eta = 1.0 / (lambda * t as f64);
        let margin = signs[i] * z.row(i).transpose().dot(&w);
        w *= 1.0 - eta * lambda;
        if margin < 1.0 {
            w += z.row(i).transpose() * (eta * signs[i]);
        }
        let norm = w.norm();
        if norm > radius {
            w *= radius / norm;
        }
    }
    w
}

/// Train one classifier per class against the rest
pub fn fit(
    x: &DMatrix<f64>,
    targets: &[usize],
    n_classes: usize,
    params: &SvmParams,
) -> Result<LinearSvm> {
    params.validate()?;
    if x.nrows() != targets.len() {
        return Err(Error::size_mismatch(x.nrows(), targets.len(), "SVM targets"));
    }
    if x.nrows() == 0 || n_classes < 2 {
        return Err(Error::InsufficientData {
            expected: 2,
            actual: x.nrows().min(n_classes),
        });
    }

    let scaler = Scaler::fit(x);
    let z = augmented(&scaler, x);
    let lambda = 1.0 / (params.c * z.nrows() as f64);
    let planes = (0..n_classes)
        .into_par_iter()
        .map(|class| {
            let signs: Vec<f64> = targets
                .iter()
                .map(|&t| if t == class { 1.0 } else { -1.0 })
                .collect();
            pegasos(&z, &signs, lambda, params.epochs, params.seed.wrapping_add(class as u64))
        })
        .collect();
    Ok(LinearSvm { scaler, planes })
}

impl LinearSvm {
    /// Signed distance-like score of every row against every class plane
    pub fn decision_function(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let z = augmented(&self.scaler, x);
        DMatrix::from_fn(z.nrows(), self.planes.len(), |i, k| {
            z.row(i).transpose().dot(&self.planes[k])
        })
    }

    /// Class with the largest decision value for each row
    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<usize> {
        let scores = self.decision_function(x);
        (0..scores.nrows())
            .map(|i| argmax(scores.row(i).iter().copied()))
            .collect()
    }
}

/// Train on every labelled row and report the training accuracy
pub fn analyze(data: &Dataset, params: &SvmParams) -> Result<(String, Dataset)> {
    let set = LabelledSet::extract(data)?;
    let model = fit(&set.x, &set.targets, set.n_classes(), params)?;
    let predicted = model.predict(&set.x);

    let scores = model.decision_function(&set.x);
    let margin_violations = set
        .targets
        .iter()
        .enumerate()
        .filter(|&(i, &t)| scores[(i, t)] < 1.0)
        .count();
    let summary = format!(
        "サポートベクターマシン (SVM)\nカーネル: 線形 (one-vs-rest)\nC: {}\n{}\nマージン内のサンプル数: {}",
        params.c,
        set.describe(&predicted),
        margin_violations
    );
    Ok((summary, set.output(data, &predicted)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_blobs() -> (DMatrix<f64>, Vec<usize>) {
        let centers = [(0.0, 0.0), (6.0, 0.0), (3.0, 6.0)];
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for (class, (cx, cy)) in centers.iter().enumerate() {
            for i in 0..8 {
                let jitter = (i as f64 - 3.5) * 0.1;
                rows.extend_from_slice(&[cx + jitter, cy - jitter]);
                targets.push(class);
            }
        }
        (DMatrix::from_row_slice(24, 2, &rows), targets)
    }

    #[test]
    fn test_separates_three_blobs() {
        let (x, targets) = three_blobs();
        let model = fit(&x, &targets, 3, &SvmParams::default()).unwrap();
        assert_eq!(model.planes.len(), 3);
        assert_eq!(model.predict(&x), targets);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let (x, targets) = three_blobs();
        let params = SvmParams::new().with_epochs(20).with_seed(7);
        let a = fit(&x, &targets, 3, &params).unwrap();
        let b = fit(&x, &targets, 3, &params).unwrap();
        assert_eq!(a.planes, b.planes);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let (x, targets) = three_blobs();
        assert!(fit(&x, &targets, 3, &SvmParams::new().with_c(-1.0)).is_err());
        assert!(fit(&x, &targets, 3, &SvmParams::new().with_epochs(0)).is_err());
    }
}
