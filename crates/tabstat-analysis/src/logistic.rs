//! Multinomial logistic regression of the `group` column

use crate::classify::{argmax, LabelledSet};
use crate::features::Scaler;
use nalgebra::DMatrix;
use tabstat_core::{Dataset, Error, Result};

/// Parameters for logistic regression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticParams {
    /// Inverse L2 regularization strength
    pub c: f64,
    pub max_iterations: usize,
    /// Stop once the largest gradient component falls below this
    pub tolerance: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iterations: 1000,
            tolerance: 1e-6,
        }
    }
}

impl LogisticParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.c.is_finite() || self.c <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "C must be a positive number, got {}",
                self.c
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidParameter(
                "max_iterations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Softmax model fitted on standardized features
#[derive(Debug, Clone)]
pub struct LogisticModel {
    pub scaler: Scaler,
    /// One column per class; the last row holds the intercepts
    pub weights: DMatrix<f64>,
    pub iterations: usize,
}

/// Standardized features with a trailing column of ones
fn design(scaler: &Scaler, x: &DMatrix<f64>) -> DMatrix<f64> {
    let z = scaler.transform(x);
    let p = z.ncols();
    DMatrix::from_fn(z.nrows(), p + 1, |i, j| if j < p { z[(i, j)] } else { 1.0 })
}

fn softmax_rows(scores: &mut DMatrix<f64>) {
    for i in 0..scores.nrows() {
        let max = scores.row(i).max();
        let mut total = 0.0;
        for k in 0..scores.ncols() {
            let e = (scores[(i, k)] - max).exp();
            scores[(i, k)] = e;
            total += e;
        }
        for k in 0..scores.ncols() {
            scores[(i, k)] /= total;
        }
    }
}

/// Fit by gradient descent on the mean cross-entropy plus an L2 penalty
///
/// The intercepts are not penalized.
pub fn fit(
    x: &DMatrix<f64>,
    targets: &[usize],
    n_classes: usize,
    params: &LogisticParams,
) -> Result<LogisticModel> {
    params.validate()?;
    if x.nrows() != targets.len() {
        return Err(Error::size_mismatch(x.nrows(), targets.len(), "logistic regression targets"));
    }
    if x.nrows() == 0 || n_classes < 2 {
        return Err(Error::InsufficientData {
            expected: 2,
            actual: x.nrows().min(n_classes),
        });
    }

    let scaler = Scaler::fit(x);
    let z = design(&scaler, x);
    let (n, q) = z.shape();
    let n_f = n as f64;
    let mut onehot = DMatrix::zeros(n, n_classes);
    for (i, &t) in targets.iter().enumerate() {
        onehot[(i, t)] = 1.0;
    }

    let penalty = 1.0 / (params.c * n_f);
    // Upper bound on the curvature of the objective
    let lipschitz = 0.5 * z.norm_squared() / n_f + penalty;
    let step = 1.0 / lipschitz;
    let zt = z.transpose();

    let mut weights = DMatrix::zeros(q, n_classes);
    let mut iterations = 0;
    for iteration in 1..=params.max_iterations {
        iterations = iteration;
        let mut probs = &z * &weights;
        softmax_rows(&mut probs);
        let mut gradient = &zt * (probs - &onehot) / n_f;
        for j in 0..q - 1 {
            for k in 0..n_classes {
                gradient[(j, k)] += penalty * weights[(j, k)];
            }
        }
        weights -= &gradient * step;
        if gradient.amax() < params.tolerance {
            break;
        }
    }
    tracing::debug!(iterations, "logistic regression converged");

    Ok(LogisticModel {
        scaler,
        weights,
        iterations,
    })
}

impl LogisticModel {
    /// Class probabilities, one row per sample
    pub fn predict_proba(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let mut scores = design(&self.scaler, x) * &self.weights;
        softmax_rows(&mut scores);
        scores
    }

    /// Most probable class index for each row
    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<usize> {
        let probs = self.predict_proba(x);
        (0..probs.nrows())
            .map(|i| argmax(probs.row(i).iter().copied()))
            .collect()
    }
}

/// Train on every labelled row and report coefficients and training accuracy
pub fn analyze(data: &Dataset, params: &LogisticParams) -> Result<(String, Dataset)> {
    let set = LabelledSet::extract(data)?;
    let model = fit(&set.x, &set.targets, set.n_classes(), params)?;
    let predicted = model.predict(&set.x);

    let mut summary = format!(
        "ロジスティック回帰\n{}\n反復回数: {}\n係数 (標準化後):",
        set.describe(&predicted),
        model.iterations
    );
    let intercept_row = set.names.len();
    for (k, class) in set.classes.iter().enumerate() {
        summary.push_str(&format!("\n  {class}:"));
        for (j, name) in set.names.iter().enumerate() {
            summary.push_str(&format!(" {name}={:.4}", model.weights[(j, k)]));
        }
        summary.push_str(&format!(" 切片={:.4}", model.weights[(intercept_row, k)]));
    }
    Ok((summary, set.output(data, &predicted)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn separable() -> (DMatrix<f64>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..12 {
            let shift = if i < 6 { 0.0 } else { 4.0 };
            rows.extend_from_slice(&[shift + (i % 3) as f64 * 0.2, shift - (i % 2) as f64 * 0.3]);
            targets.push(usize::from(i >= 6));
        }
        (DMatrix::from_row_slice(12, 2, &rows), targets)
    }

    #[test]
    fn test_separable_classes_fit_perfectly() {
        let (x, targets) = separable();
        let model = fit(&x, &targets, 2, &LogisticParams::default()).unwrap();
        assert_eq!(model.predict(&x), targets);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, targets) = separable();
        let model = fit(&x, &targets, 2, &LogisticParams::default()).unwrap();
        let probs = model.predict_proba(&x);
        for i in 0..probs.nrows() {
            assert_relative_eq!(probs.row(i).sum(), 1.0, epsilon = 1e-12);
        }
        assert!(probs[(0, 0)] > 0.5);
        assert!(probs[(11, 1)] > 0.5);
    }

    #[test]
    fn test_stronger_penalty_shrinks_weights() {
        let (x, targets) = separable();
        let loose = fit(&x, &targets, 2, &LogisticParams::new().with_c(10.0)).unwrap();
        let tight = fit(&x, &targets, 2, &LogisticParams::new().with_c(0.01)).unwrap();
        let norm = |m: &LogisticModel| m.weights.rows(0, 2).norm();
        assert!(norm(&tight) < norm(&loose));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let (x, targets) = separable();
        assert!(fit(&x, &targets, 2, &LogisticParams::new().with_c(0.0)).is_err());
        assert!(fit(&x, &targets, 2, &LogisticParams::new().with_max_iterations(0)).is_err());
        assert!(fit(&x, &targets[..3], 2, &LogisticParams::default()).is_err());
    }
}
