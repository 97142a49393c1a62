//! Gaussian naive Bayes classification of the `group` column

use crate::classify::LabelledSet;
use nalgebra::DMatrix;
use tabstat_core::{columns, Dataset, Error, Level, Result};

/// Fraction of the largest feature variance added to every class variance
pub const VAR_SMOOTHING: f64 = 1e-9;

/// Per-class Gaussian parameters
#[derive(Debug, Clone)]
pub struct GaussianNb {
    pub classes: Vec<Level>,
    pub priors: Vec<f64>,
    /// Class means, one row per class
    pub means: DMatrix<f64>,
    /// Smoothed class variances, one row per class
    pub variances: DMatrix<f64>,
}

impl GaussianNb {
    /// Fit on a feature matrix with one label per row
    pub fn fit(x: &DMatrix<f64>, labels: &[Level]) -> Result<Self> {
        if x.nrows() != labels.len() {
            return Err(Error::size_mismatch(x.nrows(), labels.len(), "naive Bayes labels"));
        }
        let mut classes: Vec<Level> = labels.to_vec();
        classes.sort();
        classes.dedup();
        if classes.len() < 2 {
            return Err(Error::InsufficientGroups {
                column: columns::GROUP.to_string(),
                expected: 2,
                actual: classes.len(),
            });
        }

        let n = x.nrows() as f64;
        let p = x.ncols();
        let epsilon = VAR_SMOOTHING
            * x.column_iter()
                .map(|c| {
                    let mean = c.mean();
                    c.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
                })
                .fold(0.0, f64::max);

        let k = classes.len();
        let mut means = DMatrix::zeros(k, p);
        let mut variances = DMatrix::zeros(k, p);
        let mut priors = Vec::with_capacity(k);
        for (c, class) in classes.iter().enumerate() {
            let rows: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, l)| *l == class)
                .map(|(i, _)| i)
                .collect();
            let count = rows.len() as f64;
            priors.push(count / n);
            for j in 0..p {
                let mean = rows.iter().map(|&i| x[(i, j)]).sum::<f64>() / count;
                let var = rows.iter().map(|&i| (x[(i, j)] - mean).powi(2)).sum::<f64>() / count;
                means[(c, j)] = mean;
                variances[(c, j)] = var + epsilon;
            }
        }
        if variances.iter().any(|&v| v <= 0.0) {
            return Err(Error::Computation(
                "every feature is constant within its class".to_string(),
            ));
        }

        Ok(Self {
            classes,
            priors,
            means,
            variances,
        })
    }

    fn joint_log_likelihood(&self, x: &DMatrix<f64>, row: usize, c: usize) -> f64 {
        let mut total = self.priors[c].ln();
        for j in 0..x.ncols() {
            let var = self.variances[(c, j)];
            let diff = x[(row, j)] - self.means[(c, j)];
            total -= 0.5 * (2.0 * std::f64::consts::PI * var).ln() + diff * diff / (2.0 * var);
        }
        total
    }

    /// Most probable class index for each row
    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<usize> {
        (0..x.nrows())
            .map(|i| {
                (0..self.classes.len())
                    .map(|c| (c, self.joint_log_likelihood(x, i, c)))
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .map_or(0, |(c, _)| c)
            })
            .collect()
    }
}

/// Train on every labelled row and report the training accuracy
pub fn analyze(data: &Dataset) -> Result<(String, Dataset)> {
    let set = LabelledSet::extract(data)?;
    let model = GaussianNb::fit(&set.x, &set.labels())?;
    let predicted = model.predict(&set.x);

    let mut summary = format!("ナイーブベイズ\n{}\n事前確率:", set.describe(&predicted));
    for (class, prior) in model.classes.iter().zip(&model.priors) {
        summary.push_str(&format!("\n  {class}: {prior:.4}"));
    }
    Ok((summary, set.output(data, &predicted)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabstat_core::Column;

    fn two_classes() -> Dataset {
        let f1: Vec<f64> = (0..20)
            .map(|i| if i < 10 { i as f64 * 0.1 } else { 5.0 + i as f64 * 0.1 })
            .collect();
        let f2: Vec<f64> = (0..20).map(|i| ((i * 3) % 4) as f64).collect();
        let group: Vec<&str> = (0..20).map(|i| if i < 10 { "A" } else { "B" }).collect();
        Dataset::from_columns(vec![
            Column::text(columns::GROUP, group),
            Column::numeric("f1", f1),
            Column::numeric("f2", f2),
        ])
        .unwrap()
    }

    #[test]
    fn test_separable_classes_fit_perfectly() {
        let (summary, out) = analyze(&two_classes()).unwrap();
        assert!(summary.contains("正解率 (学習データ): 1.0000"));
        let predicted = out.require("predicted").unwrap().as_text().unwrap();
        assert_eq!(predicted[0].as_deref(), Some("A"));
        assert_eq!(predicted[19].as_deref(), Some("B"));
    }

    #[test]
    fn test_priors_follow_class_frequencies() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 0.1, 0.2, 5.0]);
        let labels = vec![Level::from("a"), Level::from("a"), Level::from("a"), Level::from("b")];
        let model = GaussianNb::fit(&x, &labels).unwrap();
        assert_eq!(model.priors, vec![0.75, 0.25]);
    }

    #[test]
    fn test_single_class_rejected() {
        let x = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        let labels = vec![Level::from("a"), Level::from("a")];
        assert!(GaussianNb::fit(&x, &labels).is_err());
    }

    #[test]
    fn test_requires_group_column() {
        let ds = Dataset::from_columns(vec![Column::numeric("f", vec![1.0, 2.0])]).unwrap();
        assert!(analyze(&ds).is_err());
    }
}
