//! Ordinary least squares regression

use crate::features::Features;
use nalgebra::{DMatrix, DVector};
use tabstat_core::{columns, Column, Dataset, Error, Result};

/// Fitted linear model
#[derive(Debug, Clone)]
pub struct RegressionFit {
    pub target: String,
    pub feature_names: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    pub observed: Vec<f64>,
    pub predicted: Vec<f64>,
    pub r_squared: f64,
    pub mse: f64,
}

/// Column the model predicts: `y` when present, otherwise `value`
pub fn target_column(data: &Dataset) -> Result<&'static str> {
    [columns::Y, columns::VALUE]
        .into_iter()
        .find(|name| data.column(name).is_some_and(|c| c.is_numeric()))
        .ok_or_else(|| Error::MissingColumn(format!("{} or {}", columns::Y, columns::VALUE)))
}

/// Least squares with an intercept, solved through the SVD
pub fn fit(data: &Dataset) -> Result<RegressionFit> {
    let target = target_column(data)?;
    let features = Features::extract(data, &[columns::GROUP])?;
    let Some(target_idx) = features.names.iter().position(|n| n == target) else {
        return Err(Error::MissingColumn(target.to_string()));
    };
    let p = features.n_features() - 1;
    if p == 0 {
        return Err(Error::InvalidInput(
            "linear regression needs at least one predictor column".to_string(),
        ));
    }
    features.require_samples(p + 2)?;

    let n = features.n_samples();
    let predictors: Vec<usize> = (0..features.n_features()).filter(|&j| j != target_idx).collect();
    let x = DMatrix::from_fn(n, p + 1, |i, j| {
        if j == 0 {
            1.0
        } else {
            features.matrix[(i, predictors[j - 1])]
        }
    });
    let y: DVector<f64> = features.matrix.column(target_idx).into_owned();

    let svd = x.clone().svd(true, true);
    let tol = 1e-10 * svd.singular_values.max().max(1.0);
    let beta = svd
        .solve(&y, tol)
        .map_err(|e| Error::Computation(format!("least squares failed: {e}")))?;

    let fitted = &x * &beta;
    let mean = y.mean();
    let ss_res = (&y - &fitted).norm_squared();
    let ss_tot = y.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { f64::NAN };

    Ok(RegressionFit {
        target: target.to_string(),
        feature_names: predictors.iter().map(|&j| features.names[j].clone()).collect(),
        intercept: beta[0],
        coefficients: beta.iter().skip(1).copied().collect(),
        observed: y.iter().copied().collect(),
        predicted: fitted.iter().copied().collect(),
        r_squared,
        mse: ss_res / n as f64,
    })
}

/// Fit and lay out observed (`x`) against predicted (`y`) values
pub fn analyze(data: &Dataset) -> Result<(String, Dataset)> {
    let fit = fit(data)?;
    let residuals: Vec<f64> = fit
        .observed
        .iter()
        .zip(&fit.predicted)
        .map(|(o, p)| o - p)
        .collect();
    let out = Dataset::from_columns(vec![
        Column::numeric(columns::X, fit.observed.clone()),
        Column::numeric(columns::Y, fit.predicted.clone()),
        Column::numeric("residual", residuals),
    ])?;

    let mut summary = format!(
        "線形回帰\n目的変数: {}\n切片: {:.4}\n係数:",
        fit.target, fit.intercept
    );
    for (name, coef) in fit.feature_names.iter().zip(&fit.coefficients) {
        summary.push_str(&format!("\n  {name}: {coef:.4}"));
    }
    summary.push_str(&format!(
        "\n決定係数 (R²): {:.4}\n平均二乗誤差 (MSE): {:.4}",
        fit.r_squared, fit.mse
    ));
    Ok((summary, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_recovers_exact_plane() {
        let a: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..12).map(|i| ((i * 5) % 7) as f64).collect();
        let y: Vec<f64> = a.iter().zip(&b).map(|(a, b)| 1.5 + 2.0 * a - 0.5 * b).collect();
        let ds = Dataset::from_columns(vec![
            Column::numeric("a", a),
            Column::numeric("b", b),
            Column::numeric(columns::Y, y),
        ])
        .unwrap();
        let fit = fit(&ds).unwrap();
        assert_eq!(fit.feature_names, vec!["a", "b"]);
        assert_relative_eq!(fit.intercept, 1.5, epsilon = 1e-8);
        assert_relative_eq!(fit.coefficients[0], 2.0, epsilon = 1e-8);
        assert_relative_eq!(fit.coefficients[1], -0.5, epsilon = 1e-8);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-10);
        assert!(fit.mse < 1e-12);
    }

    #[test]
    fn test_falls_back_to_value_target() {
        let ds = Dataset::from_columns(vec![
            Column::numeric(columns::X, vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            Column::numeric(columns::VALUE, vec![2.1, 3.9, 6.2, 7.8, 10.1]),
        ])
        .unwrap();
        let (summary, out) = analyze(&ds).unwrap();
        assert!(summary.contains("目的変数: value"));
        assert_eq!(out.column_names(), vec!["x", "y", "residual"]);
    }

    #[test]
    fn test_requires_predictor() {
        let ds = Dataset::from_columns(vec![Column::numeric(columns::Y, vec![1.0, 2.0, 3.0])])
            .unwrap();
        assert!(fit(&ds).is_err());
    }
}
