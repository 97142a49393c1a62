//! Principal component analysis on standardized features

use crate::features::Features;
use nalgebra::{DMatrix, DVector};
use tabstat_core::{columns, Column, Dataset, Error, Result};

/// Number of components projected for plotting
pub const N_COMPONENTS: usize = 2;

/// Fitted two-component PCA
#[derive(Debug, Clone)]
pub struct PcaFit {
    pub feature_names: Vec<String>,
    /// Loadings, one column per component
    pub loadings: DMatrix<f64>,
    pub explained_variance_ratio: Vec<f64>,
    /// Scores, one column per component
    pub scores: DMatrix<f64>,
}

/// Fit PCA via the SVD of the standardized feature matrix
///
/// Components are ordered by singular value. Each component's sign is fixed
/// so that its largest-magnitude loading is positive.
pub fn fit(features: &Features) -> Result<PcaFit> {
    features.require_samples(N_COMPONENTS)?;
    if features.n_features() < N_COMPONENTS {
        return Err(Error::InvalidInput(format!(
            "PCA needs at least {N_COMPONENTS} numeric columns, got {}",
            features.n_features()
        )));
    }

    let z = features.standardized();
    let svd = z.clone().svd(false, true);
    let v_t = svd
        .v_t
        .ok_or_else(|| Error::Computation("SVD did not produce right singular vectors".to_string()))?;
    let singular = svd.singular_values;

    let mut order: Vec<usize> = (0..singular.len()).collect();
    order.sort_by(|&a, &b| singular[b].total_cmp(&singular[a]));

    let total: f64 = singular.iter().map(|s| s * s).sum();
    if total <= 0.0 {
        return Err(Error::Computation("features have zero total variance".to_string()));
    }

    let p = features.n_features();
    let mut loadings = DMatrix::zeros(p, N_COMPONENTS);
    let mut ratios = Vec::with_capacity(N_COMPONENTS);
    for (k, &idx) in order.iter().take(N_COMPONENTS).enumerate() {
        let mut component: DVector<f64> = v_t.row(idx).transpose();
        let pivot = component
            .iter()
            .copied()
            .max_by(|a, b| a.abs().total_cmp(&b.abs()))
            .unwrap_or(0.0);
        if pivot < 0.0 {
            component.neg_mut();
        }
        loadings.set_column(k, &component);
        ratios.push(singular[idx] * singular[idx] / total);
    }

    let scores = &z * &loadings;
    Ok(PcaFit {
        feature_names: features.names.clone(),
        loadings,
        explained_variance_ratio: ratios,
        scores,
    })
}

/// Run PCA and lay the scores out for plotting
///
/// The first two components land in `x` and `y`; a `group` column is
/// carried over for the rows that were used.
pub fn analyze(data: &Dataset) -> Result<(String, Dataset)> {
    let features = Features::extract(data, &[columns::GROUP])?;
    let fit = fit(&features)?;

    let mut out = Dataset::from_columns(vec![
        Column::numeric(columns::X, fit.scores.column(0).iter().copied().collect()),
        Column::numeric(columns::Y, fit.scores.column(1).iter().copied().collect()),
    ])?;
    if let Some(group) = data.column(columns::GROUP) {
        out.push_column(group.take(&features.rows))?;
    }

    let mut summary = format!(
        "主成分分析 (PCA)\nサンプル数: {}\n寄与率: PC1 = {:.4}, PC2 = {:.4}\n累積寄与率: {:.4}\n負荷量:",
        features.n_samples(),
        fit.explained_variance_ratio[0],
        fit.explained_variance_ratio[1],
        fit.explained_variance_ratio.iter().sum::<f64>(),
    );
    for (i, name) in fit.feature_names.iter().enumerate() {
        summary.push_str(&format!(
            "\n  {name}: PC1 = {:.4}, PC2 = {:.4}",
            fit.loadings[(i, 0)],
            fit.loadings[(i, 1)]
        ));
    }
    Ok((summary, out))
}
