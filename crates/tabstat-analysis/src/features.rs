//! Feature matrix extraction

use nalgebra::DMatrix;
use tabstat_core::{Dataset, Error, Result};

/// Complete-case design matrix over the numeric columns not in `exclude`
#[derive(Debug, Clone)]
pub struct Features {
    pub names: Vec<String>,
    /// Dataset rows that made it into the matrix
    pub rows: Vec<usize>,
    pub matrix: DMatrix<f64>,
}

impl Features {
    pub fn extract(data: &Dataset, exclude: &[&str]) -> Result<Self> {
        let names: Vec<String> = data
            .numeric_column_names()
            .into_iter()
            .filter(|name| !exclude.contains(name))
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            return Err(Error::InvalidInput("no numeric feature columns".to_string()));
        }
        let cells = names
            .iter()
            .map(|name| data.numeric(name))
            .collect::<Result<Vec<_>>>()?;
        let rows: Vec<usize> = (0..data.n_rows())
            .filter(|&row| cells.iter().all(|c| c[row].is_some_and(|v| v.is_finite())))
            .collect();
        let matrix = DMatrix::from_fn(rows.len(), names.len(), |i, j| {
            cells[j][rows[i]].unwrap_or_default()
        });
        Ok(Self {
            names,
            rows,
            matrix,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.matrix.ncols()
    }

    /// Require at least `n` complete rows
    pub fn require_samples(&self, n: usize) -> Result<()> {
        if self.n_samples() < n {
            return Err(Error::InsufficientData {
                expected: n,
                actual: self.n_samples(),
            });
        }
        Ok(())
    }

    /// Columns scaled to zero mean and unit population variance
    ///
    /// Constant columns are only centered.
    pub fn standardized(&self) -> DMatrix<f64> {
        Scaler::fit(&self.matrix).transform(&self.matrix)
    }
}

/// Per-column centering and scaling learned from a training matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Scaler {
    pub means: Vec<f64>,
    /// Population standard deviations; 1 for constant columns
    pub scales: Vec<f64>,
}

impl Scaler {
    pub fn fit(x: &DMatrix<f64>) -> Self {
        let n = x.nrows().max(1) as f64;
        let (means, scales): (Vec<f64>, Vec<f64>) = x
            .column_iter()
            .map(|column| {
                let mean = column.sum() / n;
                let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let sd = var.sqrt();
                (mean, if sd > 0.0 { sd } else { 1.0 })
            })
            .unzip();
        Self { means, scales }
    }

    pub fn transform(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| {
            (x[(i, j)] - self.means[j]) / self.scales[j]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tabstat_core::{columns, Column};

    #[test]
    fn test_extract_skips_incomplete_rows() {
        let ds = Dataset::from_columns(vec![
            Column::text(columns::GROUP, vec!["a", "b", "c"]),
            Column::numeric_opt("f1", vec![Some(1.0), None, Some(3.0)]),
            Column::numeric("f2", vec![2.0, 4.0, 6.0]),
        ])
        .unwrap();
        let features = Features::extract(&ds, &[]).unwrap();
        assert_eq!(features.names, vec!["f1", "f2"]);
        assert_eq!(features.rows, vec![0, 2]);
        assert_relative_eq!(features.matrix[(1, 1)], 6.0);
    }

    #[test]
    fn test_standardized_columns() {
        let ds = Dataset::from_columns(vec![Column::numeric("f", vec![1.0, 2.0, 3.0])]).unwrap();
        let z = Features::extract(&ds, &[]).unwrap().standardized();
        assert_relative_eq!(z.column(0).sum(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(z.column(0).norm_squared() / 3.0, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_scaler_centers_constant_columns() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 5.0, 2.0, 5.0, 3.0, 5.0]);
        let scaler = Scaler::fit(&x);
        assert_eq!(scaler.scales[1], 1.0);
        let z = scaler.transform(&x);
        assert!(z.column(1).iter().all(|&v| v == 0.0));
        assert_relative_eq!(z[(2, 0)], 1.5f64.sqrt(), epsilon = 1e-12);
    }
}
