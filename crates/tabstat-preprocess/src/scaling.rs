//! Column-wise normalization and value transforms

use crate::config::{Normalization, Transform};
use tabstat_core::describe::{mean, std_dev};
use tabstat_core::{Column, Dataset, Result};

/// Apply `f` to the observed cells of every numeric column
///
/// `f` receives the observed values of the column and returns the mapping for
/// a single cell; a non-finite result becomes a missing cell.
pub(crate) fn map_numeric<F, G>(data: &Dataset, make: F) -> Result<Dataset>
where
    F: Fn(&[f64]) -> G,
    G: Fn(f64) -> f64,
{
    let mut out = data.clone();
    for name in data.numeric_column_names() {
        let cells = data.numeric(name)?;
        let observed: Vec<f64> = cells.iter().flatten().copied().filter(|x| !x.is_nan()).collect();
        let f = make(&observed);
        let mapped: Vec<Option<f64>> = cells
            .iter()
            .map(|cell| cell.map(&f).filter(|y| y.is_finite()))
            .collect();
        out.replace_column(Column::numeric_opt(name, mapped))?;
    }
    Ok(out)
}

/// Rescale every numeric column
///
/// Columns without spread map to 0.0.
pub fn normalize(data: &Dataset, method: Normalization) -> Result<Dataset> {
    match method {
        Normalization::None => Ok(data.clone()),
        Normalization::Standardize => map_numeric(data, |observed| {
            let m = mean(observed);
            let sd = std_dev(observed, 1);
            move |x: f64| if sd > 0.0 { (x - m) / sd } else { 0.0 }
        }),
        Normalization::MinMax => map_numeric(data, |observed| {
            let min = observed.iter().copied().fold(f64::INFINITY, f64::min);
            let max = observed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let range = max - min;
            move |x: f64| if range > 0.0 { (x - min) / range } else { 0.0 }
        }),
    }
}

/// Apply a value transform to every numeric column
///
/// Cells outside the transform's domain become missing.
pub fn transform(data: &Dataset, method: Transform) -> Result<Dataset> {
    match method {
        Transform::None => Ok(data.clone()),
        Transform::Log => map_numeric(data, |_| f64::ln_1p),
        Transform::Sqrt => map_numeric(data, |_| f64::sqrt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Dataset {
        Dataset::from_columns(vec![
            Column::text("g", vec!["a", "b", "c"]),
            Column::numeric("v", vec![1.0, 2.0, 3.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_standardize_uses_sample_std() {
        let out = normalize(&sample(), Normalization::Standardize).unwrap();
        let v = out.numeric_values("v").unwrap();
        assert_relative_eq!(v[0], -1.0);
        assert_relative_eq!(v[1], 0.0);
        assert_relative_eq!(v[2], 1.0);
        assert!(out.column("g").is_some());
    }

    #[test]
    fn test_minmax_bounds() {
        let out = normalize(&sample(), Normalization::MinMax).unwrap();
        assert_eq!(out.numeric_values("v").unwrap(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let ds = Dataset::from_columns(vec![Column::numeric("v", vec![4.0; 3])]).unwrap();
        let out = normalize(&ds, Normalization::MinMax).unwrap();
        assert_eq!(out.numeric_values("v").unwrap(), vec![0.0; 3]);
    }

    #[test]
    fn test_sqrt_of_negative_is_missing() {
        let ds = Dataset::from_columns(vec![Column::numeric("v", vec![4.0, -1.0])]).unwrap();
        let out = transform(&ds, Transform::Sqrt).unwrap();
        assert_eq!(out.numeric("v").unwrap(), &[Some(2.0), None]);
    }

    #[test]
    fn test_log1p() {
        let ds = Dataset::from_columns(vec![Column::numeric("v", vec![0.0, std::f64::consts::E - 1.0])])
            .unwrap();
        let out = transform(&ds, Transform::Log).unwrap();
        let v = out.numeric_values("v").unwrap();
        assert_relative_eq!(v[0], 0.0);
        assert_relative_eq!(v[1], 1.0, epsilon = 1e-12);
    }
}
