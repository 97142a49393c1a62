//! Row-wise outlier removal over every numeric column

use crate::config::OutlierMethod;
use tabstat_core::describe::{mean, quantile_sorted, sorted, std_dev};
use tabstat_core::{Dataset, Result};

/// Drop rows flagged by `method` in any numeric column
///
/// Missing cells never flag a row. A column without spread flags nothing.
pub fn remove_outliers(data: &Dataset, method: OutlierMethod, threshold: f64) -> Result<Dataset> {
    if method == OutlierMethod::None {
        return Ok(data.clone());
    }

    let mut keep = vec![true; data.n_rows()];
    for name in data.numeric_column_names() {
        let cells = data.numeric(name)?;
        let observed: Vec<f64> = cells.iter().flatten().copied().filter(|x| !x.is_nan()).collect();
        if observed.is_empty() {
            continue;
        }

        let flag: Box<dyn Fn(f64) -> bool> = if method == OutlierMethod::ZScore {
            let m = mean(&observed);
            let sd = std_dev(&observed, 0);
            if sd.is_nan() || sd <= 0.0 {
                continue;
            }
            Box::new(move |x| ((x - m) / sd).abs() >= threshold)
        } else {
            let s = sorted(&observed)?;
            let q1 = quantile_sorted(&s, 0.25);
            let q3 = quantile_sorted(&s, 0.75);
            let iqr = q3 - q1;
            let (lo, hi) = (q1 - threshold * iqr, q3 + threshold * iqr);
            Box::new(move |x| x < lo || x > hi)
        };

        for (row, cell) in cells.iter().enumerate() {
            if let Some(x) = cell {
                if !x.is_nan() && flag(*x) {
                    keep[row] = false;
                }
            }
        }
    }

    let removed = keep.iter().filter(|k| !**k).count();
    tracing::debug!(?method, threshold, removed, "outlier removal");
    data.filter_rows(&keep)
}
