//! Missing value handling

use crate::config::MissingValues;
use tabstat_core::describe::{mean, median};
use tabstat_core::{Cell, Dataset, Result};

/// Drop incomplete rows or fill numeric gaps
///
/// Filling only touches numeric columns; gaps in text columns are left as is.
pub fn handle_missing(data: &Dataset, method: MissingValues) -> Result<Dataset> {
    match method {
        MissingValues::None => Ok(data.clone()),
        MissingValues::Drop => {
            let keep: Vec<bool> = (0..data.n_rows())
                .map(|row| {
                    data.columns()
                        .iter()
                        .all(|c| !matches!(c.cell(row), Cell::Missing))
                })
                .collect();
            data.filter_rows(&keep)
        }
        MissingValues::Mean => fill(data, |observed| Ok(mean(observed))),
        MissingValues::Median => fill(data, median),
    }
}

fn fill(data: &Dataset, statistic: impl Fn(&[f64]) -> Result<f64>) -> Result<Dataset> {
    let mut fills = Vec::new();
    for name in data.numeric_column_names() {
        let observed: Vec<f64> = data
            .numeric_values(name)?
            .into_iter()
            .filter(|x| !x.is_nan())
            .collect();
        let value = if observed.is_empty() { None } else { Some(statistic(&observed)?) };
        fills.push(value);
    }

    let mut fills = fills.into_iter();
    let mut out = data.clone();
    for name in data.numeric_column_names() {
        let value = fills.next().flatten();
        let cells: Vec<Option<f64>> = data
            .numeric(name)?
            .iter()
            .map(|cell| match cell {
                Some(x) if !x.is_nan() => Some(*x),
                _ => value,
            })
            .collect();
        out.replace_column(tabstat_core::Column::numeric_opt(name, cells))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabstat_core::Column;

    fn sample() -> Dataset {
        Dataset::from_columns(vec![
            Column::text_opt(
                "g",
                vec![Some("a".into()), None, Some("b".into()), Some("b".into())],
            ),
            Column::numeric_opt("v", vec![Some(1.0), Some(2.0), None, Some(9.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_drop_removes_any_incomplete_row() {
        let out = handle_missing(&sample(), MissingValues::Drop).unwrap();
        assert_eq!(out.n_rows(), 2);
        assert_eq!(out.numeric_values("v").unwrap(), vec![1.0, 9.0]);
    }

    #[test]
    fn test_mean_fill() {
        let out = handle_missing(&sample(), MissingValues::Mean).unwrap();
        assert_eq!(out.numeric("v").unwrap()[2], Some(4.0));
        // text gaps untouched
        assert_eq!(out.column("g").unwrap().missing_count(), 1);
    }

    #[test]
    fn test_median_fill() {
        let out = handle_missing(&sample(), MissingValues::Median).unwrap();
        assert_eq!(out.numeric("v").unwrap()[2], Some(2.0));
    }
}
