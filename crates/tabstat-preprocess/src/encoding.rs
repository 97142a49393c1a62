//! Categorical encoding of text columns

use crate::config::Encoding;
use std::collections::BTreeSet;
use tabstat_core::{Column, Dataset, Result};

/// Encode every text column
///
/// One-hot keeps the untouched columns first, in table order, followed by
/// `{column}_{level}` indicator columns. Label encoding replaces each text
/// column in place with the index of its level in sorted order, or -1 for a
/// missing cell.
pub fn encode(data: &Dataset, method: Encoding) -> Result<Dataset> {
    match method {
        Encoding::None => Ok(data.clone()),
        Encoding::OneHot => one_hot(data),
        Encoding::Label => label(data),
    }
}

fn sorted_levels(cells: &[Option<String>]) -> Vec<&str> {
    cells
        .iter()
        .flatten()
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn one_hot(data: &Dataset) -> Result<Dataset> {
    let mut out = Dataset::new();
    let mut indicators = Vec::new();
    for column in data.columns() {
        match column.as_text() {
            None => out.push_column(column.clone())?,
            Some(cells) => {
                for level in sorted_levels(cells) {
                    let flags = cells
                        .iter()
                        .map(|c| if c.as_deref() == Some(level) { 1.0 } else { 0.0 })
                        .collect();
                    indicators.push(Column::numeric(format!("{}_{}", column.name(), level), flags));
                }
            }
        }
    }
    for column in indicators {
        out.push_column(column)?;
    }
    tracing::debug!(columns = out.n_columns(), "one-hot encoding");
    Ok(out)
}

fn label(data: &Dataset) -> Result<Dataset> {
    let mut out = data.clone();
    for column in data.columns() {
        let Some(cells) = column.as_text() else {
            continue;
        };
        let levels = sorted_levels(cells);
        let codes = cells
            .iter()
            .map(|cell| match cell {
                Some(s) => levels.iter().position(|l| *l == s.as_str()).map_or(-1.0, |i| i as f64),
                None => -1.0,
            })
            .collect();
        out.replace_column(Column::numeric(column.name(), codes))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_columns(vec![
            Column::text_opt(
                "color",
                vec![Some("red".into()), Some("blue".into()), None, Some("red".into())],
            ),
            Column::numeric("v", vec![1.0, 2.0, 3.0, 4.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_one_hot_columns() {
        let out = encode(&sample(), Encoding::OneHot).unwrap();
        assert_eq!(out.column_names(), vec!["v", "color_blue", "color_red"]);
        assert_eq!(out.numeric_values("color_red").unwrap(), vec![1.0, 0.0, 0.0, 1.0]);
        assert_eq!(out.numeric_values("color_blue").unwrap(), vec![0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_label_codes_sorted() {
        let out = encode(&sample(), Encoding::Label).unwrap();
        assert_eq!(out.column_names(), vec!["color", "v"]);
        assert_eq!(out.numeric_values("color").unwrap(), vec![1.0, 0.0, -1.0, 1.0]);
    }
}
