//! Shared setup for the classifiers of the `group` column

use crate::features::Features;
use nalgebra::DMatrix;
use tabstat_core::{columns, Column, Dataset, Error, Level, Result};

/// Complete feature rows that carry a `group` label
#[derive(Debug, Clone)]
pub struct LabelledSet {
    pub names: Vec<String>,
    /// Dataset rows used for training
    pub rows: Vec<usize>,
    pub x: DMatrix<f64>,
    /// Distinct labels in sorted order
    pub classes: Vec<Level>,
    /// Index into `classes` for every row of `x`
    pub targets: Vec<usize>,
}

impl LabelledSet {
    /// Numeric features (everything but `group`) with their labels
    ///
    /// Fails without a `group` column, with fewer than two labelled rows or
    /// with a single class.
    pub fn extract(data: &Dataset) -> Result<Self> {
        let group = data.require(columns::GROUP)?;
        let features = Features::extract(data, &[columns::GROUP])?;
        let labelled: Vec<usize> = (0..features.n_samples())
            .filter(|&i| group.level_at(features.rows[i]).is_some())
            .collect();
        if labelled.len() < 2 {
            return Err(Error::InsufficientData {
                expected: 2,
                actual: labelled.len(),
            });
        }
        let rows: Vec<usize> = labelled.iter().map(|&i| features.rows[i]).collect();
        let labels: Vec<Level> = rows.iter().filter_map(|&r| group.level_at(r)).collect();

        let mut classes = labels.clone();
        classes.sort();
        classes.dedup();
        if classes.len() < 2 {
            return Err(Error::InsufficientGroups {
                column: columns::GROUP.to_string(),
                expected: 2,
                actual: classes.len(),
            });
        }
        let targets = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or_default())
            .collect();

        Ok(Self {
            names: features.names,
            x: features.matrix.select_rows(labelled.iter()),
            rows,
            classes,
            targets,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.targets.len()
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Label of every training row
    pub fn labels(&self) -> Vec<Level> {
        self.targets.iter().map(|&t| self.classes[t].clone()).collect()
    }

    /// Fraction of rows whose predicted class index matches the label
    pub fn accuracy(&self, predicted: &[usize]) -> f64 {
        if self.targets.is_empty() {
            return 0.0;
        }
        let correct = predicted
            .iter()
            .zip(&self.targets)
            .filter(|(p, t)| p == t)
            .count();
        correct as f64 / self.targets.len() as f64
    }

    /// Training rows as features, `group` and a `predicted` label column
    pub fn output(&self, data: &Dataset, predicted: &[usize]) -> Result<Dataset> {
        let mut out = Dataset::new();
        for name in &self.names {
            if let Some(column) = data.column(name) {
                out.push_column(column.take(&self.rows))?;
            }
        }
        out.push_column(data.require(columns::GROUP)?.take(&self.rows))?;
        out.push_column(Column::text(
            "predicted",
            predicted
                .iter()
                .map(|&c| self.classes[c].to_string())
                .collect(),
        ))?;
        Ok(out)
    }

    /// Summary lines shared by every classifier
    pub fn describe(&self, predicted: &[usize]) -> String {
        format!(
            "サンプル数: {}\nクラス数: {}\n正解率 (学習データ): {:.4}",
            self.n_samples(),
            self.n_classes(),
            self.accuracy(predicted)
        )
    }
}

/// Index of the largest score, lowest index on ties
pub(crate) fn argmax(scores: impl IntoIterator<Item = f64>) -> usize {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, score) in scores.into_iter().enumerate() {
        if score > best.1 {
            best = (i, score);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled() -> Dataset {
        Dataset::from_columns(vec![
            Column::text_opt(
                columns::GROUP,
                vec![
                    Some("b".to_string()),
                    Some("a".to_string()),
                    None,
                    Some("b".to_string()),
                ],
            ),
            Column::numeric_opt("f", vec![Some(1.0), Some(2.0), Some(3.0), None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_extract_keeps_labelled_complete_rows() {
        let set = LabelledSet::extract(&labelled()).unwrap();
        assert_eq!(set.rows, vec![0, 1]);
        assert_eq!(set.classes, vec![Level::from("a"), Level::from("b")]);
        assert_eq!(set.targets, vec![1, 0]);
        assert_eq!(set.accuracy(&[1, 1]), 0.5);
    }

    #[test]
    fn test_output_carries_predictions() {
        let data = labelled();
        let set = LabelledSet::extract(&data).unwrap();
        let out = set.output(&data, &[1, 0]).unwrap();
        let predicted = out.require("predicted").unwrap().as_text().unwrap();
        assert_eq!(predicted[0].as_deref(), Some("b"));
        assert_eq!(predicted[1].as_deref(), Some("a"));
    }

    #[test]
    fn test_argmax_prefers_first_on_ties() {
        assert_eq!(argmax([1.0, 3.0, 3.0]), 1);
        assert_eq!(argmax(Vec::new()), 0);
    }
}
