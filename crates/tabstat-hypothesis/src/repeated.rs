//! One-way repeated-measures ANOVA (`subject` x `time`)

use crate::distribution::f_sf;
use crate::table::{fmt_num, TableStyle, TextTable};
use std::collections::BTreeMap;
use std::fmt;
use tabstat_core::describe::mean;
use tabstat_core::{columns, Dataset, Error, Level, Result, SIGNIFICANCE_LEVEL};

/// Within-subject effect of `time`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepeatedMeasuresAnova {
    pub f: f64,
    pub num_df: f64,
    pub den_df: f64,
    pub p_value: f64,
}

impl RepeatedMeasuresAnova {
    pub fn is_significant(&self) -> bool {
        self.p_value < SIGNIFICANCE_LEVEL
    }
}

impl fmt::Display for RepeatedMeasuresAnova {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = TextTable::new(TableStyle::Ruled, vec!["", "F Value", "Num DF", "Den DF", "Pr > F"])
            .with_title("Anova");
        table.push_row(vec![
            columns::TIME.to_string(),
            fmt_num(self.f, 4),
            fmt_num(self.num_df, 4),
            fmt_num(self.den_df, 4),
            fmt_num(self.p_value, 4),
        ]);
        write!(f, "{table}")
    }
}

/// Fit the repeated-measures model on `value` with `subject` and `time`
///
/// The design must be balanced: every subject has exactly one observed
/// value for every time level.
pub fn repeated_measures_anova(data: &Dataset) -> Result<RepeatedMeasuresAnova> {
    let subjects = data.levels(columns::SUBJECT)?;
    let times = data.levels(columns::TIME)?;
    let values = data.numeric(columns::VALUE)?;

    let mut cells: BTreeMap<Level, BTreeMap<Level, Vec<f64>>> = BTreeMap::new();
    let mut time_levels = std::collections::BTreeSet::new();
    for ((subject, time), value) in subjects.into_iter().zip(times).zip(values) {
        let (Some(subject), Some(time), Some(value)) = (subject, time, value) else {
            return Err(Error::InvalidInput(
                "repeated measures data must not contain missing cells".into(),
            ));
        };
        time_levels.insert(time.clone());
        cells.entry(subject).or_default().entry(time).or_default().push(*value);
    }

    let k = time_levels.len();
    let n = cells.len();
    if k < 2 {
        return Err(Error::InsufficientGroups {
            column: columns::TIME.to_string(),
            expected: 2,
            actual: k,
        });
    }
    if n < 2 {
        return Err(Error::InsufficientGroups {
            column: columns::SUBJECT.to_string(),
            expected: 2,
            actual: n,
        });
    }

    // subject x time matrix
    let mut matrix = Vec::with_capacity(n);
    for (subject, by_time) in &cells {
        let mut row = Vec::with_capacity(k);
        for time in &time_levels {
            match by_time.get(time).map(Vec::as_slice) {
                Some([value]) => row.push(*value),
                _ => {
                    return Err(Error::InvalidInput(format!(
                        "data is unbalanced: subject {subject} needs exactly one value at time {time}"
                    )))
                }
            }
        }
        matrix.push(row);
    }

    let all: Vec<f64> = matrix.iter().flatten().copied().collect();
    let grand = mean(&all);
    let (nf, kf) = (n as f64, k as f64);
    let ss_time: f64 = (0..k)
        .map(|j| {
            let col: Vec<f64> = matrix.iter().map(|r| r[j]).collect();
            (mean(&col) - grand).powi(2)
        })
        .sum::<f64>()
        * nf;
    let ss_subject: f64 = matrix.iter().map(|r| (mean(r) - grand).powi(2)).sum::<f64>() * kf;
    let ss_total: f64 = all.iter().map(|x| (x - grand).powi(2)).sum();
    let ss_error = ss_total - ss_time - ss_subject;

    let num_df = kf - 1.0;
    let den_df = (kf - 1.0) * (nf - 1.0);
    if ss_error <= 0.0 {
        return Err(Error::Computation(
            "F statistic undefined: residual variance is zero".into(),
        ));
    }
    let f = (ss_time / num_df) / (ss_error / den_df);
    let p_value = f_sf(f, num_df, den_df)?;
    tracing::debug!(subjects = n, times = k, f, p_value, "repeated measures fit");
    Ok(RepeatedMeasuresAnova {
        f,
        num_df,
        den_df,
        p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tabstat_core::Column;

    fn sample() -> Dataset {
        Dataset::from_columns(vec![
            Column::numeric("subject", vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0]),
            Column::text("time", vec!["t1", "t2", "t3", "t1", "t2", "t3", "t1", "t2", "t3"]),
            Column::numeric("value", vec![1.0, 2.0, 4.0, 2.0, 3.0, 4.0, 3.0, 5.0, 6.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_rm_anova() {
        // grand mean 10/3; time means 2, 10/3, 14/3; subject means 7/3, 3, 14/3
        let r = repeated_measures_anova(&sample()).unwrap();
        assert_relative_eq!(r.num_df, 2.0);
        assert_relative_eq!(r.den_df, 4.0);
        // ss_time = 3 * (16 + 0 + 16) / 9 = 32/3, ss_subject = 3 * (1 + 1/9 + 16/9) = 26/3,
        // ss_total = 20, ss_error = 2/3; F = (16/3) / (1/6) = 32
        assert_relative_eq!(r.f, 32.0, epsilon = 1e-9);
        assert!(r.is_significant());
        assert!(r.to_string().contains("Pr > F"));
    }

    #[test]
    fn test_unbalanced_rejected() {
        let mut ds = sample().take_rows(&[0, 1, 2, 3, 4, 5, 6, 7]);
        assert!(repeated_measures_anova(&ds).is_err());
        ds = sample();
        assert!(ds.remove_column("subject").is_some());
        assert!(matches!(
            repeated_measures_anova(&ds),
            Err(Error::MissingColumn(_))
        ));
    }
}
