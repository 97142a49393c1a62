//! Pairwise post-hoc comparisons after an omnibus test
//!
//! Every procedure compares all pairs of groups in sorted level order and
//! renders a table of the pairs. The family-wise error rate is 0.05.

use crate::distribution::{f_sf, qtukey, tukey_sf};
use crate::multi_sample::anova_partition;
use crate::table::{fmt_num, TableStyle, TextTable};
use crate::traits::TwoSampleTest;
use crate::two_sample::IndependentT;
use tabstat_core::describe::{mean, variance};
use tabstat_core::{Error, Level, Result, SIGNIFICANCE_LEVEL};

/// Groups in comparison order, each with its observed values
pub type Groups = [(Level, Vec<f64>)];

fn reject_label(reject: bool) -> String {
    (if reject { "True" } else { "False" }).to_string()
}

fn require_groups(groups: &Groups) -> Result<()> {
    if groups.len() < 2 {
        return Err(Error::InvalidInput(format!(
            "at least 2 groups are required for pairwise comparisons, got {}",
            groups.len()
        )));
    }
    if let Some((level, _)) = groups.iter().find(|(_, v)| v.is_empty()) {
        return Err(Error::InvalidInput(format!("group {level} has no observations")));
    }
    Ok(())
}

fn pairs(k: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..k).flat_map(move |i| (i + 1..k).map(move |j| (i, j)))
}

/// Pooled within-group mean square and its degrees of freedom
fn pooled_error(groups: &Groups) -> Result<(f64, f64)> {
    let samples: Vec<Vec<f64>> = groups.iter().map(|(_, v)| v.clone()).collect();
    let n: usize = samples.iter().map(Vec::len).sum();
    let df = (n - samples.len()) as f64;
    if df < 2.0 {
        return Err(Error::InsufficientData {
            expected: samples.len() + 2,
            actual: n,
        });
    }
    let (_, within) = anova_partition(&samples);
    Ok((within / df, df))
}

fn range_table(title: &str) -> TextTable {
    TextTable::new(
        TableStyle::Ruled,
        vec!["group1", "group2", "meandiff", "p-adj", "lower", "upper", "reject"],
    )
    .with_title(format!("Multiple Comparison of Means - {title}, FWER=0.05"))
}

/// Tukey's honestly significant difference
pub fn tukey_hsd(groups: &Groups) -> Result<TextTable> {
    require_groups(groups)?;
    let k = groups.len();
    let (mse, df) = pooled_error(groups)?;
    let crit = qtukey(1.0 - SIGNIFICANCE_LEVEL, k, df)?;

    let mut table = range_table("Tukey HSD");
    for (i, j) in pairs(k) {
        let (li, vi) = &groups[i];
        let (lj, vj) = &groups[j];
        let diff = mean(vj) - mean(vi);
        let se = (mse / 2.0 * (1.0 / vi.len() as f64 + 1.0 / vj.len() as f64)).sqrt();
        let p = tukey_sf(diff.abs() / se, k, df)?;
        table.push_row(vec![
            li.to_string(),
            lj.to_string(),
            fmt_num(diff, 4),
            fmt_num(p, 4),
            fmt_num(diff - crit * se, 4),
            fmt_num(diff + crit * se, 4),
            reject_label(p < SIGNIFICANCE_LEVEL),
        ]);
    }
    Ok(table)
}

/// Games-Howell comparisons with Welch degrees of freedom per pair
pub fn games_howell(groups: &Groups) -> Result<TextTable> {
    require_groups(groups)?;
    let k = groups.len();
    let mut table = range_table("Games-Howell");
    for (i, j) in pairs(k) {
        let (li, vi) = &groups[i];
        let (lj, vj) = &groups[j];
        if vi.len() < 2 || vj.len() < 2 {
            return Err(Error::InsufficientData {
                expected: 2,
                actual: vi.len().min(vj.len()),
            });
        }
        let (ni, nj) = (vi.len() as f64, vj.len() as f64);
        let (ai, aj) = (variance(vi, 1) / ni, variance(vj, 1) / nj);
        let df = (ai + aj).powi(2) / (ai * ai / (ni - 1.0) + aj * aj / (nj - 1.0));
        let se = ((ai + aj) / 2.0).sqrt();
        if se == 0.0 {
            return Err(Error::Computation(format!(
                "groups {li} and {lj} both have zero variance"
            )));
        }
        let diff = mean(vj) - mean(vi);
        let p = tukey_sf(diff.abs() / se, k, df)?;
        let crit = qtukey(1.0 - SIGNIFICANCE_LEVEL, k, df)?;
        table.push_row(vec![
            li.to_string(),
            lj.to_string(),
            fmt_num(diff, 4),
            fmt_num(p, 4),
            fmt_num(diff - crit * se, 4),
            fmt_num(diff + crit * se, 4),
            reject_label(p < SIGNIFICANCE_LEVEL),
        ]);
    }
    Ok(table)
}

/// Scheffé's method for all pairwise contrasts
pub fn scheffe(groups: &Groups) -> Result<TextTable> {
    require_groups(groups)?;
    let k = groups.len();
    let (mse, df) = pooled_error(groups)?;
    let mut table = TextTable::new(
        TableStyle::Ruled,
        vec!["group1", "group2", "meandiff", "F", "p-adj", "reject"],
    )
    .with_title("Multiple Comparison of Means - Scheffe, FWER=0.05");

    for (i, j) in pairs(k) {
        let (li, vi) = &groups[i];
        let (lj, vj) = &groups[j];
        let diff = mean(vj) - mean(vi);
        let contrast_var = mse * (1.0 / vi.len() as f64 + 1.0 / vj.len() as f64);
        let f = diff * diff / contrast_var / (k as f64 - 1.0);
        let p = f_sf(f, k as f64 - 1.0, df)?;
        table.push_row(vec![
            li.to_string(),
            lj.to_string(),
            fmt_num(diff, 4),
            fmt_num(f, 4),
            fmt_num(p, 4),
            reject_label(p < SIGNIFICANCE_LEVEL),
        ]);
    }
    Ok(table)
}

/// Family-wise correction applied to pairwise t-test p-values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    Bonferroni,
    Holm,
}

impl Correction {
    fn method_name(&self) -> &'static str {
        match self {
            Self::Bonferroni => "bonf",
            Self::Holm => "holm",
        }
    }

    /// Corrected p-values, in input order
    pub fn adjust(&self, p_values: &[f64]) -> Vec<f64> {
        let m = p_values.len() as f64;
        match self {
            Self::Bonferroni => p_values.iter().map(|p| (p * m).min(1.0)).collect(),
            Self::Holm => {
                let mut order: Vec<usize> = (0..p_values.len()).collect();
                order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));
                let mut adjusted = vec![0.0; p_values.len()];
                let mut running = 0.0f64;
                for (rank, &idx) in order.iter().enumerate() {
                    let scaled = ((m - rank as f64) * p_values[idx]).min(1.0);
                    running = running.max(scaled);
                    adjusted[idx] = running;
                }
                adjusted
            }
        }
    }
}

/// Pairwise Student t-tests with a family-wise correction
pub fn corrected_t_tests(groups: &Groups, correction: Correction) -> Result<TextTable> {
    require_groups(groups)?;
    let index: Vec<(usize, usize)> = pairs(groups.len()).collect();
    let stats = index
        .iter()
        .map(|&(i, j)| IndependentT.test(&groups[i].1, &groups[j].1))
        .collect::<Result<Vec<_>>>()?;
    let raw: Vec<f64> = stats.iter().map(|s| s.p_value).collect();
    let corrected = correction.adjust(&raw);

    let m = index.len() as f64;
    let sidak = 1.0 - (1.0 - SIGNIFICANCE_LEVEL).powf(1.0 / m);
    let bonf = SIGNIFICANCE_LEVEL / m;
    let mut table = TextTable::new(
        TableStyle::Ruled,
        vec!["group1", "group2", "stat", "pval", "pval_corr", "reject"],
    )
    .with_title("Test Multiple Comparison ttest_ind")
    .with_title(format!("FWER=0.05 method={}", correction.method_name()))
    .with_title(format!("alphacSidak={sidak:.2}, alphacBonf={bonf:.3}"));

    for (((i, j), stat), p_corr) in index.iter().zip(&stats).zip(&corrected) {
        table.push_row(vec![
            groups[*i].0.to_string(),
            groups[*j].0.to_string(),
            fmt_num(stat.statistic, 4),
            fmt_num(stat.p_value, 4),
            fmt_num(*p_corr, 4),
            reject_label(*p_corr < SIGNIFICANCE_LEVEL),
        ]);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn groups() -> Vec<(Level, Vec<f64>)> {
        vec![
            (Level::text("A"), vec![1.0, 2.0, 3.0, 2.0]),
            (Level::text("B"), vec![2.0, 3.0, 4.0, 3.0]),
            (Level::text("C"), vec![8.0, 9.0, 10.0, 9.0]),
        ]
    }

    fn reject_column(table: &TextTable) -> Vec<String> {
        table
            .rows()
            .iter()
            .map(|r| r.last().cloned().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_tukey_flags_distant_group() {
        let table = tukey_hsd(&groups()).unwrap();
        assert_eq!(table.rows().len(), 3);
        assert_eq!(table.rows()[0][0], "A");
        assert_eq!(table.rows()[0][1], "B");
        assert_eq!(table.rows()[0][2], "1.0000");
        assert_eq!(reject_column(&table), vec!["False", "True", "True"]);
        assert!(table.to_string().starts_with("Multiple Comparison of Means - Tukey HSD"));
    }

    #[test]
    fn test_games_howell_and_scheffe_agree_on_clear_cases() {
        let gh = games_howell(&groups()).unwrap();
        let sc = scheffe(&groups()).unwrap();
        assert_eq!(reject_column(&gh)[1], "True");
        assert_eq!(reject_column(&sc), vec!["False", "True", "True"]);
    }

    #[test]
    fn test_holm_is_step_down() {
        let adjusted = Correction::Holm.adjust(&[0.01, 0.04, 0.03]);
        assert_relative_eq!(adjusted[0], 0.03);
        assert_relative_eq!(adjusted[2], 0.06);
        assert_relative_eq!(adjusted[1], 0.06);
        let bonf = Correction::Bonferroni.adjust(&[0.01, 0.5]);
        assert_eq!(bonf, vec![0.02, 1.0]);
    }

    #[test]
    fn test_corrected_t_tests_table() {
        let table = corrected_t_tests(&groups(), Correction::Bonferroni).unwrap();
        let text = table.to_string();
        assert!(text.contains("method=bonf"));
        assert!(text.contains("alphacBonf=0.017"));
        assert_eq!(table.rows().len(), 3);
    }

    #[test]
    fn test_single_group_rejected() {
        assert!(tukey_hsd(&groups()[..1]).is_err());
    }
}
