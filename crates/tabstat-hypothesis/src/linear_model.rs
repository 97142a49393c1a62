//! Least-squares models with categorical terms and their type II ANOVA
//!
//! Categorical columns enter the design matrix with treatment coding
//! (the first sorted level is the reference). Fits use an SVD
//! pseudo-inverse so empty interaction cells only lower the rank.

use crate::distribution::f_sf;
use crate::table::{fmt_num, TableStyle, TextTable};
use nalgebra::{DMatrix, DVector};
use std::collections::BTreeSet;
use std::fmt;
use tabstat_core::{columns, Cell, Dataset, Error, Level, Result, SIGNIFICANCE_LEVEL};

/// One row of an ANOVA table; `f` and `p_value` are NaN for the residual row
#[derive(Debug, Clone, PartialEq)]
pub struct AnovaRow {
    pub term: String,
    pub sum_sq: f64,
    pub df: f64,
    pub f: f64,
    pub p_value: f64,
}

/// ANOVA table with `sum_sq`, `df`, `F` and `PR(>F)` columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnovaTable {
    rows: Vec<AnovaRow>,
}

impl AnovaTable {
    pub fn rows(&self) -> &[AnovaRow] {
        &self.rows
    }

    pub fn row(&self, term: &str) -> Option<&AnovaRow> {
        self.rows.iter().find(|r| r.term == term)
    }

    /// True when any effect row has `p < 0.05`
    pub fn any_significant(&self) -> bool {
        self.rows.iter().any(|r| r.p_value < SIGNIFICANCE_LEVEL)
    }

    /// True when the named effect row has `p < 0.05`
    pub fn term_significant(&self, term: &str) -> bool {
        self.row(term).is_some_and(|r| r.p_value < SIGNIFICANCE_LEVEL)
    }
}

pub(crate) fn fmt_p(p: f64) -> String {
    if p.is_finite() && p != 0.0 && p < 1e-4 {
        format!("{p:.6e}")
    } else {
        fmt_num(p, 6)
    }
}

impl fmt::Display for AnovaTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = TextTable::new(TableStyle::Indexed, vec!["sum_sq", "df", "F", "PR(>F)"]);
        for row in &self.rows {
            table.push_row(vec![
                row.term.clone(),
                fmt_num(row.sum_sq, 6),
                fmt_num(row.df, 1),
                fmt_num(row.f, 6),
                fmt_p(row.p_value),
            ]);
        }
        write!(f, "{table}")
    }
}

/// A model term: its display name, the variables it involves and its
/// design columns
#[derive(Debug, Clone)]
struct Term {
    name: String,
    variables: BTreeSet<String>,
    columns: Vec<Vec<f64>>,
}

impl Term {
    /// True when `other` is a higher-order term containing this one
    fn is_contained_in(&self, other: &Term) -> bool {
        other.name != self.name && other.variables.is_superset(&self.variables)
    }
}

fn categorical(name: &str, values: &[Level]) -> Result<Term> {
    let levels: BTreeSet<&Level> = values.iter().collect();
    if levels.len() < 2 {
        return Err(Error::InsufficientGroups {
            column: name.to_string(),
            expected: 2,
            actual: levels.len(),
        });
    }
    let columns = levels
        .into_iter()
        .skip(1)
        .map(|level| {
            values
                .iter()
                .map(|v| if v == level { 1.0 } else { 0.0 })
                .collect::<Vec<f64>>()
        })
        .collect();
    Ok(Term {
        name: format!("C({name})"),
        variables: BTreeSet::from([name.to_string()]),
        columns,
    })
}

fn continuous(name: &str, values: Vec<f64>) -> Term {
    Term {
        name: name.to_string(),
        variables: BTreeSet::from([name.to_string()]),
        columns: vec![values],
    }
}

fn interaction(a: &Term, b: &Term) -> Term {
    let columns = a
        .columns
        .iter()
        .flat_map(|ca| {
            b.columns
                .iter()
                .map(move |cb| ca.iter().zip(cb).map(|(x, y)| x * y).collect::<Vec<f64>>())
        })
        .collect();
    Term {
        name: format!("{}:{}", a.name, b.name),
        variables: a.variables.union(&b.variables).cloned().collect(),
        columns,
    }
}

/// Residual sum of squares and rank of an intercept model plus `terms`
fn fit(y: &DVector<f64>, terms: &[&Term]) -> Result<(f64, usize)> {
    let n = y.len();
    let mut design: Vec<&[f64]> = Vec::new();
    let intercept = vec![1.0; n];
    design.push(&intercept);
    for term in terms {
        design.extend(term.columns.iter().map(Vec::as_slice));
    }

    let x = DMatrix::from_fn(n, design.len(), |i, j| design[j][i]);
    let svd = x.clone().svd(true, true);
    let tol = 1e-10 * svd.singular_values.max().max(1.0);
    let beta = svd
        .solve(y, tol)
        .map_err(|e| Error::Computation(format!("least squares failed: {e}")))?;
    let rank = svd.rank(tol);
    let residual = y - &x * beta;
    Ok((residual.norm_squared(), rank))
}

/// Type II ANOVA of `y` on `terms`
fn anova_type2(y: &DVector<f64>, terms: &[Term]) -> Result<AnovaTable> {
    let all: Vec<&Term> = terms.iter().collect();
    let (rss_full, rank_full) = fit(y, &all)?;
    let df_resid = y.len() as f64 - rank_full as f64;
    if df_resid < 1.0 {
        return Err(Error::InsufficientData {
            expected: rank_full + 1,
            actual: y.len(),
        });
    }
    let mse = rss_full / df_resid;

    let mut rows = Vec::with_capacity(terms.len() + 1);
    for term in terms {
        let base: Vec<&Term> = terms
            .iter()
            .filter(|t| t.name != term.name && !term.is_contained_in(t))
            .collect();
        let mut with = base.clone();
        with.push(term);

        let (rss_base, rank_base) = fit(y, &base)?;
        let (rss_with, rank_with) = fit(y, &with)?;
        let df = rank_with.saturating_sub(rank_base) as f64;
        let sum_sq = (rss_base - rss_with).max(0.0);
        let (f, p_value) = if df > 0.0 && mse > 0.0 {
            let f = (sum_sq / df) / mse;
            (f, f_sf(f, df, df_resid)?)
        } else {
            (f64::NAN, f64::NAN)
        };
        rows.push(AnovaRow {
            term: term.name.clone(),
            sum_sq,
            df,
            f,
            p_value,
        });
    }
    rows.push(AnovaRow {
        term: "Residual".to_string(),
        sum_sq: rss_full,
        df: df_resid,
        f: f64::NAN,
        p_value: f64::NAN,
    });
    Ok(AnovaTable { rows })
}

/// Rows where every named column is observed
fn complete_rows(data: &Dataset, names: &[&str]) -> Result<Vec<usize>> {
    let cols = names
        .iter()
        .map(|n| data.require(n))
        .collect::<Result<Vec<_>>>()?;
    Ok((0..data.n_rows())
        .filter(|&i| cols.iter().all(|c| !matches!(c.cell(i), Cell::Missing)))
        .collect())
}

fn response(data: &Dataset, rows: &[usize]) -> Result<DVector<f64>> {
    let values = data.numeric(columns::VALUE)?;
    Ok(DVector::from_iterator(
        rows.len(),
        rows.iter().map(|&i| values[i].unwrap_or(f64::NAN)),
    ))
}

fn factor_levels(data: &Dataset, name: &str, rows: &[usize]) -> Result<Vec<Level>> {
    let column = data.require(name)?;
    rows.iter()
        .map(|&i| {
            column
                .level_at(i)
                .ok_or_else(|| Error::InvalidInput(format!("missing level in '{name}'")))
        })
        .collect()
}

/// `value ~ C(factor1) + C(factor2) + C(factor1):C(factor2)`
pub fn two_way_anova(data: &Dataset) -> Result<AnovaTable> {
    let rows = complete_rows(data, &[columns::VALUE, columns::FACTOR1, columns::FACTOR2])?;
    let y = response(data, &rows)?;
    let a = categorical(columns::FACTOR1, &factor_levels(data, columns::FACTOR1, &rows)?)?;
    let b = categorical(columns::FACTOR2, &factor_levels(data, columns::FACTOR2, &rows)?)?;
    let ab = interaction(&a, &b);
    tracing::debug!(rows = rows.len(), "fitting two-way model");
    anova_type2(&y, &[a, b, ab])
}

/// Term name of the group effect in [`ancova`]
pub const ANCOVA_GROUP_TERM: &str = "C(group)";

/// `value ~ C(group) + covariate`
pub fn ancova(data: &Dataset) -> Result<AnovaTable> {
    let rows = complete_rows(data, &[columns::VALUE, columns::GROUP, columns::COVARIATE])?;
    let y = response(data, &rows)?;
    let group = categorical(columns::GROUP, &factor_levels(data, columns::GROUP, &rows)?)?;
    let cov = data.numeric(columns::COVARIATE)?;
    let covariate = continuous(
        columns::COVARIATE,
        rows.iter().map(|&i| cov[i].unwrap_or(f64::NAN)).collect(),
    );
    tracing::debug!(rows = rows.len(), "fitting covariance model");
    anova_type2(&y, &[group, covariate])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tabstat_core::Column;

    fn factorial() -> Dataset {
        // 2 x 2 design, two replicates per cell, strong factor1 effect only
        Dataset::from_columns(vec![
            Column::text("factor1", vec!["a", "a", "a", "a", "b", "b", "b", "b"]),
            Column::text("factor2", vec!["x", "x", "y", "y", "x", "x", "y", "y"]),
            Column::numeric("value", vec![1.0, 2.0, 1.5, 2.5, 10.0, 11.0, 10.5, 11.5]),
        ])
        .unwrap()
    }

    #[test]
    fn test_two_way_balanced_sums_of_squares() {
        let table = two_way_anova(&factorial()).unwrap();
        let names: Vec<&str> = table.rows().iter().map(|r| r.term.as_str()).collect();
        assert_eq!(
            names,
            vec!["C(factor1)", "C(factor2)", "C(factor1):C(factor2)", "Residual"]
        );

        // factor1 means 1.75 vs 10.75, grand 6.25: SS = 8 * 4.5^2 = 162
        assert_relative_eq!(table.row("C(factor1)").unwrap().sum_sq, 162.0, epsilon = 1e-8);
        // factor2 means 6.0 vs 6.5: SS = 8 * 0.25^2 = 0.5
        assert_relative_eq!(table.row("C(factor2)").unwrap().sum_sq, 0.5, epsilon = 1e-8);
        assert_relative_eq!(
            table.row("C(factor1):C(factor2)").unwrap().sum_sq,
            0.0,
            epsilon = 1e-8
        );
        let resid = table.row("Residual").unwrap();
        assert_relative_eq!(resid.sum_sq, 2.0, epsilon = 1e-8);
        assert_relative_eq!(resid.df, 4.0);
        assert!(table.term_significant("C(factor1)"));
        assert!(!table.term_significant("C(factor2)"));
        assert!(table.any_significant());
    }

    #[test]
    fn test_ancova_group_effect() {
        let ds = Dataset::from_columns(vec![
            Column::text("group", vec!["a", "a", "a", "a", "b", "b", "b", "b"]),
            Column::numeric("covariate", vec![1.0, 2.0, 3.0, 4.0, 1.0, 2.0, 3.0, 4.0]),
            Column::numeric("value", vec![2.1, 3.9, 6.2, 7.8, 7.0, 9.1, 10.9, 13.0]),
        ])
        .unwrap();
        let table = ancova(&ds).unwrap();
        assert!(table.term_significant(ANCOVA_GROUP_TERM));
        assert_eq!(table.row("covariate").unwrap().df, 1.0);
        assert!(table.to_string().contains("PR(>F)"));
    }

    #[test]
    fn test_single_level_factor_rejected() {
        let ds = Dataset::from_columns(vec![
            Column::text("factor1", vec!["a", "a", "a"]),
            Column::text("factor2", vec!["x", "y", "x"]),
            Column::numeric("value", vec![1.0, 2.0, 3.0]),
        ])
        .unwrap();
        assert!(matches!(
            two_way_anova(&ds),
            Err(Error::InsufficientGroups { .. })
        ));
    }
}
