//! Column-oriented tabular dataset
//!
//! A [`Dataset`] is an ordered list of equally long, named columns. Each
//! column is either numeric (`f64` cells) or text; any cell may be missing.
//! Grouping columns are read through [`Level`], which gives numeric and text
//! categories a common hashable, ordered representation.

use crate::error::{Error, Result};
use ordered_float::OrderedFloat;
use std::collections::HashSet;
use std::fmt;

/// A categorical level drawn from a grouping column
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    /// Level taken from a numeric column
    Number(OrderedFloat<f64>),
    /// Level taken from a text column
    Text(String),
}

impl Level {
    /// Numeric level
    pub fn number(value: f64) -> Self {
        Self::Number(OrderedFloat(value))
    }

    /// Text level
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n.0),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Level {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A single cell borrowed from a dataset
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Number(f64),
    Text(&'a str),
    Missing,
}

impl fmt::Display for Cell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Missing => f.write_str("NaN"),
        }
    }
}

/// Storage for one column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Create a column from raw storage
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Fully observed numeric column
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(
            name,
            ColumnData::Numeric(values.into_iter().map(Some).collect()),
        )
    }

    /// Numeric column with missing cells
    pub fn numeric_opt(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Numeric(values))
    }

    /// Fully observed text column
    pub fn text<S: Into<String>>(name: impl Into<String>, values: Vec<S>) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.into_iter().map(|s| Some(s.into())).collect()),
        )
    }

    /// Text column with missing cells
    pub fn text_opt(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::Text(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn into_data(self) -> ColumnData {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }

    /// pandas-style dtype name used in previews
    pub fn dtype_name(&self) -> &'static str {
        match self.data {
            ColumnData::Numeric(_) => "float64",
            ColumnData::Text(_) => "object",
        }
    }

    /// Numeric cells, if this is a numeric column
    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.data {
            ColumnData::Numeric(v) => Some(v),
            ColumnData::Text(_) => None,
        }
    }

    /// Text cells, if this is a text column
    pub fn as_text(&self) -> Option<&[Option<String>]> {
        match &self.data {
            ColumnData::Text(v) => Some(v),
            ColumnData::Numeric(_) => None,
        }
    }

    /// Numeric cells or a type mismatch error
    pub fn numeric_cells(&self) -> Result<&[Option<f64>]> {
        self.as_numeric().ok_or_else(|| Error::not_numeric(&self.name))
    }

    /// Cell at `row`
    pub fn cell(&self, row: usize) -> Cell<'_> {
        match &self.data {
            ColumnData::Numeric(v) => match v.get(row).copied().flatten() {
                Some(x) if !x.is_nan() => Cell::Number(x),
                _ => Cell::Missing,
            },
            ColumnData::Text(v) => match v.get(row) {
                Some(Some(s)) => Cell::Text(s),
                _ => Cell::Missing,
            },
        }
    }

    /// Categorical level at `row`, `None` when missing
    pub fn level_at(&self, row: usize) -> Option<Level> {
        match self.cell(row) {
            Cell::Number(x) => Some(Level::number(x)),
            Cell::Text(s) => Some(Level::text(s)),
            Cell::Missing => None,
        }
    }

    /// Number of missing cells
    pub fn missing_count(&self) -> usize {
        (0..self.len())
            .filter(|&i| matches!(self.cell(i), Cell::Missing))
            .count()
    }

    /// New column holding the given rows, in the given order
    pub fn take(&self, rows: &[usize]) -> Self {
        let data = match &self.data {
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Text(v) => ColumnData::Text(rows.iter().map(|&i| v[i].clone()).collect()),
        };
        Self::new(self.name.clone(), data)
    }
}

/// An ordered table of typed columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Empty dataset with no columns
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset, checking that columns share a length and have unique names
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut dataset = Self::new();
        for column in columns {
            dataset.push_column(column)?;
        }
        Ok(dataset)
    }

    /// One-cell text table, used for textual result summaries
    pub fn single_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            columns: vec![Column::text(name, vec![text.into()])],
        }
    }

    /// Append a column
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.column(column.name()).is_some() {
            return Err(Error::InvalidInput(format!(
                "duplicate column name '{}'",
                column.name()
            )));
        }
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(Error::size_mismatch(
                    first.len(),
                    column.len(),
                    &format!("column '{}'", column.name()),
                ));
            }
        }
        self.columns.push(column);
        Ok(())
    }

    /// Builder-style [`push_column`](Self::push_column)
    pub fn with_column(mut self, column: Column) -> Result<Self> {
        self.push_column(column)?;
        Ok(self)
    }

    /// Replace the column with the same name, keeping its position
    pub fn replace_column(&mut self, column: Column) -> Result<()> {
        if column.len() != self.n_rows() {
            return Err(Error::size_mismatch(
                self.n_rows(),
                column.len(),
                &format!("column '{}'", column.name()),
            ));
        }
        let slot = self
            .columns
            .iter_mut()
            .find(|c| c.name() == column.name())
            .ok_or_else(|| Error::MissingColumn(column.name().to_string()))?;
        *slot = column;
        Ok(())
    }

    /// Remove and return the named column
    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name() == name)?;
        Some(self.columns.remove(idx))
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Column by name or [`Error::MissingColumn`]
    pub fn require(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Numeric cells of a required column
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>]> {
        self.require(name)?.numeric_cells()
    }

    /// Observed values of a numeric column, missing cells dropped
    pub fn numeric_values(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.numeric(name)?.iter().flatten().copied().collect())
    }

    /// Names of numeric columns in table order
    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric())
            .map(Column::name)
            .collect()
    }

    /// Names of text columns in table order
    pub fn text_column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| !c.is_numeric())
            .map(Column::name)
            .collect()
    }

    /// Per-row levels of a grouping column
    pub fn levels(&self, name: &str) -> Result<Vec<Option<Level>>> {
        let column = self.require(name)?;
        Ok((0..column.len()).map(|i| column.level_at(i)).collect())
    }

    /// Distinct levels in order of first appearance, missing cells skipped
    pub fn distinct_levels(&self, name: &str) -> Result<Vec<Level>> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for level in self.levels(name)?.into_iter().flatten() {
            if seen.insert(level.clone()) {
                ordered.push(level);
            }
        }
        Ok(ordered)
    }

    /// Distinct levels in sorted order, as a group-by would produce them
    pub fn sorted_levels(&self, name: &str) -> Result<Vec<Level>> {
        let mut levels = self.distinct_levels(name)?;
        levels.sort();
        Ok(levels)
    }

    /// Cells of `value_col` on rows whose `group_col` equals `level`
    ///
    /// Missing cells are kept so positions line up across groups.
    pub fn group_cells(
        &self,
        group_col: &str,
        value_col: &str,
        level: &Level,
    ) -> Result<Vec<Option<f64>>> {
        let groups = self.require(group_col)?;
        let values = self.numeric(value_col)?;
        Ok((0..groups.len())
            .filter(|&i| groups.level_at(i).as_ref() == Some(level))
            .map(|i| values[i])
            .collect())
    }

    /// Observed values of `value_col` on rows whose `group_col` equals `level`
    ///
    /// Row order within the group is preserved.
    pub fn group_values(&self, group_col: &str, value_col: &str, level: &Level) -> Result<Vec<f64>> {
        Ok(self
            .group_cells(group_col, value_col, level)?
            .into_iter()
            .flatten()
            .collect())
    }

    /// Split `value_col` by each of `levels`
    pub fn partition(
        &self,
        group_col: &str,
        value_col: &str,
        levels: &[Level],
    ) -> Result<Vec<(Level, Vec<f64>)>> {
        levels
            .iter()
            .map(|level| {
                self.group_values(group_col, value_col, level)
                    .map(|values| (level.clone(), values))
            })
            .collect()
    }

    /// Cell at (`row`, `column`)
    pub fn cell(&self, row: usize, column: &str) -> Result<Cell<'_>> {
        Ok(self.require(column)?.cell(row))
    }

    /// Rows whose mask entry is `true`
    pub fn filter_rows(&self, keep: &[bool]) -> Result<Self> {
        if keep.len() != self.n_rows() {
            return Err(Error::size_mismatch(self.n_rows(), keep.len(), "row mask"));
        }
        let rows: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| k.then_some(i))
            .collect();
        Ok(self.take_rows(&rows))
    }

    /// Dataset made of the given rows, in the given order
    pub fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
        }
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Self {
        let rows: Vec<usize> = (0..self.n_rows().min(n)).collect();
        self.take_rows(&rows)
    }

    /// Shape, column types and the first rows, for data previews
    pub fn preview(&self, rows: usize) -> String {
        let mut out = format!("データ形状: ({}, {})\n\n列情報:\n", self.n_rows(), self.n_columns());
        for column in &self.columns {
            out.push_str(&format!("{}: {}\n", column.name(), column.dtype_name()));
        }
        out.push_str("\nデータプレビュー:\n");
        out.push_str(&self.head(rows).to_string());
        out
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<String> = self.columns.iter().map(|c| c.name().to_string()).collect();
        let body: Vec<Vec<String>> = (0..self.n_rows())
            .map(|row| self.columns.iter().map(|c| c.cell(row).to_string()).collect())
            .collect();
        let widths: Vec<usize> = header
            .iter()
            .enumerate()
            .map(|(j, h)| {
                body.iter()
                    .map(|r| r[j].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let index_width = self.n_rows().saturating_sub(1).to_string().len();

        write!(f, "{:index_width$}", "")?;
        for (h, w) in header.iter().zip(&widths) {
            write!(f, "  {h:>w$}")?;
        }
        for (i, row) in body.iter().enumerate() {
            write!(f, "\n{i:<index_width$}")?;
            for (cell, w) in row.iter().zip(&widths) {
                write!(f, "  {cell:>w$}")?;
            }
        }
        Ok(())
    }
}
