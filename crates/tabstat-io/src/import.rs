//! Import boundary: every source is normalized into a [`Dataset`]
//!
//! Cells are typed per column. A column is numeric when every present cell
//! parses as a number, otherwise it is text. Empty cells and the usual NA
//! spellings are stored as missing.

use crate::error::{Error, Result};
use calamine::{open_workbook_auto, Data, Reader};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tabstat_core::{Column, ColumnData, Dataset};

/// Cell spellings read as missing
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#NA", "-NaN", "-nan", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan",
    "null",
];

/// An untyped cell before its column type is decided
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawValue {
    Missing,
    Number(f64),
    Text(String),
}

impl RawValue {
    fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if NA_VALUES.contains(&trimmed) {
            return Self::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_nan() => Self::Missing,
            Ok(v) => Self::Number(v),
            Err(_) => Self::Text(text.to_string()),
        }
    }

    fn into_text(self) -> Option<String> {
        match self {
            Self::Missing => None,
            Self::Number(v) => Some(v.to_string()),
            Self::Text(s) => Some(s),
        }
    }
}

/// Build a dataset from a header and row-major raw cells
///
/// Repeated header names get a `.N` suffix.
pub(crate) fn build_dataset(headers: Vec<String>, rows: Vec<Vec<RawValue>>) -> Result<Dataset> {
    let mut columns: Vec<Vec<RawValue>> = vec![Vec::with_capacity(rows.len()); headers.len()];
    for (index, row) in rows.into_iter().enumerate() {
        if row.len() != headers.len() {
            return Err(tabstat_core::Error::size_mismatch(
                headers.len(),
                row.len(),
                &format!("row {}", index + 1),
            )
            .into());
        }
        for (column, cell) in columns.iter_mut().zip(row) {
            column.push(cell);
        }
    }

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut dataset = Dataset::new();
    for (name, cells) in headers.into_iter().zip(columns) {
        let count = seen.entry(name.clone()).or_insert(0);
        let unique = if *count == 0 {
            name.clone()
        } else {
            format!("{name}.{count}")
        };
        *count += 1;

        let numeric = cells.iter().all(|c| !matches!(c, RawValue::Text(_)));
        let data = if numeric {
            ColumnData::Numeric(
                cells
                    .into_iter()
                    .map(|c| match c {
                        RawValue::Number(v) => Some(v),
                        _ => None,
                    })
                    .collect(),
            )
        } else {
            ColumnData::Text(cells.into_iter().map(RawValue::into_text).collect())
        };
        dataset.push_column(Column::new(unique, data))?;
    }
    Ok(dataset)
}

/// Options for delimited text sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedOptions {
    pub delimiter: u8,
    /// When false, columns are named `0`, `1`, ...
    pub has_header: bool,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
        }
    }
}

impl DelimitedOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }
}

/// Read delimited text from any reader
pub fn read_delimited_from<R: Read>(reader: R, options: DelimitedOptions) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_header)
        .from_reader(reader);

    let mut headers: Option<Vec<String>> = if options.has_header {
        Some(reader.headers()?.iter().map(str::to_string).collect())
    } else {
        None
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if headers.is_none() {
            headers = Some((0..record.len()).map(|i| i.to_string()).collect());
        }
        rows.push(record.iter().map(RawValue::parse).collect());
    }
    let dataset = build_dataset(headers.unwrap_or_default(), rows)?;
    tracing::debug!(
        "Read delimited text: {} rows x {} columns",
        dataset.n_rows(),
        dataset.n_columns()
    );
    Ok(dataset)
}

/// Read a delimited text file
pub fn read_delimited(path: impl AsRef<Path>, options: DelimitedOptions) -> Result<Dataset> {
    let file = File::open(path.as_ref())?;
    read_delimited_from(BufReader::new(file), options)
}

/// Read a comma separated file with a header row
pub fn read_csv(path: impl AsRef<Path>) -> Result<Dataset> {
    read_delimited(path, DelimitedOptions::default())
}

/// Parse text copied from a spreadsheet or terminal
///
/// Tab-separated when the text contains a tab, otherwise split on runs of
/// whitespace. The first line is the header.
pub fn read_clipboard_text(text: &str) -> Result<Dataset> {
    if text.contains('\t') {
        return read_delimited_from(
            text.as_bytes(),
            DelimitedOptions::default().with_delimiter(b'\t'),
        );
    }
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let headers: Vec<String> = lines
        .next()
        .map(|l| l.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    let rows = lines
        .map(|l| l.split_whitespace().map(RawValue::parse).collect())
        .collect();
    build_dataset(headers, rows)
}

fn json_cell(value: &Value) -> RawValue {
    match value {
        Value::Null => RawValue::Missing,
        Value::Number(n) => n.as_f64().map_or(RawValue::Missing, RawValue::Number),
        Value::String(s) => RawValue::Text(s.clone()),
        Value::Bool(b) => RawValue::Text(b.to_string()),
        nested => RawValue::Text(nested.to_string()),
    }
}

/// Convert a JSON document into a dataset
///
/// Accepts an array of records (objects), an array of rows (arrays), an
/// array of scalars, or an object mapping column names to equally long
/// arrays.
pub fn dataset_from_json(value: &Value) -> Result<Dataset> {
    match value {
        Value::Array(items) if items.iter().all(Value::is_object) => {
            let mut headers: Vec<String> = Vec::new();
            for item in items.iter().filter_map(Value::as_object) {
                for key in item.keys() {
                    if !headers.contains(key) {
                        headers.push(key.clone());
                    }
                }
            }
            let rows = items
                .iter()
                .filter_map(Value::as_object)
                .map(|record| {
                    headers
                        .iter()
                        .map(|h| record.get(h).map_or(RawValue::Missing, json_cell))
                        .collect()
                })
                .collect();
            build_dataset(headers, rows)
        }
        Value::Array(items) if items.iter().all(Value::is_array) => {
            let width = items.iter().filter_map(Value::as_array).map(Vec::len).max().unwrap_or(0);
            let rows = items
                .iter()
                .filter_map(Value::as_array)
                .map(|row| {
                    (0..width)
                        .map(|i| row.get(i).map_or(RawValue::Missing, json_cell))
                        .collect()
                })
                .collect();
            build_dataset((0..width).map(|i| i.to_string()).collect(), rows)
        }
        Value::Array(items) => {
            let rows = items.iter().map(|v| vec![json_cell(v)]).collect();
            build_dataset(vec!["0".to_string()], rows)
        }
        Value::Object(map) => {
            let mut columns = Vec::with_capacity(map.len());
            for (name, column) in map {
                let Some(cells) = column.as_array() else {
                    return Err(Error::UnsupportedJson(
                        "If using all scalar values, you must pass an index".to_string(),
                    ));
                };
                columns.push((name.clone(), cells.iter().map(json_cell).collect::<Vec<_>>()));
            }
            let n_rows = columns.first().map_or(0, |(_, c)| c.len());
            let headers = columns.iter().map(|(name, _)| name.clone()).collect();
            let mut rows = vec![Vec::with_capacity(columns.len()); n_rows];
            for (name, cells) in columns {
                if cells.len() != n_rows {
                    return Err(Error::UnsupportedJson(format!(
                        "column '{name}' has {} values, expected {n_rows}",
                        cells.len()
                    )));
                }
                for (row, cell) in rows.iter_mut().zip(cells) {
                    row.push(cell);
                }
            }
            build_dataset(headers, rows)
        }
        scalar => Err(Error::UnsupportedJson(format!("expected array or object, got {scalar}"))),
    }
}

/// Read a JSON file
pub fn read_json(path: impl AsRef<Path>) -> Result<Dataset> {
    let file = File::open(path.as_ref())?;
    let value: Value = serde_json::from_reader(BufReader::new(file))?;
    dataset_from_json(&value)
}

/// GET `url` and convert the JSON body
pub fn fetch_json(url: &str) -> Result<Dataset> {
    tracing::info!("Fetching data from {url}");
    let value: Value = reqwest::blocking::get(url)?.error_for_status()?.json()?;
    dataset_from_json(&value)
}

fn validate_table_name(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(Error::InvalidTableName(table.to_string()))
    }
}

/// Read every row of `table` from a SQLite database file
pub fn read_sqlite(path: impl AsRef<Path>, table: &str) -> Result<Dataset> {
    validate_table_name(table)?;
    let conn = Connection::open_with_flags(path.as_ref(), OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut stmt = conn.prepare(&format!("SELECT * FROM \"{table}\""))?;
    let headers: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
    let width = headers.len();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut cells = Vec::with_capacity(width);
        for i in 0..width {
            cells.push(match row.get_ref(i)? {
                ValueRef::Null => RawValue::Missing,
                ValueRef::Integer(v) => RawValue::Number(v as f64),
                ValueRef::Real(v) if v.is_nan() => RawValue::Missing,
                ValueRef::Real(v) => RawValue::Number(v),
                ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                    RawValue::Text(String::from_utf8_lossy(bytes).into_owned())
                }
            });
        }
        rows.push(cells);
    }
    let dataset = build_dataset(headers, rows)?;
    tracing::debug!("Read {} rows from table {table}", dataset.n_rows());
    Ok(dataset)
}

fn xlsx_cell(cell: &Data) -> RawValue {
    match cell {
        Data::Empty | Data::Error(_) => RawValue::Missing,
        Data::Int(v) => RawValue::Number(*v as f64),
        Data::Float(v) if v.is_nan() => RawValue::Missing,
        Data::Float(v) => RawValue::Number(*v),
        Data::DateTime(dt) => RawValue::Number(dt.as_f64()),
        Data::Bool(b) => RawValue::Text(b.to_string()),
        Data::String(s) => RawValue::parse(s),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::Text(s.clone()),
    }
}

/// Read a spreadsheet (.xlsx, .xlsm, .xls, .ods)
///
/// The first row of the sheet is the header. Without `sheet`, the first
/// sheet in the workbook is read.
pub fn read_xlsx(path: impl AsRef<Path>, sheet: Option<&str>) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path.as_ref())?;
    let name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| Error::Spreadsheet(calamine::Error::Msg("workbook has no sheets")))?,
    };
    let range = workbook.worksheet_range(&name)?;
    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|header| {
            header
                .iter()
                .enumerate()
                .map(|(i, cell)| match xlsx_cell(cell).into_text() {
                    Some(text) => text,
                    None => format!("Unnamed: {i}"),
                })
                .collect()
        })
        .unwrap_or_default();
    let rows = rows.map(|row| row.iter().map(xlsx_cell).collect()).collect();
    let dataset = build_dataset(headers, rows)?;
    tracing::debug!("Read {} rows from sheet {name}", dataset.n_rows());
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_parse() {
        assert_eq!(RawValue::parse("1.5"), RawValue::Number(1.5));
        assert_eq!(RawValue::parse(" 2 "), RawValue::Number(2.0));
        assert_eq!(RawValue::parse("NA"), RawValue::Missing);
        assert_eq!(RawValue::parse(""), RawValue::Missing);
        assert_eq!(RawValue::parse("abc"), RawValue::Text("abc".into()));
    }

    #[test]
    fn test_duplicate_headers_renamed() {
        let ds = build_dataset(
            vec!["a".into(), "a".into()],
            vec![vec![RawValue::Number(1.0), RawValue::Number(2.0)]],
        )
        .unwrap();
        assert_eq!(ds.column_names(), vec!["a", "a.1"]);
    }

    #[test]
    fn test_mixed_column_is_text() {
        let ds = build_dataset(
            vec!["v".into()],
            vec![vec![RawValue::Number(1.0)], vec![RawValue::Text("x".into())], vec![RawValue::Missing]],
        )
        .unwrap();
        let col = ds.column("v").unwrap();
        assert!(!col.is_numeric());
        assert_eq!(col.as_text().unwrap()[0].as_deref(), Some("1"));
        assert_eq!(col.as_text().unwrap()[2], None);
    }

    #[test]
    fn test_table_name_validation() {
        assert!(validate_table_name("measurements_2024").is_ok());
        assert!(validate_table_name("_t").is_ok());
        assert!(validate_table_name("1abc").is_err());
        assert!(validate_table_name("t; DROP TABLE x").is_err());
        assert!(validate_table_name("").is_err());
    }
}
