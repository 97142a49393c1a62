//! Import and export against real files

use approx::assert_relative_eq;
use rusqlite::Connection;
use serde_json::json;
use std::io::Write;
use tabstat_core::{columns, Column, Dataset};
use tabstat_io::export::{export_csv, export_xlsx};
use tabstat_io::{
    dataset_from_json, fetch_json, read_clipboard_text, read_csv, read_delimited, read_json,
    read_sqlite, read_xlsx, DelimitedOptions, Error, ResultsExporter,
};
use tabstat_viz::{build_figure, GraphCustomization, GraphType};

#[test]
fn csv_infers_column_types() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "group,value,note").unwrap();
    writeln!(file, "A,1.5,first").unwrap();
    writeln!(file, "B,,").unwrap();
    writeln!(file, "A,3,NA").unwrap();

    let ds = read_csv(file.path()).unwrap();
    assert_eq!(ds.n_rows(), 3);
    assert_eq!(ds.numeric(columns::VALUE).unwrap(), &[Some(1.5), None, Some(3.0)]);
    assert!(!ds.column(columns::GROUP).unwrap().is_numeric());
    assert_eq!(ds.column("note").unwrap().missing_count(), 2);
}

#[test]
fn delimited_without_header() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "1;2").unwrap();
    writeln!(file, "3;4").unwrap();
    let options = DelimitedOptions::default().with_delimiter(b';').with_header(false);
    let ds = read_delimited(file.path(), options).unwrap();
    assert_eq!(ds.column_names(), vec!["0", "1"]);
    assert_eq!(ds.numeric_values("1").unwrap(), vec![2.0, 4.0]);
}

#[test]
fn clipboard_tabs_and_whitespace() {
    let pasted = "group\tvalue\nA\t1\nB\t2\n";
    let ds = read_clipboard_text(pasted).unwrap();
    assert_eq!(ds.numeric_values(columns::VALUE).unwrap(), vec![1.0, 2.0]);

    let typed = "x   y\n1  2\n3  4\n";
    let ds = read_clipboard_text(typed).unwrap();
    assert_eq!(ds.numeric_values(columns::Y).unwrap(), vec![2.0, 4.0]);
}

#[test]
fn json_records_and_columns() {
    let records = json!([
        {"group": "A", "value": 1.0},
        {"group": "B", "value": null},
        {"group": "B"}
    ]);
    let ds = dataset_from_json(&records).unwrap();
    assert_eq!(ds.n_rows(), 3);
    assert_eq!(ds.numeric(columns::VALUE).unwrap(), &[Some(1.0), None, None]);

    let cols = json!({"x": [1, 2, 3], "label": ["a", "b", "c"]});
    let ds = dataset_from_json(&cols).unwrap();
    assert_eq!(ds.numeric_values(columns::X).unwrap(), vec![1.0, 2.0, 3.0]);

    assert!(matches!(
        dataset_from_json(&json!({"a": 1})),
        Err(Error::UnsupportedJson(_))
    ));
    assert!(dataset_from_json(&json!({"a": [1, 2], "b": [1]})).is_err());
}

#[test]
fn json_records_keep_key_order() {
    let records = json!([
        {"value": 2.5, "group": "B", "alpha": 1},
        {"value": 1.0, "group": "A", "alpha": 2, "extra": "x"}
    ]);
    let ds = dataset_from_json(&records).unwrap();
    assert_eq!(ds.column_names(), vec!["value", "group", "alpha", "extra"]);

    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"zeta": [1, 2], "group": ["A", "B"]}}"#).unwrap();
    let ds = read_json(file.path()).unwrap();
    assert_eq!(ds.column_names(), vec!["zeta", "group"]);
}

#[test]
fn xlsx_export_reads_back() {
    let data = Dataset::from_columns(vec![
        Column::text(columns::GROUP, vec!["A", "B", "B"]),
        Column::numeric_opt(columns::VALUE, vec![Some(1.5), None, Some(3.0)]),
    ])
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.xlsx");
    export_xlsx(&data, &path).unwrap();

    let back = read_xlsx(&path, None).unwrap();
    assert_eq!(back.column_names(), vec!["group", "value"]);
    assert_eq!(back.numeric(columns::VALUE).unwrap(), &[Some(1.5), None, Some(3.0)]);
    assert_eq!(back, data);

    assert!(matches!(read_xlsx(&path, Some("missing")), Err(Error::Spreadsheet(_))));
}

#[test]
fn xlsx_named_sheet_and_exporter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("summary.xlsx");
    let mut exporter = ResultsExporter::default();
    exporter.set_results(Dataset::single_text(columns::RESULT, "t統計量: -3.6742\np値: 0.0213"));
    exporter.export_xlsx(&path).unwrap();

    let back = read_xlsx(&path, Some("Sheet1")).unwrap();
    assert_eq!(back, Dataset::single_text(columns::RESULT, "t統計量: -3.6742\np値: 0.0213"));
}

#[test]
fn sqlite_table_import() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE samples (grp TEXT, value REAL, n INTEGER);
             INSERT INTO samples VALUES ('A', 1.5, 1), ('B', NULL, 2);",
        )
        .unwrap();
    }
    let ds = read_sqlite(&path, "samples").unwrap();
    assert_eq!(ds.column_names(), vec!["grp", "value", "n"]);
    assert_eq!(ds.numeric("value").unwrap(), &[Some(1.5), None]);
    assert_relative_eq!(ds.numeric_values("n").unwrap()[1], 2.0);

    assert!(matches!(
        read_sqlite(&path, "samples; DROP TABLE samples"),
        Err(Error::InvalidTableName(_))
    ));
    assert!(matches!(read_sqlite(&path, "missing"), Err(Error::Sqlite(_))));
}

#[test]
fn fetch_rejects_malformed_url() {
    assert!(matches!(fetch_json("not a url"), Err(Error::Http(_))));
}

#[test]
fn exported_csv_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");
    let results = Dataset::single_text(columns::RESULT, "F値: 12.0000\np値: 0.0010");
    export_csv(&results, &path).unwrap();
    let back = read_csv(&path).unwrap();
    assert_eq!(back, results);
}

#[test]
fn exporter_writes_image() {
    let data = Dataset::from_columns(vec![
        Column::text(columns::GROUP, vec!["A", "A", "B", "B"]),
        Column::numeric(columns::VALUE, vec![1.0, 2.0, 3.0, 4.0]),
    ])
    .unwrap();
    let figure = build_figure(&data, "t検定", &GraphType::Bar.into(), &GraphCustomization::default()).unwrap();

    let mut exporter = ResultsExporter::default();
    exporter.set_figure(Some(figure));
    let dir = tempfile::tempdir().unwrap();
    let png = dir.path().join("graph.png");
    exporter.export_image(&png).unwrap();
    assert!(png.exists());
    assert!(matches!(
        exporter.export_image(dir.path().join("graph.bmp2")),
        Err(Error::Viz(tabstat_viz::Error::UnsupportedFormat(_)))
    ));
}
