//! Export boundary: result tables to CSV or XLSX, figures to SVG or PNG

use crate::error::{Error, Result};
use rust_xlsxwriter::Workbook;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tabstat_core::{Cell, Dataset};
use tabstat_viz::canvas::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use tabstat_viz::{draw, Figure};

pub const NO_RESULTS: &str = "エクスポートする結果がありません。";
pub const NO_GRAPH: &str = "エクスポートするグラフがありません。";

/// Write `data` as CSV with a header row and no index column
///
/// Missing cells are written empty.
pub fn write_csv<W: Write>(data: &Dataset, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(data.column_names())?;
    for row in 0..data.n_rows() {
        writer.write_record(data.columns().iter().map(|c| match c.cell(row) {
            Cell::Missing => String::new(),
            cell => cell.to_string(),
        }))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `data` to a CSV file
pub fn export_csv(data: &Dataset, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    write_csv(data, File::create(path)?)?;
    tracing::info!("Exported results to {}", path.display());
    Ok(())
}

/// Write `data` as the single sheet of an XLSX workbook
///
/// The first row holds the column names; missing cells stay blank.
pub fn export_xlsx(data: &Dataset, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, column) in data.columns().iter().enumerate() {
        let col = u16::try_from(col).map_err(|_| {
            tabstat_core::Error::InvalidParameter("too many columns for a worksheet".to_string())
        })?;
        sheet.write_string(0, col, column.name())?;
        for row in 0..data.n_rows() {
            let target = u32::try_from(row + 1).map_err(|_| {
                tabstat_core::Error::InvalidParameter("too many rows for a worksheet".to_string())
            })?;
            match column.cell(row) {
                Cell::Number(v) => sheet.write_number(target, col, v)?,
                Cell::Text(s) => sheet.write_string(target, col, s)?,
                Cell::Missing => continue,
            };
        }
    }
    workbook.save(path)?;
    tracing::info!("Exported results to {}", path.display());
    Ok(())
}

/// Holds the latest result table and figure for export on demand
#[derive(Debug, Clone)]
pub struct ResultsExporter {
    results: Option<Dataset>,
    figure: Option<Figure>,
    width: u32,
    height: u32,
}

impl Default for ResultsExporter {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl ResultsExporter {
    /// Exporter writing images at `width` x `height` pixels
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            results: None,
            figure: None,
            width,
            height,
        }
    }

    pub fn set_results(&mut self, results: Dataset) {
        self.results = Some(results);
    }

    pub fn set_figure(&mut self, figure: Option<Figure>) {
        self.figure = figure;
    }

    pub fn results(&self) -> Option<&Dataset> {
        self.results.as_ref()
    }

    pub fn figure(&self) -> Option<&Figure> {
        self.figure.as_ref()
    }

    /// Write the current result table as CSV
    pub fn export_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let results = self.results.as_ref().ok_or(Error::NothingToExport(NO_RESULTS))?;
        export_csv(results, path)
    }

    /// Write the current result table as an XLSX workbook
    pub fn export_xlsx(&self, path: impl AsRef<Path>) -> Result<()> {
        let results = self.results.as_ref().ok_or(Error::NothingToExport(NO_RESULTS))?;
        export_xlsx(results, path)
    }

    /// Write the current figure; the extension selects SVG or PNG
    pub fn export_image(&self, path: impl AsRef<Path>) -> Result<()> {
        let figure = self.figure.as_ref().ok_or(Error::NothingToExport(NO_GRAPH))?;
        draw::save(figure, path.as_ref(), self.width, self.height)?;
        Ok(())
    }
}
