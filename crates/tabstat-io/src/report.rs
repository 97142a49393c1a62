//! Report composition as a self-contained, print-paginated HTML document

use crate::error::{Error, Result};
use html_escape::encode_text;
use std::fmt::Write as _;
use std::path::Path;
use tabstat_core::Dataset;
use tabstat_viz::canvas::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use tabstat_viz::{draw, Figure};

pub const DEFAULT_REPORT_TITLE: &str = "統計分析レポート";
pub const NO_REPORT_RESULTS: &str = "レポートに含める結果がありません。";

const STYLE: &str = "\
@page { size: letter; margin: 1in; }
body { font-family: sans-serif; font-size: 12pt; }
h1 { font-size: 24pt; text-align: center; margin-bottom: 20pt; }
h2 { font-size: 18pt; margin-bottom: 12pt; }
section { page-break-inside: avoid; margin-bottom: 12pt; }
table { border-collapse: collapse; margin: 0 auto; }
th, td { border: 1px solid black; padding: 6pt; text-align: center; white-space: pre-wrap; }
th { background: grey; color: whitesmoke; font-size: 14pt; }
td { background: beige; }
figure svg { width: 400pt; height: 300pt; }
";

/// User-supplied report text; empty fields fall back to defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub title: String,
    pub description: String,
}

impl ReportOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn effective_title(&self) -> &str {
        if self.title.trim().is_empty() {
            DEFAULT_REPORT_TITLE
        } else {
            &self.title
        }
    }
}

/// Flatten a result table into (column, value) pairs, row by row
pub fn result_items(results: &Dataset) -> Vec<(String, String)> {
    (0..results.n_rows())
        .flat_map(|row| {
            results
                .columns()
                .iter()
                .map(move |c| (c.name().to_string(), c.cell(row).to_string()))
        })
        .collect()
}

/// Compose the report document
pub fn render_html(options: &ReportOptions, results: &Dataset, figure_svg: Option<&str>) -> String {
    let title = encode_text(options.effective_title());
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"ja\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\n{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n"
    );

    if !options.description.trim().is_empty() {
        let _ = write!(
            html,
            "<section>\n<h2>概要:</h2>\n<p>{}</p>\n</section>\n",
            encode_text(&options.description).replace('\n', "<br>")
        );
    }

    html.push_str("<section>\n<h2>分析結果:</h2>\n<table>\n<tr><th>項目</th><th>値</th></tr>\n");
    for (item, value) in result_items(results) {
        let _ = writeln!(html, "<tr><td>{}</td><td>{}</td></tr>", encode_text(&item), encode_text(&value));
    }
    html.push_str("</table>\n</section>\n");

    if let Some(svg) = figure_svg {
        let _ = write!(html, "<section>\n<h2>グラフ:</h2>\n<figure>\n{svg}\n</figure>\n</section>\n");
    }
    html.push_str("</body>\n</html>\n");
    html
}

/// Holds the latest result table and figure for report generation
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    results: Option<Dataset>,
    figure: Option<Figure>,
    width: u32,
    height: u32,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl ReportGenerator {
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

    /// The report document for the current result and figure
    pub fn render(&self, options: &ReportOptions) -> Result<String> {
        let results = self
            .results
            .as_ref()
            .ok_or(Error::NothingToExport(NO_REPORT_RESULTS))?;
        let svg = self
            .figure
            .as_ref()
            .map(|f| draw::to_svg(f, self.width, self.height))
            .transpose()?;
        Ok(render_html(options, results, svg.as_deref()))
    }

    /// Write the report document to `path`
    pub fn generate(&self, path: impl AsRef<Path>, options: &ReportOptions) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.render(options)?)?;
        tracing::info!("Generated report {}", path.display());
        Ok(())
    }
}
