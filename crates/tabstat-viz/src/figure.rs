//! Backend-independent description of a rendered graph
//!
//! A [`Figure`] holds everything needed to draw one graph: the overlay
//! (title, axis labels, axis overrides, font) and the computed [`Plot`].
//! Recipes produce figures; `draw` turns them into SVG or PNG output.

use crate::customization::AxisOverrides;
use std::ops::Range;

/// Text shown when a graph type has no recipe
pub const UNSUPPORTED_GRAPH_MESSAGE: &str = "選択されたグラフタイプはサポートされていません";

/// Default x axis label
pub const DEFAULT_X_LABEL: &str = "グループ";

/// Default y axis label
pub const DEFAULT_Y_LABEL: &str = "値";

/// A labelled sequence of points
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// Mean with a 95% interval for one category
#[derive(Debug, Clone, PartialEq)]
pub struct BarStat {
    pub label: String,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Five-number summary with outliers for one category
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStat {
    pub label: String,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// Density outline and quartiles for one category
#[derive(Debug, Clone, PartialEq)]
pub struct ViolinStat {
    pub label: String,
    /// (value, density) pairs along the value axis
    pub outline: Vec<(f64, f64)>,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

/// Step histogram of one group over shared bin edges
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries {
    pub label: String,
    pub edges: Vec<f64>,
    pub densities: Vec<f64>,
}

/// Annotated matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub labels: Vec<String>,
    /// Row-major values
    pub values: Vec<Vec<f64>>,
}

/// One cell of a pair grid
#[derive(Debug, Clone, PartialEq)]
pub enum PairCell {
    /// Per-group density of the variable on the diagonal
    Diagonal(Vec<Series>),
    /// Per-group scatter of column variable against row variable
    Scatter(Vec<Series>),
}

/// Grid of pairwise plots over numeric variables
#[derive(Debug, Clone, PartialEq)]
pub struct PairGrid {
    pub variables: Vec<String>,
    /// Row-major cells, `variables.len()` squared
    pub cells: Vec<PairCell>,
}

/// One pie slice
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub fraction: f64,
}

impl PieSlice {
    /// Percentage label, one decimal
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.fraction * 100.0)
    }
}

/// Closed polar loop of per-category means
///
/// `angles` and `values` repeat their first entry at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Radar {
    pub labels: Vec<String>,
    pub angles: Vec<f64>,
    pub values: Vec<f64>,
}

/// The computed content of a graph
#[derive(Debug, Clone, PartialEq)]
pub enum Plot {
    Bars(Vec<BarStat>),
    Boxes(Vec<BoxStat>),
    Violins(Vec<ViolinStat>),
    Scatter(Vec<Series>),
    Histogram(Vec<HistogramSeries>),
    Density(Vec<Series>),
    Heatmap(Heatmap),
    PairGrid(PairGrid),
    Lines(Vec<Series>),
    Areas(Vec<Series>),
    Pie(Vec<PieSlice>),
    Radar(Radar),
    Placeholder(String),
}

fn extend(range: &mut Option<Range<f64>>, value: f64) {
    if !value.is_finite() {
        return;
    }
    *range = Some(match range.take() {
        None => value..value,
        Some(r) => r.start.min(value)..r.end.max(value),
    });
}

fn padded(range: Option<Range<f64>>, fallback: Range<f64>) -> Range<f64> {
    match range {
        None => fallback,
        Some(r) if r.end - r.start <= f64::EPSILON => (r.start - 0.5)..(r.end + 0.5),
        Some(r) => {
            let pad = (r.end - r.start) * 0.05;
            (r.start - pad)..(r.end + pad)
        }
    }
}

fn series_bounds(series: &[Series], x: &mut Option<Range<f64>>, y: &mut Option<Range<f64>>) {
    for (px, py) in series.iter().flat_map(|s| s.points.iter()) {
        extend(x, *px);
        extend(y, *py);
    }
}

/// Padded extent of a set of series, optionally including `y = 0`
pub(crate) fn series_ranges(series: &[Series], zero_floor: bool) -> (Range<f64>, Range<f64>) {
    let mut x = None;
    let mut y = None;
    if zero_floor {
        extend(&mut y, 0.0);
    }
    series_bounds(series, &mut x, &mut y);
    (padded(x, 0.0..1.0), padded(y, 0.0..1.0))
}

impl Plot {
    /// Labels of a categorical x axis, one per integer position
    pub fn categories(&self) -> Option<Vec<String>> {
        match self {
            Self::Bars(bars) => Some(bars.iter().map(|b| b.label.clone()).collect()),
            Self::Boxes(boxes) => Some(boxes.iter().map(|b| b.label.clone()).collect()),
            Self::Violins(violins) => Some(violins.iter().map(|v| v.label.clone()).collect()),
            Self::Heatmap(h) => Some(h.labels.clone()),
            _ => None,
        }
    }

    /// Data extent of cartesian plots, padded for drawing
    pub fn bounds(&self) -> (Range<f64>, Range<f64>) {
        let mut x = None;
        let mut y = None;
        match self {
            Self::Bars(bars) => {
                extend(&mut y, 0.0);
                for b in bars {
                    extend(&mut y, b.lower);
                    extend(&mut y, b.upper);
                }
            }
            Self::Boxes(boxes) => {
                for b in boxes {
                    extend(&mut y, b.whisker_low);
                    extend(&mut y, b.whisker_high);
                    b.outliers.iter().for_each(|o| extend(&mut y, *o));
                }
            }
            Self::Violins(violins) => {
                for v in violins {
                    v.outline.iter().for_each(|(value, _)| extend(&mut y, *value));
                }
            }
            Self::Histogram(hists) => {
                extend(&mut y, 0.0);
                for h in hists {
                    h.edges.iter().for_each(|e| extend(&mut x, *e));
                    h.densities.iter().for_each(|d| extend(&mut y, *d));
                }
            }
            Self::Scatter(s) | Self::Lines(s) => series_bounds(s, &mut x, &mut y),
            Self::Density(s) | Self::Areas(s) => {
                extend(&mut y, 0.0);
                series_bounds(s, &mut x, &mut y);
            }
            Self::Heatmap(_)
            | Self::PairGrid(_)
            | Self::Pie(_)
            | Self::Radar(_)
            | Self::Placeholder(_) => {}
        }

        let x = match self.categories() {
            Some(labels) => -0.5..(labels.len() as f64 - 0.5),
            None => padded(x, 0.0..1.0),
        };
        let y = match self {
            Self::Heatmap(h) => -0.5..(h.labels.len() as f64 - 0.5),
            _ => padded(y, 0.0..1.0),
        };
        (x, y)
    }
}

/// A complete graph ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub font: Option<String>,
    pub axes: AxisOverrides,
    pub plot: Plot,
    /// Pair grids are drawn as their own multi-axes figure without the overlay
    pub overlay: bool,
}

impl Figure {
    /// Figure with the default overlay
    pub fn new(plot: Plot) -> Self {
        Self {
            title: String::new(),
            x_label: DEFAULT_X_LABEL.to_string(),
            y_label: DEFAULT_Y_LABEL.to_string(),
            font: None,
            axes: AxisOverrides::default(),
            plot,
            overlay: true,
        }
    }

    /// Font family used for every text element
    pub fn font_family(&self) -> &str {
        self.font.as_deref().unwrap_or("sans-serif")
    }

    /// Axis ranges after applying the maximum overrides
    pub fn ranges(&self) -> (Range<f64>, Range<f64>) {
        let (mut x, mut y) = self.plot.bounds();
        if let Some(max) = self.axes.x_max {
            x.end = max;
        }
        if let Some(max) = self.axes.y_max {
            y.end = max;
        }
        if x.end <= x.start {
            x.start = x.end - 1.0;
        }
        if y.end <= y.start {
            y.start = y.end - 1.0;
        }
        (x, y)
    }
}
