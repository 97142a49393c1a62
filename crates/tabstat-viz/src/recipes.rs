//! One recipe per graph type, turning a dataset into plot data
//!
//! Recipes read the conventional columns (`group`/`value` or `x`/`y`) and
//! only compute; drawing lives in [`crate::draw`].

use crate::customization::GraphCustomization;
use crate::error::Result;
use crate::figure::{
    BarStat, BoxStat, Figure, Heatmap, HistogramSeries, PairCell, PairGrid, PieSlice, Plot, Radar,
    Series, ViolinStat, UNSUPPORTED_GRAPH_MESSAGE,
};
use crate::graph_type::{GraphSelection, GraphType};
use crate::kde::gaussian_kde;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;
use std::f64::consts::PI;
use tabstat_core::{columns, describe, Dataset, Error as CoreError, Level};

const Z_95: f64 = 1.959_963_984_540_054;
const WHISKER_IQR: f64 = 1.5;
const VIOLIN_POINTS: usize = 100;
const VIOLIN_CUT: f64 = 2.0;
const DENSITY_POINTS: usize = 200;
const DENSITY_CUT: f64 = 3.0;

/// Build the figure for `selection`, then apply the customization overlay
///
/// The default title is `"{test_label} - {graph label}"`. Pair plots are
/// returned without any overlay.
pub fn build_figure(
    data: &Dataset,
    test_label: &str,
    selection: &GraphSelection,
    custom: &GraphCustomization,
) -> Result<Figure> {
    let plot = match selection {
        GraphSelection::Known(graph) => build_plot(data, *graph)?,
        GraphSelection::Unsupported(_) => Plot::Placeholder(UNSUPPORTED_GRAPH_MESSAGE.to_string()),
    };

    let mut figure = Figure::new(plot);
    if matches!(selection, GraphSelection::Known(GraphType::PairPlot)) {
        figure.overlay = false;
        figure.title.clear();
        return Ok(figure);
    }

    figure.title = format!("{test_label} - {}", selection.label());
    if let Some(title) = custom.title() {
        figure.title = title.to_string();
    }
    if let Some(x) = custom.x_label() {
        figure.x_label = x.to_string();
    }
    if let Some(y) = custom.y_label() {
        figure.y_label = y.to_string();
    }
    figure.font = custom.font().map(str::to_string);
    figure.axes = custom.axis_overrides()?;
    Ok(figure)
}

/// Plot data for a single graph type
pub fn build_plot(data: &Dataset, graph: GraphType) -> Result<Plot> {
    let plot = match graph {
        GraphType::Bar => Plot::Bars(bar_stats(data)?),
        GraphType::Box => Plot::Boxes(box_stats(data)?),
        GraphType::Violin => Plot::Violins(violin_stats(data)?),
        GraphType::Scatter => Plot::Scatter(scatter_series(data)?),
        GraphType::Histogram => Plot::Histogram(histograms(data)?),
        GraphType::Kde => Plot::Density(densities(data, columns::VALUE)?),
        GraphType::Heatmap => Plot::Heatmap(correlation_heatmap(data)?),
        GraphType::PairPlot => Plot::PairGrid(pair_grid(data)?),
        GraphType::Line => Plot::Lines(mean_lines(data)?),
        GraphType::Area => Plot::Areas(area_series(data)?),
        GraphType::Pie => Plot::Pie(pie_slices(data)?),
        GraphType::Radar => Plot::Radar(radar(data)?),
    };
    Ok(plot)
}

/// Category order of a grouping column: sorted when numeric, first
/// appearance otherwise
fn category_order(data: &Dataset, name: &str) -> Result<Vec<Level>> {
    if data.require(name)?.is_numeric() {
        Ok(data.sorted_levels(name)?)
    } else {
        Ok(data.distinct_levels(name)?)
    }
}

fn grouped_values(data: &Dataset) -> Result<Vec<(Level, Vec<f64>)>> {
    let levels = category_order(data, columns::GROUP)?;
    Ok(data.partition(columns::GROUP, columns::VALUE, &levels)?)
}

/// Group means in sorted group order, as a group-by produces them
fn sorted_group_means(data: &Dataset) -> Result<Vec<(Level, f64)>> {
    let levels = data.sorted_levels(columns::GROUP)?;
    let groups = data.partition(columns::GROUP, columns::VALUE, &levels)?;
    Ok(groups
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(level, values)| (level, describe::mean(&values)))
        .collect())
}

/// Optional hue levels paired with the per-row level
fn hue(data: &Dataset) -> Result<Option<(Vec<Level>, Vec<Option<Level>>)>> {
    if data.column(columns::GROUP).is_none() {
        return Ok(None);
    }
    let order = category_order(data, columns::GROUP)?;
    let rows = data.levels(columns::GROUP)?;
    Ok(Some((order, rows)))
}

/// Rows where every named numeric column is present, as tuples of values
fn complete_rows(data: &Dataset, names: &[&str]) -> Result<Vec<(usize, Vec<f64>)>> {
    let cols = names
        .iter()
        .map(|name| data.numeric(name))
        .collect::<tabstat_core::Result<Vec<_>>>()?;
    Ok((0..data.n_rows())
        .filter_map(|row| {
            cols.iter()
                .map(|c| c[row].filter(|v| !v.is_nan()))
                .collect::<Option<Vec<f64>>>()
                .map(|values| (row, values))
        })
        .collect())
}

/// Split point rows into one series per hue level, or one unnamed series
fn split_by_hue(data: &Dataset, rows: Vec<(usize, (f64, f64))>) -> Result<Vec<Series>> {
    match hue(data)? {
        None => Ok(vec![Series {
            label: String::new(),
            points: rows.into_iter().map(|(_, p)| p).collect(),
        }]),
        Some((order, levels)) => Ok(order
            .iter()
            .map(|level| Series {
                label: level.to_string(),
                points: rows
                    .iter()
                    .filter(|(row, _)| levels[*row].as_ref() == Some(level))
                    .map(|(_, p)| *p)
                    .collect(),
            })
            .collect()),
    }
}

fn bar_stats(data: &Dataset) -> Result<Vec<BarStat>> {
    Ok(grouped_values(data)?
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(level, values)| {
            let mean = describe::mean(&values);
            let half = if values.len() > 1 {
                Z_95 * describe::std_dev(&values, 1) / (values.len() as f64).sqrt()
            } else {
                0.0
            };
            BarStat {
                label: level.to_string(),
                mean,
                lower: mean - half,
                upper: mean + half,
            }
        })
        .collect())
}

fn box_stat(label: String, values: &[f64]) -> Result<BoxStat> {
    let sorted = describe::sorted(values)?;
    let q1 = describe::quantile_sorted(&sorted, 0.25);
    let median = describe::quantile_sorted(&sorted, 0.5);
    let q3 = describe::quantile_sorted(&sorted, 0.75);
    let reach = WHISKER_IQR * (q3 - q1);
    let inside = |x: &&f64| **x >= q1 - reach && **x <= q3 + reach;
    let whisker_low = sorted.iter().find(inside).copied().unwrap_or(q1);
    let whisker_high = sorted.iter().rev().find(inside).copied().unwrap_or(q3);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|x| *x < whisker_low || *x > whisker_high)
        .collect();
    Ok(BoxStat {
        label,
        q1,
        median,
        q3,
        whisker_low,
        whisker_high,
        outliers,
    })
}

fn box_stats(data: &Dataset) -> Result<Vec<BoxStat>> {
    grouped_values(data)?
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(level, values)| box_stat(level.to_string(), &values))
        .collect()
}

fn violin_stats(data: &Dataset) -> Result<Vec<ViolinStat>> {
    grouped_values(data)?
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(level, values)| {
            let summary = box_stat(level.to_string(), &values)?;
            let outline = match gaussian_kde(&values, VIOLIN_POINTS, VIOLIN_CUT) {
                Some(curve) => curve.points(),
                // a single point or no spread draws as a flat line
                None => vec![(summary.median, 0.0)],
            };
            Ok(ViolinStat {
                label: summary.label,
                outline,
                q1: summary.q1,
                median: summary.median,
                q3: summary.q3,
            })
        })
        .collect()
}

fn scatter_series(data: &Dataset) -> Result<Vec<Series>> {
    let rows = complete_rows(data, &[columns::X, columns::Y])?
        .into_iter()
        .map(|(row, v)| (row, (v[0], v[1])))
        .collect();
    split_by_hue(data, rows)
}

/// Bin width chosen as the smaller of Freedman-Diaconis and Sturges
fn auto_bin_edges(values: &[f64]) -> Result<Vec<f64>> {
    let sorted = describe::sorted(values)?;
    let (Some(&lo), Some(&hi)) = (sorted.first(), sorted.last()) else {
        return Err(CoreError::empty_input("histogram").into());
    };
    if hi - lo <= 0.0 {
        return Ok(vec![lo - 0.5, hi + 0.5]);
    }
    let n = sorted.len() as f64;
    let sturges = (hi - lo) / (n.log2() + 1.0);
    let iqr = describe::quantile_sorted(&sorted, 0.75) - describe::quantile_sorted(&sorted, 0.25);
    let fd = 2.0 * iqr * n.powf(-1.0 / 3.0);
    let width = if fd > 0.0 { fd.min(sturges) } else { sturges };
    let bins = ((hi - lo) / width).ceil().max(1.0) as usize;
    let step = (hi - lo) / bins as f64;
    Ok((0..=bins).map(|i| lo + step * i as f64).collect())
}

fn density_histogram(label: String, values: &[f64], edges: &[f64]) -> HistogramSeries {
    let bins = edges.len() - 1;
    let mut counts = vec![0usize; bins];
    let lo = edges[0];
    let hi = edges[bins];
    let step = (hi - lo) / bins as f64;
    for &v in values {
        if v < lo || v > hi {
            continue;
        }
        // the last bin is closed on the right
        let idx = (((v - lo) / step) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    let total = values.len() as f64;
    let densities = counts
        .iter()
        .zip(edges.windows(2))
        .map(|(&c, w)| {
            if total > 0.0 {
                c as f64 / (total * (w[1] - w[0]))
            } else {
                0.0
            }
        })
        .collect();
    HistogramSeries {
        label,
        edges: edges.to_vec(),
        densities,
    }
}

fn histograms(data: &Dataset) -> Result<Vec<HistogramSeries>> {
    let all = data.numeric_values(columns::VALUE)?;
    let edges = auto_bin_edges(&all)?;
    match hue(data)? {
        None => Ok(vec![density_histogram(String::new(), &all, &edges)]),
        Some(_) => Ok(grouped_values(data)?
            .into_iter()
            .map(|(level, values)| density_histogram(level.to_string(), &values, &edges))
            .collect()),
    }
}

/// One density curve per group; groups too small to estimate are skipped
fn densities(data: &Dataset, value_col: &str) -> Result<Vec<Series>> {
    let groups = match hue(data)? {
        None => vec![(String::new(), data.numeric_values(value_col)?)],
        Some((order, _)) => data
            .partition(columns::GROUP, value_col, &order)?
            .into_iter()
            .map(|(level, values)| (level.to_string(), values))
            .collect(),
    };
    Ok(groups
        .into_iter()
        .filter_map(|(label, values)| {
            gaussian_kde(&values, DENSITY_POINTS, DENSITY_CUT).map(|curve| Series {
                label,
                points: curve.points(),
            })
        })
        .collect())
}

fn correlation_heatmap(data: &Dataset) -> Result<Heatmap> {
    let names = data.numeric_column_names();
    if names.is_empty() {
        return Err(CoreError::InvalidInput("no numeric columns to correlate".to_string()).into());
    }
    let mut values = vec![vec![f64::NAN; names.len()]; names.len()];
    for (i, a) in names.iter().enumerate() {
        for (j, b) in names.iter().enumerate().skip(i) {
            let rows = complete_rows(data, &[*a, *b])?;
            let xs: Vec<f64> = rows.iter().map(|(_, v)| v[0]).collect();
            let ys: Vec<f64> = rows.iter().map(|(_, v)| v[1]).collect();
            let r = describe::pearson(&xs, &ys).unwrap_or(f64::NAN);
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    Ok(Heatmap {
        labels: names.iter().map(|n| n.to_string()).collect(),
        values,
    })
}

fn pair_grid(data: &Dataset) -> Result<PairGrid> {
    data.require(columns::GROUP)?;
    let variables: Vec<String> = data
        .numeric_column_names()
        .into_iter()
        .filter(|name| *name != columns::GROUP)
        .map(str::to_string)
        .collect();
    if variables.is_empty() {
        return Err(CoreError::InvalidInput("no numeric variables to pair".to_string()).into());
    }

    let mut cells = Vec::with_capacity(variables.len() * variables.len());
    for row_var in &variables {
        for col_var in &variables {
            if row_var == col_var {
                cells.push(PairCell::Diagonal(densities(data, row_var)?));
            } else {
                let rows = complete_rows(data, &[col_var.as_str(), row_var.as_str()])?
                    .into_iter()
                    .map(|(row, v)| (row, (v[0], v[1])))
                    .collect();
                cells.push(PairCell::Scatter(split_by_hue(data, rows)?));
            }
        }
    }
    Ok(PairGrid { variables, cells })
}

fn mean_lines(data: &Dataset) -> Result<Vec<Series>> {
    let rows = complete_rows(data, &[columns::X, columns::VALUE])?
        .into_iter()
        .map(|(row, v)| (row, (v[0], v[1])))
        .collect();
    Ok(split_by_hue(data, rows)?
        .into_iter()
        .map(|series| {
            let mut by_x: BTreeMap<OrderedFloat<f64>, (f64, usize)> = BTreeMap::new();
            for (x, y) in series.points {
                let entry = by_x.entry(OrderedFloat(x)).or_insert((0.0, 0));
                entry.0 += y;
                entry.1 += 1;
            }
            Series {
                label: series.label,
                points: by_x
                    .into_iter()
                    .map(|(x, (sum, n))| (x.0, sum / n as f64))
                    .collect(),
            }
        })
        .collect())
}

/// Pivot `x` by `group`; empty cells are drawn as zero
fn area_series(data: &Dataset) -> Result<Vec<Series>> {
    let x_levels = data.levels(columns::X)?;
    let g_levels = data.levels(columns::GROUP)?;
    let values = data.numeric(columns::VALUE)?;

    let mut table: BTreeMap<(Level, Level), Option<f64>> = BTreeMap::new();
    for row in 0..data.n_rows() {
        let (Some(x), Some(g)) = (x_levels[row].clone(), g_levels[row].clone()) else {
            continue;
        };
        if table.insert((x, g), values[row]).is_some() {
            return Err(
                CoreError::InvalidInput("Index contains duplicate entries, cannot reshape".to_string())
                    .into(),
            );
        }
    }

    let index = data.sorted_levels(columns::X)?;
    let groups = data.sorted_levels(columns::GROUP)?;
    // text indices are placed at their positions
    let position = |i: usize, level: &Level| match level {
        Level::Number(v) => v.0,
        Level::Text(_) => i as f64,
    };
    Ok(groups
        .iter()
        .map(|g| Series {
            label: g.to_string(),
            points: index
                .iter()
                .enumerate()
                .map(|(i, x)| {
                    let y = table
                        .get(&(x.clone(), g.clone()))
                        .copied()
                        .flatten()
                        .filter(|v| !v.is_nan())
                        .unwrap_or(0.0);
                    (position(i, x), y)
                })
                .collect(),
        })
        .collect())
}

fn pie_slices(data: &Dataset) -> Result<Vec<PieSlice>> {
    let levels = data.sorted_levels(columns::GROUP)?;
    let sums: Vec<(Level, f64)> = data
        .partition(columns::GROUP, columns::VALUE, &levels)?
        .into_iter()
        .map(|(level, values)| (level, values.iter().sum()))
        .collect();
    if sums.iter().any(|(_, s)| *s < 0.0) {
        return Err(CoreError::InvalidInput("Wedge sizes must be non negative values".to_string()).into());
    }
    let total: f64 = sums.iter().map(|(_, s)| s).sum();
    if total <= 0.0 {
        return Err(CoreError::InvalidInput("pie chart needs a positive total".to_string()).into());
    }
    Ok(sums
        .into_iter()
        .map(|(level, value)| PieSlice {
            label: level.to_string(),
            value,
            fraction: value / total,
        })
        .collect())
}

/// Group means around a closed polar loop
///
/// Angles are `2*pi*i/n`; the first angle and value are repeated at the end.
pub fn radar(data: &Dataset) -> Result<Radar> {
    let means = sorted_group_means(data)?;
    if means.is_empty() {
        return Err(CoreError::empty_input("radar chart").into());
    }
    let n = means.len();
    let mut angles: Vec<f64> = (0..n).map(|i| 2.0 * PI * i as f64 / n as f64).collect();
    let mut values: Vec<f64> = means.iter().map(|(_, m)| *m).collect();
    angles.push(angles[0]);
    values.push(values[0]);
    Ok(Radar {
        labels: means.iter().map(|(level, _)| level.to_string()).collect(),
        angles,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tabstat_core::Column;

    fn grouped() -> Dataset {
        Dataset::from_columns(vec![
            Column::text(columns::GROUP, vec!["B", "A", "B", "A", "C", "C"]),
            Column::numeric(columns::VALUE, vec![4.0, 1.0, 6.0, 3.0, 10.0, 12.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_bar_uses_discovery_order() {
        let bars = bar_stats(&grouped()).unwrap();
        let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["B", "A", "C"]);
        assert_relative_eq!(bars[0].mean, 5.0);
        assert!(bars[0].lower < 5.0 && bars[0].upper > 5.0);
    }

    #[test]
    fn test_box_whiskers_exclude_outlier() {
        let stat = box_stat("g".into(), &[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        assert_eq!(stat.outliers, vec![100.0]);
        assert_eq!(stat.whisker_high, 5.0);
        assert_eq!(stat.whisker_low, 1.0);
    }

    #[test]
    fn test_pie_fractions() {
        let slices = pie_slices(&grouped()).unwrap();
        let total: f64 = slices.iter().map(|s| s.fraction).sum();
        assert_relative_eq!(total, 1.0);
        assert_eq!(slices[0].label, "A");
        assert_relative_eq!(slices[0].value, 4.0);
    }

    #[test]
    fn test_area_duplicates_rejected() {
        let ds = Dataset::from_columns(vec![
            Column::numeric(columns::X, vec![1.0, 1.0]),
            Column::text(columns::GROUP, vec!["A", "A"]),
            Column::numeric(columns::VALUE, vec![1.0, 2.0]),
        ])
        .unwrap();
        assert!(area_series(&ds).is_err());
    }

    #[test]
    fn test_area_fills_gaps_with_zero() {
        let ds = Dataset::from_columns(vec![
            Column::numeric(columns::X, vec![1.0, 2.0, 1.0]),
            Column::text(columns::GROUP, vec!["A", "A", "B"]),
            Column::numeric(columns::VALUE, vec![1.0, 2.0, 5.0]),
        ])
        .unwrap();
        let series = area_series(&ds).unwrap();
        assert_eq!(series[1].label, "B");
        assert_eq!(series[1].points, vec![(1.0, 5.0), (2.0, 0.0)]);
    }

    #[test]
    fn test_line_means_per_x() {
        let ds = Dataset::from_columns(vec![
            Column::numeric(columns::X, vec![2.0, 1.0, 1.0]),
            Column::numeric(columns::VALUE, vec![5.0, 1.0, 3.0]),
        ])
        .unwrap();
        let lines = mean_lines(&ds).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].points, vec![(1.0, 2.0), (2.0, 5.0)]);
    }

    #[test]
    fn test_histogram_densities_integrate_per_group() {
        let hists = histograms(&grouped()).unwrap();
        assert_eq!(hists.len(), 3);
        for h in &hists {
            let area: f64 = h
                .densities
                .iter()
                .zip(h.edges.windows(2))
                .map(|(d, w)| d * (w[1] - w[0]))
                .sum();
            assert_relative_eq!(area, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_heatmap_needs_numeric_columns() {
        let ds = Dataset::from_columns(vec![Column::text("name", vec!["a"])]).unwrap();
        assert!(correlation_heatmap(&ds).is_err());
        let heat = correlation_heatmap(&grouped()).unwrap();
        assert_eq!(heat.labels, vec!["value"]);
        assert_relative_eq!(heat.values[0][0], 1.0, epsilon = 1e-12);
    }
}
