//! Drawing figures with plotters
//!
//! Every function is generic over the drawing backend so the same code
//! writes SVG strings, SVG files and PNG files.

use crate::error::{Error, Result};
use crate::figure::{
    series_ranges, BarStat, BoxStat, Figure, Heatmap, HistogramSeries, PairCell, PairGrid,
    PieSlice, Plot, Radar, Series, ViolinStat,
};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::PI;
use std::ops::Range;
use std::path::Path;

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

const POLAR_EXTENT: f64 = 1.3;

fn color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Diverging blue-white-red scale for values in [-1, 1]
fn coolwarm(value: f64) -> RGBColor {
    const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);
    if value.is_nan() {
        return RGBColor(255, 255, 255);
    }
    let v = value.clamp(-1.0, 1.0);
    let (from, to, t) = if v < 0.0 { (MID, COLD, -v) } else { (MID, WARM, v) };
    let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

fn draw_err<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> Error {
    Error::Draw(err.to_string())
}

fn centered(family: &str, size: f64) -> TextStyle<'_> {
    TextStyle::from((family, size).into_font()).pos(Pos::new(HPos::Center, VPos::Center))
}

fn category_label(labels: &[String], value: f64) -> String {
    let index = value.round();
    if (value - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

fn tick_count(range: &Range<f64>, tick: f64) -> usize {
    (((range.end - range.start) / tick).floor() as usize + 1).max(2)
}

fn build_chart<'a, DB: DrawingBackend + 'a>(
    area: &'a DrawingArea<DB, Shift>,
    figure: &Figure,
    x: Range<f64>,
    y: Range<f64>,
) -> Result<Chart<'a, DB>> {
    let mut builder = ChartBuilder::on(area);
    builder.margin(20).x_label_area_size(40).y_label_area_size(50);
    if !figure.title.is_empty() {
        builder.caption(&figure.title, (figure.font_family(), 20));
    }
    builder.build_cartesian_2d(x, y).map_err(draw_err)
}

fn draw_mesh<'a, DB: DrawingBackend + 'a>(
    chart: &mut Chart<'a, DB>,
    figure: &Figure,
    ranges: &(Range<f64>, Range<f64>),
    x_categories: Option<&[String]>,
    y_categories: Option<&[String]>,
) -> Result<()> {
    let family = figure.font_family();
    let x_fmt = |v: &f64| x_categories.map(|l| category_label(l, *v)).unwrap_or_default();
    let y_fmt = |v: &f64| y_categories.map(|l| category_label(l, *v)).unwrap_or_default();

    let mut mesh = chart.configure_mesh();
    mesh.x_desc(figure.x_label.as_str())
        .y_desc(figure.y_label.as_str())
        .axis_desc_style((family, 15))
        .label_style((family, 12));
    if let Some(labels) = x_categories {
        mesh.x_labels(labels.len().max(2)).x_label_formatter(&x_fmt).disable_x_mesh();
    } else if let Some(tick) = figure.axes.x_tick {
        mesh.x_labels(tick_count(&ranges.0, tick));
    }
    if let Some(labels) = y_categories {
        mesh.y_labels(labels.len().max(2)).y_label_formatter(&y_fmt).disable_y_mesh();
    } else if let Some(tick) = figure.axes.y_tick {
        mesh.y_labels(tick_count(&ranges.1, tick));
    }
    mesh.draw().map_err(draw_err)
}

fn draw_legend<'a, DB: DrawingBackend + 'a>(chart: &mut Chart<'a, DB>, figure: &Figure) -> Result<()> {
    chart
        .configure_series_labels()
        .label_font((figure.font_family(), 12))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)
}

/// Draw `figure` onto `root`
pub fn draw_figure<DB: DrawingBackend>(figure: &Figure, root: &DrawingArea<DB, Shift>) -> Result<()> {
    root.fill(&WHITE).map_err(draw_err)?;
    match &figure.plot {
        Plot::PairGrid(grid) => return draw_pair_grid(root, figure, grid),
        Plot::Pie(slices) => return draw_pie(root, figure, slices),
        Plot::Radar(radar) => return draw_radar(root, figure, radar),
        Plot::Heatmap(heat) => return draw_heatmap(root, figure, heat),
        Plot::Placeholder(text) => return draw_placeholder(root, figure, text),
        _ => {}
    }

    let ranges = figure.ranges();
    let mut chart = build_chart(root, figure, ranges.0.clone(), ranges.1.clone())?;
    let categories = figure.plot.categories();
    draw_mesh(&mut chart, figure, &ranges, categories.as_deref(), None)?;

    let legend = match &figure.plot {
        Plot::Bars(bars) => draw_bars(&mut chart, bars).map(|_| false)?,
        Plot::Boxes(boxes) => draw_boxes(&mut chart, boxes).map(|_| false)?,
        Plot::Violins(violins) => draw_violins(&mut chart, violins).map(|_| false)?,
        Plot::Scatter(series) => draw_scatter(&mut chart, series)?,
        Plot::Histogram(hists) => draw_histograms(&mut chart, hists)?,
        Plot::Density(series) => draw_areas(&mut chart, series, 0.25)?,
        Plot::Lines(series) => draw_lines(&mut chart, series)?,
        Plot::Areas(series) => draw_areas(&mut chart, series, 0.5)?,
        Plot::PairGrid(_) | Plot::Pie(_) | Plot::Radar(_) | Plot::Heatmap(_) | Plot::Placeholder(_) => {
            false
        }
    };
    if legend {
        draw_legend(&mut chart, figure)?;
    }
    Ok(())
}

fn draw_bars<'a, DB: DrawingBackend + 'a>(chart: &mut Chart<'a, DB>, bars: &[BarStat]) -> Result<()> {
    chart
        .draw_series(bars.iter().enumerate().map(|(i, b)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, b.mean)], color(i).mix(0.8).filled())
        }))
        .map_err(draw_err)?;
    chart
        .draw_series(bars.iter().enumerate().map(|(i, b)| {
            let x = i as f64;
            PathElement::new(vec![(x, b.lower), (x, b.upper)], BLACK.stroke_width(2))
        }))
        .map_err(draw_err)?;
    Ok(())
}

fn draw_boxes<'a, DB: DrawingBackend + 'a>(chart: &mut Chart<'a, DB>, boxes: &[BoxStat]) -> Result<()> {
    chart
        .draw_series(boxes.iter().enumerate().map(|(i, b)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, b.q1), (x + 0.4, b.q3)], color(i).mix(0.8).filled())
        }))
        .map_err(draw_err)?;
    chart
        .draw_series(boxes.iter().enumerate().flat_map(|(i, b)| {
            let x = i as f64;
            [
                vec![(x - 0.4, b.q1), (x + 0.4, b.q1), (x + 0.4, b.q3), (x - 0.4, b.q3), (x - 0.4, b.q1)],
                vec![(x - 0.4, b.median), (x + 0.4, b.median)],
                vec![(x, b.q1), (x, b.whisker_low)],
                vec![(x, b.q3), (x, b.whisker_high)],
                vec![(x - 0.2, b.whisker_low), (x + 0.2, b.whisker_low)],
                vec![(x - 0.2, b.whisker_high), (x + 0.2, b.whisker_high)],
            ]
            .into_iter()
            .map(|path| PathElement::new(path, BLACK.stroke_width(1)))
        }))
        .map_err(draw_err)?;
    chart
        .draw_series(boxes.iter().enumerate().flat_map(|(i, b)| {
            b.outliers
                .iter()
                .map(move |&y| Circle::new((i as f64, y), 3, BLACK.stroke_width(1)))
        }))
        .map_err(draw_err)?;
    Ok(())
}

fn draw_violins<'a, DB: DrawingBackend + 'a>(chart: &mut Chart<'a, DB>, violins: &[ViolinStat]) -> Result<()> {
    chart
        .draw_series(violins.iter().enumerate().map(|(i, v)| {
            let x = i as f64;
            let peak = v.outline.iter().map(|(_, d)| *d).fold(0.0, f64::max);
            let scale = if peak > 0.0 { 0.4 / peak } else { 0.0 };
            let right = v.outline.iter().map(|(y, d)| (x + d * scale, *y));
            let left = v.outline.iter().rev().map(|(y, d)| (x - d * scale, *y));
            Polygon::new(right.chain(left).collect::<Vec<_>>(), color(i).mix(0.8).filled())
        }))
        .map_err(draw_err)?;
    chart
        .draw_series(violins.iter().enumerate().map(|(i, v)| {
            let x = i as f64;
            Rectangle::new([(x - 0.03, v.q1), (x + 0.03, v.q3)], BLACK.filled())
        }))
        .map_err(draw_err)?;
    chart
        .draw_series(
            violins
                .iter()
                .enumerate()
                .map(|(i, v)| Circle::new((i as f64, v.median), 3, WHITE.filled())),
        )
        .map_err(draw_err)?;
    Ok(())
}

/// Returns whether any series carried a legend label
fn draw_scatter<'a, DB: DrawingBackend + 'a>(chart: &mut Chart<'a, DB>, series: &[Series]) -> Result<bool> {
    let mut labelled = false;
    for (i, s) in series.iter().enumerate() {
        let c = color(i);
        let anno = chart
            .draw_series(s.points.iter().map(|&p| Circle::new(p, 4, c.filled())))
            .map_err(draw_err)?;
        if !s.label.is_empty() {
            labelled = true;
            anno.label(s.label.as_str())
                .legend(move |(x, y)| Circle::new((x + 5, y), 4, c.filled()));
        }
    }
    Ok(labelled)
}

fn draw_lines<'a, DB: DrawingBackend + 'a>(chart: &mut Chart<'a, DB>, series: &[Series]) -> Result<bool> {
    let mut labelled = false;
    for (i, s) in series.iter().enumerate() {
        let c = color(i);
        let anno = chart
            .draw_series(LineSeries::new(s.points.iter().copied(), c.stroke_width(2)))
            .map_err(draw_err)?;
        if !s.label.is_empty() {
            labelled = true;
            anno.label(s.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], c.stroke_width(2)));
        }
    }
    Ok(labelled)
}

fn draw_areas<'a, DB: DrawingBackend + 'a>(
    chart: &mut Chart<'a, DB>,
    series: &[Series],
    alpha: f64,
) -> Result<bool> {
    let mut labelled = false;
    for (i, s) in series.iter().enumerate() {
        let c = color(i);
        let anno = chart
            .draw_series(
                AreaSeries::new(s.points.iter().copied(), 0.0, c.mix(alpha).filled()).border_style(c),
            )
            .map_err(draw_err)?;
        if !s.label.is_empty() {
            labelled = true;
            anno.label(s.label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], c.mix(alpha).filled()));
        }
    }
    Ok(labelled)
}

fn step_outline(hist: &HistogramSeries) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(hist.densities.len() * 2 + 2);
    for (w, &d) in hist.edges.windows(2).zip(&hist.densities) {
        points.push((w[0], d));
        points.push((w[1], d));
    }
    points
}

fn draw_histograms<'a, DB: DrawingBackend + 'a>(
    chart: &mut Chart<'a, DB>,
    hists: &[HistogramSeries],
) -> Result<bool> {
    let series: Vec<Series> = hists
        .iter()
        .map(|h| Series {
            label: h.label.clone(),
            points: step_outline(h),
        })
        .collect();
    draw_areas(chart, &series, 0.25)
}

fn draw_heatmap<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    heat: &Heatmap,
) -> Result<()> {
    let n = heat.labels.len();
    let ranges = figure.ranges();
    let mut chart = build_chart(root, figure, ranges.0.clone(), ranges.1.clone())?;
    // first row is drawn at the top
    let flipped: Vec<String> = heat.labels.iter().rev().cloned().collect();
    draw_mesh(&mut chart, figure, &ranges, Some(&heat.labels), Some(&flipped))?;

    let cells = heat.values.iter().enumerate().flat_map(|(i, row)| {
        row.iter().enumerate().map(move |(j, &v)| (i, j, v))
    });
    chart
        .draw_series(cells.clone().map(|(i, j, v)| {
            let x = j as f64;
            let y = (n - 1 - i) as f64;
            Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], coolwarm(v).filled())
        }))
        .map_err(draw_err)?;
    let family = figure.font_family();
    chart
        .draw_series(cells.map(|(i, j, v)| {
            Text::new(format!("{v:.2}"), (j as f64, (n - 1 - i) as f64), centered(family, 12.0))
        }))
        .map_err(draw_err)?;
    Ok(())
}

fn polar_chart<'a, DB: DrawingBackend + 'a>(
    root: &'a DrawingArea<DB, Shift>,
    figure: &Figure,
) -> Result<Chart<'a, DB>> {
    build_chart(root, figure, -POLAR_EXTENT..POLAR_EXTENT, -POLAR_EXTENT..POLAR_EXTENT)
}

fn draw_pie<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    slices: &[PieSlice],
) -> Result<()> {
    let mut chart = polar_chart(root, figure)?;
    let family = figure.font_family();
    // counter-clockwise from the positive x axis
    let mut start = 0.0;
    let mut wedges = Vec::with_capacity(slices.len());
    for slice in slices {
        let sweep = slice.fraction * 2.0 * PI;
        wedges.push((start, start + sweep));
        start += sweep;
    }

    chart
        .draw_series(wedges.iter().enumerate().map(|(i, &(a0, a1))| {
            let steps = ((a1 - a0) / (PI / 90.0)).ceil().max(1.0) as usize;
            let mut points = vec![(0.0, 0.0)];
            points.extend((0..=steps).map(|k| {
                let a = a0 + (a1 - a0) * k as f64 / steps as f64;
                (a.cos(), a.sin())
            }));
            Polygon::new(points, color(i).filled())
        }))
        .map_err(draw_err)?;
    chart
        .draw_series(slices.iter().zip(&wedges).flat_map(|(slice, &(a0, a1))| {
            let mid = (a0 + a1) / 2.0;
            [
                Text::new(slice.label.clone(), (1.1 * mid.cos(), 1.1 * mid.sin()), centered(family, 14.0)),
                Text::new(slice.percent_label(), (0.6 * mid.cos(), 0.6 * mid.sin()), centered(family, 12.0)),
            ]
        }))
        .map_err(draw_err)?;
    Ok(())
}

fn draw_radar<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    radar: &Radar,
) -> Result<()> {
    let mut chart = polar_chart(root, figure)?;
    let family = figure.font_family();

    let floor = radar.values.iter().copied().fold(0.0, f64::min);
    let peak = radar.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if peak > floor { peak - floor } else { 1.0 };
    let radius = |v: f64| (v - floor) / span;

    chart
        .draw_series((1..=4).map(|ring| {
            let r = ring as f64 / 4.0;
            let circle = (0..=120).map(|k| {
                let a = 2.0 * PI * k as f64 / 120.0;
                (r * a.cos(), r * a.sin())
            });
            PathElement::new(circle.collect::<Vec<_>>(), BLACK.mix(0.2))
        }))
        .map_err(draw_err)?;
    let spokes = &radar.angles[..radar.labels.len()];
    chart
        .draw_series(
            spokes
                .iter()
                .map(|a| PathElement::new(vec![(0.0, 0.0), (a.cos(), a.sin())], BLACK.mix(0.2))),
        )
        .map_err(draw_err)?;

    let points: Vec<(f64, f64)> = radar
        .angles
        .iter()
        .zip(&radar.values)
        .map(|(a, v)| (radius(*v) * a.cos(), radius(*v) * a.sin()))
        .collect();
    let c = color(0);
    chart
        .draw_series(std::iter::once(Polygon::new(points.clone(), c.mix(0.25).filled())))
        .map_err(draw_err)?;
    chart
        .draw_series(LineSeries::new(points.iter().copied(), c.stroke_width(2)))
        .map_err(draw_err)?;
    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 4, c.filled())))
        .map_err(draw_err)?;
    chart
        .draw_series(radar.labels.iter().zip(spokes).map(|(label, a)| {
            Text::new(label.clone(), (1.15 * a.cos(), 1.15 * a.sin()), centered(family, 14.0))
        }))
        .map_err(draw_err)?;
    Ok(())
}

fn draw_placeholder<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    text: &str,
) -> Result<()> {
    let ranges = figure.ranges();
    let mut chart = build_chart(root, figure, 0.0..1.0, 0.0..1.0)?;
    draw_mesh(&mut chart, figure, &ranges, None, None)?;
    chart
        .draw_series(std::iter::once(Text::new(
            text.to_string(),
            (0.5, 0.5),
            centered(figure.font_family(), 16.0),
        )))
        .map_err(draw_err)?;
    Ok(())
}

fn draw_pair_grid<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    grid: &PairGrid,
) -> Result<()> {
    let n = grid.variables.len();
    let family = figure.font_family();
    let areas = root.split_evenly((n, n));
    for (index, (area, cell)) in areas.iter().zip(&grid.cells).enumerate() {
        let (row, col) = (index / n, index % n);
        let series = match cell {
            PairCell::Diagonal(series) | PairCell::Scatter(series) => series,
        };
        let diagonal = matches!(cell, PairCell::Diagonal(_));
        let (x, y) = series_ranges(series, diagonal);

        let mut chart = ChartBuilder::on(area)
            .margin(5)
            .x_label_area_size(if row + 1 == n { 30 } else { 0 })
            .y_label_area_size(if col == 0 { 40 } else { 0 })
            .build_cartesian_2d(x, y)
            .map_err(draw_err)?;
        let mut mesh = chart.configure_mesh();
        mesh.label_style((family, 10)).axis_desc_style((family, 12));
        if row + 1 == n {
            mesh.x_desc(grid.variables[col].as_str());
        }
        if col == 0 {
            mesh.y_desc(grid.variables[row].as_str());
        }
        mesh.draw().map_err(draw_err)?;

        let labelled = if diagonal {
            draw_areas(&mut chart, series, 0.25)?
        } else {
            draw_scatter(&mut chart, series)?
        };
        if labelled && index + 1 == n {
            draw_legend(&mut chart, figure)?;
        }
    }
    Ok(())
}

/// Render `figure` as an SVG document
pub fn to_svg(figure: &Figure, width: u32, height: u32) -> Result<String> {
    let mut buffer = String::new();
    {
        let root = SVGBackend::with_string(&mut buffer, (width, height)).into_drawing_area();
        draw_figure(figure, &root)?;
        root.present().map_err(draw_err)?;
    }
    Ok(buffer)
}

/// Write `figure` to `path`; the extension selects SVG or PNG
pub fn save(figure: &Figure, path: &Path, width: u32, height: u32) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "svg" => {
            let root = SVGBackend::new(path, (width, height)).into_drawing_area();
            draw_figure(figure, &root)?;
            root.present().map_err(draw_err)?;
        }
        "png" => {
            let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
            draw_figure(figure, &root)?;
            root.present().map_err(draw_err)?;
        }
        other => return Err(Error::UnsupportedFormat(other.to_string())),
    }
    tracing::info!("Saved figure to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_label_only_on_integers() {
        let labels = vec!["A".to_string(), "B".to_string()];
        assert_eq!(category_label(&labels, 1.0), "B");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, 5.0), "");
        assert_eq!(category_label(&labels, -1.0), "");
    }

    #[test]
    fn test_coolwarm_ends() {
        assert_eq!(coolwarm(-1.0), RGBColor(59, 76, 192));
        assert_eq!(coolwarm(1.0), RGBColor(180, 4, 38));
        assert_eq!(coolwarm(0.0), RGBColor(221, 221, 221));
    }

    #[test]
    fn test_tick_count() {
        assert_eq!(tick_count(&(0.0..10.0), 2.5), 5);
        assert_eq!(tick_count(&(0.0..1.0), 5.0), 2);
    }
}
