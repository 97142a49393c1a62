//! End-to-end rendering through the canvas

use approx::assert_relative_eq;
use std::f64::consts::PI;
use tabstat_core::{columns, Column, Dataset};
use tabstat_viz::figure::{PairCell, UNSUPPORTED_GRAPH_MESSAGE};
use tabstat_viz::{
    build_figure, GraphCanvas, GraphCustomization, GraphSelection, GraphType, Plot,
};

fn sample() -> Dataset {
    Dataset::from_columns(vec![
        Column::text(columns::GROUP, vec!["A", "A", "A", "B", "B", "B", "C", "C", "C"]),
        Column::numeric(columns::VALUE, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.5, 7.0, 8.5, 9.0]),
        Column::numeric(columns::X, vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0]),
        Column::numeric(columns::Y, vec![2.0, 1.0, 4.0, 3.0, 6.0, 5.0, 8.0, 7.0, 9.0]),
    ])
    .unwrap()
}

#[test]
fn radar_closes_the_loop() {
    let figure = build_figure(
        &sample(),
        "一元配置分散分析",
        &GraphType::Radar.into(),
        &GraphCustomization::default(),
    )
    .unwrap();
    let Plot::Radar(radar) = figure.plot else {
        panic!("expected radar plot");
    };
    assert_eq!(radar.labels, vec!["A", "B", "C"]);
    assert_eq!(radar.angles.len(), 4);
    assert_eq!(radar.values.len(), 4);
    assert_relative_eq!(radar.angles[1], 2.0 * PI / 3.0);
    assert_eq!(radar.angles[0], radar.angles[3]);
    assert_eq!(radar.values[0], radar.values[3]);
    assert_relative_eq!(radar.values[0], 2.0);
}

#[test]
fn every_graph_type_renders() {
    let data = sample();
    for graph in GraphType::ALL {
        let mut canvas = GraphCanvas::default();
        let outcome = canvas.render(&data, "t検定", &graph.into(), &GraphCustomization::default());
        assert!(outcome.is_rendered(), "{graph}: {outcome:?}");
        assert!(canvas.to_svg().unwrap().starts_with("<svg"));
    }
}

#[test]
fn unsupported_graph_shows_placeholder() {
    let selection: GraphSelection = "3Dサーフェス".parse().unwrap();
    let mut canvas = GraphCanvas::default();
    let outcome = canvas.render(&sample(), "t検定", &selection, &GraphCustomization::default());
    assert!(outcome.is_rendered());
    let figure = canvas.figure().unwrap();
    assert_eq!(figure.plot, Plot::Placeholder(UNSUPPORTED_GRAPH_MESSAGE.to_string()));
    assert_eq!(figure.title, "t検定 - 3Dサーフェス");
}

#[test]
fn failed_render_keeps_previous_figure() {
    let mut canvas = GraphCanvas::default();
    assert!(canvas
        .render(&sample(), "t検定", &GraphType::Bar.into(), &GraphCustomization::default())
        .is_rendered());

    let no_group = Dataset::from_columns(vec![Column::numeric(columns::VALUE, vec![1.0, 2.0])]).unwrap();
    let outcome = canvas.render(&no_group, "t検定", &GraphType::Pie.into(), &GraphCustomization::default());
    match outcome {
        tabstat_viz::RenderOutcome::Failed(message) => {
            assert!(message.starts_with("グラフの作成中にエラーが発生しました"))
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(matches!(canvas.figure().unwrap().plot, Plot::Bars(_)));
}

#[test]
fn invalid_axis_customization_is_a_render_failure() {
    let mut canvas = GraphCanvas::default();
    let custom = GraphCustomization::default().with_y_axis("lots", "");
    let outcome = canvas.render(&sample(), "t検定", &GraphType::Bar.into(), &custom);
    assert!(!outcome.is_rendered());
    assert!(canvas.figure().is_none());
}

#[test]
fn customization_overrides_defaults() {
    let custom = GraphCustomization::default()
        .with_graph_name("売上比較")
        .with_axis_names("店舗", "売上")
        .with_y_axis("20", "5");
    let figure = build_figure(&sample(), "t検定", &GraphType::Bar.into(), &custom).unwrap();
    assert_eq!(figure.title, "売上比較");
    assert_eq!(figure.x_label, "店舗");
    assert_eq!(figure.y_label, "売上");
    assert_eq!(figure.ranges().1.end, 20.0);

    let defaults = build_figure(&sample(), "t検定", &GraphType::Bar.into(), &GraphCustomization::default()).unwrap();
    assert_eq!(defaults.title, "t検定 - 棒グラフ");
    assert_eq!(defaults.x_label, "グループ");
    assert_eq!(defaults.y_label, "値");
}

#[test]
fn pair_plot_skips_overlay() {
    let custom = GraphCustomization::default().with_graph_name("ignored");
    let figure = build_figure(&sample(), "t検定", &GraphType::PairPlot.into(), &custom).unwrap();
    assert!(!figure.overlay);
    assert!(figure.title.is_empty());
    let Plot::PairGrid(grid) = figure.plot else {
        panic!("expected pair grid");
    };
    assert_eq!(grid.variables, vec!["value", "x", "y"]);
    assert_eq!(grid.cells.len(), 9);
    assert!(matches!(grid.cells[0], PairCell::Diagonal(_)));
    assert!(matches!(grid.cells[1], PairCell::Scatter(_)));
}

#[test]
fn save_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let mut canvas = GraphCanvas::default();
    assert!(canvas.save(&dir.path().join("none.svg")).is_err());

    canvas.render(&sample(), "t検定", &GraphType::Line.into(), &GraphCustomization::default());
    let svg = dir.path().join("graph.svg");
    canvas.save(&svg).unwrap();
    assert!(std::fs::read_to_string(&svg).unwrap().contains("<svg"));

    let png = dir.path().join("graph.png");
    canvas.save(&png).unwrap();
    assert!(std::fs::metadata(&png).unwrap().len() > 0);

    assert!(matches!(
        canvas.save(&dir.path().join("graph.gif")),
        Err(tabstat_viz::Error::UnsupportedFormat(_))
    ));
}
