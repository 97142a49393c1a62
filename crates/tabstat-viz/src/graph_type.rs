//! The closed catalogue of graph types

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Every graph recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphType {
    Bar,
    Box,
    Violin,
    Scatter,
    Histogram,
    Kde,
    Heatmap,
    PairPlot,
    Line,
    Area,
    Pie,
    Radar,
}

impl GraphType {
    /// Menu order
    pub const ALL: [GraphType; 12] = [
        Self::Bar,
        Self::Box,
        Self::Violin,
        Self::Scatter,
        Self::Histogram,
        Self::Kde,
        Self::Heatmap,
        Self::PairPlot,
        Self::Line,
        Self::Area,
        Self::Pie,
        Self::Radar,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Bar => "棒グラフ",
            Self::Box => "箱ひげグラフ",
            Self::Violin => "バイオリンプロット",
            Self::Scatter => "散布図",
            Self::Histogram => "ヒストグラム",
            Self::Kde => "カーネル密度推定",
            Self::Heatmap => "ヒートマップ",
            Self::PairPlot => "ペアプロット",
            Self::Line => "折れ線グラフ",
            Self::Area => "面グラフ",
            Self::Pie => "円グラフ",
            Self::Radar => "レーダーチャート",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Box => "box",
            Self::Violin => "violin",
            Self::Scatter => "scatter",
            Self::Histogram => "histogram",
            Self::Kde => "kde",
            Self::Heatmap => "heatmap",
            Self::PairPlot => "pairplot",
            Self::Line => "line",
            Self::Area => "area",
            Self::Pie => "pie",
            Self::Radar => "radar",
        }
    }

    pub fn from_identifier(input: &str) -> Option<Self> {
        let needle = input.trim();
        Self::ALL
            .into_iter()
            .find(|g| g.label() == needle || g.slug().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A graph type as received from the user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum GraphSelection {
    Known(GraphType),
    /// Renders the placeholder message
    Unsupported(String),
}

impl GraphSelection {
    pub fn label(&self) -> &str {
        match self {
            Self::Known(g) => g.label(),
            Self::Unsupported(raw) => raw,
        }
    }
}

impl Default for GraphSelection {
    fn default() -> Self {
        Self::Known(GraphType::Bar)
    }
}

impl From<GraphType> for GraphSelection {
    fn from(g: GraphType) -> Self {
        Self::Known(g)
    }
}

impl From<String> for GraphSelection {
    fn from(s: String) -> Self {
        match GraphType::from_identifier(&s) {
            Some(g) => Self::Known(g),
            None => Self::Unsupported(s),
        }
    }
}

impl From<GraphSelection> for String {
    fn from(selection: GraphSelection) -> Self {
        selection.label().to_string()
    }
}

impl FromStr for GraphSelection {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for GraphSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
