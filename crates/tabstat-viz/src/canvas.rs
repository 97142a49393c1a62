//! The shared canvas and its non-fatal render boundary

use crate::customization::GraphCustomization;
use crate::draw;
use crate::error::{Error, Result};
use crate::figure::Figure;
use crate::graph_type::GraphSelection;
use crate::recipes::build_figure;
use std::path::Path;
use tabstat_core::Dataset;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

/// Result of a render attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered,
    /// The message that was logged; the previous figure is still shown
    Failed(String),
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered)
    }
}

/// Holds the most recently rendered figure
#[derive(Debug, Clone)]
pub struct GraphCanvas {
    figure: Option<Figure>,
    width: u32,
    height: u32,
}

impl Default for GraphCanvas {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl GraphCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            figure: None,
            width,
            height,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Build and draw a figure, replacing the current one only on success
    ///
    /// Failures never propagate: they are logged and returned as
    /// [`RenderOutcome::Failed`], and the canvas keeps its prior figure.
    pub fn render(
        &mut self,
        data: &Dataset,
        test_label: &str,
        selection: &GraphSelection,
        custom: &GraphCustomization,
    ) -> RenderOutcome {
        let attempt = build_figure(data, test_label, selection, custom)
            .and_then(|figure| draw::to_svg(&figure, self.width, self.height).map(|_| figure));
        match attempt {
            Ok(figure) => {
                tracing::debug!("Rendered {} for '{}'", selection, test_label);
                self.figure = Some(figure);
                RenderOutcome::Rendered
            }
            Err(e) => {
                let message = format!("グラフの作成中にエラーが発生しました: {e}");
                tracing::error!("{message}");
                RenderOutcome::Failed(message)
            }
        }
    }

    /// Current figure, if any render has succeeded
    pub fn figure(&self) -> Option<&Figure> {
        self.figure.as_ref()
    }

    fn current(&self) -> Result<&Figure> {
        self.figure.as_ref().ok_or(Error::NoFigure)
    }

    /// Current figure as an SVG document
    pub fn to_svg(&self) -> Result<String> {
        draw::to_svg(self.current()?, self.width, self.height)
    }

    /// Write the current figure as SVG or PNG, chosen by extension
    pub fn save(&self, path: &Path) -> Result<()> {
        draw::save(self.current()?, path, self.width, self.height)
    }

    pub fn clear(&mut self) {
        self.figure = None;
    }
}
