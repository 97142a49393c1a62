//! Graph recipes and rendering for tabstat
//!
//! A graph is produced in two steps. [`build_figure`] runs the recipe for a
//! [`GraphType`] against the conventional columns and applies the user's
//! [`GraphCustomization`], yielding a backend-independent [`Figure`].
//! [`draw`] then renders the figure with plotters to SVG or PNG.
//!
//! [`GraphCanvas`] wraps both steps behind a non-fatal boundary: a failed
//! render is logged and leaves the previously rendered figure in place.
//!
//! | Graph | Columns |
//! |-------|---------|
//! | bar, box, violin, pie, radar | `group`, `value` |
//! | histogram, KDE | `value`, optional `group` |
//! | scatter | `x`, `y`, optional `group` |
//! | line | `x`, `value`, optional `group` |
//! | area | `x`, `group`, `value` |
//! | heatmap | every numeric column |
//! | pair plot | `group` plus every other numeric column |
//!
//! # Example
//!
//! ```rust
//! use tabstat_core::{columns, Column, Dataset};
//! use tabstat_viz::{GraphCanvas, GraphCustomization, GraphSelection, GraphType};
//!
//! let data = Dataset::from_columns(vec![
//!     Column::text(columns::GROUP, vec!["A", "A", "B", "B"]),
//!     Column::numeric(columns::VALUE, vec![1.0, 2.0, 3.0, 5.0]),
//! ])
//! .unwrap();
//!
//! let mut canvas = GraphCanvas::default();
//! let outcome = canvas.render(
//!     &data,
//!     "t検定",
//!     &GraphSelection::from(GraphType::Box),
//!     &GraphCustomization::default(),
//! );
//! assert!(outcome.is_rendered());
//! assert_eq!(canvas.figure().unwrap().title, "t検定 - 箱ひげグラフ");
//! ```

pub mod canvas;
pub mod customization;
pub mod draw;
pub mod error;
pub mod figure;
pub mod graph_type;
pub mod kde;
pub mod recipes;

pub use canvas::{GraphCanvas, RenderOutcome};
pub use customization::{AxisOverrides, GraphCustomization};
pub use error::{Error, Result};
pub use figure::{Figure, Plot};
pub use graph_type::{GraphSelection, GraphType};
pub use recipes::build_figure;
