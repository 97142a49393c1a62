//! User overlay applied after every graph recipe

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Free-form customization values; an empty string means "use the default"
///
/// Field names match the persisted settings keys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphCustomization {
    pub font: String,
    pub graph_name: String,
    pub x_axis_name: String,
    pub y_axis_name: String,
    pub x_max: String,
    pub x_tick: String,
    pub y_max: String,
    pub y_tick: String,
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn number(field: &'static str, value: &str) -> Result<Option<f64>> {
    match non_empty(value) {
        None => Ok(None),
        Some(text) => text
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .map(Some)
            .ok_or_else(|| Error::InvalidCustomization {
                field,
                value: text.to_string(),
            }),
    }
}

/// Parsed axis overrides
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisOverrides {
    pub x_max: Option<f64>,
    pub x_tick: Option<f64>,
    pub y_max: Option<f64>,
    pub y_tick: Option<f64>,
}

impl GraphCustomization {
    pub fn with_graph_name(mut self, name: impl Into<String>) -> Self {
        self.graph_name = name.into();
        self
    }

    pub fn with_axis_names(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_axis_name = x.into();
        self.y_axis_name = y.into();
        self
    }

    pub fn with_y_axis(mut self, max: impl Into<String>, tick: impl Into<String>) -> Self {
        self.y_max = max.into();
        self.y_tick = tick.into();
        self
    }

    pub fn with_x_axis(mut self, max: impl Into<String>, tick: impl Into<String>) -> Self {
        self.x_max = max.into();
        self.x_tick = tick.into();
        self
    }

    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self
    }

    pub fn font(&self) -> Option<&str> {
        non_empty(&self.font)
    }

    pub fn title(&self) -> Option<&str> {
        non_empty(&self.graph_name)
    }

    pub fn x_label(&self) -> Option<&str> {
        non_empty(&self.x_axis_name)
    }

    pub fn y_label(&self) -> Option<&str> {
        non_empty(&self.y_axis_name)
    }

    /// Parse the numeric axis fields; a non-numeric entry is an error
    pub fn axis_overrides(&self) -> Result<AxisOverrides> {
        let overrides = AxisOverrides {
            x_max: number("x_max", &self.x_max)?,
            x_tick: number("x_tick", &self.x_tick)?,
            y_max: number("y_max", &self.y_max)?,
            y_tick: number("y_tick", &self.y_tick)?,
        };
        for (field, tick) in [("x_tick", overrides.x_tick), ("y_tick", overrides.y_tick)] {
            if tick.is_some_and(|t| t <= 0.0) {
                return Err(Error::InvalidCustomization {
                    field,
                    value: format!("{}", tick.unwrap_or_default()),
                });
            }
        }
        Ok(overrides)
    }

    /// True when every field is empty
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fields_mean_default() {
        let custom = GraphCustomization::default().with_graph_name("  ");
        assert_eq!(custom.title(), None);
        assert_eq!(custom.axis_overrides().unwrap(), AxisOverrides::default());
    }

    #[test]
    fn test_axis_overrides_parse() {
        let custom = GraphCustomization::default().with_y_axis("10", "2.5");
        let axes = custom.axis_overrides().unwrap();
        assert_eq!(axes.y_max, Some(10.0));
        assert_eq!(axes.y_tick, Some(2.5));
        assert_eq!(axes.x_max, None);
    }

    #[test]
    fn test_invalid_number_rejected() {
        let custom = GraphCustomization::default().with_x_axis("ten", "");
        assert!(matches!(
            custom.axis_overrides(),
            Err(Error::InvalidCustomization { field: "x_max", .. })
        ));
        let custom = GraphCustomization::default().with_y_axis("", "0");
        assert!(custom.axis_overrides().is_err());
    }

    #[test]
    fn test_serde_uses_settings_keys() {
        let json = r#"{"graph_name": "売上", "y_max": "5"}"#;
        let custom: GraphCustomization = serde_json::from_str(json).unwrap();
        assert_eq!(custom.title(), Some("売上"));
        assert_eq!(custom.y_max, "5");
        assert_eq!(custom.font, "");
    }
}
