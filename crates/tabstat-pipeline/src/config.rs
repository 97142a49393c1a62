//! Session configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tabstat_analysis::DEFAULT_WORKERS;
use tabstat_viz::canvas::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Settings file used when none is configured
pub const DEFAULT_SETTINGS_FILE: &str = "user_settings.json";

/// Parameters for an [`AnalysisSession`](crate::AnalysisSession)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub settings_path: PathBuf,
    pub analysis_workers: usize,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from(DEFAULT_SETTINGS_FILE),
            analysis_workers: DEFAULT_WORKERS,
            canvas_width: DEFAULT_WIDTH,
            canvas_height: DEFAULT_HEIGHT,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings_path(mut self, path: impl AsRef<Path>) -> Self {
        self.settings_path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_analysis_workers(mut self, workers: usize) -> Self {
        self.analysis_workers = workers;
        self
    }

    pub fn with_canvas_size(mut self, width: u32, height: u32) -> Self {
        self.canvas_width = width;
        self.canvas_height = height;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new();
        assert_eq!(config.settings_path, PathBuf::from("user_settings.json"));
        assert_eq!(config.analysis_workers, 4);
        assert_eq!((config.canvas_width, config.canvas_height), (800, 600));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"analysis_workers": 2}"#).unwrap();
        assert_eq!(config.analysis_workers, 2);
        assert_eq!(config.canvas_width, 800);
    }
}
