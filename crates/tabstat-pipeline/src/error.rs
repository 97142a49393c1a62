//! Error types for the session pipeline

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage that caught a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Import,
    Preprocess,
    Test,
    PostHoc,
    Analysis,
    Export,
    Report,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Preprocess => "preprocess",
            Self::Test => "test",
            Self::PostHoc => "post-hoc",
            Self::Analysis => "analysis",
            Self::Export => "export",
            Self::Report => "report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failure caught and reported at a stage boundary
///
/// `message` is the user-facing text; the state behind the boundary is
/// unchanged when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StageError {
    pub stage: Stage,
    pub message: String,
}

impl StageError {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Result of a stage boundary
pub type StageResult<T> = std::result::Result<T, StageError>;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum Error {
    /// Core computation error
    #[error(transparent)]
    Core(#[from] tabstat_core::Error),

    /// Rendering error
    #[error(transparent)]
    Viz(#[from] tabstat_viz::Error),

    /// Import, export or report error
    #[error(transparent)]
    Io(#[from] tabstat_io::Error),

    /// Failure reported by a stage boundary
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Settings file could not be written
    #[error("Failed to write settings file {path:?}: {source}")]
    SettingsWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Settings could not be serialized
    #[error("Settings serialization error: {0}")]
    SettingsFormat(#[from] serde_json::Error),

    /// A shared lock was poisoned by a panicking holder
    #[error("Failed to lock {0}")]
    Poisoned(&'static str),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
