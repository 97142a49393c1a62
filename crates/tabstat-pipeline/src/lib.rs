//! Session orchestration for tabstat
//!
//! An [`AnalysisSession`] owns the [`PipelineState`] and drives the push
//! pipeline: a new dataset (imported or preprocessed) reruns the selected
//! test, the test's result and graph go to the [`ResultsSink`], and the sink
//! hands the pair to the export and report consumers before returning.
//!
//! Advanced analyses run on a worker pool; their completions are queued and
//! applied on the session's thread by [`AnalysisSession::poll_analysis`].
//!
//! Selections persist through a [`SettingsStore`] under the keys
//! `selected_test`, `graph_type` and `graph_customization`.
//!
//! # Example
//!
//! ```rust,no_run
//! use tabstat_core::{Column, Dataset};
//! use tabstat_hypothesis::StatTest;
//! use tabstat_pipeline::{AnalysisSession, SessionConfig};
//!
//! let mut session = AnalysisSession::new(SessionConfig::default()).unwrap();
//! let data = Dataset::from_columns(vec![
//!     Column::text("group", vec!["A", "A", "A", "B", "B", "B"]),
//!     Column::numeric("value", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
//! ])
//! .unwrap();
//!
//! session.load_data(data).unwrap();
//! let result = session.select_test(StatTest::IndependentT.into()).unwrap();
//! assert!(result.unwrap().significant);
//! session.export_csv("results.csv").unwrap();
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod session;
pub mod settings;
pub mod sink;
pub mod state;

pub use config::SessionConfig;
pub use error::{Error, Result, Stage, StageError, StageResult};
pub use events::{ChannelEventHandler, EventBus, EventHandler, PipelineEvent, TracingEventHandler};
pub use session::{AnalysisSession, ANALYSIS_TEST_LABEL};
pub use settings::SettingsStore;
pub use sink::{ResultConsumer, ResultsSink};
pub use state::PipelineState;
