//! Session orchestration: import, preprocess, test, graph, publish
//!
//! Every public stage method is a boundary. Failures are caught there,
//! logged, published as [`PipelineEvent::StageFailed`] and returned as a
//! [`StageError`]; the state behind the boundary is left untouched.

use crate::config::SessionConfig;
use crate::error::{Result, Stage, StageError, StageResult};
use crate::events::{EventBus, PipelineEvent};
use crate::settings::{SettingsStore, GRAPH_CUSTOMIZATION, GRAPH_TYPE, SELECTED_TEST};
use crate::sink::ResultsSink;
use crate::state::PipelineState;
use crossbeam_channel::{Receiver, Sender};
use std::path::Path;
use std::time::Duration;
use tabstat_analysis::{AnalysisMethod, AnalysisOutput, AnalysisPool};
use tabstat_core::{columns, Dataset};
use tabstat_hypothesis::{run_post_hoc, run_test, PostHocSelection, TestResult, TestSelection};
use tabstat_io::ReportOptions;
use tabstat_preprocess::{preprocess, PreprocessingConfig};
use tabstat_viz::{GraphCanvas, GraphCustomization, GraphSelection, RenderOutcome};
use uuid::Uuid;

/// Test label used when rendering analysis output
pub const ANALYSIS_TEST_LABEL: &str = "高度な分析";

const NO_DATA: &str = "データが読み込まれていません。";
const NO_TEST: &str = "検定が選択されていません。";
const POST_HOC_DISABLED: &str =
    "Post Hoc検定は3群以上の一元配置分散分析、Kruskal-Wallis検定またはFriedman検定の後にのみ実行できます。";

/// Minimum number of `group` levels for post-hoc comparisons
pub const POST_HOC_MIN_GROUPS: usize = 3;

/// An analysis run that finished on the worker pool
#[derive(Debug)]
struct Completion {
    /// State version the analysis was submitted against
    version: u64,
    method: AnalysisMethod,
    result: tabstat_core::Result<AnalysisOutput>,
}

/// One user's working session
pub struct AnalysisSession {
    config: SessionConfig,
    trace_id: Uuid,
    state: PipelineState,
    canvas: GraphCanvas,
    sink: ResultsSink,
    settings: SettingsStore,
    events: EventBus,
    pool: AnalysisPool,
    completions_tx: Sender<Completion>,
    completions_rx: Receiver<Completion>,
    pending: usize,
    post_hoc_enabled: bool,
}

impl AnalysisSession {
    pub fn new(config: SessionConfig) -> Result<Self> {
        let pool = AnalysisPool::with_workers(config.analysis_workers)?;
        let settings = SettingsStore::open(&config.settings_path);
        let (completions_tx, completions_rx) = crossbeam_channel::unbounded();
        let trace_id = Uuid::new_v4();
        tracing::debug!(%trace_id, workers = pool.workers(), "session started");
        Ok(Self {
            canvas: GraphCanvas::new(config.canvas_width, config.canvas_height),
            sink: ResultsSink::new(config.canvas_width, config.canvas_height),
            config,
            trace_id,
            state: PipelineState::new(),
            settings,
            events: EventBus::new(),
            pool,
            completions_tx,
            completions_rx,
            pending: 0,
            post_hoc_enabled: false,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn canvas(&self) -> &GraphCanvas {
        &self.canvas
    }

    pub fn sink(&self) -> &ResultsSink {
        &self.sink
    }

    /// Mutable sink access, for registering observers
    pub fn sink_mut(&mut self) -> &mut ResultsSink {
        &mut self.sink
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Event bus; clones share handlers with the session
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn post_hoc_enabled(&self) -> bool {
        self.post_hoc_enabled
    }

    fn emit(&self, event: PipelineEvent) {
        self.events.publish(event);
    }

    fn fail(&self, stage: Stage, message: String) -> StageError {
        tracing::error!(%stage, "{message}");
        self.emit(PipelineEvent::StageFailed {
            trace_id: self.trace_id,
            stage,
            error: message.clone(),
        });
        StageError::new(stage, message)
    }

    fn require_data(&self, stage: Stage) -> StageResult<&Dataset> {
        self.state
            .data()
            .ok_or_else(|| self.fail(stage, NO_DATA.to_string()))
    }

    // ===== Data =====

    /// Replace the current dataset and rerun the selected test, if any
    pub fn load_data(&mut self, data: Dataset) -> StageResult<Option<TestResult>> {
        let (rows, n_columns) = (data.n_rows(), data.n_columns());
        let version = self.state.set_data(data);
        tracing::info!(rows, columns = n_columns, "Data imported");
        self.emit(PipelineEvent::DataLoaded {
            trace_id: self.trace_id,
            version,
            rows,
            columns: n_columns,
        });
        self.update_post_hoc_availability();
        self.rerun_selected_test()
    }

    /// Preprocess the current dataset in place and rerun the selected test
    pub fn preprocess(
        &mut self,
        config: &PreprocessingConfig,
    ) -> StageResult<Option<TestResult>> {
        tracing::debug!(?config, "preprocessing");
        let data = self.require_data(Stage::Preprocess)?;
        let rows_in = data.n_rows();
        let processed = preprocess(data, config).map_err(|e| {
            self.fail(
                Stage::Preprocess,
                format!("前処理中にエラーが発生しました: {e}"),
            )
        })?;
        let rows_out = processed.n_rows();
        let version = self.state.set_data(processed);
        self.emit(PipelineEvent::DataPreprocessed {
            trace_id: self.trace_id,
            version,
            rows_in,
            rows_out,
        });
        self.update_post_hoc_availability();
        self.rerun_selected_test()
    }

    fn rerun_selected_test(&mut self) -> StageResult<Option<TestResult>> {
        if self.state.selected_test().is_none() {
            return Ok(None);
        }
        self.run_statistical_test().map(Some)
    }

    // ===== Selections =====

    /// Select a test; runs it at once when a dataset is loaded
    pub fn select_test(
        &mut self,
        selection: TestSelection,
    ) -> StageResult<Option<TestResult>> {
        tracing::info!("Selected test: {selection}");
        self.emit(PipelineEvent::TestSelected {
            trace_id: self.trace_id,
            test: selection.label().to_string(),
        });
        self.state.set_selected_test(Some(selection));
        self.update_post_hoc_availability();
        if self.state.data().is_none() {
            return Ok(None);
        }
        self.run_statistical_test().map(Some)
    }

    /// Graph type used by the next render
    pub fn select_graph(&mut self, graph: GraphSelection) {
        self.state.set_graph(graph);
    }

    /// Customization used by the next render
    pub fn set_customization(&mut self, customization: GraphCustomization) {
        self.state.set_customization(customization);
    }

    // ===== Dispatch =====

    /// Run the selected test, render its graph and publish both
    pub fn run_statistical_test(&mut self) -> StageResult<TestResult> {
        let data = self.require_data(Stage::Test)?;
        let selection = self
            .state
            .selected_test()
            .ok_or_else(|| self.fail(Stage::Test, NO_TEST.to_string()))?;
        let result = run_test(selection, data).map_err(|e| {
            self.fail(
                Stage::Test,
                format!("統計検定の実行中にエラーが発生しました: {e}"),
            )
        })?;

        let test_label = selection.label().to_string();
        let data = data.clone();
        self.emit(PipelineEvent::TestCompleted {
            trace_id: self.trace_id,
            test: test_label.clone(),
            significant: result.significant,
        });
        self.state.set_last_result(result.clone());

        self.render(&data, &test_label);
        self.publish(Dataset::single_text(columns::RESULT, result.summary.clone()));
        Ok(result)
    }

    /// Recompute whether post-hoc comparisons may run and announce it
    ///
    /// Enabled when a dataset is loaded, the selected test is an omnibus
    /// group comparison and `group` has at least three levels.
    pub fn update_post_hoc_availability(&mut self) -> bool {
        let supports = self
            .state
            .selected_test()
            .is_some_and(TestSelection::supports_post_hoc);
        let enough_groups = self.state.data().is_some_and(|data| {
            data.distinct_levels(columns::GROUP)
                .is_ok_and(|levels| levels.len() >= POST_HOC_MIN_GROUPS)
        });
        let enabled = supports && enough_groups;
        if enabled != self.post_hoc_enabled {
            tracing::debug!(enabled, "post-hoc availability changed");
        }
        self.post_hoc_enabled = enabled;
        self.emit(PipelineEvent::PostHocAvailability {
            trace_id: self.trace_id,
            enabled,
        });
        enabled
    }

    /// Run a post-hoc procedure on the current dataset and publish its table
    ///
    /// The figure published alongside is whatever the canvas currently shows.
    pub fn run_post_hoc(
        &mut self,
        selection: &PostHocSelection,
    ) -> StageResult<String> {
        let data = self.require_data(Stage::PostHoc)?;
        if !self.post_hoc_enabled {
            return Err(self.fail(Stage::PostHoc, POST_HOC_DISABLED.to_string()));
        }
        let summary = run_post_hoc(selection, data).map_err(|e| {
            self.fail(
                Stage::PostHoc,
                format!("Post Hoc検定の実行中にエラーが発生しました: {e}"),
            )
        })?;
        self.emit(PipelineEvent::PostHocCompleted {
            trace_id: self.trace_id,
            procedure: selection.label().to_string(),
        });
        self.publish(Dataset::single_text(columns::RESULT, summary.clone()));
        Ok(summary)
    }

    /// Re-render the current dataset with the current selections
    ///
    /// A successful render republishes the latest result with the new figure.
    pub fn render_graph(&mut self) -> RenderOutcome {
        let Some(data) = self.state.data().cloned() else {
            return RenderOutcome::Failed(NO_DATA.to_string());
        };
        let label = self
            .state
            .selected_test()
            .map(|t| t.label().to_string())
            .unwrap_or_default();
        let outcome = self.render(&data, &label);
        if outcome.is_rendered() {
            if let Some(results) = self.sink.results().cloned() {
                self.publish(results);
            }
        }
        outcome
    }

    fn render(&mut self, data: &Dataset, test_label: &str) -> RenderOutcome {
        let graph = self.state.graph().clone();
        let outcome = self
            .canvas
            .render(data, test_label, &graph, self.state.customization());
        match &outcome {
            RenderOutcome::Rendered => self.emit(PipelineEvent::GraphRendered {
                trace_id: self.trace_id,
                test: test_label.to_string(),
                graph: graph.label().to_string(),
            }),
            RenderOutcome::Failed(message) => self.emit(PipelineEvent::RenderFailed {
                trace_id: self.trace_id,
                message: message.clone(),
            }),
        }
        outcome
    }

    /// Push a result and the canvas figure to every consumer
    fn publish(&mut self, results: Dataset) {
        let figure = self.canvas.figure().cloned();
        let has_figure = figure.is_some();
        self.sink.publish(results, figure);
        self.emit(PipelineEvent::ResultsPublished {
            trace_id: self.trace_id,
            version: self.state.version(),
            has_figure,
        });
    }

    // ===== Advanced analysis =====

    /// Queue an analysis of a snapshot of the current dataset
    ///
    /// The result is applied by [`poll_analysis`](Self::poll_analysis) or
    /// [`wait_analysis`](Self::wait_analysis) on the session's thread.
    pub fn submit_analysis(&mut self, method: AnalysisMethod) -> StageResult<()> {
        let data = self.require_data(Stage::Analysis)?.clone();
        let version = self.state.version();
        let tx = self.completions_tx.clone();
        self.pool.submit(data, method, move |result| {
            // The receiver lives as long as the session
            let _ = tx.send(Completion {
                version,
                method,
                result,
            });
        });
        self.pending += 1;
        self.emit(PipelineEvent::AnalysisSubmitted {
            trace_id: self.trace_id,
            method: method.label().to_string(),
        });
        Ok(())
    }

    /// Number of submitted analyses not yet applied
    pub fn pending_analyses(&self) -> usize {
        self.pending
    }

    /// Apply every analysis that has finished, without blocking
    pub fn poll_analysis(&mut self) -> Vec<StageResult<AnalysisOutput>> {
        let mut applied = Vec::new();
        while let Ok(completion) = self.completions_rx.try_recv() {
            applied.push(self.apply_completion(completion));
        }
        applied
    }

    /// Block until one analysis finishes, or `timeout` elapses
    pub fn wait_analysis(
        &mut self,
        timeout: Duration,
    ) -> Option<StageResult<AnalysisOutput>> {
        if self.pending == 0 {
            return None;
        }
        let completion = self.completions_rx.recv_timeout(timeout).ok()?;
        Some(self.apply_completion(completion))
    }

    fn apply_completion(
        &mut self,
        completion: Completion,
    ) -> StageResult<AnalysisOutput> {
        self.pending = self.pending.saturating_sub(1);
        let Completion {
            version,
            method,
            result,
        } = completion;
        let output = result.map_err(|e| {
            self.fail(Stage::Analysis, format!("分析中にエラーが発生しました: {e}"))
        })?;
        if version != self.state.version() {
            tracing::debug!(
                submitted = version,
                current = self.state.version(),
                "analysis finished against an older state"
            );
        }

        self.render(&output.data, ANALYSIS_TEST_LABEL);
        self.publish(output.data.clone());
        self.emit(PipelineEvent::AnalysisCompleted {
            trace_id: self.trace_id,
            method: method.label().to_string(),
            summary: output.summary.clone(),
        });
        Ok(output)
    }

    // ===== Settings =====

    /// Write the selected test, graph type and customization
    pub fn save_settings(&mut self) -> Result<()> {
        self.settings
            .set(SELECTED_TEST, self.state.selected_test().cloned())?;
        self.settings.set(GRAPH_TYPE, self.state.graph().clone())?;
        self.settings
            .set(GRAPH_CUSTOMIZATION, self.state.customization().clone())?;
        self.emit(PipelineEvent::SettingsSaved {
            trace_id: self.trace_id,
        });
        Ok(())
    }

    /// Restore whichever of the three selections the settings file holds
    ///
    /// Returns `true` when at least one value was restored. The restored test
    /// is not run until the next dispatch.
    pub fn load_settings(&mut self) -> bool {
        self.settings.reload();
        let mut restored = false;
        if let Some(test) = self.settings.get_as::<TestSelection>(SELECTED_TEST) {
            self.state.set_selected_test(Some(test));
            restored = true;
        }
        if let Some(graph) = self.settings.get_as::<GraphSelection>(GRAPH_TYPE) {
            self.state.set_graph(graph);
            restored = true;
        }
        if let Some(custom) = self.settings.get_as::<GraphCustomization>(GRAPH_CUSTOMIZATION) {
            self.state.set_customization(custom);
            restored = true;
        }
        self.update_post_hoc_availability();
        self.emit(PipelineEvent::SettingsLoaded {
            trace_id: self.trace_id,
        });
        restored
    }

    pub fn clear_settings(&mut self) -> Result<()> {
        self.settings.clear()?;
        self.emit(PipelineEvent::SettingsCleared {
            trace_id: self.trace_id,
        });
        Ok(())
    }

    // ===== Export =====

    /// Write the latest result table as CSV
    pub fn export_csv(&self, path: impl AsRef<Path>) -> StageResult<()> {
        self.sink.exporter().export_csv(path).map_err(|e| {
            self.fail(Stage::Export, e.to_string())
        })
    }

    /// Write the latest result table as an XLSX workbook
    pub fn export_xlsx(&self, path: impl AsRef<Path>) -> StageResult<()> {
        self.sink.exporter().export_xlsx(path).map_err(|e| {
            self.fail(Stage::Export, e.to_string())
        })
    }

    /// Write the latest figure as SVG or PNG
    pub fn export_image(&self, path: impl AsRef<Path>) -> StageResult<()> {
        self.sink.exporter().export_image(path).map_err(|e| {
            self.fail(Stage::Export, e.to_string())
        })
    }

    /// Write an HTML report of the latest result and figure
    pub fn generate_report(
        &self,
        path: impl AsRef<Path>,
        options: &ReportOptions,
    ) -> StageResult<()> {
        self.sink.report().generate(path, options).map_err(|e| {
            self.fail(
                Stage::Report,
                format!("レポートの生成中にエラーが発生しました: {e}"),
            )
        })
    }
}

impl std::fmt::Debug for AnalysisSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisSession")
            .field("trace_id", &self.trace_id)
            .field("version", &self.state.version())
            .field("pending", &self.pending)
            .field("post_hoc_enabled", &self.post_hoc_enabled)
            .finish()
    }
}
