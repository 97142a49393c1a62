//! The single owned pipeline state

use tabstat_core::Dataset;
use tabstat_hypothesis::{TestResult, TestSelection};
use tabstat_viz::{GraphCustomization, GraphSelection};

/// Current dataset, selections and latest test outcome
///
/// Owned by one session and mutated only through `&mut self`. Every write
/// bumps [`version`](Self::version); when two writers race (an analysis
/// completion arriving after the dataset changed) the last write wins and
/// the version tells readers which snapshot they saw.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    version: u64,
    data: Option<Dataset>,
    selected_test: Option<TestSelection>,
    graph: GraphSelection,
    customization: GraphCustomization,
    last_result: Option<TestResult>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    fn bump(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    pub fn data(&self) -> Option<&Dataset> {
        self.data.as_ref()
    }

    pub fn set_data(&mut self, data: Dataset) -> u64 {
        self.data = Some(data);
        self.bump()
    }

    pub fn selected_test(&self) -> Option<&TestSelection> {
        self.selected_test.as_ref()
    }

    pub fn set_selected_test(&mut self, selection: Option<TestSelection>) -> u64 {
        self.selected_test = selection;
        self.bump()
    }

    pub fn graph(&self) -> &GraphSelection {
        &self.graph
    }

    pub fn set_graph(&mut self, graph: GraphSelection) -> u64 {
        self.graph = graph;
        self.bump()
    }

    pub fn customization(&self) -> &GraphCustomization {
        &self.customization
    }

    pub fn set_customization(&mut self, customization: GraphCustomization) -> u64 {
        self.customization = customization;
        self.bump()
    }

    pub fn last_result(&self) -> Option<&TestResult> {
        self.last_result.as_ref()
    }

    pub fn set_last_result(&mut self, result: TestResult) -> u64 {
        self.last_result = Some(result);
        self.bump()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabstat_core::{Column, Dataset};
    use tabstat_hypothesis::StatTest;

    #[test]
    fn test_every_write_bumps_version() {
        let mut state = PipelineState::new();
        assert_eq!(state.version(), 0);

        let ds = Dataset::from_columns(vec![Column::numeric("value", vec![1.0])]).unwrap();
        assert_eq!(state.set_data(ds), 1);
        assert_eq!(state.set_selected_test(Some(StatTest::OneWayAnova.into())), 2);
        assert_eq!(state.set_graph(GraphSelection::default()), 3);
        assert_eq!(state.version(), 3);
        assert!(state.data().is_some());
        assert!(state.last_result().is_none());
    }
}
