//! Latest-result holder that pushes every new result to its consumers

use tabstat_core::Dataset;
use tabstat_io::{ReportGenerator, ResultsExporter};
use tabstat_viz::Figure;

/// Receives each newly published (result, figure) pair
///
/// Consumers keep only the most recent pair; nothing is replayed.
pub trait ResultConsumer: Send {
    fn consume(&mut self, results: &Dataset, figure: Option<&Figure>);

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl ResultConsumer for ResultsExporter {
    fn consume(&mut self, results: &Dataset, figure: Option<&Figure>) {
        self.set_results(results.clone());
        self.set_figure(figure.cloned());
    }

    fn name(&self) -> &str {
        "export"
    }
}

impl ResultConsumer for ReportGenerator {
    fn consume(&mut self, results: &Dataset, figure: Option<&Figure>) {
        self.set_results(results.clone());
        self.set_figure(figure.cloned());
    }

    fn name(&self) -> &str {
        "report"
    }
}

/// Holds the latest result and figure and feeds them to export, report and
/// any extra observers
///
/// Publishing is synchronous: when [`publish`](Self::publish) returns every
/// consumer has the new pair.
pub struct ResultsSink {
    results: Option<Dataset>,
    figure: Option<Figure>,
    exporter: ResultsExporter,
    report: ReportGenerator,
    observers: Vec<Box<dyn ResultConsumer>>,
}

impl ResultsSink {
    /// Sink whose export and report render figures at `width` x `height`
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            results: None,
            figure: None,
            exporter: ResultsExporter::new(width, height),
            report: ReportGenerator::new(width, height),
            observers: Vec::new(),
        }
    }

    /// Add a consumer that receives every later publication
    pub fn add_observer<C: ResultConsumer + 'static>(&mut self, consumer: C) {
        self.observers.push(Box::new(consumer));
    }

    pub fn publish(&mut self, results: Dataset, figure: Option<Figure>) {
        self.exporter.consume(&results, figure.as_ref());
        self.report.consume(&results, figure.as_ref());
        for observer in &mut self.observers {
            observer.consume(&results, figure.as_ref());
        }
        tracing::debug!(
            rows = results.n_rows(),
            consumers = self.observers.len() + 2,
            "results published"
        );
        self.results = Some(results);
        self.figure = figure;
    }

    pub fn results(&self) -> Option<&Dataset> {
        self.results.as_ref()
    }

    pub fn figure(&self) -> Option<&Figure> {
        self.figure.as_ref()
    }

    pub fn exporter(&self) -> &ResultsExporter {
        &self.exporter
    }

    pub fn report(&self) -> &ReportGenerator {
        &self.report
    }
}

impl std::fmt::Debug for ResultsSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultsSink")
            .field("results", &self.results.as_ref().map(Dataset::n_rows))
            .field("has_figure", &self.figure.is_some())
            .field(
                "observers",
                &self.observers.iter().map(|o| o.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
