//! Event notification for session stages
//!
//! Stages publish what they did on an [`EventBus`]; any number of handlers
//! (logging, a UI, a test harness) observe without the stages knowing about
//! them.

use crate::error::{Error, Result, Stage};
use crossbeam_channel::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Something that happened in a session
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A dataset replaced the current one
    DataLoaded {
        trace_id: Uuid,
        version: u64,
        rows: usize,
        columns: usize,
    },

    /// Preprocessing produced a new current dataset
    DataPreprocessed {
        trace_id: Uuid,
        version: u64,
        rows_in: usize,
        rows_out: usize,
    },

    /// The selected test changed
    TestSelected { trace_id: Uuid, test: String },

    /// A test dispatch finished
    TestCompleted {
        trace_id: Uuid,
        test: String,
        significant: bool,
    },

    /// Post-hoc comparisons became available or unavailable
    PostHocAvailability { trace_id: Uuid, enabled: bool },

    /// A post-hoc dispatch finished
    PostHocCompleted { trace_id: Uuid, procedure: String },

    /// The canvas holds a new figure
    GraphRendered {
        trace_id: Uuid,
        test: String,
        graph: String,
    },

    /// A render failed and the canvas kept its previous figure
    RenderFailed { trace_id: Uuid, message: String },

    /// Export and report consumers received a new result
    ResultsPublished {
        trace_id: Uuid,
        version: u64,
        has_figure: bool,
    },

    /// An analysis was queued on the worker pool
    AnalysisSubmitted { trace_id: Uuid, method: String },

    /// An analysis finished and its output was published
    AnalysisCompleted {
        trace_id: Uuid,
        method: String,
        summary: String,
    },

    /// Selection state was written to the settings file
    SettingsSaved { trace_id: Uuid },

    /// Selection state was restored from the settings file
    SettingsLoaded { trace_id: Uuid },

    /// The settings file was reset
    SettingsCleared { trace_id: Uuid },

    /// A stage boundary caught a failure
    StageFailed {
        trace_id: Uuid,
        stage: Stage,
        error: String,
    },
}

impl PipelineEvent {
    pub fn trace_id(&self) -> Uuid {
        match self {
            Self::DataLoaded { trace_id, .. }
            | Self::DataPreprocessed { trace_id, .. }
            | Self::TestSelected { trace_id, .. }
            | Self::TestCompleted { trace_id, .. }
            | Self::PostHocAvailability { trace_id, .. }
            | Self::PostHocCompleted { trace_id, .. }
            | Self::GraphRendered { trace_id, .. }
            | Self::RenderFailed { trace_id, .. }
            | Self::ResultsPublished { trace_id, .. }
            | Self::AnalysisSubmitted { trace_id, .. }
            | Self::AnalysisCompleted { trace_id, .. }
            | Self::SettingsSaved { trace_id }
            | Self::SettingsLoaded { trace_id }
            | Self::SettingsCleared { trace_id }
            | Self::StageFailed { trace_id, .. } => *trace_id,
        }
    }
}

/// Trait for handling pipeline events
pub trait EventHandler: Send + Sync {
    fn handle_event(&self, event: &PipelineEvent);

    /// Check if this handler is interested in a particular event
    fn is_interested(&self, event: &PipelineEvent) -> bool {
        let _ = event;
        true
    }

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Event bus for distributing events to multiple handlers
///
/// Clones share the same handler list.
#[derive(Clone)]
pub struct EventBus {
    handlers: Arc<Mutex<Vec<Box<dyn EventHandler>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register an event handler
    pub fn register<H>(&self, handler: H) -> Result<()>
    where
        H: EventHandler + 'static,
    {
        let mut handlers = self
            .handlers
            .lock()
            .map_err(|_| Error::Poisoned("event handlers"))?;
        handlers.push(Box::new(handler));
        Ok(())
    }

    /// Register a channel handler and return its receiving end
    pub fn subscribe(&self) -> Result<Receiver<PipelineEvent>> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.register(ChannelEventHandler::new(tx))?;
        Ok(rx)
    }

    /// Deliver an event to every interested handler, in registration order
    pub fn emit(&self, event: &PipelineEvent) -> Result<()> {
        let handlers = self
            .handlers
            .lock()
            .map_err(|_| Error::Poisoned("event handlers"))?;
        for handler in handlers.iter() {
            if handler.is_interested(event) {
                handler.handle_event(event);
            }
        }
        Ok(())
    }

    /// Emit, logging instead of returning a delivery failure
    pub fn publish(&self, event: PipelineEvent) {
        if let Err(e) = self.emit(&event) {
            tracing::warn!("Dropped pipeline event: {e}");
        }
    }

    pub fn handler_count(&self) -> Result<usize> {
        let handlers = self
            .handlers
            .lock()
            .map_err(|_| Error::Poisoned("event handlers"))?;
        Ok(handlers.len())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handler_count().unwrap_or(0))
            .finish()
    }
}

/// Mirrors events into the `tracing` log
#[derive(Debug, Default, Clone)]
pub struct TracingEventHandler;

impl EventHandler for TracingEventHandler {
    fn handle_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageFailed {
                trace_id,
                stage,
                error,
            } => {
                tracing::error!(%trace_id, %stage, "Stage failed: {error}");
            }
            PipelineEvent::RenderFailed { trace_id, message } => {
                tracing::warn!(%trace_id, "{message}");
            }
            PipelineEvent::TestCompleted {
                trace_id,
                test,
                significant,
            } => {
                tracing::info!(%trace_id, significant, "Test '{test}' completed");
            }
            PipelineEvent::AnalysisCompleted {
                trace_id, method, ..
            } => {
                tracing::info!(%trace_id, "Advanced analysis '{method}' completed successfully");
            }
            _ => {
                tracing::debug!("Pipeline event: {event:?}");
            }
        }
    }
}

/// Forwards every event into a channel
#[derive(Debug, Clone)]
pub struct ChannelEventHandler {
    sender: Sender<PipelineEvent>,
}

impl ChannelEventHandler {
    pub fn new(sender: Sender<PipelineEvent>) -> Self {
        Self { sender }
    }
}

impl EventHandler for ChannelEventHandler {
    fn handle_event(&self, event: &PipelineEvent) {
        // A dropped receiver just means nobody is listening any more
        let _ = self.sender.send(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailureCounter(Arc<AtomicUsize>);

    impl EventHandler for FailureCounter {
        fn handle_event(&self, _event: &PipelineEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn is_interested(&self, event: &PipelineEvent) -> bool {
            matches!(event, PipelineEvent::StageFailed { .. })
        }
    }

    #[test]
    fn test_event_bus() {
        let bus = EventBus::new();
        bus.register(TracingEventHandler).unwrap();
        let rx = bus.subscribe().unwrap();
        assert_eq!(bus.handler_count().unwrap(), 2);

        let trace_id = Uuid::new_v4();
        bus.publish(PipelineEvent::SettingsSaved { trace_id });
        assert_eq!(rx.try_recv().unwrap(), PipelineEvent::SettingsSaved { trace_id });
    }

    #[test]
    fn test_handlers_only_see_interesting_events() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.register(FailureCounter(Arc::clone(&count))).unwrap();

        let trace_id = Uuid::new_v4();
        bus.publish(PipelineEvent::SettingsCleared { trace_id });
        bus.publish(PipelineEvent::StageFailed {
            trace_id,
            stage: Stage::Test,
            error: "boom".to_string(),
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clones_share_handlers() {
        let bus = EventBus::new();
        let other = bus.clone();
        other.register(TracingEventHandler).unwrap();
        assert_eq!(bus.handler_count().unwrap(), 1);
    }
}
