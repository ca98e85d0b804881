//! Event sink that forwards domain events to the `log` facade.

use log::{debug, info, warn};

use crate::app::events::{AppEvent, EventSink};

/// Production sink: every domain event becomes a log line at a level
/// matching its severity.
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&mut self, event: AppEvent) {
        match event {
            AppEvent::ConnectivitySettled(state) => info!("connectivity settled: {state:?}"),
            AppEvent::CommandApplied => debug!("command applied"),
            AppEvent::FrameDiscarded { len } => debug!("frame discarded ({len} bytes)"),
            AppEvent::BroadcastSkipped => warn!("sensor broadcast skipped (encode overflow)"),
            AppEvent::PersistFlushed { ok: true } => debug!("settings flushed"),
            AppEvent::PersistFlushed { ok: false } => warn!("settings flush failed"),
            AppEvent::ToneStarted { steps } => debug!("tone sequence started ({steps} steps)"),
            AppEvent::ToneFinished => debug!("tone sequence finished"),
        }
    }
}

/// Recording sink for tests.
#[cfg(not(target_os = "espidf"))]
pub struct RecordingEventSink {
    pub events: Vec<AppEvent>,
}

#[cfg(not(target_os = "espidf"))]
impl RecordingEventSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, predicate: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for RecordingEventSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl EventSink for RecordingEventSink {
    fn emit(&mut self, event: AppEvent) {
        self.events.push(event);
    }
}
