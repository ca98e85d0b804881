//! Application events emitted by the domain core.
//!
//! The service reports notable state changes through an [`EventSink`] so
//! logging stays out of the domain logic.  The production sink writes to
//! the `log` facade; tests substitute a recording sink.

use crate::connectivity::ConnectivityState;

/// Notable state changes surfaced by [`DeviceService`](super::service::DeviceService).
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Network bring-up finished.
    ConnectivitySettled(ConnectivityState),
    /// A peer frame was accepted and applied.
    CommandApplied,
    /// A peer frame was discarded (malformed, oversized, or unknown verb).
    FrameDiscarded { len: usize },
    /// A sensor broadcast was skipped because the encode buffer overflowed.
    BroadcastSkipped,
    /// A debounced persistence flush completed.
    PersistFlushed { ok: bool },
    /// The tone sequencer started playing a new sequence.
    ToneStarted { steps: usize },
    /// The tone sequencer ran out of steps and went idle.
    ToneFinished,
}

/// Receiver for domain events.
pub trait EventSink {
    fn emit(&mut self, event: AppEvent);
}
