//! Debounced persistence gateway.
//!
//! Settings that change at interactive rates (the poti auto-map toggle,
//! the tone sequence text) would wear flash if written on every change.
//! The gateway coalesces mutations: the first dirty mark per aggregate
//! opens a fixed window, further marks within the window fold into the
//! same pending write, and the flush happens when the window expires.
//! The window is anchored to the FIRST mutation, so a peer hammering a
//! toggle cannot postpone the write indefinitely.

use heapless::String;
use log::warn;

use crate::app::commands::MAX_TONE_TEXT;
use crate::app::ports::StoragePort;

/// Persistable state groups, each mapping to one storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// Poti auto-mapping toggle → `("control", "poti")`, one byte.
    AutoMap,
    /// Tone sequence text → `("sound", "seq")`.
    ToneText,
}

impl Aggregate {
    const fn location(self) -> (&'static str, &'static str) {
        match self {
            Self::AutoMap => ("control", "poti"),
            Self::ToneText => ("sound", "seq"),
        }
    }
}

struct PendingWrite {
    aggregate: Aggregate,
    deadline_ms: u64,
}

/// Debounce gateway for the two interactive aggregates.
pub struct PersistGateway {
    debounce_ms: u32,
    pending: [Option<PendingWrite>; 2],
}

impl PersistGateway {
    pub const fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms,
            pending: [None, None],
        }
    }

    fn slot(aggregate: Aggregate) -> usize {
        match aggregate {
            Aggregate::AutoMap => 0,
            Aggregate::ToneText => 1,
        }
    }

    /// Record that an aggregate changed. Only the first mark per window
    /// sets the flush deadline; later marks coalesce into it.
    pub fn mark_dirty(&mut self, aggregate: Aggregate, now_ms: u64) {
        let slot = &mut self.pending[Self::slot(aggregate)];
        if slot.is_none() {
            *slot = Some(PendingWrite {
                aggregate,
                deadline_ms: now_ms + u64::from(self.debounce_ms),
            });
        }
    }

    pub fn is_dirty(&self, aggregate: Aggregate) -> bool {
        self.pending[Self::slot(aggregate)].is_some()
    }

    /// Flush every aggregate whose window has expired, reading the live
    /// values through `state`. Returns `(flushed, failed)` write counts.
    ///
    /// A failed write is logged and the pending mark cleared anyway; the
    /// next mutation re-marks the aggregate naturally.
    pub fn tick<S: StoragePort>(
        &mut self,
        storage: &mut S,
        state: &PersistSource<'_>,
        now_ms: u64,
    ) -> (usize, usize) {
        let mut flushed = 0;
        let mut failed = 0;
        for slot in &mut self.pending {
            let Some(pending) = slot else { continue };
            if now_ms < pending.deadline_ms {
                continue;
            }
            let aggregate = pending.aggregate;
            *slot = None;

            let (namespace, key) = aggregate.location();
            let result = match aggregate {
                Aggregate::AutoMap => {
                    storage.write(namespace, key, &[u8::from(state.auto_map)])
                }
                Aggregate::ToneText => {
                    storage.write(namespace, key, state.tone_text.as_bytes())
                }
            };
            match result {
                Ok(()) => flushed += 1,
                Err(e) => {
                    failed += 1;
                    warn!("persist {namespace}/{key} failed: {e}");
                }
            }
        }
        (flushed, failed)
    }
}

/// Borrowed view of the live values the gateway snapshots at flush time.
pub struct PersistSource<'a> {
    pub auto_map: bool,
    pub tone_text: &'a String<MAX_TONE_TEXT>,
}

/// Restore the auto-map toggle from storage. Absent or corrupt records
/// fall back to disabled.
pub fn load_auto_map<S: StoragePort>(storage: &S) -> bool {
    let (namespace, key) = Aggregate::AutoMap.location();
    let mut buf = [0u8; 1];
    match storage.read(namespace, key, &mut buf) {
        Ok(1) => buf[0] != 0,
        _ => false,
    }
}

/// Restore the stored tone sequence text, empty if absent or invalid.
pub fn load_tone_text<S: StoragePort>(storage: &S) -> String<MAX_TONE_TEXT> {
    let (namespace, key) = Aggregate::ToneText.location();
    let mut buf = [0u8; MAX_TONE_TEXT];
    let Ok(len) = storage.read(namespace, key, &mut buf) else {
        return String::new();
    };
    core::str::from_utf8(&buf[..len])
        .ok()
        .and_then(|s| String::try_from(s).ok())
        .unwrap_or_default()
}
