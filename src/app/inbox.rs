//! Inbound frame queue between the peer adapter and the control loop.
//!
//! The network stack delivers frames from its receive callback; the main
//! loop drains them one per call to [`DeviceService::tick`].  Both sides
//! run on the main task (ESP-IDF invokes the HTTP server callback with the
//! loop parked), so a plain fixed-capacity deque is sufficient.  Frames
//! that arrive while the queue is full are dropped, oldest kept.

use heapless::{Deque, Vec};

/// Upper bound on a single inbound frame, bytes. Longer frames are
/// rejected at enqueue time and never reach the parser.
pub const MAX_FRAME_LEN: usize = 128;

/// Queue depth. More than a handful of frames per 10 ms loop iteration
/// means a misbehaving peer, and dropping is the correct response.
pub const INBOX_DEPTH: usize = 8;

/// One raw inbound frame.
pub type Frame = Vec<u8, MAX_FRAME_LEN>;

/// Fixed-capacity inbound frame queue.
pub struct FrameInbox {
    queue: Deque<Frame, INBOX_DEPTH>,
    dropped: u32,
}

impl FrameInbox {
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
            dropped: 0,
        }
    }

    /// Enqueue a raw frame. Oversized frames and frames arriving into a
    /// full queue are counted and discarded.
    pub fn push(&mut self, payload: &[u8]) {
        if payload.len() > MAX_FRAME_LEN {
            self.dropped = self.dropped.wrapping_add(1);
            return;
        }
        let mut frame = Frame::new();
        // Length checked above, extend cannot fail.
        let _ = frame.extend_from_slice(payload);
        if self.queue.push_back(frame).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
        }
    }

    /// Take the oldest pending frame, if any.
    pub fn pop(&mut self) -> Option<Frame> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Total frames discarded since boot (oversize + overflow).
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl Default for FrameInbox {
    fn default() -> Self {
        Self::new()
    }
}
