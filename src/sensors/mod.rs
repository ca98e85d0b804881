//! Sensor snapshot type and the periodic JSON broadcast encoding.
//!
//! One [`SensorSnapshot`] captures every input channel in a single loop
//! iteration.  Snapshots feed two consumers: the auto-mapping logic
//! (every iteration) and the peer broadcast (rate-limited by the
//! configured interval).  The broadcast wire format is a flat JSON
//! object with per-channel keys:
//!
//! ```json
//! {"poti0":2048,"poti1":0,...,"touch0":37,...,"switch0":1}
//! ```
//!
//! Switches encode as `0`/`1` rather than JSON booleans to keep the
//! client parsing uniform across channels.

use core::fmt::Write as _;

use serde::Serialize;

use crate::pins::{NUM_POTIS, NUM_SWITCHES, NUM_TOUCH};

/// Upper bound for an encoded broadcast frame. The worst case (all
/// channels at maximum digit width) fits with room to spare.
pub const BROADCAST_BUF_LEN: usize = 256;

/// One full sampling of every input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SensorSnapshot {
    /// Raw 12-bit ADC readings, 0-4095.
    pub potis: [u16; NUM_POTIS],
    /// Capacitive touch readings; lower means touched.
    pub touch: [u16; NUM_TOUCH],
    /// Debounced switch levels, true = active.
    pub switches: [bool; NUM_SWITCHES],
}

/// Encode a snapshot as the flat JSON broadcast frame.
///
/// Returns the encoded length, or `None` if the frame would overflow
/// `buf` — the caller skips that broadcast cycle rather than sending a
/// truncated frame.
pub fn encode_broadcast(snapshot: &SensorSnapshot, buf: &mut [u8]) -> Option<usize> {
    let mut w = SliceWriter { buf, len: 0 };

    w.push(b'{').ok()?;
    let mut first = true;
    for (i, v) in snapshot.potis.iter().enumerate() {
        write_entry(&mut w, &mut first, "poti", i, u32::from(*v)).ok()?;
    }
    for (i, v) in snapshot.touch.iter().enumerate() {
        write_entry(&mut w, &mut first, "touch", i, u32::from(*v)).ok()?;
    }
    for (i, v) in snapshot.switches.iter().enumerate() {
        write_entry(&mut w, &mut first, "switch", i, u32::from(*v)).ok()?;
    }
    w.push(b'}').ok()?;

    Some(w.len)
}

fn write_entry(
    w: &mut SliceWriter<'_>,
    first: &mut bool,
    prefix: &str,
    index: usize,
    value: u32,
) -> core::fmt::Result {
    if *first {
        *first = false;
    } else {
        w.push(b',')?;
    }
    write!(w, "\"{prefix}{index}\":{value}")
}

struct SliceWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl SliceWriter<'_> {
    fn push(&mut self, byte: u8) -> core::fmt::Result {
        if self.len >= self.buf.len() {
            return Err(core::fmt::Error);
        }
        self.buf[self.len] = byte;
        self.len += 1;
        Ok(())
    }
}

impl core::fmt::Write for SliceWriter<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        if self.len + bytes.len() > self.buf.len() {
            return Err(core::fmt::Error);
        }
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }
}
