//! Fuzz target: `sensors::encode_broadcast`
//!
//! Invariants checked:
//! - No panics for any snapshot values
//! - Successful encodes are valid UTF-8 within the reported length
//!
//! cargo fuzz run fuzz_broadcast_encoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use servolink::sensors::{encode_broadcast, SensorSnapshot, BROADCAST_BUF_LEN};

fuzz_target!(|data: &[u8]| {
    if data.len() < 15 {
        return;
    }

    let word = |i: usize| u16::from_le_bytes([data[2 * i], data[2 * i + 1]]);
    let snapshot = SensorSnapshot {
        potis: [word(0), word(1), word(2), word(3)],
        touch: [word(4), word(5), word(6)],
        switches: [data[14] & 1 == 1],
    };

    let mut buf = [0u8; BROADCAST_BUF_LEN];
    if let Some(len) = encode_broadcast(&snapshot, &mut buf) {
        assert!(len <= BROADCAST_BUF_LEN);
        core::str::from_utf8(&buf[..len]).expect("broadcast must be UTF-8");
    }
});
