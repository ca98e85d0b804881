//! Fuzz target: `protocol::parse` (peer command frames)
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Accepted servo commands always carry an in-range index and a
//!   clamped angle
//! - Accepted filter values are always inside [0.0, 1.0]
//!
//! cargo fuzz run fuzz_command_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use servolink::app::commands::Command;
use servolink::pins::{NUM_LEDS, NUM_SERVOS};
use servolink::protocol;

fuzz_target!(|data: &[u8]| {
    match protocol::parse(data) {
        Some(Command::SetServoTarget { index, angle }) => {
            assert!(index < NUM_SERVOS);
            assert!(angle <= 180);
        }
        Some(Command::SetLedState { index, .. }) => {
            assert!(index < NUM_LEDS);
        }
        Some(Command::SetFilter(value)) => {
            assert!((0.0..=1.0).contains(&value));
        }
        Some(Command::SetToneSequence(text)) => {
            assert!(!text.is_empty());
        }
        Some(Command::SetPotiControl(_)) | None => {}
    }
});
