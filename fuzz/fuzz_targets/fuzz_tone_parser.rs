//! Fuzz target: `tone::parse_steps` and sequencer playback
//!
//! Invariants checked:
//! - No panics for any sequence text
//! - Parsed volumes never exceed 100
//! - Playback of whatever parsed always reaches Idle in bounded time
//!
//! cargo fuzz run fuzz_tone_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use servolink::tone::{parse_steps, ToneOutput, ToneSequencer};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    let steps = parse_steps(text);
    for step in &steps {
        assert!(step.volume <= 100);
    }

    let mut seq = ToneSequencer::new();
    seq.submit(text, 0);

    // Jumping by more than the longest step per tick passes at least one
    // deadline each iteration, so playback must settle in steps + 2 ticks.
    let jump: u64 = steps.iter().map(|s| u64::from(s.duration_ms)).max().unwrap_or(0) + 1;
    let mut now = 0;
    let mut ticks = 0;
    while !seq.is_idle() {
        ticks += 1;
        assert!(ticks <= steps.len() + 2, "sequencer failed to terminate");
        if seq.tick(now) == ToneOutput::Silence {
            break;
        }
        now += jump;
    }
});
