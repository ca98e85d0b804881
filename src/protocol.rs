//! Wire protocol parser for the peer text channel.
//!
//! Frames are single-line ASCII commands, colon-delimited:
//!
//! ```text
//! servo:<index>:<angle>      position a servo (angle clamped to 0-180)
//! led:<index>:<val>          switch a discrete LED (val != 0 means on)
//! poti:on | poti:off         toggle potentiometer auto-mapping
//! filter:<coefficient>       set the low-pass coefficient (0.0-1.0)
//! sound:<f>,<v>,<d>;...      replace the tone sequence
//! ```
//!
//! The parser is total: any input either yields a validated [`Command`]
//! or `None`.  Malformed frames never panic and never produce a partial
//! command.  Peers get no error feedback; discards are silent by design
//! of the wire contract.

use crate::app::commands::{Command, MAX_TONE_TEXT};

/// Frames longer than this are rejected before tokenisation.
pub const MAX_FRAME_LEN: usize = crate::app::inbox::MAX_FRAME_LEN;

/// Parse one raw frame into a validated command.
///
/// Returns `None` for anything that is not a well-formed, in-range
/// command: oversized frames, non-UTF-8 bytes, unknown verbs, missing or
/// extra fields, out-of-range indices, and out-of-range filter values.
pub fn parse(frame: &[u8]) -> Option<Command> {
    if frame.is_empty() || frame.len() > MAX_FRAME_LEN {
        return None;
    }
    let text = core::str::from_utf8(frame).ok()?;
    let text = text.trim_end_matches(['\r', '\n']);

    let (verb, args) = text.split_once(':')?;
    match verb {
        "servo" => parse_servo(args),
        "led" => parse_led(args),
        "poti" => parse_poti(args),
        "filter" => parse_filter(args),
        "sound" => parse_sound(args),
        _ => None,
    }
}

fn parse_servo(args: &str) -> Option<Command> {
    let (index, angle) = args.split_once(':')?;
    let index: usize = index.parse().ok()?;
    if index >= crate::pins::NUM_SERVOS {
        return None;
    }
    // Angle saturates rather than rejecting: peers send raw slider
    // values and expect clamping at the mechanical limits.
    let angle: i32 = angle.parse().ok()?;
    let angle = angle.clamp(0, 180) as u8;
    Some(Command::SetServoTarget { index, angle })
}

fn parse_led(args: &str) -> Option<Command> {
    let (index, value) = args.split_once(':')?;
    let index: usize = index.parse().ok()?;
    if index >= crate::pins::NUM_LEDS {
        return None;
    }
    let value: i32 = value.parse().ok()?;
    Some(Command::SetLedState { index, on: value != 0 })
}

fn parse_poti(args: &str) -> Option<Command> {
    match args {
        "on" => Some(Command::SetPotiControl(true)),
        "off" => Some(Command::SetPotiControl(false)),
        _ => None,
    }
}

fn parse_filter(args: &str) -> Option<Command> {
    let value: f32 = args.parse().ok()?;
    // NaN fails both comparisons and is rejected here.
    if (0.0..=1.0).contains(&value) {
        Some(Command::SetFilter(value))
    } else {
        None
    }
}

fn parse_sound(args: &str) -> Option<Command> {
    if args.is_empty() || args.len() > MAX_TONE_TEXT {
        return None;
    }
    // Step syntax is validated by the sequencer; the frame layer only
    // bounds the payload.
    let text = heapless::String::try_from(args).ok()?;
    Some(Command::SetToneSequence(text))
}
