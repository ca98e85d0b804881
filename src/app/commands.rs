//! Domain commands — the validated output of the wire protocol parser.
//!
//! A [`Command`] carries only values that already passed range and index
//! validation; downstream code applies them without re-checking.

/// Maximum length of a tone sequence payload accepted over the wire.
/// A full 16-step sequence at worst-case digit counts fits comfortably.
pub const MAX_TONE_TEXT: usize = 96;

/// Validated control command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Set the smoothing target of one servo channel (angle clamped 0–180).
    SetServoTarget { index: usize, angle: u8 },
    /// Switch one discrete LED channel.
    SetLedState { index: usize, on: bool },
    /// Enable or disable potentiometer→servo auto-mapping.
    SetPotiControl(bool),
    /// Replace the low-pass filter coefficient (validated 0.0–1.0).
    SetFilter(f32),
    /// Replace the active tone sequence with new step text.
    SetToneSequence(heapless::String<MAX_TONE_TEXT>),
}
