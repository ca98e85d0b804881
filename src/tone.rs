//! Non-blocking tone sequencer.
//!
//! A sequence is text of semicolon-separated `freq,volume,duration`
//! triples, e.g. `"440,50,200;0,0,100;880,50,200"`.  Frequency 0 or
//! volume 0 encodes a rest.  The sequencer owns no timer: the control
//! loop calls [`ToneSequencer::tick`] with the current uptime and the
//! sequencer compares against a stored step deadline.  Submitting a new
//! sequence replaces any playing one immediately; there is no queueing.

use heapless::Vec;

/// Upper bound on steps per sequence; excess steps are dropped at parse.
pub const MAX_TONE_STEPS: usize = 16;

/// One parsed tone step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneStep {
    /// PWM frequency; 0 means silence for the step duration.
    pub freq_hz: u16,
    /// Duty amplitude 0-100; 0 also means silence.
    pub volume: u8,
    /// Step length. A zero duration marks a malformed step and stops
    /// playback when reached.
    pub duration_ms: u32,
}

/// Parse sequence text into steps.
///
/// Tolerant by construction: a triple that fails to parse becomes a
/// zero-duration step, so a corrupt tail truncates playback instead of
/// aborting the whole sequence. Steps beyond [`MAX_TONE_STEPS`] are
/// silently dropped.
pub fn parse_steps(text: &str) -> Vec<ToneStep, MAX_TONE_STEPS> {
    let mut steps = Vec::new();
    for triple in text.split(';') {
        if triple.is_empty() {
            continue;
        }
        let step = parse_triple(triple).unwrap_or(ToneStep {
            freq_hz: 0,
            volume: 0,
            duration_ms: 0,
        });
        if steps.push(step).is_err() {
            break;
        }
    }
    steps
}

fn parse_triple(triple: &str) -> Option<ToneStep> {
    let mut parts = triple.split(',');
    let freq_hz: u16 = parts.next()?.trim().parse().ok()?;
    let volume: u8 = parts.next()?.trim().parse().ok()?;
    let duration_ms: u32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(ToneStep {
        freq_hz,
        volume: volume.min(100),
        duration_ms,
    })
}

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TonePlayback {
    Idle,
    Playing,
}

/// What the control loop should do with the buzzer after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneOutput {
    /// No change since the last tick.
    Unchanged,
    /// Drive the buzzer with this frequency and volume.
    Play { freq_hz: u16, volume: u8 },
    /// Playback ended; silence the buzzer.
    Silence,
}

/// Cursor-based sequencer over a parsed step list.
pub struct ToneSequencer {
    steps: Vec<ToneStep, MAX_TONE_STEPS>,
    cursor: usize,
    step_deadline_ms: u64,
    state: TonePlayback,
}

impl ToneSequencer {
    pub const fn new() -> Self {
        Self {
            steps: Vec::new(),
            cursor: 0,
            step_deadline_ms: 0,
            state: TonePlayback::Idle,
        }
    }

    pub fn state(&self) -> TonePlayback {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == TonePlayback::Idle
    }

    /// Replace the active sequence and start playing from step 0.
    /// Returns the number of steps accepted.
    pub fn submit(&mut self, text: &str, now_ms: u64) -> usize {
        self.steps = parse_steps(text);
        self.cursor = 0;
        if let Some(first) = self.steps.first().copied() {
            if first.duration_ms == 0 {
                // Malformed head: nothing playable.
                self.stop();
            } else {
                self.state = TonePlayback::Playing;
                self.step_deadline_ms = now_ms + u64::from(first.duration_ms);
            }
        } else {
            self.stop();
        }
        self.steps.len()
    }

    /// Stop playback and clear the cursor. The caller silences the output.
    pub fn stop(&mut self) {
        self.state = TonePlayback::Idle;
        self.cursor = 0;
        self.step_deadline_ms = 0;
    }

    /// Advance playback against the monotonic clock.
    ///
    /// Call once per loop iteration. Returns `Play` when a new step
    /// begins (including right after [`submit`](Self::submit)),
    /// `Silence` exactly once when the sequence ends, and `Unchanged`
    /// mid-step.
    pub fn tick(&mut self, now_ms: u64) -> ToneOutput {
        if self.state == TonePlayback::Idle {
            return ToneOutput::Unchanged;
        }
        // First tick after submit: announce step 0.
        if self.cursor == 0 && self.step_deadline_ms > now_ms {
            let step = self.steps[0];
            self.cursor = 1;
            return ToneOutput::Play {
                freq_hz: step.freq_hz,
                volume: step.volume,
            };
        }
        if now_ms < self.step_deadline_ms {
            return ToneOutput::Unchanged;
        }
        // Current step expired; move to the next playable one.
        match self.steps.get(self.cursor).copied() {
            Some(step) if step.duration_ms > 0 => {
                self.cursor += 1;
                self.step_deadline_ms = now_ms + u64::from(step.duration_ms);
                ToneOutput::Play {
                    freq_hz: step.freq_hz,
                    volume: step.volume,
                }
            }
            // Zero-duration step (corrupt triple) or end of list.
            _ => {
                self.stop();
                ToneOutput::Silence
            }
        }
    }
}

impl Default for ToneSequencer {
    fn default() -> Self {
        Self::new()
    }
}
