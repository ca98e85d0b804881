//! Actuator state and low-pass output smoothing.
//!
//! Servo channels carry a commanded `target` and a smoothed `current`
//! position.  Each control-loop iteration moves `current` one step toward
//! `target` with an exponential low-pass:
//!
//! ```text
//! current = filter * current + (1 - filter) * target
//! ```
//!
//! A higher coefficient means slower, smoother motion.  `filter = 0.0`
//! snaps instantly; `filter = 1.0` freezes all channels at their current
//! position (targets still update and take effect when the coefficient
//! is lowered again).  LEDs are plain latched booleans with no smoothing.

use crate::pins::{NUM_LEDS, NUM_SERVOS};

/// One servo channel: commanded target and smoothed actual position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoChannel {
    pub target: u8,
    pub current: f32,
}

/// Full actuator state for the controller.
#[derive(Debug, Clone)]
pub struct ActuatorBank {
    servos: [ServoChannel; NUM_SERVOS],
    leds: [bool; NUM_LEDS],
    filter: f32,
}

impl ActuatorBank {
    /// All servos parked at the boot angle, smoothing pre-converged so the
    /// first loop iterations produce no motion.
    pub fn new(boot_angle: u8, filter: f32) -> Self {
        Self {
            servos: [ServoChannel {
                target: boot_angle,
                current: f32::from(boot_angle),
            }; NUM_SERVOS],
            leds: [false; NUM_LEDS],
            filter: filter.clamp(0.0, 1.0),
        }
    }

    /// Set one servo's smoothing target. Out-of-range indices are ignored;
    /// the parser already validates them, this is the last line of defence
    /// for internal callers.
    pub fn set_servo_target(&mut self, index: usize, angle: u8) {
        if let Some(ch) = self.servos.get_mut(index) {
            ch.target = angle.min(180);
        }
    }

    pub fn servo_target(&self, index: usize) -> u8 {
        self.servos.get(index).map_or(0, |ch| ch.target)
    }

    /// Smoothed position truncated to whole degrees, as written to the PWM
    /// driver.
    pub fn servo_position(&self, index: usize) -> u8 {
        self.servos.get(index).map_or(0, |ch| ch.current as u8)
    }

    pub fn servo_current(&self, index: usize) -> f32 {
        self.servos.get(index).map_or(0.0, |ch| ch.current)
    }

    pub fn set_led(&mut self, index: usize, on: bool) {
        if let Some(led) = self.leds.get_mut(index) {
            *led = on;
        }
    }

    pub fn led(&self, index: usize) -> bool {
        self.leds.get(index).copied().unwrap_or(false)
    }

    pub fn leds(&self) -> &[bool; NUM_LEDS] {
        &self.leds
    }

    /// Replace the smoothing coefficient. Takes effect on the next
    /// [`step_smoothing`](Self::step_smoothing) call; in-flight motion is
    /// neither reset nor snapped.
    pub fn set_filter(&mut self, filter: f32) {
        self.filter = filter.clamp(0.0, 1.0);
    }

    pub fn filter(&self) -> f32 {
        self.filter
    }

    /// Advance every servo one smoothing step toward its target.
    pub fn step_smoothing(&mut self) {
        for ch in &mut self.servos {
            ch.current = self.filter * ch.current + (1.0 - self.filter) * f32::from(ch.target);
        }
    }
}
