//! Servo pulse-width math for the LEDC timer.
//!
//! Standard hobby servos expect a 50 Hz frame with a 500-2400 µs high
//! pulse mapping to 0-180 degrees.  The LEDC timer runs 14-bit, so one
//! frame (20 ms) spans 16384 counts.

use crate::pins::{SERVO_PWM_FREQ_HZ, SERVO_PWM_RESOLUTION_BITS};

/// Pulse width at 0 degrees.
pub const PULSE_MIN_US: u32 = 500;
/// Pulse width at 180 degrees.
pub const PULSE_MAX_US: u32 = 2_400;

const FRAME_US: u32 = 1_000_000 / SERVO_PWM_FREQ_HZ;
const DUTY_MAX: u32 = (1 << SERVO_PWM_RESOLUTION_BITS) - 1;

/// LEDC duty counts for a servo angle (0-180, saturating above).
pub fn angle_to_duty(angle: u8) -> u32 {
    let angle = u32::from(angle.min(180));
    let pulse_us = PULSE_MIN_US + angle * (PULSE_MAX_US - PULSE_MIN_US) / 180;
    pulse_us * DUTY_MAX / FRAME_US
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_pulse_window() {
        // 500 µs of a 20 ms frame at 14 bits: 500 * 16383 / 20000 = 409
        assert_eq!(angle_to_duty(0), 409);
        // 2400 µs: 2400 * 16383 / 20000 = 1965
        assert_eq!(angle_to_duty(180), 1965);
    }

    #[test]
    fn midpoint_is_centred() {
        let mid = angle_to_duty(90);
        assert!(angle_to_duty(0) < mid && mid < angle_to_duty(180));
        // 1450 µs pulse: 1450 * 16383 / 20000 = 1187
        assert_eq!(mid, 1187);
    }

    #[test]
    fn duty_is_monotonic_in_angle() {
        let mut prev = angle_to_duty(0);
        for angle in 1..=180 {
            let duty = angle_to_duty(angle);
            assert!(duty >= prev);
            prev = duty;
        }
    }

    #[test]
    fn overrange_angle_saturates() {
        assert_eq!(angle_to_duty(255), angle_to_duty(180));
    }
}
