//! Buzzer volume-to-duty math.
//!
//! The buzzer channel retunes its LEDC timer to the step frequency and
//! sets duty from the 0-100 volume.  Full volume is 50% duty (maximum
//! acoustic energy for a square wave into a piezo); volume scales the
//! duty linearly below that.

use crate::pins::BUZZER_PWM_RESOLUTION_BITS;

const DUTY_FULL_SCALE: u32 = 1 << BUZZER_PWM_RESOLUTION_BITS;

/// LEDC duty counts for a volume (0-100, saturating above).
pub fn volume_to_duty(volume: u8) -> u32 {
    let volume = u32::from(volume.min(100));
    volume * (DUTY_FULL_SCALE / 2) / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_is_zero_duty() {
        assert_eq!(volume_to_duty(0), 0);
    }

    #[test]
    fn full_volume_is_half_duty() {
        assert_eq!(volume_to_duty(100), DUTY_FULL_SCALE / 2);
    }

    #[test]
    fn scales_linearly_and_saturates() {
        assert_eq!(volume_to_duty(50), DUTY_FULL_SCALE / 4);
        assert_eq!(volume_to_duty(200), volume_to_duty(100));
    }
}
