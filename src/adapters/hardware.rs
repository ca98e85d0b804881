//! Hardware adapter: binds the sensor and actuator ports to the LEDC,
//! ADC, touch, and GPIO drivers.  On the host it becomes a scriptable
//! simulation that the integration tests drive.

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::sensors::SensorSnapshot;

// ---------------------------------------------------------------------------
// Device implementation
// ---------------------------------------------------------------------------

#[cfg(all(target_os = "espidf", feature = "espidf"))]
mod platform {
    use super::{ActuatorPort, SensorPort, SensorSnapshot};
    use crate::drivers::{hw_init, indicator};
    use crate::pins;

    pub struct HardwareAdapter;

    impl HardwareAdapter {
        /// Initialises every peripheral; construct exactly once.
        pub fn init() -> crate::error::Result<Self> {
            hw_init::init()?;
            Ok(Self)
        }
    }

    impl SensorPort for HardwareAdapter {
        fn read_all(&mut self) -> SensorSnapshot {
            let mut snapshot = SensorSnapshot::default();
            for (slot, channel) in snapshot.potis.iter_mut().zip(pins::POTI_ADC_CHANNELS) {
                *slot = hw_init::adc1_read(channel);
            }
            for (slot, pad) in snapshot.touch.iter_mut().zip(pins::TOUCH_PADS) {
                *slot = hw_init::touch_read(pad);
            }
            for (slot, gpio) in snapshot.switches.iter_mut().zip(pins::SWITCH_GPIOS) {
                *slot = hw_init::switch_read(gpio);
            }
            snapshot
        }
    }

    impl ActuatorPort for HardwareAdapter {
        fn write_servo(&mut self, index: usize, angle: u8) {
            hw_init::set_servo_angle(index, angle);
        }

        fn write_led(&mut self, index: usize, on: bool) {
            if let Some(gpio) = pins::LED_GPIOS.get(index) {
                hw_init::gpio_write(*gpio, on);
            }
        }

        fn write_tone(&mut self, freq_hz: u16, volume: u8) {
            hw_init::set_buzzer(freq_hz, volume);
        }

        fn silence(&mut self) {
            hw_init::silence_buzzer();
        }

        fn set_indicator(&mut self, on: bool) {
            indicator::set(on);
        }
    }
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub use platform::HardwareAdapter;

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

/// Scriptable hardware for host tests: sensor values are set directly,
/// actuator writes are recorded.
#[cfg(not(target_os = "espidf"))]
pub struct HardwareAdapter {
    pub snapshot: SensorSnapshot,
    pub servo_writes: Vec<(usize, u8)>,
    pub led_writes: Vec<(usize, bool)>,
    pub tone_writes: Vec<(u16, u8)>,
    pub silenced: u32,
    pub indicator: bool,
}

#[cfg(not(target_os = "espidf"))]
impl HardwareAdapter {
    pub fn init() -> crate::error::Result<Self> {
        Ok(Self {
            snapshot: SensorSnapshot::default(),
            servo_writes: Vec::new(),
            led_writes: Vec::new(),
            tone_writes: Vec::new(),
            silenced: 0,
            indicator: false,
        })
    }

    /// Last angle written to a servo channel, if any.
    pub fn last_servo_angle(&self, index: usize) -> Option<u8> {
        self.servo_writes
            .iter()
            .rev()
            .find(|(i, _)| *i == index)
            .map(|(_, angle)| *angle)
    }

    pub fn last_led_state(&self, index: usize) -> Option<bool> {
        self.led_writes
            .iter()
            .rev()
            .find(|(i, _)| *i == index)
            .map(|(_, on)| *on)
    }

    pub fn last_tone(&self) -> Option<(u16, u8)> {
        self.tone_writes.last().copied()
    }
}

#[cfg(not(target_os = "espidf"))]
impl SensorPort for HardwareAdapter {
    fn read_all(&mut self) -> SensorSnapshot {
        self.snapshot
    }
}

#[cfg(not(target_os = "espidf"))]
impl ActuatorPort for HardwareAdapter {
    fn write_servo(&mut self, index: usize, angle: u8) {
        self.servo_writes.push((index, angle));
    }

    fn write_led(&mut self, index: usize, on: bool) {
        self.led_writes.push((index, on));
    }

    fn write_tone(&mut self, freq_hz: u16, volume: u8) {
        self.tone_writes.push((freq_hz, volume));
    }

    fn silence(&mut self) {
        self.silenced += 1;
    }

    fn set_indicator(&mut self, on: bool) {
        self.indicator = on;
    }
}
