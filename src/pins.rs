//! GPIO / peripheral pin assignments for the servolink controller board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Servo outputs (LEDC, 50 Hz)
// ---------------------------------------------------------------------------

/// One LEDC channel per servo, attached in array order.
pub const SERVO_GPIOS: [i32; 6] = [23, 22, 21, 19, 18, 5];

/// Number of continuous (servo) output channels.
pub const NUM_SERVOS: usize = SERVO_GPIOS.len();

// ---------------------------------------------------------------------------
// Discrete LED outputs
// ---------------------------------------------------------------------------

pub const LED_GPIOS: [i32; 3] = [14, 12, 13];
pub const NUM_LEDS: usize = LED_GPIOS.len();

/// Onboard blue LED — used as the connectivity indicator line.
pub const INDICATOR_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Tone output (LEDC, variable frequency)
// ---------------------------------------------------------------------------

/// Piezo buzzer / audio PWM output.
pub const BUZZER_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// Sensors — Analog (ADC1)
// ---------------------------------------------------------------------------

/// Potentiometer inputs. GPIO 36/39/34/35 are input-only ADC1 pins.
pub const POTI_GPIOS: [i32; 4] = [36, 39, 34, 35];
pub const NUM_POTIS: usize = POTI_GPIOS.len();

/// ADC1 channel numbers matching `POTI_GPIOS` (ESP32 pin → channel map).
pub const POTI_ADC_CHANNELS: [u32; 4] = [0, 3, 6, 7];

// ---------------------------------------------------------------------------
// Sensors — Capacitive touch
// ---------------------------------------------------------------------------

pub const TOUCH_GPIOS: [i32; 3] = [32, 33, 27];
pub const NUM_TOUCH: usize = TOUCH_GPIOS.len();

/// Touch pad numbers matching `TOUCH_GPIOS` (ESP32 pin → pad map).
pub const TOUCH_PADS: [u32; 3] = [9, 8, 7];

// ---------------------------------------------------------------------------
// Sensors — Digital switches (internal pull-up, active low)
// ---------------------------------------------------------------------------

pub const SWITCH_GPIOS: [i32; 1] = [25];
pub const NUM_SWITCHES: usize = SWITCH_GPIOS.len();

// ---------------------------------------------------------------------------
// LEDC configuration
// ---------------------------------------------------------------------------

/// Servo timer: 50 Hz, 14-bit resolution (enough granularity for the
/// 500–2400 µs pulse window).
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;

/// Buzzer timer: frequency is retuned per tone step; 10-bit duty.
pub const BUZZER_PWM_RESOLUTION_BITS: u32 = 10;

/// LEDC channel assignment: servos occupy channels 0–5, buzzer channel 6.
pub const LEDC_CH_SERVO_BASE: u32 = 0;
pub const LEDC_CH_BUZZER: u32 = 6;
