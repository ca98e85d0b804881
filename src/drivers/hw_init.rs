//! Peripheral bring-up and raw register access (device target only).
//!
//! All direct `esp_idf_sys` calls live here.  The rest of the firmware
//! goes through [`HardwareAdapter`](crate::adapters::hardware) and never
//! sees a register.  Touch and ADC use the legacy one-shot APIs, which
//! are sufficient at the 100 Hz loop rate.

#![cfg(all(target_os = "espidf", feature = "espidf"))]

use esp_idf_sys as sys;
use log::info;

use crate::drivers::{buzzer, servo};
use crate::error::{Error, Result};
use crate::pins;

const SERVO_TIMER: sys::ledc_timer_t = sys::ledc_timer_t_LEDC_TIMER_0;
const BUZZER_TIMER: sys::ledc_timer_t = sys::ledc_timer_t_LEDC_TIMER_1;
const SPEED_MODE: sys::ledc_mode_t = sys::ledc_mode_t_LEDC_LOW_SPEED_MODE;

macro_rules! check {
    ($call:expr, $what:literal) => {
        if unsafe { $call } != sys::ESP_OK {
            return Err(Error::Init($what));
        }
    };
}

/// Configure every output and input peripheral. Call once at boot,
/// before the control loop starts.
pub fn init() -> Result<()> {
    init_ledc()?;
    init_adc()?;
    init_touch()?;
    init_gpio()?;
    info!("hw: peripherals initialised");
    Ok(())
}

fn init_ledc() -> Result<()> {
    let servo_timer = sys::ledc_timer_config_t {
        speed_mode: SPEED_MODE,
        duty_resolution: pins::SERVO_PWM_RESOLUTION_BITS,
        timer_num: SERVO_TIMER,
        freq_hz: pins::SERVO_PWM_FREQ_HZ,
        clk_cfg: sys::ledc_clk_cfg_t_LEDC_AUTO_CLK,
        deconfigure: false,
    };
    check!(sys::ledc_timer_config(&servo_timer), "servo ledc timer");

    for (i, gpio) in pins::SERVO_GPIOS.iter().enumerate() {
        let channel = sys::ledc_channel_config_t {
            gpio_num: *gpio,
            speed_mode: SPEED_MODE,
            channel: pins::LEDC_CH_SERVO_BASE + i as u32,
            intr_type: sys::ledc_intr_type_t_LEDC_INTR_DISABLE,
            timer_sel: SERVO_TIMER,
            duty: servo::angle_to_duty(90),
            hpoint: 0,
            ..Default::default()
        };
        check!(sys::ledc_channel_config(&channel), "servo ledc channel");
    }

    // The buzzer timer is retuned per tone step; 1 kHz is a placeholder.
    let buzzer_timer = sys::ledc_timer_config_t {
        speed_mode: SPEED_MODE,
        duty_resolution: pins::BUZZER_PWM_RESOLUTION_BITS,
        timer_num: BUZZER_TIMER,
        freq_hz: 1_000,
        clk_cfg: sys::ledc_clk_cfg_t_LEDC_AUTO_CLK,
        deconfigure: false,
    };
    check!(sys::ledc_timer_config(&buzzer_timer), "buzzer ledc timer");

    let buzzer_channel = sys::ledc_channel_config_t {
        gpio_num: pins::BUZZER_GPIO,
        speed_mode: SPEED_MODE,
        channel: pins::LEDC_CH_BUZZER,
        intr_type: sys::ledc_intr_type_t_LEDC_INTR_DISABLE,
        timer_sel: BUZZER_TIMER,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    };
    check!(sys::ledc_channel_config(&buzzer_channel), "buzzer ledc channel");
    Ok(())
}

fn init_adc() -> Result<()> {
    check!(
        sys::adc1_config_width(sys::adc_bits_width_t_ADC_WIDTH_BIT_12),
        "adc width"
    );
    for channel in pins::POTI_ADC_CHANNELS {
        check!(
            sys::adc1_config_channel_atten(channel, sys::adc_atten_t_ADC_ATTEN_DB_11),
            "adc attenuation"
        );
    }
    Ok(())
}

fn init_touch() -> Result<()> {
    check!(sys::touch_pad_init(), "touch init");
    for pad in pins::TOUCH_PADS {
        check!(sys::touch_pad_config(pad, 0), "touch pad config");
    }
    Ok(())
}

fn init_gpio() -> Result<()> {
    for gpio in pins::LED_GPIOS.iter().chain(&[pins::INDICATOR_GPIO]) {
        check!(
            sys::gpio_set_direction(*gpio, sys::gpio_mode_t_GPIO_MODE_OUTPUT),
            "led gpio"
        );
    }
    for gpio in pins::SWITCH_GPIOS {
        check!(
            sys::gpio_set_direction(gpio, sys::gpio_mode_t_GPIO_MODE_INPUT),
            "switch gpio"
        );
        check!(
            sys::gpio_set_pull_mode(gpio, sys::gpio_pull_mode_t_GPIO_PULLUP_ONLY),
            "switch pull-up"
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Runtime accessors
// ---------------------------------------------------------------------------

pub fn set_servo_angle(index: usize, angle: u8) {
    if index >= pins::NUM_SERVOS {
        return;
    }
    let channel = pins::LEDC_CH_SERVO_BASE + index as u32;
    unsafe {
        sys::ledc_set_duty(SPEED_MODE, channel, servo::angle_to_duty(angle));
        sys::ledc_update_duty(SPEED_MODE, channel);
    }
}

pub fn set_buzzer(freq_hz: u16, volume: u8) {
    if freq_hz == 0 || volume == 0 {
        silence_buzzer();
        return;
    }
    unsafe {
        sys::ledc_set_freq(SPEED_MODE, BUZZER_TIMER, u32::from(freq_hz));
        sys::ledc_set_duty(SPEED_MODE, pins::LEDC_CH_BUZZER, buzzer::volume_to_duty(volume));
        sys::ledc_update_duty(SPEED_MODE, pins::LEDC_CH_BUZZER);
    }
}

pub fn silence_buzzer() {
    unsafe {
        sys::ledc_set_duty(SPEED_MODE, pins::LEDC_CH_BUZZER, 0);
        sys::ledc_update_duty(SPEED_MODE, pins::LEDC_CH_BUZZER);
    }
}

pub fn gpio_write(gpio: i32, high: bool) {
    unsafe {
        sys::gpio_set_level(gpio, u32::from(high));
    }
}

/// Switch read, inverted for the active-low pull-up wiring.
pub fn switch_read(gpio: i32) -> bool {
    unsafe { sys::gpio_get_level(gpio) == 0 }
}

pub fn adc1_read(channel: u32) -> u16 {
    let raw = unsafe { sys::adc1_get_raw(channel) };
    raw.max(0) as u16
}

pub fn touch_read(pad: u32) -> u16 {
    let mut value: u16 = 0;
    unsafe {
        sys::touch_pad_read(pad, &mut value);
    }
    value
}
