//! Connectivity indicator LED.
//!
//! Lit while the device is reachable (joined or hosting the fallback
//! AP), dark when offline.  Kept as its own driver so future blink
//! patterns have somewhere to live.

#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub fn set(on: bool) {
    super::hw_init::gpio_write(crate::pins::INDICATOR_GPIO, on);
}

#[cfg(not(target_os = "espidf"))]
pub fn set(on: bool) {
    log::debug!("indicator(sim): {}", if on { "on" } else { "off" });
}
