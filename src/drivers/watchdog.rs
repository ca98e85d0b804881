//! Task watchdog integration.
//!
//! The main task subscribes to the TWDT and feeds it once per loop
//! iteration.  A wedged control loop (deadlocked peer callback, runaway
//! parse) then resets the device instead of leaving servos frozen at
//! their last position.

#[cfg(all(target_os = "espidf", feature = "espidf"))]
mod platform {
    use esp_idf_sys as sys;
    use log::info;

    use crate::error::{Error, Result};

    /// RAII subscription of the current task to the TWDT.
    pub struct WatchdogGuard;

    impl WatchdogGuard {
        pub fn subscribe() -> Result<Self> {
            let err = unsafe { sys::esp_task_wdt_add(core::ptr::null_mut()) };
            if err != sys::ESP_OK {
                return Err(Error::Init("twdt subscribe"));
            }
            info!("watchdog: main task subscribed");
            Ok(Self)
        }

        pub fn feed(&self) {
            unsafe {
                sys::esp_task_wdt_reset();
            }
        }
    }

    impl Drop for WatchdogGuard {
        fn drop(&mut self) {
            unsafe {
                sys::esp_task_wdt_delete(core::ptr::null_mut());
            }
        }
    }
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub use platform::WatchdogGuard;

#[cfg(not(target_os = "espidf"))]
pub struct WatchdogGuard;

#[cfg(not(target_os = "espidf"))]
impl WatchdogGuard {
    pub fn subscribe() -> crate::error::Result<Self> {
        Ok(Self)
    }

    pub fn feed(&self) {}
}
